//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! 1. Escucha en un puerto
//! 2. Acepta conexiones entrantes, un thread por conexión
//! 3. Cada thread procesa un único request y cierra la conexión

pub mod connection;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use connection::Outcome;
pub use tcp::{Server, ShutdownHandle};
