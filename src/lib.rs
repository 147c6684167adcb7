//! # OCR Service
//! src/lib.rs
//!
//! Servidor HTTP/1.0 mínimo implementado desde cero: escucha en un puerto
//! TCP, parsea la request line y los headers byte por byte, lee el body
//! según `Content-Length` y despacha a un único [`Handler`](handler::Handler).
//!
//! ## Arquitectura
//!
//! - `http`: lector de líneas, parser del request, lector del body y las dos
//!   plantillas de respuesta
//! - `server`: loop de `accept` y procesamiento de cada conexión
//! - `handler`: el trait que implementa la aplicación
//! - `ocr`: handler por defecto (página de prueba + imágenes en base64)
//! - `announce`: reporte opcional de la IP al arrancar
//! - `config`: configuración por CLI/entorno
//! - `error`: errores del procesamiento de una conexión
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use ocr_service::config::ServerConfig;
//! use ocr_service::ocr::{ImageProbe, OcrHandler};
//! use ocr_service::server::Server;
//!
//! let server = Server::bind(ServerConfig::default(), OcrHandler::new(ImageProbe))
//!     .expect("Error al hacer bind");
//! server.run().expect("Error en el servidor");
//! ```

pub mod announce;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod ocr;
pub mod server;
