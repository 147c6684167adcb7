//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración fija durante toda la vida del servidor: se lee una vez al
//! arrancar (CLI o variables de entorno) y luego se comparte de solo lectura.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./ocr_service            # puerto 8080
//! ./ocr_service 9000 --max-body-bytes 2097152
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! OCR_PORT=9000 OCR_ANNOUNCE_URL="http://registry.local/?varname=ocr" ./ocr_service
//! ```

use clap::Parser;
use std::time::Duration;

/// Tamaño máximo por defecto del body de un POST (10 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Configuración del servidor HTTP/1.0
#[derive(Debug, Clone, Parser)]
#[command(name = "ocr_service")]
#[command(about = "Servidor HTTP/1.0 que recibe imagenes en base64 para OCR")]
#[command(version = "0.1.0")]
pub struct ServerConfig {
    /// Puerto en el que escucha el servidor
    #[arg(default_value_t = 8080, env = "OCR_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "0.0.0.0", env = "OCR_HOST")]
    pub host: String,

    /// Tamaño máximo del body de un POST en bytes
    #[arg(long = "max-body-bytes", default_value_t = DEFAULT_MAX_BODY_BYTES, env = "OCR_MAX_BODY_BYTES")]
    pub max_body_bytes: usize,

    /// Read timeout del socket en milisegundos (sin valor = lectura bloqueante)
    #[arg(long = "read-timeout-ms", env = "OCR_READ_TIMEOUT_MS")]
    pub read_timeout_ms: Option<u64>,

    /// URL a la que se reporta la IP de esta máquina al arrancar (http:// o https://)
    #[arg(long = "announce-url", env = "OCR_ANNOUNCE_URL")]
    pub announce_url: Option<String>,
}

impl ServerConfig {
    /// Crea la configuración parseando argumentos CLI
    pub fn new() -> Self {
        ServerConfig::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use ocr_service::config::ServerConfig;
    ///
    /// let config = ServerConfig::default();
    /// assert_eq!(config.address(), "0.0.0.0:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Read timeout para los sockets aceptados
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), String> {
        if self.max_body_bytes == 0 {
            return Err("Max body bytes must be >= 1".to_string());
        }
        // set_read_timeout rechaza una duración cero
        if self.read_timeout_ms == Some(0) {
            return Err("Read timeout must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            read_timeout_ms: None,
            announce_url: None,
        }
    }
}
