//! # Errores del procesamiento de una conexión
//! src/error.rs
//!
//! Todos los errores que pueden ocurrir mientras se atiende un request.
//! El procesador de conexiones los colapsa en la misma respuesta de fallo;
//! el detalle solo queda en los logs.

use thiserror::Error;

/// Error devuelto por un [`Handler`](crate::handler::Handler)
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Errores que pueden ocurrir durante el procesamiento de una conexión
#[derive(Debug, Error)]
pub enum RequestError {
    /// La request line no tiene exactamente 3 tokens
    #[error("invalid http request line: {0:?}")]
    MalformedRequestLine(String),

    /// Header sin ':'
    #[error("invalid http header line: {0:?}")]
    MalformedHeaderLine(String),

    /// Content-Length no numérico
    #[error("invalid Content-Length: {0:?}")]
    InvalidContentLength(String),

    /// El body declarado supera el máximo configurado
    #[error("POST Content-Length({declared}) too big for this simple server (max {max})")]
    BodyTooLarge { declared: usize, max: usize },

    /// El cliente cerró la conexión antes de enviar todo el body
    #[error("client disconnected during post ({received} of {expected} bytes)")]
    UnexpectedDisconnect { received: usize, expected: usize },

    /// Fin de stream mientras se leía una línea
    #[error("connection closed while reading a line")]
    ConnectionClosed,

    /// Línea más larga que el límite del lector
    #[error("line exceeds {0} bytes")]
    LineTooLong(usize),

    /// Se agotaron los reintentos de lectura sin recibir datos
    #[error("timed out waiting for data")]
    ReadTimedOut,

    /// El handler devolvió un error
    #[error("handler failed: {0}")]
    HandlerFailure(#[source] HandlerError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RequestError {
    /// Etiqueta corta para los campos de log
    pub fn kind(&self) -> &'static str {
        match self {
            RequestError::MalformedRequestLine(_) => "malformed_request_line",
            RequestError::MalformedHeaderLine(_) => "malformed_header_line",
            RequestError::InvalidContentLength(_) => "invalid_content_length",
            RequestError::BodyTooLarge { .. } => "body_too_large",
            RequestError::UnexpectedDisconnect { .. } => "unexpected_disconnect",
            RequestError::ConnectionClosed => "connection_closed",
            RequestError::LineTooLong(_) => "line_too_long",
            RequestError::ReadTimedOut => "read_timed_out",
            RequestError::HandlerFailure(_) => "handler_failure",
            RequestError::Io(_) => "io",
        }
    }
}
