//! # Respuestas HTTP
//!
//! El servidor tiene exactamente dos plantillas de respuesta:
//!
//! ```text
//! HTTP/1.0 200 OK\r\n                HTTP/1.0 404 File not found\r\n
//! Content-Type: text/html\r\n        Connection: close\r\n
//! Connection: close\r\n              \r\n
//! \r\n
//! <líneas escritas por el handler>
//! ```
//!
//! Los handlers no escriben directo al socket: llenan un [`ResponseBody`] y
//! el procesador de conexiones decide cuál plantilla enviar cuando el handler
//! termina. Así un handler que falla a mitad de camino nunca deja una
//! respuesta 200 a medio escribir.

use super::StatusCode;
use std::fmt;
use std::io::{self, Write};

/// Terminador de línea en las respuestas
const CRLF: &str = "\r\n";

/// Escribe la status line
fn write_status_line<W: Write>(out: &mut W, status: StatusCode) -> io::Result<()> {
    write!(out, "HTTP/1.0 {}{}", status, CRLF)
}

/// Escribe el preámbulo de éxito (status, Content-Type, Connection, línea vacía)
pub fn write_success<W: Write>(out: &mut W) -> io::Result<()> {
    write_status_line(out, StatusCode::Ok)?;
    write!(out, "Content-Type: text/html{}", CRLF)?;
    write!(out, "Connection: close{}", CRLF)?;
    out.write_all(CRLF.as_bytes())
}

/// Escribe la respuesta de fallo completa (sin body)
pub fn write_failure<W: Write>(out: &mut W) -> io::Result<()> {
    write_status_line(out, StatusCode::NotFound)?;
    write!(out, "Connection: close{}", CRLF)?;
    out.write_all(CRLF.as_bytes())
}

/// Body de una respuesta exitosa, construido por el handler
///
/// # Ejemplo
/// ```
/// use ocr_service::http::ResponseBody;
///
/// let mut body = ResponseBody::new();
/// body.write_line("<html><body>");
/// body.write_str("hola");
/// assert_eq!(body.as_bytes(), b"<html><body>\r\nhola");
/// ```
#[derive(Debug, Default, Clone)]
pub struct ResponseBody {
    bytes: Vec<u8>,
}

impl ResponseBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Agrega una línea terminada en CRLF
    pub fn write_line(&mut self, line: &str) {
        self.bytes.extend_from_slice(line.as_bytes());
        self.bytes.extend_from_slice(CRLF.as_bytes());
    }

    /// Agrega texto sin terminador
    pub fn write_str(&mut self, text: &str) {
        self.bytes.extend_from_slice(text.as_bytes());
    }

    /// Agrega bytes crudos
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Escribe el preámbulo de éxito seguido de este body
    pub fn write_success_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write_success(out)?;
        out.write_all(&self.bytes)
    }
}

impl Write for ResponseBody {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Write for ResponseBody {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        ResponseBody::write_str(self, s);
        Ok(())
    }
}
