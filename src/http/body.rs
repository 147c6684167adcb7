//! # Lectura del Body
//! src/http/body.rs
//!
//! Lee exactamente `Content-Length` bytes del stream, en bloques de
//! [`CHUNK_SIZE`], sin importar cuántas lecturas hagan falta.

use super::request::HeaderMap;
use crate::error::RequestError;
use std::io::{ErrorKind, Read};

/// Tamaño del bloque de lectura
pub const CHUNK_SIZE: usize = 4096;

/// Nombre exacto del header que declara el largo del body
pub const CONTENT_LENGTH: &str = "Content-Length";

/// Interpreta el valor de `Content-Length`
///
/// Acepta espacios alrededor del número; cualquier otra cosa (incluidos
/// valores negativos) es [`RequestError::InvalidContentLength`].
pub fn parse_content_length(value: &str) -> Result<usize, RequestError> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| RequestError::InvalidContentLength(value.to_string()))
}

/// Lee el body declarado por los headers
///
/// Sin `Content-Length` devuelve un body vacío sin tocar el stream.
pub fn read_body<R: Read>(
    input: &mut R,
    headers: &HeaderMap,
    max_body_bytes: usize,
) -> Result<Vec<u8>, RequestError> {
    match headers.get(CONTENT_LENGTH) {
        Some(value) => {
            let declared = parse_content_length(value)?;
            read_exact_body(input, declared, max_body_bytes)
        }
        None => Ok(Vec::new()),
    }
}

/// Lee exactamente `declared` bytes
///
/// Falla con [`RequestError::BodyTooLarge`] antes de leer nada si `declared`
/// supera `max_body_bytes`, y con [`RequestError::UnexpectedDisconnect`] si
/// el cliente cierra antes de completar el body.
///
/// # Ejemplo
/// ```
/// use ocr_service::http::body::read_exact_body;
/// use std::io::Cursor;
///
/// let mut input = Cursor::new(&b"abcdef"[..]);
/// let body = read_exact_body(&mut input, 3, 1024).unwrap();
/// assert_eq!(body, b"abc");
/// ```
pub fn read_exact_body<R: Read>(
    input: &mut R,
    declared: usize,
    max_body_bytes: usize,
) -> Result<Vec<u8>, RequestError> {
    if declared > max_body_bytes {
        return Err(RequestError::BodyTooLarge {
            declared,
            max: max_body_bytes,
        });
    }

    tracing::trace!(declared, "get post data start");

    let mut body = Vec::with_capacity(declared);
    let mut buf = [0u8; CHUNK_SIZE];

    while body.len() < declared {
        let to_read = (declared - body.len()).min(CHUNK_SIZE);
        let read = match input.read(&mut buf[..to_read]) {
            Ok(0) => {
                return Err(RequestError::UnexpectedDisconnect {
                    received: body.len(),
                    expected: declared,
                })
            }
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                return Err(RequestError::ReadTimedOut)
            }
            Err(e) => return Err(e.into()),
        };

        body.extend_from_slice(&buf[..read]);
        tracing::trace!(read, remaining = declared - body.len(), "read finished");
    }

    tracing::trace!(len = body.len(), "get post data end");
    Ok(body)
}
