//! # Lector de Líneas
//! src/http/line.rs
//!
//! Lee el stream de entrada byte por byte y devuelve una línea por llamada.
//!
//! - `\n` termina la línea
//! - `\r` se descarta en cualquier posición (acepta CRLF, LF y `\r` sueltos)
//! - Una línea vacía se devuelve como `""` (marca el fin de los headers)
//! - Cada byte se convierte en un `char` (Latin-1), sin perder bytes que no
//!   sean UTF-8 válido
//!
//! El lector trabaja sobre un [`BufRead`]: el socket se envuelve en un
//! `BufReader` para que leer de a un byte no cueste una syscall y para que
//! el lector del body continúe exactamente donde terminaron los headers.

use crate::error::RequestError;
use std::io::{BufRead, ErrorKind};
use std::thread;
use std::time::Duration;

/// Largo máximo de una línea (request line o header), contando los `\r`
pub const MAX_LINE_BYTES: usize = 8 * 1024;

/// Reintentos consecutivos permitidos cuando la lectura no trae datos
pub const IDLE_RETRY_LIMIT: u32 = 3;

/// Pausa entre reintentos
const IDLE_BACKOFF: Duration = Duration::from_millis(1);

/// Lee bytes hasta `\n` y los devuelve como texto
///
/// Un `read` que devuelve 0 bytes es fin de stream definitivo y falla con
/// [`RequestError::ConnectionClosed`]. Solo `WouldBlock`/`TimedOut` (posibles
/// cuando hay read timeout configurado) se reintentan, con un tope de
/// [`IDLE_RETRY_LIMIT`].
///
/// # Ejemplo
/// ```
/// use ocr_service::http::line::read_line;
/// use std::io::Cursor;
///
/// let mut input = Cursor::new(&b"GET / HTTP/1.0\r\n\r\n"[..]);
/// assert_eq!(read_line(&mut input).unwrap(), "GET / HTTP/1.0");
/// assert_eq!(read_line(&mut input).unwrap(), "");
/// ```
pub fn read_line<R: BufRead>(input: &mut R) -> Result<String, RequestError> {
    let mut line = Vec::new();
    let mut consumed = 0;
    let mut idle_retries = 0;

    loop {
        let byte = match next_byte(input) {
            Ok(Some(b)) => b,
            Ok(None) => return Err(RequestError::ConnectionClosed),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                idle_retries += 1;
                if idle_retries > IDLE_RETRY_LIMIT {
                    return Err(RequestError::ReadTimedOut);
                }
                thread::sleep(IDLE_BACKOFF);
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        idle_retries = 0;

        match byte {
            b'\n' => break,
            _ if consumed >= MAX_LINE_BYTES => {
                return Err(RequestError::LineTooLong(MAX_LINE_BYTES));
            }
            b'\r' => consumed += 1,
            b => {
                consumed += 1;
                line.push(b);
            }
        }
    }

    Ok(line.iter().map(|&b| char::from(b)).collect())
}

/// Consume un byte del buffer, `None` en fin de stream
fn next_byte<R: BufRead>(input: &mut R) -> std::io::Result<Option<u8>> {
    let available = input.fill_buf()?;
    let Some(&b) = available.first() else {
        return Ok(None);
    };
    input.consume(1);
    Ok(Some(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor, Read};

    /// Reader que falla con `WouldBlock` las primeras `n` veces
    struct Stalling<R> {
        inner: R,
        stalls: u32,
    }

    impl<R: Read> Read for Stalling<R> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.stalls > 0 {
                self.stalls -= 1;
                return Err(std::io::Error::new(ErrorKind::WouldBlock, "no data yet"));
            }
            self.inner.read(buf)
        }
    }

    #[test]
    fn test_crlf_and_lf() {
        let mut input = Cursor::new(&b"uno\r\ndos\n\n"[..]);
        assert_eq!(read_line(&mut input).unwrap(), "uno");
        assert_eq!(read_line(&mut input).unwrap(), "dos");
        assert_eq!(read_line(&mut input).unwrap(), "");
    }

    #[test]
    fn test_bare_carriage_return_dropped() {
        let mut input = Cursor::new(&b"a\rb\r\r\n"[..]);
        assert_eq!(read_line(&mut input).unwrap(), "ab");
    }

    #[test]
    fn test_empty_line_is_empty_string() {
        let mut input = Cursor::new(&b"\r\n"[..]);
        assert_eq!(read_line(&mut input).unwrap(), "");
    }

    #[test]
    fn test_eof_without_newline_fails() {
        let mut input = Cursor::new(&b"incompleta"[..]);
        assert!(matches!(
            read_line(&mut input),
            Err(RequestError::ConnectionClosed)
        ));
    }

    #[test]
    fn test_leaves_remaining_bytes() {
        let mut input = Cursor::new(&b"linea\nresto"[..]);
        read_line(&mut input).unwrap();

        let mut rest = String::new();
        input.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "resto");
    }

    #[test]
    fn test_retries_when_no_data_yet() {
        let stalling = Stalling {
            inner: Cursor::new(&b"hola\n"[..]),
            stalls: 3,
        };
        let mut input = BufReader::new(stalling);
        assert_eq!(read_line(&mut input).unwrap(), "hola");
    }

    #[test]
    fn test_gives_up_after_retry_limit() {
        let stalling = Stalling {
            inner: Cursor::new(&b"hola\n"[..]),
            stalls: IDLE_RETRY_LIMIT + 1,
        };
        let mut input = BufReader::new(stalling);
        assert!(matches!(
            read_line(&mut input),
            Err(RequestError::ReadTimedOut)
        ));
    }

    #[test]
    fn test_line_too_long() {
        let mut raw = vec![b'a'; MAX_LINE_BYTES + 1];
        raw.push(b'\n');
        let mut input = Cursor::new(raw);
        assert!(matches!(
            read_line(&mut input),
            Err(RequestError::LineTooLong(_))
        ));
    }

    #[test]
    fn test_carriage_returns_count_toward_limit() {
        let mut raw = vec![b'\r'; MAX_LINE_BYTES + 1];
        raw.extend_from_slice(b"ok\n");
        let mut input = Cursor::new(raw);
        assert!(matches!(
            read_line(&mut input),
            Err(RequestError::LineTooLong(_))
        ));
    }

    #[test]
    fn test_line_at_limit_with_crlf() {
        let mut raw = vec![b'a'; MAX_LINE_BYTES - 1];
        raw.extend_from_slice(b"\r\n");
        let mut input = Cursor::new(raw);
        assert_eq!(read_line(&mut input).unwrap().len(), MAX_LINE_BYTES - 1);
    }

    #[test]
    fn test_non_utf8_bytes_kept_one_char_each() {
        let mut input = Cursor::new(&b"GET /caf\xe9 HTTP/1.0\r\n"[..]);
        let line = read_line(&mut input).unwrap();
        assert_eq!(line, "GET /caf\u{e9} HTTP/1.0");
        assert_eq!(line.chars().count(), 18);
    }
}
