//! # Procesador de Conexiones
//! src/server/connection.rs
//!
//! Atiende exactamente un request por conexión:
//!
//! ```text
//! request line → headers → (body si es POST) → handler → respuesta → cierre
//! ```
//!
//! Cualquier error en el camino se registra en el log y se convierte en la
//! misma respuesta de fallo. La conexión se cierra siempre, haya salido bien
//! o no.

use crate::config::ServerConfig;
use crate::error::RequestError;
use crate::handler::Handler;
use crate::http::body::read_body;
use crate::http::response::write_failure;
use crate::http::{Method, Request, ResponseBody, StatusCode};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

/// Espera máxima por cada lectura al drenar la entrada antes de cerrar
const LINGER_TIMEOUT: Duration = Duration::from_millis(50);

/// Bytes que se descartan como máximo al drenar la entrada
const LINGER_MAX_BYTES: usize = 64 * 1024;

/// Cómo terminó una conexión
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Se envió el preámbulo de éxito y el body del handler
    Success,

    /// Se envió la respuesta de fallo; lleva el tipo de error
    Failure(&'static str),

    /// Método distinto de GET/POST: no se invoca handler ni se responde
    Unhandled(Method),
}

impl Outcome {
    /// Código de estado que se envió, `None` si no hubo respuesta
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Outcome::Success => Some(StatusCode::Ok),
            Outcome::Failure(_) => Some(StatusCode::NotFound),
            Outcome::Unhandled(_) => None,
        }
    }
}

/// Resultado de despachar un request ya parseado
enum Dispatch {
    Handled(ResponseBody),
    Skipped(Method),
}

/// Procesa un request completo sobre streams genéricos
///
/// No cierra nada: eso lo hace [`handle_connection`]. Solo devuelve `Err`
/// si falla la escritura de la respuesta misma.
pub fn process<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    handler: &dyn Handler,
    max_body_bytes: usize,
) -> io::Result<Outcome> {
    match dispatch(input, handler, max_body_bytes) {
        Ok(Dispatch::Handled(body)) => {
            body.write_success_to(output)?;
            Ok(Outcome::Success)
        }
        Ok(Dispatch::Skipped(method)) => {
            tracing::warn!(method = %method, "method not handled, closing without response");
            Ok(Outcome::Unhandled(method))
        }
        Err(e) => {
            tracing::warn!(kind = e.kind(), error = %e, "request failed");
            write_failure(output)?;
            Ok(Outcome::Failure(e.kind()))
        }
    }
}

fn dispatch<R: BufRead>(
    input: &mut R,
    handler: &dyn Handler,
    max_body_bytes: usize,
) -> Result<Dispatch, RequestError> {
    let request = Request::read_from(input)?;
    let mut out = ResponseBody::new();

    match request.method() {
        Method::GET => {
            guard_handler(|| handler.handle_get(&request, &mut out))?;
        }
        Method::POST => {
            let body = read_body(input, request.headers(), max_body_bytes)?;
            guard_handler(|| handler.handle_post(&request, &body, &mut out))?;
        }
        other => return Ok(Dispatch::Skipped(other.clone())),
    }

    Ok(Dispatch::Handled(out))
}

/// Ejecuta el handler convirtiendo errores y panics en `HandlerFailure`
fn guard_handler<F>(call: F) -> Result<(), RequestError>
where
    F: FnOnce() -> Result<(), crate::error::HandlerError>,
{
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result.map_err(RequestError::HandlerFailure),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(RequestError::HandlerFailure(
                format!("handler panicked: {}", message).into(),
            ))
        }
    }
}

/// Atiende una conexión TCP aceptada y la cierra
pub fn handle_connection(
    stream: TcpStream,
    handler: &dyn Handler,
    config: &ServerConfig,
) -> io::Result<Outcome> {
    stream.set_read_timeout(config.read_timeout())?;

    let mut input = BufReader::new(stream.try_clone()?);
    let mut output = BufWriter::new(&stream);

    let outcome = process(&mut input, &mut output, handler, config.max_body_bytes);
    let flushed = output.flush();
    drop(output);
    drop(input);

    close(&stream);

    let outcome = outcome?;
    flushed?;
    Ok(outcome)
}

/// Cierra la conexión sin perder la respuesta
///
/// Si quedan bytes sin leer en el socket (un body que nunca se leyó, o lo
/// que venía después de una línea inválida) cerrar directamente puede
/// mandar un RST y el cliente perdería la respuesta. Primero se cierra la
/// escritura y se descarta lo que quede por leer, con tope de tiempo y bytes.
fn close(stream: &TcpStream) {
    let _ = stream.shutdown(Shutdown::Write);

    if stream.set_read_timeout(Some(LINGER_TIMEOUT)).is_ok() {
        let mut scratch = [0u8; 4096];
        let mut drained = 0;
        let mut reader = stream;
        while drained < LINGER_MAX_BYTES {
            match reader.read(&mut scratch) {
                Ok(0) | Err(_) => break,
                Ok(n) => drained += n,
            }
        }
    }

    let _ = stream.shutdown(Shutdown::Both);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use std::io::Cursor;
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    /// Handler que registra las llamadas y hace eco del request
    #[derive(Default)]
    struct Recorder {
        gets: AtomicUsize,
        posts: AtomicUsize,
    }

    impl Handler for Recorder {
        fn handle_get(&self, request: &Request, out: &mut ResponseBody) -> Result<(), HandlerError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            out.write_line(&format!("url : {}", request.target()));
            Ok(())
        }

        fn handle_post(
            &self,
            _request: &Request,
            body: &[u8],
            out: &mut ResponseBody,
        ) -> Result<(), HandlerError> {
            self.posts.fetch_add(1, Ordering::SeqCst);
            out.write_str("body=");
            out.write_bytes(body);
            Ok(())
        }
    }

    struct Failing;

    impl Handler for Failing {
        fn handle_get(&self, _request: &Request, out: &mut ResponseBody) -> Result<(), HandlerError> {
            out.write_line("a medio escribir");
            Err("no se pudo".into())
        }

        fn handle_post(
            &self,
            _request: &Request,
            _body: &[u8],
            _out: &mut ResponseBody,
        ) -> Result<(), HandlerError> {
            panic!("explota");
        }
    }

    fn run(raw: &[u8], handler: &dyn Handler, max: usize) -> (Outcome, String) {
        let mut input = Cursor::new(raw);
        let mut output = Vec::new();
        let outcome = process(&mut input, &mut output, handler, max).unwrap();
        (outcome, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_get_dispatch() {
        let handler = Recorder::default();
        let (outcome, text) = run(b"GET /foo HTTP/1.0\r\n\r\n", &handler, 1024);

        assert_eq!(outcome, Outcome::Success);
        assert_eq!(
            text,
            "HTTP/1.0 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\nurl : /foo\r\n"
        );
        assert_eq!(handler.gets.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_get_ignores_body() {
        let handler = Recorder::default();
        let (outcome, _) = run(
            b"GET / HTTP/1.0\r\nContent-Length: 999999999\r\n\r\nxyz",
            &handler,
            10,
        );
        assert_eq!(outcome, Outcome::Success);
    }

    #[test]
    fn test_post_dispatch() {
        let handler = Recorder::default();
        let (outcome, text) = run(
            b"POST /x HTTP/1.0\r\nContent-Length: 3\r\n\r\nabc",
            &handler,
            1024,
        );

        assert_eq!(outcome, Outcome::Success);
        assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(text.ends_with("\r\n\r\nbody=abc"));
        assert_eq!(handler.posts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_post_without_length_has_empty_body() {
        let handler = Recorder::default();
        let (outcome, text) = run(b"POST /x HTTP/1.0\r\n\r\nignored", &handler, 1024);

        assert_eq!(outcome, Outcome::Success);
        assert!(text.ends_with("\r\n\r\nbody="));
    }

    #[test]
    fn test_malformed_request_line() {
        let handler = Recorder::default();
        let (outcome, text) = run(b"GET\r\n\r\n", &handler, 1024);

        assert_eq!(outcome, Outcome::Failure("malformed_request_line"));
        assert_eq!(text, "HTTP/1.0 404 File not found\r\nConnection: close\r\n\r\n");
        assert_eq!(handler.gets.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_body_too_large_skips_handler() {
        let handler = Recorder::default();
        let (outcome, text) = run(
            b"POST /x HTTP/1.0\r\nContent-Length: 11\r\n\r\n01234567890",
            &handler,
            10,
        );

        assert_eq!(outcome, Outcome::Failure("body_too_large"));
        assert!(text.starts_with("HTTP/1.0 404"));
        assert_eq!(handler.posts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_disconnect_mid_body() {
        let handler = Recorder::default();
        let (outcome, _) = run(
            b"POST /x HTTP/1.0\r\nContent-Length: 5\r\n\r\nab",
            &handler,
            1024,
        );
        assert_eq!(outcome, Outcome::Failure("unexpected_disconnect"));
    }

    #[test]
    fn test_handler_error_discards_partial_body() {
        let (outcome, text) = run(b"GET / HTTP/1.0\r\n\r\n", &Failing, 1024);

        assert_eq!(outcome, Outcome::Failure("handler_failure"));
        assert!(!text.contains("a medio escribir"));
        assert!(text.starts_with("HTTP/1.0 404"));
    }

    #[test]
    fn test_handler_panic_is_failure() {
        let (outcome, text) = run(b"POST / HTTP/1.0\r\n\r\n", &Failing, 1024);

        assert_eq!(outcome, Outcome::Failure("handler_failure"));
        assert!(text.starts_with("HTTP/1.0 404"));
    }

    #[test]
    fn test_other_method_is_unhandled() {
        let handler = Recorder::default();
        let (outcome, text) = run(b"PUT /x HTTP/1.0\r\n\r\n", &handler, 1024);

        assert_eq!(outcome, Outcome::Unhandled(Method::PUT));
        assert!(text.is_empty());
    }

    #[test]
    fn test_outcome_status() {
        assert_eq!(Outcome::Success.status(), Some(StatusCode::Ok));
        assert!(Outcome::Success.status().unwrap().is_success());

        let failed = Outcome::Failure("body_too_large").status().unwrap();
        assert_eq!(failed, StatusCode::NotFound);
        assert!(!failed.is_success());

        assert_eq!(Outcome::Unhandled(Method::DELETE).status(), None);
    }

    #[test]
    fn test_handle_connection_over_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handle_connection(stream, &Recorder::default(), &ServerConfig::default()).unwrap()
        });

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(b"GET /socket HTTP/1.0\r\n\r\n").unwrap();

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        let text = String::from_utf8_lossy(&buf);

        assert!(text.contains("200 OK"));
        assert!(text.contains("url : /socket"));
        assert_eq!(server.join().unwrap(), Outcome::Success);
    }

    #[test]
    fn test_handle_connection_peer_closed_immediately() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handle_connection(stream, &Recorder::default(), &ServerConfig::default())
        });

        drop(TcpStream::connect(addr).unwrap());

        // El fallo se responde igual; escribir a un peer cerrado puede fallar o no
        match server.join().unwrap() {
            Ok(outcome) => assert_eq!(outcome, Outcome::Failure("connection_closed")),
            Err(_) => {}
        }
    }

    #[test]
    fn test_handle_connection_read_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let config = ServerConfig {
                read_timeout_ms: Some(20),
                ..ServerConfig::default()
            };
            handle_connection(stream, &Recorder::default(), &config).unwrap()
        });

        // Request line sin terminar y nunca se cierra la escritura
        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(b"GET /lento").unwrap();

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();

        assert!(String::from_utf8_lossy(&buf).starts_with("HTTP/1.0 404"));
        assert_eq!(server.join().unwrap(), Outcome::Failure("read_timed_out"));
    }
}
