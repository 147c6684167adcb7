//! # Parsing de Requests HTTP/1.0
//! src/http/request.rs
//!
//! Parser HTTP/1.0 escrito a mano sobre el [lector de líneas](super::line).
//!
//! ## Formato de un Request HTTP/1.0
//!
//! ```text
//! POST /ocr HTTP/1.0\r\n
//! Content-Length: 5\r\n
//! \r\n
//! iVBOR
//! ```
//!
//! ## Componentes
//!
//! 1. **Request Line**: `METHOD target VERSION`, separados por un único espacio
//! 2. **Headers**: Pares `Name: Value` (uno por línea)
//! 3. **Empty Line**: separa headers del body
//! 4. **Body**: lo lee [`body`](super::body), no este módulo
//!
//! ## Headers sensibles a mayúsculas
//!
//! Los nombres de header se guardan tal como llegan y la búsqueda es exacta:
//! `Content-Length` y `content-length` son headers distintos. Un nombre
//! repetido sobrescribe el valor anterior.

use super::line::read_line;
use crate::error::RequestError;
use std::collections::HashMap;
use std::fmt;
use std::io::BufRead;

/// Headers del request: nombre exacto → último valor recibido
pub type HeaderMap = HashMap<String, String>;

/// Métodos HTTP
///
/// El conjunto es abierto: cualquier token desconocido queda en `Extension`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    GET,
    HEAD,
    POST,
    PUT,
    DELETE,
    OPTIONS,
    /// Cualquier otro verbo, ya en mayúsculas
    Extension(String),
}

impl Method {
    /// Interpreta un token de la request line (nunca falla)
    ///
    /// # Ejemplo
    /// ```
    /// use ocr_service::http::Method;
    ///
    /// assert_eq!(Method::from_token("post"), Method::POST);
    /// assert_eq!(Method::from_token("Purge").as_str(), "PURGE");
    /// ```
    pub fn from_token(token: &str) -> Self {
        let upper = token.to_uppercase();
        match upper.as_str() {
            "GET" => Method::GET,
            "HEAD" => Method::HEAD,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "OPTIONS" => Method::OPTIONS,
            _ => Method::Extension(upper),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::OPTIONS => "OPTIONS",
            Method::Extension(other) => other,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Representa un request HTTP/1.0 parseado
///
/// Se construye una vez por conexión y no cambia después de leer los headers.
#[derive(Debug, Clone)]
pub struct Request {
    /// Método HTTP, en mayúsculas
    method: Method,

    /// Target tal cual llegó (path + query, sin parsear)
    target: String,

    /// Versión del protocolo tal cual llegó (ej: "HTTP/1.0")
    version: String,

    /// Headers HTTP
    headers: HeaderMap,
}

impl Request {
    /// Lee la request line y todos los headers desde el stream
    ///
    /// Se detiene exactamente en la línea vacía; los bytes del body quedan
    /// sin consumir en `input`.
    ///
    /// # Ejemplo
    /// ```
    /// use ocr_service::http::{Method, Request};
    /// use std::io::Cursor;
    ///
    /// let mut input = Cursor::new(&b"get /foo HTTP/1.0\r\nHost: x\r\n\r\n"[..]);
    /// let request = Request::read_from(&mut input).unwrap();
    ///
    /// assert_eq!(request.method(), &Method::GET);
    /// assert_eq!(request.target(), "/foo");
    /// assert_eq!(request.header("Host"), Some("x"));
    /// ```
    pub fn read_from<R: BufRead>(input: &mut R) -> Result<Self, RequestError> {
        let line = read_line(input)?;
        let (method, target, version) = parse_request_line(&line)?;
        tracing::info!(request_line = %line, "starting");

        let headers = read_headers(input)?;

        Ok(Request {
            method,
            target,
            version,
            headers,
        })
    }

    /// Construye un request a mano (útil para handlers y tests)
    pub fn new(method: Method, target: &str, version: &str, headers: HeaderMap) -> Self {
        Self {
            method,
            target: target.to_string(),
            version: version.to_string(),
            headers,
        }
    }

    // === Métodos públicos para acceder a los campos ===

    /// Obtiene el método HTTP del request
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Obtiene el target sin parsear (path + query)
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Obtiene la versión HTTP
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Obtiene todos los headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Obtiene un header específico (búsqueda exacta, sensible a mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }
}

/// Parsea la request line
///
/// Formato: `METHOD target VERSION`. Se separa por un único espacio y deben
/// quedar exactamente 3 tokens; dos espacios seguidos producen un token vacío
/// y por lo tanto un error.
pub fn parse_request_line(line: &str) -> Result<(Method, String, String), RequestError> {
    let tokens: Vec<&str> = line.split(' ').collect();
    let [method, target, version] = tokens.as_slice() else {
        return Err(RequestError::MalformedRequestLine(line.to_string()));
    };

    Ok((
        Method::from_token(method),
        target.to_string(),
        version.to_string(),
    ))
}

/// Parsea una línea de header en `(nombre, valor)`
///
/// El nombre es todo lo anterior al primer ':' sin recortar. Del valor solo
/// se quitan los espacios iniciales.
pub fn parse_header_line(line: &str) -> Result<(String, String), RequestError> {
    let Some(separator) = line.find(':') else {
        return Err(RequestError::MalformedHeaderLine(line.to_string()));
    };

    let name = &line[..separator];
    let value = line[separator + 1..].trim_start_matches(' ');
    Ok((name.to_string(), value.to_string()))
}

/// Lee líneas de header hasta la línea vacía
pub fn read_headers<R: BufRead>(input: &mut R) -> Result<HeaderMap, RequestError> {
    let mut headers = HeaderMap::new();

    loop {
        let line = read_line(input)?;
        if line.is_empty() {
            tracing::debug!(count = headers.len(), "got headers");
            return Ok(headers);
        }

        let (name, value) = parse_header_line(&line)?;
        tracing::debug!(name = %name, value = %value, "header");
        headers.insert(name, value);
    }
}
