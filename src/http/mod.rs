//! # Módulo HTTP
//!
//! Implementación mínima de HTTP/1.0 escrita a mano, sin librerías de alto
//! nivel:
//!
//! - Lectura de líneas byte por byte
//! - Parsing de la request line y headers
//! - Lectura del body según `Content-Length`
//! - Las dos plantillas de respuesta del servidor
//!
//! ## Alcance
//!
//! Solo HTTP/1.0: un request por conexión, sin keep-alive, sin chunked
//! transfer encoding y sin pipelining.
//!
//! ### Formato de Request
//!
//! ```text
//! METHOD SP target SP version CRLF (o LF)
//! Name: value CRLF
//! CRLF
//! <Content-Length bytes>
//! ```

pub mod body;
pub mod line;
pub mod request;
pub mod response;
pub mod status;

pub use request::{HeaderMap, Method, Request};
pub use response::ResponseBody;
pub use status::StatusCode;
