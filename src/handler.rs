//! # Handler
//! src/handler.rs
//!
//! Punto único de despacho. La aplicación que embebe el servidor implementa
//! [`Handler`]; el servidor solo conoce este trait.
//!
//! ```text
//! Connection → Request → Handler → ResponseBody → 200 / 404
//! ```

use crate::error::HandlerError;
use crate::http::{Request, ResponseBody};

/// Capacidad que convierte un request en contenido de respuesta
///
/// Un handler se comparte entre todos los threads de conexión, por eso
/// debe ser `Send + Sync`. Devolver `Err` produce la respuesta de fallo.
///
/// # Ejemplo
/// ```
/// use ocr_service::error::HandlerError;
/// use ocr_service::handler::Handler;
/// use ocr_service::http::{Request, ResponseBody};
///
/// struct Echo;
///
/// impl Handler for Echo {
///     fn handle_get(&self, request: &Request, out: &mut ResponseBody) -> Result<(), HandlerError> {
///         out.write_line(request.target());
///         Ok(())
///     }
///
///     fn handle_post(
///         &self,
///         _request: &Request,
///         body: &[u8],
///         out: &mut ResponseBody,
///     ) -> Result<(), HandlerError> {
///         out.write_bytes(body);
///         Ok(())
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Atiende un GET (nunca se lee body para GET)
    fn handle_get(&self, request: &Request, out: &mut ResponseBody) -> Result<(), HandlerError>;

    /// Atiende un POST con el body ya leído completo
    fn handle_post(
        &self,
        request: &Request,
        body: &[u8],
        out: &mut ResponseBody,
    ) -> Result<(), HandlerError>;
}
