//! # Handler de OCR
//! src/ocr.rs
//!
//! Handler que trae el binario por defecto:
//!
//! - `GET`: página de prueba con la hora actual, el target y un formulario
//! - `POST`: el body es una imagen en base64; se decodifica y se pasa a un
//!   [`Recognizer`], cuyo texto es el body de la respuesta
//!
//! El motor de OCR real es externo. [`ImageProbe`] solo identifica el formato
//! y el tamaño de la imagen recibida.

use crate::error::HandlerError;
use crate::handler::Handler;
use crate::http::{Request, ResponseBody};
use base64ct::{Base64, Encoding};
use std::time::SystemTime;

/// Texto que se devuelve cuando no hay nada que reconocer
pub const NO_CONTENT: &str = "<No OCR content on this page>";

/// Convierte los bytes de una imagen en texto
pub trait Recognizer: Send + Sync + 'static {
    fn recognize(&self, image: &[u8]) -> Result<String, HandlerError>;
}

/// Formatos de imagen reconocidos por su número mágico
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Unknown,
}

impl ImageFormat {
    pub fn detect(bytes: &[u8]) -> Self {
        match bytes {
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => ImageFormat::Png,
            [0xFF, 0xD8, 0xFF, ..] => ImageFormat::Jpeg,
            [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => ImageFormat::Gif,
            [b'B', b'M', ..] => ImageFormat::Bmp,
            _ => ImageFormat::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Unknown => "unknown",
        }
    }
}

/// Recognizer que solo describe la imagen recibida
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageProbe;

impl Recognizer for ImageProbe {
    fn recognize(&self, image: &[u8]) -> Result<String, HandlerError> {
        let format = ImageFormat::detect(image);
        Ok(format!("received image: {} bytes ({})", image.len(), format.as_str()))
    }
}

/// Decodifica un body en base64 estándar, ignorando espacios y saltos de línea
pub fn decode_image(body: &[u8]) -> Result<Vec<u8>, HandlerError> {
    let compact: String = String::from_utf8_lossy(body)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    Base64::decode_vec(&compact).map_err(|e| format!("invalid base64 image: {}", e).into())
}

/// Handler HTTP que delega el reconocimiento en `R`
#[derive(Debug, Default, Clone)]
pub struct OcrHandler<R = ImageProbe> {
    recognizer: R,
}

impl<R: Recognizer> OcrHandler<R> {
    pub fn new(recognizer: R) -> Self {
        Self { recognizer }
    }
}

impl<R: Recognizer> Handler for OcrHandler<R> {
    fn handle_get(&self, request: &Request, out: &mut ResponseBody) -> Result<(), HandlerError> {
        tracing::info!(url = %request.target(), "request");

        out.write_line("<html><body><h1>test server</h1>");
        out.write_line(&format!(
            "Current Time: {}",
            httpdate::fmt_http_date(SystemTime::now())
        ));
        out.write_line(&format!("url : {}", request.target()));

        out.write_line("<form method=post action=/form>");
        out.write_line("<input type=text name=foo value=foovalue>");
        out.write_line("<input type=submit name=bar value=barvalue>");
        out.write_line("</form>");
        Ok(())
    }

    fn handle_post(
        &self,
        request: &Request,
        body: &[u8],
        out: &mut ResponseBody,
    ) -> Result<(), HandlerError> {
        tracing::info!(url = %request.target(), len = body.len(), "POST request");

        let image = decode_image(body)?;
        if image.is_empty() {
            out.write_line(NO_CONTENT);
            return Ok(());
        }

        let text = self.recognizer.recognize(&image)?;
        if text.is_empty() {
            out.write_line(NO_CONTENT);
        } else {
            out.write_line(&text);
        }
        Ok(())
    }
}
