//! # OCR Service - Entry Point
//! src/main.rs
//!
//! Lee la configuración, anuncia la IP si corresponde y arranca el servidor.

use ocr_service::announce;
use ocr_service::config::ServerConfig;
use ocr_service::ocr::{ImageProbe, OcrHandler};
use ocr_service::server::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ocr_service=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::new();
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "invalid configuration");
        std::process::exit(1);
    }

    tracing::info!(
        address = %config.address(),
        max_body_bytes = config.max_body_bytes,
        read_timeout_ms = ?config.read_timeout_ms,
        "configuration loaded"
    );

    if let Some(url) = &config.announce_url {
        if let Err(e) = announce::announce(url) {
            tracing::warn!(error = %e, "could not announce address");
        }
    }

    let server = match Server::bind(config, OcrHandler::new(ImageProbe)) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "could not bind");
            std::process::exit(1);
        }
    };

    tracing::info!("server started");
    if let Err(e) = server.run() {
        tracing::error!(error = %e, "fatal server error");
        std::process::exit(1);
    }
}
