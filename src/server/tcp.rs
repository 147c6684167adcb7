//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Acepta conexiones en un loop y atiende cada una en su propio thread, así
//! un handler lento no frena el `accept` de las demás. No hay límite de
//! threads ni estado compartido entre conexiones, salvo el socket de escucha.

use super::connection::{handle_connection, Outcome};
use crate::config::ServerConfig;
use crate::handler::Handler;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Pausa tras un `accept` fallido (p. ej. sin file descriptors libres)
const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

/// Servidor HTTP/1.0, un thread por conexión
pub struct Server {
    config: Arc<ServerConfig>,
    handler: Arc<dyn Handler>,
    listener: TcpListener,
    active: Arc<AtomicBool>,
}

/// Permite detener el loop de `accept` desde otro thread
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    active: Arc<AtomicBool>,
    wake_addr: SocketAddr,
}

impl Server {
    /// Hace bind en la dirección configurada
    ///
    /// El puerto 0 pide un puerto libre al sistema; ver [`Server::local_addr`].
    pub fn bind<H: Handler>(config: ServerConfig, handler: H) -> io::Result<Self> {
        let address = config.address();
        let listener = TcpListener::bind(&address)?;
        let local_addr = listener.local_addr()?;
        tracing::info!(address = %local_addr, "listening");

        Ok(Self {
            config: Arc::new(config),
            handler: Arc::new(handler),
            listener,
            active: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Dirección real en la que quedó escuchando
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> io::Result<ShutdownHandle> {
        Ok(ShutdownHandle {
            active: Arc::clone(&self.active),
            wake_addr: loopback_for(self.local_addr()?),
        })
    }

    /// Acepta conexiones hasta que se dispare el [`ShutdownHandle`]
    ///
    /// Los errores de `accept` se registran y el loop sigue tras una pausa
    /// de `ACCEPT_BACKOFF`. Las conexiones en curso no se esperan al salir.
    pub fn run(&self) -> io::Result<()> {
        tracing::info!("accepting connections, one thread per connection");

        for stream in self.listener.incoming() {
            if !self.active.load(Ordering::SeqCst) {
                break;
            }

            match stream {
                Ok(stream) => self.spawn_worker(stream),
                Err(e) => accept_failed(&e),
            }
        }

        tracing::info!("server stopped");
        Ok(())
    }

    fn spawn_worker(&self, stream: TcpStream) {
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        let handler = Arc::clone(&self.handler);
        let config = Arc::clone(&self.config);
        let span = tracing::info_span!("conn", peer = %peer);

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", peer))
            .spawn(move || {
                let _entered = span.enter();
                match handle_connection(stream, handler.as_ref(), &config) {
                    Ok(outcome) => log_outcome(&outcome),
                    Err(e) => tracing::warn!(error = %e, "connection error"),
                }
            });

        if let Err(e) = spawned {
            tracing::error!(peer = %peer, error = %e, "could not spawn connection thread");
        }
    }
}

impl ShutdownHandle {
    /// Detiene el servidor
    ///
    /// Baja la bandera y abre una conexión local para despertar el `accept`
    /// bloqueado; esa conexión se descarta sin procesar.
    pub fn shutdown(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            if let Err(e) = TcpStream::connect(self.wake_addr) {
                tracing::warn!(error = %e, "could not wake accept loop");
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Registra el error y frena el loop un momento para no girar en vacío
fn accept_failed(error: &io::Error) {
    tracing::error!(error = %error, "accept failed");
    thread::sleep(ACCEPT_BACKOFF);
}

fn log_outcome(outcome: &Outcome) {
    match outcome.status() {
        Some(status) if status.is_success() => {
            tracing::info!(status = status.as_u16(), "done")
        }
        Some(status) => tracing::debug!(status = status.as_u16(), ?outcome, "done"),
        None => tracing::debug!(?outcome, "done without response"),
    }
}

/// Dirección a la que conectarse para llegar al listener desde esta máquina
fn loopback_for(addr: SocketAddr) -> SocketAddr {
    match addr {
        SocketAddr::V4(v4) if v4.ip().is_unspecified() => {
            SocketAddr::from((Ipv4Addr::LOCALHOST, v4.port()))
        }
        SocketAddr::V6(v6) if v6.ip().is_unspecified() => {
            SocketAddr::from((Ipv6Addr::LOCALHOST, v6.port()))
        }
        other => other,
    }
}
