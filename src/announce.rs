//! # Anuncio de IP
//! src/announce.rs
//!
//! Al arrancar, el servidor puede reportar la IP de esta máquina a un
//! registro externo con un único GET. Es opcional y un fallo acá nunca
//! impide que el servidor arranque.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// Destino usado solo para elegir la interfaz de salida (no se envían paquetes)
const PROBE_TARGET: (Ipv4Addr, u16) = (Ipv4Addr::new(192, 0, 2, 1), 9);

/// Error al anunciar la IP
#[derive(Debug, thiserror::Error)]
pub enum AnnounceError {
    #[error("could not determine local address: {0}")]
    LocalAddress(#[from] std::io::Error),

    #[error("announce request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// IPv4 de la interfaz por la que saldría el tráfico
///
/// Un socket UDP "conectado" no manda nada, pero obliga al sistema a elegir
/// la dirección local de la ruta por defecto.
pub fn local_ipv4() -> std::io::Result<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect(PROBE_TARGET)?;
    Ok(socket.local_addr()?.ip())
}

/// Agrega `set=<ip>` a la query de `base`
///
/// # Ejemplo
/// ```
/// use ocr_service::announce::announce_url;
/// use std::net::{IpAddr, Ipv4Addr};
///
/// let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7));
/// assert_eq!(
///     announce_url("http://registry.local/?varname=ocr", ip),
///     "http://registry.local/?varname=ocr&set=10.0.0.7"
/// );
/// assert_eq!(announce_url("http://registry.local/", ip), "http://registry.local/?set=10.0.0.7");
/// ```
pub fn announce_url(base: &str, ip: IpAddr) -> String {
    let separator = if !base.contains('?') {
        "?"
    } else if base.ends_with('?') || base.ends_with('&') {
        ""
    } else {
        "&"
    };
    format!("{}{}set={}", base, separator, ip)
}

/// Cliente HTTP del anuncio; acepta URLs `https://` con rustls
fn client() -> Result<reqwest::blocking::Client, reqwest::Error> {
    reqwest::blocking::Client::builder().use_rustls_tls().build()
}

/// Reporta la IP local a `base` y devuelve la IP anunciada
pub fn announce(base: &str) -> Result<IpAddr, AnnounceError> {
    let ip = local_ipv4()?;
    let url = announce_url(base, ip);

    tracing::debug!(url = %url, "announcing address");
    client()?.get(&url).send()?.error_for_status()?;
    tracing::info!(ip = %ip, "done uploading ip");
    Ok(ip)
}
