//! Listening sockets and TLS certificates for the listeners.
//!
//! Sockets are plain TCP for the `tcp`, `tcp4` and `tcp6` networks. Certificates
//! come from a single ACME state for the configured hostname, created the first
//! time a TLS listener asks for them and shared by every TLS listener after that.

use crate::config::{Config, Verbosity};
use anyhow::{Context, Result, anyhow, bail};
use log::{debug, error, info, warn};
use rustls_acme::AcmeConfig;
use rustls_acme::caches::DirCache;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tokio::net::TcpListener;
use tokio_rustls::rustls::ServerConfig;
use tokio_stream::StreamExt;

/// The two rustls configurations a TLS listener picks from per connection.
#[derive(Clone)]
pub struct CertificateSource {
    /// Answers TLS-ALPN-01 validation handshakes from the ACME directory.
    pub challenge: Arc<ServerConfig>,
    /// Serves the issued certificate, resolved by SNI.
    pub default: Arc<ServerConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Any,
    V4,
    V6,
}

impl Family {
    fn from_network(network: &str) -> Result<Self> {
        match network {
            "" | "tcp" => Ok(Self::Any),
            "tcp4" => Ok(Self::V4),
            "tcp6" => Ok(Self::V6),
            other => bail!("unsupported network {:?}", other),
        }
    }

    fn admits(self, addr: &SocketAddr) -> bool {
        match self {
            Self::Any => true,
            Self::V4 => addr.is_ipv4(),
            Self::V6 => addr.is_ipv6(),
        }
    }

    fn unspecified(self, port: u16) -> Vec<SocketAddr> {
        let v6 = SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port);
        let v4 = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
        match self {
            Self::Any => vec![v6, v4],
            Self::V4 => vec![v4],
            Self::V6 => vec![v6],
        }
    }
}

pub struct Transport {
    hostname: String,
    state_dir: PathBuf,
    acme_email: Option<String>,
    acme_staging: bool,
    verbosity: Verbosity,
    certificates: OnceLock<CertificateSource>,
}

impl Transport {
    pub fn new(config: &Config) -> Self {
        Self {
            hostname: config.get_hostname().to_string(),
            state_dir: config.get_state_dir().clone(),
            acme_email: config.get_acme_email().map(str::to_string),
            acme_staging: config.is_acme_staging(),
            verbosity: config.get_verbosity(),
            certificates: OnceLock::new(),
        }
    }

    /// Bind a listener for `address` (`host:port`, empty host for any host) on `network`.
    pub async fn listen(&self, network: &str, address: &str) -> Result<TcpListener> {
        let family = Family::from_network(network)?;
        let (host, port) = split_host_port(address)?;

        let candidates: Vec<SocketAddr> = if host.is_empty() {
            family.unspecified(port)
        } else if let Ok(ip) = host.parse::<IpAddr>() {
            vec![SocketAddr::new(ip, port)]
        } else {
            tokio::net::lookup_host((host, port)).await.with_context(|| format!("Failed to resolve {:?}", host))?.collect()
        };

        let mut last_error = None;
        for addr in candidates.into_iter().filter(|addr| family.admits(addr)) {
            match TcpListener::bind(addr).await {
                Ok(listener) => return Ok(listener),
                Err(e) => {
                    debug!("Failed to bind {} on {}: {}", network, addr, e);
                    last_error = Some(anyhow::Error::new(e).context(format!("Failed to bind {}", addr)));
                }
            }
        }
        Err(last_error.unwrap_or_else(|| anyhow!("no {} address available for {:?}", network, address)))
    }

    /// Certificates for TLS listeners. The ACME state behind them is started on first use.
    pub fn certificates(&self) -> CertificateSource {
        self.certificates.get_or_init(|| self.start_acme()).clone()
    }

    fn start_acme(&self) -> CertificateSource {
        if let Err(e) = std::fs::create_dir_all(&self.state_dir) {
            warn!("Failed to create state dir {}: {}", self.state_dir.display(), e);
        }

        let mut acme = AcmeConfig::new([self.hostname.clone()])
            .cache(DirCache::new(self.state_dir.clone()))
            .directory_lets_encrypt(!self.acme_staging);
        if let Some(email) = &self.acme_email {
            acme = acme.contact_push(format!("mailto:{}", email));
        }
        let mut state = acme.state();
        let certificates = CertificateSource { challenge: state.challenge_rustls_config(), default: state.default_rustls_config() };

        info!(
            "ACME certificates for {} cached in {} ({})",
            self.hostname,
            self.state_dir.display(),
            if self.acme_staging { "staging" } else { "production" }
        );

        let verbose = self.verbosity.is_verbose();
        tokio::spawn(async move {
            while let Some(event) = state.next().await {
                match event {
                    Ok(ok) if verbose => info!("ACME event: {:?}", ok),
                    Ok(ok) => debug!("ACME event: {:?}", ok),
                    Err(err) => error!("ACME error: {:?}", err),
                }
            }
        });

        certificates
    }
}

// "" binds an ephemeral port on any host.
fn split_host_port(address: &str) -> Result<(&str, u16)> {
    if address.is_empty() {
        return Ok(("", 0));
    }
    let (host, port) = address.rsplit_once(':').ok_or_else(|| anyhow!("address {:?}: missing port", address))?;
    let host = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')).unwrap_or(host);
    let port = if port.is_empty() { 0 } else { port.parse::<u16>().with_context(|| format!("address {:?}: invalid port", address))? };
    Ok((host, port))
}
