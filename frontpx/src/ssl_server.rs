use crate::proxy::forwarder::Forwarder;
use crate::proxy::request_handler::handle_request;
use crate::transport::CertificateSource;
use anyhow::{Context, Result};
use hyper::service::service_fn;
use hyper::{Body, Request};
use log::{debug, warn};
use rustls_acme::is_tls_alpn_challenge;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::LazyConfigAcceptor;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::rustls::server::Acceptor;

/// Terminate TLS on an already bound listener and proxy the decrypted traffic.
///
/// Clients pick HTTP/2 or HTTP/1.1 through ALPN. Only returns if the accept loop
/// itself stops; individual connection failures are logged.
pub async fn serve_tls(listener: TcpListener, forwarder: Arc<Forwarder>, certificates: CertificateSource) -> Result<()> {
    let certificates = CertificateSource { challenge: certificates.challenge, default: with_http_alpn(&certificates.default) };
    loop {
        let (tcp, remote_addr) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("TLS accept error: {}", e);
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                continue;
            }
        };

        let forwarder = forwarder.clone();
        let certificates = certificates.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_connection(tcp, remote_addr, forwarder, certificates).await {
                debug!("HTTPS connection from {} ended: {:#}", remote_addr, e);
            }
        });
    }
}

async fn serve_connection(tcp: TcpStream, remote_addr: SocketAddr, forwarder: Arc<Forwarder>, certificates: CertificateSource) -> Result<()> {
    let start = LazyConfigAcceptor::new(Acceptor::default(), tcp).await.context("Failed to read TLS client hello")?;

    if is_tls_alpn_challenge(&start.client_hello()) {
        debug!("Answering TLS-ALPN-01 challenge from {}", remote_addr);
        let mut tls = start.into_stream(certificates.challenge).await.context("TLS-ALPN-01 handshake failed")?;
        tls.shutdown().await?;
        return Ok(());
    }

    let tls = start.into_stream(certificates.default).await.context("TLS handshake failed")?;
    let service = service_fn(move |req: Request<Body>| {
        let forwarder = forwarder.clone();
        async move { handle_request("https", remote_addr, req, &forwarder).await }
    });

    let mut http = hyper::server::conn::Http::new();
    http.http1_keep_alive(true);
    http.serve_connection(tls, service).await.context("HTTPS connection error")
}

fn with_http_alpn(config: &ServerConfig) -> Arc<ServerConfig> {
    let mut config = config.clone();
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
    Arc::new(config)
}
