use crate::proxy::forwarder::Forwarder;
use crate::proxy::request_handler::handle_request;
use anyhow::{Context, Result};
use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Serve plain HTTP/1.1 on an already bound listener until the server fails.
pub async fn serve_plaintext(listener: TcpListener, forwarder: Arc<Forwarder>) -> Result<()> {
    let local_addr = listener.local_addr()?;

    let make_svc = make_service_fn(move |conn: &AddrStream| {
        let remote_addr = conn.remote_addr();
        let forwarder = forwarder.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                let forwarder = forwarder.clone();
                async move { handle_request("http", remote_addr, req, &forwarder).await }
            }))
        }
    });

    let builder = hyper::Server::from_tcp(listener.into_std()?).with_context(|| format!("Failed to adopt listener on {}", local_addr))?;
    builder.http1_only(true).serve(make_svc).await.with_context(|| format!("HTTP server on {} stopped", local_addr))
}
