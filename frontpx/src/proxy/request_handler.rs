use crate::proxy::forwarder::Forwarder;
use hyper::{Body, Request, Response, header};
use log::{debug, info};
use std::convert::Infallible;
use std::net::SocketAddr;

/// Extract the host from the request URI or Host header
pub fn extract_host(req: &Request<Body>) -> Option<String> {
    if let Some(authority) = req.uri().authority() {
        return Some(authority.host().to_string());
    }

    if let Some(host) = req.headers().get(header::HOST).and_then(|hv| hv.to_str().ok()) {
        let host_only = host.split(':').next().unwrap_or(host);
        return Some(host_only.to_string());
    }
    None
}

/// Handle one request received on a `frontend_scheme` listener.
pub async fn handle_request(frontend_scheme: &str, remote_addr: SocketAddr, req: Request<Body>, forwarder: &Forwarder) -> Result<Response<Body>, Infallible> {
    let host = extract_host(&req).unwrap_or_else(|| "-".to_string());
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!(
        "Received request from {ip} for {fs}://{host}{path} -> {target} ({strategy})",
        ip = remote_addr,
        fs = frontend_scheme,
        host = host,
        path = path,
        target = forwarder.director().target(),
        strategy = forwarder.director().strategy()
    );
    debug!("Request details: {req:?}", req = req);

    let response = forwarder.forward(remote_addr, req).await;
    debug!("{method} {fs}://{host}{path} from {ip} -> {status}", fs = frontend_scheme, ip = remote_addr, status = response.status());
    Ok(response)
}
