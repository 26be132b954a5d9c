use crate::config::Endpoint;
use crate::director::Director;
use crate::proxy::forwarder::Forwarder;
use crate::proxy::http_server::serve_plaintext;
use crate::ssl_server::serve_tls;
use crate::transport::Transport;
use anyhow::{Context, Result};
use log::info;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Runs one serving loop per endpoint, all sharing one forwarder.
pub struct Supervisor {
    endpoints: Vec<Endpoint>,
    forwarder: Arc<Forwarder>,
    transport: Arc<Transport>,
}

impl Supervisor {
    pub fn new(endpoints: Vec<Endpoint>, director: Director, transport: Transport) -> Self {
        Self { endpoints, forwarder: Arc::new(Forwarder::new(director)), transport: Arc::new(transport) }
    }

    /// Start every listener and wait for the first one to fail.
    ///
    /// The other listeners are left running when that happens; they are detached
    /// tasks and stop with the runtime. Returns `Ok(())` once every listener has
    /// stopped cleanly, which for an empty endpoint list is immediately.
    pub async fn run(self) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Result<()>>();

        for endpoint in self.endpoints {
            let tx = tx.clone();
            let forwarder = self.forwarder.clone();
            let transport = self.transport.clone();
            tokio::spawn(async move {
                let outcome = serve_endpoint(&endpoint, forwarder, transport).await.with_context(|| format!("listener {} failed", endpoint));
                let _ = tx.send(outcome);
            });
        }
        drop(tx);

        while let Some(outcome) = rx.recv().await {
            outcome?;
        }
        Ok(())
    }
}

async fn serve_endpoint(endpoint: &Endpoint, forwarder: Arc<Forwarder>, transport: Arc<Transport>) -> Result<()> {
    let listener = transport.listen(&endpoint.network, &endpoint.address).await?;
    info!("listening network={} addr={} tls={} local={}", endpoint.network, endpoint.address, endpoint.tls, listener.local_addr()?);

    if endpoint.tls {
        serve_tls(listener, forwarder, transport.certificates()).await
    } else {
        serve_plaintext(listener, forwarder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Settings};
    use crate::director::{Strategy, UpstreamTarget};
    use crate::proxy::forwarder::tests::{read_echo, spawn_echo_upstream};
    use hyper::{Body, Client, Response, StatusCode};
    use std::net::SocketAddr;
    use std::time::Duration;

    fn free_port() -> u16 {
        std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
    }

    fn plaintext(port: u16) -> Endpoint {
        Endpoint { tls: false, network: "tcp".to_string(), address: format!("127.0.0.1:{port}") }
    }

    fn supervisor(upstream: SocketAddr, endpoints: Vec<Endpoint>) -> Supervisor {
        let remote = format!("http://{upstream}/base");
        let config = Config::try_from(Settings { listen: "port=80".to_string(), remote: remote.clone(), hostname: "localhost".to_string(), ..Settings::default() })
            .unwrap();
        let director = Director::new(Strategy::Generic, UpstreamTarget::parse(&remote).unwrap());
        Supervisor::new(endpoints, director, Transport::new(&config))
    }

    // Listeners bind asynchronously, so poll until the port answers.
    async fn get(port: u16, path: &str) -> Response<Body> {
        let client = Client::new();
        let uri: hyper::Uri = format!("http://127.0.0.1:{port}{path}").parse().unwrap();
        for _ in 0..100 {
            if let Ok(response) = client.get(uri.clone()).await {
                return response;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("nothing answered on port {port}");
    }

    #[tokio::test]
    async fn test_serves_every_endpoint() {
        let upstream = spawn_echo_upstream().await;
        let (first, second) = (free_port(), free_port());
        tokio::spawn(supervisor(upstream, vec![plaintext(first), plaintext(second)]).run());

        for port in [first, second] {
            let response = get(port, "/p?y=2").await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(read_echo(response).await["uri"], "/base/p?y=2");
        }
    }

    #[tokio::test]
    async fn test_failing_endpoint_does_not_stop_the_others() {
        let upstream = spawn_echo_upstream().await;
        let healthy = free_port();
        let broken = Endpoint { tls: false, network: "udp".to_string(), address: "127.0.0.1:0".to_string() };

        let err = tokio::time::timeout(Duration::from_secs(5), supervisor(upstream, vec![broken, plaintext(healthy)]).run())
            .await
            .expect("supervisor should report the failed listener")
            .unwrap_err();
        assert!(err.to_string().contains("listener network=udp"));
        assert!(format!("{err:#}").contains("unsupported network"));

        let response = get(healthy, "/still-up").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_echo(response).await["uri"], "/base/still-up");
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let upstream = spawn_echo_upstream().await;
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let result = tokio::time::timeout(Duration::from_secs(5), supervisor(upstream, vec![plaintext(port)]).run()).await.unwrap();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_no_endpoints_returns_immediately() {
        let upstream = spawn_echo_upstream().await;
        let result = tokio::time::timeout(Duration::from_secs(1), supervisor(upstream, Vec::new()).run()).await.unwrap();
        assert!(result.is_ok());
    }
}
