use crate::director::Director;
use hyper::client::HttpConnector;
use hyper::header::{CONNECTION, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use hyper::{Body, Client, Request, Response, StatusCode, Version};
use hyper_tls::HttpsConnector;
use log::{debug, error};
use std::net::SocketAddr;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const DEFAULT_USER_AGENT: &str = concat!("frontpx/", env!("CARGO_PKG_VERSION"));

// Headers that only describe the connection they arrived on.
const HOP_HEADERS: [&str; 9] = [
    "connection",
    "proxy-connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Forwards directed requests to the upstream and streams the responses back.
pub struct Forwarder {
    client: Client<HttpsConnector<HttpConnector>, Body>,
    director: Director,
}

impl Forwarder {
    pub fn new(director: Director) -> Self {
        let client = Client::builder().build::<_, Body>(HttpsConnector::new());
        Self { client, director }
    }

    pub fn director(&self) -> &Director {
        &self.director
    }

    /// Run one request through the director and the upstream.
    ///
    /// Never fails: rewrite and upstream errors both become `502 Bad Gateway`.
    pub async fn forward(&self, remote_addr: SocketAddr, req: Request<Body>) -> Response<Body> {
        let mut outbound = match self.director.direct(remote_addr, req) {
            Ok(outbound) => outbound,
            Err(e) => {
                error!("Failed to rewrite request from {}: {}", remote_addr, e);
                return bad_gateway();
            }
        };

        *outbound.version_mut() = Version::HTTP_11;
        let headers = outbound.headers_mut();
        remove_hop_headers(headers);
        // An agent blanked by the director means "send none"
        match headers.get(USER_AGENT).map(HeaderValue::is_empty) {
            None => {
                headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
            }
            Some(true) => {
                headers.remove(USER_AGENT);
            }
            Some(false) => {}
        }
        append_forwarded_for(headers, remote_addr);

        let upstream_uri = outbound.uri().clone();
        debug!("Forwarding request to {}: {:?}", upstream_uri, outbound);
        match self.client.request(outbound).await {
            Ok(mut response) => {
                remove_hop_headers(response.headers_mut());
                debug!("Upstream {} answered {}", upstream_uri, response.status());
                response
            }
            Err(e) => {
                error!("HTTP proxy error for {} -> {}: {}", remote_addr, upstream_uri, e);
                bad_gateway()
            }
        }
    }
}

fn bad_gateway() -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::BAD_GATEWAY;
    response
}

fn remove_hop_headers(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in &listed {
        headers.remove(name);
    }
    for name in HOP_HEADERS {
        headers.remove(name);
    }
}

// Prior hops are kept, joined into one value, with the client's IP last.
fn append_forwarded_for(headers: &mut HeaderMap, remote_addr: SocketAddr) {
    let client_ip = remote_addr.ip().to_string();
    let prior: Vec<&str> = headers.get_all(X_FORWARDED_FOR).iter().filter_map(|value| value.to_str().ok()).collect();
    let value = if prior.is_empty() { client_ip } else { format!("{}, {}", prior.join(", "), client_ip) };
    match HeaderValue::from_str(&value) {
        Ok(value) => {
            headers.insert(X_FORWARDED_FOR, value);
        }
        Err(e) => debug!("Dropping unrepresentable X-Forwarded-For {:?}: {}", value, e),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::director::{Strategy, UpstreamTarget};
    use hyper::service::{make_service_fn, service_fn};
    use std::collections::BTreeMap;
    use std::convert::Infallible;

    /// Upstream that answers every request with its URI and headers as JSON.
    pub(crate) async fn spawn_echo_upstream() -> SocketAddr {
        let make_svc = make_service_fn(|_conn| async {
            Ok::<_, Infallible>(service_fn(|req: Request<Body>| async move {
                let headers: BTreeMap<String, String> =
                    req.headers().iter().map(|(name, value)| (name.to_string(), value.to_str().unwrap_or_default().to_string())).collect();
                let echo = serde_json::json!({ "uri": req.uri().to_string(), "headers": headers });
                Ok::<_, Infallible>(
                    Response::builder()
                        .header("keep-alive", "timeout=5")
                        .header("x-upstream", "echo")
                        .body(Body::from(echo.to_string()))
                        .unwrap(),
                )
            }))
        });
        let server = hyper::Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0))).serve(make_svc);
        let addr = server.local_addr();
        tokio::spawn(server);
        addr
    }

    pub(crate) async fn read_echo(response: Response<Body>) -> serde_json::Value {
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn remote() -> SocketAddr {
        "203.0.113.7:51234".parse().unwrap()
    }

    fn forwarder(strategy: Strategy, target: &str) -> Forwarder {
        Forwarder::new(Director::new(strategy, UpstreamTarget::parse(target).unwrap()))
    }

    #[tokio::test]
    async fn test_forward_generic_request() {
        let upstream = spawn_echo_upstream().await;
        let forwarder = forwarder(Strategy::Generic, &format!("http://{upstream}/base?x=1"));
        let req = Request::builder()
            .uri("/p?y=2")
            .header("host", "front.example.com")
            .header("connection", "x-hop")
            .header("x-hop", "1")
            .header("x-keep", "2")
            .header("proxy-authorization", "Basic Zm9vOmJhcg==")
            .body(Body::empty())
            .unwrap();

        let response = forwarder.forward(remote(), req).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-upstream"], "echo");
        assert!(!response.headers().contains_key("keep-alive"));

        let echo = read_echo(response).await;
        assert_eq!(echo["uri"], "/base/p?x=1&y=2");
        let headers = &echo["headers"];
        assert_eq!(headers["host"], "front.example.com");
        assert_eq!(headers["x-keep"], "2");
        assert_eq!(headers["x-forwarded-for"], "203.0.113.7");
        assert_eq!(headers["user-agent"], DEFAULT_USER_AGENT);
        assert!(headers.get("x-hop").is_none());
        assert!(headers.get("proxy-authorization").is_none());
    }

    #[tokio::test]
    async fn test_forward_appends_to_existing_forwarded_for() {
        let upstream = spawn_echo_upstream().await;
        let forwarder = forwarder(Strategy::Generic, &format!("http://{upstream}"));
        let req = Request::builder()
            .uri("/")
            .header("x-forwarded-for", "10.0.0.1")
            .header("user-agent", "curl/8.0")
            .body(Body::empty())
            .unwrap();

        let echo = read_echo(forwarder.forward(remote(), req).await).await;
        assert_eq!(echo["headers"]["x-forwarded-for"], "10.0.0.1, 203.0.113.7");
        assert_eq!(echo["headers"]["user-agent"], "curl/8.0");
    }

    #[tokio::test]
    async fn test_forward_docker_request() {
        let upstream = spawn_echo_upstream().await;
        let forwarder = forwarder(Strategy::Docker, &format!("http://{upstream}"));
        let req = Request::builder().uri("/v2/").header("host", "mirror.example.com").body(Body::empty()).unwrap();

        let echo = read_echo(forwarder.forward(remote(), req).await).await;
        let headers = &echo["headers"];
        assert_eq!(echo["uri"], "/v2/");
        assert!(headers.get("user-agent").is_none());
        assert_eq!(headers["x-forwarded-for"], "for=203.0.113.7:51234,proto=http, 203.0.113.7");
        assert_eq!(headers["x-real-ip"], "203.0.113.7:51234");
        assert_eq!(headers["x-forwarded-proto"], "http");
        assert_eq!(headers["x-original-uri"], "/v2/");
        assert_eq!(headers["docker-distribution-api-version"], "registry/2.0");
    }

    #[tokio::test]
    async fn test_forward_unreachable_upstream_is_bad_gateway() {
        let port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let forwarder = forwarder(Strategy::Generic, &format!("http://127.0.0.1:{port}"));
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = forwarder.forward(remote(), req).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_remove_hop_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive, x-session"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-session", HeaderValue::from_static("abc"));
        headers.insert("upgrade", HeaderValue::from_static("websocket"));
        headers.insert("accept", HeaderValue::from_static("*/*"));

        remove_hop_headers(&mut headers);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers["accept"], "*/*");
    }
}
