// Director module
//
// Rewrites every inbound request onto the upstream target before it is forwarded.
// - target: the parsed upstream URL
// - Strategy/Director: the rewrite policy, picked once at startup

pub mod target;

pub use target::UpstreamTarget;

use crate::utils::path::{join_url_path, split_escaped};
use hyper::header::{HeaderValue, USER_AGENT};
use hyper::{Body, Request, Uri};
use serde::Serialize;
use std::fmt::Display;
use std::net::SocketAddr;
use thiserror::Error;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
const X_ORIGINAL_URI: &str = "x-original-uri";
const DOCKER_API_VERSION: &str = "docker-distribution-api-version";
const REGISTRY_API_VERSION: &str = "registry/2.0";

/// How inbound requests are rewritten for the upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Plain single-host reverse proxy rewrite.
    #[default]
    Generic,
    /// Registry-compatible rewrite with the forwarding headers a Docker registry expects.
    Docker,
}

impl Strategy {
    /// Resolve a strategy by name. Unknown names fall back to [`Strategy::Generic`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "docker" => Self::Docker,
            _ => Self::Generic,
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generic => write!(f, "generic"),
            Self::Docker => write!(f, "docker"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DirectorError {
    #[error("rewritten request URI is invalid: {0}")]
    Uri(#[from] hyper::http::Error),

    #[error("rewritten header value is invalid: {0}")]
    Header(#[from] hyper::header::InvalidHeaderValue),
}

/// Request rewrite shared by every listener.
#[derive(Debug, Clone)]
pub struct Director {
    strategy: Strategy,
    target: UpstreamTarget,
}

impl Director {
    pub fn new(strategy: Strategy, target: UpstreamTarget) -> Self {
        Self { strategy, target }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn target(&self) -> &UpstreamTarget {
        &self.target
    }

    /// Rewrite `req`, received from `remote_addr`, so that it addresses the upstream.
    pub fn direct(&self, remote_addr: SocketAddr, req: Request<Body>) -> Result<Request<Body>, DirectorError> {
        let (mut parts, body) = req.into_parts();

        let (req_path, req_raw_path) = split_escaped(parts.uri.path());
        let (path, raw_path) = join_url_path(self.target.path(), self.target.raw_path(), &req_path, &req_raw_path);
        let escaped_path = if raw_path.is_empty() { path } else { raw_path };
        let query = merge_query(self.target.query(), parts.uri.query().unwrap_or_default());

        let path_and_query = if query.is_empty() { escaped_path.clone() } else { format!("{escaped_path}?{query}") };
        parts.uri = Uri::builder()
            .scheme(self.target.scheme().clone())
            .authority(self.target.authority().clone())
            .path_and_query(path_and_query)
            .build()?;

        if self.strategy == Strategy::Docker {
            let headers = &mut parts.headers;
            if !headers.contains_key(USER_AGENT) {
                // Present but empty, so the forwarder does not fill in its own agent
                headers.insert(USER_AGENT, HeaderValue::from_static(""));
            }
            let remote = remote_addr.to_string();
            headers.insert(X_FORWARDED_FOR, HeaderValue::from_str(&format!("for={remote},proto=http"))?);
            headers.insert(X_REAL_IP, HeaderValue::from_str(&remote)?);
            headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));
            // Always the escaped joined path, never empty, where a raw-path-only value
            // would be blank for paths that need no escaping
            headers.insert(X_ORIGINAL_URI, HeaderValue::from_str(&escaped_path)?);
            headers.insert(DOCKER_API_VERSION, HeaderValue::from_static(REGISTRY_API_VERSION));
        }

        Ok(Request::from_parts(parts, body))
    }
}

fn merge_query(target_query: &str, req_query: &str) -> String {
    if target_query.is_empty() || req_query.is_empty() {
        format!("{target_query}{req_query}")
    } else {
        format!("{target_query}&{req_query}")
    }
}
