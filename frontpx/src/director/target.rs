use crate::config::ConfigError;
use crate::utils::path::split_escaped;
use hyper::Uri;
use hyper::http::uri::{Authority, Scheme};
use serde::{Serialize, Serializer};
use std::fmt::Display;

/// The single upstream every request is forwarded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    scheme: Scheme,
    authority: Authority,
    path: String,
    raw_path: String,
    query: String,
}

impl UpstreamTarget {
    /// Parse an absolute upstream URL, e.g. `https://registry-1.docker.io/v2`.
    pub fn parse(remote: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidRemote { remote: remote.to_string(), reason: reason.to_string() };

        let uri: Uri = remote.parse().map_err(|e: hyper::http::uri::InvalidUri| invalid(&e.to_string()))?;
        let scheme = uri.scheme().cloned().ok_or_else(|| invalid("missing scheme"))?;
        let authority = uri.authority().cloned().ok_or_else(|| invalid("missing host"))?;
        if authority.host().is_empty() {
            return Err(invalid("missing host"));
        }
        let (path, raw_path) = split_escaped(uri.path());
        let query = uri.query().unwrap_or_default().to_string();

        Ok(Self { scheme, authority, path, raw_path, query })
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Escaped path, empty unless the path carries percent escapes.
    pub fn raw_path(&self) -> &str {
        &self.raw_path
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

impl Display for UpstreamTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path = if self.raw_path.is_empty() { &self.path } else { &self.raw_path };
        write!(f, "{}://{}{}", self.scheme, self.authority, path)?;
        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }
        Ok(())
    }
}

impl Serialize for UpstreamTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
