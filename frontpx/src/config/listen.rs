//! Listen endpoint grammar.
//!
//! ```text
//! listen := group (';' group)*
//! group  := pair (',' pair)*
//! pair   := key '=' value
//! key    := 'tls' | 'addr' | 'port' | 'network' | <ignored>
//! ```

use crate::config::error::ConfigError;
use serde::Serialize;
use std::fmt::Display;

pub const DEFAULT_NETWORK: &str = "tcp";
pub const DEFAULT_TLS_ADDRESS: &str = ":443";
const PLAINTEXT_PORT_SUFFIX: &str = ":80";

/// One address/network/TLS-mode triple to listen on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub tls: bool,
    pub network: String,
    pub address: String,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self { tls: true, network: DEFAULT_NETWORK.to_string(), address: String::new() }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "network={} addr={} tls={}", self.network, self.address, self.tls)
    }
}

/// Parse a listen string into its endpoints, in order.
///
/// An empty listen string yields a single TLS endpoint on the standard secure port.
pub fn parse_listen(listen: &str) -> Result<Vec<Endpoint>, ConfigError> {
    if listen.is_empty() {
        return Ok(vec![Endpoint { address: DEFAULT_TLS_ADDRESS.to_string(), ..Endpoint::default() }]);
    }
    listen.split(';').map(parse_group).collect()
}

fn parse_group(group: &str) -> Result<Endpoint, ConfigError> {
    let mut endpoint = Endpoint::default();
    if group.is_empty() {
        return Ok(endpoint);
    }

    let mut tls_was_set = false;
    for pair in group.split(',') {
        let mut parts = pair.split('=');
        let (key, value) = match (parts.next(), parts.next(), parts.next()) {
            (Some(key), Some(value), None) => (key, value),
            _ => return Err(ConfigError::MalformedPair { pair: pair.to_string() }),
        };

        match key {
            "tls" => {
                endpoint.tls = parse_bool_permissive(value);
                tls_was_set = true;
            }
            "addr" => endpoint.address = value.to_string(),
            "port" => endpoint.address = format!(":{value}"),
            "network" => {
                endpoint.network = if value.is_empty() { DEFAULT_NETWORK.to_string() } else { value.to_string() };
            }
            // Unknown keys are tolerated so newer listen strings still start on older builds
            _ => {}
        }
    }

    if !tls_was_set && endpoint.address.ends_with(PLAINTEXT_PORT_SUFFIX) {
        endpoint.tls = false;
    }
    Ok(endpoint)
}

// Anything unrecognised reads as false rather than failing the whole listen string.
fn parse_bool_permissive(value: &str) -> bool {
    matches!(value, "1" | "t" | "T" | "true" | "TRUE" | "True")
}
