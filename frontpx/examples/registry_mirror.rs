//! Registry Mirror Example
//!
//! Fronts a private Docker registry on both the plaintext and the TLS port,
//! using the docker strategy so the registry sees the forwarding headers it
//! expects. Certificates are requested from the Let's Encrypt staging directory.
//!
//! # Usage
//!
//! ```bash
//! REGISTRY_HOSTNAME=registry.example.com cargo run --example registry_mirror
//! ```

use anyhow::Result;
use frontpx::config::{Config, Settings};
use frontpx::director::Director;
use frontpx::supervisor::Supervisor;
use frontpx::transport::Transport;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::env_logger::builder().format_timestamp(None).filter_level(log::LevelFilter::Info).init();

    let hostname = std::env::var("REGISTRY_HOSTNAME").unwrap_or_else(|_| "registry.example.com".to_string());
    let config = Config::try_from(Settings {
        listen: "port=80;port=443".to_string(),
        remote: "http://127.0.0.1:5000".to_string(),
        hostname,
        strategy: "docker".to_string(),
        debug: "full".to_string(),
        dir: "./registry-cache".to_string(),
        acme_staging: true,
        ..Settings::default()
    })?;
    info!("Resolved configuration:\n{}", config);

    let director = Director::new(config.get_strategy(), config.get_remote().clone());
    Supervisor::new(config.get_listen().to_vec(), director, Transport::new(&config)).run().await
}
