//! Basic Proxy Example
//!
//! Builds the configuration in code and serves a single plaintext listener
//! that forwards everything to a local upstream.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example basic_proxy
//! curl http://127.0.0.1:8080/health
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

    let config = Config::try_from(Settings {
        listen: "addr=127.0.0.1:8080,tls=false".to_string(),
        remote: "http://127.0.0.1:3000/api".to_string(),
        hostname: "localhost".to_string(),
        ..Settings::default()
    })?;
    info!("Proxying {} -> {}", config.get_listen()[0], config.get_remote());

    let director = Director::new(config.get_strategy(), config.get_remote().clone());
    let supervisor = Supervisor::new(config.get_listen().to_vec(), director, Transport::new(&config));
    supervisor.run().await
}
