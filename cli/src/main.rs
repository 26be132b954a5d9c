mod cli;

use crate::cli::FrontpxArguments;
use anyhow::Result;
use clap::Parser;
use frontpx::config::{Config, Verbosity};
use frontpx::director::Director;
use frontpx::supervisor::Supervisor;
use frontpx::transport::Transport;
use log::{info, trace};

#[tokio::main]
async fn main() -> Result<()> {
    let args = FrontpxArguments::parse();
    pretty_env_logger::env_logger::builder()
        .format_timestamp(None)
        .filter_level(Verbosity::from_debug(&args.debug).level_filter())
        .init();
    trace!("Arguments: {:#?}", args);

    let config = Config::try_from(args.settings())?;
    if args.check {
        println!("{}", config);
        return Ok(());
    }

    info!(
        "Opening reverse proxy to remote={} hostname={} strategy={}",
        config.get_remote(),
        config.get_hostname(),
        config.get_strategy()
    );

    let director = Director::new(config.get_strategy(), config.get_remote().clone());
    let supervisor = Supervisor::new(config.get_listen().to_vec(), director, Transport::new(&config));

    tokio::select! {
        result = supervisor.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            Ok(())
        }
    }
}
