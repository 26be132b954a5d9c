use crate::config::error::ConfigError;
use crate::config::listen::parse_listen;
use crate::config::types::{Config, DEFAULT_STATE_DIR, Settings, Verbosity};
use crate::director::{Strategy, UpstreamTarget};
use crate::utils::validation::{is_acme_domain, is_empty_or_whitespace};
use log::warn;
use std::path::PathBuf;

impl TryFrom<Settings> for Config {
    type Error = ConfigError;

    /// Validate raw settings. Runs before any listener is bound.
    fn try_from(settings: Settings) -> Result<Self, Self::Error> {
        if is_empty_or_whitespace(&settings.remote) {
            return Err(ConfigError::BlankRemote);
        }
        if is_empty_or_whitespace(&settings.hostname) {
            return Err(ConfigError::BlankHostname);
        }

        let listen = parse_listen(&settings.listen)?;
        let remote = UpstreamTarget::parse(settings.remote.trim())?;

        let state_dir = if is_empty_or_whitespace(&settings.dir) {
            PathBuf::from(DEFAULT_STATE_DIR)
        } else {
            PathBuf::from(settings.dir)
        };
        let acme_email = if is_empty_or_whitespace(&settings.acme_email) { None } else { Some(settings.acme_email.trim().to_string()) };

        let config = Config {
            listen,
            remote,
            hostname: settings.hostname.trim().to_string(),
            strategy: Strategy::from_name(&settings.strategy),
            verbosity: Verbosity::from_debug(&settings.debug),
            state_dir,
            acme_email,
            acme_staging: settings.acme_staging,
        };

        if config.has_tls_listener() && !is_acme_domain(&config.hostname) {
            warn!("Hostname {} is not a valid ACME domain; TLS listeners will not obtain a certificate", config.hostname);
        }

        Ok(config)
    }
}
