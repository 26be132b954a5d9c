use crate::config::listen::Endpoint;
use crate::director::{Strategy, UpstreamTarget};
use log::LevelFilter;
use serde::Serialize;
use std::fmt::Display;
use std::path::PathBuf;

pub const DEFAULT_STATE_DIR: &str = "./cache";

/// Raw, unvalidated startup inputs, as read from the environment or flags.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub listen: String,
    pub remote: String,
    pub hostname: String,
    pub strategy: String,
    pub debug: String,
    pub dir: String,
    pub acme_email: String,
    pub acme_staging: bool,
}

/// How much the process and the transport should report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    #[default]
    Suppressed,
    Basic,
    Verbose,
}

impl Verbosity {
    pub fn from_debug(debug: &str) -> Self {
        match debug {
            "" => Self::Suppressed,
            "full" => Self::Verbose,
            _ => Self::Basic,
        }
    }

    pub fn level_filter(self) -> LevelFilter {
        match self {
            Self::Suppressed => LevelFilter::Off,
            Self::Basic => LevelFilter::Info,
            Self::Verbose => LevelFilter::Trace,
        }
    }

    pub fn is_verbose(self) -> bool {
        self == Self::Verbose
    }
}

/// Validated, immutable process configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub(crate) listen: Vec<Endpoint>,
    pub(crate) remote: UpstreamTarget,
    pub(crate) hostname: String,
    pub(crate) strategy: Strategy,
    pub(crate) verbosity: Verbosity,
    pub(crate) state_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) acme_email: Option<String>,
    pub(crate) acme_staging: bool,
}

impl Config {
    pub fn get_listen(&self) -> &[Endpoint] {
        &self.listen
    }

    pub fn get_remote(&self) -> &UpstreamTarget {
        &self.remote
    }

    pub fn get_hostname(&self) -> &str {
        &self.hostname
    }

    pub fn get_strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn get_verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn get_state_dir(&self) -> &PathBuf {
        &self.state_dir
    }

    pub fn get_acme_email(&self) -> Option<&str> {
        self.acme_email.as_deref()
    }

    pub fn is_acme_staging(&self) -> bool {
        self.acme_staging
    }

    pub fn has_tls_listener(&self) -> bool {
        self.listen.iter().any(|endpoint| endpoint.tls)
    }
}

impl Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let json = serde_json::to_string_pretty(self).map_err(|_| std::fmt::Error)?;
        writeln!(f, "{}", json)
    }
}
