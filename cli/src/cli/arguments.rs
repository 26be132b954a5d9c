use clap::Parser;
use frontpx::config::Settings;

#[derive(Parser, Debug, Clone)]
#[command(name = "frontpx", about, author, version, long_about = None, propagate_version = true)]
pub struct FrontpxArguments {
    #[arg(long, env = "LISTEN", default_value = "", help = "Listen endpoints, e.g. 'port=80;port=443' (empty: TLS on :443)")]
    pub(crate) listen: String,
    #[arg(long, env = "REMOTE", default_value = "", help = "Upstream URL every request is forwarded to")]
    pub(crate) remote: String,
    #[arg(long, env = "HOSTNAME", default_value = "", help = "Hostname announced to the certificate authority")]
    pub(crate) hostname: String,
    #[arg(long, env = "STRATEGY", default_value = "", help = "Request rewrite strategy: 'docker' or generic (anything else)")]
    pub(crate) strategy: String,
    #[arg(long, env = "DEBUG", default_value = "", help = "Logging: empty is silent, 'full' is verbose, anything else is basic")]
    pub(crate) debug: String,
    #[arg(long, env = "DIR", default_value = "", help = "Certificate cache directory (default ./cache)")]
    pub(crate) dir: String,
    #[arg(long, env = "ACME_EMAIL", default_value = "", help = "Contact email for the ACME account")]
    pub(crate) acme_email: String,
    #[arg(long, env = "ACME_STAGING", help = "Use the Let's Encrypt staging directory")]
    pub(crate) acme_staging: bool,
    #[arg(long, help = "Validate the configuration, print it as JSON and exit")]
    pub(crate) check: bool,
}

impl FrontpxArguments {
    pub fn settings(&self) -> Settings {
        Settings {
            listen: self.listen.clone(),
            remote: self.remote.clone(),
            hostname: self.hostname.clone(),
            strategy: self.strategy.clone(),
            debug: self.debug.clone(),
            dir: self.dir.clone(),
            acme_email: self.acme_email.clone(),
            acme_staging: self.acme_staging,
        }
    }
}
