use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use reqwest::Url;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 4322;
pub const MESSAGE_PATH: &str = "/api/message";
pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Parser)]
#[command(
    name = "message-probe",
    author,
    version,
    about = "Posts the sample messages to the local message API and prints each exchange"
)]
pub struct Cli {
    /// Host the message API listens on.
    #[arg(long, env = "MESSAGE_PROBE_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port the message API listens on.
    #[arg(long, env = "MESSAGE_PROBE_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Pause after each message, in milliseconds.
    #[arg(long, env = "MESSAGE_PROBE_DELAY_MS", default_value_t = 2_000)]
    pub delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub host: String,
    pub port: u16,
    pub delay: Duration,
}

impl ProbeConfig {
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, MESSAGE_PATH)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            delay: DEFAULT_DELAY,
        }
    }
}

impl TryFrom<Cli> for ProbeConfig {
    type Error = anyhow::Error;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let host = cli.host.trim().to_string();
        if host.is_empty() {
            bail!("host must not be empty");
        }
        let config = Self {
            host,
            port: cli.port,
            delay: Duration::from_millis(cli.delay_ms),
        };
        Url::parse(&config.endpoint())
            .with_context(|| format!("invalid endpoint {}", config.endpoint()))?;
        Ok(config)
    }
}
