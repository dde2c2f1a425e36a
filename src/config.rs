use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://portaldatransparencia.gov.br";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36";
const CONFIG_FILE: &str = "transparency";
const ENV_PREFIX: &str = "TRANSPARENCY";

/// Which browser layer drives the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Headless Chrome over CDP; renders the portal's scripts.
    Chrome,
    /// Plain HTTP GET; only sees server-rendered markup.
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub backend: Backend,
    pub headless: bool,
    pub user_agent: String,
    pub color: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            poll_interval_ms: 100,
            backend: Backend::Chrome,
            headless: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            color: true,
        }
    }
}

impl Settings {
    /// Defaults, then `transparency.toml` if present, then `TRANSPARENCY_*` env vars.
    pub fn load() -> Result<Self> {
        let d = Settings::default();
        let settings = ::config::Config::builder()
            .set_default("base_url", d.base_url)?
            .set_default("timeout_secs", d.timeout_secs)?
            .set_default("poll_interval_ms", d.poll_interval_ms)?
            .set_default("backend", "chrome")?
            .set_default("headless", d.headless)?
            .set_default("user_agent", d.user_agent)?
            .set_default("color", d.color)?
            .add_source(::config::File::with_name(CONFIG_FILE).required(false))
            .add_source(::config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to read configuration")?;

        settings
            .try_deserialize()
            .context("Invalid configuration values")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Portal origin that relative links are resolved against.
    pub fn base(&self) -> Result<Url> {
        Url::parse(&self.base_url)
            .with_context(|| format!("Invalid base_url: {}", self.base_url))
    }
}
