//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use contractbook::DurationValue;
use contractbook_broker::Basis;
use contractbook_broker::deriv::{ClientConfig, DEFAULT_ENDPOINT};
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub order: OrderConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Deserialize)]
pub struct ConnectionConfig {
    pub app_id: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Inline API token. Prefer `token_env`.
    #[serde(default)]
    pub token: Option<String>,
    /// Name of an environment variable holding the API token.
    #[serde(default)]
    pub token_env: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,
    #[serde(default = "default_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("app_id", &self.app_id)
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("token_env", &self.token_env)
            .field("timeout_secs", &self.timeout_secs)
            .field("ping_interval_secs", &self.ping_interval_secs)
            .field("max_reconnect_attempts", &self.max_reconnect_attempts)
            .field("reconnect_delay_ms", &self.reconnect_delay_ms)
            .finish()
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.into()
}
fn default_timeout() -> u64 {
    30
}
fn default_ping_interval() -> u64 {
    30
}
fn default_reconnect_attempts() -> u32 {
    5
}
fn default_reconnect_delay() -> u64 {
    2000
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderConfig {
    #[serde(default = "default_amount")]
    pub amount: f64,
    #[serde(default)]
    pub basis: Basis,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Duration token offered as the default at the prompt.
    #[serde(default = "default_duration")]
    pub duration: String,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            amount: default_amount(),
            basis: Basis::default(),
            currency: default_currency(),
            duration: default_duration(),
        }
    }
}

fn default_amount() -> f64 {
    1.0
}
fn default_currency() -> String {
    "USD".into()
}
fn default_duration() -> String {
    "5t".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,
    #[serde(default = "default_poll_timeout")]
    pub timeout_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval(),
            timeout_secs: default_poll_timeout(),
        }
    }
}

fn default_poll_interval() -> u64 {
    1000
}
fn default_poll_timeout() -> u64 {
    600
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_journal_file")]
    pub journal_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            journal_file: default_journal_file(),
        }
    }
}

fn default_log_dir() -> String {
    "./logs".into()
}
fn default_journal_file() -> String {
    "journal.jsonl".into()
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    pub fn validate(&self) -> Result<()> {
        if self.connection.app_id.trim().is_empty() {
            return Err(Error::Config("app_id must not be empty".into()));
        }
        if !self.connection.endpoint.starts_with("ws://")
            && !self.connection.endpoint.starts_with("wss://")
        {
            return Err(Error::Config(format!(
                "endpoint must be a ws:// or wss:// URL, got '{}'",
                self.connection.endpoint
            )));
        }
        match (&self.connection.token, &self.connection.token_env) {
            (Some(_), Some(_)) => {
                return Err(Error::Config(
                    "set either token or token_env, not both".into(),
                ));
            }
            (None, None) => {
                return Err(Error::Config("one of token or token_env is required".into()));
            }
            _ => {}
        }
        if self.connection.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be > 0".into()));
        }
        if self.order.amount.is_nan() || self.order.amount <= 0.0 {
            return Err(Error::Config("order amount must be > 0".into()));
        }
        if self.order.currency.len() != 3
            || !self.order.currency.chars().all(|c| c.is_ascii_uppercase())
        {
            return Err(Error::Config(format!(
                "currency must be a 3-letter code, got '{}'",
                self.order.currency
            )));
        }
        self.default_duration()?;
        if self.polling.interval_ms == 0 {
            return Err(Error::Config("polling interval_ms must be > 0".into()));
        }
        if self.polling.timeout_secs == 0 {
            return Err(Error::Config("polling timeout_secs must be > 0".into()));
        }
        Ok(())
    }

    /// The configured default duration, parsed.
    pub fn default_duration(&self) -> Result<DurationValue> {
        DurationValue::parse(&self.order.duration)
            .map_err(|e| Error::Config(format!("order duration: {e}")))
    }

    /// Resolve the API token from `token` or the `token_env` variable.
    pub fn resolve_token(&self) -> Result<Zeroizing<String>> {
        let token = match (&self.connection.token, &self.connection.token_env) {
            (Some(token), _) => Zeroizing::new(token.trim().to_string()),
            (None, Some(var)) => {
                let raw = Zeroizing::new(std::env::var(var).map_err(|_| {
                    Error::Config(format!("environment variable {var} is not set"))
                })?);
                Zeroizing::new(raw.trim().to_string())
            }
            (None, None) => {
                return Err(Error::Config("one of token or token_env is required".into()));
            }
        };
        if token.is_empty() {
            return Err(Error::Config("API token is empty".into()));
        }
        Ok(token)
    }

    /// Websocket client settings, with the token resolved.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let c = &self.connection;
        let mut client = ClientConfig::new(&c.app_id, self.resolve_token()?);
        client.endpoint = c.endpoint.clone();
        client.timeout = Duration::from_secs(c.timeout_secs);
        client.ping_interval = Duration::from_secs(c.ping_interval_secs);
        client.max_reconnect_attempts = c.max_reconnect_attempts;
        client.reconnect_delay = Duration::from_millis(c.reconnect_delay_ms);
        Ok(client)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.polling.interval_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.polling.timeout_secs)
    }

    /// Full path to the journal file.
    pub fn journal_path(&self) -> PathBuf {
        Path::new(&self.logging.dir).join(&self.logging.journal_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_toml() -> &'static str {
        r#"
[connection]
app_id = "1089"
token_env = "CONTRACTBOT_TEST_TOKEN_UNSET"
timeout_secs = 20

[order]
amount = 2.5
basis = "payout"
currency = "EUR"
duration = "15m"

[polling]
interval_ms = 500
timeout_secs = 120

[logging]
dir = "./logs"
journal_file = "trades.jsonl"
"#
    }

    fn minimal_toml() -> &'static str {
        r#"
[connection]
app_id = "1089"
token = "abc123"
"#
    }

    #[test]
    fn parse_example_config() {
        let config: Config = toml::from_str(example_toml()).unwrap();
        assert_eq!(config.connection.app_id, "1089");
        assert_eq!(config.connection.timeout_secs, 20);
        assert_eq!(config.connection.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.order.basis, Basis::Payout);
        assert_eq!(config.order.amount, 2.5);
        assert_eq!(config.polling.interval_ms, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let config: Config = toml::from_str(minimal_toml()).unwrap();
        assert_eq!(config.order.amount, 1.0);
        assert_eq!(config.order.currency, "USD");
        assert_eq!(config.order.duration, "5t");
        assert_eq!(config.polling.timeout_secs, 600);
        assert_eq!(config.connection.max_reconnect_attempts, 5);
        assert_eq!(config.connection.reconnect_delay_ms, 2000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_catches_empty_app_id() {
        let mut config: Config = toml::from_str(minimal_toml()).unwrap();
        config.connection.app_id = " ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_requires_exactly_one_token_source() {
        let mut config: Config = toml::from_str(minimal_toml()).unwrap();
        config.connection.token_env = Some("X".into());
        assert!(config.validate().is_err());
        config.connection.token = None;
        config.connection.token_env = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_catches_bad_order() {
        let mut config: Config = toml::from_str(minimal_toml()).unwrap();
        config.order.amount = 0.0;
        assert!(config.validate().is_err());

        let mut config: Config = toml::from_str(minimal_toml()).unwrap();
        config.order.currency = "usd".into();
        assert!(config.validate().is_err());

        let mut config: Config = toml::from_str(minimal_toml()).unwrap();
        config.order.duration = "5x".into();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn validate_catches_bad_endpoint() {
        let mut config: Config = toml::from_str(minimal_toml()).unwrap();
        config.connection.endpoint = "https://ws.derivws.com".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn inline_token_resolves() {
        let config: Config = toml::from_str(minimal_toml()).unwrap();
        assert_eq!(config.resolve_token().unwrap().as_str(), "abc123");
        let client = config.client_config().unwrap();
        assert_eq!(client.url(), format!("{DEFAULT_ENDPOINT}?app_id=1089"));
    }

    #[test]
    fn missing_env_token_is_config_error() {
        let config: Config = toml::from_str(example_toml()).unwrap();
        assert!(matches!(config.resolve_token(), Err(Error::Config(_))));
    }

    #[test]
    fn debug_hides_token() {
        let config: Config = toml::from_str(minimal_toml()).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("abc123"));
    }

    #[test]
    fn journal_path() {
        let config: Config = toml::from_str(example_toml()).unwrap();
        assert_eq!(config.journal_path(), PathBuf::from("./logs/trades.jsonl"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, minimal_toml()).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.connection.token.as_deref(), Some("abc123"));

        assert!(matches!(
            Config::load(&dir.path().join("missing.toml")),
            Err(Error::ConfigRead { .. })
        ));
    }
}
