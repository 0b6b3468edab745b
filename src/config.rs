use std::{collections::HashMap, path::PathBuf, time::Duration};

use config::{Config as ConfigLib, ConfigError, Environment, File};
use redis::{
    Client as RedisClient, RedisResult,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    #[serde(default)]
    pub verification: VerificationConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub uri: SecretString,
}

impl RedisConfig {
    /// Establishes a new Redis connection based on the provided URI.
    ///
    /// - To enable TLS, the URI must use the `rediss://` scheme.
    /// - To enable insecure TLS, the URI must use the `rediss://` scheme and end with `/#insecure`.
    ///
    /// # Errors
    /// Returns an error if the connection cannot be established.
    pub async fn start(&self) -> RedisResult<ConnectionManager> {
        let client = RedisClient::open(self.uri.expose_secret())?;
        let config = ConnectionManagerConfig::new().set_connection_timeout(Duration::from_secs(60));
        client.get_connection_manager_with_config(config).await
    }
}

/// Which checks run for every signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub content: bool,
    pub key_usage: bool,
    pub certificate_policy: bool,
    pub chain: bool,
    pub chain_with_crl: bool,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            content: true,
            key_usage: true,
            certificate_policy: true,
            chain: true,
            chain_with_crl: true,
        }
    }
}

/// Sources and pacing of trust store updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Six-field cron expression, seconds first.
    pub schedule: String,
    pub run_on_startup: bool,
    pub fetch_concurrency: usize,
    pub fetch_timeout_secs: u64,
    pub trusted_directories: Vec<PathBuf>,
    pub intermediate_directories: Vec<PathBuf>,
    /// XML registry feeds; their certificates are stored as intermediates.
    pub certificate_feeds: Vec<String>,
    pub crl_url_feeds: Vec<String>,
    pub crl_url_lists: Vec<PathBuf>,
}

impl IngestConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            schedule: "0 0 3 * * *".to_string(),
            run_on_startup: true,
            fetch_concurrency: 16,
            fetch_timeout_secs: 30,
            trusted_directories: Vec::new(),
            intermediate_directories: Vec::new(),
            certificate_feeds: Vec::new(),
            crl_url_feeds: Vec::new(),
            crl_url_lists: Vec::new(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_sources(None)
    }

    pub fn load_with_sources(
        env_vars: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = ConfigLib::builder()
            .set_default("server.host", "localhost")?
            .set_default("server.port", 3000)?
            .add_source(File::with_name("config/settings").required(false));

        // Explicit overrides replace the process environment so tests stay isolated
        if let Some(vars) = env_vars {
            for (key, value) in vars {
                builder = builder.set_override(&key, value)?;
            }
        } else {
            // Format: APP_SERVER__HOST, APP_INGEST__FETCH_CONCURRENCY
            builder = builder.add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("ingest.trusted_directories")
                    .with_list_parse_key("ingest.intermediate_directories")
                    .with_list_parse_key("ingest.certificate_feeds")
                    .with_list_parse_key("ingest.crl_url_feeds")
                    .with_list_parse_key("ingest.crl_url_lists")
                    .try_parsing(true),
            );
        }

        builder.build()?.try_deserialize()
    }
}
