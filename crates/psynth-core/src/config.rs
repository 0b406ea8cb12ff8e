//! Configuration for talking to a Psynth server.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`PSYNTH_SERVER__` prefix, e.g. `PSYNTH_SERVER__URL`)
//! 2. Config file (`psynth.toml`, `[server]` section)
//! 3. Defaults

use serde::Deserialize;

use crate::error::CoreError;

/// Where the server lives and who we are.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// Base URL of the server, e.g. `https://psynth.psymphonic.com/`.
    #[serde(default = "default_url")]
    pub url: String,

    /// Username authorized to access the graph.
    #[serde(default)]
    pub user: String,

    /// Password matching `user`.
    #[serde(default)]
    pub password: String,

    /// Skip TLS certificate verification (self-signed development servers).
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

fn default_url() -> String {
    "https://psynth.psymphonic.com/".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            user: String::new(),
            password: String::new(),
            accept_invalid_certs: false,
        }
    }
}

impl ServerConfig {
    /// Load the `[server]` section from `{file_prefix}.toml` and the environment.
    pub fn load(file_prefix: &str) -> Result<Self, CoreError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("PSYNTH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        match cfg.get::<ServerConfig>("server") {
            Ok(c) => Ok(c),
            Err(config::ConfigError::NotFound(_)) => {
                tracing::debug!(file_prefix, "No [server] configuration found, using defaults");
                Ok(ServerConfig::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The base URL, always ending in `/`.
    pub fn base_url(&self) -> String {
        if self.url.ends_with('/') {
            self.url.clone()
        } else {
            format!("{}/", self.url)
        }
    }
}
