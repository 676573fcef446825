use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Args;

use crate::auth::TokenService;
use crate::autopilot::publisher::{DisabledPublisher, PostizClient, Publisher};
use crate::db::Database;

/// Settings shared by every subcommand. Each flag falls back to an
/// environment variable.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Address to bind the HTTP API to
    #[arg(long, env = "EPIC_HOST", default_value = "127.0.0.1", global = true)]
    pub host: String,

    /// Port for HTTP API
    #[arg(short, long, env = "EPIC_PORT", default_value = "3000", global = true)]
    pub port: u16,

    /// SQLite database file (defaults to the platform data directory)
    #[arg(long, env = "EPIC_DATABASE", global = true)]
    pub database: Option<PathBuf>,

    /// Secret used to sign session tokens
    #[arg(long, env = "EPIC_SESSION_SECRET", hide_env_values = true, global = true)]
    pub session_secret: Option<String>,

    /// Secret shared with the SSO issuer for auto-login tokens
    #[arg(long, env = "EPIC_SSO_SECRET", hide_env_values = true, global = true)]
    pub sso_secret: Option<String>,

    /// Secret expected in the x-trigger-secret header of autopilot triggers
    #[arg(long, env = "EPIC_TRIGGER_SECRET", hide_env_values = true, global = true)]
    pub trigger_secret: Option<String>,

    /// Session token lifetime in seconds
    #[arg(long, env = "EPIC_SESSION_TTL_SECS", default_value = "3600", global = true)]
    pub session_ttl_secs: u64,

    /// Base URL of the Postiz publishing API
    #[arg(long, env = "POSTIZ_URL", global = true)]
    pub postiz_url: Option<String>,

    /// Postiz public API key
    #[arg(long, env = "POSTIZ_API_KEY", hide_env_values = true, global = true)]
    pub postiz_api_key: Option<String>,

    /// Timeout for publishing API requests in seconds
    #[arg(long, env = "EPIC_PUBLISH_TIMEOUT_SECS", default_value = "30", global = true)]
    pub publish_timeout_secs: u64,
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn open_database(&self) -> Result<Database> {
        let db = match &self.database {
            Some(path) => Database::open(path)?,
            None => Database::open_default()?,
        };
        db.migrate()?;
        Ok(db)
    }

    pub fn token_service(&self) -> Result<TokenService> {
        let session = required(&self.session_secret, "--session-secret / EPIC_SESSION_SECRET")?;
        let sso = required(&self.sso_secret, "--sso-secret / EPIC_SSO_SECRET")?;
        Ok(TokenService::new(session, sso, self.session_ttl_secs)?)
    }

    pub fn trigger_secret(&self) -> Result<String> {
        required(&self.trigger_secret, "--trigger-secret / EPIC_TRIGGER_SECRET")
    }

    /// The Postiz client when both URL and key are set. Otherwise every
    /// publish attempt fails, which the dispatcher logs and swallows.
    pub fn publisher(&self) -> Result<Arc<dyn Publisher>> {
        match (&self.postiz_url, &self.postiz_api_key) {
            (Some(url), Some(key)) => Ok(Arc::new(PostizClient::new(
                url,
                key,
                Duration::from_secs(self.publish_timeout_secs),
            )?)),
            (None, None) => {
                tracing::warn!("Postiz is not configured; auto-posting is disabled");
                Ok(Arc::new(DisabledPublisher))
            }
            _ => Err(anyhow!(
                "--postiz-url and --postiz-api-key must be configured together"
            )),
        }
    }
}

fn required(value: &Option<String>, name: &str) -> Result<String> {
    value
        .clone()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("{} is required", name))
}
