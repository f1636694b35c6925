//! Application configuration.
//!
//! Configuration merges three sources, later ones overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. A YAML config file (default `config.yaml`, `-f` flag or `UXSCORE_CONFIG`)
//! 3. Environment variables: `DATABASE_URL`, `JWT_SECRET_KEY`, `JWT_ISSUER`,
//!    `JWT_AUDIENCE`, `ALLOWED_ORIGINS`, `PORT`, `USE_HTTPS_REDIRECTION`
//!
//! `ALLOWED_ORIGINS` accepts a comma-separated list.

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::Error;

/// Environment variables that override config file values.
const ENV_OVERRIDES: &[&str] = &[
    "DATABASE_URL",
    "JWT_SECRET_KEY",
    "JWT_ISSUER",
    "JWT_AUDIENCE",
    "ALLOWED_ORIGINS",
    "HOST",
    "PORT",
    "USE_HTTPS_REDIRECTION",
];

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "UXSCORE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// PostgreSQL connection URL (required)
    pub database_url: String,
    /// HMAC secret for signing bearer tokens (required)
    pub jwt_secret_key: String,
    /// Issuer claim stamped into and required of every token
    pub jwt_issuer: String,
    /// Audience claim stamped into and required of every token
    pub jwt_audience: String,
    /// Origins allowed by CORS
    #[serde(deserialize_with = "deserialize_origins")]
    pub allowed_origins: Vec<String>,
    /// Redirect plain HTTP to HTTPS (off for local development)
    pub use_https_redirection: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: String::new(),
            jwt_secret_key: String::new(),
            jwt_issuer: "UXScore.API".to_string(),
            jwt_audience: "UXScore.Client".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:3001".to_string(),
            ],
            use_https_redirection: false,
        }
    }
}

/// Accept either a YAML list or a comma-separated string.
fn deserialize_origins<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Origins {
        List(Vec<String>),
        CommaSeparated(String),
    }

    Ok(match Origins::deserialize(deserializer)? {
        Origins::List(list) => list,
        Origins::CommaSeparated(s) => s
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect(),
    })
}

impl Config {
    fn figment(args: &Args) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::file(&args.config))
            .merge(Env::raw().only(ENV_OVERRIDES))
    }

    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.database_url.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: database_url is not set. \
                 Set the DATABASE_URL environment variable or add database_url to the config file."
                    .to_string(),
            });
        }

        if self.jwt_secret_key.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: jwt_secret_key is not set. \
                 Set the JWT_SECRET_KEY environment variable or add jwt_secret_key to the config file."
                    .to_string(),
            });
        }

        if self.allowed_origins.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: allowed_origins cannot be empty. Add at least one allowed origin."
                    .to_string(),
            });
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
