//! Server configuration for the `usersd` daemon.
//!
//! Each setting comes from a command-line flag, then the process environment, then a
//! `.env` file in the working directory, then a built-in default.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::upstream::DEFAULT_UPSTREAM_URL;

/// Default bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default bind port.
pub const DEFAULT_PORT: u16 = 3000;
/// Default upstream request timeout in milliseconds.
pub const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 10_000;
/// Dotenv file consulted for variables the process environment does not set.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Configuration that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable held a value that could not be parsed.
    #[error("invalid value {value:?} for {variable}: {reason}")]
    InvalidValue {
        /// Name of the offending variable.
        variable: String,
        /// The raw value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The dotenv file exists but could not be read.
    #[error("cannot read {path}: {reason}")]
    EnvFile {
        /// Path of the file.
        path: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Settings given explicitly on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// `--host`
    pub host: Option<String>,
    /// `--port`
    pub port: Option<u16>,
    /// `--upstream-url`
    pub upstream_url: Option<String>,
    /// `--upstream-timeout-ms`
    pub upstream_timeout_ms: Option<u64>,
    /// `--fixture`
    pub fixture: Option<String>,
    /// `--verbose`
    pub verbose: bool,
}

/// Fully resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Base URL of the upstream user provider, without a trailing slash.
    pub upstream_url: String,
    /// Per-request timeout for the upstream provider.
    pub upstream_timeout: Duration,
    /// Serve this JSON listing instead of calling the upstream provider.
    pub fixture: Option<PathBuf>,
    /// Debug logging for this crate.
    pub verbose: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            upstream_timeout: Duration::from_millis(DEFAULT_UPSTREAM_TIMEOUT_MS),
            fixture: None,
            verbose: false,
        }
    }
}

impl ServerConfig {
    /// Resolves the configuration from overrides, the process environment, and `.env`.
    pub fn from_overrides(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        Self::with_env_file(
            overrides,
            |name| std::env::var(name).ok(),
            Path::new(DEFAULT_ENV_FILE),
        )
    }

    /// Resolves the configuration, falling back to the dotenv file at `env_file` for
    /// variables `env` does not set.  A missing file is not an error.
    pub fn with_env_file<F>(
        overrides: ConfigOverrides,
        env: F,
        env_file: &Path,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = read_env_file(env_file)?;
        Self::resolve(overrides, |name| {
            env(name).or_else(|| file.get(name).cloned())
        })
    }

    /// Resolves the configuration from overrides and an arbitrary variable lookup.
    pub fn resolve<F>(overrides: ConfigOverrides, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let host = overrides
            .host
            .or_else(|| env("HOST"))
            .unwrap_or(defaults.host);
        let port = match overrides.port {
            Some(port) => port,
            None => parse_env(&env, "PORT")?.unwrap_or(defaults.port),
        };
        let upstream_url = overrides
            .upstream_url
            .or_else(|| env("UPSTREAM_URL"))
            .unwrap_or(defaults.upstream_url)
            .trim_end_matches('/')
            .to_string();
        let upstream_timeout = match overrides.upstream_timeout_ms {
            Some(ms) => Duration::from_millis(ms),
            None => parse_env::<u64, _>(&env, "UPSTREAM_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.upstream_timeout),
        };
        Ok(Self {
            host,
            port,
            upstream_url,
            upstream_timeout,
            fixture: overrides.fixture.map(PathBuf::from),
            verbose: overrides.verbose,
        })
    }

    /// The `host:port` address to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Reads `KEY=value` pairs from a dotenv file without touching the process environment.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let env_file_error = |e: dotenvy::Error| ConfigError::EnvFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    };
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => return Ok(HashMap::new()),
        Err(e) => return Err(env_file_error(e)),
    };
    iter.map(|item| item.map_err(env_file_error)).collect()
}

fn parse_env<T, F>(env: &F, variable: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match env(variable) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                variable: variable.to_string(),
                value,
                reason: e.to_string(),
            }),
    }
}
