//! Server configuration from environment variables and command-line flags.
//!
//! Flags win over the environment; the environment wins over defaults.

use std::net::SocketAddr;
use std::time::Duration;

pub const USAGE: &str = "\
huddle-server (planning-poker rooms over WebSocket)

USAGE:
  huddle-server [--bind HOST:PORT] [--send-timeout-ms MS] [--idle-timeout-secs SECS]

ENV:
  HUDDLE_BIND                default 0.0.0.0:8080
  HUDDLE_SEND_TIMEOUT_MS     optional; default 1000 (per-event delivery bound)
  HUDDLE_IDLE_TIMEOUT_SECS   optional; unset keeps quiet connections open
  RUST_LOG                   optional; default huddle=info
";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("help requested")]
    Help,

    #[error("missing value for {0}")]
    MissingValue(String),

    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: String, value: String },

    #[error("unknown argument: {0}")]
    UnknownArgument(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub send_timeout: Duration,
    pub idle_timeout: Option<Duration>,
}

impl ServerConfig {
    /// Reads the process environment and arguments.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::parse(|key| std::env::var(key).ok(), std::env::args().skip(1))
    }

    /// Builds a config from an environment lookup and the arguments after
    /// the program name.
    pub fn parse<E, A>(env: E, args: A) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
        A: IntoIterator<Item = String>,
    {
        let mut bind: SocketAddr = parse_value(
            "HUDDLE_BIND",
            &env("HUDDLE_BIND").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        )?;
        let mut send_timeout_ms: u64 = match env("HUDDLE_SEND_TIMEOUT_MS") {
            Some(v) => parse_value("HUDDLE_SEND_TIMEOUT_MS", &v)?,
            None => 1000,
        };
        let mut idle_timeout_secs: Option<u64> = env("HUDDLE_IDLE_TIMEOUT_SECS")
            .filter(|v| !v.trim().is_empty())
            .map(|v| parse_value("HUDDLE_IDLE_TIMEOUT_SECS", &v))
            .transpose()?;

        let mut it = args.into_iter();
        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--bind" => {
                    bind = parse_value(&arg, &next_value(&arg, &mut it)?)?;
                }
                "--send-timeout-ms" => {
                    send_timeout_ms = parse_value(&arg, &next_value(&arg, &mut it)?)?;
                }
                "--idle-timeout-secs" => {
                    idle_timeout_secs = Some(parse_value(&arg, &next_value(&arg, &mut it)?)?);
                }
                "-h" | "--help" => return Err(ConfigError::Help),
                other => return Err(ConfigError::UnknownArgument(other.to_string())),
            }
        }

        Ok(Self {
            bind,
            send_timeout: Duration::from_millis(send_timeout_ms),
            idle_timeout: idle_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        })
    }
}

fn next_value(name: &str, it: &mut impl Iterator<Item = String>) -> Result<String, ConfigError> {
    it.next()
        .ok_or_else(|| ConfigError::MissingValue(name.to_string()))
}

fn parse_value<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    })
}
