//! Client configuration.
//!
//! Loaded once at startup (usually from the environment) and passed by value
//! into the client. Nothing re-reads the environment mid-session.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_HOST: &str = "localhost";
/// Minecraft's default `rcon.port`.
pub const DEFAULT_PORT: u16 = 25575;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub const HOST_VAR: &str = "MC_RCON_HOST";
pub const PORT_VAR: &str = "MC_RCON_PORT";
pub const PASSWORD_VAR: &str = "MC_RCON_PASSWORD";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid rcon port {value:?}: expected a number between 1 and 65535")]
    InvalidPort { value: String },
}

/// The rcon password. `Debug` never shows the value.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Self {
        Password(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Password(<empty>)")
        } else {
            f.write_str("Password(<redacted>)")
        }
    }
}

/// How a command response is read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    /// One response packet per command.
    #[default]
    Single,
    /// Follow the command with an empty tracking packet and join every
    /// response packet until the tracking packet's answer arrives.
    Reassemble,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub password: Password,
    /// Bound on the TCP dial.
    pub connect_timeout: Duration,
    /// Bound on every read and write after connecting. `None` blocks forever.
    pub io_timeout: Option<Duration>,
    pub response_mode: ResponseMode,
    /// Expect srcds' empty RESPONSE_VALUE ahead of the auth answer.
    pub srcds_auth: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            password: Password::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            io_timeout: None,
            response_mode: ResponseMode::Single,
            srcds_auth: false,
        }
    }
}

impl Config {
    /// Read `MC_RCON_HOST`, `MC_RCON_PORT` and `MC_RCON_PASSWORD` from the
    /// process environment. Unset values keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [Config::from_env] but with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(host) = lookup(HOST_VAR).filter(|h| !h.trim().is_empty()) {
            config.host = host.trim().to_string();
        }
        if let Some(port) = lookup(PORT_VAR).filter(|p| !p.trim().is_empty()) {
            config.port = parse_port(&port)?;
        }
        if let Some(password) = lookup(PASSWORD_VAR) {
            config.password = Password::new(password);
        }

        Ok(config)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_password(mut self, password: Password) -> Self {
        self.password = password;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.io_timeout = timeout;
        self
    }

    pub fn with_response_mode(mut self, mode: ResponseMode) -> Self {
        self.response_mode = mode;
        self
    }

    pub fn with_srcds_auth(mut self, srcds_auth: bool) -> Self {
        self.srcds_auth = srcds_auth;
        self
    }

    /// `host:port`, ready for the dialer.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub fn parse_port(value: &str) -> Result<u16, ConfigError> {
    match value.trim().parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ConfigError::InvalidPort {
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 25575);
        assert!(config.password.is_empty());
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.io_timeout, None);
        assert_eq!(config.response_mode, ResponseMode::Single);
        assert!(!config.srcds_auth);
    }

    #[test]
    fn test_reads_variables() {
        let config = Config::from_lookup(lookup_from(&[
            ("MC_RCON_HOST", "mc.internal"),
            ("MC_RCON_PORT", " 25580 "),
            ("MC_RCON_PASSWORD", "s3cret"),
        ]))
        .unwrap();
        assert_eq!(config.address(), "mc.internal:25580");
        assert_eq!(config.password.expose(), "s3cret");
    }

    #[test]
    fn test_bad_port() {
        let err = Config::from_lookup(lookup_from(&[("MC_RCON_PORT", "rcon")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidPort {
                value: "rcon".to_string()
            }
        );
        assert!(parse_port("0").is_err());
        assert!(parse_port("70000").is_err());
    }

    #[test]
    fn test_password_is_redacted() {
        let config = Config::default().with_password(Password::new("hunter2"));
        let printed = format!("{:?}", config);
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("<redacted>"));
    }
}
