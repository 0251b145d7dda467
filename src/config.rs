//! Daemon configuration
//!
//! Loaded from a TOML file. Every section and field has a default, so a
//! partial file (or none at all) is enough to start.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::*;
use crate::error::{Error, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub controller: ControllerConfig,
    pub vocoder: VocoderConfig,
    pub log: LogConfig,
}

/// Control socket and stream table settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Address the control socket binds to; an IPv6 literal selects IPv6
    pub bind_address: IpAddr,

    /// UDP control port
    pub port: u16,

    /// Base of the per-stream ports (`base + id`), defaults to `port`
    pub stream_base_port: Option<u16>,

    /// Maximum number of concurrent streams
    pub max_streams: u16,

    /// Bounded wait of one control socket receive
    pub receive_timeout_ms: u64,

    /// Skip stream ids that are still live instead of wrapping blindly
    pub strict_id_allocation: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: TRANSCODER_PORT,
            stream_base_port: None,
            max_streams: MAX_STREAMS,
            receive_timeout_ms: RECEIVE_TIMEOUT_MS,
            strict_id_allocation: false,
        }
    }
}

impl ControllerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    pub fn base_port(&self) -> u16 {
        self.stream_base_port.unwrap_or(self.port)
    }

    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }
}

/// Vocoder resource settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocoderConfig {
    /// Number of vocoder channels streams can lease
    pub channels: usize,

    /// A stream without traffic for this long reports inactive
    pub activity_timeout_ms: u64,
}

impl Default for VocoderConfig {
    fn default() -> Self {
        Self {
            channels: DEFAULT_VOCODER_CHANNELS,
            activity_timeout_ms: STREAM_ACTIVITY_TIMEOUT_MS,
        }
    }
}

impl VocoderConfig {
    pub fn activity_timeout(&self) -> Duration {
        Duration::from_millis(self.activity_timeout_ms)
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, `RUST_LOG` takes precedence
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    /// Load `path` if given, else the default location if it exists, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Platform configuration location, e.g. `~/.config/ambed/ambed.toml`
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "ambed").map(|dirs| dirs.config_dir().join("ambed.toml"))
    }

    /// Serialize back to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reject settings the controller cannot run with
    pub fn validate(&self) -> Result<()> {
        let controller = &self.controller;

        if controller.max_streams == 0 {
            return Err(Error::Config("max_streams must be at least 1".into()));
        }

        if controller
            .base_port()
            .checked_add(controller.max_streams)
            .is_none()
        {
            return Err(Error::Config(format!(
                "stream ports overflow: base {} + {} streams",
                controller.base_port(),
                controller.max_streams
            )));
        }

        if controller.receive_timeout_ms == 0 {
            return Err(Error::Config("receive_timeout_ms must be positive".into()));
        }

        if self.vocoder.channels == 0 {
            return Err(Error::Config("vocoder channels must be at least 1".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.controller.port, 10100);
        assert_eq!(config.controller.base_port(), 10100);
        assert_eq!(config.controller.max_streams, 99);
        assert_eq!(config.controller.receive_timeout(), Duration::from_millis(20));
        assert!(!config.controller.strict_id_allocation);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file() {
        let config = AppConfig::from_toml(
            r#"
            [controller]
            bind_address = "::"
            stream_base_port = 20000

            [vocoder]
            channels = 8
            "#,
        )
        .unwrap();

        assert!(config.controller.bind_address.is_ipv6());
        assert_eq!(config.controller.port, 10100);
        assert_eq!(config.controller.base_port(), 20000);
        assert_eq!(config.vocoder.channels, 8);
        assert_eq!(config.vocoder.activity_timeout(), Duration::from_secs(3));
        assert_eq!(config.log.filter, "info");
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let mut config = AppConfig::default();
        config.controller.strict_id_allocation = true;
        config.controller.stream_base_port = Some(30000);

        let text = config.to_toml().unwrap();
        assert_eq!(AppConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_rejects_port_overflow() {
        let result = AppConfig::from_toml(
            r#"
            [controller]
            port = 65500
            max_streams = 99
            "#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_zero_streams() {
        let mut config = AppConfig::default();
        config.controller.max_streams = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = AppConfig::load(Path::new("/nonexistent/ambed.toml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
