//! Configuration management for Ferry.
//!
//! This module handles loading, saving, and managing Ferry configuration.
//!
//! ## Configuration File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/ferry/config.toml` |
//! | macOS | `~/Library/Application Support/Ferry/config.toml` |
//! | Windows | `%APPDATA%\Ferry\config.toml` |
//!
//! ## Example
//!
//! ```rust,ignore
//! use ferry_core::config::Config;
//!
//! let config = Config::load()?;
//! println!("Chunk size: {}", config.transfer.chunk_size);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::protocol::ByteOrder;

/// Main configuration struct for Ferry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Network settings
    pub network: NetworkConfig,
    /// Transfer settings
    pub transfer: TransferSettings,
}

/// Network configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address the listener binds to
    pub bind_address: String,
    /// Bound on the single connect attempt
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            connect_timeout: Duration::from_secs(crate::DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

/// Transfer configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferSettings {
    /// Chunk size for reads and writes
    pub chunk_size: usize,
    /// Byte order of the size header
    pub byte_order: ByteOrder,
    /// Reject received payloads whose length differs from the header
    pub verify_length: bool,
    /// Destination file for received payloads
    pub default_output: PathBuf,
    /// Source file used when `send` is given none
    pub default_source: PathBuf,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            chunk_size: crate::DEFAULT_CHUNK_SIZE,
            byte_order: ByteOrder::Native,
            verify_length: false,
            default_output: PathBuf::from(crate::DEFAULT_OUTPUT_FILE),
            default_source: PathBuf::from(crate::DEFAULT_SOURCE_FILE),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// If the configuration file doesn't exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("Failed to read config: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    ///
    /// Creates the configuration directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::ConfigError(format!("Failed to create config directory: {e}"))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(&path, content)
            .map_err(|e| Error::ConfigError(format!("Failed to write config: {e}")))
    }

    /// Reject values the transfer engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.transfer.chunk_size == 0 {
            return Err(Error::ConfigError(
                "transfer.chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.network.connect_timeout.is_zero() {
            return Err(Error::ConfigError(
                "network.connect_timeout must be greater than 0".to_string(),
            ));
        }
        if self.network.bind_address.parse::<std::net::IpAddr>().is_err() {
            return Err(Error::ConfigError(format!(
                "network.bind_address '{}' is not an IP address",
                self.network.bind_address
            )));
        }
        Ok(())
    }

    /// Runtime settings for the transfer engine.
    #[must_use]
    pub fn transfer_config(&self) -> crate::transfer::TransferConfig {
        crate::transfer::TransferConfig {
            chunk_size: self.transfer.chunk_size,
            byte_order: self.transfer.byte_order,
            verify_length: self.transfer.verify_length,
            connect_timeout: self.network.connect_timeout,
            bind_address: self.network.bind_address.clone(),
        }
    }

    /// Get the default configuration directory path.
    #[must_use]
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "ferry", "Ferry")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the full path to the configuration file.
    #[must_use]
    pub fn config_path() -> PathBuf {
        Self::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }
}

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}s", duration.as_secs()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.strip_suffix('s')
            .map(|secs| {
                secs.parse()
                    .map(Duration::from_secs)
                    .map_err(serde::de::Error::custom)
            })
            .or_else(|| {
                s.strip_suffix('m').map(|mins| {
                    mins.parse::<u64>()
                        .map_err(serde::de::Error::custom)
                        .and_then(|m| {
                            m.checked_mul(60)
                                .map(Duration::from_secs)
                                .ok_or_else(|| serde::de::Error::custom("duration too large"))
                        })
                })
            })
            .unwrap_or_else(|| Err(serde::de::Error::custom("invalid duration format")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.transfer.chunk_size, crate::DEFAULT_CHUNK_SIZE);
        assert_eq!(config.transfer.byte_order, ByteOrder::Native);
        assert_eq!(config.network.connect_timeout, Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let mut original = Config::default();
        original.network.bind_address = "127.0.0.1".to_string();
        original.transfer.byte_order = ByteOrder::Big;
        original.transfer.verify_length = true;
        original.transfer.chunk_size = 4096;

        let content = toml::to_string_pretty(&original).expect("serialize");
        std::fs::write(&config_path, &content).expect("write");

        let loaded = Config::load_from(&config_path).expect("load");

        assert_eq!(loaded.network.bind_address, "127.0.0.1");
        assert_eq!(loaded.transfer.byte_order, ByteOrder::Big);
        assert!(loaded.transfer.verify_length);
        assert_eq!(loaded.transfer.chunk_size, 4096);
    }

    #[test]
    fn test_config_missing_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = Config::load_from(&temp_dir.path().join("nope.toml")).expect("load");
        assert_eq!(loaded.transfer.chunk_size, crate::DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_config_deserialization_partial() {
        let partial_toml = r#"
[transfer]
byte_order = "little"

[network]
connect_timeout = "1m"
"#;

        let config: Config = toml::from_str(partial_toml).expect("parse partial config");

        assert_eq!(config.transfer.byte_order, ByteOrder::Little);
        assert_eq!(config.network.connect_timeout, Duration::from_secs(60));

        assert_eq!(config.network.bind_address, "0.0.0.0");
        assert_eq!(
            config.transfer.default_output,
            PathBuf::from(crate::DEFAULT_OUTPUT_FILE)
        );
    }

    #[test]
    fn test_config_rejects_zero_chunk() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "[transfer]\nchunk_size = 0\n").unwrap();

        let result = Config::load_from(&config_path);
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_config_rejects_zero_timeout() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "[network]\nconnect_timeout = \"0s\"\n").unwrap();

        let result = Config::load_from(&config_path);
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_config_minutes_timeout() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "[network]\nconnect_timeout = \"2m\"\n").unwrap();

        let config = Config::load_from(&config_path).expect("load");
        assert_eq!(config.network.connect_timeout, Duration::from_secs(120));

        let huge = format!("[network]\nconnect_timeout = \"{}m\"\n", u64::MAX);
        std::fs::write(&config_path, huge).unwrap();
        assert!(matches!(
            Config::load_from(&config_path),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_transfer_config_conversion() {
        let mut config = Config::default();
        config.transfer.verify_length = true;
        config.network.connect_timeout = Duration::from_secs(3);

        let runtime = config.transfer_config();
        assert!(runtime.verify_length);
        assert_eq!(runtime.connect_timeout, Duration::from_secs(3));
        assert_eq!(runtime.chunk_size, crate::DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_config_path() {
        let path = Config::config_path();
        assert!(
            path.ends_with("config.toml"),
            "Config path should end with config.toml"
        );
    }

    #[test]
    fn test_duration_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");

        assert!(toml_str.contains("connect_timeout = \"10s\""));
        assert!(toml_str.contains("byte_order = \"native\""));
    }
}
