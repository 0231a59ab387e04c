use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::types::SpeedPreset;

/// Top-level configuration for the Confab widget engine.
///
/// Each section covers one subsystem. Every field has a default so a host
/// can construct the engine from an empty or partial TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WidgetConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub streaming: StreamingConfig,
    #[serde(default)]
    pub reveal: RevealConfig,
}

impl WidgetConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: WidgetConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// Session transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// WebSocket endpoint. When absent the engine runs in local-only mode
    /// and answers with simulated responses.
    pub server_url: Option<String>,
    /// Interval between heartbeat envelopes while connected.
    pub heartbeat_interval_ms: u64,
    /// Fixed delay before the single reconnect attempt after an abnormal close.
    pub reconnect_delay_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            heartbeat_interval_ms: 30_000,
            reconnect_delay_ms: 3_000,
        }
    }
}

/// Streaming-update coalescing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Minimum change in content length (in characters) before a non-final
    /// streaming update is rendered.
    pub threshold: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self { threshold: 15 }
    }
}

/// Incremental-reveal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Named speed preset for assistant messages.
    pub speed: SpeedPreset,
    /// Continuous scale applied on top of the preset. Values above 1.0
    /// speed the reveal up, below 1.0 slow it down.
    pub speed_multiplier: f64,
    /// Parse assistant messages as markdown and reveal the rendered result.
    pub enable_markdown: bool,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            speed: SpeedPreset::default(),
            speed_multiplier: 1.0,
            enable_markdown: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = WidgetConfig::default();
        assert_eq!(config.connection.server_url, None);
        assert_eq!(config.connection.heartbeat_interval_ms, 30_000);
        assert_eq!(config.connection.reconnect_delay_ms, 3_000);
        assert_eq!(config.streaming.threshold, 15);
        assert_eq!(config.reveal.speed, SpeedPreset::Normal);
        assert_eq!(config.reveal.speed_multiplier, 1.0);
        assert!(config.reveal.enable_markdown);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = WidgetConfig::default();
        config.connection.server_url = Some("ws://localhost:9001/chat".to_string());
        config.reveal.speed = SpeedPreset::Fast;
        config.reveal.speed_multiplier = 1.5;
        config.save(&path).unwrap();

        let loaded = WidgetConfig::load(&path).unwrap();
        assert_eq!(
            loaded.connection.server_url.as_deref(),
            Some("ws://localhost:9001/chat")
        );
        assert_eq!(loaded.reveal.speed, SpeedPreset::Fast);
        assert_eq!(loaded.reveal.speed_multiplier, 1.5);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(WidgetConfig::load(&path).is_err());
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        let config = WidgetConfig::load_or_default(&path);
        assert_eq!(config.streaming.threshold, 15);
    }

    #[test]
    fn test_partial_toml_uses_section_defaults() {
        let toml_str = r#"
            [reveal]
            speed = "verySlow"
        "#;
        let config: WidgetConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.reveal.speed, SpeedPreset::VerySlow);
        assert_eq!(config.reveal.speed_multiplier, 1.0);
        assert_eq!(config.connection.heartbeat_interval_ms, 30_000);
    }

    #[test]
    fn test_partial_section_fills_remaining_fields() {
        let toml_str = r#"
            [connection]
            server_url = "ws://example.test/chat"
        "#;
        let config: WidgetConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.connection.server_url.as_deref(),
            Some("ws://example.test/chat")
        );
        assert_eq!(config.connection.reconnect_delay_ms, 3_000);
    }
}
