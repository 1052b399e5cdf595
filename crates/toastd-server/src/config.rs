use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Notification Center visibility handling
    #[serde(default)]
    pub center: CenterConfig,
    /// Automatic expiry of notifications
    #[serde(default)]
    pub expiry: ExpiryConfig,
    /// Client event delivery
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        // Center validations
        if self.center.blur_toggle_block_ms == 0 || self.center.toggle_blur_block_ms == 0 {
            return Err("center block windows must be > 0".into());
        }
        // Event validations
        if self.events.replay_limit == 0 {
            return Err("events.replay_limit must be > 0".into());
        }
        Ok(())
    }

    pub fn blur_toggle_block(&self) -> Duration {
        Duration::from_millis(self.center.blur_toggle_block_ms)
    }

    pub fn toggle_blur_block(&self) -> Duration {
        Duration::from_millis(self.center.toggle_blur_block_ms)
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("config serialize error: {e}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CenterConfig {
    /// Toggle requests within this many ms after a blur are ignored
    #[serde(default = "default_blur_toggle_block_ms")]
    pub blur_toggle_block_ms: u64,
    /// Blur events within this many ms after a toggle are ignored
    #[serde(default = "default_toggle_blur_block_ms")]
    pub toggle_blur_block_ms: u64,
}

fn default_blur_toggle_block_ms() -> u64 {
    750
}
fn default_toggle_blur_block_ms() -> u64 {
    200
}

impl Default for CenterConfig {
    fn default() -> Self {
        Self {
            blur_toggle_block_ms: default_blur_toggle_block_ms(),
            toggle_blur_block_ms: default_toggle_blur_block_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Maximum number of deferred action events kept while waiting for
    /// target applications to become ready. Oldest are dropped first.
    #[serde(default = "default_replay_limit")]
    pub replay_limit: usize,
}

fn default_replay_limit() -> usize {
    1000
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            replay_limit: default_replay_limit(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub const DEFAULT_CONFIG_PATH: &str = "toastd.toml";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                // Try default root-level file
                let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., TOASTD__EVENTS__REPLAY_LIMIT=50
        builder = builder.add_source(
            Environment::with_prefix("TOASTD")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        // Validate
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.blur_toggle_block(), Duration::from_millis(750));
        assert_eq!(cfg.toggle_blur_block(), Duration::from_millis(200));
        assert!(cfg.expiry.enabled);
        assert_eq!(cfg.events.replay_limit, 1000);
    }

    #[test]
    fn test_invalid_level_rejected() {
        let mut cfg = AppConfig::default();
        cfg.logging.level = "loud".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_zero_replay_limit_rejected() {
        let mut cfg = AppConfig::default();
        cfg.events.replay_limit = 0;
        assert_eq!(
            cfg.validate().unwrap_err(),
            "events.replay_limit must be > 0"
        );
    }

    #[test]
    fn test_to_toml_round_trips_sections() {
        let rendered = AppConfig::default().to_toml().unwrap();
        assert!(rendered.contains("[center]"));
        assert!(rendered.contains("blur_toggle_block_ms = 750"));
        assert!(rendered.contains("backend = \"memory\""));
    }
}
