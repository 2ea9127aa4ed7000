//! Configuration management for picam-service
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `CAMERA_*` environment variables (`CAMERA_WIDTH=1280`,
//! `CAMERA_RTSP_URL=...`). The resulting values are fixed for the life of the
//! process.

use crate::camera::CameraSettings;
use crate::streaming::StreamSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_PREFIX: &str = "CAMERA";
pub const MIN_BITRATE: u32 = 100_000;
pub const MAX_BITRATE: u32 = 50_000_000;
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to load layered config: {0}")]
    Source(#[from] ::config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Process-wide service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub width: u32,
    pub height: u32,
    pub framerate: f64,
    /// H.264 target bitrate in bits per second
    pub bitrate: u32,
    pub rtsp_url: String,
    pub enable_awb: bool,
    pub default_auto_exposure: bool,
    pub tuning_file: Option<PathBuf>,
    pub camera_model: String,
    /// NoIR module (no IR-cut filter); selects the `_noir` tuning profile
    pub is_noir: bool,
    pub stream_on_startup: bool,
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            framerate: 30.0,
            bitrate: crate::streaming::DEFAULT_BITRATE,
            rtsp_url: crate::streaming::DEFAULT_RTSP_URL.to_string(),
            enable_awb: true,
            default_auto_exposure: true,
            tuning_file: None,
            camera_model: "imx708".to_string(),
            is_noir: false,
            stream_on_startup: true,
            log_level: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load defaults, overlay `path` when given and present, then the
    /// environment, and validate the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                ::config::File::new(&path.to_string_lossy(), ::config::FileFormat::Toml)
                    .required(false),
            );
        }
        let config: ServiceConfig = builder
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults when the
    /// file does not exist.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config: ServiceConfig = toml::from_str(&contents)?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from("picam.toml")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Invalid(message));

        for (name, value) in [("width", self.width), ("height", self.height)] {
            if !(64..=4096).contains(&value) {
                return invalid(format!("{name} must be between 64 and 4096 (got {value})"));
            }
        }
        if !(1.0..=120.0).contains(&self.framerate) {
            return invalid(format!(
                "framerate must be between 1 and 120 (got {})",
                self.framerate
            ));
        }
        if !(MIN_BITRATE..=MAX_BITRATE).contains(&self.bitrate) {
            return invalid(format!(
                "bitrate must be between {MIN_BITRATE} and {MAX_BITRATE} (got {})",
                self.bitrate
            ));
        }
        if !self.rtsp_url.starts_with("rtsp://") {
            return invalid(format!("rtsp_url must start with rtsp:// (got {})", self.rtsp_url));
        }
        if self.camera_model.trim().is_empty() {
            return invalid("camera_model must not be empty".to_string());
        }
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return invalid(format!(
                "log_level must be one of {} (got {})",
                LOG_LEVELS.join(", "),
                self.log_level
            ));
        }
        Ok(())
    }

    pub fn camera_settings(&self) -> CameraSettings {
        CameraSettings {
            width: self.width,
            height: self.height,
            framerate: self.framerate,
            enable_awb: self.enable_awb,
            default_auto_exposure: self.default_auto_exposure,
            tuning_file: self.tuning_file.clone(),
            camera_model: self.camera_model.clone(),
            is_noir: self.is_noir,
        }
    }

    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            bitrate: self.bitrate,
            rtsp_url: self.rtsp_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};
    use tempfile::TempDir;

    fn env_lock() -> &'static Mutex<()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!((config.width, config.height), (1920, 1080));
        assert_eq!(config.bitrate, 8_000_000);
        assert_eq!(config.rtsp_url, "rtsp://127.0.0.1:8554/cam");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ServiceConfig::default();
        config.rtsp_url = "http://example.com/cam".to_string();
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.bitrate = 50_000;
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.log_level = "WARN".to_string();
        assert!(config.validate().is_ok());
        config.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("picam.toml");

        let mut config = ServiceConfig::default();
        config.width = 1280;
        config.height = 720;
        config.is_noir = true;
        config.save_to_file(&config_path).unwrap();

        let loaded = ServiceConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("partial.toml");
        fs::write(&config_path, "bitrate = 4000000\n").unwrap();

        let loaded = ServiceConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.bitrate, 4_000_000);
        assert_eq!(loaded.width, 1920);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = ServiceConfig::load_from_file("/nonexistent/path/picam.toml").unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_environment_overrides_file() {
        let _guard = env_lock().lock().unwrap_or_else(|e| e.into_inner());
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("picam.toml");
        fs::write(&config_path, "width = 1280\nheight = 720\n").unwrap();

        std::env::set_var("CAMERA_HEIGHT", "960");
        let loaded = ServiceConfig::load(Some(&config_path));
        std::env::remove_var("CAMERA_HEIGHT");

        let loaded = loaded.unwrap();
        assert_eq!(loaded.width, 1280);
        assert_eq!(loaded.height, 960);
    }

    #[test]
    fn test_layered_load_rejects_invalid_values() {
        let _guard = env_lock().lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("CAMERA_RTSP_URL", "udp://nowhere");
        let loaded = ServiceConfig::load(None);
        std::env::remove_var("CAMERA_RTSP_URL");

        assert!(matches!(loaded, Err(ConfigError::Invalid(_))));
    }
}
