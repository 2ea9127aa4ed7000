//! picam-service: camera control core for Raspberry Pi camera modules
//!
//! This crate owns the single libcamera sensor handle and everything that has
//! to be serialized around it: validated parameter setters, live status,
//! pipeline reconfiguration and the H.264/RTSP streaming lifecycle.
//!
//! # Components
//! - [`camera::CameraController`] is the sole owner of the hardware handle
//! - [`streaming::StreamingManager`] attaches and detaches the encoder
//! - [`reconfigure::Reconfigurator`] sequences stream restarts around
//!   resolution and framerate changes
//! - [`service::CameraService`] ties them together for one process
//!
//! # Usage
//! ```rust
//! use picam_service::testing::SyntheticSensor;
//! use picam_service::{CameraService, ServiceConfig};
//!
//! let sensor = SyntheticSensor::new();
//! let service = CameraService::new(ServiceConfig::default(), Box::new(sensor.provider()));
//! service.startup().unwrap();
//! assert!(service.health().streaming_active);
//! service.shutdown();
//! ```
pub mod camera;
pub mod config;
pub mod errors;
pub mod hardware;
pub mod reconfigure;
pub mod service;
pub mod streaming;

// Testing utilities - synthetic sensor for offline testing
pub mod testing;

// Re-exports for convenience
pub use camera::{CameraController, CameraSettings, CameraStatus, Capabilities};
pub use config::{ConfigError, ServiceConfig};
pub use errors::{CameraError, ErrorKind};
pub use hardware::{CameraHardware, CameraProvider, HardwareError};
pub use reconfigure::{Reconfigurator, ResolutionRequest};
pub use service::{CameraService, HealthReport, HealthState, ServiceStatus};
pub use streaming::{StreamSettings, StreamingManager};

/// Initialize logging. `RUST_LOG` takes precedence over `level`.
pub fn init_logging(level: &str) {
    let default_filter = format!("picam_service={}", level.to_ascii_lowercase());
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Crate version, reported by the health check.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        init_logging("debug");
        init_logging("INFO");
    }
}
