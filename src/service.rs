//! Application context owning both coordinators and the orchestrator.
//!
//! Build one [`CameraService`] at process entry, hand references to whatever
//! serves requests, and let it drop (or call [`CameraService::shutdown`]) on
//! exit.

use crate::camera::{CameraController, CameraStatus, FramerateChange};
use crate::config::ServiceConfig;
use crate::errors::CameraError;
use crate::hardware::CameraProvider;
use crate::reconfigure::{Reconfigurator, ResolutionRequest};
use crate::streaming::StreamingManager;
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ServiceStatus {
    #[serde(flatten)]
    pub camera: CameraStatus,
    pub streaming: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    /// Process is up but the camera is not configured.
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct HealthReport {
    pub status: HealthState,
    pub camera_configured: bool,
    pub streaming_active: bool,
    pub version: &'static str,
}

pub struct CameraService {
    config: ServiceConfig,
    camera: Arc<CameraController>,
    streaming: Arc<StreamingManager>,
    reconfigurator: Reconfigurator,
    shut_down: AtomicBool,
}

impl CameraService {
    pub fn new(config: ServiceConfig, provider: Box<dyn CameraProvider>) -> Self {
        let camera = Arc::new(CameraController::new(provider, config.camera_settings()));
        Self::from_controller(config, camera)
    }

    /// Build around an existing controller, e.g. one with a custom tuning
    /// search path.
    pub fn from_controller(config: ServiceConfig, camera: Arc<CameraController>) -> Self {
        let streaming = Arc::new(StreamingManager::new(
            Arc::clone(&camera),
            config.stream_settings(),
        ));
        let reconfigurator = Reconfigurator::new(Arc::clone(&camera), Arc::clone(&streaming));
        Self {
            config,
            camera,
            streaming,
            reconfigurator,
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn camera(&self) -> &Arc<CameraController> {
        &self.camera
    }

    pub fn streaming(&self) -> &Arc<StreamingManager> {
        &self.streaming
    }

    /// Configure the camera and, if enabled, start streaming.
    pub fn startup(&self) -> Result<(), CameraError> {
        info!("Starting camera service v{}", crate::VERSION);
        self.shut_down.store(false, Ordering::SeqCst);
        self.camera.configure()?;
        if self.config.stream_on_startup {
            self.reconfigurator.start_streaming()?;
        }
        info!("Camera service ready");
        Ok(())
    }

    /// Stop streaming, then release the camera. Safe to call repeatedly.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Shutting down camera service");
        self.reconfigurator.stop_streaming();
        self.camera.cleanup();
    }

    pub fn start_streaming(&self) -> Result<(), CameraError> {
        self.reconfigurator.start_streaming()
    }

    pub fn stop_streaming(&self) {
        self.reconfigurator.stop_streaming();
    }

    pub fn set_resolution(&self, request: ResolutionRequest) -> Result<(), CameraError> {
        self.reconfigurator.change_resolution(request)
    }

    pub fn set_framerate(
        &self,
        fps: f64,
        restart_streaming: bool,
    ) -> Result<FramerateChange, CameraError> {
        self.reconfigurator.change_framerate(fps, restart_streaming)
    }

    pub fn status(&self) -> Result<ServiceStatus, CameraError> {
        let camera = self.camera.get_status()?;
        Ok(ServiceStatus {
            camera,
            streaming: self.streaming.is_streaming(),
        })
    }

    /// Never fails, whatever state the camera is in.
    pub fn health(&self) -> HealthReport {
        let camera_configured = self.camera.is_configured();
        if !camera_configured {
            debug!("Health check: camera not configured");
        }
        HealthReport {
            status: if camera_configured {
                HealthState::Healthy
            } else {
                HealthState::Degraded
            },
            camera_configured,
            streaming_active: self.streaming.is_streaming(),
            version: crate::VERSION,
        }
    }
}

impl Drop for CameraService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
