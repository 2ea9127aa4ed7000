//! Stop-stream / reshape-pipeline / restart-stream sequencing.
//!
//! Resolution and framerate changes tear the encoder down, so they run
//! under one orchestrator-wide lock together with plain stream start/stop.
//! Lock order is always orchestrator, then streaming, then camera.

use crate::camera::{limits, CameraController, FovMode, FramerateChange};
use crate::errors::CameraError;
use crate::streaming::StreamingManager;
use log::info;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionRequest {
    pub width: u32,
    pub height: u32,
    pub restart_streaming: bool,
    /// Applied before the pipeline is rebuilt.
    pub fov_mode: Option<FovMode>,
}

impl ResolutionRequest {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            restart_streaming: true,
            fov_mode: None,
        }
    }

    pub fn restart_streaming(mut self, restart: bool) -> Self {
        self.restart_streaming = restart;
        self
    }

    pub fn with_fov_mode(mut self, mode: FovMode) -> Self {
        self.fov_mode = Some(mode);
        self
    }
}

pub struct Reconfigurator {
    lock: Mutex<()>,
    camera: Arc<CameraController>,
    streaming: Arc<StreamingManager>,
}

impl Reconfigurator {
    pub fn new(camera: Arc<CameraController>, streaming: Arc<StreamingManager>) -> Self {
        Self {
            lock: Mutex::new(()),
            camera,
            streaming,
        }
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Change resolution around a stream restart. If the camera rejects the
    /// change the stream stays stopped.
    pub fn change_resolution(&self, request: ResolutionRequest) -> Result<(), CameraError> {
        limits::validate_resolution(request.width, request.height)?;

        let _guard = self.guard();
        if let Some(mode) = request.fov_mode {
            self.camera.set_fov_mode(mode)?;
        }
        let was_streaming = self.pause_stream();
        self.camera.set_resolution(request.width, request.height)?;
        self.resume_stream(was_streaming && request.restart_streaming)?;
        Ok(())
    }

    pub fn change_framerate(
        &self,
        fps: f64,
        restart_streaming: bool,
    ) -> Result<FramerateChange, CameraError> {
        limits::validate_framerate_request(fps)?;

        let _guard = self.guard();
        let was_streaming = self.pause_stream();
        let change = self.camera.set_framerate(fps)?;
        self.resume_stream(was_streaming && restart_streaming)?;
        Ok(change)
    }

    pub fn start_streaming(&self) -> Result<(), CameraError> {
        let _guard = self.guard();
        self.streaming.start()
    }

    pub fn stop_streaming(&self) {
        let _guard = self.guard();
        self.streaming.stop();
    }

    fn pause_stream(&self) -> bool {
        let was_streaming = self.streaming.is_streaming();
        if was_streaming {
            info!("Stopping stream for pipeline reconfiguration");
            self.streaming.stop();
        }
        was_streaming
    }

    fn resume_stream(&self, restart: bool) -> Result<(), CameraError> {
        if restart {
            info!("Restarting stream after pipeline reconfiguration");
            self.streaming.start()?;
        }
        Ok(())
    }
}
