use super::encoder::{FfmpegOutput, H264Encoder, DEFAULT_BITRATE};
use crate::camera::CameraController;
use crate::errors::CameraError;
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

pub const DEFAULT_RTSP_URL: &str = "rtsp://127.0.0.1:8554/cam";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    pub bitrate: u32,
    pub rtsp_url: String,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            bitrate: DEFAULT_BITRATE,
            rtsp_url: DEFAULT_RTSP_URL.to_string(),
        }
    }
}

/// Identity of a running stream session.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StreamInfo {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub bitrate: u32,
    pub url: String,
}

struct ActiveStream {
    id: Uuid,
    started_at: DateTime<Utc>,
    encoder: H264Encoder,
    output: FfmpegOutput,
}

impl ActiveStream {
    fn info(&self) -> StreamInfo {
        StreamInfo {
            id: self.id,
            started_at: self.started_at,
            bitrate: self.encoder.bitrate(),
            url: self.output.url().to_string(),
        }
    }
}

/// Owns the encoder and RTSP relay attached to the camera.
///
/// `start` and `stop` are idempotent. The encoder and output only exist while
/// the hardware has accepted them, so `is_streaming` never reports a session
/// the sensor is not actually running.
pub struct StreamingManager {
    camera: Arc<CameraController>,
    settings: StreamSettings,
    active: Mutex<Option<ActiveStream>>,
}

impl StreamingManager {
    pub fn new(camera: Arc<CameraController>, settings: StreamSettings) -> Self {
        debug!("StreamingManager initialized for {}", settings.rtsp_url);
        Self {
            camera,
            settings,
            active: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveStream>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    /// Begin streaming, configuring the camera first if needed. Any failure
    /// is reported as [`CameraError::StreamingFailed`].
    pub fn start(&self) -> Result<(), CameraError> {
        let mut active = self.lock();
        if active.is_some() {
            debug!("Streaming already active, skipping start");
            return Ok(());
        }

        info!(
            "Starting stream to {} at {}bps",
            self.settings.rtsp_url, self.settings.bitrate
        );
        let encoder = H264Encoder::new(self.settings.bitrate);
        let output = FfmpegOutput::rtsp(self.settings.rtsp_url.as_str());

        self.camera
            .with_hardware(|hardware| {
                if !hardware.is_capture_running() {
                    hardware.start_capture()?;
                }
                hardware.start_recording(&encoder, &output)
            })
            .map_err(|e| {
                error!("Failed to start streaming: {e}");
                CameraError::StreamingFailed(Box::new(e))
            })?;

        let stream = ActiveStream {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            encoder,
            output,
        };
        info!("Streaming started (session {})", stream.id);
        *active = Some(stream);
        Ok(())
    }

    /// Stop streaming. Never fails; hardware errors are logged and the
    /// session is discarded regardless.
    pub fn stop(&self) {
        let mut active = self.lock();
        let Some(stream) = active.take() else {
            debug!("Streaming not active, skipping stop");
            return;
        };

        info!("Stopping stream (session {})", stream.id);
        match self
            .camera
            .with_configured_hardware(|hardware| hardware.stop_recording())
        {
            Ok(()) => info!("Streaming stopped"),
            Err(e) => error!("Error stopping stream: {e}"),
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.lock().is_some()
    }

    pub fn stream_info(&self) -> Option<StreamInfo> {
        self.lock().as_ref().map(ActiveStream::info)
    }
}

impl Drop for StreamingManager {
    fn drop(&mut self) {
        self.stop();
    }
}
