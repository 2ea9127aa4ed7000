//! Capability surface of the physical sensor.
//!
//! Everything above this module talks to the camera through [`CameraProvider`]
//! and [`CameraHardware`]. A libcamera binding implements these traits on the
//! device; [`crate::testing::SyntheticProvider`] implements them in memory.

pub mod controls;

pub use controls::{ControlId, ControlSet, ControlValue, Rect};

use crate::streaming::{FfmpegOutput, H264Encoder};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HardwareError {
    message: String,
}

impl HardwareError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for HardwareError {
    fn from(err: std::io::Error) -> Self {
        HardwareError::new(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, the only layout the pipeline is ever configured with.
    Yuv420,
}

impl PixelFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            PixelFormat::Yuv420 => "YUV420",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct Transform {
    pub hflip: bool,
    pub vflip: bool,
}

/// Full pipeline shape handed to [`CameraHardware::apply_pipeline_config`].
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PipelineConfig {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub controls: ControlSet,
    /// Sensor readout size. `Some` requests a full-sensor readout that the ISP
    /// downscales; `None` lets the sensor pick a cropped mode.
    pub raw_size: Option<(u32, u32)>,
    pub transform: Transform,
}

impl PipelineConfig {
    pub fn new(width: u32, height: u32, format: PixelFormat, controls: ControlSet) -> Self {
        Self {
            width,
            height,
            format,
            controls,
            raw_size: None,
            transform: Transform::default(),
        }
    }

    pub fn with_raw_size(mut self, raw_size: Option<(u32, u32)>) -> Self {
        self.raw_size = raw_size;
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// One metadata snapshot. Backends leave fields they cannot report as `None`.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Metadata {
    pub lux: Option<f64>,
    pub exposure_time: Option<u32>,
    pub analogue_gain: Option<f64>,
    pub colour_temperature: Option<f64>,
    pub lens_position: Option<f64>,
    pub focus_fom: Option<i64>,
    pub frame_duration: Option<i64>,
    pub frame_duration_limits: Option<(i64, i64)>,
    pub sensor_black_levels: Option<Vec<i32>>,
}

/// Packed RGB8 frame as returned by [`CameraHardware::capture_frame`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

pub trait CameraProvider: Send + Sync {
    /// Number of cameras currently attached.
    fn probe_available(&self) -> Result<usize, HardwareError>;

    fn open(&self, tuning: Option<&Path>) -> Result<Box<dyn CameraHardware>, HardwareError>;
}

pub trait CameraHardware: Send {
    fn build_pipeline_config(
        &self,
        width: u32,
        height: u32,
        format: PixelFormat,
        controls: ControlSet,
    ) -> Result<PipelineConfig, HardwareError> {
        Ok(PipelineConfig::new(width, height, format, controls))
    }

    fn apply_pipeline_config(&mut self, config: &PipelineConfig) -> Result<(), HardwareError>;

    /// Apply every control in `controls` as one request.
    fn apply_controls(&mut self, controls: &ControlSet) -> Result<(), HardwareError>;

    fn capture_metadata(&mut self) -> Result<Metadata, HardwareError>;

    fn capture_frame(&mut self) -> Result<RawFrame, HardwareError>;

    fn is_capture_running(&self) -> bool;

    fn start_capture(&mut self) -> Result<(), HardwareError>;

    fn stop_capture(&mut self) -> Result<(), HardwareError>;

    /// Run one autofocus search, blocking until it finishes. Returns whether
    /// focus was achieved.
    fn trigger_autofocus_cycle(&mut self) -> Result<bool, HardwareError>;

    fn native_resolution(&self) -> (u32, u32);

    fn start_recording(
        &mut self,
        encoder: &H264Encoder,
        output: &FfmpegOutput,
    ) -> Result<(), HardwareError>;

    fn stop_recording(&mut self) -> Result<(), HardwareError>;

    fn close(&mut self) -> Result<(), HardwareError>;
}
