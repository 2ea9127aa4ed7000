//! In-memory sensor backend.
//!
//! [`SyntheticSensor`] is a cheaply cloneable handle onto shared state: hand
//! a [`SyntheticProvider`] built from it to the service, keep a clone, and
//! inspect the recorded call log or inject failures from the test.

use crate::hardware::{
    CameraHardware, CameraProvider, ControlSet, HardwareError, Metadata, PipelineConfig,
    RawFrame,
};
use crate::streaming::{FfmpegOutput, H264Encoder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// IMX708 full readout.
pub const SYNTHETIC_NATIVE_RESOLUTION: (u32, u32) = (4608, 2592);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Probe,
    Open,
    ApplyPipeline,
    ApplyControls,
    CaptureMetadata,
    CaptureFrame,
    StartCapture,
    StopCapture,
    AutofocusCycle,
    StartRecording,
    StopRecording,
    Close,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HardwareCall {
    Probe,
    Open { tuning: Option<PathBuf> },
    ApplyPipeline(PipelineConfig),
    ApplyControls(ControlSet),
    CaptureMetadata,
    CaptureFrame,
    StartCapture,
    StopCapture,
    AutofocusCycle,
    StartRecording { bitrate: u32, url: String },
    StopRecording,
    Close,
}

impl HardwareCall {
    pub fn operation(&self) -> Operation {
        match self {
            HardwareCall::Probe => Operation::Probe,
            HardwareCall::Open { .. } => Operation::Open,
            HardwareCall::ApplyPipeline(_) => Operation::ApplyPipeline,
            HardwareCall::ApplyControls(_) => Operation::ApplyControls,
            HardwareCall::CaptureMetadata => Operation::CaptureMetadata,
            HardwareCall::CaptureFrame => Operation::CaptureFrame,
            HardwareCall::StartCapture => Operation::StartCapture,
            HardwareCall::StopCapture => Operation::StopCapture,
            HardwareCall::AutofocusCycle => Operation::AutofocusCycle,
            HardwareCall::StartRecording { .. } => Operation::StartRecording,
            HardwareCall::StopRecording => Operation::StopRecording,
            HardwareCall::Close => Operation::Close,
        }
    }
}

#[derive(Debug)]
struct SensorState {
    cameras: usize,
    native_resolution: (u32, u32),
    metadata: Metadata,
    autofocus_converges: bool,
    failures: HashSet<Operation>,
    calls: Vec<HardwareCall>,
    capture_running: bool,
    recording: bool,
    pipeline: Option<PipelineConfig>,
    frames: u64,
}

#[derive(Debug, Clone)]
pub struct SyntheticSensor {
    state: Arc<Mutex<SensorState>>,
}

impl Default for SyntheticSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticSensor {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SensorState {
                cameras: 1,
                native_resolution: SYNTHETIC_NATIVE_RESOLUTION,
                metadata: default_metadata(),
                autofocus_converges: true,
                failures: HashSet::new(),
                calls: Vec::new(),
                capture_running: false,
                recording: false,
                pipeline: None,
                frames: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SensorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn provider(&self) -> SyntheticProvider {
        SyntheticProvider {
            sensor: self.clone(),
        }
    }

    pub fn with_camera_count(self, cameras: usize) -> Self {
        self.lock().cameras = cameras;
        self
    }

    pub fn with_native_resolution(self, width: u32, height: u32) -> Self {
        self.lock().native_resolution = (width, height);
        self
    }

    pub fn set_metadata(&self, metadata: Metadata) {
        self.lock().metadata = metadata;
    }

    pub fn set_autofocus_converges(&self, converges: bool) {
        self.lock().autofocus_converges = converges;
    }

    /// Make every subsequent call of `operation` fail.
    pub fn fail(&self, operation: Operation) {
        self.lock().failures.insert(operation);
    }

    pub fn recover(&self, operation: Operation) {
        self.lock().failures.remove(&operation);
    }

    pub fn calls(&self) -> Vec<HardwareCall> {
        self.lock().calls.clone()
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.lock().calls.iter().map(HardwareCall::operation).collect()
    }

    pub fn count(&self, operation: Operation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Every control set applied so far, oldest first.
    pub fn applied_controls(&self) -> Vec<ControlSet> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                HardwareCall::ApplyControls(controls) => Some(controls.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_controls(&self) -> Option<ControlSet> {
        self.applied_controls().pop()
    }

    pub fn pipeline(&self) -> Option<PipelineConfig> {
        self.lock().pipeline.clone()
    }

    pub fn is_capture_running(&self) -> bool {
        self.lock().capture_running
    }

    pub fn is_recording(&self) -> bool {
        self.lock().recording
    }

    /// Record `call`, failing instead when `operation` has been marked.
    fn record(&self, call: HardwareCall) -> Result<MutexGuard<'_, SensorState>, HardwareError> {
        let operation = call.operation();
        let mut state = self.lock();
        state.calls.push(call);
        if state.failures.contains(&operation) {
            return Err(HardwareError::new(format!(
                "synthetic failure injected at {operation:?}"
            )));
        }
        Ok(state)
    }
}

fn default_metadata() -> Metadata {
    Metadata {
        lux: Some(100.0),
        exposure_time: Some(10_000),
        analogue_gain: Some(1.0),
        colour_temperature: Some(5000.0),
        lens_position: Some(1.0),
        focus_fom: Some(1200),
        frame_duration: Some(33_333),
        frame_duration_limits: Some((33_333, 120_000)),
        sensor_black_levels: Some(vec![4096, 4096, 4096, 4096]),
    }
}

/// Gradient RGB frame that shifts with `sequence`.
pub fn synthetic_frame(width: u32, height: u32, sequence: u64) -> RawFrame {
    let mut data = vec![0u8; (width as usize) * (height as usize) * 3];
    let base = (sequence % 256) as u8;
    for y in 0..height {
        for x in 0..width {
            let idx = ((y as usize) * (width as usize) + x as usize) * 3;
            data[idx] = base.wrapping_add((x % 256) as u8);
            data[idx + 1] = base.wrapping_add((y % 256) as u8);
            data[idx + 2] = base.wrapping_add(((x + y) % 256) as u8);
        }
    }
    RawFrame {
        width,
        height,
        data,
    }
}

pub struct SyntheticProvider {
    sensor: SyntheticSensor,
}

impl SyntheticProvider {
    pub fn sensor(&self) -> &SyntheticSensor {
        &self.sensor
    }
}

impl CameraProvider for SyntheticProvider {
    fn probe_available(&self) -> Result<usize, HardwareError> {
        let state = self.sensor.record(HardwareCall::Probe)?;
        Ok(state.cameras)
    }

    fn open(&self, tuning: Option<&Path>) -> Result<Box<dyn CameraHardware>, HardwareError> {
        self.sensor.record(HardwareCall::Open {
            tuning: tuning.map(Path::to_path_buf),
        })?;
        Ok(Box::new(SyntheticCamera {
            sensor: self.sensor.clone(),
        }))
    }
}

pub struct SyntheticCamera {
    sensor: SyntheticSensor,
}

impl CameraHardware for SyntheticCamera {
    fn apply_pipeline_config(&mut self, config: &PipelineConfig) -> Result<(), HardwareError> {
        let mut state = self.sensor.record(HardwareCall::ApplyPipeline(config.clone()))?;
        if state.capture_running {
            return Err(HardwareError::new("cannot reconfigure while capture is running"));
        }
        state.pipeline = Some(config.clone());
        Ok(())
    }

    fn apply_controls(&mut self, controls: &ControlSet) -> Result<(), HardwareError> {
        self.sensor.record(HardwareCall::ApplyControls(controls.clone()))?;
        Ok(())
    }

    fn capture_metadata(&mut self) -> Result<Metadata, HardwareError> {
        let state = self.sensor.record(HardwareCall::CaptureMetadata)?;
        Ok(state.metadata.clone())
    }

    fn capture_frame(&mut self) -> Result<RawFrame, HardwareError> {
        let mut state = self.sensor.record(HardwareCall::CaptureFrame)?;
        let (width, height) = state
            .pipeline
            .as_ref()
            .map(|p| (p.width, p.height))
            .ok_or_else(|| HardwareError::new("pipeline not configured"))?;
        state.frames += 1;
        Ok(synthetic_frame(width, height, state.frames))
    }

    fn is_capture_running(&self) -> bool {
        self.sensor.lock().capture_running
    }

    fn start_capture(&mut self) -> Result<(), HardwareError> {
        let mut state = self.sensor.record(HardwareCall::StartCapture)?;
        state.capture_running = true;
        Ok(())
    }

    fn stop_capture(&mut self) -> Result<(), HardwareError> {
        let mut state = self.sensor.record(HardwareCall::StopCapture)?;
        state.capture_running = false;
        state.recording = false;
        Ok(())
    }

    fn trigger_autofocus_cycle(&mut self) -> Result<bool, HardwareError> {
        let state = self.sensor.record(HardwareCall::AutofocusCycle)?;
        Ok(state.autofocus_converges)
    }

    fn native_resolution(&self) -> (u32, u32) {
        self.sensor.lock().native_resolution
    }

    fn start_recording(
        &mut self,
        encoder: &H264Encoder,
        output: &FfmpegOutput,
    ) -> Result<(), HardwareError> {
        let mut state = self.sensor.record(HardwareCall::StartRecording {
            bitrate: encoder.bitrate(),
            url: output.url().to_string(),
        })?;
        if !state.capture_running {
            return Err(HardwareError::new("capture loop is not running"));
        }
        state.recording = true;
        Ok(())
    }

    fn stop_recording(&mut self) -> Result<(), HardwareError> {
        let mut state = self.sensor.record(HardwareCall::StopRecording)?;
        state.recording = false;
        Ok(())
    }

    fn close(&mut self) -> Result<(), HardwareError> {
        let mut state = self.sensor.record(HardwareCall::Close)?;
        state.capture_running = false;
        state.recording = false;
        state.pipeline = None;
        Ok(())
    }
}
