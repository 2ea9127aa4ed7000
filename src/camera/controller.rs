use super::framerate::{clamp_framerate, max_framerate_for, FramerateChange, FramerateLimit};
use super::limits::{self, LimitTable, MAX_EXPOSURE_US};
use super::modes::{AutofocusMode, DayNightMode, FovMode, HdrMode};
use super::scene::{classify_scene, SceneMode, DEFAULT_NIGHT_THRESHOLD_LUX};
use super::snapshot::{encode_jpeg, SnapshotRequest};
use super::tuning::TuningSearch;
use crate::errors::CameraError;
use crate::hardware::{
    CameraHardware, CameraProvider, ControlId, ControlSet, ControlValue, HardwareError,
    PipelineConfig, PixelFormat, Transform,
};
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Sensor models fitted with a motorised lens.
pub const AUTOFOCUS_MODELS: &[&str] = &["imx708", "imx519", "arducam_64mp"];

const COMMON_RESOLUTIONS: &[(u32, u32)] = &[
    (4608, 2592),
    (3840, 2160),
    (2560, 1440),
    (2304, 1296),
    (1920, 1080),
    (1536, 864),
    (1280, 720),
    (640, 480),
];

const BASE_FEATURES: &[&str] = &[
    "auto_exposure",
    "manual_exposure",
    "auto_white_balance",
    "manual_white_balance",
    "awb_modes",
    "awb_presets",
    "image_processing",
    "hdr",
    "roi",
    "exposure_limits",
    "exposure_value",
    "noise_reduction",
    "ae_constraint_modes",
    "ae_exposure_modes",
    "lens_correction",
    "transform",
    "day_night_detection",
    "resolution_change",
    "framerate_change",
    "fov_mode",
    "snapshot",
];

const AUTOFOCUS_FEATURES: &[&str] = &[
    "autofocus",
    "autofocus_range",
    "autofocus_trigger",
    "lens_position",
];

/// Fixed camera parameters taken from service configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraSettings {
    pub width: u32,
    pub height: u32,
    pub framerate: f64,
    pub enable_awb: bool,
    pub default_auto_exposure: bool,
    pub tuning_file: Option<PathBuf>,
    pub camera_model: String,
    pub is_noir: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            framerate: 30.0,
            enable_awb: true,
            default_auto_exposure: true,
            tuning_file: None,
            camera_model: "imx708".to_string(),
            is_noir: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct DayNightPolicy {
    pub mode: DayNightMode,
    pub threshold_lux: f64,
}

/// Requested exposure bounds, as last accepted by `set_exposure_limits`.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct ExposureLimits {
    pub min_exposure_us: Option<u32>,
    pub max_exposure_us: Option<u32>,
    pub min_gain: Option<f64>,
    pub max_gain: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CurrentLimits {
    /// Frame-duration bounds reported by the sensor, in microseconds.
    pub frame_duration_limits_us: Option<(i64, i64)>,
    pub exposure_time_max_us: u32,
    pub effective_max_exposure_us: i64,
    pub requested: ExposureLimits,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CameraStatus {
    pub lux: Option<f64>,
    pub exposure_us: Option<u32>,
    pub analogue_gain: Option<f64>,
    pub colour_temperature: Option<f64>,
    pub lens_position: Option<f64>,
    pub focus_fom: Option<i64>,
    pub frame_duration_us: Option<i64>,
    pub sensor_black_levels: Option<Vec<i32>>,
    pub auto_exposure: bool,
    pub autofocus_mode: AutofocusMode,
    pub hdr_mode: HdrMode,
    pub lens_correction_enabled: bool,
    pub day_night_mode: DayNightMode,
    pub day_night_threshold_lux: f64,
    pub scene_mode: SceneMode,
    pub fov_mode: FovMode,
    pub transform: Transform,
    pub width: u32,
    pub height: u32,
    pub framerate: f64,
    pub current_limits: CurrentLimits,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Capabilities {
    pub sensor_model: String,
    pub is_noir: bool,
    pub native_resolution: (u32, u32),
    pub supported_resolutions: Vec<(u32, u32)>,
    pub limits: LimitTable,
    pub features: Vec<&'static str>,
    pub current_framerate: f64,
    pub max_framerate_for_current_resolution: f64,
    pub framerate_limits_by_resolution: Vec<FramerateLimit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct FovInfo {
    pub mode: FovMode,
    pub description: &'static str,
}

pub(super) struct CameraState {
    pub(super) hardware: Option<Box<dyn CameraHardware>>,
    pub(super) auto_exposure: bool,
    pub(super) autofocus_mode: AutofocusMode,
    pub(super) hdr_mode: HdrMode,
    pub(super) lens_correction: bool,
    pub(super) day_night: DayNightPolicy,
    pub(super) width: u32,
    pub(super) height: u32,
    pub(super) framerate: f64,
    pub(super) fov_mode: FovMode,
    pub(super) transform: Transform,
    pub(super) exposure_limits: ExposureLimits,
}

impl CameraState {
    fn new(settings: &CameraSettings) -> Self {
        let (framerate, _) = clamp_framerate(settings.framerate, settings.width, settings.height);
        Self {
            hardware: None,
            auto_exposure: settings.default_auto_exposure,
            autofocus_mode: AutofocusMode::Continuous,
            hdr_mode: HdrMode::Off,
            lens_correction: true,
            day_night: DayNightPolicy {
                mode: DayNightMode::Manual,
                threshold_lux: DEFAULT_NIGHT_THRESHOLD_LUX,
            },
            width: settings.width,
            height: settings.height,
            framerate,
            fov_mode: FovMode::Scale,
            transform: Transform::default(),
            exposure_limits: ExposureLimits::default(),
        }
    }

    pub(super) fn hardware_mut(&mut self) -> Result<&mut dyn CameraHardware, CameraError> {
        match self.hardware.as_deref_mut() {
            Some(hardware) => Ok(hardware),
            None => Err(CameraError::not_configured()),
        }
    }

    /// Pipeline shape for the given dimensions, carrying every other current
    /// setting over.
    fn shape(&self, width: u32, height: u32, framerate: f64) -> PipelineShape {
        PipelineShape {
            width,
            height,
            framerate,
            autofocus_mode: self.autofocus_mode,
            fov_mode: self.fov_mode,
            transform: self.transform,
        }
    }
}

struct PipelineShape {
    width: u32,
    height: u32,
    framerate: f64,
    autofocus_mode: AutofocusMode,
    fov_mode: FovMode,
    transform: Transform,
}

impl PipelineShape {
    fn build(&self, hardware: &dyn CameraHardware) -> Result<PipelineConfig, HardwareError> {
        let controls = ControlSet::new()
            .with_float(ControlId::FrameRate, self.framerate)
            .with_int(ControlId::AfMode, self.autofocus_mode.control_code());
        let raw_size = match self.fov_mode {
            FovMode::Scale => Some(hardware.native_resolution()),
            FovMode::Crop => None,
        };
        Ok(hardware
            .build_pipeline_config(self.width, self.height, PixelFormat::Yuv420, controls)?
            .with_raw_size(raw_size)
            .with_transform(self.transform))
    }
}

/// Sole owner of the camera hardware handle.
///
/// Every hardware call happens under one internal lock. Setters validate
/// their input before taking it.
pub struct CameraController {
    provider: Box<dyn CameraProvider>,
    settings: CameraSettings,
    tuning: TuningSearch,
    state: Mutex<CameraState>,
    /// Mirrors `state.hardware.is_some()` for lock-free liveness checks.
    configured: AtomicBool,
}

impl CameraController {
    pub fn new(provider: Box<dyn CameraProvider>, settings: CameraSettings) -> Self {
        Self::with_tuning_search(provider, settings, TuningSearch::default())
    }

    pub fn with_tuning_search(
        provider: Box<dyn CameraProvider>,
        settings: CameraSettings,
        tuning: TuningSearch,
    ) -> Self {
        let state = Mutex::new(CameraState::new(&settings));
        debug!("CameraController initialized for {}", settings.camera_model);
        Self {
            provider,
            settings,
            tuning,
            state,
            configured: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, CameraState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Does not take the camera lock.
    pub fn is_configured(&self) -> bool {
        self.configured.load(Ordering::SeqCst)
    }

    /// Open the sensor and apply the initial pipeline. No-op when already
    /// configured.
    pub fn configure(&self) -> Result<(), CameraError> {
        let mut state = self.lock();
        self.configure_locked(&mut state)
    }

    fn configure_locked(&self, state: &mut CameraState) -> Result<(), CameraError> {
        if state.hardware.is_some() {
            debug!("Camera already configured, skipping");
            return Ok(());
        }

        info!("Configuring camera...");
        let cameras = self.provider.probe_available().unwrap_or_else(|e| {
            error!("Error checking camera availability: {e}");
            0
        });
        if cameras == 0 {
            return Err(CameraError::CameraUnavailable(
                "No camera detected. Check hardware connection.".to_string(),
            ));
        }

        let tuning = self.tuning.select(
            self.settings.tuning_file.as_deref(),
            &self.settings.camera_model,
            self.settings.is_noir,
        );
        let mut hardware = self.provider.open(tuning.as_deref()).map_err(|e| {
            error!("Failed to open camera: {e}");
            CameraError::ConfigurationFailed(e)
        })?;

        let shape = state.shape(state.width, state.height, state.framerate);
        let defaults = exposure_controls(self.settings.default_auto_exposure)
            .with_bool(ControlId::AwbEnable, self.settings.enable_awb);
        let result = shape
            .build(hardware.as_ref())
            .and_then(|config| hardware.apply_pipeline_config(&config))
            .and_then(|()| hardware.apply_controls(&defaults));

        if let Err(e) = result {
            error!("Failed to configure camera: {e}");
            if let Err(close_err) = hardware.close() {
                warn!("Error closing half-configured camera: {close_err}");
            }
            return Err(CameraError::ConfigurationFailed(e));
        }

        state.hardware = Some(hardware);
        state.auto_exposure = self.settings.default_auto_exposure;
        self.configured.store(true, Ordering::SeqCst);
        info!(
            "Camera configured: {}x{} @ {}fps",
            state.width, state.height, state.framerate
        );
        Ok(())
    }

    /// Close the handle and return every tracked setting to its configured
    /// default, since a reopened sensor starts from hardware defaults.
    /// Errors from the hardware are logged, never returned.
    pub fn cleanup(&self) {
        let mut state = self.lock();
        if let Some(mut hardware) = state.hardware.take() {
            info!("Cleaning up camera resources...");
            match hardware.close() {
                Ok(()) => info!("Camera closed successfully"),
                Err(e) => error!("Error closing camera: {e}"),
            }
            *state = CameraState::new(&self.settings);
        }
        self.configured.store(false, Ordering::SeqCst);
    }

    /// Run `f` against the handle, configuring the camera first if needed.
    pub fn with_hardware<R>(
        &self,
        f: impl FnOnce(&mut dyn CameraHardware) -> Result<R, HardwareError>,
    ) -> Result<R, CameraError> {
        let mut state = self.lock();
        self.configure_locked(&mut state)?;
        let hardware = state.hardware_mut()?;
        Ok(f(hardware)?)
    }

    /// Like [`Self::with_hardware`] but fails instead of configuring.
    pub fn with_configured_hardware<R>(
        &self,
        f: impl FnOnce(&mut dyn CameraHardware) -> Result<R, HardwareError>,
    ) -> Result<R, CameraError> {
        let mut state = self.lock();
        let hardware = state.hardware_mut()?;
        Ok(f(hardware)?)
    }

    pub(super) fn apply_controls_with(
        &self,
        controls: ControlSet,
        update: impl FnOnce(&mut CameraState),
    ) -> Result<(), CameraError> {
        let mut state = self.lock();
        state.hardware_mut()?.apply_controls(&controls)?;
        update(&mut state);
        Ok(())
    }

    pub fn get_status(&self) -> Result<CameraStatus, CameraError> {
        let mut state = self.lock();
        let metadata = state.hardware_mut()?.capture_metadata()?;

        let effective_max_exposure_us = metadata
            .frame_duration_limits
            .map(|(_, max)| max.min(i64::from(MAX_EXPOSURE_US)))
            .unwrap_or(i64::from(MAX_EXPOSURE_US));

        Ok(CameraStatus {
            lux: metadata.lux,
            exposure_us: metadata.exposure_time,
            analogue_gain: metadata.analogue_gain,
            colour_temperature: metadata.colour_temperature,
            lens_position: metadata.lens_position,
            focus_fom: metadata.focus_fom,
            frame_duration_us: metadata.frame_duration,
            sensor_black_levels: metadata.sensor_black_levels,
            auto_exposure: state.auto_exposure,
            autofocus_mode: state.autofocus_mode,
            hdr_mode: state.hdr_mode,
            lens_correction_enabled: state.lens_correction,
            day_night_mode: state.day_night.mode,
            day_night_threshold_lux: state.day_night.threshold_lux,
            scene_mode: classify_scene(metadata.lux, state.day_night.threshold_lux),
            fov_mode: state.fov_mode,
            transform: state.transform,
            width: state.width,
            height: state.height,
            framerate: state.framerate,
            current_limits: CurrentLimits {
                frame_duration_limits_us: metadata.frame_duration_limits,
                exposure_time_max_us: MAX_EXPOSURE_US,
                effective_max_exposure_us,
                requested: state.exposure_limits,
            },
        })
    }

    pub fn get_capabilities(&self) -> Result<Capabilities, CameraError> {
        let mut state = self.lock();
        let (native_width, native_height) = state.hardware_mut()?.native_resolution();

        let supported_resolutions: Vec<(u32, u32)> = COMMON_RESOLUTIONS
            .iter()
            .copied()
            .filter(|(w, h)| *w <= native_width && *h <= native_height)
            .filter(|&(w, h)| limits::validate_resolution(w, h).is_ok())
            .collect();
        let framerate_limits_by_resolution = supported_resolutions
            .iter()
            .map(|&(width, height)| FramerateLimit {
                width,
                height,
                max_framerate: max_framerate_for(width, height),
            })
            .collect();

        let mut features = BASE_FEATURES.to_vec();
        if AUTOFOCUS_MODELS.contains(&self.settings.camera_model.as_str()) {
            features.extend_from_slice(AUTOFOCUS_FEATURES);
        }
        if self.settings.is_noir {
            features.push("noir");
        }

        Ok(Capabilities {
            sensor_model: self.settings.camera_model.clone(),
            is_noir: self.settings.is_noir,
            native_resolution: (native_width, native_height),
            supported_resolutions,
            limits: limits::limit_table(),
            features,
            current_framerate: state.framerate,
            max_framerate_for_current_resolution: max_framerate_for(state.width, state.height),
            framerate_limits_by_resolution,
        })
    }

    pub fn fov_mode(&self) -> FovInfo {
        let mode = self.lock().fov_mode;
        FovInfo {
            mode,
            description: mode.description(),
        }
    }

    pub fn current_resolution(&self) -> (u32, u32) {
        let state = self.lock();
        (state.width, state.height)
    }

    pub fn current_framerate(&self) -> f64 {
        self.lock().framerate
    }

    /// Capture one JPEG. Does not interrupt a running stream.
    pub fn capture_snapshot(&self, request: SnapshotRequest) -> Result<Vec<u8>, CameraError> {
        limits::validate_snapshot_size(request.width, request.height)?;

        let mut state = self.lock();
        let autofocus = request.autofocus && state.autofocus_mode.is_automatic();
        let hardware = state.hardware_mut()?;
        if autofocus {
            debug!("Running autofocus cycle before capture");
            if !hardware.trigger_autofocus_cycle()? {
                warn!("Autofocus cycle did not converge, capturing anyway");
            }
        }
        let frame = hardware.capture_frame()?;
        drop(state);

        let jpeg = encode_jpeg(frame, request.width, request.height)?;
        info!(
            "Captured snapshot {}x{} ({} bytes)",
            request.width,
            request.height,
            jpeg.len()
        );
        Ok(jpeg)
    }

    /// Change output dimensions. The current framerate is re-clamped to the
    /// new resolution's ceiling.
    pub fn set_resolution(&self, width: u32, height: u32) -> Result<(), CameraError> {
        limits::validate_resolution(width, height)?;

        let mut state = self.lock();
        state.hardware_mut()?;
        let (framerate, clamped) = clamp_framerate(state.framerate, width, height);
        if clamped {
            info!("Framerate lowered to {framerate}fps for {width}x{height}");
        }
        let shape = state.shape(width, height, framerate);
        reconfigure(&mut state, shape)
            .map_err(|e| CameraError::invalid(format!("Resolution change failed: {e}")))?;
        info!("Resolution changed to {width}x{height}");
        Ok(())
    }

    /// Change the target framerate, clamping it to the current resolution's
    /// ceiling instead of rejecting it.
    pub fn set_framerate(&self, fps: f64) -> Result<FramerateChange, CameraError> {
        limits::validate_framerate_request(fps)?;

        let mut state = self.lock();
        state.hardware_mut()?;
        let (width, height) = (state.width, state.height);
        let (applied, clamped) = clamp_framerate(fps, width, height);
        if clamped {
            warn!("Requested {fps}fps exceeds {applied}fps ceiling for {width}x{height}, clamping");
        }
        let shape = state.shape(width, height, applied);
        reconfigure(&mut state, shape)
            .map_err(|e| CameraError::invalid(format!("Framerate change failed: {e}")))?;
        info!("Framerate changed to {applied}fps");

        Ok(FramerateChange {
            requested: fps,
            applied,
            max_framerate_for_resolution: max_framerate_for(width, height),
            resolution: format!("{width}x{height}"),
            clamped,
        })
    }
}

pub(super) fn exposure_controls(auto: bool) -> ControlSet {
    let controls = ControlSet::new().with_bool(ControlId::AeEnable, auto);
    if auto {
        controls.with(ControlId::ExposureTime, ControlValue::Int(0))
    } else {
        controls
    }
}

/// Stop capture if running, rebuild and apply the pipeline, record the new
/// shape, then restart capture. A failure part way through leaves capture
/// stopped.
fn reconfigure(state: &mut CameraState, shape: PipelineShape) -> Result<(), HardwareError> {
    let hardware = state
        .hardware
        .as_deref_mut()
        .ok_or_else(|| HardwareError::new("camera handle is closed"))?;
    let was_running = hardware.is_capture_running();
    if was_running {
        hardware.stop_capture()?;
    }

    let config = shape.build(&*hardware)?;
    hardware.apply_pipeline_config(&config)?;
    state.width = shape.width;
    state.height = shape.height;
    state.framerate = shape.framerate;

    if was_running {
        hardware.start_capture()?;
    }
    Ok(())
}

impl Drop for CameraController {
    fn drop(&mut self) {
        self.cleanup();
    }
}
