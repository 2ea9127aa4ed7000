use super::controller::{exposure_controls, CameraController, DayNightPolicy, ExposureLimits};
use super::limits::{self, check_range};
use super::modes::{
    AeConstraintMode, AeExposureMode, AutofocusMode, AutofocusRange, AwbMode, AwbPreset,
    DayNightMode, FovMode, HdrMode, NoiseReductionMode,
};
use crate::errors::CameraError;
use crate::hardware::{ControlId, ControlSet, ControlValue, Rect, Transform};
use log::{info, warn};

/// Optional image-processing adjustments; only provided fields are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImageAdjustments {
    pub brightness: Option<f64>,
    pub contrast: Option<f64>,
    pub saturation: Option<f64>,
    pub sharpness: Option<f64>,
}

impl ImageAdjustments {
    fn to_controls(self) -> Result<ControlSet, CameraError> {
        let fields = [
            ("brightness", self.brightness, limits::BRIGHTNESS_RANGE, ControlId::Brightness),
            ("contrast", self.contrast, limits::CONTRAST_RANGE, ControlId::Contrast),
            ("saturation", self.saturation, limits::SATURATION_RANGE, ControlId::Saturation),
            ("sharpness", self.sharpness, limits::SHARPNESS_RANGE, ControlId::Sharpness),
        ];
        let mut controls = ControlSet::new();
        for (name, value, (min, max), id) in fields {
            if let Some(value) = value {
                check_range(name, value, min, max)?;
                controls.insert(id, ControlValue::Float(value));
            }
        }
        Ok(controls)
    }
}

impl CameraController {
    pub fn set_auto_exposure(&self, enabled: bool) -> Result<(), CameraError> {
        self.apply_controls_with(exposure_controls(enabled), |state| {
            state.auto_exposure = enabled;
        })?;
        info!("Auto exposure {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    pub fn set_manual_exposure(&self, exposure_us: u32, gain: f64) -> Result<(), CameraError> {
        limits::validate_exposure(exposure_us)?;
        limits::validate_gain("gain", gain)?;

        let controls = ControlSet::new()
            .with_bool(ControlId::AeEnable, false)
            .with_int(ControlId::ExposureTime, i64::from(exposure_us))
            .with_float(ControlId::AnalogueGain, gain);
        self.apply_controls_with(controls, |state| state.auto_exposure = false)?;
        info!("Manual exposure set: {exposure_us}us, gain {gain}");
        Ok(())
    }

    pub fn set_awb(&self, enabled: bool) -> Result<(), CameraError> {
        let controls = ControlSet::new().with_bool(ControlId::AwbEnable, enabled);
        self.apply_controls_with(controls, |_| {})?;
        info!("Auto white balance {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    pub fn set_autofocus_mode(&self, mode: AutofocusMode) -> Result<(), CameraError> {
        let controls = ControlSet::new().with_int(ControlId::AfMode, mode.control_code());
        self.apply_controls_with(controls, |state| state.autofocus_mode = mode)?;
        info!("Autofocus mode set to {mode}");
        Ok(())
    }

    pub fn set_autofocus_range(&self, range: AutofocusRange) -> Result<(), CameraError> {
        let controls = ControlSet::new().with_int(ControlId::AfRange, range.control_code());
        self.apply_controls_with(controls, |_| {})?;
        info!("Autofocus range set to {range}");
        Ok(())
    }

    /// Drive the lens to a fixed dioptre value. Switches autofocus to manual.
    pub fn set_lens_position(&self, position: f64) -> Result<(), CameraError> {
        check_range(
            "lens_position",
            position,
            limits::MIN_LENS_POSITION,
            limits::MAX_LENS_POSITION,
        )?;

        let controls = ControlSet::new()
            .with_int(ControlId::AfMode, AutofocusMode::Manual.control_code())
            .with_float(ControlId::LensPosition, position);
        self.apply_controls_with(controls, |state| {
            state.autofocus_mode = AutofocusMode::Manual;
        })?;
        info!("Lens position set to {position}");
        Ok(())
    }

    /// Start one autofocus scan without waiting for it.
    pub fn trigger_autofocus(&self) -> Result<(), CameraError> {
        let controls = ControlSet::new().with_int(ControlId::AfTrigger, 0);
        self.apply_controls_with(controls, |_| {})?;
        info!("Autofocus triggered");
        Ok(())
    }

    pub fn set_manual_awb(&self, red_gain: f64, blue_gain: f64) -> Result<(), CameraError> {
        check_range("red_gain", red_gain, limits::MIN_COLOUR_GAIN, limits::MAX_COLOUR_GAIN)?;
        check_range("blue_gain", blue_gain, limits::MIN_COLOUR_GAIN, limits::MAX_COLOUR_GAIN)?;

        self.apply_controls_with(colour_gain_controls(red_gain, blue_gain), |_| {})?;
        info!("Manual white balance set: red {red_gain}, blue {blue_gain}");
        Ok(())
    }

    pub fn set_awb_preset(&self, preset: AwbPreset) -> Result<(), CameraError> {
        let (red_gain, blue_gain) = preset.colour_gains();
        self.apply_controls_with(colour_gain_controls(red_gain, blue_gain), |_| {})?;
        info!("White balance preset {preset} applied");
        Ok(())
    }

    pub fn set_awb_mode(&self, mode: AwbMode) -> Result<(), CameraError> {
        let controls = ControlSet::new()
            .with_bool(ControlId::AwbEnable, true)
            .with_int(ControlId::AwbMode, mode.control_code());
        self.apply_controls_with(controls, |_| {})?;
        info!("White balance mode set to {mode}");
        Ok(())
    }

    pub fn set_image_processing(&self, adjustments: ImageAdjustments) -> Result<(), CameraError> {
        let controls = adjustments.to_controls()?;

        let mut state = self.lock();
        let hardware = state.hardware_mut()?;
        if controls.is_empty() {
            return Ok(());
        }
        hardware.apply_controls(&controls)?;
        info!("Image processing updated: {adjustments:?}");
        Ok(())
    }

    /// Record and apply the HDR mode. Sensor HDR only takes effect once the
    /// pipeline is reconfigured.
    pub fn set_hdr_mode(&self, mode: HdrMode) -> Result<(), CameraError> {
        let controls = ControlSet::new().with_int(ControlId::HdrMode, mode.control_code());
        self.apply_controls_with(controls, |state| state.hdr_mode = mode)?;
        info!("HDR mode set to {mode}");
        Ok(())
    }

    /// Crop to a normalised region of the sensor.
    pub fn set_roi(&self, x: f64, y: f64, width: f64, height: f64) -> Result<(), CameraError> {
        limits::validate_roi(x, y, width, height)?;

        let mut state = self.lock();
        let hardware = state.hardware_mut()?;
        let (native_width, native_height) = hardware.native_resolution();
        // Offset and size are rounded separately, so the size is clamped to
        // keep the crop inside the sensor.
        let span = |offset: f64, size: f64, extent: u32| {
            let extent = extent.max(1);
            let start = ((offset * f64::from(extent)).round() as u32).min(extent - 1);
            let length = ((size * f64::from(extent)).round() as u32).clamp(1, extent - start);
            (start, length)
        };
        let (crop_x, crop_width) = span(x, width, native_width);
        let (crop_y, crop_height) = span(y, height, native_height);
        let crop = Rect {
            x: crop_x,
            y: crop_y,
            width: crop_width,
            height: crop_height,
        };
        hardware.apply_controls(&ControlSet::new().with(ControlId::ScalerCrop, ControlValue::Rect(crop)))?;
        info!("ROI set to {crop:?}");
        Ok(())
    }

    /// Bound auto exposure. Only the exposure-time range reaches the sensor,
    /// expressed as frame-duration limits; gain bounds are validated and
    /// reported but not enforced.
    pub fn set_exposure_limits(&self, requested: ExposureLimits) -> Result<(), CameraError> {
        let ExposureLimits {
            min_exposure_us,
            max_exposure_us,
            min_gain,
            max_gain,
        } = requested;
        for (name, value) in [("min_exposure_us", min_exposure_us), ("max_exposure_us", max_exposure_us)] {
            if let Some(value) = value {
                check_range(name, value, limits::MIN_EXPOSURE_US, limits::MAX_EXPOSURE_US)?;
            }
        }
        for (name, value) in [("min_gain", min_gain), ("max_gain", max_gain)] {
            if let Some(value) = value {
                limits::validate_gain(name, value)?;
            }
        }
        let min_us = min_exposure_us.unwrap_or(limits::MIN_EXPOSURE_US);
        let max_us = max_exposure_us.unwrap_or(limits::MAX_EXPOSURE_US);
        if min_us > max_us {
            return Err(CameraError::invalid(format!(
                "min_exposure_us must be <= max_exposure_us (got {min_us} > {max_us})"
            )));
        }
        if let (Some(min), Some(max)) = (min_gain, max_gain) {
            if min > max {
                return Err(CameraError::invalid(format!(
                    "min_gain must be <= max_gain (got {min} > {max})"
                )));
            }
        }

        let controls = ControlSet::new().with(
            ControlId::FrameDurationLimits,
            ControlValue::IntPair(i64::from(min_us), i64::from(max_us)),
        );
        self.apply_controls_with(controls, |state| state.exposure_limits = requested)?;
        if min_gain.is_some() || max_gain.is_some() {
            warn!("Gain limits recorded but not enforced by the sensor");
        }
        info!("Exposure limits set: {min_us}-{max_us}us");
        Ok(())
    }

    pub fn set_exposure_value(&self, ev: f64) -> Result<(), CameraError> {
        check_range(
            "exposure_value",
            ev,
            limits::MIN_EXPOSURE_VALUE,
            limits::MAX_EXPOSURE_VALUE,
        )?;
        let controls = ControlSet::new().with_float(ControlId::ExposureValue, ev);
        self.apply_controls_with(controls, |_| {})?;
        info!("Exposure value set to {ev:+}");
        Ok(())
    }

    pub fn set_noise_reduction_mode(&self, mode: NoiseReductionMode) -> Result<(), CameraError> {
        let controls =
            ControlSet::new().with_int(ControlId::NoiseReductionMode, mode.control_code());
        self.apply_controls_with(controls, |_| {})?;
        info!("Noise reduction mode set to {mode}");
        Ok(())
    }

    pub fn set_ae_constraint_mode(&self, mode: AeConstraintMode) -> Result<(), CameraError> {
        let controls = ControlSet::new().with_int(ControlId::AeConstraintMode, mode.control_code());
        self.apply_controls_with(controls, |_| {})?;
        info!("AE constraint mode set to {mode}");
        Ok(())
    }

    pub fn set_ae_exposure_mode(&self, mode: AeExposureMode) -> Result<(), CameraError> {
        let controls = ControlSet::new().with_int(ControlId::AeExposureMode, mode.control_code());
        self.apply_controls_with(controls, |_| {})?;
        info!("AE exposure mode set to {mode}");
        Ok(())
    }

    pub fn set_lens_correction(&self, enabled: bool) -> Result<(), CameraError> {
        let mut state = self.lock();
        state.hardware_mut()?;
        state.lens_correction = enabled;
        info!("Lens correction {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    /// Record a flip/rotation for the next pipeline reconfiguration.
    pub fn set_transform(&self, hflip: bool, vflip: bool, rotation: u32) -> Result<(), CameraError> {
        if rotation != 0 && rotation != 180 {
            return Err(CameraError::invalid(format!(
                "rotation must be 0 or 180 (got {rotation})"
            )));
        }
        let rotated = rotation == 180;
        let transform = Transform {
            hflip: hflip ^ rotated,
            vflip: vflip ^ rotated,
        };

        let mut state = self.lock();
        state.hardware_mut()?;
        state.transform = transform;
        info!("Transform set to {transform:?}, applied on next reconfiguration");
        Ok(())
    }

    pub fn set_day_night_mode(&self, mode: DayNightMode, threshold_lux: f64) -> Result<(), CameraError> {
        if !threshold_lux.is_finite() {
            return Err(CameraError::invalid(format!(
                "threshold_lux must be a finite number (got {threshold_lux})"
            )));
        }
        check_range("threshold_lux", threshold_lux, 0.0, f64::MAX)?;

        let mut state = self.lock();
        state.hardware_mut()?;
        state.day_night = DayNightPolicy {
            mode,
            threshold_lux,
        };
        info!("Day/night mode set to {mode} (threshold {threshold_lux} lux)");
        Ok(())
    }

    /// Select how the next reconfiguration maps the sensor onto the output.
    pub fn set_fov_mode(&self, mode: FovMode) -> Result<(), CameraError> {
        let mut state = self.lock();
        state.hardware_mut()?;
        state.fov_mode = mode;
        info!("FOV mode set to {mode}");
        Ok(())
    }
}

fn colour_gain_controls(red_gain: f64, blue_gain: f64) -> ControlSet {
    ControlSet::new()
        .with_bool(ControlId::AwbEnable, false)
        .with(ControlId::ColourGains, ControlValue::FloatPair(red_gain, blue_gain))
}
