//! Accepted ranges for every user-settable camera parameter.
//!
//! All ranges are closed intervals. Violations produce
//! [`CameraError::InvalidParameter`] with a message naming the parameter, the
//! bound and the offending value, e.g. `exposure_us must be >= 100 (got 50)`.

use crate::errors::CameraError;
use std::fmt::Display;

pub const MIN_EXPOSURE_US: u32 = 100;
pub const MAX_EXPOSURE_US: u32 = 1_000_000;
pub const MIN_GAIN: f64 = 1.0;
pub const MAX_GAIN: f64 = 16.0;
pub const MIN_LENS_POSITION: f64 = 0.0;
pub const MAX_LENS_POSITION: f64 = 15.0;
pub const MIN_EXPOSURE_VALUE: f64 = -8.0;
pub const MAX_EXPOSURE_VALUE: f64 = 8.0;
pub const MIN_COLOUR_GAIN: f64 = 0.5;
pub const MAX_COLOUR_GAIN: f64 = 5.0;
pub const MIN_DIMENSION: u32 = 64;
pub const MAX_DIMENSION: u32 = 4096;
pub const MAX_FRAMERATE_REQUEST: f64 = 1000.0;
pub const MIN_SNAPSHOT_WIDTH: u32 = 320;
pub const MAX_SNAPSHOT_WIDTH: u32 = 4608;
pub const MIN_SNAPSHOT_HEIGHT: u32 = 240;
pub const MAX_SNAPSHOT_HEIGHT: u32 = 2592;

pub const BRIGHTNESS_RANGE: (f64, f64) = (-1.0, 1.0);
pub const CONTRAST_RANGE: (f64, f64) = (0.0, 2.0);
pub const SATURATION_RANGE: (f64, f64) = (0.0, 2.0);
pub const SHARPNESS_RANGE: (f64, f64) = (0.0, 16.0);

/// Closed-interval check. NaN fails the lower bound.
#[allow(clippy::neg_cmp_op_on_partial_ord)]
pub fn check_range<T>(name: &str, value: T, min: T, max: T) -> Result<(), CameraError>
where
    T: PartialOrd + Display + Copy,
{
    if !(value >= min) {
        return Err(CameraError::invalid(format!(
            "{name} must be >= {min} (got {value})"
        )));
    }
    if !(value <= max) {
        return Err(CameraError::invalid(format!(
            "{name} must be <= {max} (got {value})"
        )));
    }
    Ok(())
}

pub fn validate_exposure(exposure_us: u32) -> Result<(), CameraError> {
    check_range("exposure_us", exposure_us, MIN_EXPOSURE_US, MAX_EXPOSURE_US)
}

pub fn validate_gain(name: &str, gain: f64) -> Result<(), CameraError> {
    check_range(name, gain, MIN_GAIN, MAX_GAIN)
}

pub fn validate_resolution(width: u32, height: u32) -> Result<(), CameraError> {
    check_range("width", width, MIN_DIMENSION, MAX_DIMENSION)?;
    check_range("height", height, MIN_DIMENSION, MAX_DIMENSION)
}

pub fn validate_framerate_request(fps: f64) -> Result<(), CameraError> {
    if !(fps > 0.0) {
        return Err(CameraError::invalid(format!(
            "framerate must be > 0 (got {fps})"
        )));
    }
    check_range("framerate", fps, 0.0, MAX_FRAMERATE_REQUEST)
}

/// Region of interest in normalised coordinates. Offsets may sit on the frame
/// edge; extents must be positive. The region must stay inside the frame.
pub fn validate_roi(x: f64, y: f64, width: f64, height: f64) -> Result<(), CameraError> {
    check_range("x", x, 0.0, 1.0)?;
    check_range("y", y, 0.0, 1.0)?;
    for (name, extent) in [("width", width), ("height", height)] {
        if !(extent > 0.0) {
            return Err(CameraError::invalid(format!(
                "roi {name} must be > 0 (got {extent})"
            )));
        }
        check_range(name, extent, 0.0, 1.0)?;
    }
    if x + width > 1.0 {
        return Err(CameraError::invalid(format!(
            "x + width must be <= 1 (got {})",
            x + width
        )));
    }
    if y + height > 1.0 {
        return Err(CameraError::invalid(format!(
            "y + height must be <= 1 (got {})",
            y + height
        )));
    }
    Ok(())
}

pub fn validate_snapshot_size(width: u32, height: u32) -> Result<(), CameraError> {
    check_range("width", width, MIN_SNAPSHOT_WIDTH, MAX_SNAPSHOT_WIDTH)?;
    check_range("height", height, MIN_SNAPSHOT_HEIGHT, MAX_SNAPSHOT_HEIGHT)
}

/// Numeric limits advertised through capabilities.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LimitTable {
    pub exposure_us: (u32, u32),
    pub analogue_gain: (f64, f64),
    pub lens_position: (f64, f64),
    pub exposure_value: (f64, f64),
    pub colour_gains: (f64, f64),
    pub brightness: (f64, f64),
    pub contrast: (f64, f64),
    pub saturation: (f64, f64),
    pub sharpness: (f64, f64),
}

pub fn limit_table() -> LimitTable {
    LimitTable {
        exposure_us: (MIN_EXPOSURE_US, MAX_EXPOSURE_US),
        analogue_gain: (MIN_GAIN, MAX_GAIN),
        lens_position: (MIN_LENS_POSITION, MAX_LENS_POSITION),
        exposure_value: (MIN_EXPOSURE_VALUE, MAX_EXPOSURE_VALUE),
        colour_gains: (MIN_COLOUR_GAIN, MAX_COLOUR_GAIN),
        brightness: BRIGHTNESS_RANGE,
        contrast: CONTRAST_RANGE,
        saturation: SATURATION_RANGE,
        sharpness: SHARPNESS_RANGE,
    }
}
