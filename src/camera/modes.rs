//! Enumerated camera settings and their libcamera control codes.

use crate::errors::CameraError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

macro_rules! mode_enum {
    ($(#[$meta:meta])* $name:ident, $label:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            pub fn allowed() -> Vec<&'static str> {
                Self::ALL.iter().map(|mode| mode.as_str()).collect()
            }
        }

        impl FromStr for $name {
            type Err = CameraError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(CameraError::invalid(format!(
                        "{} must be one of [{}] (got '{}')",
                        $label,
                        Self::allowed().join(", "),
                        s
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

mode_enum!(AutofocusMode, "autofocus mode" {
    Default => "default",
    Manual => "manual",
    Auto => "auto",
    Continuous => "continuous",
});

impl AutofocusMode {
    pub fn control_code(&self) -> i64 {
        match self {
            AutofocusMode::Default | AutofocusMode::Manual => 0,
            AutofocusMode::Auto => 1,
            AutofocusMode::Continuous => 2,
        }
    }

    /// Modes in which the lens is driven by the autofocus algorithm.
    pub fn is_automatic(&self) -> bool {
        matches!(self, AutofocusMode::Auto | AutofocusMode::Continuous)
    }
}

mode_enum!(AutofocusRange, "autofocus range" {
    Normal => "normal",
    Macro => "macro",
    Full => "full",
});

impl AutofocusRange {
    pub fn control_code(&self) -> i64 {
        match self {
            AutofocusRange::Normal => 0,
            AutofocusRange::Macro => 1,
            AutofocusRange::Full => 2,
        }
    }
}

mode_enum!(HdrMode, "hdr mode" {
    Off => "off",
    Auto => "auto",
    Sensor => "sensor",
    SingleExposure => "single-exp",
});

impl HdrMode {
    pub fn control_code(&self) -> i64 {
        match self {
            HdrMode::Off => 0,
            HdrMode::Sensor => 1,
            HdrMode::Auto => 2,
            HdrMode::SingleExposure => 3,
        }
    }
}

mode_enum!(NoiseReductionMode, "noise reduction mode" {
    Off => "off",
    Fast => "fast",
    HighQuality => "high_quality",
    Minimal => "minimal",
    Zsl => "zsl",
});

impl NoiseReductionMode {
    pub fn control_code(&self) -> i64 {
        match self {
            NoiseReductionMode::Off => 0,
            NoiseReductionMode::Fast => 1,
            NoiseReductionMode::HighQuality => 2,
            NoiseReductionMode::Minimal => 3,
            NoiseReductionMode::Zsl => 4,
        }
    }
}

mode_enum!(AeConstraintMode, "ae constraint mode" {
    Normal => "normal",
    Highlight => "highlight",
    Shadows => "shadows",
    Custom => "custom",
});

impl AeConstraintMode {
    pub fn control_code(&self) -> i64 {
        match self {
            AeConstraintMode::Normal => 0,
            AeConstraintMode::Highlight => 1,
            AeConstraintMode::Shadows => 2,
            AeConstraintMode::Custom => 3,
        }
    }
}

mode_enum!(AeExposureMode, "ae exposure mode" {
    Normal => "normal",
    Short => "short",
    Long => "long",
    Custom => "custom",
});

impl AeExposureMode {
    pub fn control_code(&self) -> i64 {
        match self {
            AeExposureMode::Normal => 0,
            AeExposureMode::Short => 1,
            AeExposureMode::Long => 2,
            AeExposureMode::Custom => 3,
        }
    }
}

mode_enum!(AwbMode, "awb mode" {
    Auto => "auto",
    Tungsten => "tungsten",
    Fluorescent => "fluorescent",
    Indoor => "indoor",
    Daylight => "daylight",
    Cloudy => "cloudy",
    Custom => "custom",
});

impl AwbMode {
    /// libcamera AwbModeEnum; code 1 (incandescent) is not exposed.
    pub fn control_code(&self) -> i64 {
        match self {
            AwbMode::Auto => 0,
            AwbMode::Tungsten => 2,
            AwbMode::Fluorescent => 3,
            AwbMode::Indoor => 4,
            AwbMode::Daylight => 5,
            AwbMode::Cloudy => 6,
            AwbMode::Custom => 7,
        }
    }
}

mode_enum!(
    /// Fixed colour-gain presets for NoIR sensors under IR illumination.
    AwbPreset, "awb preset" {
    DaylightNoir => "daylight_noir",
    Ir850nm => "ir_850nm",
    Ir940nm => "ir_940nm",
    IndoorNoir => "indoor_noir",
});

impl AwbPreset {
    /// `(red, blue)` colour gains.
    pub fn colour_gains(&self) -> (f64, f64) {
        match self {
            AwbPreset::DaylightNoir => (1.5, 1.8),
            AwbPreset::Ir850nm => (1.0, 1.0),
            AwbPreset::Ir940nm => (0.9, 1.1),
            AwbPreset::IndoorNoir => (1.4, 1.6),
        }
    }
}

mode_enum!(DayNightMode, "day/night mode" {
    Manual => "manual",
    Auto => "auto",
});

mode_enum!(FovMode, "fov mode" {
    Scale => "scale",
    Crop => "crop",
});

impl FovMode {
    pub fn description(&self) -> &'static str {
        match self {
            FovMode::Scale => "Full sensor readout downscaled to the output size; keeps the full field of view",
            FovMode::Crop => "Sensor crop matching the output size; narrows the field of view",
        }
    }
}
