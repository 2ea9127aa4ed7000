//! Camera coordinator: parameter validation, soft-tracked state, status and
//! pipeline reconfiguration.

pub mod controller;
pub mod framerate;
pub mod limits;
pub mod modes;
pub mod scene;
mod setters;
pub mod snapshot;
pub mod tuning;

pub use controller::{
    CameraController, CameraSettings, CameraStatus, Capabilities, CurrentLimits, DayNightPolicy,
    ExposureLimits, FovInfo, AUTOFOCUS_MODELS,
};
pub use framerate::{clamp_framerate, max_framerate_for, FramerateChange, FramerateLimit};
pub use modes::{
    AeConstraintMode, AeExposureMode, AutofocusMode, AutofocusRange, AwbMode, AwbPreset,
    DayNightMode, FovMode, HdrMode, NoiseReductionMode,
};
pub use scene::{classify_scene, SceneMode};
pub use setters::ImageAdjustments;
pub use snapshot::SnapshotRequest;
pub use tuning::TuningSearch;
