//! Testing utilities for picam-service
//!
//! A synthetic sensor that stands in for the libcamera backend, so the
//! coordinators can be exercised offline.

pub mod synthetic;

pub use synthetic::{
    synthetic_frame, HardwareCall, Operation, SyntheticCamera, SyntheticProvider,
    SyntheticSensor, SYNTHETIC_NATIVE_RESOLUTION,
};
