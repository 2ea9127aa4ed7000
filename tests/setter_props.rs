//! Property-based tests for camera parameter validation
//!
//! Range acceptance for the validated setters and determinism of the
//! framerate clamp, driven against the synthetic sensor.
//!
//! Run with: cargo test --test setter_props

use picam_service::camera::{
    clamp_framerate, max_framerate_for, CameraController, CameraSettings, TuningSearch,
};
use picam_service::testing::{Operation, SyntheticSensor};
use picam_service::ErrorKind;
use proptest::prelude::*;

fn configured() -> (SyntheticSensor, CameraController) {
    let sensor = SyntheticSensor::new();
    let camera = CameraController::with_tuning_search(
        Box::new(sensor.provider()),
        CameraSettings::default(),
        TuningSearch::new(Vec::new()),
    );
    camera.configure().unwrap();
    sensor.clear_calls();
    (sensor, camera)
}

proptest! {
    /// Exposure is accepted exactly inside 100..=1_000_000 microseconds
    #[test]
    fn exposure_accepted_iff_in_range(exposure in 0u32..2_000_000) {
        let (sensor, camera) = configured();
        let result = camera.set_manual_exposure(exposure, 1.0);
        if (100..=1_000_000).contains(&exposure) {
            prop_assert!(result.is_ok());
            prop_assert_eq!(sensor.count(Operation::ApplyControls), 1);
        } else {
            prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidParameter);
            prop_assert_eq!(sensor.count(Operation::ApplyControls), 0);
        }
    }

    /// Gain is accepted exactly inside 1.0..=16.0
    #[test]
    fn gain_accepted_iff_in_range(gain in -4.0f64..32.0) {
        let (_sensor, camera) = configured();
        let result = camera.set_manual_exposure(10_000, gain);
        prop_assert_eq!(result.is_ok(), (1.0..=16.0).contains(&gain));
    }

    /// The clamp never exceeds the ceiling and never raises a request
    #[test]
    fn clamp_is_min_of_request_and_ceiling(
        fps in 0.1f64..1000.0,
        width in 64u32..=4096,
        height in 64u32..=4096,
    ) {
        let ceiling = max_framerate_for(width, height);
        let (applied, clamped) = clamp_framerate(fps, width, height);
        prop_assert_eq!(applied, fps.min(ceiling));
        prop_assert_eq!(clamped, fps > ceiling);
    }

    /// Repeating a framerate request at the same resolution gives the same answer
    #[test]
    fn set_framerate_is_deterministic(fps in 0.1f64..1000.0) {
        let (_sensor, camera) = configured();
        let first = camera.set_framerate(fps).unwrap();
        let second = camera.set_framerate(fps).unwrap();
        prop_assert_eq!(first, second);
    }

    /// ROI is rejected whenever the region leaves the frame
    #[test]
    fn roi_rejected_outside_frame(
        x in 0.01f64..=1.0,
        y in 0.01f64..=1.0,
        w in 0.01f64..=1.0,
        h in 0.01f64..=1.0,
    ) {
        let (_sensor, camera) = configured();
        let result = camera.set_roi(x, y, w, h);
        if x + w > 1.0 || y + h > 1.0 {
            prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidParameter);
        } else {
            prop_assert!(result.is_ok());
        }
    }

    /// Lens position accepted exactly inside 0..=15
    #[test]
    fn lens_position_range(position in -5.0f64..20.0) {
        let (_sensor, camera) = configured();
        prop_assert_eq!(
            camera.set_lens_position(position).is_ok(),
            (0.0..=15.0).contains(&position)
        );
    }
}
