#[cfg(test)]
mod streaming_tests {
    use picam_service::camera::{CameraController, CameraSettings, TuningSearch};
    use picam_service::streaming::{StreamSettings, StreamingManager};
    use picam_service::testing::{HardwareCall, Operation, SyntheticSensor};
    use picam_service::{CameraError, ErrorKind};
    use std::sync::Arc;

    fn setup(sensor: &SyntheticSensor) -> (Arc<CameraController>, StreamingManager) {
        let camera = Arc::new(CameraController::with_tuning_search(
            Box::new(sensor.provider()),
            CameraSettings::default(),
            TuningSearch::new(Vec::new()),
        ));
        let settings = StreamSettings {
            bitrate: 4_000_000,
            rtsp_url: "rtsp://127.0.0.1:8554/test".to_string(),
        };
        let streaming = StreamingManager::new(Arc::clone(&camera), settings);
        (camera, streaming)
    }

    #[test]
    fn test_start_configures_lazily_and_is_idempotent() {
        let sensor = SyntheticSensor::new();
        let (camera, streaming) = setup(&sensor);
        assert!(!camera.is_configured());

        streaming.start().unwrap();
        assert!(camera.is_configured());
        assert!(streaming.is_streaming());
        let first = streaming.stream_info().unwrap();

        streaming.start().unwrap();
        assert_eq!(streaming.stream_info().unwrap(), first);
        assert_eq!(sensor.count(Operation::StartRecording), 1);
        assert_eq!(sensor.count(Operation::Open), 1);
    }

    #[test]
    fn test_start_binds_encoder_and_output() {
        let sensor = SyntheticSensor::new();
        let (_camera, streaming) = setup(&sensor);
        streaming.start().unwrap();

        let recording = sensor
            .calls()
            .into_iter()
            .find(|call| call.operation() == Operation::StartRecording);
        assert_eq!(
            recording,
            Some(HardwareCall::StartRecording {
                bitrate: 4_000_000,
                url: "rtsp://127.0.0.1:8554/test".to_string(),
            })
        );
        assert!(sensor.is_capture_running());
        let info = streaming.stream_info().unwrap();
        assert_eq!(info.bitrate, 4_000_000);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let sensor = SyntheticSensor::new();
        let (_camera, streaming) = setup(&sensor);
        streaming.start().unwrap();

        streaming.stop();
        streaming.stop();
        assert!(!streaming.is_streaming());
        assert!(streaming.stream_info().is_none());
        assert_eq!(sensor.count(Operation::StopRecording), 1);
    }

    #[test]
    fn test_stop_without_start_touches_nothing() {
        let sensor = SyntheticSensor::new();
        let (camera, streaming) = setup(&sensor);
        streaming.stop();
        assert!(!camera.is_configured());
        assert!(sensor.calls().is_empty());
    }

    #[test]
    fn test_stop_error_is_swallowed() {
        let sensor = SyntheticSensor::new();
        let (_camera, streaming) = setup(&sensor);
        streaming.start().unwrap();
        sensor.fail(Operation::StopRecording);

        streaming.stop();
        assert!(!streaming.is_streaming());
    }

    #[test]
    fn test_recording_failure_is_streaming_failed() {
        let sensor = SyntheticSensor::new();
        let (_camera, streaming) = setup(&sensor);
        sensor.fail(Operation::StartRecording);

        let err = streaming.start().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StreamingFailed);
        assert!(!streaming.is_streaming());
        assert!(sensor.is_capture_running());
        assert!(!sensor.is_recording());

        sensor.recover(Operation::StartRecording);
        streaming.start().unwrap();
        assert!(streaming.is_streaming());
    }

    #[test]
    fn test_recording_failure_keeps_existing_capture() {
        let sensor = SyntheticSensor::new();
        let (camera, streaming) = setup(&sensor);
        camera.with_hardware(|hardware| hardware.start_capture()).unwrap();
        sensor.clear_calls();
        sensor.fail(Operation::StartRecording);

        assert!(streaming.start().is_err());
        assert!(sensor.is_capture_running());
        assert_eq!(sensor.count(Operation::StartCapture), 0);
        assert_eq!(sensor.count(Operation::StopCapture), 0);
    }

    #[test]
    fn test_missing_camera_wraps_cause() {
        let sensor = SyntheticSensor::new().with_camera_count(0);
        let (_camera, streaming) = setup(&sensor);

        match streaming.start() {
            Err(CameraError::StreamingFailed(cause)) => {
                assert_eq!(cause.kind(), ErrorKind::CameraUnavailable)
            }
            other => panic!("expected StreamingFailed, got {other:?}"),
        }
        assert!(!streaming.is_streaming());
    }

    #[test]
    fn test_restart_creates_new_session() {
        let sensor = SyntheticSensor::new();
        let (_camera, streaming) = setup(&sensor);
        streaming.start().unwrap();
        let first = streaming.stream_info().unwrap();
        streaming.stop();
        streaming.start().unwrap();

        assert_ne!(streaming.stream_info().unwrap().id, first.id);
        assert_eq!(sensor.count(Operation::StartRecording), 2);
    }
}
