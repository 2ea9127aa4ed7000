#[cfg(test)]
mod reconfigure_tests {
    use picam_service::camera::{CameraController, CameraSettings, FovMode, TuningSearch};
    use picam_service::reconfigure::{Reconfigurator, ResolutionRequest};
    use picam_service::streaming::{StreamSettings, StreamingManager};
    use picam_service::testing::{Operation, SyntheticSensor};
    use picam_service::ErrorKind;
    use std::sync::Arc;

    struct Harness {
        sensor: SyntheticSensor,
        camera: Arc<CameraController>,
        streaming: Arc<StreamingManager>,
        reconfigurator: Reconfigurator,
    }

    fn streaming_harness() -> Harness {
        let sensor = SyntheticSensor::new();
        let camera = Arc::new(CameraController::with_tuning_search(
            Box::new(sensor.provider()),
            CameraSettings::default(),
            TuningSearch::new(Vec::new()),
        ));
        let streaming = Arc::new(StreamingManager::new(
            Arc::clone(&camera),
            StreamSettings::default(),
        ));
        let reconfigurator = Reconfigurator::new(Arc::clone(&camera), Arc::clone(&streaming));
        reconfigurator.start_streaming().unwrap();
        sensor.clear_calls();
        Harness {
            sensor,
            camera,
            streaming,
            reconfigurator,
        }
    }

    #[test]
    fn test_resolution_change_restores_streaming_in_order() {
        let h = streaming_harness();

        h.reconfigurator
            .change_resolution(ResolutionRequest::new(1280, 720))
            .unwrap();

        assert!(h.streaming.is_streaming());
        assert_eq!(h.camera.current_resolution(), (1280, 720));
        assert_eq!(
            h.sensor.operations(),
            vec![
                Operation::StopRecording,
                Operation::StopCapture,
                Operation::ApplyPipeline,
                Operation::StartCapture,
                Operation::StartRecording,
            ]
        );
    }

    #[test]
    fn test_resolution_change_without_restart() {
        let h = streaming_harness();
        h.reconfigurator
            .change_resolution(ResolutionRequest::new(1280, 720).restart_streaming(false))
            .unwrap();
        assert!(!h.streaming.is_streaming());
        assert_eq!(h.sensor.count(Operation::StartRecording), 0);
    }

    #[test]
    fn test_idle_stream_is_not_started() {
        let h = streaming_harness();
        h.reconfigurator.stop_streaming();
        h.sensor.clear_calls();

        h.reconfigurator
            .change_resolution(ResolutionRequest::new(640, 480))
            .unwrap();
        assert!(!h.streaming.is_streaming());
        assert_eq!(h.sensor.count(Operation::StartRecording), 0);
    }

    #[test]
    fn test_invalid_request_leaves_stream_running() {
        let h = streaming_harness();

        let err = h
            .reconfigurator
            .change_resolution(ResolutionRequest::new(8000, 720))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        let err = h.reconfigurator.change_framerate(0.0, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);

        assert!(h.streaming.is_streaming());
        assert!(h.sensor.calls().is_empty());
    }

    #[test]
    fn test_framerate_clamped_at_1080p() {
        let h = streaming_harness();

        let change = h.reconfigurator.change_framerate(500.0, true).unwrap();
        assert_eq!(change.requested, 500.0);
        assert_eq!(change.applied, 50.0);
        assert_eq!(change.max_framerate_for_resolution, 50.0);
        assert_eq!(change.resolution, "1920x1080");
        assert!(change.clamped);
        assert!(h.streaming.is_streaming());

        let again = h.reconfigurator.change_framerate(500.0, true).unwrap();
        assert_eq!(again, change);
    }

    #[test]
    fn test_failed_reconfiguration_leaves_stream_stopped() {
        let h = streaming_harness();
        h.sensor.fail(Operation::ApplyPipeline);

        let err = h
            .reconfigurator
            .change_resolution(ResolutionRequest::new(1280, 720))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert!(err.to_string().contains("Resolution change failed"));
        assert!(!h.streaming.is_streaming());
        assert!(!h.sensor.is_capture_running());
        assert_eq!(h.camera.current_resolution(), (1920, 1080));

        h.sensor.recover(Operation::ApplyPipeline);
        h.reconfigurator.start_streaming().unwrap();
        assert!(h.streaming.is_streaming());
    }

    #[test]
    fn test_fov_mode_applied_with_resolution() {
        let h = streaming_harness();
        h.reconfigurator
            .change_resolution(ResolutionRequest::new(1280, 720).with_fov_mode(FovMode::Crop))
            .unwrap();
        assert_eq!(h.camera.fov_mode().mode, FovMode::Crop);
        assert_eq!(h.sensor.pipeline().unwrap().raw_size, None);
    }

    #[test]
    fn test_concurrent_changes_serialize() {
        let h = Arc::new(streaming_harness());
        let handles: Vec<_> = [(1280, 720), (640, 480), (1920, 1080), (2304, 1296)]
            .into_iter()
            .map(|(w, hgt)| {
                let h = Arc::clone(&h);
                std::thread::spawn(move || {
                    h.reconfigurator
                        .change_resolution(ResolutionRequest::new(w, hgt))
                        .unwrap();
                    h.reconfigurator.change_framerate(60.0, true).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(h.streaming.is_streaming());
        assert_eq!(
            h.sensor.count(Operation::StartRecording),
            h.sensor.count(Operation::StopRecording)
        );
    }
}
