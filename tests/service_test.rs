#[cfg(test)]
mod service_tests {
    use picam_service::testing::{Operation, SyntheticSensor};
    use picam_service::{CameraService, ErrorKind, HealthState, ResolutionRequest, ServiceConfig};

    fn service(sensor: &SyntheticSensor, stream_on_startup: bool) -> CameraService {
        let config = ServiceConfig {
            stream_on_startup,
            ..ServiceConfig::default()
        };
        CameraService::new(config, Box::new(sensor.provider()))
    }

    #[test]
    fn test_fresh_startup_reports_default_state() {
        let sensor = SyntheticSensor::new();
        let service = service(&sensor, false);
        service.startup().unwrap();

        let status = service.status().unwrap();
        assert!(status.camera.auto_exposure);
        assert!(!status.streaming);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["streaming"], false);
        assert_eq!(json["auto_exposure"], true);
        assert_eq!(json["scene_mode"], "day");
    }

    #[test]
    fn test_startup_streams_when_enabled() {
        let sensor = SyntheticSensor::new();
        let service = service(&sensor, true);
        service.startup().unwrap();

        let health = service.health();
        assert_eq!(health.status, HealthState::Healthy);
        assert!(health.camera_configured);
        assert!(health.streaming_active);
        assert!(!health.version.is_empty());
    }

    #[test]
    fn test_health_reachable_without_camera() {
        let sensor = SyntheticSensor::new().with_camera_count(0);
        let service = service(&sensor, true);

        assert_eq!(service.startup().unwrap_err().kind(), ErrorKind::CameraUnavailable);
        let health = service.health();
        assert_eq!(health.status, HealthState::Degraded);
        assert!(!health.camera_configured);
        assert!(!health.streaming_active);
    }

    #[test]
    fn test_shutdown_stops_stream_before_closing() {
        let sensor = SyntheticSensor::new();
        let service = service(&sensor, true);
        service.startup().unwrap();
        sensor.clear_calls();

        service.shutdown();
        service.shutdown();
        assert_eq!(
            sensor.operations(),
            vec![Operation::StopRecording, Operation::Close]
        );
        assert!(!service.camera().is_configured());
    }

    #[test]
    fn test_drop_releases_camera() {
        let sensor = SyntheticSensor::new();
        {
            let service = service(&sensor, true);
            service.startup().unwrap();
        }
        assert_eq!(sensor.count(Operation::Close), 1);
        assert!(!sensor.is_recording());
    }

    #[test]
    fn test_resolution_through_service() {
        let sensor = SyntheticSensor::new();
        let service = service(&sensor, true);
        service.startup().unwrap();

        service
            .set_resolution(ResolutionRequest::new(1280, 720))
            .unwrap();
        let change = service.set_framerate(200.0, true).unwrap();
        assert_eq!(change.applied, 120.0);
        assert!(service.status().unwrap().streaming);
    }

    #[test]
    fn test_health_answers_while_camera_is_busy() {
        let sensor = SyntheticSensor::new();
        let service = service(&sensor, false);
        service.startup().unwrap();

        let health = service
            .camera()
            .with_hardware(|_hardware| Ok(service.health()))
            .unwrap();
        assert_eq!(health.status, HealthState::Healthy);
        assert!(health.camera_configured);
    }

    #[test]
    fn test_restart_reports_configured_defaults() {
        let sensor = SyntheticSensor::new();
        let service = service(&sensor, false);
        service.startup().unwrap();
        service
            .set_resolution(ResolutionRequest::new(1280, 720))
            .unwrap();

        service.shutdown();
        assert_eq!(service.health().status, HealthState::Degraded);
        service.startup().unwrap();

        let status = service.status().unwrap();
        assert_eq!((status.camera.width, status.camera.height), (1920, 1080));
    }
}
