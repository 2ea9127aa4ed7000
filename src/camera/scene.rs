use serde::Serialize;

/// Lux at or above which a scene is always classified as daylight.
pub const DAY_LUX: f64 = 100.0;
pub const DEFAULT_NIGHT_THRESHOLD_LUX: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneMode {
    Day,
    LowLight,
    Night,
    Unknown,
}

impl SceneMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SceneMode::Day => "day",
            SceneMode::LowLight => "low_light",
            SceneMode::Night => "night",
            SceneMode::Unknown => "unknown",
        }
    }
}

/// Classify a lux reading. Both boundaries belong to the brighter class:
/// exactly 100 lux is day, and a reading equal to the threshold is low light.
pub fn classify_scene(lux: Option<f64>, night_threshold_lux: f64) -> SceneMode {
    match lux {
        None => SceneMode::Unknown,
        Some(lux) if lux.is_nan() => SceneMode::Unknown,
        Some(lux) if lux >= DAY_LUX => SceneMode::Day,
        Some(lux) if lux >= night_threshold_lux => SceneMode::LowLight,
        Some(_) => SceneMode::Night,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        let threshold = DEFAULT_NIGHT_THRESHOLD_LUX;
        assert_eq!(classify_scene(Some(100.5), threshold), SceneMode::Day);
        assert_eq!(classify_scene(Some(100.0), threshold), SceneMode::Day);
        assert_eq!(classify_scene(Some(99.9), threshold), SceneMode::LowLight);
        assert_eq!(classify_scene(Some(10.0), threshold), SceneMode::LowLight);
        assert_eq!(classify_scene(Some(9.999), threshold), SceneMode::Night);
        assert_eq!(classify_scene(None, threshold), SceneMode::Unknown);
    }

    #[test]
    fn test_zero_threshold_never_night_for_positive_lux() {
        assert_eq!(classify_scene(Some(0.0), 0.0), SceneMode::LowLight);
        assert_eq!(classify_scene(Some(0.01), 0.0), SceneMode::LowLight);
    }
}
