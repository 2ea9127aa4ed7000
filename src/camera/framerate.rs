//! Resolution-dependent framerate ceilings.
//!
//! Requests above the ceiling are clamped rather than rejected; the caller
//! gets both values back in a [`FramerateChange`].

/// `(minimum pixel count, ceiling fps)`, strictest tier first.
const FRAMERATE_TIERS: [(u64, f64); 5] = [
    (8_000_000, 30.0),
    (3_500_000, 40.0),
    (2_000_000, 50.0),
    (1_500_000, 60.0),
    (900_000, 120.0),
];

/// Ceiling for anything smaller than the last tier.
const SMALL_FRAME_CEILING: f64 = 120.0;

pub fn max_framerate_for(width: u32, height: u32) -> f64 {
    let pixels = u64::from(width) * u64::from(height);
    FRAMERATE_TIERS
        .iter()
        .find(|(min_pixels, _)| pixels >= *min_pixels)
        .map(|(_, fps)| *fps)
        .unwrap_or(SMALL_FRAME_CEILING)
}

/// Returns the applied framerate and whether it differs from the request.
pub fn clamp_framerate(requested: f64, width: u32, height: u32) -> (f64, bool) {
    let ceiling = max_framerate_for(width, height);
    if requested > ceiling {
        (ceiling, true)
    } else {
        (requested, false)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FramerateChange {
    pub requested: f64,
    pub applied: f64,
    pub max_framerate_for_resolution: f64,
    pub resolution: String,
    pub clamped: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FramerateLimit {
    pub width: u32,
    pub height: u32,
    pub max_framerate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_1080p_ceiling() {
        assert_eq!(max_framerate_for(1920, 1080), 50.0);
        assert_eq!(clamp_framerate(500.0, 1920, 1080), (50.0, true));
        assert_eq!(clamp_framerate(25.0, 1920, 1080), (25.0, false));
    }

    #[test]
    fn test_breakpoints_use_greater_or_equal() {
        // 4000 x 2000 = 8,000,000
        assert_eq!(max_framerate_for(4000, 2000), 30.0);
        assert_eq!(max_framerate_for(3999, 2000), 40.0);
        // 2000 x 1750 = 3,500,000
        assert_eq!(max_framerate_for(2000, 1750), 40.0);
        assert_eq!(max_framerate_for(1999, 1750), 50.0);
        // 2000 x 1000 = 2,000,000
        assert_eq!(max_framerate_for(2000, 1000), 50.0);
        assert_eq!(max_framerate_for(1999, 1000), 60.0);
        // 1500 x 1000 = 1,500,000
        assert_eq!(max_framerate_for(1500, 1000), 60.0);
        assert_eq!(max_framerate_for(1499, 1000), 120.0);
        // 1000 x 900 = 900,000
        assert_eq!(max_framerate_for(1000, 900), 120.0);
        assert_eq!(max_framerate_for(999, 900), 120.0);
        assert_eq!(max_framerate_for(64, 64), 120.0);
    }
}
