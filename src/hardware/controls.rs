use std::collections::BTreeMap;
use std::fmt;

/// libcamera control names understood by the sensor backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub enum ControlId {
    AeEnable,
    ExposureTime,
    AnalogueGain,
    AwbEnable,
    AwbMode,
    ColourGains,
    AfMode,
    AfRange,
    AfTrigger,
    LensPosition,
    Brightness,
    Contrast,
    Saturation,
    Sharpness,
    HdrMode,
    ScalerCrop,
    FrameDurationLimits,
    FrameRate,
    ExposureValue,
    NoiseReductionMode,
    AeConstraintMode,
    AeExposureMode,
}

impl ControlId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AeEnable => "AeEnable",
            Self::ExposureTime => "ExposureTime",
            Self::AnalogueGain => "AnalogueGain",
            Self::AwbEnable => "AwbEnable",
            Self::AwbMode => "AwbMode",
            Self::ColourGains => "ColourGains",
            Self::AfMode => "AfMode",
            Self::AfRange => "AfRange",
            Self::AfTrigger => "AfTrigger",
            Self::LensPosition => "LensPosition",
            Self::Brightness => "Brightness",
            Self::Contrast => "Contrast",
            Self::Saturation => "Saturation",
            Self::Sharpness => "Sharpness",
            Self::HdrMode => "HdrMode",
            Self::ScalerCrop => "ScalerCrop",
            Self::FrameDurationLimits => "FrameDurationLimits",
            Self::FrameRate => "FrameRate",
            Self::ExposureValue => "ExposureValue",
            Self::NoiseReductionMode => "NoiseReductionMode",
            Self::AeConstraintMode => "AeConstraintMode",
            Self::AeExposureMode => "AeExposureMode",
        }
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sensor-space rectangle in native pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum ControlValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    FloatPair(f64, f64),
    IntPair(i64, i64),
    Rect(Rect),
}

/// A batch of controls handed to the hardware in a single apply call.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ControlSet {
    values: BTreeMap<ControlId, ControlValue>,
}

impl ControlSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: ControlId, value: ControlValue) -> Self {
        self.values.insert(id, value);
        self
    }

    pub fn with_bool(self, id: ControlId, value: bool) -> Self {
        self.with(id, ControlValue::Bool(value))
    }

    pub fn with_int(self, id: ControlId, value: i64) -> Self {
        self.with(id, ControlValue::Int(value))
    }

    pub fn with_float(self, id: ControlId, value: f64) -> Self {
        self.with(id, ControlValue::Float(value))
    }

    pub fn insert(&mut self, id: ControlId, value: ControlValue) {
        self.values.insert(id, value);
    }

    pub fn get(&self, id: ControlId) -> Option<&ControlValue> {
        self.values.get(&id)
    }

    pub fn contains(&self, id: ControlId) -> bool {
        self.values.contains_key(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ControlId, &ControlValue)> {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_names_match_libcamera() {
        assert_eq!(ControlId::AeEnable.as_str(), "AeEnable");
        assert_eq!(ControlId::ColourGains.to_string(), "ColourGains");
        assert_eq!(ControlId::FrameDurationLimits.as_str(), "FrameDurationLimits");
        assert_eq!(ControlId::AeExposureMode.to_string(), "AeExposureMode");
    }

    #[test]
    fn test_later_insert_overrides() {
        let set = ControlSet::new()
            .with_bool(ControlId::AeEnable, true)
            .with_bool(ControlId::AeEnable, false);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(ControlId::AeEnable), Some(&ControlValue::Bool(false)));
    }
}
