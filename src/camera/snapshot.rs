use crate::errors::CameraError;
use crate::hardware::RawFrame;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::RgbImage;

pub const JPEG_QUALITY: u8 = 95;
pub const DEFAULT_SNAPSHOT_WIDTH: u32 = 1920;
pub const DEFAULT_SNAPSHOT_HEIGHT: u32 = 1080;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotRequest {
    pub width: u32,
    pub height: u32,
    /// Run one autofocus cycle before capturing. On by default.
    pub autofocus: bool,
}

impl Default for SnapshotRequest {
    fn default() -> Self {
        Self {
            width: DEFAULT_SNAPSHOT_WIDTH,
            height: DEFAULT_SNAPSHOT_HEIGHT,
            autofocus: true,
        }
    }
}

impl SnapshotRequest {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            autofocus: true,
        }
    }

    pub fn with_autofocus(mut self, autofocus: bool) -> Self {
        self.autofocus = autofocus;
        self
    }
}

/// Resize (Lanczos3) when the frame size differs from the target, then encode
/// as JPEG.
pub fn encode_jpeg(frame: RawFrame, width: u32, height: u32) -> Result<Vec<u8>, CameraError> {
    let (frame_width, frame_height) = (frame.width, frame.height);
    let image = RgbImage::from_raw(frame_width, frame_height, frame.data).ok_or_else(|| {
        CameraError::Internal(format!(
            "frame buffer does not match {frame_width}x{frame_height} RGB"
        ))
    })?;

    let image = if (frame_width, frame_height) != (width, height) {
        imageops::resize(&image, width, height, FilterType::Lanczos3)
    } else {
        image
    };

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY)
        .encode_image(&image)
        .map_err(|e| CameraError::Internal(format!("JPEG encoding failed: {e}")))?;
    Ok(bytes)
}
