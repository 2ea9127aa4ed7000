//! Streaming coordinator: H.264 encoder plus RTSP relay lifecycle.

pub mod encoder;
pub mod manager;

pub use encoder::{FfmpegOutput, H264Encoder, RtspTransport, DEFAULT_BITRATE};
pub use manager::{StreamInfo, StreamSettings, StreamingManager, DEFAULT_RTSP_URL};
