//! Encoder and transport descriptors handed to the hardware when recording.

use std::process::{Command, Stdio};

pub const DEFAULT_BITRATE: u32 = 8_000_000;

/// H.264 encoder settings bound to one streaming session.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct H264Encoder {
    bitrate: u32,
}

impl H264Encoder {
    pub fn new(bitrate: u32) -> Self {
        Self { bitrate }
    }

    pub fn bitrate(&self) -> u32 {
        self.bitrate
    }
}

impl Default for H264Encoder {
    fn default() -> Self {
        Self::new(DEFAULT_BITRATE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RtspTransport {
    Tcp,
}

impl RtspTransport {
    pub fn as_str(&self) -> &'static str {
        match self {
            RtspTransport::Tcp => "tcp",
        }
    }
}

/// ffmpeg relay that publishes the encoded H.264 elementary stream to an
/// RTSP server.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FfmpegOutput {
    url: String,
    transport: RtspTransport,
    audio: bool,
}

impl FfmpegOutput {
    /// Video-only RTSP push over TCP.
    pub fn rtsp(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            transport: RtspTransport::Tcp,
            audio: false,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn transport(&self) -> RtspTransport {
        self.transport
    }

    pub fn audio(&self) -> bool {
        self.audio
    }

    /// Muxer arguments appended after the stdin input arguments.
    pub fn output_args(&self) -> Vec<String> {
        vec![
            "-f".to_string(),
            "rtsp".to_string(),
            "-rtsp_transport".to_string(),
            self.transport.as_str().to_string(),
            self.url.clone(),
        ]
    }

    /// Full ffmpeg argument list reading H.264 from stdin.
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "h264",
            "-i",
            "-",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        if !self.audio {
            args.push("-an".to_string());
        }
        args.extend(["-c:v".to_string(), "copy".to_string()]);
        args.extend(self.output_args());
        args
    }

    pub fn command(&self) -> Command {
        let mut command = Command::new("ffmpeg");
        command
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }
}
