//! Tuning profile selection.
//!
//! An explicitly configured file wins when it exists. Otherwise the sensor
//! model (plus `_noir` for NoIR modules) is looked up under each search root
//! in order, and the first hit is used. No hit means the hardware default.

use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Raspberry Pi 5 (PiSP) tuning directory.
pub const PISP_TUNING_DIR: &str = "/usr/share/libcamera/ipa/rpi/pisp";
/// Raspberry Pi 4 and earlier (VC4) tuning directory.
pub const VC4_TUNING_DIR: &str = "/usr/share/libcamera/ipa/rpi/vc4";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TuningSearch {
    roots: Vec<PathBuf>,
}

impl Default for TuningSearch {
    fn default() -> Self {
        Self {
            roots: vec![PathBuf::from(PISP_TUNING_DIR), PathBuf::from(VC4_TUNING_DIR)],
        }
    }
}

impl TuningSearch {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn file_name(camera_model: &str, is_noir: bool) -> String {
        if is_noir {
            format!("{camera_model}_noir.json")
        } else {
            format!("{camera_model}.json")
        }
    }

    pub fn select(
        &self,
        explicit: Option<&Path>,
        camera_model: &str,
        is_noir: bool,
    ) -> Option<PathBuf> {
        if let Some(path) = explicit {
            if path.exists() {
                debug!("Using configured tuning file {}", path.display());
                return Some(path.to_path_buf());
            }
            warn!(
                "Configured tuning file {} does not exist, falling back to auto-detection",
                path.display()
            );
        }

        let name = Self::file_name(camera_model, is_noir);
        let found = self
            .roots
            .iter()
            .map(|root| root.join(&name))
            .find(|candidate| candidate.exists());
        match &found {
            Some(path) => debug!("Auto-detected tuning file {}", path.display()),
            None => debug!("No tuning file found for {name}, using hardware default"),
        }
        found
    }
}
