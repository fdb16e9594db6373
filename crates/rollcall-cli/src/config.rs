//! Injected runtime configuration.
//!
//! Defaults rooted at the XDG data directory, optionally overridden by a
//! TOML file and `ROLLCALL_*` environment variables. No global mutable
//! state: the loaded `Config` is handed to the session at startup.

use anyhow::Context;
use rollcall_core::DetectParams;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// V4L2 device path.
    pub camera_device: String,
    /// Cascade model JSON file.
    pub cascade_model: PathBuf,
    /// Append-only person details file.
    pub details_file: PathBuf,
    /// Append-only attendance ledger file.
    pub attendance_file: PathBuf,
    /// Directory holding one reference image per registered ID.
    pub faces_dir: PathBuf,
    /// Pixel-norm threshold for a positive match.
    pub match_threshold: f64,
    /// Detector window growth factor between pyramid levels.
    pub scale_factor: f32,
    /// Minimum merged detection hits for a region to survive.
    pub min_neighbors: u32,
    /// Minimum face size in pixels.
    pub min_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            camera_device: "/dev/video0".to_string(),
            cascade_model: data_dir.join("frontalface.json"),
            details_file: data_dir.join("person_details.txt"),
            attendance_file: data_dir.join("attendance.txt"),
            faces_dir: data_dir.join("faces"),
            match_threshold: 1000.0,
            scale_factor: 1.1,
            min_neighbors: 3,
            min_size: 30,
        }
    }
}

impl Config {
    /// Load configuration: TOML file if given, then environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read config file {}", p.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("failed to parse config file {}", p.display()))?
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("ROLLCALL_CAMERA_DEVICE") {
            self.camera_device = v;
        }
        if let Ok(v) = std::env::var("ROLLCALL_MODEL") {
            self.cascade_model = PathBuf::from(v);
        }
        self.match_threshold = env_f64("ROLLCALL_MATCH_THRESHOLD", self.match_threshold);
    }

    /// Detector scan parameters derived from this config.
    pub fn detect_params(&self) -> DetectParams {
        DetectParams {
            scale_factor: self.scale_factor,
            min_neighbors: self.min_neighbors,
            min_size: self.min_size,
        }
    }
}

/// `$XDG_DATA_HOME/rollcall`, falling back to `~/.local/share/rollcall`.
fn default_data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("rollcall")
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
