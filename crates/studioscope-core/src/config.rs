//! Host configuration.
//!
//! Loaded from a JSON file; every field is optional and falls back to its
//! default. Command-line flags override file values.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::draw::Size;
use crate::generator::{Generator, Liveliness};

/// Jitter amplitude used when `lively` is on.
pub const LIVELY_AMPLITUDE: f64 = 0.35;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Generator seed.
    pub seed: u32,
    /// Layer non-reproducible jitter over the generator.
    pub lively: bool,
    pub width: f64,
    pub height: f64,
    /// Target frame rate for headless rendering and the terminal host.
    pub fps: f64,
    /// Frames to render or benchmark.
    pub frames: u64,
}

impl Default for StudioConfig {
    fn default() -> Self {
        let size = Size::default();
        Self {
            seed: 7,
            lively: false,
            width: size.width,
            height: size.height,
            fps: 60.0,
            frames: 120,
        }
    }
}

impl StudioConfig {
    /// Read a JSON config file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: StudioConfig = serde_json::from_str(&text)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }

    /// Surface size, clamped to the minimum edge.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height).clamped()
    }

    pub fn generator(&self) -> Generator {
        Generator::new(self.seed)
    }

    pub fn liveliness(&self) -> Liveliness {
        if self.lively {
            Liveliness::new(LIVELY_AMPLITUDE)
        } else {
            Liveliness::OFF
        }
    }

    /// Frame interval in ms; non-positive rates fall back to 60 fps.
    pub fn frame_interval_ms(&self) -> f64 {
        if self.fps.is_finite() && self.fps > 0.0 {
            1000.0 / self.fps
        } else {
            1000.0 / 60.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studio.json");
        std::fs::write(&path, r#"{ "seed": 99, "lively": true }"#).unwrap();
        let config = StudioConfig::load(&path).unwrap();
        assert_eq!(config.seed, 99);
        assert!(config.liveliness().is_enabled());
        assert_eq!(config.fps, 60.0);
        assert_eq!(config.size(), Size::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studio.json");
        let config = StudioConfig {
            width: 0.0,
            frames: 3,
            ..StudioConfig::default()
        };
        config.save(&path).unwrap();
        let loaded = StudioConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.size().width, 16.0);
    }

    #[test]
    fn malformed_json_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ seed: ").unwrap();
        let err = StudioConfig::load(&path).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = StudioConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn zero_fps_falls_back() {
        let config = StudioConfig {
            fps: 0.0,
            ..StudioConfig::default()
        };
        assert!((config.frame_interval_ms() - 1000.0 / 60.0).abs() < 1e-12);
    }
}
