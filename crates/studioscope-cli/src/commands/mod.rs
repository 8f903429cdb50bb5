pub mod bench;
pub mod list;
pub mod phases;
pub mod render;
pub mod watch;

use std::path::Path;

use studioscope_core::{StudioConfig, Visualization, widget_names, widgets};

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub seed: Option<u32>,
    pub lively: bool,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub fps: Option<f64>,
    pub frames: Option<u64>,
}

impl Overrides {
    pub fn apply(self, config: &mut StudioConfig) {
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if self.lively {
            config.lively = true;
        }
        if let Some(w) = self.width {
            config.width = w;
        }
        if let Some(h) = self.height {
            config.height = h;
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if let Some(frames) = self.frames {
            config.frames = frames;
        }
    }
}

/// Load the config file (or defaults) and apply flag overrides.
/// Exits with status 1 when the file cannot be read.
pub fn load_config(path: Option<&str>, overrides: Overrides) -> StudioConfig {
    let mut config = match path {
        Some(p) => match StudioConfig::load(Path::new(p)) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: cannot load config '{p}': {e}");
                std::process::exit(1);
            }
        },
        None => StudioConfig::default(),
    };
    overrides.apply(&mut config);
    config
}

/// Build a widget by name or exit listing the valid names.
pub fn require_widget(name: &str) -> Box<dyn Visualization> {
    match widgets::build(name) {
        Some(w) => w,
        None => {
            eprintln!(
                "Error: unknown widget '{name}'. Available: {}",
                widget_names().join(", ")
            );
            std::process::exit(1);
        }
    }
}

/// Parse a comma-separated list of millisecond values.
pub fn parse_times(s: &str) -> Result<Vec<f64>, String> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            let v: f64 = t
                .trim_end_matches("ms")
                .parse()
                .map_err(|_| format!("invalid time '{t}'"))?;
            if v.is_finite() {
                Ok(v)
            } else {
                Err(format!("invalid time '{t}'"))
            }
        })
        .collect()
}

/// Pretty-print `value` as JSON to `path`.
pub fn write_json<T: serde::Serialize>(path: &str, value: &T) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    std::fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_times_accepts_plain_and_suffixed() {
        assert_eq!(
            parse_times("0, 5499,5501ms,").unwrap(),
            vec![0.0, 5499.0, 5501.0]
        );
    }

    #[test]
    fn parse_times_rejects_garbage() {
        assert!(parse_times("12,abc").is_err());
        assert!(parse_times("inf").is_err());
        assert!(parse_times("").unwrap().is_empty());
    }

    #[test]
    fn overrides_replace_config_values() {
        let mut config = StudioConfig::default();
        Overrides {
            seed: Some(42),
            lively: true,
            fps: Some(30.0),
            ..Overrides::default()
        }
        .apply(&mut config);
        assert_eq!(config.seed, 42);
        assert!(config.lively);
        assert_eq!(config.fps, 30.0);
        assert_eq!(config.frames, StudioConfig::default().frames);
    }

    #[test]
    fn lively_flag_never_turns_jitter_off() {
        let mut config = StudioConfig {
            lively: true,
            ..StudioConfig::default()
        };
        Overrides::default().apply(&mut config);
        assert!(config.lively);
    }

    #[test]
    fn write_json_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let path = path.to_str().unwrap();
        write_json(path, &vec![1, 2, 3]).unwrap();
        let back: Vec<i32> = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }
}
