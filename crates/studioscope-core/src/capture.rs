//! Headless frame capture.
//!
//! Renders land in one directory per capture:
//! - `frame_00000.ppm` ...: binary PPM per frame
//! - `frames.csv`: frame number, timestamp, cycle and phase per frame
//! - `capture.json`: metadata, written by [`CaptureWriter::finish`]

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Tick;
use crate::config::StudioConfig;
use crate::phase::PhaseState;
use crate::surface::RenderSurface;

/// Metadata written to `capture.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureMeta {
    pub version: u32,
    pub id: String,
    pub widget: String,
    pub started_at_ms: u64,
    pub duration_ms: u64,
    pub frames: u64,
    /// Stopped before the requested frame count.
    pub interrupted: bool,
    pub width_px: usize,
    pub height_px: usize,
    pub config: StudioConfig,
    pub studioscope_version: String,
}

/// Incremental writer for one capture directory.
pub struct CaptureWriter {
    dir: PathBuf,
    csv: BufWriter<File>,
    id: String,
    widget: String,
    config: StudioConfig,
    frames: u64,
    dims: (usize, usize),
    started_at: SystemTime,
    started_instant: Instant,
}

impl CaptureWriter {
    /// Create `<output_dir>/<widget>-<short id>/` and open `frames.csv`.
    pub fn new(output_dir: &Path, widget: &str, config: &StudioConfig) -> std::io::Result<Self> {
        let id = Uuid::new_v4().to_string();
        let short: String = id.chars().take(8).collect();
        let dir = output_dir.join(format!("{widget}-{short}"));
        fs::create_dir_all(&dir)?;

        let mut csv = BufWriter::new(File::create(dir.join("frames.csv"))?);
        writeln!(csv, "frame,timestamp_ms,cycle,elapsed_ms,phase,progress,file")?;
        csv.flush()?;

        log::debug!("capturing {widget} into {}", dir.display());
        Ok(Self {
            dir,
            csv,
            id,
            widget: widget.to_string(),
            config: config.clone(),
            frames: 0,
            dims: (0, 0),
            started_at: SystemTime::now(),
            started_instant: Instant::now(),
        })
    }

    /// Write one rendered frame and its CSV row.
    pub fn write_frame(
        &mut self,
        surface: &RenderSurface,
        tick: &Tick,
        state: PhaseState,
    ) -> std::io::Result<()> {
        let file = format!("frame_{:05}.ppm", self.frames);
        fs::write(self.dir.join(&file), surface.to_ppm())?;
        writeln!(
            self.csv,
            "{},{:.3},{},{:.3},{},{:.4},{}",
            self.frames,
            tick.timestamp_ms,
            tick.cycle,
            tick.elapsed_ms,
            state.phase,
            state.progress,
            file
        )?;
        self.dims = (surface.width_px(), surface.height_px());
        self.frames += 1;
        Ok(())
    }

    /// Flush and write `capture.json`. Call on every exit path, including
    /// interruption.
    pub fn finish(mut self, interrupted: bool) -> std::io::Result<PathBuf> {
        self.csv.flush()?;

        let meta = CaptureMeta {
            version: 1,
            id: self.id,
            widget: self.widget,
            started_at_ms: self
                .started_at
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
            duration_ms: self.started_instant.elapsed().as_millis() as u64,
            frames: self.frames,
            interrupted,
            width_px: self.dims.0,
            height_px: self.dims.1,
            config: self.config,
            studioscope_version: crate::VERSION.to_string(),
        };

        let json = serde_json::to_string_pretty(&meta)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        fs::write(self.dir.join("capture.json"), json)?;
        Ok(self.dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::AnimationClock;
    use crate::draw::{Canvas, Size, palette};
    use crate::phase::Phase;

    #[test]
    fn writes_frames_csv_and_meta() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StudioConfig::default();
        let mut writer = CaptureWriter::new(tmp.path(), "scanner", &config).unwrap();
        let mut surface = RenderSurface::new(Size::new(20.0, 16.0), 1.0);
        surface.clear(palette::BACKGROUND);
        let clock = AnimationClock::new(0.0, 1000.0);
        for i in 0..3 {
            let tick = clock.tick(i as f64 * 16.0, i);
            writer
                .write_frame(&surface, &tick, PhaseState::new(Phase::Scanning, 0.5))
                .unwrap();
        }
        assert_eq!(writer.frames(), 3);
        let dir = writer.finish(false).unwrap();

        assert!(dir.join("frame_00000.ppm").exists());
        assert!(dir.join("frame_00002.ppm").exists());
        let csv = fs::read_to_string(dir.join("frames.csv")).unwrap();
        assert_eq!(csv.lines().count(), 4);
        assert!(csv.lines().nth(1).unwrap().contains(",scanning,"));

        let meta: CaptureMeta =
            serde_json::from_str(&fs::read_to_string(dir.join("capture.json")).unwrap()).unwrap();
        assert_eq!(meta.frames, 3);
        assert_eq!(meta.widget, "scanner");
        assert_eq!((meta.width_px, meta.height_px), (20, 16));
        assert!(!meta.interrupted);
    }

    #[test]
    fn interrupted_capture_still_has_meta() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = CaptureWriter::new(tmp.path(), "chess", &StudioConfig::default()).unwrap();
        let dir = writer.finish(true).unwrap();
        let meta: CaptureMeta =
            serde_json::from_str(&fs::read_to_string(dir.join("capture.json")).unwrap()).unwrap();
        assert!(meta.interrupted);
        assert_eq!(meta.frames, 0);
    }
}
