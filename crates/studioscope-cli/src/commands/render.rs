//! `studioscope render`: drive a widget headlessly and capture its frames.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use studioscope_core::{CaptureWriter, Component, ManualDriver, RenderSurface, StudioConfig};

/// Run the render command.
pub fn run(widget_name: &str, config: StudioConfig, scale: f64, output: Option<&str>) {
    let widget = super::require_widget(widget_name);
    let name = widget.name();
    let output_dir = output.map_or_else(|| PathBuf::from("captures"), PathBuf::from);

    let mut writer = match CaptureWriter::new(&output_dir, name, &config) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error creating capture: {e}");
            std::process::exit(1);
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    }) {
        log::warn!("Ctrl+C handler unavailable: {e}");
    }

    let interval = config.frame_interval_ms();
    let mut driver = ManualDriver::new();
    let surface = Rc::new(RefCell::new(RenderSurface::new(config.size(), scale)));
    let mut component = Component::new(widget, config.generator(), config.liveliness());
    component.mount(&mut driver, &surface);

    println!("Rendering {name}");
    println!("  Frames:  {} at {} fps", config.frames, config.fps);
    println!(
        "  Surface: {}x{} px (scale {scale})",
        surface.borrow().width_px(),
        surface.borrow().height_px()
    );
    println!("  Seed:    {}{}", config.seed, if config.lively { " (lively)" } else { "" });
    println!("  Output:  {}", writer.dir().display());
    println!();

    let mut had_write_error = false;
    for i in 0..config.frames {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        let ts = i as f64 * interval;
        driver.tick(ts);
        let Some(clock) = component.clock() else {
            continue;
        };
        let tick = clock.tick(ts, i);
        if let Err(e) = writer.write_frame(&surface.borrow(), &tick, component.last_state()) {
            eprintln!("\nError writing frame: {e}");
            had_write_error = true;
            break;
        }
        print!(
            "\r  Frame {:<6} {:<12} {:>5.1}%",
            i + 1,
            component.last_state().phase,
            component.last_state().progress * 100.0
        );
        let _ = std::io::Write::flush(&mut std::io::stdout());
    }
    component.unmount(&mut driver);
    println!();
    println!();

    if had_write_error {
        eprintln!("Render stopped due to write error.");
    }
    let written = writer.frames();
    let interrupted = written < config.frames;

    match writer.finish(interrupted) {
        Ok(dir) => {
            println!("Capture saved to {} ({written} frames)", dir.display());
            println!("  capture.json     — metadata");
            println!("  frames.csv       — per-frame clock and phase");
            println!("  frame_NNNNN.ppm  — rendered frames");
        }
        Err(e) => {
            eprintln!("Error finalizing capture: {e}");
            std::process::exit(1);
        }
    }
}
