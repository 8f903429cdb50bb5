//! Integration tests for studioscope-core.
//!
//! These exercise the full frame path through public APIs:
//! driver tick → component → clock → phase → generator → canvas.

use std::cell::RefCell;
use std::rc::Rc;

use statrs::distribution::{ChiSquared, ContinuousCDF};
use studioscope_core::{
    Canvas, Component, DrawOp, Generator, Liveliness, ManualDriver, Phase, Recorder,
    RenderSurface, Size, all_widgets, build, widget_names,
};

fn mounted(name: &str, size: Size) -> (ManualDriver, Rc<RefCell<Recorder>>, Component<Recorder>) {
    let mut driver = ManualDriver::new();
    let surface = Rc::new(RefCell::new(Recorder::new(size)));
    let widget = build(name).unwrap_or_else(|| panic!("unknown widget {name}"));
    let mut component = Component::new(widget, Generator::new(7), Liveliness::OFF);
    component.mount(&mut driver, &surface);
    (driver, surface, component)
}

#[test]
fn scanner_phase_scenario() {
    let (mut driver, _surface, component) = mounted("scanner", Size::new(320.0, 180.0));

    driver.tick(0.0);
    let s = component.last_state();
    assert_eq!((s.phase, s.progress), (Phase::Scanning, 0.0));

    driver.tick(5499.0);
    let s = component.last_state();
    assert_eq!(s.phase, Phase::Scanning);
    assert!((s.progress - 5499.0 / 5500.0).abs() < 1e-9);

    driver.tick(5501.0);
    let s = component.last_state();
    assert_eq!(s.phase, Phase::Revealed);
    assert!((s.progress - 1.0 / 3500.0).abs() < 1e-9);

    driver.tick(8999.0);
    let s = component.last_state();
    assert_eq!(s.phase, Phase::Revealed);
    assert!((s.progress - 3499.0 / 3500.0).abs() < 1e-9);

    // Wraps to elapsed = 1.
    driver.tick(9001.0);
    let s = component.last_state();
    assert_eq!(s.phase, Phase::Scanning);
    assert!((s.progress - 1.0 / 5500.0).abs() < 1e-9);
}

#[test]
fn clock_starts_at_first_frame_not_at_mount() {
    let (mut driver, _surface, component) = mounted("scanner", Size::new(320.0, 180.0));
    driver.tick(100_000.0);
    driver.tick(100_000.0 + 2750.0);
    let s = component.last_state();
    assert_eq!(s.phase, Phase::Scanning);
    assert!((s.progress - 0.5).abs() < 1e-9);
}

#[test]
fn phase_is_pure_in_elapsed_time() {
    for name in widget_names() {
        if name == "pipeline" {
            continue;
        }
        let (mut a_driver, _a, a) = mounted(name, Size::new(200.0, 120.0));
        let (mut b_driver, _b, b) = mounted(name, Size::new(200.0, 120.0));
        a_driver.tick(0.0);
        b_driver.tick(0.0);
        for ts in [13.0, 777.0, 4321.0, 12_345.0, 40_000.0] {
            a_driver.tick(ts);
            b_driver.tick(ts);
            assert_eq!(a.last_state(), b.last_state(), "{name} at {ts}");
        }
    }
}

#[test]
fn no_draw_calls_after_unmount() {
    let (mut driver, surface, mut component) = mounted("decision-field", Size::new(240.0, 160.0));
    for i in 0..10 {
        driver.tick(i as f64 * 16.7);
    }
    component.unmount(&mut driver);
    let calls = surface.borrow().total_calls();
    assert!(calls > 0);
    for i in 10..40 {
        driver.tick(i as f64 * 16.7);
    }
    assert_eq!(surface.borrow().total_calls(), calls);
    assert_eq!(driver.live_loops(), 0);
}

#[test]
fn resize_keeps_one_loop_and_linear_draws() {
    let (mut driver, surface, mut component) = mounted("orbit", Size::new(300.0, 200.0));
    for i in 0..5 {
        driver.tick(i as f64 * 16.0);
        component.resize(&mut driver, Size::new(300.0 + i as f64 * 10.0, 200.0));
        assert_eq!(driver.live_loops(), 1);
    }
    let frames_before = surface.borrow().frames();
    for i in 5..25 {
        driver.tick(i as f64 * 16.0);
    }
    // Exactly one clear per tick: no duplicated loops.
    assert_eq!(surface.borrow().frames() - frames_before, 20);
    assert_eq!(component.frames(), 25);
}

#[test]
fn resize_preserves_animation_time() {
    let (mut driver, _surface, mut component) = mounted("scanner", Size::new(300.0, 200.0));
    driver.tick(0.0);
    driver.tick(3000.0);
    component.resize(&mut driver, Size::new(500.0, 300.0));
    driver.tick(3016.0);
    let s = component.last_state();
    assert_eq!(s.phase, Phase::Scanning);
    assert!((s.progress - 3016.0 / 5500.0).abs() < 1e-9);
}

#[test]
fn degenerate_resize_is_clamped() {
    let (mut driver, surface, mut component) = mounted("chess", Size::new(300.0, 200.0));
    component.resize(&mut driver, Size::new(0.0, -10.0));
    driver.tick(0.0);
    assert_eq!(surface.borrow().size(), Size::new(16.0, 16.0));
    assert_eq!(component.frames(), 1);
}

#[test]
fn every_widget_repaints_from_scratch() {
    for name in widget_names() {
        let (mut driver, surface, component) = mounted(name, Size::new(320.0, 180.0));
        for i in 0..60 {
            driver.tick(i as f64 * 333.0);
            let s = surface.borrow();
            assert!(
                matches!(s.ops().first(), Some(DrawOp::Clear(_))),
                "{name} frame {i} did not start with clear"
            );
            assert!(s.ops().len() > 1, "{name} drew nothing");
        }
        assert_eq!(component.frames(), 60);
    }
}

#[test]
fn every_widget_rasterises_at_any_size() {
    for size in [Size::new(64.0, 48.0), Size::new(0.0, 0.0), Size::new(500.0, 20.0)] {
        for widget in all_widgets() {
            let name = widget.name();
            let mut driver = ManualDriver::new();
            let surface = Rc::new(RefCell::new(RenderSurface::new(size, 1.0)));
            let mut component = Component::new(widget, Generator::new(3), Liveliness::new(0.5));
            component.mount(&mut driver, &surface);
            for i in 0..8 {
                driver.tick(i as f64 * 1500.0);
            }
            assert_eq!(component.frames(), 8, "{name}");
            let s = surface.borrow();
            assert_eq!(s.rgba().len(), s.width_px() * s.height_px() * 4);
            assert!(s.size().width >= 16.0 && s.size().height >= 16.0);
        }
    }
}

#[test]
fn pipeline_advances_on_its_ticker() {
    let (mut driver, _surface, component) = mounted("pipeline", Size::new(320.0, 180.0));
    let mut seen = Vec::new();
    for i in 0..=60 {
        driver.tick(i as f64 * 100.0);
        let phase = component.last_state().phase;
        if seen.last() != Some(&phase) {
            seen.push(phase);
        }
    }
    assert_eq!(
        seen,
        vec![Phase::Idle, Phase::Processing, Phase::Active, Phase::Idle]
    );
}

#[test]
fn generator_output_is_uniform() {
    const BINS: usize = 20;
    const N: u32 = 20_000;
    let g = Generator::new(1234);
    let mut counts = [0u32; BINS];
    for i in 0..N {
        let v = g.sample(i, 5);
        assert!((0.0..1.0).contains(&v));
        counts[(v * BINS as f64) as usize] += 1;
    }
    let expected = N as f64 / BINS as f64;
    let chi2: f64 = counts
        .iter()
        .map(|&c| (c as f64 - expected).powi(2) / expected)
        .sum();
    let dist = ChiSquared::new((BINS - 1) as f64).unwrap();
    let p = 1.0 - dist.cdf(chi2);
    assert!(p > 1e-4, "chi2 = {chi2:.2}, p = {p:.6}");
}

#[test]
fn generator_is_reproducible_across_instances() {
    let a = Generator::new(77);
    let b = Generator::new(77);
    for i in 0..1000 {
        assert_eq!(a.sample(i, i as u64), b.sample(i, i as u64));
    }
}

#[test]
fn released_surface_is_skipped_silently() {
    let (mut driver, surface, component) = mounted("calibration", Size::new(200.0, 200.0));
    driver.tick(0.0);
    drop(surface);
    driver.tick(16.0);
    driver.tick(32.0);
    assert_eq!(component.frames(), 1);
    assert_eq!(component.skipped(), 2);
}

#[test]
fn recorder_and_surface_agree_on_size() {
    let size = Size::new(123.0, 45.0);
    let rec = Recorder::new(size);
    let surf = RenderSurface::new(size, 2.0);
    assert_eq!(rec.size(), surf.size());
    assert_eq!((surf.width_px(), surf.height_px()), (246, 90));
}
