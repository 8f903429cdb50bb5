//! Render one widget off-screen and save its last frame as a PPM.
//!
//! Run: `cargo run --example headless -- decision-field out.ppm`

use std::cell::RefCell;
use std::rc::Rc;

use studioscope_core::{Component, Generator, Liveliness, ManualDriver, RenderSurface, Size, build};

fn main() -> std::io::Result<()> {
    let mut args = std::env::args().skip(1);
    let name = args.next().unwrap_or_else(|| "scanner".to_string());
    let out = args.next().unwrap_or_else(|| format!("{name}.ppm"));

    let Some(widget) = build(&name) else {
        eprintln!("unknown widget '{name}'");
        std::process::exit(1);
    };

    let mut driver = ManualDriver::new();
    let surface = Rc::new(RefCell::new(RenderSurface::new(Size::new(480.0, 270.0), 2.0)));
    let mut component = Component::new(widget, Generator::new(7), Liveliness::OFF);
    component.mount(&mut driver, &surface);

    // Four seconds at 60 fps.
    for frame in 0..240 {
        driver.tick(frame as f64 * 1000.0 / 60.0);
    }
    let state = component.last_state();
    component.unmount(&mut driver);

    std::fs::write(&out, surface.borrow().to_ppm())?;
    println!(
        "{name}: {} frames, ended in {} at {:.0}% -> {out}",
        component.frames(),
        state.phase,
        state.progress * 100.0
    );
    Ok(())
}
