//! `studioscope bench`: time full frames against the 60 fps budget.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use studioscope_core::{
    Component, FRAME_BUDGET_MS, FrameBudget, ManualDriver, RenderSurface, StudioConfig,
    Visualization, all_widgets,
};

/// Render `frames` frames of `widget` on a rasterising surface and time each.
pub fn measure(widget: Box<dyn Visualization>, config: &StudioConfig) -> FrameBudget {
    let name = widget.name();
    let interval = config.frame_interval_ms();
    let mut driver = ManualDriver::new();
    let surface = Rc::new(RefCell::new(RenderSurface::new(config.size(), 1.0)));
    let mut component = Component::new(widget, config.generator(), config.liveliness());
    component.mount(&mut driver, &surface);

    let mut durations = Vec::with_capacity(config.frames as usize);
    for i in 0..config.frames {
        let t0 = Instant::now();
        driver.tick(i as f64 * interval);
        durations.push(t0.elapsed().as_secs_f64() * 1000.0);
    }
    component.unmount(&mut driver);
    FrameBudget::from_durations(name, &durations)
}

pub fn run(widget_name: &str, config: StudioConfig, output: Option<&str>) {
    let widgets = if widget_name.eq_ignore_ascii_case("all") {
        all_widgets()
    } else {
        vec![super::require_widget(widget_name)]
    };

    println!(
        "Benchmarking {} widget(s), {} frames each at {}x{}...\n",
        widgets.len(),
        config.frames,
        config.width,
        config.height
    );

    let mut results: Vec<FrameBudget> = widgets
        .into_iter()
        .map(|w| measure(w, &config))
        .collect();
    results.sort_by(|a, b| b.p95_ms.total_cmp(&a.p95_ms));

    println!("{}", "=".repeat(64));
    println!(
        "{:<16} {:>9} {:>9} {:>9} {:>8}  {}",
        "Widget", "Mean", "P95", "Max", "Over", "Budget"
    );
    println!("{}", "-".repeat(64));
    for b in &results {
        println!(
            "{:<16} {:>7.3}ms {:>7.3}ms {:>7.3}ms {:>8}  {}",
            b.widget,
            b.mean_ms,
            b.p95_ms,
            b.max_ms,
            b.over_budget,
            if b.within_budget() { "ok" } else { "OVER" }
        );
    }
    println!("\nBudget is {FRAME_BUDGET_MS:.2}ms per frame (60 fps), judged on P95.");

    if let Some(path) = output {
        match super::write_json(path, &results) {
            Ok(()) => println!("Report written to {path}"),
            Err(e) => {
                eprintln!("Error writing report: {e}");
                std::process::exit(1);
            }
        }
    }
}
