//! Walk every widget through one cycle and print its phases.
//!
//! Run: `cargo run --example basic`

use studioscope_core::{AnimationClock, all_widgets};

fn main() {
    for mut widget in all_widgets() {
        let cycle = widget.cycle_ms();
        let clock = AnimationClock::new(0.0, cycle);
        println!("{} ({:.0}ms, {})", widget.name(), cycle, widget.info().page);

        let mut last = None;
        for frame in 0..=(cycle / 50.0) as u64 {
            let ts = frame as f64 * 50.0;
            let state = widget.advance(&clock.tick(ts, frame));
            if last != Some(state.phase) {
                println!("  {ts:>7.0}ms  {}", state.phase);
                last = Some(state.phase);
            }
        }
    }
}
