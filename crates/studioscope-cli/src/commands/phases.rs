use serde::Serialize;
use studioscope_core::{AnimationClock, Visualization};

/// One sampled clock time.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseRow {
    pub at_ms: f64,
    pub cycle: u64,
    pub elapsed_ms: f64,
    pub phase: String,
    pub progress: f64,
}

/// Advance `widget` through `times` in order, as if one frame landed on each.
pub fn sample(widget: &mut dyn Visualization, times: &[f64]) -> Vec<PhaseRow> {
    let clock = AnimationClock::new(0.0, widget.cycle_ms());
    times
        .iter()
        .enumerate()
        .map(|(i, &at)| {
            let tick = clock.tick(at, i as u64);
            let state = widget.advance(&tick);
            PhaseRow {
                at_ms: at,
                cycle: tick.cycle,
                elapsed_ms: tick.elapsed_ms,
                phase: state.phase.to_string(),
                progress: state.progress,
            }
        })
        .collect()
}

pub fn run(widget_name: &str, at: &str, json: bool) {
    let times = match super::parse_times(at) {
        Ok(t) if !t.is_empty() => t,
        Ok(_) => {
            eprintln!("Error: --at needs at least one time");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let mut widget = super::require_widget(widget_name);
    let rows = sample(widget.as_mut(), &times);

    if json {
        match serde_json::to_string_pretty(&rows) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    println!("{} (cycle {:.0}ms)\n", widget.name(), widget.cycle_ms());
    println!(
        "{:>10} {:>6} {:>10}  {:<12} {:>8}",
        "At", "Cycle", "Elapsed", "Phase", "Progress"
    );
    println!("{}", "-".repeat(52));
    for r in &rows {
        println!(
            "{:>8.0}ms {:>6} {:>8.0}ms  {:<12} {:>8.4}",
            r.at_ms, r.cycle, r.elapsed_ms, r.phase, r.progress
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studioscope_core::build;

    #[test]
    fn scanner_boundaries() {
        let mut w = build("scanner").unwrap();
        let rows = sample(w.as_mut(), &[0.0, 5499.0, 5501.0, 9001.0]);
        let phases: Vec<&str> = rows.iter().map(|r| r.phase.as_str()).collect();
        assert_eq!(phases, ["scanning", "scanning", "revealed", "scanning"]);
        assert_eq!(rows[3].cycle, 1);
        assert!((rows[3].elapsed_ms - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rows_serialize() {
        let mut w = build("orbit").unwrap();
        let rows = sample(w.as_mut(), &[10.0]);
        let json = serde_json::to_string(&rows).unwrap();
        assert!(json.contains("\"phase\":\"active\""));
    }
}
