//! Orbiting technology labels.
//!
//! Labels ride concentric rings around a glowing core. Alternate rings turn
//! in opposite directions; one full revolution of the outer ring takes
//! [`REVOLUTION_MS`]. There is a single continuous Active phase.

use std::f64::consts::TAU;

use crate::clock::Tick;
use crate::draw::{Align, Canvas, Point, Size, Stroke, TextStyle, palette};
use crate::phase::{Phase, PhaseSpan, PhaseState, PhaseTimeline};
use crate::visualization::{FrameContext, Page, Visualization, WidgetInfo};

pub const REVOLUTION_MS: f64 = 20_000.0;

pub const RINGS: [&[&str]; 3] = [
    &["RUST", "PYTHON"],
    &["CUDA", "POLARS", "KAFKA"],
    &["CATBOOST", "TORCH", "CLICKHOUSE", "REDIS"],
];

/// Angle of label `slot` (of `count`) on `ring` at cycle progress `t`.
pub fn orbit_angle(ring: usize, slot: usize, count: usize, t: f64) -> f64 {
    let dir = if ring % 2 == 0 { 1.0 } else { -1.0 };
    // Inner rings turn faster.
    let speed = (RINGS.len() - ring) as f64;
    let base = TAU * slot as f64 / count.max(1) as f64;
    (base + dir * speed * TAU * t).rem_euclid(TAU)
}

pub struct TechOrbit {
    info: WidgetInfo,
    timeline: PhaseTimeline,
    center: Point,
    radius: f64,
}

impl TechOrbit {
    pub fn new() -> Self {
        let size = Size::default();
        Self {
            info: WidgetInfo {
                name: "orbit",
                description: "Technology stack orbiting the studio core",
                page: Page::Home,
                triggered: false,
            },
            timeline: PhaseTimeline::new(vec![PhaseSpan::new(Phase::Active, REVOLUTION_MS)]),
            center: size.center(),
            radius: size.min_edge() * 0.45,
        }
    }

    fn ring_radius(&self, ring: usize) -> f64 {
        self.radius * (ring + 1) as f64 / RINGS.len() as f64
    }
}

impl Default for TechOrbit {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for TechOrbit {
    fn info(&self) -> &WidgetInfo {
        &self.info
    }

    fn cycle_ms(&self) -> f64 {
        self.timeline.cycle_ms()
    }

    fn layout(&mut self, size: Size) {
        self.center = size.center();
        self.radius = size.min_edge() * 0.45;
    }

    fn advance(&mut self, tick: &Tick) -> PhaseState {
        self.timeline.at(tick.elapsed_ms)
    }

    fn draw(&self, canvas: &mut dyn Canvas, frame: &FrameContext) {
        super::backdrop(canvas, frame.size);
        let t = frame.state.progress;

        let breathe = 0.5 + 0.5 * (t * TAU * 4.0).sin();
        canvas.circle(
            self.center,
            self.radius * 0.12,
            Some(palette::VIOLET.with_opacity(0.6)),
            Some(&Stroke::new(palette::VIOLET, 1.5).glow(breathe)),
        );

        let label = TextStyle::new(palette::TEXT, 5.0).align(Align::Center);
        for (ring, names) in RINGS.iter().enumerate() {
            let r = self.ring_radius(ring);
            canvas.circle(self.center, r, None, Some(&Stroke::new(palette::GRID, 1.0)));
            for (slot, name) in names.iter().enumerate() {
                let a = orbit_angle(ring, slot, names.len(), t);
                let p = Point::new(self.center.x + r * a.cos(), self.center.y + r * a.sin());
                let wobble = frame.liveliness.jitter();
                canvas.circle(
                    Point::new(p.x, p.y + wobble),
                    3.0,
                    Some(palette::CYAN),
                    Some(&Stroke::new(palette::CYAN, 1.0).glow(0.6)),
                );
                canvas.text(Point::new(p.x, p.y + 6.0 + wobble), name, &label);
            }
        }
    }
}
