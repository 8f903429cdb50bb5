//! Decision-field streamlines.
//!
//! Seeds scattered by the generator are integrated through a smooth analytic
//! vector field. Streamlines draw in (Drawing), hold with the decision
//! boundary pulsing (Holding) and fade out (Fading). The field rotates a
//! little every cycle so consecutive loops look different.

use crate::clock::Tick;
use crate::draw::{
    Canvas, Point, Size, Stroke, TextStyle, ease_in_out, lerp, palette, partial_polyline, pulse,
};
use crate::phase::{Phase, PhaseSpan, PhaseState, PhaseTimeline};
use crate::visualization::{FrameContext, Page, Visualization, WidgetInfo};

pub const STREAMLINES: u32 = 24;
pub const STEPS: usize = 40;

/// Keeps streamline seeds independent of other generator consumers.
const SEED_SALT: u32 = 0x5eed;

const STEP_LEN: f64 = 0.025;

/// Flow direction (radians) at normalised `(u, v)` in `[0, 1]²`.
pub fn field_angle(u: f64, v: f64, offset: f64) -> f64 {
    let swirl = ((u * 3.1 + offset) * std::f64::consts::PI).sin() * 0.9;
    let lift = ((v * 2.3 - offset * 0.5) * std::f64::consts::PI).cos() * 0.6;
    swirl + lift - (v - boundary_y(u, offset)) * 1.4
}

/// Normalised y of the decision boundary at `u`.
pub fn boundary_y(u: f64, offset: f64) -> f64 {
    0.5 + 0.18 * ((u * 2.0 + offset) * std::f64::consts::PI).sin()
}

/// Integrate one streamline in normalised space. Stops at the unit square edge.
pub fn integrate(seed: Point, offset: f64) -> Vec<Point> {
    let mut out = Vec::with_capacity(STEPS + 1);
    let mut p = seed;
    out.push(p);
    for _ in 0..STEPS {
        let a = field_angle(p.x, p.y, offset);
        p = Point::new(p.x + a.cos() * STEP_LEN, p.y + a.sin() * STEP_LEN);
        if !(0.0..=1.0).contains(&p.x) || !(0.0..=1.0).contains(&p.y) {
            break;
        }
        out.push(p);
    }
    out
}

pub struct DecisionField {
    info: WidgetInfo,
    timeline: PhaseTimeline,
    size: Size,
}

impl DecisionField {
    pub fn new() -> Self {
        Self {
            info: WidgetInfo {
                name: "decision-field",
                description: "Streamlines through a decision field with a pulsing boundary",
                page: Page::Betting,
                triggered: false,
            },
            timeline: PhaseTimeline::new(vec![
                PhaseSpan::new(Phase::Drawing, 4000.0),
                PhaseSpan::new(Phase::Holding, 2500.0),
                PhaseSpan::new(Phase::Fading, 1500.0),
            ]),
            size: Size::default(),
        }
    }

    fn to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.size.width, p.y * self.size.height)
    }
}

impl Default for DecisionField {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for DecisionField {
    fn info(&self) -> &WidgetInfo {
        &self.info
    }

    fn cycle_ms(&self) -> f64 {
        self.timeline.cycle_ms()
    }

    fn layout(&mut self, size: Size) {
        self.size = size;
    }

    fn advance(&mut self, tick: &Tick) -> PhaseState {
        self.timeline.at(tick.elapsed_ms)
    }

    fn draw(&self, canvas: &mut dyn Canvas, frame: &FrameContext) {
        super::backdrop(canvas, frame.size);
        let state = frame.state;
        let offset = (frame.tick.cycle % 8) as f64 * 0.25;

        let (reach, opacity) = match state.phase {
            Phase::Drawing => (ease_in_out(state.progress), 1.0),
            Phase::Holding => (1.0, 1.0),
            _ => (1.0, 1.0 - state.progress),
        };

        let boundary: Vec<Point> = (0..=48)
            .map(|i| {
                let u = i as f64 / 48.0;
                self.to_screen(Point::new(u, boundary_y(u, offset)))
            })
            .collect();
        let glow = if state.is(Phase::Holding) {
            pulse((state.progress * 2.0).fract())
        } else {
            0.2
        };
        canvas.polyline(
            &boundary,
            &Stroke::new(palette::AMBER, 2.0).opacity(opacity).glow(glow),
        );

        // Seeds reshuffle once per cycle, while the field is faded out.
        let seeds = frame.generator.fork(SEED_SALT);
        for k in 0..STREAMLINES {
            let seed = Point::new(
                seeds.range(k, frame.tick.cycle, 0.02, 0.6),
                0.5 + 0.45 * seeds.signed(k, frame.tick.cycle.wrapping_add(1)),
            );
            let path: Vec<Point> = integrate(seed, offset)
                .into_iter()
                .map(|p| self.to_screen(p))
                .collect();
            // Lines above the boundary read as "back", below as "lay".
            let color = if seed.y < boundary_y(seed.x, offset) {
                palette::CYAN
            } else {
                palette::VIOLET
            };
            let stagger = k as f64 / STREAMLINES as f64 * 0.3;
            let t = ((reach - stagger) / (1.0 - stagger)).clamp(0.0, 1.0);
            let shown = partial_polyline(&path, t);
            canvas.polyline(&shown, &Stroke::new(color, 1.2).opacity(opacity * 0.85));
            match shown.last() {
                Some(head) if t > 0.0 && t < 1.0 => {
                    canvas.circle(*head, 2.0, Some(color.with_opacity(opacity)), None);
                }
                _ => {}
            }
        }

        canvas.text(
            Point::new(8.0, 8.0),
            "P(BACK) DECISION FIELD",
            &TextStyle::new(palette::MUTED.with_opacity(lerp(0.4, 1.0, opacity)), 6.0),
        );
    }
}
