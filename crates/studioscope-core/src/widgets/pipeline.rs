//! Animated ML pipeline.
//!
//! The only trigger-driven widget: a per-instance [`Ticker`] fires every
//! [`TRIGGER_MS`] and advances a cyclic Idle → Processing → Active machine.
//! During Processing packets travel along the stage edges; Active lights the
//! signal stage until the next trigger.

use crate::clock::Tick;
use crate::draw::{
    Align, Canvas, Point, Rect, Size, Stroke, TextStyle, ease_in_out, palette, pulse,
};
use crate::phase::{Phase, PhaseSpan, PhaseState, Ticker, TriggeredPhases};
use crate::visualization::{FrameContext, Page, Visualization, WidgetInfo};

pub const STAGES: [&str; 5] = ["INGEST", "FEATURES", "CATBOOST", "CALIBRATE", "SIGNAL"];
pub const TRIGGER_MS: f64 = 1800.0;
const PACKETS: u32 = 6;

fn spans() -> Vec<PhaseSpan> {
    vec![
        PhaseSpan::new(Phase::Idle, 400.0),
        PhaseSpan::new(Phase::Processing, 1200.0),
        PhaseSpan::new(Phase::Active, 900.0),
    ]
}

pub struct Pipeline {
    info: WidgetInfo,
    machine: TriggeredPhases,
    ticker: Ticker,
    last_ms: f64,
    boxes: Vec<Rect>,
}

impl Pipeline {
    pub fn new() -> Self {
        let mut pipeline = Self {
            info: WidgetInfo {
                name: "pipeline",
                description: "Batches flowing through ingest, features, model, calibration and signal",
                page: Page::Home,
                triggered: true,
            },
            machine: TriggeredPhases::new(spans(), 0.0),
            ticker: Ticker::new(TRIGGER_MS),
            last_ms: 0.0,
            boxes: Vec::new(),
        };
        pipeline.layout(Size::default());
        pipeline
    }

    /// Batches processed since the clock started.
    pub fn transitions(&self) -> u64 {
        self.machine.transitions()
    }

    fn anchor(&self, i: usize, right: bool) -> Point {
        let r = self.boxes[i];
        let x = if right { r.x + r.width } else { r.x };
        Point::new(x, r.y + r.height / 2.0)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for Pipeline {
    fn info(&self) -> &WidgetInfo {
        &self.info
    }

    /// One full Idle → Processing → Active round.
    fn cycle_ms(&self) -> f64 {
        TRIGGER_MS * 3.0
    }

    fn layout(&mut self, size: Size) {
        let n = STAGES.len() as f64;
        let gap = size.width * 0.04;
        let w = (size.width - gap * (n + 1.0)) / n;
        let h = (size.height * 0.22).max(8.0);
        let y = (size.height - h) / 2.0;
        self.boxes = (0..STAGES.len())
            .map(|i| Rect::new(gap + i as f64 * (w + gap), y, w.max(1.0), h))
            .collect();
    }

    fn advance(&mut self, tick: &Tick) -> PhaseState {
        let now = tick.total_ms;
        if now < self.last_ms {
            // Clock restarted (rewind or remount).
            self.machine.reset(now);
            self.ticker.disarm();
        }
        self.last_ms = now;
        if self.ticker.poll(now) {
            let phase = self.machine.trigger(now);
            log::trace!("pipeline -> {phase}");
        }
        self.machine.state(now)
    }

    fn draw(&self, canvas: &mut dyn Canvas, frame: &FrameContext) {
        super::backdrop(canvas, frame.size);
        let state = frame.state;
        let last = STAGES.len() - 1;

        for i in 0..last {
            canvas.line(
                self.anchor(i, true),
                self.anchor(i + 1, false),
                &Stroke::new(palette::MUTED, 1.0).opacity(0.6),
            );
        }

        // Fraction of the pipeline covered by the current batch.
        let front = match state.phase {
            Phase::Idle => 0.0,
            Phase::Processing => ease_in_out(state.progress),
            _ => 1.0,
        };
        let lit = (front * last as f64).floor() as usize;

        let label = TextStyle::new(palette::TEXT, 5.0).align(Align::Center);
        for (i, (rect, name)) in self.boxes.iter().zip(STAGES).enumerate() {
            let on = state.phase != Phase::Idle && i <= lit;
            let signal = i == last && state.is(Phase::Active);
            let color = if signal { palette::GREEN } else { palette::CYAN };
            canvas.fill_rect(*rect, color.with_opacity(if on { 0.25 } else { 0.06 }));
            let border = Stroke::new(color, 1.0)
                .opacity(if on { 1.0 } else { 0.35 })
                .glow(if signal { pulse(state.progress) } else { 0.0 });
            let r = *rect;
            canvas.polyline(
                &[
                    Point::new(r.x, r.y),
                    Point::new(r.x + r.width, r.y),
                    Point::new(r.x + r.width, r.y + r.height),
                    Point::new(r.x, r.y + r.height),
                    Point::new(r.x, r.y),
                ],
                &border,
            );
            canvas.text(Point::new(r.center().x, r.center().y - 2.0), name, &label);
        }

        if state.is(Phase::Processing) {
            for k in 0..PACKETS {
                let lag = frame.generator.range(k, self.machine.transitions(), 0.0, 0.35);
                let t = ((front - lag) / (1.0 - lag)).clamp(0.0, 1.0);
                if t <= 0.0 || t >= 1.0 {
                    continue;
                }
                let along = t * last as f64;
                let edge = (along.floor() as usize).min(last - 1);
                let p = self
                    .anchor(edge, true)
                    .lerp(self.anchor(edge + 1, false), along - edge as f64);
                canvas.circle(p, 2.5, Some(palette::AMBER), Some(&Stroke::new(palette::AMBER, 1.0).glow(0.7)));
            }
        }

        canvas.text(
            Point::new(8.0, 8.0),
            &format!("BATCH {:04}", self.machine.transitions() / 3),
            &TextStyle::new(palette::MUTED, 6.0),
        );
    }
}
