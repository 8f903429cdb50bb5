//! Candlestick price scanner.
//!
//! A scan line sweeps a fixed OHLC series (Scanning), then the swing points
//! found by [`detect_reversals`] fade in as reversal markers (Revealed).
//! Volume bars under the chart come from the seeded generator and drift
//! continuously with total time, across cycle boundaries.

use crate::clock::Tick;
use crate::draw::{
    Align, Canvas, Point, Rect, Size, Stroke, TextStyle, ease_out_cubic, lerp, palette,
};
use crate::generator::Generator;
use crate::phase::{Phase, PhaseSpan, PhaseState, PhaseTimeline};
use crate::visualization::{FrameContext, Page, Visualization, WidgetInfo};

pub const SCAN_MS: f64 = 5500.0;
pub const REVEAL_MS: f64 = 3500.0;

/// Bars on each side a pivot must dominate.
pub const PIVOT_WINDOW: usize = 4;

/// Time for a volume bar to ease from one generator step to the next.
pub const VOLUME_STEP_MS: f64 = 1200.0;

/// Height of volume bar `index` as a fraction of the volume band.
pub fn volume_level(generator: &Generator, index: usize, total_ms: f64) -> f64 {
    0.15 + 0.85 * generator.smooth(index as u32, total_ms / VOLUME_STEP_MS)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub const fn new(open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            open,
            high,
            low,
            close,
        }
    }

    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }
}

/// Synthetic BTC-like series: sell-off, rally, pullback, recovery.
pub const SERIES: &[Candle] = &[
    Candle::new(104.6, 105.0, 103.6, 104.0),
    Candle::new(104.0, 104.3, 102.9, 103.2),
    Candle::new(103.2, 103.7, 102.0, 102.5),
    Candle::new(102.5, 102.9, 100.7, 101.1),
    Candle::new(101.1, 101.4, 100.1, 100.4),
    Candle::new(100.4, 100.9, 98.5, 99.0),
    Candle::new(99.0, 99.4, 97.7, 98.1),
    Candle::new(98.1, 98.4, 96.7, 97.0),
    Candle::new(97.0, 98.0, 95.2, 96.2),
    Candle::new(96.2, 97.8, 95.8, 97.4),
    Candle::new(97.4, 99.2, 97.1, 98.9),
    Candle::new(98.9, 100.7, 98.4, 100.2),
    Candle::new(100.2, 101.4, 99.8, 101.0),
    Candle::new(101.0, 102.9, 100.7, 102.6),
    Candle::new(102.6, 103.6, 102.1, 103.1),
    Candle::new(103.1, 104.9, 102.7, 104.5),
    Candle::new(104.5, 105.5, 104.2, 105.2),
    Candle::new(105.2, 107.3, 104.7, 106.8),
    Candle::new(106.8, 107.9, 106.4, 107.5),
    Candle::new(107.5, 109.2, 107.2, 108.9),
    Candle::new(108.9, 110.6, 107.9, 109.6),
    Candle::new(109.6, 110.0, 108.3, 108.7),
    Candle::new(108.7, 109.0, 106.9, 107.2),
    Candle::new(107.2, 107.7, 105.5, 106.0),
    Candle::new(106.0, 106.4, 104.4, 104.8),
    Candle::new(104.8, 105.1, 103.6, 103.9),
    Candle::new(103.9, 104.4, 101.9, 102.4),
    Candle::new(102.4, 102.8, 101.2, 101.6),
    Candle::new(101.6, 101.9, 100.5, 100.8),
    Candle::new(100.8, 101.3, 99.6, 100.1),
    Candle::new(100.1, 101.1, 98.3, 99.3),
    Candle::new(99.3, 100.9, 99.0, 100.6),
    Candle::new(100.6, 102.4, 100.1, 101.9),
    Candle::new(101.9, 103.1, 101.5, 102.7),
    Candle::new(102.7, 104.5, 102.4, 104.2),
    Candle::new(104.2, 105.5, 103.7, 105.0),
    Candle::new(105.0, 106.7, 104.6, 106.3),
    Candle::new(106.3, 107.4, 106.0, 107.1),
    Candle::new(107.1, 108.5, 106.6, 108.0),
    Candle::new(108.0, 109.6, 107.6, 109.2),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReversalKind {
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reversal {
    pub index: usize,
    pub kind: ReversalKind,
}

/// Swing highs/lows: a bar whose high (low) strictly exceeds (undercuts)
/// every bar within `window` on both sides. Edge bars never qualify.
pub fn detect_reversals(series: &[Candle], window: usize) -> Vec<Reversal> {
    let window = window.max(1);
    if series.len() < 2 * window + 1 {
        return Vec::new();
    }
    let mut out = Vec::new();
    for i in window..series.len() - window {
        let neighbours = (i - window..=i + window).filter(|&j| j != i);
        let (mut top, mut bottom) = (true, true);
        for j in neighbours {
            top &= series[i].high > series[j].high;
            bottom &= series[i].low < series[j].low;
        }
        if top {
            out.push(Reversal {
                index: i,
                kind: ReversalKind::Top,
            });
        }
        if bottom {
            out.push(Reversal {
                index: i,
                kind: ReversalKind::Bottom,
            });
        }
    }
    out
}

#[derive(Debug, Clone, Copy)]
struct Geometry {
    plot: Rect,
    volume: Rect,
    slot: f64,
    lo: f64,
    hi: f64,
}

impl Geometry {
    fn new(size: Size, n: usize, lo: f64, hi: f64) -> Self {
        let margin = (size.min_edge() * 0.06).max(4.0);
        let header = margin + 10.0;
        let vol_h = (size.height * 0.14).max(4.0);
        let plot = Rect::new(
            margin,
            header,
            (size.width - 2.0 * margin).max(1.0),
            (size.height - header - vol_h - 2.0 * margin).max(1.0),
        );
        let volume = Rect::new(plot.x, plot.y + plot.height + margin * 0.5, plot.width, vol_h);
        Self {
            plot,
            volume,
            slot: plot.width / n.max(1) as f64,
            lo,
            hi,
        }
    }

    fn x(&self, i: usize) -> f64 {
        self.plot.x + (i as f64 + 0.5) * self.slot
    }

    fn y(&self, price: f64) -> f64 {
        let t = (price - self.lo) / (self.hi - self.lo).max(1e-9);
        self.plot.y + self.plot.height * (1.0 - t)
    }
}

pub struct PriceScanner {
    info: WidgetInfo,
    timeline: PhaseTimeline,
    reversals: Vec<Reversal>,
    geometry: Geometry,
}

impl PriceScanner {
    pub fn new() -> Self {
        let lo = SERIES.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        let hi = SERIES.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
        let pad = (hi - lo) * 0.08;
        Self {
            info: WidgetInfo {
                name: "scanner",
                description: "Candlestick scanner sweeping a price series and revealing reversals",
                page: Page::Home,
                triggered: false,
            },
            timeline: PhaseTimeline::new(vec![
                PhaseSpan::new(Phase::Scanning, SCAN_MS),
                PhaseSpan::new(Phase::Revealed, REVEAL_MS),
            ]),
            reversals: detect_reversals(SERIES, PIVOT_WINDOW),
            geometry: Geometry::new(Size::default(), SERIES.len(), lo - pad, hi + pad),
        }
    }

    pub fn reversals(&self) -> &[Reversal] {
        &self.reversals
    }

    pub fn timeline(&self) -> &PhaseTimeline {
        &self.timeline
    }

    fn draw_candle(&self, canvas: &mut dyn Canvas, i: usize, candle: &Candle, opacity: f64, glow: f64, close_jitter: f64) {
        let g = &self.geometry;
        let x = g.x(i);
        let color = if candle.is_bullish() {
            palette::GREEN
        } else {
            palette::RED
        };
        let close = candle.close + close_jitter;
        canvas.line(
            Point::new(x, g.y(candle.high.max(close))),
            Point::new(x, g.y(candle.low.min(close))),
            &Stroke::new(color, 1.0).opacity(opacity).glow(glow),
        );
        let body_w = (g.slot * 0.6).max(1.0);
        let mut body = Rect::from_span(x - body_w / 2.0, body_w, g.y(candle.open), g.y(close));
        body.height = body.height.max(1.0);
        canvas.fill_rect(body, color.with_opacity(opacity));
    }
}

impl Default for PriceScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for PriceScanner {
    fn info(&self) -> &WidgetInfo {
        &self.info
    }

    fn cycle_ms(&self) -> f64 {
        self.timeline.cycle_ms()
    }

    fn layout(&mut self, size: Size) {
        self.geometry = Geometry::new(size, SERIES.len(), self.geometry.lo, self.geometry.hi);
    }

    fn advance(&mut self, tick: &Tick) -> PhaseState {
        self.timeline.at(tick.elapsed_ms)
    }

    fn draw(&self, canvas: &mut dyn Canvas, frame: &FrameContext) {
        let size = frame.size;
        let g = &self.geometry;
        let state = frame.state;
        super::backdrop(canvas, size);

        for k in 0..=4 {
            let y = g.plot.y + g.plot.height * k as f64 / 4.0;
            canvas.line(
                Point::new(g.plot.x, y),
                Point::new(g.plot.x + g.plot.width, y),
                &Stroke::new(palette::GRID, 1.0),
            );
        }

        let scanning = state.is(Phase::Scanning);
        let scan_x = g.plot.x + g.plot.width * state.progress;
        let last = SERIES.len() - 1;

        for (i, candle) in SERIES.iter().enumerate() {
            let x = g.x(i);
            let (opacity, glow) = if scanning {
                let near = 1.0 - ((x - scan_x).abs() / (g.slot * 1.5)).min(1.0);
                (if x <= scan_x { 1.0 } else { 0.12 }, near)
            } else {
                (1.0, 0.0)
            };
            let jitter = if i == last {
                frame.liveliness.jitter() * 0.4
            } else {
                0.0
            };
            self.draw_candle(canvas, i, candle, opacity, glow, jitter);

            let h = volume_level(&frame.generator, i, frame.tick.total_ms) * g.volume.height;
            let bar_w = (g.slot * 0.6).max(1.0);
            canvas.fill_rect(
                Rect::new(x - bar_w / 2.0, g.volume.y + g.volume.height - h, bar_w, h),
                palette::VIOLET.with_opacity(0.35 * opacity),
            );
        }

        let title = TextStyle::new(palette::TEXT, 6.0);
        if scanning {
            canvas.line(
                Point::new(scan_x, g.plot.y - 4.0),
                Point::new(scan_x, g.volume.y + g.volume.height),
                &Stroke::new(palette::CYAN, 1.5).glow(1.0),
            );
            canvas.text(
                Point::new(g.plot.x, g.plot.y - 12.0),
                &format!("SCANNING BTCUSDT {:>3.0}%", state.progress * 100.0),
                &title,
            );
            return;
        }

        canvas.text(
            Point::new(g.plot.x, g.plot.y - 12.0),
            &format!("{} REVERSALS FOUND", self.reversals.len()),
            &title,
        );
        for (k, rev) in self.reversals.iter().enumerate() {
            // Markers appear one after another during the first half of the reveal.
            let local = ((state.progress - k as f64 * 0.12) / 0.4).clamp(0.0, 1.0);
            let t = ease_out_cubic(local);
            if t <= 0.0 {
                continue;
            }
            let candle = &SERIES[rev.index];
            let x = g.x(rev.index);
            let (price, color, label, dy) = match rev.kind {
                ReversalKind::Top => (candle.high, palette::RED, "SELL", -14.0),
                ReversalKind::Bottom => (candle.low, palette::GREEN, "BUY", 8.0),
            };
            let center = Point::new(x, g.y(price));
            canvas.circle(
                center,
                lerp(g.slot * 2.0, g.slot * 0.8, t),
                None,
                Some(&Stroke::new(color, 1.5).opacity(t).glow(t)),
            );
            canvas.text(
                Point::new(x, center.y + dy),
                label,
                &TextStyle::new(color.with_opacity(t), 5.0).align(Align::Center),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::AnimationClock;
    use crate::draw::{DrawOp, Recorder};
    use crate::generator::Liveliness;

    #[test]
    fn finds_the_three_scripted_swings() {
        let found = detect_reversals(SERIES, PIVOT_WINDOW);
        assert_eq!(
            found,
            vec![
                Reversal {
                    index: 8,
                    kind: ReversalKind::Bottom
                },
                Reversal {
                    index: 20,
                    kind: ReversalKind::Top
                },
                Reversal {
                    index: 30,
                    kind: ReversalKind::Bottom
                },
            ]
        );
    }

    #[test]
    fn short_series_has_no_reversals() {
        assert!(detect_reversals(&SERIES[..5], PIVOT_WINDOW).is_empty());
        assert!(detect_reversals(&[], 0).is_empty());
    }

    #[test]
    fn series_is_well_formed() {
        for c in SERIES {
            assert!(c.high >= c.open.max(c.close));
            assert!(c.low <= c.open.min(c.close));
        }
    }

    fn frame_at(widget: &mut PriceScanner, ts: f64) -> (PhaseState, Recorder) {
        let clock = AnimationClock::new(0.0, widget.cycle_ms());
        let tick = clock.tick(ts, 0);
        let state = widget.advance(&tick);
        let mut rec = Recorder::new(Size::new(320.0, 180.0));
        widget.layout(rec.size());
        let frame = FrameContext {
            tick,
            state,
            size: rec.size(),
            generator: Generator::new(7),
            liveliness: Liveliness::OFF,
        };
        widget.draw(&mut rec, &frame);
        (state, rec)
    }

    #[test]
    fn cycle_matches_scan_plus_reveal() {
        assert_eq!(PriceScanner::new().cycle_ms(), 9000.0);
    }

    #[test]
    fn scan_phase_draws_scan_line_with_glow() {
        let mut w = PriceScanner::new();
        let (state, rec) = frame_at(&mut w, 2000.0);
        assert_eq!(state.phase, Phase::Scanning);
        assert!(rec.ops().iter().any(|op| matches!(
            op,
            DrawOp::Line { stroke, .. } if stroke.glow == 1.0
        )));
    }

    #[test]
    fn reveal_phase_draws_markers() {
        let mut w = PriceScanner::new();
        let (state, rec) = frame_at(&mut w, 8900.0);
        assert_eq!(state.phase, Phase::Revealed);
        let markers = rec
            .ops()
            .iter()
            .filter(|op| matches!(op, DrawOp::Circle { .. }))
            .count();
        assert_eq!(markers, 3);
    }

    #[test]
    fn identical_frames_produce_identical_ops() {
        let mut a = PriceScanner::new();
        let mut b = PriceScanner::new();
        let (_, ra) = frame_at(&mut a, 4321.0);
        let (_, rb) = frame_at(&mut b, 4321.0);
        assert_eq!(ra.ops(), rb.ops());
    }

    #[test]
    fn volume_bars_drift_without_jumps() {
        let g = Generator::new(7);
        let frame_ms = 1000.0 / 60.0;
        for i in 0..SERIES.len() {
            let mut prev = volume_level(&g, i, 0.0);
            // Crosses two cycle boundaries (9000 and 18000 ms).
            for f in 1..1200 {
                let v = volume_level(&g, i, f as f64 * frame_ms);
                assert!((0.15..=1.0).contains(&v));
                assert!((v - prev).abs() < 0.03, "bar {i} jumped at frame {f}");
                prev = v;
            }
        }
        let moved = (0..SERIES.len())
            .any(|i| (volume_level(&g, i, 0.0) - volume_level(&g, i, 6000.0)).abs() > 0.05);
        assert!(moved);
    }
}
