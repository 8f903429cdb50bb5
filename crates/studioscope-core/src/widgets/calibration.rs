//! Isotonic calibration curve.
//!
//! Raw score bins appear one by one (Scanning), the pool-adjacent-violators
//! fit is traced across them (Processing), then the expected calibration
//! error before and after is shown (Revealed).

use crate::clock::Tick;
use crate::draw::{
    Align, Canvas, Point, Rect, Size, Stroke, TextStyle, ease_in_out, ease_out_cubic, palette,
    partial_polyline,
};
use crate::phase::{Phase, PhaseSpan, PhaseState, PhaseTimeline};
use crate::visualization::{FrameContext, Page, Visualization, WidgetInfo};

/// Observed positive rate per predicted-probability decile.
pub const OBSERVED: [f64; 10] = [0.02, 0.06, 0.05, 0.14, 0.22, 0.19, 0.41, 0.55, 0.52, 0.83];
/// Samples per decile.
pub const WEIGHTS: [f64; 10] = [120.0, 110.0, 95.0, 90.0, 80.0, 70.0, 60.0, 50.0, 40.0, 30.0];

/// Pool-adjacent-violators: the weighted least-squares non-decreasing fit.
///
/// Non-positive weights are treated as zero; an all-zero block keeps the raw
/// values' plain mean.
pub fn isotonic_fit(values: &[f64], weights: &[f64]) -> Vec<f64> {
    let n = values.len().min(weights.len());
    // (mean, weight, count)
    let mut blocks: Vec<(f64, f64, usize)> = Vec::with_capacity(n);
    for i in 0..n {
        let w = weights[i].max(0.0);
        blocks.push((values[i], w, 1));
        while blocks.len() > 1 {
            let (m2, w2, c2) = blocks[blocks.len() - 1];
            let (m1, w1, c1) = blocks[blocks.len() - 2];
            if m1 <= m2 {
                break;
            }
            let w = w1 + w2;
            let m = if w > 0.0 {
                (m1 * w1 + m2 * w2) / w
            } else {
                (m1 * c1 as f64 + m2 * c2 as f64) / (c1 + c2) as f64
            };
            blocks.truncate(blocks.len() - 2);
            blocks.push((m, w, c1 + c2));
        }
    }
    blocks
        .into_iter()
        .flat_map(|(m, _, c)| std::iter::repeat_n(m, c))
        .collect()
}

/// Expected calibration error of `rates` against the decile centres.
pub fn expected_calibration_error(rates: &[f64], weights: &[f64]) -> f64 {
    let n = rates.len();
    let total: f64 = weights.iter().take(n).sum();
    if n == 0 || total <= 0.0 {
        return 0.0;
    }
    rates
        .iter()
        .zip(weights)
        .enumerate()
        .map(|(i, (r, w))| w * (r - bin_center(i, n)).abs())
        .sum::<f64>()
        / total
}

fn bin_center(i: usize, n: usize) -> f64 {
    (i as f64 + 0.5) / n as f64
}

pub struct CalibrationCurve {
    info: WidgetInfo,
    timeline: PhaseTimeline,
    fitted: Vec<f64>,
    plot: Rect,
}

impl CalibrationCurve {
    pub fn new() -> Self {
        Self {
            info: WidgetInfo {
                name: "calibration",
                description: "Isotonic regression pulling raw scores onto the diagonal",
                page: Page::Fraud,
                triggered: false,
            },
            timeline: PhaseTimeline::new(vec![
                PhaseSpan::new(Phase::Scanning, 3000.0),
                PhaseSpan::new(Phase::Processing, 3500.0),
                PhaseSpan::new(Phase::Revealed, 2500.0),
            ]),
            fitted: isotonic_fit(&OBSERVED, &WEIGHTS),
            plot: Rect::new(0.0, 0.0, 1.0, 1.0),
        }
    }

    pub fn fitted(&self) -> &[f64] {
        &self.fitted
    }

    fn at(&self, x: f64, y: f64) -> Point {
        Point::new(
            self.plot.x + x * self.plot.width,
            self.plot.y + (1.0 - y) * self.plot.height,
        )
    }
}

impl Default for CalibrationCurve {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for CalibrationCurve {
    fn info(&self) -> &WidgetInfo {
        &self.info
    }

    fn cycle_ms(&self) -> f64 {
        self.timeline.cycle_ms()
    }

    fn layout(&mut self, size: Size) {
        let edge = size.min_edge() * 0.8;
        self.plot = Rect::new(
            (size.width - edge) / 2.0,
            (size.height - edge) / 2.0,
            edge,
            edge,
        );
    }

    fn advance(&mut self, tick: &Tick) -> PhaseState {
        self.timeline.at(tick.elapsed_ms)
    }

    fn draw(&self, canvas: &mut dyn Canvas, frame: &FrameContext) {
        super::backdrop(canvas, frame.size);
        let state = frame.state;
        let n = OBSERVED.len();

        canvas.line(
            self.at(0.0, 0.0),
            self.at(1.0, 1.0),
            &Stroke::new(palette::MUTED, 1.0).opacity(0.6),
        );

        let shown_bins = match state.phase {
            Phase::Scanning => (ease_out_cubic(state.progress) * n as f64).ceil() as usize,
            _ => n,
        };
        let max_w = WEIGHTS.iter().copied().fold(0.0, f64::max);
        for i in 0..shown_bins.min(n) {
            let c = self.at(bin_center(i, n), OBSERVED[i]);
            let r = 1.5 + 3.0 * WEIGHTS[i] / max_w;
            canvas.circle(c, r, Some(palette::RED.with_opacity(0.8)), None);
        }

        let curve: Vec<Point> = self
            .fitted
            .iter()
            .enumerate()
            .map(|(i, &y)| self.at(bin_center(i, n), y))
            .collect();
        let traced = match state.phase {
            Phase::Scanning => 0.0,
            Phase::Processing => ease_in_out(state.progress),
            _ => 1.0,
        };
        let glow = if state.is(Phase::Processing) { 0.8 } else { 0.3 };
        canvas.polyline(
            &partial_polyline(&curve, traced),
            &Stroke::new(palette::CYAN, 2.0).glow(glow),
        );

        if state.is(Phase::Revealed) {
            let raw = expected_calibration_error(&OBSERVED, &WEIGHTS);
            let fit = expected_calibration_error(&self.fitted, &WEIGHTS);
            let o = ease_out_cubic(state.progress * 3.0);
            let style = TextStyle::new(palette::TEXT.with_opacity(o), 6.0).align(Align::Right);
            let corner = Point::new(self.plot.x + self.plot.width, self.plot.y + 4.0);
            canvas.text(corner, &format!("ECE RAW {raw:.3}"), &style);
            canvas.text(
                Point::new(corner.x, corner.y + 10.0),
                &format!("ECE ISO {fit:.3}"),
                &TextStyle { color: palette::GREEN.with_opacity(o), ..style },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_is_monotone() {
        let fit = isotonic_fit(&OBSERVED, &WEIGHTS);
        assert_eq!(fit.len(), OBSERVED.len());
        for w in fit.windows(2) {
            assert!(w[0] <= w[1] + 1e-12);
        }
    }

    #[test]
    fn fit_preserves_weighted_mean() {
        let fit = isotonic_fit(&OBSERVED, &WEIGHTS);
        let total: f64 = WEIGHTS.iter().sum();
        let raw: f64 = OBSERVED.iter().zip(&WEIGHTS).map(|(v, w)| v * w).sum::<f64>() / total;
        let pooled: f64 = fit.iter().zip(&WEIGHTS).map(|(v, w)| v * w).sum::<f64>() / total;
        assert!((raw - pooled).abs() < 1e-12);
    }

    #[test]
    fn violators_are_pooled() {
        let fit = isotonic_fit(&[1.0, 3.0, 2.0], &[1.0, 1.0, 1.0]);
        assert_eq!(fit, vec![1.0, 2.5, 2.5]);
        let fit = isotonic_fit(&[3.0, 1.0], &[3.0, 1.0]);
        assert_eq!(fit, vec![2.5, 2.5]);
    }

    #[test]
    fn zero_weights_fall_back_to_plain_mean() {
        assert_eq!(isotonic_fit(&[4.0, 2.0], &[0.0, 0.0]), vec![3.0, 3.0]);
    }

    #[test]
    fn monotone_input_is_untouched() {
        let v = [0.1, 0.2, 0.3];
        assert_eq!(isotonic_fit(&v, &[1.0; 3]), v.to_vec());
        assert!(isotonic_fit(&[], &[]).is_empty());
    }

    #[test]
    fn calibration_lowers_ece_for_perfect_rates() {
        let perfect: Vec<f64> = (0..10).map(|i| bin_center(i, 10)).collect();
        assert!(expected_calibration_error(&perfect, &WEIGHTS) < 1e-12);
        assert_eq!(expected_calibration_error(&[], &[]), 0.0);
    }

    #[test]
    fn cycle_is_nine_seconds() {
        assert_eq!(CalibrationCurve::new().cycle_ms(), 9000.0);
    }
}
