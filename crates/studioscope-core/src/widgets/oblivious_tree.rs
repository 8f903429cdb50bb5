//! Oblivious (symmetric) decision tree.
//!
//! Every level of an oblivious tree asks the same question, so a depth-3 tree
//! has three splits and eight leaves. Each cycle a transaction walks down the
//! tree: the nodes settle (Idle), the path lights up level by level
//! (Processing) and the reached leaf glows with its score (Active).

use crate::clock::Tick;
use crate::draw::{
    Align, Canvas, Point, Size, Stroke, TextStyle, ease_in_out, palette, pulse,
};
use crate::generator::Generator;
use crate::phase::{Phase, PhaseSpan, PhaseState, PhaseTimeline};
use crate::visualization::{FrameContext, Page, Visualization, WidgetInfo};

pub const DEPTH: usize = 3;
pub const SPLITS: [&str; DEPTH] = ["AMOUNT > 420", "VELOCITY > 3", "NEW DEVICE"];
/// Fraud score per leaf, indexed by the path bits (MSB = first split).
pub const LEAVES: [f64; 1 << DEPTH] = [0.02, 0.07, 0.11, 0.34, 0.09, 0.28, 0.46, 0.91];

/// Split outcomes for the transaction of `cycle`.
pub fn path_for(generator: &Generator, cycle: u64) -> [bool; DEPTH] {
    let mut bits = [false; DEPTH];
    for (level, bit) in bits.iter_mut().enumerate() {
        *bit = generator.sample(level as u32, cycle) >= 0.5;
    }
    bits
}

/// Leaf reached by `path`.
pub fn leaf_for(path: &[bool; DEPTH]) -> usize {
    path.iter().fold(0, |acc, &b| (acc << 1) | usize::from(b))
}

pub struct ObliviousTree {
    info: WidgetInfo,
    timeline: PhaseTimeline,
    size: Size,
}

impl ObliviousTree {
    pub fn new() -> Self {
        Self {
            info: WidgetInfo {
                name: "oblivious-tree",
                description: "Depth-3 symmetric tree routing a transaction to a fraud score",
                page: Page::Fraud,
                triggered: false,
            },
            timeline: PhaseTimeline::new(vec![
                PhaseSpan::new(Phase::Idle, 800.0),
                PhaseSpan::new(Phase::Processing, 3000.0),
                PhaseSpan::new(Phase::Active, 2200.0),
            ]),
            size: Size::default(),
        }
    }

    /// Screen position of node `index` on `level` (level `DEPTH` = leaves).
    fn node(&self, level: usize, index: usize) -> Point {
        let count = 1usize << level;
        let top = self.size.height * 0.14;
        let bottom = self.size.height * 0.82;
        let y = top + (bottom - top) * level as f64 / DEPTH as f64;
        let x = self.size.width * (index as f64 + 0.5) / count as f64;
        Point::new(x, y)
    }
}

impl Default for ObliviousTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for ObliviousTree {
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
        let path = path_for(&frame.generator, frame.tick.cycle);

        // Levels fully walked so far, plus progress on the current edge.
        let walked = match state.phase {
            Phase::Idle => 0.0,
            Phase::Processing => ease_in_out(state.progress) * DEPTH as f64,
            _ => DEPTH as f64,
        };
        let settle = if state.is(Phase::Idle) {
            state.progress
        } else {
            1.0
        };

        let edge = Stroke::new(palette::GRID, 1.0);
        for level in 0..DEPTH {
            for i in 0..(1usize << level) {
                let from = self.node(level, i);
                canvas.line(from, self.node(level + 1, 2 * i), &edge);
                canvas.line(from, self.node(level + 1, 2 * i + 1), &edge);
            }
        }

        let mut index = 0usize;
        for (level, &bit) in path.iter().enumerate() {
            let t = (walked - level as f64).clamp(0.0, 1.0);
            if t <= 0.0 {
                break;
            }
            let next = 2 * index + usize::from(bit);
            let from = self.node(level, index);
            let to = from.lerp(self.node(level + 1, next), t);
            canvas.line(from, to, &Stroke::new(palette::CYAN, 2.0).glow(0.8));
            index = next;
        }

        let label = TextStyle::new(palette::MUTED, 5.0).align(Align::Center);
        for (level, split) in SPLITS.iter().enumerate() {
            let count = 1usize << level;
            for i in 0..count {
                canvas.circle(
                    self.node(level, i),
                    4.0,
                    Some(palette::VIOLET.with_opacity(0.4 + 0.6 * settle)),
                    None,
                );
            }
            let left = self.node(level, 0);
            canvas.text(Point::new(self.size.width / 2.0, left.y - 12.0), split, &label);
        }

        let reached = leaf_for(&path);
        for (i, score) in LEAVES.iter().enumerate() {
            let at = self.node(DEPTH, i);
            let hit = i == reached && state.is(Phase::Active);
            let color = palette::GREEN.mix(palette::RED, *score);
            let stroke = Stroke::new(color, 1.5).glow(if hit {
                0.5 + 0.5 * pulse(state.progress)
            } else {
                0.0
            });
            canvas.circle(
                at,
                if hit { 7.0 } else { 5.0 },
                Some(color.with_opacity(if hit { 1.0 } else { 0.45 })),
                Some(&stroke),
            );
            canvas.text(
                Point::new(at.x, at.y + 10.0),
                &format!("{score:.2}"),
                &label,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_index_follows_bits() {
        assert_eq!(leaf_for(&[false, false, false]), 0);
        assert_eq!(leaf_for(&[true, false, false]), 4);
        assert_eq!(leaf_for(&[true, true, true]), 7);
        assert_eq!(leaf_for(&[false, true, true]), 3);
    }

    #[test]
    fn path_is_stable_within_a_cycle() {
        let g = Generator::new(5);
        assert_eq!(path_for(&g, 12), path_for(&g, 12));
    }

    #[test]
    fn paths_visit_many_leaves() {
        let g = Generator::new(5);
        let mut seen = [false; 8];
        for cycle in 0..200 {
            seen[leaf_for(&path_for(&g, cycle))] = true;
        }
        assert!(seen.iter().filter(|&&s| s).count() >= 6);
    }

    #[test]
    fn phases_follow_the_walk() {
        let t = ObliviousTree::new();
        assert_eq!(t.cycle_ms(), 6000.0);
        assert_eq!(t.timeline.at(500.0).phase, Phase::Idle);
        assert_eq!(t.timeline.at(2000.0).phase, Phase::Processing);
        assert_eq!(t.timeline.at(4000.0).phase, Phase::Active);
    }
}
