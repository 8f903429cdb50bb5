//! The trait every animated widget implements.

use crate::clock::Tick;
use crate::draw::{Canvas, Size};
use crate::generator::{Generator, Liveliness};
use crate::phase::PhaseState;

/// Site page a widget decorates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Home,
    Chess,
    Fraud,
    Betting,
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Home => write!(f, "home"),
            Self::Chess => write!(f, "chess"),
            Self::Fraud => write!(f, "fraud"),
            Self::Betting => write!(f, "betting"),
        }
    }
}

/// Static metadata about a widget.
#[derive(Debug, Clone)]
pub struct WidgetInfo {
    /// Unique identifier (e.g. `"scanner"`).
    pub name: &'static str,
    /// One-line human-readable description.
    pub description: &'static str,
    /// Page the widget appears on.
    pub page: Page,
    /// Whether phases come from external triggers rather than elapsed time.
    pub triggered: bool,
}

/// Everything the drawing layer may read for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    pub tick: Tick,
    pub state: PhaseState,
    pub size: Size,
    pub generator: Generator,
    pub liveliness: Liveliness,
}

/// An animated widget: phase computation plus drawing.
///
/// `advance` is the only place a widget may mutate itself; `draw` reads the
/// widget and the [`FrameContext`] and must repaint the full canvas.
pub trait Visualization {
    fn info(&self) -> &WidgetInfo;

    /// Length of one animation cycle in ms.
    fn cycle_ms(&self) -> f64;

    /// Recompute geometry for a (clamped) surface size.
    fn layout(&mut self, size: Size);

    /// Compute the phase for this frame.
    fn advance(&mut self, tick: &Tick) -> PhaseState;

    /// Issue this frame's draw calls.
    fn draw(&self, canvas: &mut dyn Canvas, frame: &FrameContext);

    fn name(&self) -> &'static str {
        self.info().name
    }
}
