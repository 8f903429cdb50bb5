//! The eight site visualizations.

pub mod calibration;
pub mod chat;
pub mod chess;
pub mod decision_field;
pub mod oblivious_tree;
pub mod orbit;
pub mod pipeline;
pub mod scanner;

use crate::draw::{Canvas, Point, Rect, Size, Stroke, palette};
use crate::visualization::Visualization;

/// Grid spacing of the shared backdrop, in logical units.
pub const GRID_STEP: f64 = 40.0;

/// All visualization constructors, in catalogue order.
pub fn all_widgets() -> Vec<Box<dyn Visualization>> {
    vec![
        // Home
        Box::new(scanner::PriceScanner::new()),
        Box::new(pipeline::Pipeline::new()),
        Box::new(orbit::TechOrbit::new()),
        // Fraud
        Box::new(calibration::CalibrationCurve::new()),
        Box::new(oblivious_tree::ObliviousTree::new()),
        // Betting
        Box::new(decision_field::DecisionField::new()),
        Box::new(chat::SignalChat::new()),
        // Chess
        Box::new(chess::ChessBoard::new()),
    ]
}

/// Names of every visualization, in catalogue order.
pub fn widget_names() -> Vec<&'static str> {
    all_widgets().iter().map(|w| w.name()).collect()
}

/// Build a visualization by name (case-insensitive).
pub fn build(name: &str) -> Option<Box<dyn Visualization>> {
    let wanted = name.trim();
    all_widgets()
        .into_iter()
        .find(|w| w.name().eq_ignore_ascii_case(wanted))
}

/// Clear to the page background: vertical gradient plus a faint grid.
pub(crate) fn backdrop(canvas: &mut dyn Canvas, size: Size) {
    canvas.clear(palette::BACKGROUND);
    canvas.gradient_rect(
        Rect::new(0.0, 0.0, size.width, size.height),
        palette::BACKGROUND_TOP,
        palette::BACKGROUND,
    );
    let grid = Stroke::new(palette::GRID, 1.0);
    let mut x = GRID_STEP;
    while x < size.width {
        canvas.line(Point::new(x, 0.0), Point::new(x, size.height), &grid);
        x += GRID_STEP;
    }
    let mut y = GRID_STEP;
    while y < size.height {
        canvas.line(Point::new(0.0, y), Point::new(size.width, y), &grid);
        y += GRID_STEP;
    }
}
