//! Drawing primitives.
//!
//! Visualizations never touch pixels directly; they issue calls on a
//! [`Canvas`]. Two implementations ship with the core: the software
//! rasteriser in [`crate::surface::RenderSurface`] and the [`Recorder`],
//! which keeps the calls as [`DrawOp`]s for hosts that replay them onto
//! their own drawing API (the terminal host does this) and for tests.
//!
//! Every frame repaints from scratch starting with [`Canvas::clear`].

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Minimum logical surface edge; degenerate sizes are clamped to this.
pub const MIN_EDGE: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn lerp(self, to: Point, t: f64) -> Point {
        Point::new(lerp(self.x, to.x, t), lerp(self.y, to.y, t))
    }

    pub fn distance(self, to: Point) -> f64 {
        ((to.x - self.x).powi(2) + (to.y - self.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Replace zero, negative or non-finite edges with [`MIN_EDGE`].
    pub fn clamped(self) -> Size {
        let edge = |v: f64| {
            if v.is_finite() && v >= MIN_EDGE {
                v
            } else {
                MIN_EDGE
            }
        };
        Size::new(edge(self.width), edge(self.height))
    }

    pub fn is_degenerate(&self) -> bool {
        self.clamped() != *self
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn min_edge(&self) -> f64 {
        self.width.min(self.height)
    }
}

impl Default for Size {
    fn default() -> Self {
        Size::new(640.0, 360.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning two y values, whichever order they come in.
    pub fn from_span(x: f64, width: f64, y0: f64, y1: f64) -> Self {
        Self::new(x, y0.min(y1), width, (y1 - y0).abs())
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// Straight (non-premultiplied) RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Scale alpha by `opacity` in `[0, 1]`.
    pub fn with_opacity(self, opacity: f64) -> Self {
        let o = opacity.clamp(0.0, 1.0);
        Self {
            a: (self.a as f64 * o).round() as u8,
            ..self
        }
    }

    /// Linear blend towards `other`.
    pub fn mix(self, other: Color, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let ch = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Self {
            r: ch(self.r, other.r),
            g: ch(self.g, other.g),
            b: ch(self.b, other.b),
            a: ch(self.a, other.a),
        }
    }

    /// `#rrggbb` / `rgba(...)` string for web canvases.
    pub fn css(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({},{},{},{:.3})",
                self.r,
                self.g,
                self.b,
                self.a as f64 / 255.0
            )
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }
}

/// Studio palette shared by all widgets.
pub mod palette {
    use super::Color;

    pub const BACKGROUND: Color = Color::rgb(7, 10, 18);
    pub const BACKGROUND_TOP: Color = Color::rgb(12, 18, 32);
    pub const GRID: Color = Color::rgba(120, 140, 180, 36);
    pub const TEXT: Color = Color::rgb(210, 220, 235);
    pub const MUTED: Color = Color::rgb(100, 112, 135);
    pub const CYAN: Color = Color::rgb(34, 211, 238);
    pub const VIOLET: Color = Color::rgb(167, 139, 250);
    pub const GREEN: Color = Color::rgb(52, 211, 153);
    pub const RED: Color = Color::rgb(248, 113, 113);
    pub const AMBER: Color = Color::rgb(251, 191, 36);
    pub const LIGHT_SQUARE: Color = Color::rgb(214, 222, 235);
    pub const DARK_SQUARE: Color = Color::rgb(72, 88, 120);
}

// ---------------------------------------------------------------------------
// Styles and easing
// ---------------------------------------------------------------------------

/// Line style. `glow` in `[0, 1]` adds a soft halo around the stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
    pub glow: f64,
}

impl Stroke {
    pub const fn new(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            glow: 0.0,
        }
    }

    pub fn glow(mut self, glow: f64) -> Self {
        self.glow = glow.clamp(0.0, 1.0);
        self
    }

    pub fn opacity(mut self, opacity: f64) -> Self {
        self.color = self.color.with_opacity(opacity);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub color: Color,
    /// Glyph height in logical units.
    pub size: f64,
    pub align: Align,
}

impl TextStyle {
    pub const fn new(color: Color, size: f64) -> Self {
        Self {
            color,
            size,
            align: Align::Left,
        }
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[inline]
pub fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
pub fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

#[inline]
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Triangle pulse: 0 → 1 → 0 over `t` in `[0, 1]`.
#[inline]
pub fn pulse(t: f64) -> f64 {
    1.0 - (2.0 * t.clamp(0.0, 1.0) - 1.0).abs()
}

/// Flatten a cubic Bézier into `segments` line segments.
pub fn flatten_bezier(p0: Point, c1: Point, c2: Point, p3: Point, segments: usize) -> Vec<Point> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|i| {
            let t = i as f64 / segments as f64;
            let u = 1.0 - t;
            let b0 = u * u * u;
            let b1 = 3.0 * u * u * t;
            let b2 = 3.0 * u * t * t;
            let b3 = t * t * t;
            Point::new(
                b0 * p0.x + b1 * c1.x + b2 * c2.x + b3 * p3.x,
                b0 * p0.y + b1 * c1.y + b2 * c2.y + b3 * p3.y,
            )
        })
        .collect()
}

/// Prefix of a polyline covering `fraction` of its total length.
pub fn partial_polyline(points: &[Point], fraction: f64) -> Vec<Point> {
    if points.len() < 2 {
        return points.to_vec();
    }
    let fraction = fraction.clamp(0.0, 1.0);
    let total: f64 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
    let mut budget = total * fraction;
    let mut out = vec![points[0]];
    for w in points.windows(2) {
        let len = w[0].distance(w[1]);
        if budget >= len {
            out.push(w[1]);
            budget -= len;
        } else {
            if len > 0.0 && budget > 0.0 {
                out.push(w[0].lerp(w[1], budget / len));
            }
            break;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

/// Drawing target for one visualization frame.
pub trait Canvas {
    /// Logical size of the target.
    fn size(&self) -> Size;

    /// Resize the target. Implementations clamp degenerate sizes.
    fn resize(&mut self, size: Size);

    /// Repaint the whole target with `color`.
    fn clear(&mut self, color: Color);

    fn line(&mut self, from: Point, to: Point, stroke: &Stroke);

    fn polyline(&mut self, points: &[Point], stroke: &Stroke) {
        for w in points.windows(2) {
            self.line(w[0], w[1], stroke);
        }
    }

    fn bezier(&mut self, from: Point, c1: Point, c2: Point, to: Point, stroke: &Stroke) {
        let pts = flatten_bezier(from, c1, c2, to, 24);
        self.polyline(&pts, stroke);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Vertical gradient from `top` to `bottom`.
    fn gradient_rect(&mut self, rect: Rect, top: Color, bottom: Color);

    fn circle(&mut self, center: Point, radius: f64, fill: Option<Color>, stroke: Option<&Stroke>);

    fn text(&mut self, at: Point, text: &str, style: &TextStyle);
}

/// A recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear(Color),
    Line {
        from: Point,
        to: Point,
        stroke: Stroke,
    },
    Polyline {
        points: Vec<Point>,
        stroke: Stroke,
    },
    FillRect {
        rect: Rect,
        color: Color,
    },
    Gradient {
        rect: Rect,
        top: Color,
        bottom: Color,
    },
    Circle {
        center: Point,
        radius: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    Text {
        at: Point,
        text: String,
        style: TextStyle,
    },
}

/// Canvas that records calls instead of rasterising them.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    size: Size,
    ops: Vec<DrawOp>,
    total_calls: u64,
    clears: u64,
}

impl Recorder {
    pub fn new(size: Size) -> Self {
        Self {
            size: size.clamped(),
            ..Self::default()
        }
    }

    /// Ops of the most recent frame (cleared on every [`Canvas::clear`]).
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Every call ever received, across frames.
    pub fn total_calls(&self) -> u64 {
        self.total_calls
    }

    /// Number of frames started, i.e. `clear` calls.
    pub fn frames(&self) -> u64 {
        self.clears
    }

    fn push(&mut self, op: DrawOp) {
        self.total_calls += 1;
        self.ops.push(op);
    }
}

impl Canvas for Recorder {
    fn size(&self) -> Size {
        self.size
    }

    fn resize(&mut self, size: Size) {
        self.size = size.clamped();
    }

    fn clear(&mut self, color: Color) {
        self.ops.clear();
        self.clears += 1;
        self.push(DrawOp::Clear(color));
    }

    fn line(&mut self, from: Point, to: Point, stroke: &Stroke) {
        self.push(DrawOp::Line {
            from,
            to,
            stroke: *stroke,
        });
    }

    fn polyline(&mut self, points: &[Point], stroke: &Stroke) {
        if points.len() < 2 {
            return;
        }
        self.push(DrawOp::Polyline {
            points: points.to_vec(),
            stroke: *stroke,
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.push(DrawOp::FillRect { rect, color });
    }

    fn gradient_rect(&mut self, rect: Rect, top: Color, bottom: Color) {
        self.push(DrawOp::Gradient { rect, top, bottom });
    }

    fn circle(&mut self, center: Point, radius: f64, fill: Option<Color>, stroke: Option<&Stroke>) {
        self.push(DrawOp::Circle {
            center,
            radius,
            fill,
            stroke: stroke.copied(),
        });
    }

    fn text(&mut self, at: Point, text: &str, style: &TextStyle) {
        self.push(DrawOp::Text {
            at,
            text: text.to_string(),
            style: *style,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_clamps_degenerate_edges() {
        assert_eq!(Size::new(0.0, 0.0).clamped(), Size::new(MIN_EDGE, MIN_EDGE));
        assert_eq!(Size::new(-4.0, 300.0).clamped(), Size::new(MIN_EDGE, 300.0));
        assert_eq!(Size::new(f64::INFINITY, 20.0).clamped().width, MIN_EDGE);
        assert!(Size::new(1.0, 100.0).is_degenerate());
        assert!(!Size::new(100.0, 100.0).is_degenerate());
    }

    #[test]
    fn color_opacity_and_mix() {
        let c = Color::rgb(200, 100, 0).with_opacity(0.5);
        assert_eq!(c.a, 128);
        let m = Color::rgb(0, 0, 0).mix(Color::rgb(255, 255, 255), 0.5);
        assert_eq!(m, Color::rgb(128, 128, 128));
        assert_eq!(Color::rgb(1, 2, 3).with_opacity(7.0).a, 255);
    }

    #[test]
    fn css_strings() {
        assert_eq!(Color::rgb(255, 0, 16).css(), "#ff0010");
        assert_eq!(Color::rgba(0, 0, 0, 0).css(), "rgba(0,0,0,0.000)");
    }

    #[test]
    fn easing_endpoints() {
        for f in [smoothstep, ease_in_out, ease_out_cubic] {
            assert!(f(0.0).abs() < 1e-12);
            assert!((f(1.0) - 1.0).abs() < 1e-12);
            assert!(f(-3.0).abs() < 1e-12);
        }
        assert_eq!(pulse(0.5), 1.0);
        assert_eq!(pulse(0.0), 0.0);
    }

    #[test]
    fn bezier_flattening_hits_endpoints() {
        let pts = flatten_bezier(
            Point::new(0.0, 0.0),
            Point::new(1.0, 2.0),
            Point::new(3.0, 2.0),
            Point::new(4.0, 0.0),
            8,
        );
        assert_eq!(pts.len(), 9);
        assert_eq!(pts[0], Point::new(0.0, 0.0));
        assert_eq!(pts[8], Point::new(4.0, 0.0));
    }

    #[test]
    fn partial_polyline_cuts_by_length() {
        let pts = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)];
        let half = partial_polyline(&pts, 0.5);
        assert_eq!(half.last(), Some(&Point::new(10.0, 0.0)));
        let quarter = partial_polyline(&pts, 0.25);
        assert_eq!(quarter, vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0)]);
        assert_eq!(partial_polyline(&pts, 1.0).len(), 3);
    }

    #[test]
    fn recorder_keeps_last_frame_and_counts_all_calls() {
        let mut rec = Recorder::new(Size::new(100.0, 50.0));
        rec.clear(palette::BACKGROUND);
        rec.line(Point::default(), Point::new(1.0, 1.0), &Stroke::new(palette::CYAN, 1.0));
        rec.clear(palette::BACKGROUND);
        assert_eq!(rec.ops().len(), 1);
        assert_eq!(rec.total_calls(), 3);
        assert_eq!(rec.frames(), 2);
    }

    #[test]
    fn recorder_skips_degenerate_polylines() {
        let mut rec = Recorder::new(Size::new(0.0, 0.0));
        assert_eq!(rec.size(), Size::new(MIN_EDGE, MIN_EDGE));
        rec.polyline(&[Point::default()], &Stroke::new(palette::CYAN, 1.0));
        assert_eq!(rec.total_calls(), 0);
    }
}
