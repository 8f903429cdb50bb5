//! Software render surface.
//!
//! [`RenderSurface`] is an RGBA8 pixel buffer with a logical size and a
//! device scale, rasterising [`Canvas`] calls with coverage-based
//! anti-aliasing. Glow is a wider, faint pass painted under the stroke.
//! Text uses a built-in 3×5 bitmap font, enough for labels and tickers.

use crate::draw::{Align, Canvas, Color, Point, Rect, Size, Stroke, TextStyle};

/// Accepted device-scale range.
const MIN_SCALE: f64 = 0.25;
const MAX_SCALE: f64 = 4.0;

/// Glow halo radius at `glow = 1`, in logical units.
const GLOW_RADIUS: f64 = 6.0;

/// RGBA pixel buffer that mirrors a canvas element.
#[derive(Debug, Clone)]
pub struct RenderSurface {
    logical: Size,
    scale: f64,
    width_px: usize,
    height_px: usize,
    pixels: Vec<u8>,
}

impl RenderSurface {
    /// Create a surface; degenerate sizes are clamped to the minimum edge.
    pub fn new(size: Size, scale: f64) -> Self {
        let scale = if scale.is_finite() {
            scale.clamp(MIN_SCALE, MAX_SCALE)
        } else {
            1.0
        };
        let mut surface = Self {
            logical: Size::new(0.0, 0.0),
            scale,
            width_px: 0,
            height_px: 0,
            pixels: Vec::new(),
        };
        surface.resize(size);
        surface
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn width_px(&self) -> usize {
        self.width_px
    }

    pub fn height_px(&self) -> usize {
        self.height_px
    }

    /// Raw RGBA bytes, row-major.
    pub fn rgba(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.width_px || y >= self.height_px {
            return None;
        }
        let i = (y * self.width_px + x) * 4;
        Some(Color::rgba(
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ))
    }

    /// Binary PPM (P6) encoding; alpha is dropped.
    pub fn to_ppm(&self) -> Vec<u8> {
        let header = format!("P6\n{} {}\n255\n", self.width_px, self.height_px);
        let mut out = Vec::with_capacity(header.len() + self.width_px * self.height_px * 3);
        out.extend_from_slice(header.as_bytes());
        for px in self.pixels.chunks_exact(4) {
            out.extend_from_slice(&px[..3]);
        }
        out
    }

    // -----------------------------------------------------------------------
    // Pixel plumbing
    // -----------------------------------------------------------------------

    #[inline]
    fn blend(&mut self, x: usize, y: usize, color: Color, coverage: f64) {
        let alpha = color.a as f64 / 255.0 * coverage.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let i = (y * self.width_px + x) * 4;
        let dst_a = self.pixels[i + 3] as f64 / 255.0;
        let out_a = alpha + dst_a * (1.0 - alpha);
        if out_a <= 0.0 {
            return;
        }
        let src = [color.r, color.g, color.b];
        for (c, s) in src.iter().enumerate() {
            let d = self.pixels[i + c] as f64;
            let v = (*s as f64 * alpha + d * dst_a * (1.0 - alpha)) / out_a;
            self.pixels[i + c] = v.round().clamp(0.0, 255.0) as u8;
        }
        self.pixels[i + 3] = (out_a * 255.0).round() as u8;
    }

    /// Pixel-space bounding box clipped to the buffer.
    fn clip(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> Option<(usize, usize, usize, usize)> {
        let cx0 = x0.floor().max(0.0);
        let cy0 = y0.floor().max(0.0);
        let cx1 = x1.ceil().min(self.width_px as f64);
        let cy1 = y1.ceil().min(self.height_px as f64);
        if cx0 >= cx1 || cy0 >= cy1 {
            return None;
        }
        Some((cx0 as usize, cy0 as usize, cx1 as usize, cy1 as usize))
    }

    fn to_px(&self, p: Point) -> Point {
        Point::new(p.x * self.scale, p.y * self.scale)
    }

    /// Shade every pixel whose centre lies within `radius + feather` of the
    /// segment `a..b` (pixel space). `coverage(d)` maps distance to alpha.
    fn shade_segment(
        &mut self,
        a: Point,
        b: Point,
        reach: f64,
        color: Color,
        coverage: impl Fn(f64) -> f64,
    ) {
        let Some((x0, y0, x1, y1)) = self.clip(
            a.x.min(b.x) - reach,
            a.y.min(b.y) - reach,
            a.x.max(b.x) + reach,
            a.y.max(b.y) + reach,
        ) else {
            return;
        };
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len2 = dx * dx + dy * dy;
        for y in y0..y1 {
            for x in x0..x1 {
                let p = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let t = if len2 > 0.0 {
                    (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let d = p.distance(Point::new(a.x + dx * t, a.y + dy * t));
                if d <= reach {
                    self.blend(x, y, color, coverage(d));
                }
            }
        }
    }

    fn shade_ring(&mut self, c: Point, r: f64, reach: f64, color: Color, coverage: impl Fn(f64) -> f64) {
        let outer = r + reach;
        let Some((x0, y0, x1, y1)) = self.clip(c.x - outer, c.y - outer, c.x + outer, c.y + outer)
        else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let p = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let d = (p.distance(c) - r).abs();
                if d <= reach {
                    self.blend(x, y, color, coverage(d));
                }
            }
        }
    }

    fn glow_pass(&self, stroke: &Stroke) -> Option<(f64, f64, Color)> {
        if stroke.glow <= 0.0 {
            return None;
        }
        let half = (stroke.width * self.scale / 2.0).max(0.5);
        let reach = half + GLOW_RADIUS * stroke.glow * self.scale;
        Some((half, reach, stroke.color.with_opacity(0.35 * stroke.glow)))
    }
}

#[inline]
fn falloff(half: f64, reach: f64) -> impl Fn(f64) -> f64 {
    move |d| {
        if d <= half {
            1.0
        } else {
            1.0 - (d - half) / (reach - half).max(1e-6)
        }
    }
}

#[inline]
fn antialias(half: f64) -> impl Fn(f64) -> f64 {
    move |d| (half + 0.5 - d).clamp(0.0, 1.0)
}

impl Canvas for RenderSurface {
    fn size(&self) -> Size {
        self.logical
    }

    fn resize(&mut self, size: Size) {
        let size = size.clamped();
        self.logical = size;
        self.width_px = (size.width * self.scale).round().max(1.0) as usize;
        self.height_px = (size.height * self.scale).round().max(1.0) as usize;
        self.pixels = vec![0; self.width_px * self.height_px * 4];
    }

    fn clear(&mut self, color: Color) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&[color.r, color.g, color.b, color.a]);
        }
    }

    fn line(&mut self, from: Point, to: Point, stroke: &Stroke) {
        let a = self.to_px(from);
        let b = self.to_px(to);
        if let Some((half, reach, glow_color)) = self.glow_pass(stroke) {
            self.shade_segment(a, b, reach, glow_color, falloff(half, reach));
        }
        let half = (stroke.width * self.scale / 2.0).max(0.5);
        self.shade_segment(a, b, half + 0.5, stroke.color, antialias(half));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some((x0, y0, x1, y1)) = self.clip(
            rect.x * self.scale,
            rect.y * self.scale,
            (rect.x + rect.width) * self.scale,
            (rect.y + rect.height) * self.scale,
        ) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend(x, y, color, 1.0);
            }
        }
    }

    fn gradient_rect(&mut self, rect: Rect, top: Color, bottom: Color) {
        let Some((x0, y0, x1, y1)) = self.clip(
            rect.x * self.scale,
            rect.y * self.scale,
            (rect.x + rect.width) * self.scale,
            (rect.y + rect.height) * self.scale,
        ) else {
            return;
        };
        let span = (y1 - y0).max(1) as f64;
        for y in y0..y1 {
            let color = top.mix(bottom, (y - y0) as f64 / span);
            for x in x0..x1 {
                self.blend(x, y, color, 1.0);
            }
        }
    }

    fn circle(&mut self, center: Point, radius: f64, fill: Option<Color>, stroke: Option<&Stroke>) {
        let c = self.to_px(center);
        let r = (radius * self.scale).max(0.0);
        let bounds = self.clip(c.x - r - 1.0, c.y - r - 1.0, c.x + r + 1.0, c.y + r + 1.0);
        if let (Some(color), Some((x0, y0, x1, y1))) = (fill, bounds) {
            for y in y0..y1 {
                for x in x0..x1 {
                    let d = Point::new(x as f64 + 0.5, y as f64 + 0.5).distance(c);
                    self.blend(x, y, color, (r + 0.5 - d).clamp(0.0, 1.0));
                }
            }
        }
        if let Some(stroke) = stroke {
            if let Some((half, reach, glow_color)) = self.glow_pass(stroke) {
                self.shade_ring(c, r, reach, glow_color, falloff(half, reach));
            }
            let half = (stroke.width * self.scale / 2.0).max(0.5);
            self.shade_ring(c, r, half + 0.5, stroke.color, antialias(half));
        }
    }

    fn text(&mut self, at: Point, text: &str, style: &TextStyle) {
        let dot = (style.size / 5.0).max(0.2);
        let advance = dot * 4.0;
        let width = text.chars().count() as f64 * advance - dot;
        let x0 = match style.align {
            Align::Left => at.x,
            Align::Center => at.x - width / 2.0,
            Align::Right => at.x - width,
        };
        for (i, ch) in text.chars().enumerate() {
            let rows = glyph(ch);
            let gx = x0 + i as f64 * advance;
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..3 {
                    if bits & (0b100 >> col) != 0 {
                        self.fill_rect(
                            Rect::new(gx + col as f64 * dot, at.y + row as f64 * dot, dot, dot),
                            style.color,
                        );
                    }
                }
            }
        }
    }
}

/// 3×5 glyph rows, most significant of the low three bits is the left column.
fn glyph(ch: char) -> [u8; 5] {
    match ch.to_ascii_uppercase() {
        ' ' => [0, 0, 0, 0, 0],
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '(' => [0b010, 0b100, 0b100, 0b100, 0b010],
        ')' => [0b010, 0b001, 0b001, 0b001, 0b010],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '#' => [0b101, 0b111, 0b101, 0b111, 0b101],
        '\'' => [0b010, 0b010, 0b000, 0b000, 0b000],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '<' => [0b001, 0b010, 0b100, 0b010, 0b001],
        '>' => [0b100, 0b010, 0b001, 0b010, 0b100],
        '*' => [0b101, 0b010, 0b101, 0b000, 0b000],
        '$' => [0b011, 0b110, 0b010, 0b011, 0b110],
        _ => [0b110, 0b001, 0b010, 0b000, 0b010],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::palette;

    fn surface() -> RenderSurface {
        RenderSurface::new(Size::new(40.0, 20.0), 1.0)
    }

    #[test]
    fn new_clamps_zero_size() {
        let s = RenderSurface::new(Size::new(0.0, 0.0), 1.0);
        assert_eq!(s.width_px(), 16);
        assert_eq!(s.height_px(), 16);
        assert_eq!(s.rgba().len(), 16 * 16 * 4);
    }

    #[test]
    fn scale_multiplies_pixel_dimensions() {
        let s = RenderSurface::new(Size::new(40.0, 20.0), 2.0);
        assert_eq!((s.width_px(), s.height_px()), (80, 40));
        assert_eq!(RenderSurface::new(Size::new(40.0, 20.0), f64::NAN).scale(), 1.0);
        assert_eq!(RenderSurface::new(Size::new(40.0, 20.0), 100.0).scale(), MAX_SCALE);
    }

    #[test]
    fn clear_repaints_every_pixel() {
        let mut s = surface();
        s.fill_rect(Rect::new(0.0, 0.0, 5.0, 5.0), palette::RED);
        s.clear(palette::BACKGROUND);
        assert!(s.rgba().chunks_exact(4).all(|px| px == [7, 10, 18, 255]));
    }

    #[test]
    fn opaque_fill_replaces_pixels() {
        let mut s = surface();
        s.clear(palette::BACKGROUND);
        s.fill_rect(Rect::new(2.0, 2.0, 4.0, 4.0), palette::GREEN);
        assert_eq!(s.pixel(3, 3), Some(palette::GREEN));
        assert_eq!(s.pixel(10, 10), Some(palette::BACKGROUND));
        assert_eq!(s.pixel(400, 3), None);
    }

    #[test]
    fn translucent_fill_blends() {
        let mut s = surface();
        s.clear(Color::rgb(0, 0, 0));
        s.fill_rect(Rect::new(0.0, 0.0, 40.0, 20.0), Color::rgba(255, 255, 255, 128));
        let px = s.pixel(0, 0).unwrap_or(Color::rgb(0, 0, 0));
        assert!(px.r > 120 && px.r < 136, "got {px:?}");
        assert_eq!(px.a, 255);
    }

    #[test]
    fn line_covers_its_path_only() {
        let mut s = surface();
        s.clear(Color::rgb(0, 0, 0));
        s.line(Point::new(0.0, 10.0), Point::new(40.0, 10.0), &Stroke::new(palette::CYAN, 2.0));
        assert_eq!(s.pixel(20, 10), Some(palette::CYAN));
        assert_eq!(s.pixel(20, 2), Some(Color::rgb(0, 0, 0)));
    }

    #[test]
    fn glow_spreads_beyond_stroke() {
        let mut plain = surface();
        plain.clear(Color::rgb(0, 0, 0));
        plain.line(Point::new(0.0, 10.0), Point::new(40.0, 10.0), &Stroke::new(palette::CYAN, 1.0));
        let mut glowing = surface();
        glowing.clear(Color::rgb(0, 0, 0));
        glowing.line(
            Point::new(0.0, 10.0),
            Point::new(40.0, 10.0),
            &Stroke::new(palette::CYAN, 1.0).glow(1.0),
        );
        assert_eq!(plain.pixel(20, 13), Some(Color::rgb(0, 0, 0)));
        assert_ne!(glowing.pixel(20, 13), Some(Color::rgb(0, 0, 0)));
    }

    #[test]
    fn shapes_outside_surface_are_ignored() {
        let mut s = surface();
        s.clear(Color::rgb(0, 0, 0));
        s.fill_rect(Rect::new(-100.0, -100.0, 10.0, 10.0), palette::RED);
        s.circle(Point::new(500.0, 500.0), 4.0, Some(palette::RED), None);
        assert!(s.rgba().chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
    }

    #[test]
    fn text_draws_glyph_dots() {
        let mut s = surface();
        s.clear(Color::rgb(0, 0, 0));
        s.text(Point::new(0.0, 0.0), "1", &TextStyle::new(palette::TEXT, 5.0));
        // Top row of '1' is 010.
        assert_eq!(s.pixel(0, 0), Some(Color::rgb(0, 0, 0)));
        assert_eq!(s.pixel(1, 0), Some(palette::TEXT));
    }

    #[test]
    fn ppm_header_and_length() {
        let s = RenderSurface::new(Size::new(20.0, 16.0), 1.0);
        let ppm = s.to_ppm();
        let header = b"P6\n20 16\n255\n";
        assert!(ppm.starts_with(header));
        assert_eq!(ppm.len(), header.len() + 20 * 16 * 3);
    }
}
