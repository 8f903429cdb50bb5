//! TUI rendering.
//!
//! ┌ studioscope  watching: scanner  3/8  scanning 42% ───────┐
//! │ home · Candlestick scan that marks reversals             │
//! └──────────────────────────────────────────────────────────┘
//! ┌──────────────────────────────────────────────────────────┐
//! │        ⣀⡠⠤⠒⠉   (recorded draw calls, braille)            │
//! └──────────────────────────────────────────────────────────┘
//!  ←→ switch   p: pause   r: restart   q: quit

use super::app::App;
use ratatui::widgets::canvas::{Canvas, Circle, Context, Line as CanvasLine, Rectangle};
use ratatui::{prelude::*, widgets::*};
use studioscope_core::{Align, Canvas as _, DrawOp};

/// Draw calls fainter than this are dropped; braille has no alpha.
const MIN_ALPHA: u8 = 64;

pub fn draw(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Min(4),    // scene
            Constraint::Length(1), // keys
        ])
        .split(f.area());

    draw_title(f, rows[0], app);
    draw_scene(f, rows[1], app);
    draw_keys(f, rows[2]);
}

fn draw_title(f: &mut Frame, area: Rect, app: &App) {
    let state = app.state();
    let (pos, total) = app.position();
    let paused = if app.is_paused() { "  ⏸ paused" } else { "" };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(vec![
            Span::styled(" studioscope ", Style::default().bold().fg(Color::Cyan)),
            Span::raw("  watching: "),
            Span::styled(app.widget_name(), Style::default().bold().fg(Color::Yellow)),
            Span::styled(
                format!(
                    "  {pos}/{total}  {} {:>3.0}%  #{}{paused} ",
                    state.phase,
                    state.progress * 100.0,
                    app.frames()
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]));

    let body = Paragraph::new(Line::from(vec![
        Span::styled(format!(" {} · ", app.page()), Style::default().fg(Color::Magenta)),
        Span::raw(app.description()),
    ]))
    .block(block);
    f.render_widget(body, area);
}

fn draw_scene(f: &mut Frame, area: Rect, app: &App) {
    let recorder = app.surface().borrow();
    let size = recorder.size();
    let ops = recorder.ops();
    // Logical units per terminal column, for text alignment.
    let cell_w = size.width / f64::from(area.width.saturating_sub(2).max(1));

    let canvas = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .marker(ratatui::symbols::Marker::Braille)
        .x_bounds([0.0, size.width])
        .y_bounds([0.0, size.height])
        .paint(|ctx| paint_ops(ctx, ops, size.width, size.height, cell_w));
    f.render_widget(canvas, area);
}

fn draw_keys(f: &mut Frame, area: Rect) {
    let bar = Paragraph::new(" ←→ switch widget   p: pause   r: restart   q: quit")
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(bar, area);
}

/// Replay recorded draw calls. Surface y grows downward, canvas y upward.
fn paint_ops(ctx: &mut Context, ops: &[DrawOp], width: f64, height: f64, cell_w: f64) {
    let flip = |y: f64| height - y;
    for op in ops {
        match op {
            DrawOp::Clear(_) | DrawOp::Gradient { .. } => {}
            DrawOp::Line { from, to, stroke } => {
                if let Some(color) = tui_color(stroke.color) {
                    ctx.draw(&CanvasLine::new(from.x, flip(from.y), to.x, flip(to.y), color));
                }
            }
            DrawOp::Polyline { points, stroke } => {
                if let Some(color) = tui_color(stroke.color) {
                    for pair in points.windows(2) {
                        let (a, b) = (pair[0], pair[1]);
                        ctx.draw(&CanvasLine::new(a.x, flip(a.y), b.x, flip(b.y), color));
                    }
                }
            }
            DrawOp::FillRect { rect, color } => {
                let backdrop = rect.width >= width * 0.95 && rect.height >= height * 0.95;
                if let (false, Some(color)) = (backdrop, tui_color(*color)) {
                    ctx.draw(&Rectangle {
                        x: rect.x,
                        y: flip(rect.y + rect.height),
                        width: rect.width,
                        height: rect.height,
                        color,
                    });
                }
            }
            DrawOp::Circle {
                center,
                radius,
                fill,
                stroke,
            } => {
                let color = stroke.map(|s| s.color).or(*fill).and_then(tui_color);
                if let Some(color) = color {
                    ctx.draw(&Circle {
                        x: center.x,
                        y: flip(center.y),
                        radius: *radius,
                        color,
                    });
                }
            }
            DrawOp::Text { at, text, style } => {
                let Some(color) = tui_color(style.color) else {
                    continue;
                };
                let span_w = text.chars().count() as f64 * cell_w;
                let x = match style.align {
                    Align::Left => at.x,
                    Align::Center => at.x - span_w / 2.0,
                    Align::Right => at.x - span_w,
                };
                ctx.print(
                    x.max(0.0),
                    flip(at.y),
                    Span::styled(text.clone(), Style::default().fg(color)),
                );
            }
        }
    }
}

/// Terminal color for a surface color, or `None` when too faint to show.
pub fn tui_color(c: studioscope_core::Color) -> Option<Color> {
    (c.a >= MIN_ALPHA).then_some(Color::Rgb(c.r, c.g, c.b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use studioscope_core::{StudioConfig, build, widget_names};

    #[test]
    fn faint_colors_are_dropped() {
        assert_eq!(tui_color(studioscope_core::Color::rgba(1, 2, 3, 10)), None);
        assert_eq!(
            tui_color(studioscope_core::Color::rgb(1, 2, 3)),
            Some(Color::Rgb(1, 2, 3))
        );
    }

    #[test]
    fn every_widget_renders_into_a_terminal() {
        for name in widget_names() {
            let app = App::new(build(name).unwrap(), StudioConfig::default());
            let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
            terminal.draw(|f| draw(f, &app)).unwrap();
            let buffer = terminal.backend().buffer().clone();
            let title: String = (0..buffer.area.width)
                .map(|x| buffer[(x, 0)].symbol().to_string())
                .collect();
            assert!(title.contains(name), "{name} missing from title: {title}");
        }
    }

    #[test]
    fn tiny_terminal_does_not_panic() {
        let app = App::new(build("chess").unwrap(), StudioConfig::default());
        let mut terminal = Terminal::new(TestBackend::new(10, 5)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
    }
}
