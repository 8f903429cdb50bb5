//! Scripted signal-bot chat.
//!
//! A Telegram-style conversation plays out message by message: a typing
//! indicator (Processing) precedes each bubble sliding in (Active). The full
//! thread then rests (Holding) before the script restarts.

use crate::clock::Tick;
use crate::draw::{
    Align, Canvas, Point, Rect, Size, TextStyle, ease_out_cubic, lerp, palette, pulse,
};
use crate::phase::{Phase, PhaseSpan, PhaseState, PhaseTimeline};
use crate::visualization::{FrameContext, Page, Visualization, WidgetInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    pub from: Sender,
    pub text: &'static str,
}

const fn msg(from: Sender, text: &'static str) -> Message {
    Message { from, text }
}

pub const SCRIPT: [Message; 6] = [
    msg(Sender::User, "/SIGNAL EPL"),
    msg(Sender::Bot, "ARSENAL V CHELSEA"),
    msg(Sender::Bot, "BACK HOME @ 2.10 EDGE +4.2%"),
    msg(Sender::User, "STAKE?"),
    msg(Sender::Bot, "KELLY 1/4: 1.8% BANK"),
    msg(Sender::User, "PLACED"),
];

pub const REVEAL_MS: f64 = 700.0;
pub const HOLD_MS: f64 = 3000.0;

/// Typing time scales with message length.
pub fn typing_ms(message: &Message) -> f64 {
    let base = match message.from {
        Sender::User => 300.0,
        Sender::Bot => 600.0,
    };
    base + 25.0 * message.text.len() as f64
}

pub struct SignalChat {
    info: WidgetInfo,
    timeline: PhaseTimeline,
    /// Messages fully shown.
    shown: usize,
    /// Message being typed or revealed.
    pending: Option<usize>,
    size: Size,
}

impl SignalChat {
    pub fn new() -> Self {
        let mut spans = Vec::with_capacity(SCRIPT.len() * 2 + 1);
        for m in &SCRIPT {
            spans.push(PhaseSpan::new(Phase::Processing, typing_ms(m)));
            spans.push(PhaseSpan::new(Phase::Active, REVEAL_MS));
        }
        spans.push(PhaseSpan::new(Phase::Holding, HOLD_MS));
        Self {
            info: WidgetInfo {
                name: "chat",
                description: "Telegram-style signal bot conversation",
                page: Page::Betting,
                triggered: false,
            },
            timeline: PhaseTimeline::new(spans),
            shown: 0,
            pending: None,
            size: Size::default(),
        }
    }

    /// Messages completely visible after the last `advance`.
    pub fn shown(&self) -> usize {
        self.shown
    }

    fn bubble(&self, message: &Message, bottom: f64, text_size: f64) -> Rect {
        let pad = text_size * 0.6;
        let w = (message.text.len() as f64 * text_size * 0.8 + 2.0 * pad)
            .min(self.size.width * 0.8);
        let h = text_size + 2.0 * pad;
        let margin = self.size.width * 0.05;
        let x = match message.from {
            Sender::User => self.size.width - margin - w,
            Sender::Bot => margin,
        };
        Rect::new(x, bottom - h, w, h)
    }
}

impl Default for SignalChat {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for SignalChat {
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
        let (index, state) = self.timeline.locate(tick.elapsed_ms);
        let message = index / 2;
        if message >= SCRIPT.len() {
            self.shown = SCRIPT.len();
            self.pending = None;
        } else {
            self.shown = message;
            self.pending = Some(message);
        }
        state
    }

    fn draw(&self, canvas: &mut dyn Canvas, frame: &FrameContext) {
        super::backdrop(canvas, frame.size);
        let state = frame.state;
        let text_size = (self.size.height / 24.0).clamp(3.0, 8.0);
        let gap = text_size * 0.8;

        // Newest at the bottom; older bubbles scroll up.
        let mut items: Vec<(usize, f64)> = (0..self.shown).map(|i| (i, 1.0)).collect();
        let mut typing: Option<Sender> = None;
        if let Some(i) = self.pending {
            match state.phase {
                Phase::Active => items.push((i, ease_out_cubic(state.progress))),
                _ => typing = Some(SCRIPT[i].from),
            }
        }

        let mut bottom = self.size.height - gap;
        if let Some(from) = typing {
            let dots = Rect::new(0.0, 0.0, text_size * 4.0, text_size * 2.0);
            let x = match from {
                Sender::User => self.size.width * 0.95 - dots.width,
                Sender::Bot => self.size.width * 0.05,
            };
            let cy = bottom - dots.height / 2.0;
            for k in 0..3 {
                let phase = (state.progress * 3.0 + k as f64 / 3.0).fract();
                canvas.circle(
                    Point::new(x + text_size * (0.8 + 1.2 * k as f64), cy - pulse(phase) * 2.0),
                    text_size * 0.3,
                    Some(palette::MUTED),
                    None,
                );
            }
            bottom -= dots.height + gap;
        }

        for &(i, t) in items.iter().rev() {
            if bottom < 0.0 {
                break;
            }
            let m = &SCRIPT[i];
            let mut r = self.bubble(m, bottom, text_size);
            let slide = (1.0 - t) * text_size * 2.0;
            r.y += slide;
            let (fill, ink) = match m.from {
                Sender::User => (palette::CYAN, palette::BACKGROUND),
                Sender::Bot => (palette::BACKGROUND_TOP, palette::TEXT),
            };
            canvas.fill_rect(r, fill.with_opacity(lerp(0.0, 0.9, t)));
            canvas.text(
                Point::new(r.x + r.width / 2.0, r.y + text_size * 0.6),
                m.text,
                &TextStyle::new(ink.with_opacity(t), text_size).align(Align::Center),
            );
            bottom = r.y - gap - slide;
        }
    }
}
