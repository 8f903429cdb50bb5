//! Animated chess board.
//!
//! Replays a fixed opening in coordinate notation. Each ply slides the piece
//! (Processing) then rests with the move highlighted (Holding); after the
//! last ply the final evaluation is shown (Revealed) and the game restarts.

use crate::clock::Tick;
use crate::draw::{
    Align, Canvas, Color, Point, Rect, Size, Stroke, TextStyle, ease_in_out, lerp, palette, pulse,
};
use crate::phase::{Phase, PhaseSpan, PhaseState, PhaseTimeline};
use crate::visualization::{FrameContext, Page, Visualization, WidgetInfo};

pub const MOVE_MS: f64 = 700.0;
pub const HOLD_MS: f64 = 500.0;
pub const FINAL_MS: f64 = 2500.0;

/// Italian game, castled, ending with the exchange on f6.
pub const MOVES: [&str; 14] = [
    "e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "f8c5", "e1g1", "g8f6", "d2d3", "d7d6", "c1g5",
    "h7h6", "g5f6", "d8f6",
];

/// Engine evaluation (pawns, white's view) after each ply.
pub const EVALS: [f64; 14] = [
    0.3, 0.2, 0.3, 0.3, 0.4, 0.3, 0.4, 0.4, 0.3, 0.3, 0.5, 0.4, 0.2, 0.3,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    White,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub side: Side,
    pub kind: Kind,
}

impl Piece {
    pub const fn new(side: Side, kind: Kind) -> Self {
        Self { side, kind }
    }

    /// FEN-style letter: uppercase for white.
    pub fn symbol(&self) -> char {
        let c = match self.kind {
            Kind::King => 'k',
            Kind::Queen => 'q',
            Kind::Rook => 'r',
            Kind::Bishop => 'b',
            Kind::Knight => 'n',
            Kind::Pawn => 'p',
        };
        match self.side {
            Side::White => c.to_ascii_uppercase(),
            Side::Black => c,
        }
    }
}

/// `(file, rank)`, both `0..8`; `(0, 0)` is a1.
pub type Square = (usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub from: Square,
    pub to: Square,
}

impl Move {
    /// Parse `e2e4`-style coordinate notation.
    pub fn parse(text: &str) -> Option<Move> {
        let b = text.as_bytes();
        if b.len() != 4 {
            return None;
        }
        let square = |f: u8, r: u8| -> Option<Square> {
            let file = f.checked_sub(b'a').filter(|v| *v < 8)?;
            let rank = r.checked_sub(b'1').filter(|v| *v < 8)?;
            Some((file as usize, rank as usize))
        };
        Some(Move {
            from: square(b[0], b[1])?,
            to: square(b[2], b[3])?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    squares: [[Option<Piece>; 8]; 8],
}

impl Board {
    pub fn initial() -> Self {
        use Kind::*;
        let back = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];
        let mut squares = [[None; 8]; 8];
        for (file, kind) in back.iter().enumerate() {
            squares[0][file] = Some(Piece::new(Side::White, *kind));
            squares[1][file] = Some(Piece::new(Side::White, Pawn));
            squares[6][file] = Some(Piece::new(Side::Black, Pawn));
            squares[7][file] = Some(Piece::new(Side::Black, *kind));
        }
        Self { squares }
    }

    pub fn at(&self, (file, rank): Square) -> Option<Piece> {
        self.squares.get(rank)?.get(file).copied().flatten()
    }

    fn set(&mut self, (file, rank): Square, piece: Option<Piece>) {
        self.squares[rank][file] = piece;
    }

    /// Play `mv`, returning the captured piece. A king moving two files also
    /// moves the matching rook. Moves from an empty square are ignored.
    pub fn apply(&mut self, mv: Move) -> Option<Piece> {
        let piece = self.at(mv.from)?;
        let captured = self.at(mv.to);
        self.set(mv.from, None);
        self.set(mv.to, Some(piece));
        if piece.kind == Kind::King && mv.from.0.abs_diff(mv.to.0) == 2 {
            let rank = mv.from.1;
            let (rook_from, rook_to) = if mv.to.0 > mv.from.0 { (7, 5) } else { (0, 3) };
            let rook = self.at((rook_from, rank));
            self.set((rook_from, rank), None);
            self.set((rook_to, rank), rook);
        }
        captured
    }

    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.squares.iter().enumerate().flat_map(|(rank, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(file, p)| p.map(|p| ((file, rank), p)))
        })
    }
}

/// Where the replay is within the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Cursor {
    /// Plies fully applied to the displayed board.
    applied: usize,
    /// Ply currently sliding, if any.
    moving: Option<usize>,
}

pub struct ChessBoard {
    info: WidgetInfo,
    timeline: PhaseTimeline,
    moves: Vec<Move>,
    /// `positions[k]` is the board after `k` plies.
    positions: Vec<Board>,
    cursor: Cursor,
    board: Rect,
    bar: Rect,
}

impl ChessBoard {
    pub fn new() -> Self {
        let moves: Vec<Move> = MOVES.iter().filter_map(|m| Move::parse(m)).collect();
        let mut positions = vec![Board::initial()];
        let mut board = Board::initial();
        for mv in &moves {
            if let Some(taken) = board.apply(*mv) {
                log::trace!("{} captured", taken.symbol());
            }
            positions.push(board.clone());
        }

        let mut spans = Vec::with_capacity(moves.len() * 2 + 1);
        for _ in &moves {
            spans.push(PhaseSpan::new(Phase::Processing, MOVE_MS));
            spans.push(PhaseSpan::new(Phase::Holding, HOLD_MS));
        }
        spans.push(PhaseSpan::new(Phase::Revealed, FINAL_MS));

        let mut widget = Self {
            info: WidgetInfo {
                name: "chess",
                description: "Opening replay with sliding pieces and an evaluation bar",
                page: Page::Chess,
                triggered: false,
            },
            timeline: PhaseTimeline::new(spans),
            moves,
            positions,
            cursor: Cursor::default(),
            board: Rect::new(0.0, 0.0, 1.0, 1.0),
            bar: Rect::new(0.0, 0.0, 1.0, 1.0),
        };
        widget.layout(Size::default());
        widget
    }

    /// Board after `plies` half-moves (clamped to the script length).
    pub fn position(&self, plies: usize) -> &Board {
        &self.positions[plies.min(self.positions.len() - 1)]
    }

    pub fn plies_applied(&self) -> usize {
        self.cursor.applied
    }

    fn square_rect(&self, (file, rank): Square) -> Rect {
        let s = self.board.width / 8.0;
        Rect::new(
            self.board.x + file as f64 * s,
            self.board.y + (7 - rank) as f64 * s,
            s,
            s,
        )
    }

    fn draw_piece(&self, canvas: &mut dyn Canvas, at: Point, piece: Piece) {
        let s = self.board.width / 8.0;
        let (fill, ink): (Color, Color) = match piece.side {
            Side::White => (palette::TEXT, palette::BACKGROUND),
            Side::Black => (palette::BACKGROUND, palette::TEXT),
        };
        canvas.circle(at, s * 0.36, Some(fill), Some(&Stroke::new(palette::MUTED, 1.0)));
        let glyph = piece.symbol().to_ascii_uppercase().to_string();
        let size = (s * 0.4).max(3.0);
        canvas.text(
            Point::new(at.x, at.y - size / 2.0),
            &glyph,
            &TextStyle::new(ink, size).align(Align::Center),
        );
    }
}

impl Default for ChessBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for ChessBoard {
    fn info(&self) -> &WidgetInfo {
        &self.info
    }

    fn cycle_ms(&self) -> f64 {
        self.timeline.cycle_ms()
    }

    fn layout(&mut self, size: Size) {
        let edge = (size.min_edge() * 0.9).min(size.width * 0.8);
        let x = (size.width - edge) / 2.0;
        let y = (size.height - edge) / 2.0;
        self.board = Rect::new(x, y, edge, edge);
        let bar_w = (edge * 0.05).max(2.0);
        self.bar = Rect::new(x + edge + bar_w, y, bar_w, edge);
    }

    fn advance(&mut self, tick: &Tick) -> PhaseState {
        let (index, state) = self.timeline.locate(tick.elapsed_ms);
        let ply = index / 2;
        self.cursor = if ply >= self.moves.len() {
            Cursor {
                applied: self.moves.len(),
                moving: None,
            }
        } else if state.is(Phase::Processing) {
            Cursor {
                applied: ply,
                moving: Some(ply),
            }
        } else {
            Cursor {
                applied: ply + 1,
                moving: None,
            }
        };
        state
    }

    fn draw(&self, canvas: &mut dyn Canvas, frame: &FrameContext) {
        super::backdrop(canvas, frame.size);
        let state = frame.state;

        for rank in 0..8 {
            for file in 0..8 {
                let color = if (file + rank) % 2 == 1 {
                    palette::LIGHT_SQUARE
                } else {
                    palette::DARK_SQUARE
                };
                canvas.fill_rect(self.square_rect((file, rank)), color);
            }
        }

        let last = self.cursor.applied.checked_sub(1).map(|i| self.moves[i]);
        if let Some(mv) = last {
            let hold = if state.is(Phase::Holding) {
                1.0 - state.progress * 0.5
            } else {
                0.5
            };
            for sq in [mv.from, mv.to] {
                canvas.fill_rect(self.square_rect(sq), palette::AMBER.with_opacity(0.35 * hold));
            }
        }

        let board = self.position(self.cursor.applied);
        let sliding = self.cursor.moving.map(|i| self.moves[i]);
        for (sq, piece) in board.pieces() {
            if sliding.is_some_and(|mv| mv.from == sq) {
                continue;
            }
            self.draw_piece(canvas, self.square_rect(sq).center(), piece);
        }
        if let Some(mv) = sliding {
            if let Some(piece) = board.at(mv.from) {
                let t = ease_in_out(state.progress);
                let at = self
                    .square_rect(mv.from)
                    .center()
                    .lerp(self.square_rect(mv.to).center(), t);
                self.draw_piece(canvas, at, piece);
            }
        }

        // Evaluation bar: white share grows from the bottom.
        let eval = self
            .cursor
            .applied
            .checked_sub(1)
            .map_or(0.0, |i| EVALS[i.min(EVALS.len() - 1)]);
        let white = 1.0 / (1.0 + (-eval * 0.8).exp());
        canvas.fill_rect(self.bar, palette::BACKGROUND_TOP);
        let h = self.bar.height * white;
        canvas.fill_rect(
            Rect::new(self.bar.x, self.bar.y + self.bar.height - h, self.bar.width, h),
            palette::TEXT,
        );

        if state.is(Phase::Revealed) {
            let glow = pulse((state.progress * 2.0).fract());
            canvas.text(
                Point::new(self.board.center().x, self.board.y + self.board.height + 4.0),
                &format!("EVAL {eval:+.1}"),
                &TextStyle::new(palette::CYAN.with_opacity(lerp(0.6, 1.0, glow)), 6.0)
                    .align(Align::Center),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::AnimationClock;

    fn sq(name: &str) -> Square {
        let b = name.as_bytes();
        ((b[0] - b'a') as usize, (b[1] - b'1') as usize)
    }

    #[test]
    fn every_scripted_move_parses() {
        assert!(MOVES.iter().all(|m| Move::parse(m).is_some()));
        assert_eq!(Move::parse("e2e9"), None);
        assert_eq!(Move::parse("i2e4"), None);
        assert_eq!(Move::parse("e2"), None);
    }

    #[test]
    fn castling_moves_the_rook() {
        let chess = ChessBoard::new();
        let after = chess.position(7);
        assert_eq!(after.at(sq("g1")), Some(Piece::new(Side::White, Kind::King)));
        assert_eq!(after.at(sq("f1")), Some(Piece::new(Side::White, Kind::Rook)));
        assert_eq!(after.at(sq("h1")), None);
        assert_eq!(after.at(sq("e1")), None);
    }

    #[test]
    fn exchange_on_f6() {
        let mut board = ChessBoard::new().position(12).clone();
        let taken = board.apply(Move::parse("g5f6").unwrap());
        assert_eq!(taken, Some(Piece::new(Side::Black, Kind::Knight)));
        let final_board = ChessBoard::new().position(14).clone();
        assert_eq!(final_board.at(sq("f6")), Some(Piece::new(Side::Black, Kind::Queen)));
        assert_eq!(final_board.at(sq("d8")), None);
        // 32 pieces minus the knight and bishop traded on f6.
        assert_eq!(final_board.pieces().count(), 30);
    }

    #[test]
    fn empty_square_moves_are_ignored() {
        let mut board = Board::initial();
        let before = board.clone();
        assert_eq!(board.apply(Move { from: sq("e4"), to: sq("e5") }), None);
        assert_eq!(board, before);
    }

    #[test]
    fn cursor_tracks_plies() {
        let mut chess = ChessBoard::new();
        assert_eq!(chess.cycle_ms(), 14.0 * 1200.0 + 2500.0);
        let clock = AnimationClock::new(0.0, chess.cycle_ms());

        let s = chess.advance(&clock.tick(350.0, 0));
        assert_eq!(s.phase, Phase::Processing);
        assert_eq!(chess.plies_applied(), 0);

        let s = chess.advance(&clock.tick(900.0, 1));
        assert_eq!(s.phase, Phase::Holding);
        assert_eq!(chess.plies_applied(), 1);

        let s = chess.advance(&clock.tick(18_000.0, 2));
        assert_eq!(s.phase, Phase::Revealed);
        assert_eq!(chess.plies_applied(), 14);
    }
}
