//! Phase state machines.
//!
//! Two shapes cover every widget:
//!
//! - [`PhaseTimeline`]: phases derived purely from cycle-relative elapsed time
//!   (e.g. `elapsed < 5500` → Scanning, else Revealed).
//! - [`TriggeredPhases`]: phases advanced by external trigger events, usually
//!   emitted by a per-instance [`Ticker`]. Each phase carries a dwell time so
//!   its progress is time-boxed and saturates at 1 until the next trigger.
//!
//! Neither machine has a terminal state; cycles repeat while mounted.

use crate::clock::MIN_CYCLE_MS;

/// Named stage of an animation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    Scanning,
    Revealed,
    #[default]
    Idle,
    Processing,
    Active,
    Drawing,
    Holding,
    Fading,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scanning => write!(f, "scanning"),
            Self::Revealed => write!(f, "revealed"),
            Self::Idle => write!(f, "idle"),
            Self::Processing => write!(f, "processing"),
            Self::Active => write!(f, "active"),
            Self::Drawing => write!(f, "drawing"),
            Self::Holding => write!(f, "holding"),
            Self::Fading => write!(f, "fading"),
        }
    }
}

/// Current phase plus progress through it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhaseState {
    pub phase: Phase,
    /// Position inside the phase, always within `[0, 1]`.
    pub progress: f64,
}

impl PhaseState {
    pub fn new(phase: Phase, progress: f64) -> Self {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        Self { phase, progress }
    }

    pub fn is(&self, phase: Phase) -> bool {
        self.phase == phase
    }
}

/// One phase with its duration in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseSpan {
    pub phase: Phase,
    pub duration_ms: f64,
}

impl PhaseSpan {
    pub const fn new(phase: Phase, duration_ms: f64) -> Self {
        Self { phase, duration_ms }
    }
}

fn sanitize(spans: Vec<PhaseSpan>) -> Vec<PhaseSpan> {
    if spans.is_empty() {
        log::warn!("empty phase list, falling back to a single idle phase");
        return vec![PhaseSpan::new(Phase::Idle, 1000.0)];
    }
    spans
        .into_iter()
        .map(|s| PhaseSpan {
            phase: s.phase,
            duration_ms: if s.duration_ms.is_finite() {
                s.duration_ms.max(MIN_CYCLE_MS)
            } else {
                MIN_CYCLE_MS
            },
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Elapsed-time driven
// ---------------------------------------------------------------------------

/// Ordered phases whose total duration is one animation cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseTimeline {
    spans: Vec<PhaseSpan>,
    total_ms: f64,
}

impl PhaseTimeline {
    pub fn new(spans: Vec<PhaseSpan>) -> Self {
        let spans = sanitize(spans);
        let total_ms = spans.iter().map(|s| s.duration_ms).sum();
        Self { spans, total_ms }
    }

    /// Total cycle length.
    pub fn cycle_ms(&self) -> f64 {
        self.total_ms
    }

    pub fn spans(&self) -> &[PhaseSpan] {
        &self.spans
    }

    /// Phase and progress at a cycle-relative elapsed time.
    pub fn at(&self, elapsed_ms: f64) -> PhaseState {
        self.locate(elapsed_ms).1
    }

    /// Like [`at`](Self::at) but also returns the index of the active span.
    ///
    /// Elapsed times before zero map to the first span at progress 0; times at
    /// or past the cycle end map to the last span at progress 1.
    pub fn locate(&self, elapsed_ms: f64) -> (usize, PhaseState) {
        let last = self.spans.len() - 1;
        if elapsed_ms.is_nan() || elapsed_ms <= 0.0 {
            return (0, PhaseState::new(self.spans[0].phase, 0.0));
        }
        let mut start = 0.0;
        for (i, span) in self.spans.iter().enumerate() {
            let end = start + span.duration_ms;
            if elapsed_ms < end {
                let p = (elapsed_ms - start) / span.duration_ms;
                return (i, PhaseState::new(span.phase, p));
            }
            start = end;
        }
        (last, PhaseState::new(self.spans[last].phase, 1.0))
    }
}

// ---------------------------------------------------------------------------
// Trigger driven
// ---------------------------------------------------------------------------

/// Cyclic phase order advanced by [`trigger`](Self::trigger).
#[derive(Debug, Clone, PartialEq)]
pub struct TriggeredPhases {
    spans: Vec<PhaseSpan>,
    current: usize,
    entered_ms: f64,
    transitions: u64,
}

impl TriggeredPhases {
    pub fn new(spans: Vec<PhaseSpan>, now_ms: f64) -> Self {
        Self {
            spans: sanitize(spans),
            current: 0,
            entered_ms: now_ms,
            transitions: 0,
        }
    }

    /// Advance to the next phase (wrapping) and return it.
    pub fn trigger(&mut self, now_ms: f64) -> Phase {
        self.current = (self.current + 1) % self.spans.len();
        self.entered_ms = now_ms;
        self.transitions += 1;
        self.spans[self.current].phase
    }

    /// Return to the first phase and clear the transition count.
    pub fn reset(&mut self, now_ms: f64) {
        self.current = 0;
        self.entered_ms = now_ms;
        self.transitions = 0;
    }

    pub fn phase(&self) -> Phase {
        self.spans[self.current].phase
    }

    pub fn index(&self) -> usize {
        self.current
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Current phase with time-boxed progress.
    pub fn state(&self, now_ms: f64) -> PhaseState {
        let span = self.spans[self.current];
        PhaseState::new(span.phase, (now_ms - self.entered_ms) / span.duration_ms)
    }
}

/// Periodic timer owned by one component instance.
///
/// The first poll arms the timer. When a host stalls (background tab,
/// suspended terminal) the ticker fires once and resynchronises instead of
/// replaying every missed interval.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticker {
    interval_ms: f64,
    next_due_ms: Option<f64>,
}

impl Ticker {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms: interval_ms.max(MIN_CYCLE_MS),
            next_due_ms: None,
        }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Returns `true` when an interval elapsed since the previous firing.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        let Some(due) = self.next_due_ms else {
            self.next_due_ms = Some(now_ms + self.interval_ms);
            return false;
        };
        if now_ms < due {
            return false;
        }
        let next = due + self.interval_ms;
        self.next_due_ms = Some(if now_ms >= next {
            now_ms + self.interval_ms
        } else {
            next
        });
        true
    }

    pub fn disarm(&mut self) {
        self.next_due_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> PhaseTimeline {
        PhaseTimeline::new(vec![
            PhaseSpan::new(Phase::Scanning, 5500.0),
            PhaseSpan::new(Phase::Revealed, 3500.0),
        ])
    }

    #[test]
    fn timeline_thresholds() {
        let t = scanner();
        assert_eq!(t.cycle_ms(), 9000.0);
        assert_eq!(t.at(0.0), PhaseState::new(Phase::Scanning, 0.0));
        assert_eq!(t.at(5500.0).phase, Phase::Revealed);
        assert_eq!(t.at(5500.0).progress, 0.0);
        assert_eq!(t.at(9000.0), PhaseState::new(Phase::Revealed, 1.0));
        assert_eq!(t.at(1e9), PhaseState::new(Phase::Revealed, 1.0));
        assert_eq!(t.at(-3.0), PhaseState::new(Phase::Scanning, 0.0));
    }

    #[test]
    fn locate_reports_span_index() {
        let t = PhaseTimeline::new(vec![
            PhaseSpan::new(Phase::Processing, 100.0),
            PhaseSpan::new(Phase::Holding, 100.0),
            PhaseSpan::new(Phase::Processing, 100.0),
        ]);
        assert_eq!(t.locate(150.0).0, 1);
        assert_eq!(t.locate(250.0).0, 2);
    }

    #[test]
    fn empty_timeline_falls_back_to_idle() {
        let t = PhaseTimeline::new(Vec::new());
        assert_eq!(t.at(10.0).phase, Phase::Idle);
    }

    #[test]
    fn zero_duration_spans_are_clamped() {
        let t = PhaseTimeline::new(vec![PhaseSpan::new(Phase::Active, 0.0)]);
        assert_eq!(t.cycle_ms(), MIN_CYCLE_MS);
    }

    #[test]
    fn phase_state_clamps_progress() {
        assert_eq!(PhaseState::new(Phase::Idle, 2.0).progress, 1.0);
        assert_eq!(PhaseState::new(Phase::Idle, -1.0).progress, 0.0);
        assert_eq!(PhaseState::new(Phase::Idle, f64::NAN).progress, 0.0);
    }

    #[test]
    fn triggered_phases_cycle_and_saturate() {
        let mut m = TriggeredPhases::new(
            vec![
                PhaseSpan::new(Phase::Idle, 400.0),
                PhaseSpan::new(Phase::Processing, 800.0),
                PhaseSpan::new(Phase::Active, 600.0),
            ],
            0.0,
        );
        assert_eq!(m.state(200.0), PhaseState::new(Phase::Idle, 0.5));
        assert_eq!(m.state(5000.0).progress, 1.0);
        assert_eq!(m.trigger(1000.0), Phase::Processing);
        assert_eq!(m.state(1400.0), PhaseState::new(Phase::Processing, 0.5));
        assert_eq!(m.trigger(2000.0), Phase::Active);
        assert_eq!(m.trigger(3000.0), Phase::Idle);
        assert_eq!(m.transitions(), 3);
    }

    #[test]
    fn reset_returns_to_first_phase_and_clears_count() {
        let mut m = TriggeredPhases::new(
            vec![
                PhaseSpan::new(Phase::Idle, 400.0),
                PhaseSpan::new(Phase::Active, 600.0),
            ],
            0.0,
        );
        m.trigger(100.0);
        m.trigger(200.0);
        m.trigger(300.0);
        assert_eq!(m.phase(), Phase::Active);
        m.reset(1000.0);
        assert_eq!(m.phase(), Phase::Idle);
        assert_eq!(m.transitions(), 0);
        assert_eq!(m.state(1200.0), PhaseState::new(Phase::Idle, 0.5));
    }

    #[test]
    fn ticker_arms_then_fires_each_interval() {
        let mut t = Ticker::new(100.0);
        assert!(!t.poll(0.0));
        assert!(!t.poll(99.0));
        assert!(t.poll(100.0));
        assert!(!t.poll(150.0));
        assert!(t.poll(205.0));
    }

    #[test]
    fn ticker_resyncs_after_stall() {
        let mut t = Ticker::new(100.0);
        t.poll(0.0);
        assert!(t.poll(1000.0));
        assert!(!t.poll(1050.0));
        assert!(t.poll(1100.0));
    }
}
