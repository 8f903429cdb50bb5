//! Cycle clock for frame callbacks.
//!
//! An [`AnimationClock`] is created on the first frame a mounted component
//! receives. Every later frame timestamp is folded into the cycle with
//! `(timestamp - start) mod cycle`, which yields the cycle-relative elapsed
//! time that the phase machines consume.

/// Smallest cycle length accepted by the clock, in milliseconds.
pub const MIN_CYCLE_MS: f64 = 1.0;

/// Start timestamp plus cycle length. Owned by one mounted component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationClock {
    start_ms: f64,
    cycle_ms: f64,
}

impl AnimationClock {
    /// Create a clock anchored at `start_ms`.
    ///
    /// A non-positive or non-finite cycle length is clamped to [`MIN_CYCLE_MS`].
    pub fn new(start_ms: f64, cycle_ms: f64) -> Self {
        let cycle_ms = if cycle_ms.is_finite() && cycle_ms >= MIN_CYCLE_MS {
            cycle_ms
        } else {
            MIN_CYCLE_MS
        };
        Self { start_ms, cycle_ms }
    }

    pub fn start_ms(&self) -> f64 {
        self.start_ms
    }

    pub fn cycle_ms(&self) -> f64 {
        self.cycle_ms
    }

    /// Milliseconds since start, never negative.
    pub fn total_elapsed(&self, timestamp_ms: f64) -> f64 {
        (timestamp_ms - self.start_ms).max(0.0)
    }

    /// Cycle-relative elapsed time in `[0, cycle_ms)`.
    pub fn elapsed(&self, timestamp_ms: f64) -> f64 {
        let e = self.total_elapsed(timestamp_ms).rem_euclid(self.cycle_ms);
        // rem_euclid can round up to the divisor for values just below a multiple.
        if e >= self.cycle_ms { 0.0 } else { e }
    }

    /// Number of completed cycles.
    pub fn cycle_index(&self, timestamp_ms: f64) -> u64 {
        (self.total_elapsed(timestamp_ms) / self.cycle_ms).floor() as u64
    }

    /// Cycle-relative progress in `[0, 1]`.
    pub fn progress(&self, timestamp_ms: f64) -> f64 {
        (self.elapsed(timestamp_ms) / self.cycle_ms).clamp(0.0, 1.0)
    }

    /// Bundle everything a frame needs to know about time.
    pub fn tick(&self, timestamp_ms: f64, frame: u64) -> Tick {
        Tick {
            timestamp_ms,
            total_ms: self.total_elapsed(timestamp_ms),
            elapsed_ms: self.elapsed(timestamp_ms),
            cycle: self.cycle_index(timestamp_ms),
            cycle_progress: self.progress(timestamp_ms),
            frame,
        }
    }
}

/// Per-frame time snapshot handed to visualizations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Raw monotonic timestamp supplied by the host.
    pub timestamp_ms: f64,
    /// Milliseconds since the clock started.
    pub total_ms: f64,
    /// Cycle-relative elapsed time.
    pub elapsed_ms: f64,
    /// Completed cycles.
    pub cycle: u64,
    /// `elapsed_ms / cycle_ms`, clamped to `[0, 1]`.
    pub cycle_progress: f64,
    /// Frames delivered to this component since mount.
    pub frame: u64,
}
