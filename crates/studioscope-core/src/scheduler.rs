//! Frame scheduling.
//!
//! A [`FrameDriver`] invokes frame callbacks once per display frame:
//! `start(on_frame) -> LoopHandle`, `stop(handle)`. The handle is a scoped
//! resource; dropping it cancels the loop on every exit path.
//!
//! Cancellation is enforced by a [`Liveness`] guard shared between the handle
//! and the driver. A driver must check the guard immediately before every
//! invocation, so a callback that was already queued when teardown happened
//! fires as a no-op instead of drawing.
//!
//! Everything here is single-threaded: hosts pump frames from one event loop.

use std::cell::Cell;
use std::rc::Rc;

/// Per-frame callback; receives the host's monotonic timestamp in ms.
pub type FrameCallback = Box<dyn FnMut(f64)>;

/// Shared "is this loop still wanted" flag.
#[derive(Debug, Clone)]
pub struct Liveness(Rc<Cell<bool>>);

impl Liveness {
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.get()
    }

    pub fn kill(&self) {
        self.0.set(false);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a running loop. Dropping it cancels the loop.
#[derive(Debug)]
pub struct LoopHandle {
    id: u64,
    liveness: Liveness,
}

impl LoopHandle {
    pub fn new(id: u64, liveness: Liveness) -> Self {
        Self { id, liveness }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_live(&self) -> bool {
        self.liveness.is_alive()
    }

    /// Cancel explicitly; equivalent to dropping the handle.
    pub fn cancel(self) {}
}

impl Drop for LoopHandle {
    fn drop(&mut self) {
        self.liveness.kill();
    }
}

/// Source of display frames.
pub trait FrameDriver {
    /// Begin invoking `on_frame` once per frame until the handle is stopped.
    fn start(&mut self, on_frame: FrameCallback) -> LoopHandle;

    /// Stop a loop. No callback fires for it afterwards.
    fn stop(&mut self, handle: LoopHandle) {
        log::trace!("stopping loop {}", handle.id());
        handle.cancel();
    }
}

struct Slot {
    id: u64,
    liveness: Liveness,
    callback: FrameCallback,
}

/// Host-pumped driver: the host calls [`tick`](Self::tick) once per frame.
///
/// Used by the terminal host, headless capture and tests.
#[derive(Default)]
pub struct ManualDriver {
    slots: Vec<Slot>,
    next_id: u64,
    dispatched: u64,
}

impl ManualDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one frame at `timestamp_ms` to every live loop.
    ///
    /// Returns the number of callbacks invoked.
    pub fn tick(&mut self, timestamp_ms: f64) -> usize {
        self.slots.retain(|s| s.liveness.is_alive());
        let mut invoked = 0;
        for slot in &mut self.slots {
            // A callback earlier in this tick may have torn this loop down.
            if !slot.liveness.is_alive() {
                continue;
            }
            (slot.callback)(timestamp_ms);
            invoked += 1;
        }
        self.dispatched += invoked as u64;
        invoked
    }

    /// Loops that would receive the next frame.
    pub fn live_loops(&self) -> usize {
        self.slots.iter().filter(|s| s.liveness.is_alive()).count()
    }

    /// Total callbacks invoked since creation.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }
}

impl FrameDriver for ManualDriver {
    fn start(&mut self, on_frame: FrameCallback) -> LoopHandle {
        self.next_id += 1;
        let liveness = Liveness::new();
        self.slots.push(Slot {
            id: self.next_id,
            liveness: liveness.clone(),
            callback: on_frame,
        });
        log::trace!("started loop {}", self.next_id);
        LoopHandle::new(self.next_id, liveness)
    }
}

impl std::fmt::Debug for ManualDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualDriver")
            .field("loops", &self.slots.iter().map(|s| s.id).collect::<Vec<_>>())
            .field("dispatched", &self.dispatched)
            .finish()
    }
}
