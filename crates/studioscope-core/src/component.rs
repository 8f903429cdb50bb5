//! Mounted widget instance.
//!
//! A [`Component`] ties one [`Visualization`] to a host surface and to exactly
//! one frame loop:
//!
//! - `mount` attaches to the surface (weakly: the host owns it), lays the
//!   widget out and starts the loop.
//! - `resize` clamps the size, resizes the surface, re-lays out the widget and
//!   restarts the loop, cancelling the previous one first.
//! - `unmount` (or dropping the component) cancels the loop, drops the clock
//!   and releases the surface.
//!
//! If the surface disappears while the loop is live, frames are skipped
//! silently.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::clock::AnimationClock;
use crate::draw::{Canvas, Size};
use crate::generator::{Generator, Liveliness};
use crate::phase::PhaseState;
use crate::scheduler::{FrameDriver, LoopHandle};
use crate::visualization::{FrameContext, Visualization};

struct Shared<C> {
    widget: RefCell<Box<dyn Visualization>>,
    surface: RefCell<Weak<RefCell<C>>>,
    clock: Cell<Option<AnimationClock>>,
    frames: Cell<u64>,
    skipped: Cell<u64>,
    last_state: Cell<PhaseState>,
    generator: Generator,
    liveliness: Liveliness,
}

impl<C: Canvas> Shared<C> {
    fn frame(&self, timestamp_ms: f64) {
        let Some(surface) = self.surface.borrow().upgrade() else {
            self.skip("surface released");
            return;
        };
        let Ok(mut canvas) = surface.try_borrow_mut() else {
            self.skip("surface busy");
            return;
        };
        let Ok(mut widget) = self.widget.try_borrow_mut() else {
            self.skip("widget busy");
            return;
        };

        let clock = match self.clock.get() {
            Some(clock) => clock,
            None => {
                let clock = AnimationClock::new(timestamp_ms, widget.cycle_ms());
                self.clock.set(Some(clock));
                clock
            }
        };

        let tick = clock.tick(timestamp_ms, self.frames.get());
        let state = widget.advance(&tick);
        let frame = FrameContext {
            tick,
            state,
            size: canvas.size(),
            generator: self.generator,
            liveliness: self.liveliness,
        };
        widget.draw(&mut *canvas, &frame);

        self.frames.set(self.frames.get() + 1);
        self.last_state.set(state);
    }

    fn skip(&self, why: &str) {
        self.skipped.set(self.skipped.get() + 1);
        log::trace!("skipping frame: {why}");
    }
}

/// One mounted visualization with its own loop, clock and surface handle.
pub struct Component<C: Canvas + 'static> {
    name: &'static str,
    shared: Rc<Shared<C>>,
    handle: Option<LoopHandle>,
}

impl<C: Canvas + 'static> Component<C> {
    pub fn new(widget: Box<dyn Visualization>, generator: Generator, liveliness: Liveliness) -> Self {
        Self {
            name: widget.name(),
            shared: Rc::new(Shared {
                widget: RefCell::new(widget),
                surface: RefCell::new(Weak::new()),
                clock: Cell::new(None),
                frames: Cell::new(0),
                skipped: Cell::new(0),
                last_state: Cell::new(PhaseState::default()),
                generator,
                liveliness,
            }),
            handle: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Attach to `surface` and start the frame loop.
    ///
    /// Mounting an already mounted component re-attaches and restarts it.
    pub fn mount(&mut self, driver: &mut dyn FrameDriver, surface: &Rc<RefCell<C>>) {
        *self.shared.surface.borrow_mut() = Rc::downgrade(surface);
        let size = match surface.try_borrow() {
            Ok(s) => s.size(),
            Err(_) => Size::default(),
        };
        self.shared.widget.borrow_mut().layout(size.clamped());
        log::debug!("mounted {} at {}x{}", self.name, size.width, size.height);
        self.restart(driver);
    }

    /// Apply a host resize and restart the loop with fresh geometry.
    ///
    /// The clock survives so the animation continues where it was.
    pub fn resize(&mut self, driver: &mut dyn FrameDriver, size: Size) {
        if size.is_degenerate() {
            log::warn!(
                "{}: degenerate size {}x{}, clamping",
                self.name,
                size.width,
                size.height
            );
        }
        let size = size.clamped();
        if let Some(surface) = self.shared.surface.borrow().upgrade() {
            if let Ok(mut s) = surface.try_borrow_mut() {
                s.resize(size);
            }
        }
        self.shared.widget.borrow_mut().layout(size);
        log::debug!("resized {} to {}x{}", self.name, size.width, size.height);
        if self.handle.is_some() {
            self.restart(driver);
        }
    }

    /// Cancel the loop, drop the clock and release the surface.
    pub fn unmount(&mut self, driver: &mut dyn FrameDriver) {
        if let Some(handle) = self.handle.take() {
            driver.stop(handle);
        }
        self.shared.clock.set(None);
        *self.shared.surface.borrow_mut() = Weak::new();
        log::debug!("unmounted {}", self.name);
    }

    /// Restart from the beginning of the cycle on the next frame.
    pub fn rewind(&mut self) {
        self.shared.clock.set(None);
    }

    pub fn is_mounted(&self) -> bool {
        self.handle.as_ref().is_some_and(LoopHandle::is_live)
    }

    /// Frames drawn since creation.
    pub fn frames(&self) -> u64 {
        self.shared.frames.get()
    }

    /// Frames skipped because the surface was unavailable.
    pub fn skipped(&self) -> u64 {
        self.shared.skipped.get()
    }

    /// Phase computed for the most recent frame.
    pub fn last_state(&self) -> PhaseState {
        self.shared.last_state.get()
    }

    pub fn clock(&self) -> Option<AnimationClock> {
        self.shared.clock.get()
    }

    fn restart(&mut self, driver: &mut dyn FrameDriver) {
        if let Some(old) = self.handle.take() {
            driver.stop(old);
        }
        let shared = Rc::clone(&self.shared);
        self.handle = Some(driver.start(Box::new(move |ts| shared.frame(ts))));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Tick;
    use crate::draw::{Recorder, palette};
    use crate::phase::Phase;
    use crate::scheduler::ManualDriver;
    use crate::visualization::{Page, WidgetInfo};

    struct Probe {
        info: WidgetInfo,
        layouts: Rc<Cell<u32>>,
    }

    impl Visualization for Probe {
        fn info(&self) -> &WidgetInfo {
            &self.info
        }
        fn cycle_ms(&self) -> f64 {
            1000.0
        }
        fn layout(&mut self, _size: Size) {
            self.layouts.set(self.layouts.get() + 1);
        }
        fn advance(&mut self, tick: &Tick) -> PhaseState {
            PhaseState::new(Phase::Active, tick.cycle_progress)
        }
        fn draw(&self, canvas: &mut dyn Canvas, _frame: &FrameContext) {
            canvas.clear(palette::BACKGROUND);
        }
    }

    fn probe() -> (Box<dyn Visualization>, Rc<Cell<u32>>) {
        let layouts = Rc::new(Cell::new(0));
        let widget = Probe {
            info: WidgetInfo {
                name: "probe",
                description: "test probe",
                page: Page::Home,
                triggered: false,
            },
            layouts: layouts.clone(),
        };
        (Box::new(widget), layouts)
    }

    fn setup() -> (ManualDriver, Rc<RefCell<Recorder>>, Component<Recorder>, Rc<Cell<u32>>) {
        let driver = ManualDriver::new();
        let surface = Rc::new(RefCell::new(Recorder::new(Size::new(200.0, 100.0))));
        let (widget, layouts) = probe();
        let component = Component::new(widget, Generator::new(1), Liveliness::OFF);
        (driver, surface, component, layouts)
    }

    #[test]
    fn clock_starts_on_first_frame() {
        let (mut driver, surface, mut c, _) = setup();
        c.mount(&mut driver, &surface);
        assert!(c.clock().is_none());
        driver.tick(5000.0);
        driver.tick(5250.0);
        assert_eq!(c.clock().map(|k| k.start_ms()), Some(5000.0));
        assert!((c.last_state().progress - 0.25).abs() < 1e-12);
    }

    #[test]
    fn unmount_stops_drawing() {
        let (mut driver, surface, mut c, _) = setup();
        c.mount(&mut driver, &surface);
        driver.tick(0.0);
        c.unmount(&mut driver);
        let calls = surface.borrow().total_calls();
        driver.tick(16.0);
        assert_eq!(surface.borrow().total_calls(), calls);
        assert!(!c.is_mounted());
        assert!(c.clock().is_none());
    }

    #[test]
    fn released_surface_skips_frames() {
        let (mut driver, surface, mut c, _) = setup();
        c.mount(&mut driver, &surface);
        drop(surface);
        driver.tick(0.0);
        assert_eq!(c.frames(), 0);
        assert_eq!(c.skipped(), 1);
    }

    #[test]
    fn resize_relayouts_and_keeps_single_loop() {
        let (mut driver, surface, mut c, layouts) = setup();
        c.mount(&mut driver, &surface);
        c.resize(&mut driver, Size::new(0.0, 0.0));
        assert_eq!(driver.live_loops(), 1);
        assert_eq!(layouts.get(), 2);
        assert_eq!(surface.borrow().size(), Size::new(16.0, 16.0));
    }

    #[test]
    fn resize_before_mount_does_not_start_a_loop() {
        let (mut driver, _surface, mut c, _) = setup();
        c.resize(&mut driver, Size::new(50.0, 50.0));
        assert_eq!(driver.live_loops(), 0);
    }

    #[test]
    fn drop_cancels_loop() {
        let (mut driver, surface, mut c, _) = setup();
        c.mount(&mut driver, &surface);
        drop(c);
        assert_eq!(driver.live_loops(), 0);
        driver.tick(0.0);
        assert_eq!(surface.borrow().total_calls(), 0);
    }

    #[test]
    fn rewind_restarts_clock() {
        let (mut driver, surface, mut c, _) = setup();
        c.mount(&mut driver, &surface);
        driver.tick(100.0);
        c.rewind();
        driver.tick(900.0);
        assert_eq!(c.clock().map(|k| k.start_ms()), Some(900.0));
    }
}
