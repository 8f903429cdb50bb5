//! # studioscope-core
//!
//! **Render-loop engine for the studio site's animated widgets.**
//!
//! Every decorative visualization on the site (price scanner, decision field,
//! calibration curve, oblivious tree, ML pipeline, tech orbit, chess board and
//! signal chat) is a scripted, deterministic animation built from the same
//! four pieces:
//!
//! - a frame scheduler ([`FrameDriver`], [`AnimationClock`]) that invokes one
//!   callback per display frame and folds timestamps into a repeating cycle;
//! - a phase state machine ([`PhaseTimeline`], [`TriggeredPhases`]) that maps
//!   elapsed time or trigger events to a named phase and progress;
//! - a seeded procedural generator ([`Generator`]) for reproducible "noise";
//! - a drawing layer ([`Canvas`]) that repaints the full surface each frame.
//!
//! ## Quick Start
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use studioscope_core::{Component, Generator, Liveliness, ManualDriver, Recorder, Size, widgets};
//!
//! let mut driver = ManualDriver::new();
//! let surface = Rc::new(RefCell::new(Recorder::new(Size::new(320.0, 180.0))));
//! let widget = widgets::build("scanner").expect("known widget");
//! let mut component = Component::new(widget, Generator::new(7), Liveliness::OFF);
//!
//! component.mount(&mut driver, &surface);
//! driver.tick(0.0);
//! driver.tick(16.7);
//! assert_eq!(component.frames(), 2);
//!
//! component.unmount(&mut driver);
//! assert_eq!(driver.tick(33.4), 0);
//! ```
//!
//! ## Architecture
//!
//! Scheduler tick → clock → phase → generator samples → draw calls.
//! A [`Component`] owns the loop handle; dropping or unmounting it cancels
//! the loop, and a callback that still fires afterwards is a no-op.

pub mod budget;
pub mod capture;
pub mod clock;
pub mod component;
pub mod config;
pub mod draw;
pub mod generator;
pub mod phase;
pub mod scheduler;
pub mod surface;
pub mod visualization;
pub mod widgets;

pub use budget::{FRAME_BUDGET_MS, FrameBudget};
pub use capture::{CaptureMeta, CaptureWriter};
pub use clock::{AnimationClock, MIN_CYCLE_MS, Tick};
pub use component::Component;
pub use config::StudioConfig;
pub use draw::{
    Align, Canvas, Color, DrawOp, MIN_EDGE, Point, Recorder, Rect, Size, Stroke, TextStyle,
    palette,
};
pub use generator::{Generator, Liveliness, hash01};
pub use phase::{Phase, PhaseSpan, PhaseState, PhaseTimeline, Ticker, TriggeredPhases};
pub use scheduler::{FrameCallback, FrameDriver, LoopHandle, Liveness, ManualDriver};
pub use surface::RenderSurface;
pub use visualization::{FrameContext, Page, Visualization, WidgetInfo};
pub use widgets::{all_widgets, build, widget_names};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
