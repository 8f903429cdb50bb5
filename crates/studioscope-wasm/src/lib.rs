//! studioscope WebAssembly bindings: the site widgets on a real `<canvas>`.
//!
//! Two host pieces plug into the core engine:
//!
//! 1. **`AnimationFrameDriver`**: a [`FrameDriver`] that chains
//!    `requestAnimationFrame` callbacks, one chain per loop.
//! 2. **`Canvas2d`**: a [`Canvas`] over `CanvasRenderingContext2d`, sized in
//!    CSS pixels and scaled by `devicePixelRatio`.
//!
//! JavaScript drives them through [`StudioCanvas`]:
//!
//! ```js
//! const widget = new StudioCanvas(document.querySelector("canvas"), "scanner", 7, false);
//! widget.start();
//! new ResizeObserver(([e]) => widget.resize(e.contentRect.width, e.contentRect.height))
//!     .observe(canvas);
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use studioscope_core::{
    Align, Canvas, Color, Component, FrameCallback, FrameDriver, LoopHandle, Liveness, Point, Rect,
    Size, Stroke, StudioConfig, TextStyle, widgets,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, Window};

// ---------------------------------------------------------------------------
// requestAnimationFrame driver
// ---------------------------------------------------------------------------

type RafClosure = Closure<dyn FnMut(f64)>;

struct RafLoop {
    id: u64,
    liveness: Liveness,
    pending: Rc<Cell<Option<i32>>>,
    closure: Rc<RefCell<Option<RafClosure>>>,
}

/// Drives loops from the browser's display refresh.
///
/// Each loop re-requests its next frame only while its liveness guard holds,
/// and checks the guard again when the frame fires, so a frame queued before
/// teardown never reaches the widget.
pub struct AnimationFrameDriver {
    window: Window,
    loops: Vec<RafLoop>,
    next_id: u64,
}

impl AnimationFrameDriver {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            loops: Vec::new(),
            next_id: 0,
        }
    }

    /// Loops still requesting frames.
    pub fn live_loops(&self) -> usize {
        self.loops.iter().filter(|l| l.liveness.is_alive()).count()
    }

    fn release(&self, l: &RafLoop) {
        if let Some(request) = l.pending.take() {
            let _ = self.window.cancel_animation_frame(request);
        }
        // Breaks the closure's reference to itself.
        l.closure.borrow_mut().take();
    }

    /// Free loops whose handle was dropped without `stop`.
    fn prune(&mut self) {
        let (dead, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.loops)
            .into_iter()
            .partition(|l| !l.liveness.is_alive());
        for l in &dead {
            self.release(l);
        }
        self.loops = live;
    }
}

fn request_frame(window: &Window, closure: &RefCell<Option<RafClosure>>) -> Option<i32> {
    let slot = closure.borrow();
    let callback = slot.as_ref()?;
    match window.request_animation_frame(callback.as_ref().unchecked_ref()) {
        Ok(id) => Some(id),
        Err(e) => {
            log::warn!("requestAnimationFrame failed: {e:?}");
            None
        }
    }
}

impl FrameDriver for AnimationFrameDriver {
    fn start(&mut self, mut on_frame: FrameCallback) -> LoopHandle {
        self.prune();
        self.next_id += 1;
        let liveness = Liveness::new();
        let closure: Rc<RefCell<Option<RafClosure>>> = Rc::new(RefCell::new(None));
        let pending = Rc::new(Cell::new(None));

        let alive = liveness.clone();
        let this = Rc::clone(&closure);
        let slot = Rc::clone(&pending);
        let window = self.window.clone();
        *closure.borrow_mut() = Some(Closure::new(move |timestamp_ms: f64| {
            slot.set(None);
            if !alive.is_alive() {
                return;
            }
            on_frame(timestamp_ms);
            if alive.is_alive() {
                slot.set(request_frame(&window, &this));
            }
        }));
        pending.set(request_frame(&self.window, &closure));

        log::trace!("started animation frame loop {}", self.next_id);
        self.loops.push(RafLoop {
            id: self.next_id,
            liveness: liveness.clone(),
            pending,
            closure,
        });
        LoopHandle::new(self.next_id, liveness)
    }

    fn stop(&mut self, handle: LoopHandle) {
        let id = handle.id();
        handle.cancel();
        if let Some(pos) = self.loops.iter().position(|l| l.id == id) {
            let l = self.loops.remove(pos);
            self.release(&l);
        }
        self.prune();
    }
}

impl Drop for AnimationFrameDriver {
    fn drop(&mut self) {
        for l in &self.loops {
            l.liveness.kill();
            self.release(l);
        }
    }
}

// ---------------------------------------------------------------------------
// 2D context canvas
// ---------------------------------------------------------------------------

/// Backing-store size in device pixels for a logical size.
pub fn device_pixels(size: Size, scale: f64) -> (u32, u32) {
    let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
    (
        (size.width * scale).round().max(1.0) as u32,
        (size.height * scale).round().max(1.0) as u32,
    )
}

fn text_align(align: Align) -> &'static str {
    match align {
        Align::Left => "left",
        Align::Center => "center",
        Align::Right => "right",
    }
}

/// [`Canvas`] backed by a browser 2D rendering context.
pub struct Canvas2d {
    element: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    size: Size,
    scale: f64,
}

impl Canvas2d {
    pub fn new(element: HtmlCanvasElement, scale: f64) -> Result<Self, JsValue> {
        let ctx = element
            .get_context("2d")?
            .ok_or_else(|| js_error("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        let size = Size::new(f64::from(element.width()), f64::from(element.height())).clamped();
        let mut canvas = Self {
            element,
            ctx,
            size,
            scale,
        };
        canvas.resize(size);
        Ok(canvas)
    }

    fn apply_stroke(&self, stroke: &Stroke) {
        let css = stroke.color.css();
        self.ctx.set_stroke_style_str(&css);
        self.ctx.set_line_width(stroke.width);
        self.ctx.set_line_cap("round");
        self.ctx.set_line_join("round");
        if stroke.glow > 0.0 {
            self.ctx.set_shadow_color(&css);
            self.ctx.set_shadow_blur(stroke.glow * 12.0);
        }
    }

    fn finish_stroke(&self, stroke: &Stroke) {
        self.ctx.stroke();
        if stroke.glow > 0.0 {
            self.ctx.set_shadow_blur(0.0);
        }
    }
}

impl Canvas for Canvas2d {
    fn size(&self) -> Size {
        self.size
    }

    fn resize(&mut self, size: Size) {
        self.size = size.clamped();
        let (w, h) = device_pixels(self.size, self.scale);
        // Setting either dimension resets the context state.
        self.element.set_width(w);
        self.element.set_height(h);
        let _ = self
            .ctx
            .set_transform(self.scale, 0.0, 0.0, self.scale, 0.0, 0.0);
    }

    fn clear(&mut self, color: Color) {
        self.ctx
            .clear_rect(0.0, 0.0, self.size.width, self.size.height);
        self.fill_rect(Rect::new(0.0, 0.0, self.size.width, self.size.height), color);
    }

    fn line(&mut self, from: Point, to: Point, stroke: &Stroke) {
        self.apply_stroke(stroke);
        self.ctx.begin_path();
        self.ctx.move_to(from.x, from.y);
        self.ctx.line_to(to.x, to.y);
        self.finish_stroke(stroke);
    }

    fn polyline(&mut self, points: &[Point], stroke: &Stroke) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        if rest.is_empty() {
            return;
        }
        self.apply_stroke(stroke);
        self.ctx.begin_path();
        self.ctx.move_to(first.x, first.y);
        for p in rest {
            self.ctx.line_to(p.x, p.y);
        }
        self.finish_stroke(stroke);
    }

    fn bezier(&mut self, from: Point, c1: Point, c2: Point, to: Point, stroke: &Stroke) {
        self.apply_stroke(stroke);
        self.ctx.begin_path();
        self.ctx.move_to(from.x, from.y);
        self.ctx.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, to.x, to.y);
        self.finish_stroke(stroke);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        if color.is_transparent() {
            return;
        }
        self.ctx.set_fill_style_str(&color.css());
        self.ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
    }

    fn gradient_rect(&mut self, rect: Rect, top: Color, bottom: Color) {
        let gradient = self
            .ctx
            .create_linear_gradient(rect.x, rect.y, rect.x, rect.y + rect.height);
        if gradient.add_color_stop(0.0, &top.css()).is_err()
            || gradient.add_color_stop(1.0, &bottom.css()).is_err()
        {
            self.fill_rect(rect, top.mix(bottom, 0.5));
            return;
        }
        self.ctx.set_fill_style_canvas_gradient(&gradient);
        self.ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
    }

    fn circle(&mut self, center: Point, radius: f64, fill: Option<Color>, stroke: Option<&Stroke>) {
        if radius <= 0.0 {
            return;
        }
        self.ctx.begin_path();
        if self
            .ctx
            .arc(center.x, center.y, radius, 0.0, std::f64::consts::TAU)
            .is_err()
        {
            return;
        }
        if let Some(color) = fill {
            self.ctx.set_fill_style_str(&color.css());
            self.ctx.fill();
        }
        if let Some(stroke) = stroke {
            self.apply_stroke(stroke);
            self.finish_stroke(stroke);
        }
    }

    fn text(&mut self, at: Point, text: &str, style: &TextStyle) {
        self.ctx.set_font(&format!("{:.0}px ui-monospace, monospace", style.size));
        self.ctx.set_text_align(text_align(style.align));
        self.ctx.set_text_baseline("top");
        self.ctx.set_fill_style_str(&style.color.css());
        let _ = self.ctx.fill_text(text, at.x, at.y);
    }
}

// ---------------------------------------------------------------------------
// JavaScript surface
// ---------------------------------------------------------------------------

/// Wrap `message` in a JS `Error`.
fn js_error(message: &str) -> JsValue {
    js_sys::Error::new(message).into()
}

/// One widget bound to one `<canvas>` element.
#[wasm_bindgen]
pub struct StudioCanvas {
    driver: AnimationFrameDriver,
    surface: Rc<RefCell<Canvas2d>>,
    component: Component<Canvas2d>,
}

#[wasm_bindgen]
impl StudioCanvas {
    /// Bind `widget` (see [`widget_names`]) to `canvas`. The canvas's current
    /// `width`/`height` attributes are taken as its CSS size.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas: HtmlCanvasElement,
        widget: &str,
        seed: u32,
        lively: bool,
    ) -> Result<StudioCanvas, JsValue> {
        let window = web_sys::window().ok_or_else(|| js_error("no window"))?;
        let visualization = widgets::build(widget)
            .ok_or_else(|| {
            js_error(&format!(
                "unknown widget '{widget}', expected one of: {}",
                widgets::widget_names().join(", ")
            ))
        })?;
        let scale = window.device_pixel_ratio();
        let surface = Rc::new(RefCell::new(Canvas2d::new(canvas, scale)?));
        let config = StudioConfig {
            seed,
            lively,
            ..StudioConfig::default()
        };
        Ok(Self {
            driver: AnimationFrameDriver::new(window),
            surface,
            component: Component::new(visualization, config.generator(), config.liveliness()),
        })
    }

    /// Mount and start the frame loop. Calling it again restarts the loop.
    pub fn start(&mut self) {
        self.component.mount(&mut self.driver, &self.surface);
    }

    /// Cancel the loop; no further frames draw.
    pub fn stop(&mut self) {
        self.component.unmount(&mut self.driver);
    }

    /// Apply a new CSS size; the animation keeps its place in the cycle.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.component
            .resize(&mut self.driver, Size::new(width, height));
    }

    /// Start over from the beginning of the cycle.
    pub fn restart(&mut self) {
        self.component.rewind();
    }

    #[wasm_bindgen(getter)]
    pub fn name(&self) -> String {
        self.component.name().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn phase(&self) -> String {
        self.component.last_state().phase.to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn progress(&self) -> f64 {
        self.component.last_state().progress
    }

    #[wasm_bindgen(getter)]
    pub fn frames(&self) -> f64 {
        self.component.frames() as f64
    }

    #[wasm_bindgen(getter, js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.component.is_mounted() && self.driver.live_loops() > 0
    }
}

/// Names accepted by the [`StudioCanvas`] constructor.
#[wasm_bindgen]
pub fn widget_names() -> Vec<String> {
    widgets::widget_names()
        .into_iter()
        .map(str::to_string)
        .collect()
}
