//! TUI application state and event loop.
//!
//! One widget is mounted at a time on a [`Recorder`]; each loop iteration
//! ticks the driver with wall-clock time and replays the recorded draw calls
//! onto a braille canvas.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::{CrosstermBackend, Terminal};

use studioscope_core::{
    Component, ManualDriver, Page, PhaseState, Recorder, Size, StudioConfig, Visualization,
    widget_names, widgets,
};

/// Rows taken by the title bar and key bar.
const CHROME_ROWS: u16 = 4;

/// Logical surface size for a terminal of `cols`×`rows` cells.
///
/// Cells are roughly twice as tall as they are wide, so each one maps to
/// 4×8 logical units and widgets keep their proportions.
pub fn canvas_size(cols: u16, rows: u16) -> Size {
    let inner_w = cols.saturating_sub(2);
    let inner_h = rows.saturating_sub(CHROME_ROWS + 2);
    Size::new(f64::from(inner_w) * 4.0, f64::from(inner_h) * 8.0)
}

pub struct App {
    names: Vec<&'static str>,
    index: usize,
    description: &'static str,
    page: Page,
    config: StudioConfig,
    driver: ManualDriver,
    surface: Rc<RefCell<Recorder>>,
    component: Component<Recorder>,
    running: bool,
    paused: bool,
    started: Instant,
    paused_total: Duration,
    paused_since: Option<Instant>,
    frame_interval: Duration,
}

impl App {
    pub fn new(widget: Box<dyn Visualization>, config: StudioConfig) -> Self {
        let names = widget_names();
        let index = names.iter().position(|n| *n == widget.name()).unwrap_or(0);
        let description = widget.info().description;
        let page = widget.info().page;
        let mut driver = ManualDriver::new();
        let surface = Rc::new(RefCell::new(Recorder::new(config.size())));
        let mut component = Component::new(widget, config.generator(), config.liveliness());
        component.mount(&mut driver, &surface);
        let frame_interval = Duration::from_secs_f64(config.frame_interval_ms() / 1000.0);

        Self {
            names,
            index,
            description,
            page,
            config,
            driver,
            surface,
            component,
            running: true,
            paused: false,
            started: Instant::now(),
            paused_total: Duration::ZERO,
            paused_since: None,
            frame_interval,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Restore the terminal before printing a panic.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
            original_hook(info);
        }));

        let area = terminal.size()?;
        self.resize_to(area.width, area.height);
        let result = self.run_loop(&mut terminal);

        let _ = std::panic::take_hook();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::cursor::Show
        )?;
        self.component.unmount(&mut self.driver);

        result
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        while self.running {
            if !self.paused {
                self.driver.tick(self.now_ms());
            }
            terminal.draw(|f| super::ui::draw(f, self))?;

            if event::poll(self.frame_interval)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key.code);
                    }
                    Event::Resize(cols, rows) => self.resize_to(cols, rows),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Left | KeyCode::Char('h') => self.switch(-1),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => self.switch(1),
            KeyCode::Char('p') | KeyCode::Char(' ') => self.toggle_pause(),
            KeyCode::Char('r') => self.component.rewind(),
            _ => {}
        }
    }

    fn switch(&mut self, step: isize) {
        let len = self.names.len() as isize;
        if len == 0 {
            return;
        }
        let next = (self.index as isize + step).rem_euclid(len) as usize;
        let Some(widget) = widgets::build(self.names[next]) else {
            return;
        };
        self.component.unmount(&mut self.driver);
        self.index = next;
        self.description = widget.info().description;
        self.page = widget.info().page;
        self.component = Component::new(widget, self.config.generator(), self.config.liveliness());
        self.component.mount(&mut self.driver, &self.surface);
    }

    fn toggle_pause(&mut self) {
        match self.paused_since.take() {
            Some(since) => self.paused_total += since.elapsed(),
            None => self.paused_since = Some(Instant::now()),
        }
        self.paused = self.paused_since.is_some();
    }

    fn resize_to(&mut self, cols: u16, rows: u16) {
        let size = canvas_size(cols, rows);
        self.component.resize(&mut self.driver, size);
    }

    /// Wall-clock milliseconds with paused time taken out.
    fn now_ms(&self) -> f64 {
        let paused = self.paused_total + self.paused_since.map_or(Duration::ZERO, |s| s.elapsed());
        self.started.elapsed().saturating_sub(paused).as_secs_f64() * 1000.0
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn widget_name(&self) -> &'static str {
        self.component.name()
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn position(&self) -> (usize, usize) {
        (self.index + 1, self.names.len())
    }

    pub fn state(&self) -> PhaseState {
        self.component.last_state()
    }

    pub fn frames(&self) -> u64 {
        self.component.frames()
    }

    pub fn surface(&self) -> &Rc<RefCell<Recorder>> {
        &self.surface
    }
}
