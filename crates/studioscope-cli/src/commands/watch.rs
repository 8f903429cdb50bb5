use studioscope_core::StudioConfig;

pub fn run(widget_name: &str, config: StudioConfig) {
    let widget = super::require_widget(widget_name);
    let mut app = crate::tui::app::App::new(widget, config);
    if let Err(e) = app.run() {
        eprintln!("TUI error: {e}");
        std::process::exit(1);
    }
}
