use studioscope_core::all_widgets;

pub fn run() {
    let widgets = all_widgets();
    println!("{} visualizations:\n", widgets.len());
    println!("  {:<16} {:<8} {:>9}  Description", "Name", "Page", "Cycle");
    println!("  {}", "-".repeat(72));
    for w in &widgets {
        let info = w.info();
        let marker = if info.triggered { "*" } else { " " };
        println!(
            "  {:<16} {:<8} {:>7.0}ms{} {}",
            info.name,
            info.page,
            w.cycle_ms(),
            marker,
            info.description
        );
    }
    println!("\n* advances on its own trigger ticker instead of the cycle clock.");
}
