//! CLI for studioscope: the studio site's animated widgets, off the page.

mod commands;
mod tui;

use clap::{Parser, Subcommand};

use commands::Overrides;

#[derive(Parser)]
#[command(name = "studioscope")]
#[command(about = "studioscope — render-loop engine for the studio's decorative visualizations")]
#[command(version = studioscope_core::VERSION)]
struct Cli {
    /// JSON config file (seed, lively, width, height, fps, frames)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Generator seed (overrides the config file)
    #[arg(long, global = true)]
    seed: Option<u32>,

    /// Layer random jitter over the deterministic generator
    #[arg(long, global = true)]
    lively: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every visualization with its page, cycle length and description
    List,

    /// Print the phase and progress of a widget at given clock times
    Phases {
        /// Widget name (see `list`)
        #[arg(long)]
        widget: String,

        /// Comma-separated times in ms since the first frame, e.g. "0,5499,5501"
        #[arg(long)]
        at: String,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Render frames headlessly to PPM files plus frames.csv and capture.json.
    /// Ctrl+C stops early and still writes the metadata.
    Render {
        /// Widget name (see `list`)
        #[arg(long)]
        widget: String,

        /// Number of frames to render
        #[arg(long)]
        frames: Option<u64>,

        /// Simulated frame rate
        #[arg(long)]
        fps: Option<f64>,

        /// Logical surface width
        #[arg(long)]
        width: Option<f64>,

        /// Logical surface height
        #[arg(long)]
        height: Option<f64>,

        /// Device pixel ratio
        #[arg(long, default_value = "1.0")]
        scale: f64,

        /// Output directory (default: ./captures/)
        #[arg(long)]
        output: Option<String>,
    },

    /// Measure frame cost against the 60 fps budget
    Bench {
        /// Widget name, or "all"
        #[arg(long, default_value = "all")]
        widget: String,

        /// Frames per widget
        #[arg(long)]
        frames: Option<u64>,

        /// Write the report as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Live terminal view (←/→ switch, p pause, r restart, q quit)
    Watch {
        /// Widget to start with
        #[arg(long, default_value = "scanner")]
        widget: String,

        /// Target frame rate
        #[arg(long)]
        fps: Option<f64>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let base = Overrides {
        seed: cli.seed,
        lively: cli.lively,
        ..Overrides::default()
    };
    let config = cli.config.as_deref();

    match cli.command {
        Commands::List => commands::list::run(),
        Commands::Phases { widget, at, json } => commands::phases::run(&widget, &at, json),
        Commands::Render {
            widget,
            frames,
            fps,
            width,
            height,
            scale,
            output,
        } => commands::render::run(
            &widget,
            commands::load_config(
                config,
                Overrides {
                    frames,
                    fps,
                    width,
                    height,
                    ..base
                },
            ),
            scale,
            output.as_deref(),
        ),
        Commands::Bench {
            widget,
            frames,
            output,
        } => commands::bench::run(
            &widget,
            commands::load_config(config, Overrides { frames, ..base }),
            output.as_deref(),
        ),
        Commands::Watch { widget, fps } => {
            commands::watch::run(&widget, commands::load_config(config, Overrides { fps, ..base }))
        }
    }
}
