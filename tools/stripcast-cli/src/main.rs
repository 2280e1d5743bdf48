//! Stripcast CLI: command-line interface for timeline projects.
//!
//! Usage:
//!   stripcast render <PATH>     Capture and encode a project to video
//!   stripcast plan <PATH>       Print the encoder invocations for a project
//!   stripcast validate <PATH>   Validate a project file
//!   stripcast info <PATH>       Show project information
//!   stripcast init <NAME>       Create an empty project file
//!   stripcast check             Check for the encoding engine

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stripcast_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "stripcast",
    about = "Frame-exact timeline capture and encoding",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the standard location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a project frame by frame and encode it
    Render {
        /// Path to the project file
        path: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the raw capture and skip encoding
        #[arg(long)]
        frames_only: bool,
    },

    /// Print the encoder invocations a render would run
    Plan {
        /// Path to the project file
        path: PathBuf,

        /// Emit the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a project file
    Validate {
        /// Path to the project file
        path: PathBuf,
    },

    /// Show project information
    Info {
        /// Path to the project file
        path: PathBuf,
    },

    /// Create a new empty project file
    Init {
        /// Project name
        name: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Output width
        #[arg(long, default_value = "1920")]
        width: u32,

        /// Output height
        #[arg(long, default_value = "1080")]
        height: u32,

        /// Timeline frame rate
        #[arg(long, default_value = "30")]
        fps: f64,

        /// Timeline duration in seconds
        #[arg(long, default_value = "10")]
        duration: f64,
    },

    /// Check that the encoding engine is available
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    stripcast_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Render {
            path,
            output,
            frames_only,
        } => commands::render::run(path, output, frames_only, &config).await,
        Commands::Plan { path, json } => commands::plan::run(path, json, &config).await,
        Commands::Validate { path } => commands::validate::run(path),
        Commands::Info { path } => commands::info::run(path),
        Commands::Init {
            name,
            output,
            width,
            height,
            fps,
            duration,
        } => commands::init::run(name, output, width, height, fps, duration),
        Commands::Check => commands::check::run(&config).await,
    }
}
