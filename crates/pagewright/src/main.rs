//! pagewright CLI - static site generator.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "pagewright")]
#[command(about = "Static site generator for content directories")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file, relative to the source directory
    #[arg(short, long, default_value = "pagewright.toml")]
    config: PathBuf,

    /// Site source directory
    #[arg(short, long, default_value = ".")]
    source: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a new site in the source directory
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Build the site
    Build {
        /// Output directory (defaults to config or "_site")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Minify copied CSS
        #[arg(long)]
        minify: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(&cli.source, &cli.config, yes).await?;
        }
        Commands::Build { output, minify } => {
            commands::build::run(cli.source, &cli.config, output, minify).await?;
        }
    }

    Ok(())
}
