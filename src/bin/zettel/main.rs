//! zettel CLI tool
//!
//! Builds a site of multi-file notes with the minimal theme.
//!
//! ## Commands
//!
//! - `build`: One-shot build of the output directory
//! - `serve`: Build, serve the output with live reload, and rebuild whenever sources change

use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};
use tokio::sync::watch;
use zettelbuilder::{
    config::{ProjectConfig, CONFIG_FILE},
    project::Project,
    serve::DevServer,
    theme::minimal::Minimal,
};

#[derive(Parser)]
#[command(name = "zettel")]
#[command(author, version, about = "Build and serve a site of multi-file notes", long_about = None)]
struct Cli {
    /// Project configuration file. Relative paths in it are resolved against its directory.
    #[arg(short, long, default_value = CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the site once
    Build {
        /// Source directory, overriding the configuration
        #[arg(long)]
        src: Option<PathBuf>,

        /// Output directory, overriding the configuration
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Build, serve with live reload and rebuild on change
    Serve {
        /// Port for the dev server (default: first free port from 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ProjectConfig::load(&cli.config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Commands::Build { src, out } => {
            if let Some(src) = src {
                config.src_dir = src;
            }
            if let Some(out) = out {
                config.build_dir = out;
            }
            let project = Project::new(config, Arc::new(Minimal));
            let result = runtime.block_on(project.build());
            match result {
                Ok(report) => {
                    tracing::info!("Built site in {}ms", report.elapsed.as_millis());
                    println!(
                        "✓ {} notes, {} pages, {} assets written to {}",
                        report.notes,
                        report.pages,
                        report.assets,
                        project.config().build_dir.display()
                    );
                    Ok(())
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Serve { port } => {
            if port.is_some() {
                config.port = port;
            }
            let project = Arc::new(Project::new(config, Arc::new(Minimal)));

            let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
            ctrlc::set_handler(move || {
                println!("\nShutting down...");
                let _ = shutdown_tx.send(true);
            })?;
            let shutdown = async move {
                let _ = shutdown_rx.wait_for(|stop| *stop).await;
            };

            runtime.block_on(DevServer::new(project).serve(shutdown))?;
            Ok(())
        }
    }
}
