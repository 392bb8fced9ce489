//! Blockstep CLI - run block scripts from the command line
//!
//! Loads a script (text forms or JSON), runs it on the built-in stage, and
//! prints the event log as it is produced.

use anyhow::{Context, Result};
use blockstep::{EngineConfig, Pacing, Program, RunController, RunEvent, Stage, parse_program};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser)]
#[command(name = "blockstep")]
#[command(about = "Run block scripts that guide a cat to its food", long_about = None)]
struct Cli {
    /// Show engine debug logs on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script on the built-in stage
    Run {
        /// Script file (`.json` for a serialized program, text forms otherwise)
        script: PathBuf,

        /// Engine configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Skip all pauses between actions
        #[arg(long)]
        fast: bool,
    },

    /// Parse a script and print its block tree
    Check {
        /// Script file
        script: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match cli.command {
        Commands::Run {
            script,
            config,
            fast,
        } => {
            let program = load_program(&script)?;
            let mut config = match config {
                Some(path) => EngineConfig::load(&path)?,
                None => EngineConfig::default(),
            };
            if fast {
                config.pacing = Pacing::instant();
            }

            let controller = Arc::new(RunController::new(
                Stage::new(config.stage),
                program,
                config.pacing,
            ));
            let mut events = controller.subscribe();
            let runner = tokio::spawn({
                let controller = Arc::clone(&controller);
                async move { controller.run().await }
            });

            loop {
                match events.recv().await {
                    Ok(event) => {
                        println!("{event}");
                        if matches!(
                            event,
                            RunEvent::Finished { .. } | RunEvent::MissingEntryPoint
                        ) {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event display fell behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            let result = runner
                .await
                .context("Run task failed")?
                .context("Run was rejected because another run is active")?;
            let stage = controller.scene().await;
            let actor = stage.actor();
            println!();
            println!("Outcome: {:?}", result.outcome);
            println!("Cat position: ({:.1}, {:.1})", actor.x, actor.y);
            println!(
                "Distance to food: {:.1}",
                actor.distance_to(stage.target())
            );
        }

        Commands::Check { script } => {
            let program = load_program(&script)?;
            println!("{}", program.to_json_pretty()?);
            println!(
                "{} blocks, {} entry point(s)",
                program.block_count(),
                program.entry_points().count()
            );
        }
    }

    Ok(())
}

fn load_program(path: &Path) -> Result<Program> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script: {:?}", path))?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let mut program = if is_json {
        Program::from_json(&source)?
    } else {
        parse_program(name.clone(), &source)?
    };
    if program.name.is_empty() {
        program.name = name;
    }
    Ok(program)
}
