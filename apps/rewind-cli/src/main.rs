mod demo;
mod script;

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rewind_host::ContainerConfig;
use tracing_subscriber::EnvFilter;

use crate::script::{Script, print_history};

#[derive(Parser)]
#[command(name = "rewind-cli", about = "Drive a time-travelling state container")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and default container settings
    Info,
    /// Run the built-in walkthroughs
    Demo,
    /// Replay a JSON or YAML command script
    Replay {
        /// Script file (.json, .yaml or .yml)
        #[arg(short, long)]
        script: PathBuf,
        /// Print only the final history
        #[arg(short, long)]
        quiet: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Info => {
            let config = ContainerConfig::default();
            writeln!(out, "rewind-cli v{}", env!("CARGO_PKG_VERSION"))?;
            writeln!(
                out,
                "mutation detection: {}",
                if config.enable_mutation_detection {
                    "on"
                } else {
                    "off"
                }
            )?;
            writeln!(out, "audited object: {}", config.object_name)?;
        }
        Commands::Demo => demo::run(&mut out)?,
        Commands::Replay { script, quiet } => {
            let loaded = Script::load(&script)?;
            tracing::info!(
                script = %script.display(),
                commands = loaded.commands.len(),
                "replaying"
            );
            let tt = if quiet {
                loaded.run(&mut std::io::sink())?
            } else {
                loaded.run(&mut out)?
            };
            writeln!(out, "{}", tt.state().summary())?;
            print_history(&tt, &mut out)?;
        }
    }

    Ok(())
}
