use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "modelgen",
    about = "Generate Mongoose models and GraphQL schemas from entity descriptions",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate code for every description file in a directory
    Generate {
        /// Directory of *.json description files (default: current directory)
        input_dir: Option<PathBuf>,

        /// Output directory (default: the input directory)
        output_dir: Option<PathBuf>,
    },
    /// Resolve and print the description-file path for an entity
    Watch {
        /// Entity name
        entity: String,

        /// Directory of *.json description files (default: current directory)
        input_dir: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            input_dir,
            output_dir,
        } => {
            let input = match input_dir {
                Some(dir) => dir,
                None => std::env::current_dir().context("cannot resolve current directory")?,
            };
            let output = output_dir.unwrap_or_else(|| input.clone());

            let report = modelgen::batch::run_batch(&input, &output)
                .with_context(|| format!("generation failed for {}", input.display()))?;

            println!("Generation complete!");
            if report.has_errors() {
                println!("Errors:");
                for error in &report.errors {
                    println!("  {error}");
                }
            } else {
                println!("No errors");
            }
            Ok(())
        }
        Commands::Watch { entity, input_dir } => {
            let input = match input_dir {
                Some(dir) => dir,
                None => std::env::current_dir().context("cannot resolve current directory")?,
            };
            println!("{}", modelgen::description_path(&input, &entity).display());
            Ok(())
        }
    }
}
