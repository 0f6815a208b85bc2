//! LDGC CLI — generate ladder CSV from a cycle snapshot.

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};

use ldgc::{compile_details, compile_program, export, GenerationSnapshot, GeneratorSettings};

#[derive(Parser)]
#[command(name = "ldgc", version, about = "Ladder Detail Generation Compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate ladder rows for one cycle snapshot
    Generate {
        /// Snapshot JSON (devices, records and relationship tables)
        #[arg(long)]
        snapshot: PathBuf,
        /// Settings TOML (signal devices); defaults apply when omitted
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Output CSV (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Skip the process aggregate rungs
        #[arg(long)]
        details_only: bool,
        /// Print the error report as JSON
        #[arg(long)]
        errors_json: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Generate {
            snapshot,
            settings,
            output,
            details_only,
            errors_json,
        } => generate(snapshot, settings, output, details_only, errors_json),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(2);
        }
    }
}

/// Returns `false` when a critical error was reported.
fn generate(
    snapshot_path: PathBuf,
    settings_path: Option<PathBuf>,
    output: Option<PathBuf>,
    details_only: bool,
    errors_json: bool,
) -> anyhow::Result<bool> {
    let json = std::fs::read_to_string(&snapshot_path)
        .with_context(|| format!("reading snapshot {}", snapshot_path.display()))?;
    let snapshot = GenerationSnapshot::from_json(&json)
        .with_context(|| format!("parsing snapshot {}", snapshot_path.display()))?;

    let settings = match settings_path {
        Some(path) => {
            let source = std::fs::read_to_string(&path)
                .with_context(|| format!("reading settings {}", path.display()))?;
            GeneratorSettings::from_toml_str(&source)
                .with_context(|| format!("parsing settings {}", path.display()))?
        }
        None => GeneratorSettings::default(),
    };

    let generated = if details_only {
        compile_details(&snapshot, &settings)?
    } else {
        compile_program(&snapshot, &settings)?
    };

    match output {
        Some(path) => export::write_csv_file(&generated.rows, &path)?,
        None => print!("{}", export::to_csv_string(&generated.rows)),
    }

    if errors_json {
        eprintln!("{}", serde_json::to_string_pretty(&generated.errors)?);
    } else {
        for error in &generated.errors {
            eprintln!("{error}");
        }
    }

    Ok(!generated.has_critical())
}
