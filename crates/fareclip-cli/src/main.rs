// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Fareclip

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fareclip_core::{data, AirlineCatalog, CityRegistry, ExtractionEngine};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the city dataset (JSON)
    #[arg(long, env = "FARECLIP_CITIES")]
    cities: Option<PathBuf>,

    /// Path to the airline catalog (JSON)
    #[arg(long, env = "FARECLIP_AIRLINES")]
    airlines: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a flight record from booking text (file or stdin)
    Extract {
        /// Read the booking text from a file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Print the structured result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load and check the configured datasets
    Validate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Warn
    };
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    let registry = load_registry(&cli.cities)?;
    let catalog = load_catalog(&cli.airlines)?;

    match &cli.command {
        Commands::Validate => {
            println!(
                "OK: {} cities ({} domestic), {} airlines",
                registry.cities().len(),
                registry.domestic().count(),
                catalog.airlines().len()
            );
            Ok(())
        }
        Commands::Extract { file, json } => {
            let text = match file {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {:?}", path))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("Failed to read stdin")?;
                    buf
                }
            };

            let engine = ExtractionEngine::new(registry, catalog)?;
            let extraction = engine.extract(&text);

            if *json {
                println!("{}", serde_json::to_string_pretty(&extraction.result)?);
                return Ok(());
            }

            let fields = &extraction.fields;
            println!("Price:      {}", fields.price);
            for (i, leg) in fields.legs.iter().enumerate() {
                println!("Leg {}:      {}", i + 1, leg.route);
                println!("  Schedule: {}", leg.schedule);
                println!("  Flight:   {}", leg.flight);
                println!("  Aircraft: {}", leg.aircraft);
            }
            println!(
                "Round trip: {}",
                if extraction.result.is_round_trip { "yes" } else { "no" }
            );
            if !fields.note.is_empty() {
                println!("{}", fields.note);
            }
            if !extraction.result.warnings.is_empty() {
                println!("\nWarnings:");
                for warning in &extraction.result.warnings {
                    println!("  - {}", warning);
                }
            }
            Ok(())
        }
    }
}

/// Explicit path, then the user config dir, then ./data/, then the bundled
/// dataset. An explicit path that fails to load is an error; the implicit
/// locations are only used when present.
fn dataset_path(explicit: &Option<PathBuf>, filename: &str) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.clone());
    }
    if let Some(dirs) = directories::ProjectDirs::from("org", "fareclip", "fareclip") {
        let candidate = dirs.config_dir().join(filename);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    let local = PathBuf::from("data").join(filename);
    if local.exists() {
        return Some(local);
    }
    None
}

fn load_registry(explicit: &Option<PathBuf>) -> Result<CityRegistry> {
    match dataset_path(explicit, "cities.json") {
        Some(path) => {
            log::debug!("[CLI] Using city dataset {:?}", path);
            CityRegistry::from_file(&path)
                .with_context(|| format!("Failed to load city dataset {:?}", path))
        }
        None => {
            log::debug!("[CLI] Using bundled city dataset");
            Ok(CityRegistry::from_records(data::default_cities())?)
        }
    }
}

fn load_catalog(explicit: &Option<PathBuf>) -> Result<AirlineCatalog> {
    match dataset_path(explicit, "airlines.json") {
        Some(path) => {
            log::debug!("[CLI] Using airline catalog {:?}", path);
            AirlineCatalog::from_file(&path)
                .with_context(|| format!("Failed to load airline catalog {:?}", path))
        }
        None => {
            log::debug!("[CLI] Using bundled airline catalog");
            Ok(AirlineCatalog::from_records(data::default_airlines())?)
        }
    }
}
