//! `airtrack` - CLI for the flight analytics query engine
//!
//! This binary loads a flight dataset and runs catalog queries against it
//! from the command line.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use airtrack::catalog::{Catalog, QueryParams, QueryResult};
use airtrack::cli::{
    parse_key_value, CheckCommand, Cli, Command, ConfigCommand, OutputFormat, RunCommand,
    StatsCommand,
};
use airtrack::{init_logging, loader, Config};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Run(run_cmd) => handle_run(&config, &run_cmd),
        Command::Queries => {
            handle_queries();
            Ok(())
        }
        Command::Stats(stats_cmd) => handle_stats(&config, &stats_cmd),
        Command::Check(check_cmd) => handle_check(&config, &check_cmd),
        Command::Config(config_cmd) => handle_config(&config, &config_cmd),
    }
}

fn handle_run(config: &Config, cmd: &RunCommand) -> anyhow::Result<()> {
    let mut params = QueryParams::new();
    for raw in &cmd.params {
        let (key, value) = parse_key_value(raw).map_err(|msg| anyhow::anyhow!(msg))?;
        params.set(key, value);
    }

    let path = dataset_path(config, cmd.dataset.clone());
    let store = loader::load(&path)
        .with_context(|| format!("failed to load dataset from {}", path.display()))?;

    let catalog = Catalog::from_config(config);
    let result = catalog.run(&store, &cmd.query, &params)?;

    match cmd.format {
        OutputFormat::Plain => print!("{}", format_plain(&result)),
        OutputFormat::Table => print!("{}", format_table(&result)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result.to_json())?),
    }
    Ok(())
}

fn handle_queries() {
    for entry in Catalog::entries() {
        println!("{}", entry.name);
        println!("    {}", entry.summary);
        println!("    columns: {}", entry.columns.join(", "));
        for param in entry.params {
            match param.default {
                Some(default) => {
                    println!("    -p {}=...  {} [default: {default}]", param.name, param.description);
                }
                None => println!("    -p {}=...  {}", param.name, param.description),
            }
        }
        println!();
    }
}

fn handle_stats(config: &Config, cmd: &StatsCommand) -> anyhow::Result<()> {
    let path = dataset_path(config, cmd.dataset.clone());
    let store = loader::load(&path)
        .with_context(|| format!("failed to load dataset from {}", path.display()))?;

    if cmd.json {
        let stats = serde_json::json!({
            "dataset": path,
            "flights": store.flight_count(),
            "aircraft": store.aircraft_count(),
            "airports": store.airport_count(),
            "airlines": store.airline_count(),
        });
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Dataset:  {}", path.display());
        println!("Flights:  {}", store.flight_count());
        println!("Aircraft: {}", store.aircraft_count());
        println!("Airports: {}", store.airport_count());
        println!("Airlines: {}", store.airline_count());
    }
    Ok(())
}

fn handle_check(config: &Config, cmd: &CheckCommand) -> anyhow::Result<()> {
    let path = dataset_path(config, cmd.dataset.clone());
    match loader::load(&path) {
        Ok(store) => {
            println!(
                "dataset OK: {} flights, {} aircraft, {} airports, {} airlines",
                store.flight_count(),
                store.aircraft_count(),
                store.airport_count(),
                store.airline_count()
            );
            Ok(())
        }
        Err(err) => {
            eprintln!("dataset check failed: {err}");
            std::process::exit(1);
        }
    }
}

fn handle_config(config: &Config, cmd: &ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if *json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("{config:#?}");
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            Config::load_from(file.clone())?;
            println!("configuration OK");
        }
    }
    Ok(())
}

fn dataset_path(config: &Config, override_path: Option<PathBuf>) -> PathBuf {
    override_path.unwrap_or_else(|| config.dataset_path())
}

/// Render rows as tab-separated lines, no header.
fn format_plain(result: &QueryResult) -> String {
    let mut out = String::new();
    for row in &result.rows {
        let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }
    out
}

/// Render rows as an aligned table with a header.
fn format_table(result: &QueryResult) -> String {
    let rendered: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(ToString::to_string).collect())
        .collect();

    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.len()).collect();
    for row in &rendered {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = result
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{c:<width$}", width = widths[i]))
        .collect();
    out.push_str(header.join("  ").trim_end());
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');
    for row in &rendered {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{cell:<width$}", width = widths[i]))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}
