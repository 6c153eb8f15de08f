//! mysqldiff — compare two MySQL schemas
//!
//! # Usage
//!
//! ```bash
//! # Which tables drifted?
//! mysqldiff --left left.json --right right.json tables
//!
//! # Drill into one table, then one column
//! mysqldiff columns users
//! mysqldiff fields users email
//!
//! # Serve the JSON API
//! mysqldiff serve --bind 0.0.0.0:8080 --assets resource
//!
//! # Capture a schema for offline comparison
//! mysqldiff dump right -o prod.json
//! mysqldiff --right snapshot:prod.json tables
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use mysqldiff::prelude::*;
use mysqldiff::server::{self, AppState};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mysqldiff")]
#[command(version)]
#[command(about = "Detect schema drift between two MySQL databases", long_about = None)]
#[command(after_help = "EXAMPLES:
    mysqldiff tables
    mysqldiff --right snapshot:prod.json columns users
    mysqldiff fields users email --format json")]
struct Cli {
    /// Left (reference) side: server config file, or snapshot:<path>
    #[arg(long, env = "MYSQLDIFF_LEFT", default_value = "left.json", global = true)]
    left: String,

    /// Right side: server config file, or snapshot:<path>
    #[arg(long, env = "MYSQLDIFF_RIGHT", default_value = "right.json", global = true)]
    right: String,

    /// Deadline for each report, in seconds
    #[arg(long, env = "MYSQLDIFF_TIMEOUT", default_value_t = 30, global = true)]
    timeout: u64,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Pretty,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum DumpSide {
    Left,
    Right,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the JSON API
    Serve {
        /// Address to listen on
        #[arg(long, env = "MYSQLDIFF_BIND", default_value = "0.0.0.0:8080")]
        bind: String,

        /// Directory with index.html and assets/
        #[arg(long)]
        assets: Option<String>,
    },
    /// Tables added, deleted or changed
    Tables,
    /// Columns added, deleted or changed in one table
    Columns {
        table: String,
    },
    /// Field changes of one column
    Fields {
        table: String,
        column: String,
    },
    /// Write one side's schema to a snapshot file
    Dump {
        #[arg(value_enum)]
        side: DumpSide,

        /// Output path (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    if let Commands::Dump { side, output } = &cli.command {
        let arg = match side {
            DumpSide::Left => &cli.left,
            DumpSide::Right => &cli.right,
        };
        return dump(arg, output.as_deref()).await;
    }

    let comparer = connect(cli).await?;

    match &cli.command {
        Commands::Serve { bind, assets } => {
            let mut state = AppState::new(comparer);
            if let Some(dir) = assets {
                state = state.assets(dir);
            }
            server::serve(state, bind).await?;
        }
        Commands::Tables => {
            let report = comparer.table_report().await?;
            match cli.format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Pretty => {
                    print_names(&report.added, &report.deleted, &report.changed);
                    summary(report.is_empty(), "tables");
                }
            }
        }
        Commands::Columns { table } => {
            let report = comparer.column_report(table).await?;
            match cli.format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Pretty => {
                    println!("{} {}", "Table:".dimmed(), report.table.white().bold());
                    print_names(&report.added, &report.deleted, &report.changed);
                    summary(report.is_empty(), "columns");
                }
            }
        }
        Commands::Fields { table, column } => {
            let report = comparer.field_report(table, column).await?;
            match cli.format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Pretty => print_fields(&report),
            }
        }
        Commands::Dump { .. } => unreachable!(), // Handled above
    }

    Ok(())
}

async fn connect(cli: &Cli) -> Result<server::DynComparer> {
    let left = SideConfig::from_arg(&cli.left).context("left side")?;
    let right = SideConfig::from_arg(&cli.right).context("right side")?;

    let left = mysqldiff::open_side(left).await.context("left side")?;
    let right = mysqldiff::open_side(right).await.context("right side")?;

    Ok(Comparer::new(left, right).timeout(Duration::from_secs(cli.timeout)))
}

async fn dump(arg: &str, output: Option<&str>) -> Result<()> {
    let config = SideConfig::from_arg(arg)?;
    let title = match &config {
        SideConfig::Server(server) => server.label(),
        SideConfig::Snapshot(path) => path.display().to_string(),
    };
    let source = mysqldiff::open_side(config).await?;
    let snapshot = Snapshot::capture(source.as_ref(), title).await?;

    match output {
        Some(path) => {
            snapshot.save(path)?;
            eprintln!(
                "{} Wrote {} table(s) to {}",
                "✓".green(),
                snapshot.tables.len(),
                path.cyan()
            );
        }
        None => print_json(&snapshot)?,
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_names(added: &[String], deleted: &[String], changed: &[String]) {
    for name in added {
        println!("  {} {}", "+".green().bold(), name.green());
    }
    for name in deleted {
        println!("  {} {}", "-".red().bold(), name.red());
    }
    for name in changed {
        println!("  {} {}", "~".yellow().bold(), name.yellow());
    }
}

fn summary(empty: bool, what: &str) {
    if empty {
        println!("{}", format!("✓ No drift in {}", what).green());
    }
}

fn print_fields(report: &FieldReport) {
    println!(
        "{} {}.{}",
        "Column:".dimmed(),
        report.table.white().bold(),
        report.column.white().bold()
    );
    if report.changed.is_empty() {
        println!("{}", "✓ No drift in fields".green());
        return;
    }

    let width = report
        .changed
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(0);
    for change in &report.changed {
        println!(
            "  {:width$}  {} {} {}",
            change.name.cyan(),
            change.old.red(),
            "→".dimmed(),
            change.new.green(),
            width = width
        );
    }
}
