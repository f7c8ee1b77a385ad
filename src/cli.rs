use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::commands::Workspace;
use crate::config::AppConfig;
use crate::models::{AppError, PriceMap};
use crate::processors::formatter::{format_currency, format_date};
use crate::processors::view::InventoryFilter;
use crate::utils::canonical::{format_category_label, format_status_label};

#[derive(Parser)]
#[command(name = "lotsync")]
#[command(about = "Lot inventory import and reconciliation", long_about = None)]
pub struct Cli {
    /// Project code; defaults to `projects.default` from the configuration
    #[arg(long, short, global = true)]
    pub project: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import a CSV or spreadsheet into the project inventory
    Import(ImportArgs),

    /// List lots in display order
    List(ListArgs),

    /// Change the status of one lot
    Status(StatusArgs),

    /// Save a category price table and price matching lots
    Prices(PricesArgs),

    /// Delete every lot of the project
    Clear,

    /// Availability counts and revenue
    Summary,
}

#[derive(Args)]
pub struct ImportArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    /// e.g. `phase-2`
    #[arg(long)]
    pub phase: Option<String>,
}

#[derive(Args)]
pub struct StatusArgs {
    pub lot: String,
    /// `available`, `reserved` or `sold`
    pub status: String,
    #[arg(long)]
    pub phase: Option<u32>,
    /// Day recorded as the update date (YYYY-MM-DD); today when omitted
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Args)]
pub struct PricesArgs {
    /// Price scope for phase-priced projects: phase1, phase2, phase3 or phase13
    #[arg(long)]
    pub scope: Option<String>,
    /// `category=price` pairs, e.g. "prime corner=1500"
    #[arg(required = true, value_parser = parse_price_pair)]
    pub prices: Vec<(String, f64)>,
}

fn parse_price_pair(raw: &str) -> Result<(String, f64), String> {
    let (category, price) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected category=price, got '{raw}'"))?;
    let price = price
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("invalid price '{}': {err}", price.trim()))?;
    Ok((category.trim().to_string(), price))
}

pub fn run(cli: Cli) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let project = cli
        .project
        .clone()
        .unwrap_or_else(|| config.projects.default.clone());
    let workspace = Workspace::new(config, None);

    match cli.command {
        Commands::Import(args) => {
            let report = workspace.import_file(&project, &args.file)?;
            if cli.json {
                return print_json(&report);
            }
            println!("{}", report.summary());
            for warning in &report.batch.warnings {
                println!("  {}", warning.message());
            }
        }
        Commands::List(args) => {
            let filter = InventoryFilter {
                category: args.category,
                status: args.status,
                phase: args.phase,
            };
            let lots = workspace.list(&project, &filter)?;
            if cli.json {
                return print_json(&lots);
            }
            for lot in &lots {
                println!(
                    "{:<12} {:>5} {:>10} {:<18} {:<10} {:>16} {}",
                    lot.lot_number,
                    lot.phase.map(|p| p.to_string()).unwrap_or_default(),
                    lot.size,
                    format_category_label(&lot.category),
                    format_status_label(&lot.status),
                    lot.total.map(format_currency).unwrap_or_default(),
                    lot.last_updated.as_deref().map(format_date).unwrap_or_default(),
                );
            }
        }
        Commands::Status(args) => {
            let day = args.date.unwrap_or_else(|| Local::now().date_naive());
            let change =
                workspace.update_lot_status(&project, &args.lot, args.phase, &args.status, day)?;
            if cli.json {
                return print_json(&change);
            }
            println!(
                "{} is now {}",
                change.record.lot_number,
                format_status_label(&change.record.status)
            );
        }
        Commands::Prices(args) => {
            let prices: PriceMap = args.prices.into_iter().collect();
            let report = workspace.save_category_prices(&project, args.scope.as_deref(), &prices)?;
            if cli.json {
                return print_json(&report);
            }
            println!("{} ({} lots priced)", report.summary(), report.priced);
        }
        Commands::Clear => {
            let report = ClearReport {
                project: &project,
                removed: workspace.clear_inventory(&project)?,
            };
            if cli.json {
                return print_json(&report);
            }
            println!("{}", report.message());
        }
        Commands::Summary => {
            let summary = workspace.summary(&project)?;
            if cli.json {
                return print_json(&summary);
            }
            println!("Available: {}", summary.available);
            println!("Reserved:  {}", summary.reserved);
            println!("Sold:      {}", summary.sold);
            println!("Revenue:   {}", format_currency(summary.revenue));
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct ClearReport<'a> {
    project: &'a str,
    removed: usize,
}

impl ClearReport<'_> {
    fn message(&self) -> String {
        format!("Removed {} lots from {}", self.removed, self.project)
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
