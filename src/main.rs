// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! QuakeGuard: Seismic Risk Monitor
//!
//! Command-line front end for fetching, scoring and exporting earthquake
//! windows, and for running the dashboard.

use chrono::{Local, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use quakeguard::briefing::BriefingClient;
use quakeguard::catalog::{BoundingBox, CatalogClient, EventQuery, EventSource};
use quakeguard::config::AppConfig;
use quakeguard::event::{classify_all, ClassifiedEvent};
use quakeguard::export::{export_file_name, write_csv, EventFilter};
use quakeguard::patterns::analyze;
use quakeguard::risk::assess;
use quakeguard::{QuakeGuardError, Result};

/// QuakeGuard CLI - Seismic Risk Monitor
#[derive(Parser, Debug)]
#[command(name = "quakeguard")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Earthquake catalog monitor with risk scoring", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json", "jsonl"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Debug, Clone, Default)]
struct QueryArgs {
    /// Minimum magnitude (config default when omitted)
    #[arg(short, long)]
    min_magnitude: Option<f64>,

    /// Lookback window in hours
    #[arg(short = 'H', long)]
    hours: Option<u32>,

    /// Named region from the config table
    #[arg(short, long, conflicts_with = "bbox")]
    region: Option<String>,

    /// Explicit region as min_lon,min_lat,max_lon,max_lat
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    bbox: Option<Vec<f64>>,

    /// Use the smaller result limit
    #[arg(long)]
    brief: bool,
}

#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Only keep these tiers (comma separated, e.g. high,severe)
    #[arg(long, value_delimiter = ',')]
    risk: Vec<String>,

    /// Only keep these magnitude categories (minor, light, moderate, strong, major)
    #[arg(long = "magnitude", value_delimiter = ',')]
    magnitudes: Vec<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> Result<EventFilter> {
        EventFilter::from_keys(&self.magnitudes, &self.risk)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch and list classified events
    Fetch {
        #[command(flatten)]
        query: QueryArgs,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Score the window and print the overall verdict
    Assess {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Print descriptive statistics for the window
    Patterns {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Write the window as CSV
    Export {
        #[command(flatten)]
        query: QueryArgs,

        #[command(flatten)]
        filter: FilterArgs,

        /// Output file (default: earthquakes_<timestamp>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Ask the language model for a briefing on the window
    Briefing {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// List named regions
    Regions,

    /// Run the web dashboard
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Some(Commands::Fetch { query, filter }) => run_fetch(&config, &query, &filter, &cli.format).await,
        Some(Commands::Assess { query }) => run_assess(&config, &query, &cli.format).await,
        Some(Commands::Patterns { query }) => run_patterns(&config, &query, &cli.format).await,
        Some(Commands::Export { query, filter, output }) => run_export(&config, &query, &filter, output).await,
        Some(Commands::Briefing { query }) => run_briefing(&config, &query).await,
        Some(Commands::Regions) => run_regions(&config, &cli.format),
        Some(Commands::Serve { host, port }) => run_serve(config, host, port).await,
        Some(Commands::Config { action }) => run_config_command(config, action, &cli.config),
        None => run_serve(config, None, None).await,
    }
}

/// Turn CLI arguments into a validated catalog query
fn build_query(config: &AppConfig, args: &QueryArgs) -> Result<EventQuery> {
    let region = match (&args.bbox, &args.region) {
        (Some(b), _) => match b.as_slice() {
            [min_lon, min_lat, max_lon, max_lat] => Some(BoundingBox {
                min_lon: *min_lon,
                min_lat: *min_lat,
                max_lon: *max_lon,
                max_lat: *max_lat,
            }),
            _ => {
                return Err(QuakeGuardError::InvalidQuery(
                    "--bbox takes exactly four values".to_string(),
                ))
            }
        },
        (None, Some(name)) => Some(
            config
                .lookup_region(name)
                .ok_or_else(|| QuakeGuardError::UnknownRegion(name.clone()))?,
        ),
        (None, None) => None,
    };

    let query = EventQuery {
        min_magnitude: args.min_magnitude.unwrap_or(config.query.min_magnitude),
        hours: args.hours.unwrap_or(config.query.hours),
        region,
        limit: config.limit_for(!args.brief && config.query.detailed),
    };
    query.validate()?;
    Ok(query)
}

/// Fetch and classify one window; transport failures yield an empty window
async fn load_window(config: &AppConfig, args: &QueryArgs) -> Result<(EventQuery, Vec<ClassifiedEvent>)> {
    let query = build_query(config, args)?;
    let client = CatalogClient::new(&config.catalog)?;

    info!("Fetching from {}", client.url());
    let events = client.fetch_or_empty(&query).await;

    Ok((query, classify_all(events, Utc::now())))
}

fn print_empty_hint() {
    println!("No recent earthquakes found matching your criteria.");
    println!("Try reducing the minimum magnitude or increasing the time range.");
}

async fn run_fetch(config: &AppConfig, args: &QueryArgs, filter: &FilterArgs, format: &str) -> Result<()> {
    let filter = filter.to_filter()?;

    let (query, events) = load_window(config, args).await?;
    let events = filter.apply(&events);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&events)?),
        "jsonl" => {
            for e in &events {
                println!("{}", serde_json::to_string(e)?);
            }
        }
        _ => {
            if events.is_empty() {
                print_empty_hint();
                return Ok(());
            }
            println!("Found {} earthquakes in the last {} hours\n", events.len(), query.hours);
            println!("{:<20} {:>5} {:>8} {:<9} {:<18} {}", "TIME (UTC)", "MAG", "DEPTH", "RISK", "AGE", "PLACE");
            for e in &events {
                println!(
                    "{:<20} {:>5.1} {:>8.1} {:<9} {:<18} {}",
                    e.event.time.format("%Y-%m-%d %H:%M:%S"),
                    e.event.magnitude,
                    e.event.depth,
                    e.risk_level,
                    e.time_ago,
                    e.event.place
                );
            }
        }
    }

    Ok(())
}

async fn run_assess(config: &AppConfig, args: &QueryArgs, format: &str) -> Result<()> {
    let (_, events) = load_window(config, args).await?;
    let assessment = assess(&events, &config.thresholds);

    if format == "text" {
        println!("Risk level:  {}", assessment.risk_level.key().to_uppercase());
        println!("{}", assessment.message);
        println!("Events:      {}", assessment.count);
        if let Some(max) = assessment.max_magnitude {
            println!("Max magnitude: {:.1}", max);
        }
        println!("Protocol:    {}", assessment.protocol);
        println!(
            "Monitoring required: {}",
            if assessment.risk_level.requires_monitoring() { "Yes" } else { "No" }
        );
    } else {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
    }

    Ok(())
}

async fn run_patterns(config: &AppConfig, args: &QueryArgs, format: &str) -> Result<()> {
    let (_, events) = load_window(config, args).await?;
    let analysis = analyze(&events);

    if format != "text" {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    if analysis.is_empty() {
        print_empty_hint();
        return Ok(());
    }

    if let Some(m) = &analysis.magnitude_stats {
        println!("Magnitude: mean {:.2}, median {:.2}, min {:.1}, max {:.1}", m.mean, m.median, m.min, m.max);
        if let Some(std) = m.std {
            println!("           std {:.2}", std);
        }
    }
    if let Some(d) = &analysis.depth_stats {
        println!("Depth:     mean {:.1} km, median {:.1} km", d.mean, d.median);
    }
    if let Some(c) = &analysis.geographic_center {
        println!("Center:    {:.3}, {:.3}", c.lat, c.lon);
    }
    if let Some(tiers) = &analysis.risk_distribution {
        println!("\nRisk distribution:");
        for (tier, n) in tiers {
            println!("  {:<9} {}", tier, n);
        }
    }
    if let Some(days) = &analysis.daily_distribution {
        println!("\nBy day:");
        for (day, n) in days {
            println!("  {:<9} {}", day, n);
        }
    }
    if let Some(hours) = &analysis.hourly_distribution {
        println!("\nBy hour (UTC):");
        for (hour, n) in hours {
            println!("  {:02}:00 {}", hour, n);
        }
    }

    Ok(())
}

async fn run_export(
    config: &AppConfig,
    args: &QueryArgs,
    filter: &FilterArgs,
    output: Option<PathBuf>,
) -> Result<()> {
    let filter = filter.to_filter()?;
    let (_, events) = load_window(config, args).await?;
    let events = filter.apply(&events);
    let output = output.unwrap_or_else(|| PathBuf::from(export_file_name(Local::now())));

    let file = std::fs::File::create(&output)?;
    write_csv(events.iter().copied(), file)?;

    println!("Exported {} events to {:?}", events.len(), output);
    Ok(())
}

async fn run_briefing(config: &AppConfig, args: &QueryArgs) -> Result<()> {
    let (query, events) = load_window(config, args).await?;
    let assessment = assess(&events, &config.thresholds);
    let patterns = analyze(&events);

    let client = BriefingClient::new(config.llm.clone())?;
    if !client.is_configured() {
        warn!("llm.api_key is not set in the configuration");
    }

    println!("{}", client.summarize(&events, &assessment, &patterns, query.hours).await);
    Ok(())
}

fn run_regions(config: &AppConfig, format: &str) -> Result<()> {
    if format != "text" {
        println!("{}", serde_json::to_string_pretty(&config.regions)?);
        return Ok(());
    }

    println!("Regions:");
    for (name, bbox) in &config.regions {
        println!("  {:<14} {}", name, bbox);
    }
    Ok(())
}

async fn run_serve(mut config: AppConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.web.host = host;
    }
    if let Some(port) = port {
        config.web.port = port;
    }

    let client = CatalogClient::new(&config.catalog)?;
    quakeguard::web::start_server(config, Box::new(client)).await
}

/// Run config commands
fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output, force } => {
            if output.exists() && !force {
                return Err(QuakeGuardError::Config(format!(
                    "{:?} already exists. Use --force to overwrite", output
                )));
            }
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            config.validate()?;
            println!("Configuration at {:?} is valid", config_path);
            println!("  Catalog: {}", config.catalog.url);
            println!("  Regions: {}", config.regions.len());
            println!("  Briefings: {}", if config.llm.api_key.is_some() { "enabled" } else { "disabled" });
        }
    }

    Ok(())
}
