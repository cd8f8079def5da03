//! adforge — synthetic ad-performance data generator.
//!
//! Main entry point: loads configuration, runs one generation pass, writes
//! the CSV blob, and logs a summary per campaign.

use adforge_core::config::GeneratorConfig;
use adforge_core::format;
use adforge_core::sample::CountRange;
use adforge_engine::generator;
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "adforge")]
#[command(about = "Synthetic ad-performance data generator")]
#[command(version)]
struct Cli {
    /// Campaign duration in days (overrides config)
    #[arg(long, env = "ADFORGE__DAYS_IN_CAMPAIGN")]
    days: Option<u32>,

    /// RNG seed for reproducible runs (overrides config)
    #[arg(long, env = "ADFORGE__SEED")]
    seed: Option<u64>,

    /// Exact number of campaigns to generate (overrides the configured range)
    #[arg(long)]
    campaigns: Option<u32>,

    /// Directory the CSV blob is written into
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Skip writing the CSV blob
    #[arg(long, default_value_t = false)]
    no_csv: bool,

    /// Print the generation payload as JSON on stdout
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing; logs go to stderr so --json stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adforge=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = GeneratorConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        GeneratorConfig::default()
    });

    // Apply CLI overrides
    if let Some(days) = cli.days {
        config.days_in_campaign = days;
    }
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(n) = cli.campaigns {
        config.campaigns_per_run = CountRange::new(n, n);
    }

    info!(
        days = config.days_in_campaign,
        campaigns_min = config.campaigns_per_run.min,
        campaigns_max = config.campaigns_per_run.max,
        seed = ?config.seed,
        "Configuration loaded"
    );

    let output = generator::generate(&config)?;

    for digest in &output.campaigns {
        info!(
            campaign = %digest.name,
            start = %digest.start_date,
            end = %digest.end_date,
            cpm = format::currency(digest.cpm),
            ctr_pct = format::percent(digest.ctr),
            cac = format::currency(digest.cac),
            aov = format::currency(digest.aov),
            atc_rate_pct = format::percent(digest.atc_rate),
            "Campaign generated"
        );
    }

    if !cli.no_csv {
        let path = cli.out_dir.join(&output.csv_name);
        std::fs::write(&path, &output.csv)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), bytes = output.csv.len(), "CSV blob written");
    }

    if cli.json {
        println!("{}", output.to_json()?);
    }

    Ok(())
}
