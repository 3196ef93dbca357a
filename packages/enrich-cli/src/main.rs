//! Runs one enrichment batch and prints its summary as JSON.
//!
//! Logs go to stderr; stdout carries only the JSON result.

mod config;
mod inputs;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use enrichment::{
    AdapterRegistry, BatchOrchestrator, CsvReportWriter, Direction, InputUnit,
    OpenAiDescriptionGenerator, OpenAiVision, ReportAssembler, Retailer,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{load_pricing, EnrichConfig};

#[derive(Parser)]
#[command(name = "enrich")]
#[command(about = "Enrich product URLs or photos with AI descriptions and cost accounting")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override ENRICH_CONCURRENCY
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Skip writing the CSV report
    #[arg(long, global = true)]
    no_report: bool,

    /// Print every item outcome, not just the summary
    #[arg(long, global = true)]
    full: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich a file of product URLs (one per line)
    Urls {
        /// Integration key, e.g. leroy_merlin
        #[arg(long)]
        integration: String,

        #[arg(long)]
        file: PathBuf,

        /// House brand for the URLs given with --house-brand-url
        #[arg(long, requires = "house_brand_url")]
        house_brand: Option<String>,

        #[arg(long)]
        house_brand_url: Vec<String>,
    },

    /// Enrich a directory of product photos
    Images {
        #[arg(long)]
        dir: PathBuf,
    },

    /// List integrations and their per-million token prices
    Integrations,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,enrichment=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Integrations => cmd_integrations(),
        Commands::Urls {
            ref integration,
            ref file,
            ref house_brand,
            ref house_brand_url,
        } => {
            let inputs = inputs::read_url_list(file).await?;
            let house = house_brand
                .as_ref()
                .map(|brand| (brand.clone(), house_brand_url.clone()));
            run_batch(&cli, integration, inputs, house).await
        }
        Commands::Images { ref dir } => {
            let inputs = inputs::read_image_dir(dir).await?;
            run_batch(&cli, Retailer::SamsClub.key(), inputs, None).await
        }
    }
}

fn cmd_integrations() -> Result<()> {
    let pricing = load_pricing()?;

    let rows: Vec<serde_json::Value> = Retailer::ALL
        .iter()
        .map(|retailer| {
            let key = retailer.key();
            let entry = pricing.get(key).ok();
            serde_json::json!({
                "key": key,
                "name": retailer.display_name(),
                "source_type": retailer.source_type().to_string(),
                "input_per_million": entry.map(|e| e.price_per_million(Direction::Input)),
                "output_per_million": entry.map(|e| e.price_per_million(Direction::Output)),
                "currency": entry.map(|e| e.currency.clone()),
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

async fn run_batch(
    cli: &Cli,
    integration: &str,
    inputs: Vec<InputUnit>,
    house_brand: Option<(String, Vec<String>)>,
) -> Result<()> {
    let config = EnrichConfig::from_env()?;

    let mut batch = config.batch.clone().with_report(!cli.no_report);
    if let Some(concurrency) = cli.concurrency {
        batch = batch.with_concurrency(concurrency);
    }

    let client = config.credentials.client()?;
    let vision = Arc::new(
        OpenAiVision::new(client.clone()).with_model(config.credentials.vision_model.clone()),
    );
    let generator = Arc::new(
        OpenAiDescriptionGenerator::new(client)
            .with_model(config.credentials.text_model.clone()),
    );

    let mut reporter = ReportAssembler::new(Arc::new(CsvReportWriter::new(&config.exports_dir)))
        .with_listing_pricing(config.listing.clone());
    if let Some((brand, ids)) = house_brand {
        reporter = reporter.with_house_brand(brand, ids);
    }

    let orchestrator = BatchOrchestrator::new(
        AdapterRegistry::builtin(vision)?,
        generator,
        config.pricing.clone(),
    )
    .with_config(batch)
    .with_reporter(reporter);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; cancelling batch");
            trigger.cancel();
        }
    });

    let report = orchestrator
        .run(integration, &inputs, &cancel)
        .await
        .context("Enrichment batch failed")?;

    let json = if cli.full {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string_pretty(&report.summary)?
    };
    println!("{}", json);

    Ok(())
}
