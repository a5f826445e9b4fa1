mod config;
mod fetch;
mod parser;
mod pipeline;
mod record;
mod sink;

use std::path::Path;
use std::time::Instant;

use clap::Parser;

use crate::fetch::FetchCache;
use crate::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "oh_trails", about = "OregonHikers.org hike metadata scraper")]
struct Cli {
    /// Also ingest the fixed sample hikes to oh_hikes.csv first
    #[arg(long)]
    samples: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let config = config::Config::from_env();
    let pipeline = Pipeline::new(FetchCache::new(&config));

    if cli.samples {
        let records = pipeline.sample_hikes().await?;
        sink::write_csv(&records, Path::new("oh_hikes.csv"))?;
        println!("Wrote {} sample hikes to oh_hikes.csv", records.len());
    }

    let records = pipeline.backpackable_hikes().await?;
    sink::write_parquet(&records, Path::new("raw_oh_hikes.parquet"))?;
    println!(
        "Wrote {} backpackable hikes to raw_oh_hikes.parquet",
        records.len()
    );

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
