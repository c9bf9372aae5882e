//! Прогноз цены: обучение на истории и одно предсказание
//!
//! Использование: `coin-predict [--import <market_chart.json>] [data.csv]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ml_pipelines::apps::coin_predict;
use ml_pipelines::{MlContext, PipelineConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Coin price prediction from trading history")]
struct Args {
    /// Market chart JSON to convert into the price CSV before training
    #[arg(long)]
    import: Option<PathBuf>,

    /// Price history CSV: time, price, volume
    #[arg(default_value = coin_predict::DATA_FILE)]
    data: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Логи в stderr, в stdout только результат
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = PipelineConfig::from_env().context("loading pipeline config")?;
    let ctx = MlContext::new(config);

    if let Some(json_path) = &args.import {
        coin_predict::import_market_chart(json_path, &args.data)
            .with_context(|| format!("importing {}", json_path.display()))?;
    }

    let input = coin_predict::sample_input();
    let prediction = coin_predict::run(&ctx, &args.data, &input)
        .with_context(|| format!("predicting from {}", args.data.display()))?;

    println!("{}", coin_predict::format_prediction(&input, &prediction));
    Ok(())
}
