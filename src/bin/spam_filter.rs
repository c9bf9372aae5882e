//! Фильтр спама: обучение на размеченных письмах и одна проверка
//!
//! Использование: `spam-filter [email.csv]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ml_pipelines::apps::spam_filter;
use ml_pipelines::{MlContext, PipelineConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Spam filter trained on labelled messages")]
struct Args {
    /// Labelled messages CSV: message, label
    #[arg(default_value = spam_filter::DATA_FILE)]
    data: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = PipelineConfig::from_env().context("loading pipeline config")?;
    let ctx = MlContext::new(config);

    let message = spam_filter::SAMPLE_MESSAGE;
    let prediction = spam_filter::run(&ctx, &args.data, message)
        .with_context(|| format!("classifying with data from {}", args.data.display()))?;

    println!("{}", spam_filter::format_prediction(message, &prediction));
    Ok(())
}
