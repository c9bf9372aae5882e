//! ML pipelines - прогноз цены монеты и фильтр спама

pub mod apps;
pub mod config;
pub mod context;
pub mod data;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod types;

pub use config::PipelineConfig;
pub use context::MlContext;
pub use error::{PipelineError, Result};
pub use pipeline::{FittedPipeline, Pipeline, PredictionEngine, Stage, Trainer, Transform};
pub use types::*;
