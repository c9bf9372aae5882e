//! Ошибки загрузки данных, обучения и предсказания

use std::path::PathBuf;

use crate::data::ColumnType;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("line {line}, column '{column}': cannot parse {value:?} as {expected}")]
    Parse {
        line: u64,
        column: String,
        value: String,
        expected: ColumnType,
    },

    #[error("column '{0}' not found")]
    MissingColumn(String),

    #[error("column '{column}' has type {found}, expected {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("column '{column}' has {found} rows, table has {expected}")]
    RowCount {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("empty dataset")]
    EmptyDataset,

    #[error("degenerate training data: {0}")]
    Degenerate(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid market chart: {0}")]
    MarketChart(String),

    #[error(transparent)]
    Linfa(#[from] linfa::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
