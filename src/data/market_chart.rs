//! Импорт сохраненного ответа CoinGecko `market_chart` в формат загрузчика

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::types::PriceRow;

/// Пары `[timestamp_ms, value]`
#[derive(Debug, Clone, Deserialize)]
pub struct MarketChart {
    pub prices: Vec<(f64, f64)>,
    pub total_volumes: Vec<(f64, f64)>,
}

impl MarketChart {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Одна строка на точку цены; объем берется из точки с тем же индексом
    pub fn to_rows(&self) -> Result<Vec<PriceRow>> {
        if self.total_volumes.len() < self.prices.len() {
            return Err(PipelineError::MarketChart(format!(
                "{} prices but only {} volumes",
                self.prices.len(),
                self.total_volumes.len()
            )));
        }

        Ok(self
            .prices
            .iter()
            .zip(&self.total_volumes)
            .map(|(&(time, price), &(_, volume))| PriceRow {
                time: (time as i64).to_string(),
                price: price as f32,
                volume: volume as f32,
            })
            .collect())
    }
}

/// Время для логов. Значения больше 1e11 считаются миллисекундами.
pub fn format_timestamp(raw: &str) -> Option<String> {
    let value: i64 = raw.trim().parse().ok()?;
    let secs = if value.abs() > 100_000_000_000 {
        value / 1000
    } else {
        value
    };
    let time: DateTime<Utc> = DateTime::from_timestamp(secs, 0)?;
    Some(time.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}
