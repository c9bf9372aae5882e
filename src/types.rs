/// Типы данных для обеих программ

use serde::{Deserialize, Serialize};

use crate::data::loader::schema_of;
use crate::data::{ColumnType, Record, Schema, Value};
use crate::error::{PipelineError, Result};

/// Строка истории цены: `Time,Price,Volume`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub time: String, // unix timestamp строкой
    pub price: f32,
    pub volume: f32,
}

/// Строка выборки писем: `Message,Label`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpamRow {
    pub message: String,
    pub label: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePrediction {
    /// Колонка `Score` конвейера: нормализованный вектор признаков
    pub score: Vec<f32>,
    /// Собственный выход регрессора
    pub regression_score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpamPrediction {
    pub predicted_label: bool,
    pub probability: f32,
    pub score: f32,
}

impl Record for PriceRow {
    fn schema() -> Schema {
        schema_of(&[
            ("Time", ColumnType::Text),
            ("Price", ColumnType::Float32),
            ("Volume", ColumnType::Float32),
        ])
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.time.clone()),
            Value::Float(self.price),
            Value::Float(self.volume),
        ]
    }

    fn from_values(values: Vec<Value>) -> Result<Self> {
        match <[Value; 3]>::try_from(values) {
            Ok([Value::Text(time), Value::Float(price), Value::Float(volume)]) => {
                Ok(Self { time, price, volume })
            }
            _ => Err(PipelineError::ColumnType {
                column: "PriceRow".to_string(),
                expected: "text,float32,float32",
                found: "other",
            }),
        }
    }
}

impl Record for SpamRow {
    fn schema() -> Schema {
        schema_of(&[("Message", ColumnType::Text), ("Label", ColumnType::Boolean)])
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::Text(self.message.clone()), Value::Bool(self.label)]
    }

    fn from_values(values: Vec<Value>) -> Result<Self> {
        match <[Value; 2]>::try_from(values) {
            Ok([Value::Text(message), Value::Bool(label)]) => Ok(Self { message, label }),
            _ => Err(PipelineError::ColumnType {
                column: "SpamRow".to_string(),
                expected: "text,boolean",
                found: "other",
            }),
        }
    }
}
