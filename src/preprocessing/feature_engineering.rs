//! Сборка вектора признаков из колонок таблицы

use ndarray::{concatenate, Array2, ArrayView2, Axis};

use crate::data::{Column, DataTable};
use crate::error::{PipelineError, Result};

pub struct FeatureEngineer;

impl FeatureEngineer {
    /// Склеивает колонки по горизонтали в заданном порядке.
    /// Скалярные float-колонки дают один признак, векторные свою ширину.
    pub fn concatenate(table: &DataTable, inputs: &[String]) -> Result<Array2<f32>> {
        if inputs.is_empty() {
            return Err(PipelineError::Config(
                "concatenate needs at least one input column".to_string(),
            ));
        }

        let n_rows = table.n_rows();
        let mut blocks: Vec<Array2<f32>> = Vec::with_capacity(inputs.len());

        for name in inputs {
            let block = match table.column(name)? {
                Column::Float(values) => Array2::from_shape_vec((n_rows, 1), values.clone())
                    .map_err(|e| PipelineError::Degenerate(e.to_string()))?,
                Column::Vector(matrix) => matrix.clone(),
                Column::Bool(values) => Array2::from_shape_fn((n_rows, 1), |(i, _)| {
                    if values[i] { 1.0 } else { 0.0 }
                }),
                other => {
                    return Err(PipelineError::ColumnType {
                        column: name.clone(),
                        expected: "float32 or vector",
                        found: other.kind(),
                    })
                }
            };
            blocks.push(block);
        }

        let views: Vec<ArrayView2<f32>> = blocks.iter().map(|b| b.view()).collect();
        concatenate(Axis(1), &views).map_err(|e| PipelineError::Degenerate(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_concatenate_in_declared_order() {
        let mut table = DataTable::new();
        table.insert("Encoded", Column::Vector(array![[1.0, 0.0], [0.0, 1.0]])).unwrap();
        table.insert("Volume", Column::Float(vec![10.0, 20.0])).unwrap();

        let features =
            FeatureEngineer::concatenate(&table, &["Encoded".to_string(), "Volume".to_string()])
                .unwrap();
        assert_eq!(features, array![[1.0, 0.0, 10.0], [0.0, 1.0, 20.0]]);

        let reversed =
            FeatureEngineer::concatenate(&table, &["Volume".to_string(), "Encoded".to_string()])
                .unwrap();
        assert_eq!(reversed.row(0).to_vec(), vec![10.0, 1.0, 0.0]);
    }

    #[test]
    fn test_text_column_rejected() {
        let mut table = DataTable::new();
        table.insert("Message", Column::Text(vec!["hi".into()])).unwrap();

        let err = FeatureEngineer::concatenate(&table, &["Message".to_string()]).unwrap_err();
        assert!(matches!(err, PipelineError::ColumnType { .. }));
    }
}
