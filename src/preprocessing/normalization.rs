//! Min-max нормализация

#![allow(non_snake_case)]

use ndarray::{Array1, Array2, Axis};

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone)]
pub struct MinMaxNormalizer {
    min: Option<Array1<f32>>,
    range: Option<Array1<f32>>,
    is_fitted: bool,
}

impl MinMaxNormalizer {
    pub fn new() -> Self {
        Self {
            min: None,
            range: None,
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, X: &Array2<f32>) -> Result<()> {
        if X.nrows() == 0 {
            return Err(PipelineError::EmptyDataset);
        }

        // Минимум и максимум по каждому признаку
        let min = X.fold_axis(Axis(0), f32::INFINITY, |&acc, &x| acc.min(x));
        let max = X.fold_axis(Axis(0), f32::NEG_INFINITY, |&acc, &x| acc.max(x));

        self.range = Some(&max - &min);
        self.min = Some(min);
        self.is_fitted = true;
        Ok(())
    }

    /// Значения вне наблюдавшегося диапазона не обрезаются
    pub fn transform(&self, X: &Array2<f32>) -> Result<Array2<f32>> {
        let (min, range) = match (&self.min, &self.range) {
            (Some(min), Some(range)) if self.is_fitted => (min, range),
            _ => return Err(PipelineError::Degenerate("normalizer not fitted".to_string())),
        };

        if X.ncols() != min.len() {
            return Err(PipelineError::Degenerate(format!(
                "normalizer fitted on {} features, got {}",
                min.len(),
                X.ncols()
            )));
        }

        let mut normalized = X.clone();
        for mut row in normalized.rows_mut() {
            for (i, val) in row.iter_mut().enumerate() {
                // Постоянный признак переводится в 0
                *val = if range[i] > 0.0 {
                    (*val - min[i]) / range[i]
                } else {
                    0.0
                };
            }
        }

        Ok(normalized)
    }

    pub fn fit_transform(&mut self, X: &Array2<f32>) -> Result<Array2<f32>> {
        self.fit(X)?;
        self.transform(X)
    }
}

impl Default for MinMaxNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
