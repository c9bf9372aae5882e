//! One-hot кодирование категориальной колонки

use std::collections::HashMap;

use ndarray::Array2;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone)]
pub struct OneHotEncoder {
    max_keys: usize,
    keys: Vec<String>,
    index: HashMap<String, usize>,
}

impl OneHotEncoder {
    pub fn new(max_keys: usize) -> Self {
        Self {
            max_keys,
            keys: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Ключи нумеруются в порядке первого появления; сверх `max_keys` значения не запоминаются
    pub fn fit(&mut self, values: &[String]) -> Result<()> {
        if values.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }

        self.keys.clear();
        self.index.clear();
        for value in values {
            if self.keys.len() >= self.max_keys {
                break;
            }
            if !self.index.contains_key(value) {
                self.index.insert(value.clone(), self.keys.len());
                self.keys.push(value.clone());
            }
        }

        tracing::debug!("One-hot encoder learned {} keys", self.keys.len());
        Ok(())
    }

    /// Незнакомое значение кодируется нулевым вектором.
    /// Результат плотный: n строк на число ключей, для метки времени на строку
    /// это квадрат числа строк.
    pub fn transform(&self, values: &[String]) -> Array2<f32> {
        let mut encoded = Array2::zeros((values.len(), self.keys.len()));
        let mut unseen = 0usize;

        for (i, value) in values.iter().enumerate() {
            match self.index.get(value) {
                Some(&j) => encoded[[i, j]] = 1.0,
                None => unseen += 1,
            }
        }

        if unseen > 0 {
            tracing::debug!("{} values not seen during fit, encoded as zeros", unseen);
        }
        encoded
    }

    pub fn n_keys(&self) -> usize {
        self.keys.len()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}
