//! Текст → числовой вектор фиксированной ширины

use std::collections::HashMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOptions {
    /// Максимальная длина словесных n-грамм (1 = только слова)
    #[serde(default = "default_word_ngram_length")]
    pub word_ngram_length: usize,
    /// Длина символьных n-грамм, 0 отключает их
    #[serde(default = "default_char_ngram_length")]
    pub char_ngram_length: usize,
    #[serde(default = "default_lowercase")]
    pub lowercase: bool,
}

fn default_word_ngram_length() -> usize {
    2
}

fn default_char_ngram_length() -> usize {
    3
}

fn default_lowercase() -> bool {
    true
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            word_ngram_length: default_word_ngram_length(),
            char_ngram_length: default_char_ngram_length(),
            lowercase: default_lowercase(),
        }
    }
}

impl TextOptions {
    pub fn validate(&self) -> Result<()> {
        if self.word_ngram_length == 0 {
            return Err(PipelineError::Config(
                "text.word_ngram_length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Словарь n-грамм + частоты термов с L2-нормировкой строки
#[derive(Debug, Clone)]
pub struct TextFeaturizer {
    options: TextOptions,
    vocabulary: HashMap<String, usize>,
}

impl TextFeaturizer {
    pub fn new(options: TextOptions) -> Self {
        Self {
            options,
            vocabulary: HashMap::new(),
        }
    }

    pub fn fit(&mut self, documents: &[String]) -> Result<()> {
        if documents.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }

        self.vocabulary.clear();
        for doc in documents {
            for term in self.terms(doc) {
                let next = self.vocabulary.len();
                self.vocabulary.entry(term).or_insert(next);
            }
        }

        if self.vocabulary.is_empty() {
            return Err(PipelineError::Degenerate(
                "no tokens found in text column".to_string(),
            ));
        }

        tracing::debug!(
            "Text featurizer vocabulary: {} terms from {} documents",
            self.vocabulary.len(),
            documents.len()
        );
        Ok(())
    }

    /// Термы, которых нет в словаре, игнорируются
    pub fn transform(&self, documents: &[String]) -> Array2<f32> {
        let mut features = Array2::zeros((documents.len(), self.vocabulary.len()));

        for (i, doc) in documents.iter().enumerate() {
            let mut row = features.row_mut(i);
            for term in self.terms(doc) {
                if let Some(&j) = self.vocabulary.get(&term) {
                    row[j] += 1.0;
                }
            }

            let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
            if norm > 0.0 {
                row.mapv_inplace(|v| v / norm);
            }
        }

        features
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    fn terms(&self, text: &str) -> Vec<String> {
        let text = if self.options.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let tokens: Vec<&str> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        let mut terms = Vec::new();

        // Словесные n-граммы
        for n in 1..=self.options.word_ngram_length {
            for window in tokens.windows(n) {
                terms.push(format!("w:{}", window.join(" ")));
            }
        }

        // Символьные n-граммы внутри слова с маркерами границ
        let n = self.options.char_ngram_length;
        if n > 0 {
            for token in &tokens {
                let chars: Vec<char> = format!("<{}>", token).chars().collect();
                for window in chars.windows(n) {
                    terms.push(format!("c:{}", window.iter().collect::<String>()));
                }
            }
        }

        terms
    }
}
