//! Бинарная логистическая регрессия, обучаемая SDCA

#![allow(non_snake_case)]

use linfa::traits::{Fit, PredictInplace};
use linfa::DatasetBase;
use ndarray::{Array1, Array2};

use super::sdca::{self, sigmoid, LinearModel, LogLoss, SdcaOptions, TrainingSummary};
use crate::error::{PipelineError, Result};

/// Порог вероятности для положительного класса
pub const DECISION_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct SdcaLogisticRegression {
    options: SdcaOptions,
    seed: u64,
}

impl SdcaLogisticRegression {
    pub fn new(options: SdcaOptions, seed: u64) -> Self {
        Self { options, seed }
    }
}

#[derive(Debug, Clone)]
pub struct FittedSdcaLogisticRegression {
    model: LinearModel,
    summary: TrainingSummary,
}

impl FittedSdcaLogisticRegression {
    /// Сырой отступ w·x + b
    pub fn decision_function(&self, x: &Array2<f64>) -> Array1<f64> {
        self.model.margins(x)
    }

    pub fn predict_probabilities(&self, x: &Array2<f64>) -> Array1<f64> {
        self.decision_function(x).mapv(sigmoid)
    }

    pub fn summary(&self) -> &TrainingSummary {
        &self.summary
    }

    pub fn n_features(&self) -> usize {
        self.model.weights.len()
    }
}

impl Fit<Array2<f64>, Array1<bool>, PipelineError> for SdcaLogisticRegression {
    type Object = FittedSdcaLogisticRegression;

    fn fit(&self, dataset: &DatasetBase<Array2<f64>, Array1<bool>>) -> Result<Self::Object> {
        let X = &dataset.records;
        let labels = &dataset.targets;

        let positives = labels.iter().filter(|&&l| l).count();
        if positives == 0 || positives == labels.len() {
            return Err(PipelineError::Degenerate(
                "binary classification needs both labels in the training data".to_string(),
            ));
        }

        let y = labels.mapv(|l| if l { 1.0 } else { -1.0 });
        let (model, summary) = sdca::train(X, &y, &LogLoss, &self.options, self.seed)?;

        let accuracy = model
            .margins(X)
            .iter()
            .zip(labels.iter())
            .filter(|&(&m, &l)| (sigmoid(m) >= DECISION_THRESHOLD) == l)
            .count() as f64
            / labels.len() as f64;
        tracing::info!(
            "SDCA logistic regression trained: {} epochs, gap {:.3e}, training accuracy: {:.3}",
            summary.epochs,
            summary.duality_gap,
            accuracy
        );

        Ok(FittedSdcaLogisticRegression { model, summary })
    }
}

impl PredictInplace<Array2<f64>, Array1<bool>> for FittedSdcaLogisticRegression {
    fn predict_inplace<'a>(&'a self, x: &'a Array2<f64>, y: &mut Array1<bool>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "number of rows in records and targets must match"
        );
        for (target, p) in y.iter_mut().zip(self.predict_probabilities(x).iter()) {
            *target = *p >= DECISION_THRESHOLD;
        }
    }

    fn default_target(&self, x: &Array2<f64>) -> Array1<bool> {
        Array1::from_elem(x.nrows(), false)
    }
}
