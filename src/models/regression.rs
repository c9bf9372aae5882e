//! Линейная регрессия, обучаемая SDCA

#![allow(non_snake_case)]

use linfa::traits::{Fit, PredictInplace};
use linfa::DatasetBase;
use ndarray::{Array1, Array2};

use super::sdca::{self, LinearModel, SdcaOptions, SquaredLoss, TrainingSummary};
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone)]
pub struct SdcaRegression {
    options: SdcaOptions,
    seed: u64,
}

impl SdcaRegression {
    pub fn new(options: SdcaOptions, seed: u64) -> Self {
        Self { options, seed }
    }
}

#[derive(Debug, Clone)]
pub struct FittedSdcaRegression {
    model: LinearModel,
    summary: TrainingSummary,
}

impl FittedSdcaRegression {
    pub fn weights(&self) -> &Array1<f64> {
        &self.model.weights
    }

    pub fn bias(&self) -> f64 {
        self.model.bias
    }

    pub fn summary(&self) -> &TrainingSummary {
        &self.summary
    }

    pub fn n_features(&self) -> usize {
        self.model.weights.len()
    }
}

impl Fit<Array2<f64>, Array1<f64>, PipelineError> for SdcaRegression {
    type Object = FittedSdcaRegression;

    fn fit(&self, dataset: &DatasetBase<Array2<f64>, Array1<f64>>) -> Result<Self::Object> {
        let X = &dataset.records;
        let y = &dataset.targets;

        let (model, summary) = sdca::train(X, y, &SquaredLoss, &self.options, self.seed)?;

        // MAE на обучающей выборке, только для логирования
        let mae = (model.margins(X) - y).mapv(f64::abs).mean().unwrap_or(0.0);
        tracing::info!(
            "SDCA regression trained: {} epochs, gap {:.3e}, MAE: {:.6}",
            summary.epochs,
            summary.duality_gap,
            mae
        );

        Ok(FittedSdcaRegression { model, summary })
    }
}

impl PredictInplace<Array2<f64>, Array1<f64>> for FittedSdcaRegression {
    fn predict_inplace<'a>(&'a self, x: &'a Array2<f64>, y: &mut Array1<f64>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "number of rows in records and targets must match"
        );
        y.assign(&self.model.margins(x));
    }

    fn default_target(&self, x: &Array2<f64>) -> Array1<f64> {
        Array1::zeros(x.nrows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linfa::traits::Predict;
    use linfa::DatasetBase;
    use ndarray::array;

    #[test]
    fn test_fit_predict_through_linfa_traits() {
        let X = array![[0.0, 1.0], [1.0, 0.0], [0.5, 0.5], [1.0, 1.0]];
        // y = x0 + 2·x1
        let y = array![2.0, 1.0, 1.5, 3.0];
        let dataset = DatasetBase::new(X.clone(), y.clone());

        let options = SdcaOptions {
            l2: 1e-6,
            tolerance: 1e-10,
            max_epochs: 2000,
        };
        let fitted = SdcaRegression::new(options, 1).fit(&dataset).unwrap();
        let predicted: Array1<f64> = fitted.predict(&X);

        for (p, t) in predicted.iter().zip(y.iter()) {
            assert!((p - t).abs() < 0.05, "{p} vs {t}");
        }
        assert_eq!(fitted.n_features(), 2);
        assert!(fitted.weights()[1] > fitted.weights()[0]);
        assert!(fitted.bias().is_finite());
        assert!(fitted.summary().epochs > 0);
    }
}
