//! Stochastic Dual Coordinate Ascent для линейных моделей с L2-регуляризацией
//!
//! Прямая задача: min (1/n) Σ φ(w·xᵢ + b, yᵢ) + (λ/2)(‖w‖² + b²).
//! Смещение обучается как вес постоянного признака 1.

#![allow(non_snake_case)]

use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdcaOptions {
    /// Коэффициент L2-регуляризации λ
    #[serde(default = "default_l2")]
    pub l2: f64,
    /// Порог зазора двойственности для остановки
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_epochs")]
    pub max_epochs: usize,
}

fn default_l2() -> f64 {
    1e-3
}

fn default_tolerance() -> f64 {
    1e-5
}

fn default_max_epochs() -> usize {
    200
}

impl Default for SdcaOptions {
    fn default() -> Self {
        Self {
            l2: default_l2(),
            tolerance: default_tolerance(),
            max_epochs: default_max_epochs(),
        }
    }
}

impl SdcaOptions {
    pub fn validate(&self, name: &str) -> Result<()> {
        if !(self.l2 > 0.0 && self.l2.is_finite()) {
            return Err(PipelineError::Config(format!("{name}.l2 must be positive")));
        }
        if !(self.tolerance > 0.0) {
            return Err(PipelineError::Config(format!("{name}.tolerance must be positive")));
        }
        if self.max_epochs == 0 {
            return Err(PipelineError::Config(format!("{name}.max_epochs must be positive")));
        }
        Ok(())
    }
}

/// Гладкая функция потерь φ(a, y) с константой гладкости 1/γ
pub(crate) trait Loss {
    const GAMMA: f64;

    fn loss(&self, margin: f64, y: f64) -> f64;

    fn derivative(&self, margin: f64, y: f64) -> f64;

    /// −φ*(−α): вклад одной двойственной переменной
    fn dual(&self, alpha: f64, y: f64) -> f64;
}

/// φ(a) = ½(a − y)²
pub(crate) struct SquaredLoss;

impl Loss for SquaredLoss {
    const GAMMA: f64 = 1.0;

    fn loss(&self, margin: f64, y: f64) -> f64 {
        0.5 * (margin - y).powi(2)
    }

    fn derivative(&self, margin: f64, y: f64) -> f64 {
        margin - y
    }

    fn dual(&self, alpha: f64, y: f64) -> f64 {
        alpha * y - 0.5 * alpha * alpha
    }
}

/// φ(a) = ln(1 + exp(−y·a)), y ∈ {−1, +1}
pub(crate) struct LogLoss;

impl Loss for LogLoss {
    const GAMMA: f64 = 4.0;

    fn loss(&self, margin: f64, y: f64) -> f64 {
        let z = -y * margin;
        // ln(1 + e^z) без переполнения
        if z > 0.0 {
            z + (-z).exp().ln_1p()
        } else {
            z.exp().ln_1p()
        }
    }

    fn derivative(&self, margin: f64, y: f64) -> f64 {
        -y * sigmoid(-y * margin)
    }

    fn dual(&self, alpha: f64, y: f64) -> f64 {
        let t = (alpha * y).clamp(0.0, 1.0);
        -(xlogx(t) + xlogx(1.0 - t))
    }
}

fn xlogx(x: f64) -> f64 {
    if x <= 0.0 {
        0.0
    } else {
        x * x.ln()
    }
}

pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[derive(Debug, Clone)]
pub struct LinearModel {
    pub weights: Array1<f64>,
    pub bias: f64,
}

impl LinearModel {
    pub fn margin(&self, x: ArrayView1<f64>) -> f64 {
        x.dot(&self.weights) + self.bias
    }

    pub fn margins(&self, X: &Array2<f64>) -> Array1<f64> {
        X.dot(&self.weights) + self.bias
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TrainingSummary {
    pub epochs: usize,
    pub primal: f64,
    pub duality_gap: f64,
    pub converged: bool,
}

pub(crate) fn train<L: Loss>(
    X: &Array2<f64>,
    y: &Array1<f64>,
    loss: &L,
    options: &SdcaOptions,
    seed: u64,
) -> Result<(LinearModel, TrainingSummary)> {
    let n_samples = X.nrows();
    let n_features = X.ncols();

    if n_samples == 0 {
        return Err(PipelineError::EmptyDataset);
    }
    if y.len() != n_samples {
        return Err(PipelineError::Degenerate(format!(
            "{} feature rows but {} labels",
            n_samples,
            y.len()
        )));
    }
    if X.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(PipelineError::Degenerate(
            "non-finite value in training data".to_string(),
        ));
    }

    let lambda_n = options.l2 * n_samples as f64;
    let scale = lambda_n * L::GAMMA;
    // ‖xᵢ‖² с учетом постоянного признака смещения
    let sq_norms: Vec<f64> = X.rows().into_iter().map(|row| row.dot(&row) + 1.0).collect();

    let mut alpha = Array1::<f64>::zeros(n_samples);
    let mut model = LinearModel {
        weights: Array1::zeros(n_features),
        bias: 0.0,
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let mut order: Vec<usize> = (0..n_samples).collect();
    let mut summary = TrainingSummary {
        epochs: 0,
        primal: f64::INFINITY,
        duality_gap: f64::INFINITY,
        converged: false,
    };

    for epoch in 1..=options.max_epochs {
        order.shuffle(&mut rng);

        for &i in &order {
            let x_i = X.row(i);
            let margin = model.margin(x_i);
            let target = -loss.derivative(margin, y[i]);
            let step = scale / (sq_norms[i] + scale);
            let delta = step * (target - alpha[i]);
            if delta == 0.0 {
                continue;
            }

            alpha[i] += delta;
            model.weights.scaled_add(delta / lambda_n, &x_i);
            model.bias += delta / lambda_n;
        }

        // Зазор двойственности
        let margins = model.margins(X);
        let reg = 0.5 * options.l2 * (model.weights.dot(&model.weights) + model.bias * model.bias);
        let primal = margins
            .iter()
            .zip(y.iter())
            .map(|(&m, &t)| loss.loss(m, t))
            .sum::<f64>()
            / n_samples as f64
            + reg;
        let dual = alpha
            .iter()
            .zip(y.iter())
            .map(|(&a, &t)| loss.dual(a, t))
            .sum::<f64>()
            / n_samples as f64
            - reg;

        summary = TrainingSummary {
            epochs: epoch,
            primal,
            duality_gap: primal - dual,
            converged: primal - dual <= options.tolerance,
        };
        if summary.converged {
            break;
        }
    }

    if !model.bias.is_finite() || model.weights.iter().any(|w| !w.is_finite()) {
        return Err(PipelineError::Degenerate(
            "training diverged to non-finite weights".to_string(),
        ));
    }

    if !summary.converged {
        tracing::warn!(
            "SDCA stopped after {} epochs, duality gap {:.3e}",
            summary.epochs,
            summary.duality_gap
        );
    }

    Ok((model, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_squared_loss_fits_line() {
        // y = 2x + 1
        let X = array![[0.0], [0.25], [0.5], [0.75], [1.0]];
        let y = array![1.0, 1.5, 2.0, 2.5, 3.0];
        let options = SdcaOptions {
            l2: 1e-6,
            tolerance: 1e-10,
            max_epochs: 5000,
        };

        let (model, summary) = train(&X, &y, &SquaredLoss, &options, 3).unwrap();
        assert!(summary.duality_gap >= -1e-9);
        assert!((model.weights[0] - 2.0).abs() < 0.05, "w = {}", model.weights[0]);
        assert!((model.bias - 1.0).abs() < 0.05, "b = {}", model.bias);
    }

    #[test]
    fn test_log_loss_separates_classes() {
        let X = array![[0.0, 1.0], [0.1, 0.9], [0.9, 0.1], [1.0, 0.0]];
        let y = array![-1.0, -1.0, 1.0, 1.0];

        let (model, _) = train(&X, &y, &LogLoss, &SdcaOptions::default(), 5).unwrap();
        let margins = model.margins(&X);
        assert!(margins[0] < 0.0 && margins[1] < 0.0);
        assert!(margins[2] > 0.0 && margins[3] > 0.0);
    }

    #[test]
    fn test_same_seed_same_model() {
        let X = array![[0.2, 0.1], [0.4, 0.9], [0.6, 0.3], [0.8, 0.7]];
        let y = array![0.5, 1.1, 0.9, 1.4];
        let options = SdcaOptions {
            max_epochs: 3,
            ..SdcaOptions::default()
        };

        let (a, _) = train(&X, &y, &SquaredLoss, &options, 11).unwrap();
        let (b, _) = train(&X, &y, &SquaredLoss, &options, 11).unwrap();
        assert_eq!(a.weights, b.weights);
        assert_eq!(a.bias, b.bias);
    }

    #[test]
    fn test_non_finite_rejected() {
        let X = array![[f64::NAN]];
        let y = array![1.0];
        assert!(matches!(
            train(&X, &y, &SquaredLoss, &SdcaOptions::default(), 0),
            Err(PipelineError::Degenerate(_))
        ));
    }

    #[test]
    fn test_log_loss_is_stable() {
        assert!(LogLoss.loss(1000.0, -1.0).is_finite());
        assert!((LogLoss.loss(0.0, 1.0) - 2f64.ln()).abs() < 1e-12);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
    }
}
