//! Конвейер преобразований колонок и обучения
//!
//! Конвейер это упорядоченный список стадий. `fit` проходит стадии по порядку:
//! каждая обучается на текущей таблице, применяется к ней, и результат
//! передается следующей стадии. Сам конвейер после объявления не меняется;
//! все обученное состояние живет в `FittedPipeline`.

#![allow(non_snake_case)]

use std::marker::PhantomData;

use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use ndarray::{Array1, Array2};

use crate::context::MlContext;
use crate::data::{Column, DataTable, Record};
use crate::error::{PipelineError, Result};
use crate::models::{
    FittedSdcaLogisticRegression, FittedSdcaRegression, SdcaLogisticRegression, SdcaRegression,
};
use crate::preprocessing::{FeatureEngineer, MinMaxNormalizer, OneHotEncoder, TextFeaturizer};

/// Колонки, которые пишут обучаемые стадии
pub const SCORE: &str = "Score";
pub const PROBABILITY: &str = "Probability";
pub const PREDICTED_LABEL: &str = "PredictedLabel";

#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    Copy { input: String, output: String },
    OneHot { input: String, output: String },
    FeaturizeText { input: String, output: String },
    Concatenate { inputs: Vec<String>, output: String },
    NormalizeMinMax { input: String, output: String },
}

impl Transform {
    pub fn copy(output: &str, input: &str) -> Self {
        Transform::Copy {
            input: input.to_string(),
            output: output.to_string(),
        }
    }

    pub fn one_hot(output: &str, input: &str) -> Self {
        Transform::OneHot {
            input: input.to_string(),
            output: output.to_string(),
        }
    }

    pub fn featurize_text(output: &str, input: &str) -> Self {
        Transform::FeaturizeText {
            input: input.to_string(),
            output: output.to_string(),
        }
    }

    pub fn concatenate(output: &str, inputs: &[&str]) -> Self {
        Transform::Concatenate {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            output: output.to_string(),
        }
    }

    /// Нормализация колонки на месте
    pub fn normalize_min_max(column: &str) -> Self {
        Transform::NormalizeMinMax {
            input: column.to_string(),
            output: column.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Trainer {
    /// Пишет `Score`
    SdcaRegression { label: String, features: String },
    /// Пишет `Score`, `Probability` и `PredictedLabel`
    SdcaLogisticRegression { label: String, features: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Transform(Transform),
    Trainer(Trainer),
}

impl From<Transform> for Stage {
    fn from(t: Transform) -> Self {
        Stage::Transform(t)
    }
}

impl From<Trainer> for Stage {
    fn from(t: Trainer) -> Self {
        Stage::Trainer(t)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(mut self, stage: impl Into<Stage>) -> Self {
        self.stages.push(stage.into());
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn fit(&self, ctx: &MlContext, data: &DataTable) -> Result<FittedPipeline> {
        if data.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }

        let mut table = data.clone();
        let mut fitted = Vec::with_capacity(self.stages.len());

        for (index, stage) in self.stages.iter().enumerate() {
            let stage = fit_stage(ctx, index, stage, &table)?;
            stage.apply(&mut table)?;
            tracing::debug!("Fitted stage {}: {}", index, stage.name());
            fitted.push(stage);
        }

        tracing::info!(
            "Pipeline fitted: {} stages on {} rows, seed {}",
            fitted.len(),
            data.n_rows(),
            ctx.seed()
        );
        Ok(FittedPipeline { stages: fitted })
    }
}

fn fit_stage(
    ctx: &MlContext,
    index: usize,
    stage: &Stage,
    table: &DataTable,
) -> Result<FittedStage> {
    let config = ctx.config();

    let fitted = match stage {
        Stage::Transform(Transform::Copy { input, output }) => {
            table.column(input)?;
            FittedStage::Copy {
                input: input.clone(),
                output: output.clone(),
            }
        }
        Stage::Transform(Transform::OneHot { input, output }) => {
            let mut encoder = OneHotEncoder::new(config.one_hot_max_keys);
            encoder.fit(table.text(input)?)?;
            FittedStage::OneHot {
                input: input.clone(),
                output: output.clone(),
                encoder,
            }
        }
        Stage::Transform(Transform::FeaturizeText { input, output }) => {
            let mut featurizer = TextFeaturizer::new(config.text.clone());
            featurizer.fit(table.text(input)?)?;
            FittedStage::FeaturizeText {
                input: input.clone(),
                output: output.clone(),
                featurizer,
            }
        }
        Stage::Transform(Transform::Concatenate { inputs, output }) => {
            FeatureEngineer::concatenate(table, inputs)?;
            FittedStage::Concatenate {
                inputs: inputs.clone(),
                output: output.clone(),
            }
        }
        Stage::Transform(Transform::NormalizeMinMax { input, output }) => {
            let mut normalizer = MinMaxNormalizer::new();
            normalizer.fit(&as_matrix(table, input)?)?;
            FittedStage::NormalizeMinMax {
                input: input.clone(),
                output: output.clone(),
                normalizer,
            }
        }
        Stage::Trainer(Trainer::SdcaRegression { label, features }) => {
            let X = feature_matrix(table, features)?;
            let y: Array1<f64> = table.floats(label)?.iter().map(|&v| v as f64).collect();
            let trainer = SdcaRegression::new(config.regression.clone(), ctx.stage_seed(index));
            FittedStage::SdcaRegression {
                features: features.clone(),
                model: trainer.fit(&DatasetBase::new(X, y))?,
            }
        }
        Stage::Trainer(Trainer::SdcaLogisticRegression { label, features }) => {
            let X = feature_matrix(table, features)?;
            let y: Array1<bool> = table.bools(label)?.iter().copied().collect();
            let trainer =
                SdcaLogisticRegression::new(config.classification.clone(), ctx.stage_seed(index));
            FittedStage::SdcaLogisticRegression {
                features: features.clone(),
                model: trainer.fit(&DatasetBase::new(X, y))?,
            }
        }
    };

    Ok(fitted)
}

/// Скалярная float-колонка как матрица n×1, векторная как есть
fn as_matrix(table: &DataTable, name: &str) -> Result<Array2<f32>> {
    match table.column(name)? {
        Column::Float(values) => Ok(Array2::from_shape_fn((values.len(), 1), |(i, _)| values[i])),
        Column::Vector(matrix) => Ok(matrix.clone()),
        other => Err(PipelineError::ColumnType {
            column: name.to_string(),
            expected: "float32 or vector",
            found: other.kind(),
        }),
    }
}

/// Признаки для обучаемой стадии сразу в f64, без промежуточной копии в f32
fn feature_matrix(table: &DataTable, name: &str) -> Result<Array2<f64>> {
    match table.column(name)? {
        Column::Float(values) => Ok(Array2::from_shape_fn((values.len(), 1), |(i, _)| {
            values[i] as f64
        })),
        Column::Vector(matrix) => Ok(matrix.mapv(|v| v as f64)),
        other => Err(PipelineError::ColumnType {
            column: name.to_string(),
            expected: "float32 or vector",
            found: other.kind(),
        }),
    }
}

#[derive(Debug, Clone)]
enum FittedStage {
    Copy {
        input: String,
        output: String,
    },
    OneHot {
        input: String,
        output: String,
        encoder: OneHotEncoder,
    },
    FeaturizeText {
        input: String,
        output: String,
        featurizer: TextFeaturizer,
    },
    Concatenate {
        inputs: Vec<String>,
        output: String,
    },
    NormalizeMinMax {
        input: String,
        output: String,
        normalizer: MinMaxNormalizer,
    },
    SdcaRegression {
        features: String,
        model: FittedSdcaRegression,
    },
    SdcaLogisticRegression {
        features: String,
        model: FittedSdcaLogisticRegression,
    },
}

impl FittedStage {
    fn name(&self) -> &'static str {
        match self {
            FittedStage::Copy { .. } => "copy",
            FittedStage::OneHot { .. } => "one-hot",
            FittedStage::FeaturizeText { .. } => "featurize-text",
            FittedStage::Concatenate { .. } => "concatenate",
            FittedStage::NormalizeMinMax { .. } => "normalize-min-max",
            FittedStage::SdcaRegression { .. } => "sdca-regression",
            FittedStage::SdcaLogisticRegression { .. } => "sdca-logistic-regression",
        }
    }

    fn is_trainer(&self) -> bool {
        matches!(
            self,
            FittedStage::SdcaRegression { .. } | FittedStage::SdcaLogisticRegression { .. }
        )
    }

    fn apply(&self, table: &mut DataTable) -> Result<()> {
        match self {
            FittedStage::Copy { input, output } => {
                let column = table.column(input)?.clone();
                table.insert(output.clone(), column)
            }
            FittedStage::OneHot {
                input,
                output,
                encoder,
            } => {
                let encoded = encoder.transform(table.text(input)?);
                table.insert(output.clone(), Column::Vector(encoded))
            }
            FittedStage::FeaturizeText {
                input,
                output,
                featurizer,
            } => {
                let features = featurizer.transform(table.text(input)?);
                table.insert(output.clone(), Column::Vector(features))
            }
            FittedStage::Concatenate { inputs, output } => {
                let features = FeatureEngineer::concatenate(table, inputs)?;
                table.insert(output.clone(), Column::Vector(features))
            }
            FittedStage::NormalizeMinMax {
                input,
                output,
                normalizer,
            } => {
                let scalar = matches!(table.column(input)?, Column::Float(_));
                let normalized = normalizer.transform(&as_matrix(table, input)?)?;
                let column = if scalar {
                    Column::Float(normalized.column(0).to_vec())
                } else {
                    Column::Vector(normalized)
                };
                table.insert(output.clone(), column)
            }
            FittedStage::SdcaRegression { features, model } => {
                let X = checked_features(table, features, model.n_features())?;
                let scores: Array1<f64> = model.predict(&X);
                table.insert(SCORE, Column::Float(scores.iter().map(|&s| s as f32).collect()))
            }
            FittedStage::SdcaLogisticRegression { features, model } => {
                let X = checked_features(table, features, model.n_features())?;
                let scores = model.decision_function(&X);
                let probabilities = model.predict_probabilities(&X);
                let labels: Array1<bool> = model.predict(&X);

                table.insert(SCORE, Column::Float(scores.iter().map(|&s| s as f32).collect()))?;
                table.insert(
                    PROBABILITY,
                    Column::Float(probabilities.iter().map(|&p| p as f32).collect()),
                )?;
                table.insert(PREDICTED_LABEL, Column::Bool(labels.to_vec()))
            }
        }
    }
}

fn checked_features(table: &DataTable, name: &str, expected: usize) -> Result<Array2<f64>> {
    let X = feature_matrix(table, name)?;
    if X.ncols() != expected {
        return Err(PipelineError::Degenerate(format!(
            "model expects {} features in '{}', got {}",
            expected,
            name,
            X.ncols()
        )));
    }
    Ok(X)
}

/// Обученный конвейер: единственное состояние, созданное за запуск
#[derive(Debug, Clone)]
pub struct FittedPipeline {
    stages: Vec<FittedStage>,
}

impl FittedPipeline {
    pub fn transform(&self, data: &DataTable) -> Result<DataTable> {
        self.transform_stages(data, self.stages.len())
    }

    /// Применяет стадии до последней обучаемой включительно,
    /// чтобы увидеть ее выход до того, как следующие стадии его перекроют
    pub fn transform_through_trainer(&self, data: &DataTable) -> Result<DataTable> {
        let end = self
            .stages
            .iter()
            .rposition(FittedStage::is_trainer)
            .map_or(self.stages.len(), |i| i + 1);
        self.transform_stages(data, end)
    }

    fn transform_stages(&self, data: &DataTable, end: usize) -> Result<DataTable> {
        let mut table = data.clone();
        for stage in &self.stages[..end] {
            stage.apply(&mut table)?;
        }
        Ok(table)
    }

    pub fn regression_model(&self) -> Option<&FittedSdcaRegression> {
        self.stages.iter().find_map(|stage| match stage {
            FittedStage::SdcaRegression { model, .. } => Some(model),
            _ => None,
        })
    }

    pub fn classifier(&self) -> Option<&FittedSdcaLogisticRegression> {
        self.stages.iter().find_map(|stage| match stage {
            FittedStage::SdcaLogisticRegression { model, .. } => Some(model),
            _ => None,
        })
    }

    pub fn create_prediction_engine<I: Record, O: PredictionOutput>(
        &self,
    ) -> PredictionEngine<'_, I, O> {
        PredictionEngine {
            pipeline: self,
            _marker: PhantomData,
        }
    }
}

/// Типизированный результат предсказания для одной записи
pub trait PredictionOutput: Sized {
    fn from_pipeline(pipeline: &FittedPipeline, input: &DataTable) -> Result<Self>;
}

/// Прогоняет одну запись через обученный конвейер
pub struct PredictionEngine<'a, I, O> {
    pipeline: &'a FittedPipeline,
    _marker: PhantomData<fn(&I) -> O>,
}

impl<'a, I: Record, O: PredictionOutput> PredictionEngine<'a, I, O> {
    pub fn predict(&self, input: &I) -> Result<O> {
        let table = DataTable::from_records(std::slice::from_ref(input))?;
        O::from_pipeline(self.pipeline, &table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PriceRow;

    fn price_table() -> DataTable {
        let rows: Vec<PriceRow> = (0..6)
            .map(|i| PriceRow {
                time: format!("{}", 1_700_000_000 + i * 86_400),
                price: 0.08 + 0.01 * i as f32,
                volume: 1.0e8 * (1.0 + i as f32),
            })
            .collect();
        DataTable::from_records(&rows).unwrap()
    }

    fn feature_pipeline() -> Pipeline {
        Pipeline::new()
            .append(Transform::copy("Label", "Price"))
            .append(Transform::one_hot("TimeEncoded", "Time"))
            .append(Transform::concatenate("Features", &["TimeEncoded", "Volume"]))
            .append(Transform::normalize_min_max("Features"))
    }

    #[test]
    fn test_stages_applied_in_order() {
        let table = price_table();
        let fitted = feature_pipeline().fit(&MlContext::default(), &table).unwrap();
        let out = fitted.transform(&table).unwrap();

        assert_eq!(out.floats("Label").unwrap(), table.floats("Price").unwrap());
        let features = out.vectors("Features").unwrap();
        // 6 разных меток времени + объем
        assert_eq!(features.ncols(), 7);
        for j in 0..features.ncols() {
            let col = features.column(j);
            assert!(col.iter().all(|&v| (0.0..=1.0).contains(&v)));
            assert!(col.iter().any(|&v| v == 0.0));
            assert!(col.iter().any(|&v| v == 1.0));
        }
    }

    #[test]
    fn test_scalar_normalization_keeps_scalar_column() {
        let table = price_table();
        let pipeline = Pipeline::new().append(Transform::normalize_min_max("Volume"));
        let out = pipeline
            .fit(&MlContext::default(), &table)
            .unwrap()
            .transform(&table)
            .unwrap();

        let volume = out.floats("Volume").unwrap();
        assert_eq!(volume[0], 0.0);
        assert_eq!(volume[5], 1.0);
    }

    #[test]
    fn test_missing_input_column_fails_fit() {
        let pipeline = Pipeline::new().append(Transform::one_hot("Encoded", "Nope"));
        let err = pipeline.fit(&MlContext::default(), &price_table()).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(name) if name == "Nope"));
    }

    #[test]
    fn test_regression_trainer_writes_score() {
        let table = price_table();
        let pipeline = feature_pipeline().append(Trainer::SdcaRegression {
            label: "Label".to_string(),
            features: "Features".to_string(),
        });
        let fitted = pipeline.fit(&MlContext::default(), &table).unwrap();
        let out = fitted.transform(&table).unwrap();

        assert_eq!(out.floats(SCORE).unwrap().len(), table.n_rows());
        assert_eq!(fitted.regression_model().unwrap().n_features(), 7);
        assert!(fitted.classifier().is_none());
    }

    #[test]
    fn test_pipeline_is_reusable_after_fit() {
        let pipeline = feature_pipeline();
        let before = pipeline.clone();
        pipeline.fit(&MlContext::default(), &price_table()).unwrap();
        assert_eq!(pipeline, before);
    }

    #[test]
    fn test_feature_matrix_widens_in_place() {
        let mut table = DataTable::new();
        table.insert("Volume", Column::Float(vec![1.5, 2.5])).unwrap();
        table
            .insert("Encoded", Column::Vector(ndarray::array![[1.0, 0.0], [0.0, 0.25]]))
            .unwrap();
        table.insert("Time", Column::Text(vec!["a".into(), "b".into()])).unwrap();

        assert_eq!(
            feature_matrix(&table, "Volume").unwrap(),
            ndarray::array![[1.5], [2.5]]
        );
        assert_eq!(
            feature_matrix(&table, "Encoded").unwrap(),
            ndarray::array![[1.0, 0.0], [0.0, 0.25]]
        );
        assert!(matches!(
            feature_matrix(&table, "Time"),
            Err(PipelineError::ColumnType { .. })
        ));
    }

    #[test]
    fn test_empty_table_rejected() {
        let err = feature_pipeline()
            .fit(&MlContext::default(), &DataTable::new())
            .unwrap_err();
        assert!(matches!(err, PipelineError::EmptyDataset));
    }
}
