//! Классификатор спама

use std::path::Path;

use crate::context::MlContext;
use crate::data::{load_table, CsvOptions, DataTable, Record};
use crate::error::{PipelineError, Result};
use crate::pipeline::{
    FittedPipeline, Pipeline, PredictionOutput, Trainer, Transform, PREDICTED_LABEL, PROBABILITY,
    SCORE,
};
use crate::types::{SpamPrediction, SpamRow};

pub const DATA_FILE: &str = "email.csv";
pub const SAMPLE_MESSAGE: &str = "How are you there?";

/// Features ← текст(Message), SDCA логистическая регрессия, затем Features ← Message
pub fn build_pipeline() -> Pipeline {
    Pipeline::new()
        .append(Transform::featurize_text("Features", "Message"))
        .append(Trainer::SdcaLogisticRegression {
            label: "Label".to_string(),
            features: "Features".to_string(),
        })
        .append(Transform::copy("Features", "Message"))
}

pub fn train(ctx: &MlContext, data: &DataTable) -> Result<FittedPipeline> {
    build_pipeline().fit(ctx, data)
}

/// Метка для предсказания не используется
pub fn input_for(message: &str) -> SpamRow {
    SpamRow {
        message: message.to_string(),
        label: false,
    }
}

fn first<T: Copy>(values: &[T]) -> Result<T> {
    values.first().copied().ok_or(PipelineError::EmptyDataset)
}

impl PredictionOutput for SpamPrediction {
    fn from_pipeline(pipeline: &FittedPipeline, input: &DataTable) -> Result<Self> {
        let output = pipeline.transform(input)?;
        Ok(Self {
            predicted_label: first(output.bools(PREDICTED_LABEL)?)?,
            probability: first(output.floats(PROBABILITY)?)?,
            score: first(output.floats(SCORE)?)?,
        })
    }
}

pub fn run(ctx: &MlContext, data_path: &Path, message: &str) -> Result<SpamPrediction> {
    let data = load_table(data_path, &SpamRow::schema(), CsvOptions::default())?;
    tracing::info!("Loaded {} messages from {}", data.n_rows(), data_path.display());

    let model = train(ctx, &data)?;
    let engine = model.create_prediction_engine::<SpamRow, SpamPrediction>();
    let prediction = engine.predict(&input_for(message))?;

    tracing::info!(
        "Spam probability {:.4} (score {:.4})",
        prediction.probability,
        prediction.score
    );
    Ok(prediction)
}

pub fn format_prediction(message: &str, prediction: &SpamPrediction) -> String {
    let verdict = if prediction.predicted_label { "spam" } else { "not spam" };
    format!("The message '{}' is {}", message, verdict)
}
