//! Прогноз цены монеты по времени и объему торгов

use std::path::Path;

use crate::context::MlContext;
use crate::data::{
    load_table, market_chart, write_records, CsvOptions, DataTable, MarketChart, Record,
};
use crate::error::{PipelineError, Result};
use crate::pipeline::{FittedPipeline, Pipeline, PredictionOutput, Trainer, Transform, SCORE};
use crate::types::{PricePrediction, PriceRow};

pub const DATA_FILE: &str = "dogecoin_data.csv";

/// Label ← Price, one-hot(Time), Features = [TimeEncoded, Volume], min-max,
/// SDCA-регрессия, затем Score ← Features и повторная min-max.
///
/// Последние две стадии перекрывают выход регрессора нормализованным
/// вектором признаков. Форма конвейера сохранена; собственный выход
/// регрессора отдается отдельно в `PricePrediction::regression_score`.
pub fn build_pipeline() -> Pipeline {
    Pipeline::new()
        .append(Transform::copy("Label", "Price"))
        .append(Transform::one_hot("TimeEncoded", "Time"))
        .append(Transform::concatenate("Features", &["TimeEncoded", "Volume"]))
        .append(Transform::normalize_min_max("Features"))
        .append(Trainer::SdcaRegression {
            label: "Label".to_string(),
            features: "Features".to_string(),
        })
        .append(Transform::copy(SCORE, "Features"))
        .append(Transform::normalize_min_max(SCORE))
}

pub fn train(ctx: &MlContext, data: &DataTable) -> Result<FittedPipeline> {
    build_pipeline().fit(ctx, data)
}

pub fn sample_input() -> PriceRow {
    PriceRow {
        time: "1710219064".to_string(),
        price: 0.0,
        volume: 1_000_000.0,
    }
}

impl PredictionOutput for PricePrediction {
    fn from_pipeline(pipeline: &FittedPipeline, input: &DataTable) -> Result<Self> {
        let output = pipeline.transform(input)?;
        let score = output
            .vectors(SCORE)?
            .rows()
            .into_iter()
            .next()
            .map(|row| row.to_vec())
            .ok_or(PipelineError::EmptyDataset)?;

        let regression_score = pipeline
            .transform_through_trainer(input)?
            .floats(SCORE)?
            .first()
            .copied()
            .ok_or(PipelineError::EmptyDataset)?;

        Ok(Self {
            score,
            regression_score,
        })
    }
}

/// Загрузка, обучение и одно предсказание
pub fn run(ctx: &MlContext, data_path: &Path, input: &PriceRow) -> Result<PricePrediction> {
    let data = load_table(data_path, &PriceRow::schema(), CsvOptions::default())?;
    tracing::info!("Loaded {} price rows from {}", data.n_rows(), data_path.display());

    let model = train(ctx, &data)?;
    let engine = model.create_prediction_engine::<PriceRow, PricePrediction>();
    let prediction = engine.predict(input)?;

    tracing::warn!(
        "Score echoes the normalized feature vector ({} values); regressor output is {:.6}",
        prediction.score.len(),
        prediction.regression_score
    );
    if let Some(time) = market_chart::format_timestamp(&input.time) {
        tracing::info!("Prediction input time: {}", time);
    }

    Ok(prediction)
}

pub fn format_prediction(input: &PriceRow, prediction: &PricePrediction) -> String {
    let values: Vec<String> = prediction.score.iter().map(|v| format!("{v}")).collect();
    format!(
        "Predicted price for {} with volume {}: [{}]",
        input.time,
        input.volume,
        values.join(", ")
    )
}

/// Конвертирует сохраненный JSON `market_chart` в CSV для загрузчика
pub fn import_market_chart(json_path: &Path, csv_path: &Path) -> Result<usize> {
    let rows = MarketChart::from_file(json_path)?.to_rows()?;
    write_records(csv_path, &rows, CsvOptions::default())?;
    tracing::info!(
        "Imported {} rows from {} into {}",
        rows.len(),
        json_path.display(),
        csv_path.display()
    );
    Ok(rows.len())
}
