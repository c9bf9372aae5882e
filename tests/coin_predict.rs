use std::path::PathBuf;

use ml_pipelines::apps::coin_predict;
use ml_pipelines::data::{load_table, write_records, CsvOptions, Record};
use ml_pipelines::{MlContext, PipelineError, PriceRow};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("ml-pipelines-{}-{}", std::process::id(), name))
}

fn history(days: usize) -> Vec<PriceRow> {
    (0..days)
        .map(|i| PriceRow {
            time: (1_700_000_000 + i as i64 * 86_400).to_string(),
            price: 0.08 + 0.002 * i as f32 + 0.01 * (i as f32 * 0.7).sin(),
            volume: 5.0e8 + 4.0e7 * (i as f32 * 1.3).cos(),
        })
        .collect()
}

fn write_history(name: &str, days: usize) -> PathBuf {
    let path = temp_path(name);
    write_records(&path, &history(days), CsvOptions::default()).unwrap();
    path
}

#[test]
fn test_loading_is_deterministic() {
    let path = write_history("deterministic.csv", 20);

    let first = load_table(&path, &PriceRow::schema(), CsvOptions::default()).unwrap();
    let second = load_table(&path, &PriceRow::schema(), CsvOptions::default()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.n_rows(), 20);
    assert_eq!(first.to_records::<PriceRow>().unwrap()[3].time, "1700259200");

    std::fs::remove_file(path).ok();
}

#[test]
fn test_sample_prediction_has_feature_width() {
    let path = write_history("sample.csv", 30);
    let ctx = MlContext::default();

    let prediction = coin_predict::run(&ctx, &path, &coin_predict::sample_input()).unwrap();

    let data = load_table(&path, &PriceRow::schema(), CsvOptions::default()).unwrap();
    let fitted = coin_predict::train(&ctx, &data).unwrap();
    let width = fitted.regression_model().unwrap().n_features();

    // 30 разных меток времени + объем
    assert_eq!(width, 31);
    assert_eq!(prediction.score.len(), width);
    assert!(prediction.regression_score.is_finite());

    let line = coin_predict::format_prediction(&coin_predict::sample_input(), &prediction);
    assert!(line.starts_with("Predicted price for 1710219064 with volume 1000000: ["));

    std::fs::remove_file(path).ok();
}

#[test]
fn test_unseen_time_encodes_as_zeros() {
    let path = write_history("unseen.csv", 10);
    let prediction =
        coin_predict::run(&MlContext::default(), &path, &coin_predict::sample_input()).unwrap();

    // последний признак это объем, перед ним one-hot незнакомого времени
    let (time_part, _) = prediction.score.split_at(prediction.score.len() - 1);
    assert!(time_part.iter().all(|&v| v == 0.0));

    std::fs::remove_file(path).ok();
}

#[test]
fn test_fits_with_same_seed_agree() {
    let path = write_history("seeded.csv", 25);
    let input = PriceRow {
        time: "1700086400".to_string(),
        price: 0.0,
        volume: 4.9e8,
    };

    let a = coin_predict::run(&MlContext::with_seed(9), &path, &input).unwrap();
    let b = coin_predict::run(&MlContext::with_seed(9), &path, &input).unwrap();

    assert!((a.regression_score - b.regression_score).abs() < 1e-6);
    for (x, y) in a.score.iter().zip(&b.score) {
        assert!((x - y).abs() < 1e-6);
    }

    std::fs::remove_file(path).ok();
}

#[test]
fn test_features_normalized_over_fitting_data() {
    let path = write_history("normalized.csv", 15);
    let data = load_table(&path, &PriceRow::schema(), CsvOptions::default()).unwrap();
    let fitted = coin_predict::train(&MlContext::default(), &data).unwrap();

    let out = fitted.transform(&data).unwrap();
    let features = out.vectors("Features").unwrap();
    for column in features.columns() {
        assert!(column.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(column.iter().any(|&v| v == 0.0));
        assert!(column.iter().any(|&v| v == 1.0));
    }

    std::fs::remove_file(path).ok();
}

#[test]
fn test_import_market_chart_then_predict() {
    let json_path = temp_path("market_chart.json");
    let csv_path = temp_path("imported.csv");
    let prices: Vec<String> = (0..12)
        .map(|i| {
            let time = 1_709_251_200_000i64 + i * 86_400_000;
            format!("[{}, {}]", time, 0.12 + 0.003 * i as f64)
        })
        .collect();
    let volumes: Vec<String> = (0..12)
        .map(|i| {
            let time = 1_709_251_200_000i64 + i * 86_400_000;
            format!("[{}, {}]", time, 1.5e9 + 1.0e8 * i as f64)
        })
        .collect();
    std::fs::write(
        &json_path,
        format!(
            r#"{{"prices": [{}], "market_caps": [], "total_volumes": [{}]}}"#,
            prices.join(","),
            volumes.join(",")
        ),
    )
    .unwrap();

    assert_eq!(coin_predict::import_market_chart(&json_path, &csv_path).unwrap(), 12);
    let prediction =
        coin_predict::run(&MlContext::default(), &csv_path, &coin_predict::sample_input()).unwrap();
    assert_eq!(prediction.score.len(), 13);

    std::fs::remove_file(json_path).ok();
    std::fs::remove_file(csv_path).ok();
}

#[test]
fn test_bad_rows_fail() {
    let path = temp_path("bad.csv");
    std::fs::write(&path, "1700000000,0.08,500000000\n1700086400,n/a,510000000\n").unwrap();

    let err = coin_predict::run(&MlContext::default(), &path, &coin_predict::sample_input())
        .unwrap_err();
    assert!(matches!(err, PipelineError::Parse { line: 2, .. }));

    std::fs::remove_file(path).ok();
}

#[test]
fn test_missing_file_fails() {
    let err = coin_predict::run(
        &MlContext::default(),
        &temp_path("does-not-exist.csv"),
        &coin_predict::sample_input(),
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::Io { .. }));
}
