/// Модуль предобработки данных

pub mod feature_engineering;
pub mod normalization;
pub mod one_hot;
pub mod text_featurizer;

pub use feature_engineering::FeatureEngineer;
pub use normalization::MinMaxNormalizer;
pub use one_hot::OneHotEncoder;
pub use text_featurizer::{TextFeaturizer, TextOptions};
