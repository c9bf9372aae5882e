/// ML модели

pub mod classification;
pub mod regression;
pub mod sdca;

pub use classification::{FittedSdcaLogisticRegression, SdcaLogisticRegression};
pub use regression::{FittedSdcaRegression, SdcaRegression};
pub use sdca::{SdcaOptions, TrainingSummary};
