//! Контекст одного запуска

use crate::config::PipelineConfig;

/// Создается явно и передается в `Pipeline::fit`; глобального состояния нет
#[derive(Debug, Clone, Default)]
pub struct MlContext {
    config: PipelineConfig,
}

impl MlContext {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(PipelineConfig {
            seed,
            ..PipelineConfig::default()
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.config.seed
    }

    /// Seed стадии зависит только от seed контекста и номера стадии
    pub fn stage_seed(&self, stage: usize) -> u64 {
        self.seed().wrapping_add(stage as u64)
    }
}
