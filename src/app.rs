use std::sync::Arc;

use crate::ai::{ClaudeProvider, TrendProvider};
use crate::config::{Config, GenerationConfig, API_KEY_ENV};
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::services::{ContentGenerator, DailyTrendManager, Orchestrator};

/// Wired-up services shared by the CLI commands and the admin HTTP plane.
#[derive(Clone)]
pub struct App {
    pub repository: Arc<Repository>,
    pub orchestrator: Orchestrator,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        let repository = Arc::new(Repository::new(&config.db_path).await?);

        let api_key = config.claude_api_key.clone().ok_or_else(|| {
            AppError::Config(format!(
                "claude_api_key is not set in {} and {} is empty",
                Config::config_path().display(),
                API_KEY_ENV
            ))
        })?;

        let provider: Arc<dyn TrendProvider> = Arc::new(
            ClaudeProvider::new(api_key, config.store_niche.clone())
                .with_base_url(&config.api_base_url)
                .with_model(&config.model),
        );

        tracing::info!(
            "Using {} for content generation, database at {}",
            provider.model_version(),
            config.db_path
        );

        Ok(Self::with_provider(
            config.generation.clone(),
            provider,
            repository,
        ))
    }

    pub fn with_provider(
        settings: GenerationConfig,
        provider: Arc<dyn TrendProvider>,
        repository: Arc<Repository>,
    ) -> Self {
        let trends = DailyTrendManager::new(provider.clone(), repository.clone());
        let generator = ContentGenerator::new(provider, repository.clone());
        Self {
            repository,
            orchestrator: Orchestrator::new(settings, trends, generator),
        }
    }
}
