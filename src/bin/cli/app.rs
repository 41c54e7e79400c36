use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use aralin_lib::config::AppConfig;
use aralin_lib::db::Database;
use aralin_lib::generation::{GeminiClient, GenerationService, TextGenerator};

/// Shared application state for CLI commands
pub struct App {
    pub config: AppConfig,
}

impl App {
    /// Load the config file and environment overrides
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = AppConfig::load(config_path).context("Failed to load config")?;
        Ok(Self { config })
    }

    pub fn open_database(&self) -> Result<Database> {
        Database::open(&self.config.database)
            .with_context(|| format!("Failed to open database at {}", self.config.database.display()))
    }

    pub fn generator(&self) -> Result<Arc<dyn TextGenerator>> {
        let client = GeminiClient::new(&self.config.generation).context("Failed to set up the generation client")?;
        Ok(Arc::new(client))
    }

    pub fn generation_service(&self) -> Result<GenerationService<Arc<dyn TextGenerator>>> {
        Ok(GenerationService::new(self.generator()?))
    }
}
