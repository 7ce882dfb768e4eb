use anyhow::{Context, Result};
use stockyard_core::EngineSettings;

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Only needed when documents are written to Postgres.
    pub database_url: Option<String>,
    pub settings: EngineSettings,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL").filter(|value| !value.trim().is_empty());
        let mut settings = EngineSettings::default();

        if let Some(value) = lookup("STOCKYARD_MAX_BATCH") {
            settings.max_batch_size = value
                .trim()
                .parse()
                .with_context(|| format!("STOCKYARD_MAX_BATCH must be a whole number, got {value:?}"))?;
        }
        if let Some(value) = lookup("STOCKYARD_PRICE_SCALE") {
            settings.price_scale = value
                .trim()
                .parse()
                .with_context(|| format!("STOCKYARD_PRICE_SCALE must be a whole number, got {value:?}"))?;
        }

        Ok(Self {
            database_url,
            settings,
        })
    }

    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL is required to save to Postgres")
    }
}
