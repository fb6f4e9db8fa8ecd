use serde::{Deserialize, Serialize};

/// Label the division picker uses for the synthetic all-divisions view.
pub const ALL_DIVISIONS_LABEL: &str = "事業本部";

/// Runtime settings for the ledger and report engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KanriConfig {
    /// Calendar year in which term 1 begins.
    pub start_year: i32,
    /// Month (1–12) on which every fiscal term begins.
    pub fiscal_start_month: u32,
    /// Rows requested per page when reading aggregates from the store.
    pub page_size: usize,
    pub all_divisions_label: String,
    pub db_path: String,
}

impl Default for KanriConfig {
    fn default() -> Self {
        Self {
            start_year: 2020,
            fiscal_start_month: 8,
            page_size: 1000,
            all_divisions_label: ALL_DIVISIONS_LABEL.to_string(),
            db_path: "kanri.db".to_string(),
        }
    }
}

impl KanriConfig {
    /// Load from a JSON file. Missing keys fall back to the defaults.
    /// In tests, use KanriConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: KanriConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when it exists, otherwise use the defaults.
    pub fn load_or_default(path: &str) -> anyhow::Result<Self> {
        if std::path::Path::new(path).exists() {
            Self::load(path)
        } else {
            log::debug!("config {path} not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=12).contains(&self.fiscal_start_month) {
            anyhow::bail!(
                "fiscal_start_month must be 1-12, got {}",
                self.fiscal_start_month
            );
        }
        if self.page_size == 0 {
            anyhow::bail!("page_size must be positive");
        }
        if self.all_divisions_label.trim().is_empty() {
            anyhow::bail!("all_divisions_label must not be empty");
        }
        Ok(())
    }

    /// Config for unit tests: in-memory database, production fiscal calendar.
    pub fn default_test() -> Self {
        Self {
            db_path: ":memory:".to_string(),
            ..Self::default()
        }
    }
}
