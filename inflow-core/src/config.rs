//! Configuration management
//!
//! Settings live in `settings.json` inside the inflow directory:
//! ```json
//! {
//!   "defaultCurrency": "BRL",
//!   "detector": { "dateToleranceDays": 1, "partialConfidence": 50 },
//!   "import": { "flipSigns": false }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::currency::BASE_CURRENCY;
use crate::domain::Result;
use crate::services::dedup::DetectorConfig;

/// Raw settings.json structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SettingsFile {
    default_currency: String,
    detector: DetectorConfig,
    import: ImportSettings,
    /// Fields written by other tools are kept as-is across saves
    #[serde(flatten)]
    other: serde_json::Map<String, serde_json::Value>,
}

impl Default for SettingsFile {
    fn default() -> Self {
        Self {
            default_currency: BASE_CURRENCY.to_string(),
            detector: DetectorConfig::default(),
            import: ImportSettings::default(),
            other: serde_json::Map::new(),
        }
    }
}

/// Statement import defaults
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportSettings {
    /// Flip signs on single-amount CSV columns (credit card exports list
    /// charges as positive)
    pub flip_signs: bool,
}

/// Inflow configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub default_currency: String,
    pub detector: DetectorConfig,
    pub import: ImportSettings,
    // Keep the raw settings for preservation when saving
    raw_settings: SettingsFile,
}

impl Config {
    /// Load config from the inflow directory.
    ///
    /// A missing or unreadable settings file falls back to defaults; a
    /// broken one never blocks the CLI.
    pub fn load(inflow_dir: &Path) -> Result<Self> {
        let settings_path = inflow_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        Ok(Self {
            default_currency: raw.default_currency.clone(),
            detector: raw.detector.clone(),
            import: raw.import,
            raw_settings: raw,
        })
    }

    /// Save config to the inflow directory.
    /// Preserves settings fields this tool does not manage.
    pub fn save(&self, inflow_dir: &Path) -> Result<()> {
        let settings_path = inflow_dir.join("settings.json");

        let mut settings = self.raw_settings.clone();
        settings.default_currency = self.default_currency.clone();
        settings.detector = self.detector.clone();
        settings.import = self.import;

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }
}
