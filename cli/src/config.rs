use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use recomp_core::energy::BmrOffset;
use recomp_core::planner::PlannerOptions;
use recomp_core::service::EngineSettings;
use recomp_core::trend::TrendPolicy;

pub const DEMO_API_KEY: &str = "DEMO_KEY";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub planner: PlannerSection,
    pub trend: TrendSection,
    pub usda: UsdaSection,
    pub exercisedb: ExerciseDbSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlannerSection {
    #[serde(flatten)]
    pub options: PlannerOptions,
    pub bmr_offset: BmrOffset,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TrendSection {
    pub no_change_tolerance_kg: f64,
    pub history_limit: usize,
}

impl Default for TrendSection {
    fn default() -> Self {
        Self {
            no_change_tolerance_kg: 0.0,
            history_limit: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UsdaSection {
    pub api_key: String,
    pub page_size: u32,
}

impl Default for UsdaSection {
    fn default() -> Self {
        Self {
            api_key: DEMO_API_KEY.to_string(),
            page_size: 10,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExerciseDbSection {
    pub api_key: Option<String>,
}

impl Settings {
    /// Read `path` if it exists; a missing file means all defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let settings: Settings = toml::from_str(&raw)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        settings.engine().planner.validate()?;
        settings.engine().trend.validate()?;
        Ok(settings)
    }

    /// Environment keys win over the file.
    pub fn apply_env_overrides(&mut self, usda_key: Option<String>, rapidapi_key: Option<String>) {
        if let Some(key) = usda_key.filter(|k| !k.trim().is_empty()) {
            self.usda.api_key = key;
        }
        if let Some(key) = rapidapi_key.filter(|k| !k.trim().is_empty()) {
            self.exercisedb.api_key = Some(key);
        }
    }

    pub fn engine(&self) -> EngineSettings {
        EngineSettings {
            planner: self.planner.options,
            bmr_offset: self.planner.bmr_offset,
            trend: TrendPolicy {
                no_change_tolerance_kg: self.trend.no_change_tolerance_kg,
            },
        }
    }
}

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    pub settings: Settings,
}

impl Config {
    pub fn load() -> Result<Self> {
        let data_dir = match std::env::var_os("RECOMP_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => ProjectDirs::from("", "", "recomp")
                .context("Could not determine home directory")?
                .data_dir()
                .to_path_buf(),
        };
        let mut config = Self::load_from(data_dir)?;
        config.settings.apply_env_overrides(
            std::env::var("USDA_API_KEY").ok(),
            std::env::var("RAPIDAPI_KEY").ok(),
        );
        Ok(config)
    }

    pub fn load_from(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let settings = Settings::from_path(&data_dir.join("config.toml"))?;
        let db_path = data_dir.join("recomp.db");

        Ok(Config {
            db_path,
            data_dir,
            settings,
        })
    }
}
