use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::data::model::YearDomain;
use crate::error::{LoadError, Result};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "AUCTION_LENS_CONFIG";

/// Config file picked up from the working directory when present.
pub const CONFIG_FILE: &str = "auction-lens.json";

/// Default ordered list of source locations; the first that exists wins.
pub fn default_candidates() -> Vec<PathBuf> {
    vec![
        PathBuf::from("data/processed/auction_cleaned.csv"),
        PathBuf::from("auction_cleaned.csv"),
    ]
}

// ---------------------------------------------------------------------------
// DashboardConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub candidates: Vec<PathBuf>,
    pub fallback_year_domain: (i32, i32),
    pub limits: ChartLimits,
    pub sampling: SamplingConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            candidates: default_candidates(),
            fallback_year_domain: YearDomain::FALLBACK.as_tuple(),
            limits: ChartLimits::default(),
            sampling: SamplingConfig::default(),
        }
    }
}

/// Top-N truncation defaults for each dashboard section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChartLimits {
    pub artists_by_sales: usize,
    pub materials_by_average: usize,
    pub countries_by_sales: usize,
    pub artist_share: usize,
    pub heatmap_countries: usize,
    pub heatmap_materials: usize,
    pub material_tab: usize,
    pub artists_by_average: usize,
    pub countries_by_average: usize,
    pub artist_options: usize,
}

impl Default for ChartLimits {
    fn default() -> Self {
        Self {
            artists_by_sales: 10,
            materials_by_average: 20,
            countries_by_sales: 20,
            artist_share: 10,
            heatmap_countries: 15,
            heatmap_materials: 15,
            material_tab: 30,
            artists_by_average: 15,
            countries_by_average: 20,
            artist_options: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub scatter_max: usize,
    pub tab_scatter_max: usize,
    pub seed: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            scatter_max: 8000,
            tab_scatter_max: 10000,
            seed: 42,
        }
    }
}

impl DashboardConfig {
    pub fn fallback_domain(&self) -> YearDomain {
        let (min, max) = self.fallback_year_domain;
        YearDomain { min, max }
    }

    /// Parse a JSON config file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| LoadError::Read {
            path: path.to_path_buf(),
            source: anyhow::Error::new(e).context("reading config file"),
        })?;
        serde_json::from_str(&text).map_err(|source| LoadError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the effective config: `$AUCTION_LENS_CONFIG`, then
    /// `./auction-lens.json`, then built-in defaults.
    pub fn discover() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            let path = PathBuf::from(path);
            log::info!("Reading config from {} (${CONFIG_ENV})", path.display());
            return Self::from_file(&path);
        }
        let local = Path::new(CONFIG_FILE);
        if local.exists() {
            log::info!("Reading config from {}", local.display());
            return Self::from_file(local);
        }
        log::debug!("No config file found; using defaults");
        Ok(Self::default())
    }

    /// Try `path` before every configured candidate.
    pub fn with_preferred_source(mut self, path: PathBuf) -> Self {
        self.candidates.retain(|c| c != &path);
        self.candidates.insert(0, path);
        self
    }
}
