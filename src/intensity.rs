use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// Current-market intensity per sector label.
///
/// Sectors are data: any label present in the map is supported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketIntensities(BTreeMap<String, f64>);

impl MarketIntensities {
    /// Build from `(sector, constant)` pairs, rejecting non-positive or non-finite constants.
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let map: BTreeMap<String, f64> = entries.into_iter().map(|(s, v)| (s.into(), v)).collect();
        let out = MarketIntensities(map);
        out.validate()?;
        Ok(out)
    }

    /// Check every constant is finite and positive.
    pub fn validate(&self) -> Result<()> {
        for (sector, value) in &self.0 {
            if !value.is_finite() || *value <= 0.0 {
                return Err(Error::malformed(format!(
                    "market intensity for '{sector}' must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Constant for `sector`, or [`Error::UnknownSector`].
    pub fn get(&self, sector: &str) -> Result<f64> {
        self.0
            .get(sector)
            .copied()
            .ok_or_else(|| Error::UnknownSector(sector.to_string()))
    }

    /// Configured sector labels in sorted order.
    pub fn sectors(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// True when no sector is configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Report configuration loaded from TOML.
///
/// ```toml
/// scenario_order = ["B2DS", "SDS", "NPS", "CPS"]
///
/// [market_intensity]
/// steel = 2.1
/// cement = 0.65
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    pub market_intensity: MarketIntensities,
    /// Scenarios from most to least ambitious.
    #[serde(default)]
    pub scenario_order: Vec<String>,
}

impl ReportConfig {
    /// Parse and validate a config from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: ReportConfig = toml::from_str(s)?;
        cfg.market_intensity.validate()?;
        Ok(cfg)
    }

    /// Read and validate a config file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let cfg = Self::from_toml_str(&raw)?;
        info!(
            path = %path.display(),
            sectors = cfg.market_intensity.sectors().count(),
            "loaded report config"
        );
        Ok(cfg)
    }
}
