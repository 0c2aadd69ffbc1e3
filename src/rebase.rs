//! Lag re-basing of scenario pathways onto a current-market intensity.
//!
//! For every lag year after the first distinct year in the series, each
//! (scenario, sector) group is truncated at the lag year and rescaled so the
//! lag year sits exactly on the sector's market intensity:
//!
//! `ald(y) = market[sector] * ef(y) / ef(lag_year)` for `y <= lag_year`.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::intensity::MarketIntensities;
use crate::series::{EmissionGroup, EmissionSeries};

/// One rescaled point of a lagged projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaggedRecord {
    pub scenario: String,
    pub sector: String,
    pub lag_index: usize,
    pub lag_label: String,
    pub lag_year: i32,
    pub year: i32,
    pub emission_factor_ald: f64,
}

/// Concatenation of all lag sub-series, ordered by lag, then group, then year.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaggedProjection {
    pub records: Vec<LaggedRecord>,
    /// Lag years in lag-index order; `lag_years[0]` is "Lag 1".
    pub lag_years: Vec<i32>,
}

impl LaggedProjection {
    /// Number of lags, one per distinct year after the first.
    pub fn lag_count(&self) -> usize {
        self.lag_years.len()
    }

    /// Records belonging to one lag, in group then year order.
    pub fn lag(&self, lag_index: usize) -> impl Iterator<Item = &LaggedRecord> {
        self.records.iter().filter(move |r| r.lag_index == lag_index)
    }

    /// True when no lag produced any record.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Human-readable label for a 1-based lag index.
pub fn lag_label(lag_index: usize) -> String {
    format!("Lag {lag_index}")
}

/// Rescale every group for every lag year.
///
/// Every sector is resolved against `market` before any output is produced,
/// so an unmapped sector fails the whole call with [`Error::UnknownSector`].
/// A zero intensity at a lag year yields [`Error::UndefinedRatio`]. A group
/// with no observation at a lag year contributes nothing to that lag.
pub fn rebase(series: &EmissionSeries, market: &MarketIntensities) -> Result<LaggedProjection> {
    let constants = series
        .groups()
        .iter()
        .map(|g| market.get(&g.sector))
        .collect::<Result<Vec<f64>>>()?;

    let years = series.distinct_years();
    if years.len() < 2 {
        debug!(years = years.len(), "fewer than two distinct years; no lags");
        return Ok(LaggedProjection::default());
    }

    let lag_years: Vec<i32> = years[1..].to_vec();
    let mut records = Vec::new();

    for (i, &lag_year) in lag_years.iter().enumerate() {
        let lag_index = i + 1;
        let label = lag_label(lag_index);
        for (group, &constant) in series.groups().iter().zip(&constants) {
            rebase_group(group, constant, lag_index, &label, lag_year, &mut records)?;
        }
    }

    info!(
        lags = lag_years.len(),
        groups = series.groups().len(),
        records = records.len(),
        "rebased scenario series"
    );
    Ok(LaggedProjection { records, lag_years })
}

fn rebase_group(
    group: &EmissionGroup,
    constant: f64,
    lag_index: usize,
    label: &str,
    lag_year: i32,
    out: &mut Vec<LaggedRecord>,
) -> Result<()> {
    let Some(pivot) = group.value_at(lag_year) else {
        debug!(
            scenario = %group.scenario,
            sector = %group.sector,
            lag_year,
            "group has no observation at lag year; skipped"
        );
        return Ok(());
    };
    if pivot == 0.0 {
        return Err(Error::undefined_ratio(&group.scenario, &group.sector, lag_year));
    }

    for obs in group.up_to(lag_year) {
        // The lag year itself is pinned to the constant, not recomputed.
        let value = if obs.year == lag_year {
            constant
        } else {
            constant * obs.emission_factor / pivot
        };
        out.push(LaggedRecord {
            scenario: group.scenario.clone(),
            sector: group.sector.clone(),
            lag_index,
            lag_label: label.to_string(),
            lag_year,
            year: obs.year,
            emission_factor_ald: value,
        });
    }
    Ok(())
}
