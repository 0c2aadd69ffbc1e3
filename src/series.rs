use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Input row schema, one observation of a scenario pathway for one sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionRecord {
    pub scenario: String,
    pub sector: String,
    pub year: i32,
    pub emission_factor: f64,
    pub emission_factor_unit: String,
}

/// A single (year, intensity) point within a group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub year: i32,
    pub emission_factor: f64,
}

/// All observations sharing one (scenario, sector) pair, years strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionGroup {
    pub scenario: String,
    pub sector: String,
    pub unit: String,
    observations: Vec<Observation>,
}

impl EmissionGroup {
    /// Observations in strictly increasing year order.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// First year of the group; `None` only for a group with no observations.
    pub fn base_year(&self) -> Option<i32> {
        self.observations.first().map(|o| o.year)
    }

    /// Intensity observed exactly at `year`, if any.
    pub fn value_at(&self, year: i32) -> Option<f64> {
        self.observations
            .binary_search_by_key(&year, |o| o.year)
            .ok()
            .map(|i| self.observations[i].emission_factor)
    }

    /// Observations up to and including `year`.
    pub fn up_to(&self, year: i32) -> &[Observation] {
        let end = self.observations.partition_point(|o| o.year <= year);
        &self.observations[..end]
    }

    pub(crate) fn from_observations(
        scenario: String,
        sector: String,
        unit: String,
        observations: Vec<Observation>,
    ) -> Self {
        EmissionGroup {
            scenario,
            sector,
            unit,
            observations,
        }
    }
}

/// Validated long-form emission table grouped by (scenario, sector).
///
/// Groups keep the order in which their first row appeared in the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmissionSeries {
    groups: Vec<EmissionGroup>,
}

impl EmissionSeries {
    /// Build a series from rows in input order.
    ///
    /// Rejects negative or non-finite intensities, mixed units within a group,
    /// duplicate (scenario, sector, year) tuples, and years that go backwards
    /// within a group.
    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = EmissionRecord>,
    {
        let mut groups: Vec<EmissionGroup> = Vec::new();
        let mut index: HashMap<(String, String), usize> = HashMap::new();

        for (row, rec) in records.into_iter().enumerate() {
            if !rec.emission_factor.is_finite() || rec.emission_factor < 0.0 {
                return Err(Error::malformed(format!(
                    "row {}: emission_factor must be a non-negative number, got {}",
                    row + 1,
                    rec.emission_factor
                )));
            }

            let key = (rec.scenario.clone(), rec.sector.clone());
            let slot = match index.get(&key) {
                Some(&i) => i,
                None => {
                    groups.push(EmissionGroup {
                        scenario: rec.scenario.clone(),
                        sector: rec.sector.clone(),
                        unit: rec.emission_factor_unit.clone(),
                        observations: Vec::new(),
                    });
                    index.insert(key, groups.len() - 1);
                    groups.len() - 1
                }
            };
            let group = &mut groups[slot];

            if group.unit != rec.emission_factor_unit {
                return Err(Error::malformed(format!(
                    "row {}: {}/{} mixes units '{}' and '{}'",
                    row + 1,
                    rec.scenario,
                    rec.sector,
                    group.unit,
                    rec.emission_factor_unit
                )));
            }

            if let Some(last) = group.observations.last() {
                if group.value_at(rec.year).is_some() {
                    return Err(Error::malformed(format!(
                        "row {}: duplicate year {} for {}/{}",
                        row + 1,
                        rec.year,
                        rec.scenario,
                        rec.sector
                    )));
                }
                if rec.year < last.year {
                    return Err(Error::malformed(format!(
                        "row {}: year {} follows {} for {}/{} (years must increase)",
                        row + 1,
                        rec.year,
                        last.year,
                        rec.scenario,
                        rec.sector
                    )));
                }
            }

            group.observations.push(Observation {
                year: rec.year,
                emission_factor: rec.emission_factor,
            });
        }

        debug!(groups = groups.len(), "built emission series");
        Ok(EmissionSeries { groups })
    }

    pub(crate) fn from_groups(groups: Vec<EmissionGroup>) -> Self {
        EmissionSeries { groups }
    }

    /// Groups in first-appearance (or ambition) order.
    pub fn groups(&self) -> &[EmissionGroup] {
        &self.groups
    }

    /// True when the series holds no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of observations across all groups.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.observations.len()).sum()
    }

    /// Sorted distinct years present anywhere in the series.
    pub fn distinct_years(&self) -> Vec<i32> {
        let years: BTreeSet<i32> = self
            .groups
            .iter()
            .flat_map(|g| g.observations.iter().map(|o| o.year))
            .collect();
        years.into_iter().collect()
    }

    /// Flatten back into long-form rows, group by group.
    pub fn records(&self) -> impl Iterator<Item = EmissionRecord> + '_ {
        self.groups.iter().flat_map(|g| {
            g.observations.iter().map(move |o| EmissionRecord {
                scenario: g.scenario.clone(),
                sector: g.sector.clone(),
                year: o.year,
                emission_factor: o.emission_factor,
                emission_factor_unit: g.unit.clone(),
            })
        })
    }

    /// Keep only the named scenarios and sectors. An empty filter keeps everything.
    pub fn filter(&self, scenarios: &[String], sectors: &[String]) -> Self {
        let groups = self
            .groups
            .iter()
            .filter(|g| scenarios.is_empty() || scenarios.contains(&g.scenario))
            .filter(|g| sectors.is_empty() || sectors.contains(&g.sector))
            .cloned()
            .collect();
        EmissionSeries { groups }
    }

    /// Stable-sort groups by scenario ambition rank; unranked scenarios go last.
    pub fn ordered_by_scenario(&self, order: &[String]) -> Self {
        let rank = |s: &str| order.iter().position(|o| o == s).unwrap_or(order.len());
        let mut groups = self.groups.clone();
        groups.sort_by_key(|g| rank(&g.scenario));
        EmissionSeries { groups }
    }
}
