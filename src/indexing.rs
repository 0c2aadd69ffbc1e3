use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::series::EmissionSeries;

/// Intensity relative to the group's base year, base = 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedRecord {
    pub scenario: String,
    pub sector: String,
    pub year: i32,
    pub index: f64,
}

/// Relative change of one group between two years, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentChange {
    pub scenario: String,
    pub sector: String,
    pub from_year: i32,
    pub to_year: i32,
    pub percent_change: f64,
}

/// Index every group to its own first year.
pub fn index_to_base_year(series: &EmissionSeries) -> Result<Vec<IndexedRecord>> {
    let mut out = Vec::with_capacity(series.len());
    for group in series.groups() {
        let Some(base) = group.observations().first() else {
            continue;
        };
        if base.emission_factor == 0.0 {
            return Err(Error::undefined_ratio(&group.scenario, &group.sector, base.year));
        }
        for obs in group.observations() {
            out.push(IndexedRecord {
                scenario: group.scenario.clone(),
                sector: group.sector.clone(),
                year: obs.year,
                index: obs.emission_factor / base.emission_factor * 100.0,
            });
        }
    }
    Ok(out)
}

/// Percent change from `from_year` to `to_year` for each group that has both.
pub fn percent_change(
    series: &EmissionSeries,
    from_year: i32,
    to_year: i32,
) -> Result<Vec<PercentChange>> {
    let mut out = Vec::new();
    for group in series.groups() {
        let (Some(from), Some(to)) = (group.value_at(from_year), group.value_at(to_year)) else {
            debug!(
                scenario = %group.scenario,
                sector = %group.sector,
                from_year,
                to_year,
                "group lacks one of the comparison years; skipped"
            );
            continue;
        };
        if from == 0.0 {
            return Err(Error::undefined_ratio(&group.scenario, &group.sector, from_year));
        }
        out.push(PercentChange {
            scenario: group.scenario.clone(),
            sector: group.sector.clone(),
            from_year,
            to_year,
            percent_change: (to - from) / from * 100.0,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::EmissionRecord;

    fn rec(scenario: &str, sector: &str, year: i32, ef: f64) -> EmissionRecord {
        EmissionRecord {
            scenario: scenario.to_string(),
            sector: sector.to_string(),
            year,
            emission_factor: ef,
            emission_factor_unit: "u".to_string(),
        }
    }

    #[test]
    fn test_base_year_is_one_hundred() {
        let series = EmissionSeries::from_records(vec![
            rec("SDS", "steel", 2014, 2.0),
            rec("SDS", "steel", 2030, 1.0),
            rec("CPS", "steel", 2020, 1.6),
            rec("CPS", "steel", 2030, 2.0),
        ])
        .unwrap();
        let idx = index_to_base_year(&series).unwrap();
        assert_eq!(idx.len(), 4);
        assert_eq!(idx[0].index, 100.0);
        assert_eq!(idx[1].index, 50.0);
        assert_eq!(idx[2].index, 100.0);
        assert!((idx[3].index - 125.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_base_is_undefined() {
        let series = EmissionSeries::from_records(vec![rec("SDS", "steel", 2014, 0.0)]).unwrap();
        assert!(matches!(
            index_to_base_year(&series),
            Err(Error::UndefinedRatio { year: 2014, .. })
        ));
    }

    #[test]
    fn test_percent_change_skips_incomplete_groups() {
        let series = EmissionSeries::from_records(vec![
            rec("SDS", "steel", 2020, 2.0),
            rec("SDS", "steel", 2030, 1.5),
            rec("CPS", "steel", 2020, 2.0),
        ])
        .unwrap();
        let changes = percent_change(&series, 2020, 2030).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].scenario, "SDS");
        assert!((changes[0].percent_change + 25.0).abs() < 1e-9);
    }
}
