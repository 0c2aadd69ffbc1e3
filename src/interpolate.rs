use tracing::debug;

use crate::error::{Error, Result};
use crate::series::{EmissionGroup, EmissionSeries, Observation};

/// Widest gap between consecutive observations that will be filled year by year.
pub const MAX_GAP_YEARS: i32 = 1_000;

/// Fill every integer year between consecutive observations by linear interpolation.
///
/// Original observations are kept exactly; groups and units are unchanged.
/// A gap wider than [`MAX_GAP_YEARS`] is rejected as [`Error::MalformedInput`].
pub fn interpolate_annual(series: &EmissionSeries) -> Result<EmissionSeries> {
    let groups = series
        .groups()
        .iter()
        .map(|g| -> Result<EmissionGroup> {
            let filled = fill_gaps(g.observations()).ok_or_else(|| {
                Error::malformed(format!(
                    "{}/{} has a gap wider than {} years",
                    g.scenario, g.sector, MAX_GAP_YEARS
                ))
            })?;
            Ok(EmissionGroup::from_observations(
                g.scenario.clone(),
                g.sector.clone(),
                g.unit.clone(),
                filled,
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    let out = EmissionSeries::from_groups(groups);
    debug!(before = series.len(), after = out.len(), "interpolated to annual");
    Ok(out)
}

// `None` when a gap overflows or exceeds MAX_GAP_YEARS.
fn fill_gaps(obs: &[Observation]) -> Option<Vec<Observation>> {
    let mut out = Vec::with_capacity(obs.len());
    for pair in obs.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let gap = b.year.checked_sub(a.year).filter(|g| *g <= MAX_GAP_YEARS)?;
        out.push(a);
        let span = f64::from(gap);
        for year in (a.year + 1)..b.year {
            let t = f64::from(year - a.year) / span;
            out.push(Observation {
                year,
                emission_factor: a.emission_factor + t * (b.emission_factor - a.emission_factor),
            });
        }
    }
    if let Some(last) = obs.last() {
        out.push(*last);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::EmissionRecord;

    fn rec(year: i32, ef: f64) -> EmissionRecord {
        EmissionRecord {
            scenario: "SDS".to_string(),
            sector: "steel".to_string(),
            year,
            emission_factor: ef,
            emission_factor_unit: "tCO2/t".to_string(),
        }
    }

    #[test]
    fn test_fills_every_year_and_keeps_observations() {
        let raw =
            EmissionSeries::from_records(vec![rec(2020, 2.0), rec(2025, 1.0), rec(2026, 0.9)])
                .unwrap();
        let annual = interpolate_annual(&raw).unwrap();
        let g = &annual.groups()[0];

        let years: Vec<i32> = g.observations().iter().map(|o| o.year).collect();
        assert_eq!(years, (2020..=2026).collect::<Vec<_>>());
        assert_eq!(g.value_at(2020), Some(2.0));
        assert_eq!(g.value_at(2025), Some(1.0));
        assert_eq!(g.value_at(2026), Some(0.9));
        assert!((g.value_at(2022).unwrap() - 1.6).abs() < 1e-12);
        assert_eq!(g.unit, "tCO2/t");
    }

    #[test]
    fn test_single_point_group_unchanged() {
        let raw = EmissionSeries::from_records(vec![rec(2020, 2.0)]).unwrap();
        assert_eq!(interpolate_annual(&raw).unwrap(), raw);
    }

    #[test]
    fn test_extreme_gaps_rejected() {
        let raw = EmissionSeries::from_records(vec![rec(i32::MIN, 2.0), rec(i32::MAX, 1.0)])
            .unwrap();
        assert!(matches!(
            interpolate_annual(&raw),
            Err(Error::MalformedInput(ref m)) if m.contains("gap wider")
        ));

        let wide = EmissionSeries::from_records(vec![rec(1000, 2.0), rec(2001, 1.0)]).unwrap();
        assert!(interpolate_annual(&wide).is_err());

        let edge = EmissionSeries::from_records(vec![rec(1000, 2.0), rec(2000, 1.0)]).unwrap();
        assert_eq!(interpolate_annual(&edge).unwrap().len(), 1001);
    }
}
