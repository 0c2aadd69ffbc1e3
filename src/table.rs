use std::collections::{BTreeSet, HashMap};
use std::io::Write;

use serde::Serialize;

use crate::error::Result;
use crate::rebase::LaggedProjection;

/// One row of the wide pivot: a (scenario, sector, lag) with a cell per year.
#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub scenario: String,
    pub sector: String,
    pub lag_label: String,
    pub lag_year: i32,
    /// Aligned with [`WideTable::years`]; `None` past the lag year.
    pub values: Vec<Option<f64>>,
}

/// Projection pivoted wide: one column per year, one row per (scenario, sector, lag).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideTable {
    pub years: Vec<i32>,
    pub rows: Vec<WideRow>,
}

/// A single line for a chart sink: one lag of one (scenario, sector).
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLine {
    pub scenario: String,
    pub sector: String,
    pub label: String,
    pub points: Vec<(i32, f64)>,
}

/// Pivot the long projection wide by year, rows in projection order.
pub fn pivot_wide(projection: &LaggedProjection) -> WideTable {
    let years: Vec<i32> = projection
        .records
        .iter()
        .map(|r| r.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let col: HashMap<i32, usize> = years.iter().enumerate().map(|(i, y)| (*y, i)).collect();

    let mut rows: Vec<WideRow> = Vec::new();
    let mut row_of: HashMap<(&str, &str, usize), usize> = HashMap::new();
    for r in &projection.records {
        let key = (r.scenario.as_str(), r.sector.as_str(), r.lag_index);
        let idx = *row_of.entry(key).or_insert_with(|| {
            rows.push(WideRow {
                scenario: r.scenario.clone(),
                sector: r.sector.clone(),
                lag_label: r.lag_label.clone(),
                lag_year: r.lag_year,
                values: vec![None; years.len()],
            });
            rows.len() - 1
        });
        rows[idx].values[col[&r.year]] = Some(r.emission_factor_ald);
    }

    WideTable { years, rows }
}

/// Group the projection into one line per (scenario, sector, lag).
pub fn chart_lines(projection: &LaggedProjection) -> Vec<ChartLine> {
    let mut lines: Vec<ChartLine> = Vec::new();
    let mut line_of: HashMap<(&str, &str, usize), usize> = HashMap::new();
    for r in &projection.records {
        let key = (r.scenario.as_str(), r.sector.as_str(), r.lag_index);
        let idx = *line_of.entry(key).or_insert_with(|| {
            lines.push(ChartLine {
                scenario: r.scenario.clone(),
                sector: r.sector.clone(),
                label: r.lag_label.clone(),
                points: Vec::new(),
            });
            lines.len() - 1
        });
        lines[idx].points.push((r.year, r.emission_factor_ald));
    }
    lines
}

/// Write any serde row type as CSV with a header row.
pub fn write_rows<W: Write, T: Serialize>(rows: &[T], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the projection long-form, one row per (scenario, sector, lag, year).
pub fn write_long_csv<W: Write>(projection: &LaggedProjection, out: W) -> Result<()> {
    write_rows(&projection.records, out)
}

/// Write the pivot with one column per year; cells past a row's lag year stay empty.
pub fn write_wide_csv<W: Write>(table: &WideTable, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec![
        "scenario".to_string(),
        "sector".to_string(),
        "lag".to_string(),
        "lag_year".to_string(),
    ];
    header.extend(table.years.iter().map(|y| y.to_string()));
    writer.write_record(&header)?;

    for row in &table.rows {
        let mut record = vec![
            row.scenario.clone(),
            row.sector.clone(),
            row.lag_label.clone(),
            row.lag_year.to_string(),
        ];
        record.extend(
            row.values
                .iter()
                .map(|v| v.map(format_value).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

// Same shortest round-trip text the serde path emits for f64 (`2.0`, not `2`).
fn format_value(x: f64) -> String {
    format!("{x:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rebase::LaggedRecord;

    fn lagged(lag_index: usize, lag_year: i32, year: i32, v: f64) -> LaggedRecord {
        LaggedRecord {
            scenario: "B2DS".to_string(),
            sector: "steel".to_string(),
            lag_index,
            lag_label: format!("Lag {lag_index}"),
            lag_year,
            year,
            emission_factor_ald: v,
        }
    }

    fn projection() -> LaggedProjection {
        LaggedProjection {
            records: vec![
                lagged(1, 2020, 2014, 2.5),
                lagged(1, 2020, 2020, 2.0),
                lagged(2, 2030, 2014, 3.0),
                lagged(2, 2030, 2020, 2.5),
                lagged(2, 2030, 2030, 2.0),
            ],
            lag_years: vec![2020, 2030],
        }
    }

    #[test]
    fn test_pivot_leaves_cells_past_lag_empty() {
        let wide = pivot_wide(&projection());
        assert_eq!(wide.years, vec![2014, 2020, 2030]);
        assert_eq!(wide.rows.len(), 2);
        assert_eq!(wide.rows[0].values, vec![Some(2.5), Some(2.0), None]);
        assert_eq!(wide.rows[1].values, vec![Some(3.0), Some(2.5), Some(2.0)]);
    }

    #[test]
    fn test_chart_lines_one_per_lag() {
        let lines = chart_lines(&projection());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].label, "Lag 1");
        assert_eq!(lines[1].points.last(), Some(&(2030, 2.0)));
    }

    #[test]
    fn test_wide_csv_layout() {
        let mut buf = Vec::new();
        write_wide_csv(&pivot_wide(&projection()), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "scenario,sector,lag,lag_year,2014,2020,2030");
        assert_eq!(lines[1], "B2DS,steel,Lag 1,2020,2.5,2.0,");
    }

    #[test]
    fn test_long_csv_header() {
        let mut buf = Vec::new();
        write_long_csv(&projection(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with(
            "scenario,sector,lag_index,lag_label,lag_year,year,emission_factor_ald\n"
        ));
        assert_eq!(text.lines().count(), 6);
    }

    #[test]
    fn test_long_and_wide_print_values_alike() {
        let mut long = Vec::new();
        write_long_csv(&projection(), &mut long).unwrap();
        let long = String::from_utf8(long).unwrap();
        assert!(long.lines().any(|l| l == "B2DS,steel,1,Lag 1,2020,2020,2.0"));

        let mut wide = Vec::new();
        write_wide_csv(&pivot_wide(&projection()), &mut wide).unwrap();
        let wide = String::from_utf8(wide).unwrap();
        assert!(wide.lines().any(|l| l == "B2DS,steel,Lag 2,2030,3.0,2.5,2.0"));
    }
}
