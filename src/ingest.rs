use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::series::{EmissionRecord, EmissionSeries};

/// Columns every input table must carry, in any order.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "scenario",
    "sector",
    "year",
    "emission_factor",
    "emission_factor_unit",
];

/// Read a comma-separated emission table into a validated series.
///
/// Extra columns are ignored. Missing required columns, unparsable cells and
/// data-model violations all surface as [`Error::MalformedInput`].
pub fn read_series<R: Read>(reader: R) -> Result<EmissionSeries> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(Error::malformed(format!("missing required column '{column}'")));
        }
    }

    let mut records = Vec::new();
    for (i, row) in rdr.deserialize::<EmissionRecord>().enumerate() {
        let record = row.map_err(|e| {
            if matches!(e.kind(), csv::ErrorKind::Deserialize { .. }) {
                Error::malformed(format!("row {}: {}", i + 1, e))
            } else {
                Error::Csv(e)
            }
        })?;
        records.push(record);
    }
    debug!(rows = records.len(), "read emission rows");

    EmissionSeries::from_records(records)
}

/// Open `path` and read it with [`read_series`].
pub fn read_series_path(path: &Path) -> Result<EmissionSeries> {
    let file = File::open(path)?;
    let series = read_series(file)?;
    info!(
        path = %path.display(),
        groups = series.groups().len(),
        observations = series.len(),
        "loaded emission series"
    );
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
scenario,sector,year,emission_factor,emission_factor_unit
B2DS,steel,2014,1.8,tCO2/t steel
B2DS,steel,2020,1.6,tCO2/t steel
B2DS,steel,2030,1.2,tCO2/t steel
SDS,cement,2014,0.68,tCO2/t cement
SDS,cement,2020,0.62,tCO2/t cement
";

    #[test]
    fn test_reads_grouped_series() {
        let series = read_series(TABLE.as_bytes()).unwrap();
        assert_eq!(series.groups().len(), 2);
        assert_eq!(series.len(), 5);
        assert_eq!(series.groups()[0].unit, "tCO2/t steel");
        assert_eq!(series.groups()[1].value_at(2020), Some(0.62));
    }

    #[test]
    fn test_column_order_and_extra_columns_ignored() {
        let table = "\
year, emission_factor_unit, sector, scenario, emission_factor, source
2020, tCO2/t, steel, SDS, 1.5, iea
";
        let series = read_series(table.as_bytes()).unwrap();
        assert_eq!(series.groups()[0].scenario, "SDS");
        assert_eq!(series.groups()[0].value_at(2020), Some(1.5));
    }

    #[test]
    fn test_missing_column_is_malformed() {
        let table = "scenario,sector,year,emission_factor\nSDS,steel,2020,1.5\n";
        let err = read_series(table.as_bytes()).unwrap_err();
        assert!(
            matches!(err, Error::MalformedInput(ref m) if m.contains("emission_factor_unit"))
        );
    }

    #[test]
    fn test_unparsable_cell_is_malformed() {
        let table = "\
scenario,sector,year,emission_factor,emission_factor_unit
SDS,steel,twenty,1.5,tCO2/t
";
        let err = read_series(table.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(ref m) if m.starts_with("row 1")));
    }

    #[test]
    fn test_read_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        std::fs::write(&path, TABLE).unwrap();
        let series = read_series_path(&path).unwrap();
        assert_eq!(series.distinct_years(), vec![2014, 2020, 2030]);
    }
}
