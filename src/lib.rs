#![forbid(unsafe_code)]

//! Scenario re-basing for comparing climate pathways with market emission intensities.
//!
//! Reads long-form `(scenario, sector, year, emission_factor)` tables, rescales
//! each pathway onto a current-market intensity for every lag year, and
//! reshapes the result into long or wide tables for chart and table sinks.

pub mod error;
pub mod indexing;
pub mod ingest;
pub mod intensity;
pub mod interpolate;
pub mod rebase;
pub mod series;
pub mod table;

pub use error::{Error, Result};
pub use indexing::{index_to_base_year, percent_change, IndexedRecord, PercentChange};
pub use ingest::{read_series, read_series_path};
pub use intensity::{MarketIntensities, ReportConfig};
pub use interpolate::interpolate_annual;
pub use rebase::{lag_label, rebase, LaggedProjection, LaggedRecord};
pub use series::{EmissionGroup, EmissionRecord, EmissionSeries, Observation};
pub use table::{chart_lines, pivot_wide, write_long_csv, write_wide_csv, ChartLine, WideTable};
