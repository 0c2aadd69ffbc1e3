use thiserror::Error;

/// Errors for malformed tables, undefined ratios, and sector lookups.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("undefined ratio: zero emission factor for {scenario}/{sector} at {year}")]
    UndefinedRatio {
        scenario: String,
        sector: String,
        year: i32,
    },
    #[error("unknown sector: {0}")]
    UnknownSector(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedInput(msg.into())
    }

    pub(crate) fn undefined_ratio(scenario: &str, sector: &str, year: i32) -> Self {
        Error::UndefinedRatio {
            scenario: scenario.to_string(),
            sector: sector.to_string(),
            year,
        }
    }
}
