use std::str::FromStr;
use std::time::Duration;

use crate::calendar::YearMonth;
use crate::ingest::DEFAULT_FETCH_TIMEOUT;
use crate::source::{SheetHandle, DEFAULT_BASE_URL};

/// Sheet read when `OCCUGRID_SHEET_ID` is unset.
pub const DEFAULT_SHEET_ID: &str = "1dpt5uCyBfpfBLh0w-8uVC9LgU4ihKErU7babxc_p23Y";
pub const DEFAULT_ROOMS: u32 = 10;
pub const DEFAULT_YEAR: i32 = 2025;
/// One-based, as written in the environment.
pub const DEFAULT_MONTH: u32 = 9;

const MAX_ROOMS: u32 = 1000;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}: cannot parse {value:?}")]
    Invalid { var: &'static str, value: String },
    #[error("{var}: {reason}")]
    OutOfRange { var: &'static str, reason: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub sheet: SheetHandle,
    pub rooms: u32,
    pub start_month: YearMonth,
    pub fetch_timeout: Duration,
    pub metrics_port: Option<u16>,
}

impl Config {
    /// Read `OCCUGRID_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys take defaults; set but
    /// unparseable keys are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let sheet_id = lookup("OCCUGRID_SHEET_ID").unwrap_or_else(|| DEFAULT_SHEET_ID.into());
        let base_url = lookup("OCCUGRID_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());

        let rooms: u32 = parse_var(&lookup, "OCCUGRID_ROOMS")?.unwrap_or(DEFAULT_ROOMS);
        if rooms == 0 || rooms > MAX_ROOMS {
            return Err(ConfigError::OutOfRange {
                var: "OCCUGRID_ROOMS",
                reason: "must be between 1 and 1000",
            });
        }

        let year: i32 = parse_var(&lookup, "OCCUGRID_YEAR")?.unwrap_or(DEFAULT_YEAR);
        let month: u32 = parse_var(&lookup, "OCCUGRID_MONTH")?.unwrap_or(DEFAULT_MONTH);
        let start_month = month
            .checked_sub(1)
            .and_then(|m0| YearMonth::new(year, m0))
            .ok_or(ConfigError::OutOfRange {
                var: "OCCUGRID_MONTH",
                reason: "must be between 1 and 12",
            })?;

        let fetch_timeout = parse_var::<u64>(&lookup, "OCCUGRID_FETCH_TIMEOUT_MS")?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_FETCH_TIMEOUT);
        if fetch_timeout.is_zero() {
            return Err(ConfigError::OutOfRange {
                var: "OCCUGRID_FETCH_TIMEOUT_MS",
                reason: "must be positive",
            });
        }

        let metrics_port = parse_var(&lookup, "OCCUGRID_METRICS_PORT")?;

        Ok(Self {
            sheet: SheetHandle::with_base_url(sheet_id, base_url),
            rooms,
            start_month,
            fetch_timeout,
            metrics_port,
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
