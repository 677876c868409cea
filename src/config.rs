use crate::error::{AdbError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const MAX_DISPLAY_DECIMAL_PLACES: u32 = 10;

/// What to do with a raw record whose date, balance or time does not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedRowPolicy {
    /// Fail the whole normalization with `MalformedObservation`
    #[default]
    Reject,
    /// Drop the record, log it and report it as skipped
    Skip,
}

/// How the "last balance of the day" is chosen among same-date records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntradayOrder {
    /// The record emitted last by the extraction wins
    #[default]
    ExtractionOrder,
    /// Records are ordered by their `time` first; untimed records count as start of day
    Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdbConfig {
    pub malformed_rows: MalformedRowPolicy,
    pub intraday_order: IntradayOrder,
    /// Rounding applied by `AggregateResult::adb_display`
    pub display_decimal_places: u32,
    /// Turn the empty-extraction warning into an `EmptyExtraction` error
    pub fail_on_empty_extraction: bool,
}

impl Default for AdbConfig {
    fn default() -> Self {
        Self {
            malformed_rows: MalformedRowPolicy::Reject,
            intraday_order: IntradayOrder::ExtractionOrder,
            display_decimal_places: 2,
            fail_on_empty_extraction: false,
        }
    }
}

impl AdbConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: AdbConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.display_decimal_places > MAX_DISPLAY_DECIMAL_PLACES {
            return Err(AdbError::InvalidConfig(format!(
                "display_decimal_places {} exceeds the maximum of {}",
                self.display_decimal_places, MAX_DISPLAY_DECIMAL_PLACES
            )));
        }
        Ok(())
    }
}
