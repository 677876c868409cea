use crate::error::{AdbError, Result};
use crate::series::CanonicalSeries;
use crate::utils::{days_inclusive, last_day_of_month, parse_amount, parse_range_string};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A balance as the extraction service emitted it: a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RawAmount {
    #[schemars(description = "Closing balance as a plain number, e.g. 45230.5")]
    Number(#[schemars(with = "f64")] serde_json::Number),

    #[schemars(
        description = "Closing balance as text. Thousands separators are allowed (\"45,230.50\"); currency symbols are not."
    )]
    Text(String),
}

impl RawAmount {
    pub fn parse(&self) -> std::result::Result<Decimal, String> {
        match self {
            RawAmount::Number(n) => parse_amount(&n.to_string()),
            RawAmount::Text(s) => parse_amount(s),
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            RawAmount::Number(n) => n.to_string(),
            RawAmount::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for RawAmount {
    fn from(value: f64) -> Self {
        // serde_json cannot hold NaN or infinities; keep them as text so they get flagged
        match serde_json::Number::from_f64(value) {
            Some(n) => RawAmount::Number(n),
            None => RawAmount::Text(value.to_string()),
        }
    }
}

impl From<i64> for RawAmount {
    fn from(value: i64) -> Self {
        RawAmount::Number(value.into())
    }
}

impl From<i32> for RawAmount {
    fn from(value: i32) -> Self {
        RawAmount::Number(value.into())
    }
}

impl From<Decimal> for RawAmount {
    fn from(value: Decimal) -> Self {
        RawAmount::Text(value.to_string())
    }
}

impl From<&str> for RawAmount {
    fn from(value: &str) -> Self {
        RawAmount::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawObservation {
    #[schemars(
        description = "Transaction or balance date in YYYY-MM-DD format. DD-Mon-YYYY (e.g. 05-Jan-2025) is also accepted."
    )]
    pub date: String,

    #[schemars(
        description = "The running/closing balance shown on the statement after this entry. Negative for overdrawn accounts."
    )]
    pub balance: RawAmount,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(
        description = "Optional time of the entry in HH:MM or HH:MM:SS, only if the statement prints one."
    )]
    pub time: Option<String>,
}

impl RawObservation {
    pub fn new(date: impl Into<String>, balance: impl Into<RawAmount>) -> Self {
        Self {
            date: date.into(),
            balance: balance.into(),
            time: None,
        }
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }
}

/// The document the extraction collaborator is asked to return.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct StatementExtraction {
    #[schemars(
        description = "Every balance observation in the order it appears in the statement. Do not sort, deduplicate or fill gaps."
    )]
    pub observations: Vec<RawObservation>,
}

impl StatementExtraction {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(StatementExtraction)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// Inclusive `[start, end]` window the ADB is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AnalysisRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    /// The whole calendar month.
    pub fn month(year: i32, month: u32) -> Result<Self> {
        let end = last_day_of_month(year, month)?;
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| AdbError::DateError(format!("Invalid month {}-{:02}", year, month)))?;
        Self::new(start, end)
    }

    /// Parses "YYYY-MM-DD:YYYY-MM-DD" or a single "YYYY-MM".
    pub fn parse(range: &str) -> Result<Self> {
        let (start, end) = parse_range_string(range)?;
        Self::new(start, end)
    }

    /// From the first to the last observation of `series`, or `None` when it is empty.
    pub fn covering(series: &CanonicalSeries) -> Option<Self> {
        match (series.first_date(), series.last_date()) {
            (Some(start), Some(end)) => Some(Self { start, end }),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.start > self.end {
            return Err(AdbError::inverted_range(self.start, self.end));
        }
        Ok(())
    }

    pub fn day_count(&self) -> i64 {
        days_inclusive(self.start, self.end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every date in the range, ascending. Empty when the range is inverted.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}
