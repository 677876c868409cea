use crate::config::{AdbConfig, IntradayOrder, MalformedRowPolicy};
use crate::error::{AdbError, ObservationField, Result};
use crate::schema::RawObservation;
use crate::series::CanonicalSeries;
use crate::utils::{parse_observation_date, parse_observation_time};
use chrono::{NaiveDate, NaiveTime};
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::Serialize;

/// A raw record dropped under `MalformedRowPolicy::Skip`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedObservation {
    pub index: usize,
    pub field: String,
    pub value: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationReport {
    pub series: CanonicalSeries,
    pub skipped: Vec<SkippedObservation>,
    /// Same-date records that were superseded by a later one
    pub duplicates_collapsed: usize,
}

struct ParsedObservation {
    date: NaiveDate,
    time: Option<NaiveTime>,
    balance: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    malformed_rows: MalformedRowPolicy,
    intraday_order: IntradayOrder,
}

impl Normalizer {
    pub fn new(config: &AdbConfig) -> Self {
        Self {
            malformed_rows: config.malformed_rows,
            intraday_order: config.intraday_order,
        }
    }

    pub fn with_policy(malformed_rows: MalformedRowPolicy, intraday_order: IntradayOrder) -> Self {
        Self {
            malformed_rows,
            intraday_order,
        }
    }

    pub fn normalize(&self, raw: &[RawObservation]) -> Result<CanonicalSeries> {
        Ok(self.normalize_with_report(raw)?.series)
    }

    pub fn normalize_with_report(&self, raw: &[RawObservation]) -> Result<NormalizationReport> {
        let mut parsed = Vec::with_capacity(raw.len());
        let mut skipped = Vec::new();

        for (index, record) in raw.iter().enumerate() {
            match parse_record(index, record) {
                Ok(observation) => parsed.push(observation),
                Err(AdbError::MalformedObservation {
                    index,
                    field,
                    value,
                    reason,
                }) if self.malformed_rows == MalformedRowPolicy::Skip => {
                    warn!(
                        "Skipping malformed observation #{}: {} '{}' {}",
                        index, field, value, reason
                    );
                    skipped.push(SkippedObservation {
                        index,
                        field: field.to_string(),
                        value,
                        reason,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        // Both sorts are stable, so same-key records keep their extraction order.
        match self.intraday_order {
            IntradayOrder::ExtractionOrder => parsed.sort_by_key(|p| p.date),
            IntradayOrder::Timestamp => parsed.sort_by_key(|p| (p.date, p.time)),
        }

        let parsed_count = parsed.len();
        let mut series = CanonicalSeries::new();
        for observation in parsed {
            // Later records for the same date overwrite earlier ones.
            series.insert(observation.date, observation.balance);
        }
        let duplicates_collapsed = parsed_count - series.len();

        debug!(
            "Normalized {} raw observations into {} dates ({} duplicates collapsed, {} skipped)",
            raw.len(),
            series.len(),
            duplicates_collapsed,
            skipped.len()
        );

        Ok(NormalizationReport {
            series,
            skipped,
            duplicates_collapsed,
        })
    }
}

/// Strict normalization: any malformed record is an error and same-date
/// records resolve by extraction order.
pub fn normalize(raw: &[RawObservation]) -> Result<CanonicalSeries> {
    Normalizer::default().normalize(raw)
}

fn parse_record(index: usize, record: &RawObservation) -> Result<ParsedObservation> {
    let date = parse_observation_date(&record.date).ok_or_else(|| {
        AdbError::malformed(
            index,
            ObservationField::Date,
            record.date.as_str(),
            "is not a recognised calendar date (expected YYYY-MM-DD)",
        )
    })?;

    let balance = record.balance.parse().map_err(|reason| {
        AdbError::malformed(
            index,
            ObservationField::Balance,
            record.balance.as_display(),
            reason,
        )
    })?;

    let time = match record.time.as_deref() {
        None => None,
        Some(raw_time) if raw_time.trim().is_empty() => None,
        Some(raw_time) => Some(parse_observation_time(raw_time).ok_or_else(|| {
            AdbError::malformed(
                index,
                ObservationField::Time,
                raw_time,
                "is not a valid time (expected HH:MM or HH:MM:SS)",
            )
        })?),
    };

    Ok(ParsedObservation {
        date,
        time,
        balance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_duplicate_collapse_last_wins() {
        let raw = vec![
            RawObservation::new("2025-03-01", 50),
            RawObservation::new("2025-03-01", 70),
            RawObservation::new("2025-03-02", 90),
        ];

        let report = Normalizer::default().normalize_with_report(&raw).unwrap();
        assert_eq!(report.series.len(), 2);
        assert_eq!(report.series.get(&date(2025, 3, 1)), Some(dec!(70)));
        assert_eq!(report.series.get(&date(2025, 3, 2)), Some(dec!(90)));
        assert_eq!(report.duplicates_collapsed, 1);
    }

    #[test]
    fn test_unordered_input_is_sorted() {
        let raw = vec![
            RawObservation::new("2025-01-10", 300),
            RawObservation::new("2025-01-02", 100),
            RawObservation::new("2025-01-05", 200),
        ];

        let series = normalize(&raw).unwrap();
        let dates: Vec<NaiveDate> = series.iter().map(|(d, _)| *d).collect();
        assert_eq!(dates, vec![date(2025, 1, 2), date(2025, 1, 5), date(2025, 1, 10)]);
    }

    #[test]
    fn test_same_date_order_survives_sorting() {
        // The 2025-01-03 entries are separated by a later date in extraction order.
        let raw = vec![
            RawObservation::new("2025-01-03", 10),
            RawObservation::new("2025-01-04", 40),
            RawObservation::new("2025-01-03", 30),
            RawObservation::new("2025-01-01", 5),
        ];

        let series = normalize(&raw).unwrap();
        assert_eq!(series.get(&date(2025, 1, 3)), Some(dec!(30)));
        assert_eq!(series.first_date(), Some(date(2025, 1, 1)));
    }

    #[test]
    fn test_empty_input_is_empty_series() {
        let series = normalize(&[]).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_malformed_balance_is_rejected_with_context() {
        let raw = vec![
            RawObservation::new("2025-01-01", 100),
            RawObservation::new("2025-01-02", "N/A"),
        ];

        match normalize(&raw) {
            Err(AdbError::MalformedObservation {
                index,
                field,
                value,
                ..
            }) => {
                assert_eq!(index, 1);
                assert_eq!(field, ObservationField::Balance);
                assert_eq!(value, "N/A");
            }
            other => panic!("expected MalformedObservation, got {:?}", other),
        }
    }

    #[test]
    fn test_decimal_comma_is_not_coerced() {
        let raw = vec![RawObservation::new("2025-01-02", "1,50")];

        match normalize(&raw) {
            Err(AdbError::MalformedObservation { field, value, .. }) => {
                assert_eq!(field, ObservationField::Balance);
                assert_eq!(value, "1,50");
            }
            other => panic!("expected MalformedObservation, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_date_is_rejected() {
        let raw = vec![RawObservation::new("31/31/2025", 100)];
        assert!(matches!(
            normalize(&raw),
            Err(AdbError::MalformedObservation {
                field: ObservationField::Date,
                ..
            })
        ));
    }

    #[test]
    fn test_skip_policy_drops_and_reports() {
        let normalizer =
            Normalizer::with_policy(MalformedRowPolicy::Skip, IntradayOrder::ExtractionOrder);
        let raw = vec![
            RawObservation::new("2025-01-01", 100),
            RawObservation::new("not a date", 999),
            RawObservation::new("2025-01-02", f64::NAN),
            RawObservation::new("2025-01-03", 300),
        ];

        let report = normalizer.normalize_with_report(&raw).unwrap();
        assert_eq!(report.series.len(), 2);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].index, 1);
        assert_eq!(report.skipped[0].field, "date");
        assert_eq!(report.skipped[1].index, 2);
        assert_eq!(report.skipped[1].field, "balance");
    }

    #[test]
    fn test_timestamp_order_overrides_extraction_order() {
        let raw = vec![
            RawObservation::new("2025-01-01", 300).with_time("17:45"),
            RawObservation::new("2025-01-01", 100).with_time("09:00"),
            RawObservation::new("2025-01-01", 200).with_time("12:30"),
        ];

        let by_extraction = normalize(&raw).unwrap();
        assert_eq!(by_extraction.get(&date(2025, 1, 1)), Some(dec!(200)));

        let normalizer =
            Normalizer::with_policy(MalformedRowPolicy::Reject, IntradayOrder::Timestamp);
        let by_time = normalizer.normalize(&raw).unwrap();
        assert_eq!(by_time.get(&date(2025, 1, 1)), Some(dec!(300)));
    }

    #[test]
    fn test_untimed_records_count_as_start_of_day() {
        let raw = vec![
            RawObservation::new("2025-01-01", 500).with_time("08:00"),
            RawObservation::new("2025-01-01", 100),
        ];
        let normalizer =
            Normalizer::with_policy(MalformedRowPolicy::Reject, IntradayOrder::Timestamp);
        let series = normalizer.normalize(&raw).unwrap();
        assert_eq!(series.get(&date(2025, 1, 1)), Some(dec!(500)));
    }

    #[test]
    fn test_malformed_time_is_rejected() {
        let raw = vec![RawObservation::new("2025-01-01", 10).with_time("noon")];
        assert!(matches!(
            normalize(&raw),
            Err(AdbError::MalformedObservation {
                field: ObservationField::Time,
                ..
            })
        ));
    }

    #[test]
    fn test_renormalizing_is_a_no_op() {
        let raw = vec![
            RawObservation::new("05-Jan-2025", "1,250.40"),
            RawObservation::new("2025-01-02", 80.25),
            RawObservation::new("2025-01-05", 1300),
            RawObservation::new("2025/01/02", -15.5),
        ];

        let once = normalize(&raw).unwrap();
        let twice = normalize(&once.to_raw()).unwrap();
        assert_eq!(once, twice);
    }
}
