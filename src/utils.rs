use crate::error::{AdbError, Result};
use chrono::{Datelike, Months, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Accepted observation date layouts. All of them are unambiguous about which
/// component is the day and which is the month.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%b-%Y", "%d %b %Y", "%d %B %Y"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

pub fn parse_observation_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

pub fn parse_observation_time(raw: &str) -> Option<NaiveTime> {
    let trimmed = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
}

/// Parses a monetary amount written as text.
///
/// Thousands separators and surrounding whitespace are tolerated; currency
/// symbols, words and non-finite spellings are not.
pub fn parse_amount(raw: &str) -> std::result::Result<Decimal, String> {
    let cleaned = strip_thousands_separators(raw.trim())?;
    if cleaned.is_empty() {
        return Err("is empty".to_string());
    }

    let allowed = |c: char| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E');
    if !cleaned.chars().all(allowed) || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return Err("is not a finite number".to_string());
    }

    if cleaned.contains(|c| c == 'e' || c == 'E') {
        return Decimal::from_scientific(&cleaned)
            .map_err(|e| format!("is not a valid amount ({})", e));
    }

    Decimal::from_str(&cleaned).map_err(|e| format!("is not a valid amount ({})", e))
}

/// Removes `,` grouping from the integer part. Groups after the first must be
/// exactly three digits, and commas are not allowed after the decimal point.
fn strip_thousands_separators(text: &str) -> std::result::Result<String, String> {
    if !text.contains(',') {
        return Ok(text.to_string());
    }

    let unsigned = text.trim_start_matches(|c| c == '+' || c == '-');
    let sign = &text[..text.len() - unsigned.len()];
    let (integer, fraction) = match unsigned.find('.') {
        Some(dot) => unsigned.split_at(dot),
        None => (unsigned, ""),
    };

    let mut groups = integer.split(',');
    let leading = groups.next().unwrap_or_default();
    let leading_ok = (1..=3).contains(&leading.len()) && is_digits(leading);
    let rest: Vec<&str> = groups.collect();
    let grouping_ok = rest.iter().all(|g| g.len() == 3 && is_digits(g));

    if !leading_ok || !grouping_ok || fraction.contains(',') {
        return Err("has misplaced thousands separators".to_string());
    }

    Ok(format!("{}{}{}", sign, integer.replace(',', ""), fraction))
}

fn is_digits(text: &str) -> bool {
    text.chars().all(|c| c.is_ascii_digit())
}

/// Number of calendar days in `[start, end]`, both ends included.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_day_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        AdbError::DateError(format!("Invalid month {}-{:02}", year, month))
    })?;

    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| AdbError::DateError(format!("Month {}-{:02} is out of range", year, month)))
}

/// First day of every calendar month touched by `[start, end]`.
pub fn get_month_starts_in_period(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut months = Vec::new();
    let mut current = first_day_of_month(start);

    while current <= end {
        months.push(current);
        match current.checked_add_months(Months::new(1)) {
            Some(next) => current = next,
            None => break,
        }
    }

    months
}

/// Parses a range string in the format "YYYY-MM-DD:YYYY-MM-DD" or "YYYY-MM"
/// Returns (start_date, end_date)
pub fn parse_range_string(range: &str) -> Result<(NaiveDate, NaiveDate)> {
    let parts: Vec<&str> = range.split(':').collect();

    match parts.len() {
        1 => {
            // Whole month: "2025-01"
            let start_str = format!("{}-01", parts[0].trim());
            let start = NaiveDate::parse_from_str(&start_str, "%Y-%m-%d").map_err(|_| {
                AdbError::DateError(format!(
                    "Invalid month in range: {}. Expected YYYY-MM",
                    parts[0]
                ))
            })?;
            let end = last_day_of_month(start.year(), start.month())?;
            Ok((start, end))
        }
        2 => {
            let start = parse_observation_date(parts[0]).ok_or_else(|| {
                AdbError::DateError(format!(
                    "Invalid start date in range: {}. Expected YYYY-MM-DD",
                    parts[0]
                ))
            })?;
            let end = parse_observation_date(parts[1]).ok_or_else(|| {
                AdbError::DateError(format!(
                    "Invalid end date in range: {}. Expected YYYY-MM-DD",
                    parts[1]
                ))
            })?;
            Ok((start, end))
        }
        _ => Err(AdbError::DateError(format!(
            "Invalid range format: {}. Expected 'YYYY-MM' or 'YYYY-MM-DD:YYYY-MM-DD'",
            range
        ))),
    }
}
