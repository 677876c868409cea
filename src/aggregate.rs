use crate::error::{AdbError, Result};
use crate::schema::AnalysisRange;
use crate::series::{BalanceOrigin, DailySeries};
use crate::utils::{get_month_starts_in_period, last_day_of_month};
use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DISPLAY_DECIMAL_PLACES: u32 = 2;

/// Non-fatal annotations attached to an `AggregateResult`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisWarning {
    /// The extraction produced no observations at all; every day is zero-filled
    EmptyExtraction,
    /// The range starts before the earliest known balance. The leading days are
    /// estimated as zero, not backed by data.
    LeadingGap {
        range_start: NaiveDate,
        first_observation: Option<NaiveDate>,
        zero_filled_days: usize,
    },
    /// Raw records dropped under the skip policy
    MalformedRowsSkipped { count: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub range: AnalysisRange,
    /// Unrounded mean of the daily balances
    pub adb: Decimal,
    pub days_counted: usize,
    pub closing_balance: Decimal,
    pub min_balance: Decimal,
    pub max_balance: Decimal,
    pub observed_days: usize,
    pub carried_days: usize,
    pub zero_filled_days: usize,
    pub warnings: Vec<AnalysisWarning>,
}

impl AggregateResult {
    pub fn adb_rounded(&self, decimal_places: u32) -> Decimal {
        self.adb
            .round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero)
    }

    /// ADB rounded to cents for display.
    pub fn adb_display(&self) -> Decimal {
        self.adb_rounded(DISPLAY_DECIMAL_PLACES)
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn has_leading_gap(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, AnalysisWarning::LeadingGap { .. }))
    }

    pub fn is_empty_extraction(&self) -> bool {
        self.warnings.contains(&AnalysisWarning::EmptyExtraction)
    }
}

pub struct Aggregator;

impl Aggregator {
    pub fn aggregate(daily: &DailySeries) -> Result<AggregateResult> {
        let (start, end, closing_balance) = match (daily.first_date(), daily.last()) {
            (Some(start), Some((end, last))) => (start, end, last.balance),
            _ => {
                return Err(AdbError::InvalidRange(
                    "daily series is empty, nothing to average".to_string(),
                ))
            }
        };

        let balances = daily.balances();
        let total = balances
            .iter()
            .try_fold(Decimal::ZERO, |acc, balance| acc.checked_add(*balance))
            .ok_or_else(|| {
                AdbError::ArithmeticOverflow(format!(
                    "sum of daily balances from {} to {} exceeds decimal range",
                    start, end
                ))
            })?;
        let days_counted = balances.len();
        let adb = total
            .checked_div(Decimal::from(days_counted))
            .ok_or_else(|| AdbError::ArithmeticOverflow("mean of daily balances".to_string()))?;

        let min_balance = balances.iter().copied().min().unwrap_or(Decimal::ZERO);
        let max_balance = balances.iter().copied().max().unwrap_or(Decimal::ZERO);

        let zero_filled_days = daily.count_origin(BalanceOrigin::ZeroFilled);
        let mut warnings = Vec::new();
        if zero_filled_days > 0 {
            let first_observation = daily
                .iter()
                .find(|(_, day)| day.origin != BalanceOrigin::ZeroFilled)
                .map(|(date, _)| *date);
            warnings.push(AnalysisWarning::LeadingGap {
                range_start: start,
                first_observation,
                zero_filled_days,
            });
        }

        Ok(AggregateResult {
            range: AnalysisRange { start, end },
            adb,
            days_counted,
            closing_balance,
            min_balance,
            max_balance,
            observed_days: daily.count_origin(BalanceOrigin::Observed),
            carried_days: daily.count_origin(BalanceOrigin::CarriedForward),
            zero_filled_days,
            warnings,
        })
    }

    /// One result per calendar month touched by `daily`, keyed by the first of
    /// the month. Partial months at either end cover only the days present.
    pub fn monthly_breakdown(daily: &DailySeries) -> Result<BTreeMap<NaiveDate, AggregateResult>> {
        let (first, last) = match (daily.first_date(), daily.last()) {
            (Some(first), Some((last, _))) => (first, last),
            _ => return Ok(BTreeMap::new()),
        };

        let mut months = BTreeMap::new();
        for month_start in get_month_starts_in_period(first, last) {
            let month_end = last_day_of_month(month_start.year(), month_start.month())?;
            let slice = daily.slice(month_start.max(first), month_end.min(last));
            months.insert(month_start, Self::aggregate(&slice)?);
        }

        Ok(months)
    }
}

pub fn aggregate(daily: &DailySeries) -> Result<AggregateResult> {
    Aggregator::aggregate(daily)
}

pub fn monthly_breakdown(daily: &DailySeries) -> Result<BTreeMap<NaiveDate, AggregateResult>> {
    Aggregator::monthly_breakdown(daily)
}
