use crate::schema::RawObservation;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Deduplicated closing balances, one per date, ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSeries {
    balances: BTreeMap<NaiveDate, Decimal>,
}

impl CanonicalSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    pub fn get(&self, date: &NaiveDate) -> Option<Decimal> {
        self.balances.get(date).copied()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.balances.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.balances.keys().next_back().copied()
    }

    /// The most recent balance recorded on or before `date`.
    pub fn latest_on_or_before(&self, date: NaiveDate) -> Option<(NaiveDate, Decimal)> {
        self.balances
            .range(..=date)
            .next_back()
            .map(|(d, v)| (*d, *v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &Decimal)> {
        self.balances.iter()
    }

    /// Writes the series back out as raw ISO-dated records.
    pub fn to_raw(&self) -> Vec<RawObservation> {
        self.balances
            .iter()
            .map(|(date, balance)| {
                RawObservation::new(date.format("%Y-%m-%d").to_string(), *balance)
            })
            .collect()
    }

    pub(crate) fn insert(&mut self, date: NaiveDate, balance: Decimal) {
        self.balances.insert(date, balance);
    }
}

impl FromIterator<(NaiveDate, Decimal)> for CanonicalSeries {
    /// Later pairs for the same date replace earlier ones.
    fn from_iter<I: IntoIterator<Item = (NaiveDate, Decimal)>>(iter: I) -> Self {
        Self {
            balances: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceOrigin {
    /// Closing balance taken directly from an observation on this date
    Observed,
    /// No observation on this date; the previous known balance is carried forward
    CarriedForward,
    /// No observation on or before this date; balance unknown and reported as zero
    ZeroFilled,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyBalance {
    pub balance: Decimal,
    pub origin: BalanceOrigin,
}

/// Gap-free balances for every day of an analysis range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    days: BTreeMap<NaiveDate, DailyBalance>,
}

impl DailySeries {
    pub(crate) fn from_days(days: BTreeMap<NaiveDate, DailyBalance>) -> Self {
        Self { days }
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn get(&self, date: &NaiveDate) -> Option<&DailyBalance> {
        self.days.get(date)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.days.keys().next().copied()
    }

    pub fn last(&self) -> Option<(NaiveDate, DailyBalance)> {
        self.days.iter().next_back().map(|(d, b)| (*d, *b))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &DailyBalance)> {
        self.days.iter()
    }

    /// Balances in date order.
    pub fn balances(&self) -> Vec<Decimal> {
        self.days.values().map(|d| d.balance).collect()
    }

    pub fn count_origin(&self, origin: BalanceOrigin) -> usize {
        self.days.values().filter(|d| d.origin == origin).count()
    }

    /// The sub-series of dates in `[start, end]`.
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> DailySeries {
        if start > end {
            return DailySeries::default();
        }
        Self {
            days: self
                .days
                .range(start..=end)
                .map(|(d, b)| (*d, *b))
                .collect(),
        }
    }
}
