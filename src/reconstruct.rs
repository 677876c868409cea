use crate::error::Result;
use crate::schema::AnalysisRange;
use crate::series::{BalanceOrigin, CanonicalSeries, DailyBalance, DailySeries};
use log::debug;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Expands a canonical series into one balance per calendar day using
/// last-observation-carried-forward.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconstructor;

impl Reconstructor {
    pub fn new() -> Self {
        Self
    }

    pub fn reconstruct(
        &self,
        series: &CanonicalSeries,
        range: &AnalysisRange,
    ) -> Result<DailySeries> {
        range.validate()?;

        // Observations before the range still establish the opening balance.
        let mut carry: Option<Decimal> = series
            .latest_on_or_before(range.start)
            .map(|(_, balance)| balance);

        let mut days = BTreeMap::new();
        for date in range.days() {
            let day = if let Some(balance) = series.get(&date) {
                carry = Some(balance);
                DailyBalance {
                    balance,
                    origin: BalanceOrigin::Observed,
                }
            } else if let Some(balance) = carry {
                DailyBalance {
                    balance,
                    origin: BalanceOrigin::CarriedForward,
                }
            } else {
                // Unknown balance. It never becomes the carry.
                DailyBalance {
                    balance: Decimal::ZERO,
                    origin: BalanceOrigin::ZeroFilled,
                }
            };
            days.insert(date, day);
        }

        let daily = DailySeries::from_days(days);
        debug!(
            "Reconstructed {} days from {} to {} ({} observed, {} carried, {} zero-filled)",
            daily.len(),
            range.start,
            range.end,
            daily.count_origin(BalanceOrigin::Observed),
            daily.count_origin(BalanceOrigin::CarriedForward),
            daily.count_origin(BalanceOrigin::ZeroFilled)
        );

        Ok(daily)
    }
}

pub fn reconstruct(series: &CanonicalSeries, range: &AnalysisRange) -> Result<DailySeries> {
    Reconstructor::new().reconstruct(series, range)
}
