//! # ADB Builder
//!
//! A library for turning sparse, untrusted bank balance observations (extracted
//! from statements by an external document-understanding service) into a dense
//! daily balance series and its Average Daily Balance.
//!
//! ## Core Concepts
//!
//! - **Raw observations**: `(date, balance)` pairs in whatever order and quality the
//!   extraction produced, possibly with several entries for one day
//! - **Canonical series**: one closing balance per date, ascending. The last entry of a
//!   day wins, so intraday running balances collapse to the end-of-day balance
//! - **Daily series**: every calendar day of the analysis range, forward-filled from the
//!   most recent known balance. Days before any known balance are zero and flagged
//! - **ADB**: the unweighted mean of the daily series, kept in exact decimal arithmetic
//!
//! ## Example
//!
//! ```rust,ignore
//! use adb_builder::*;
//!
//! let raw = vec![
//!     RawObservation::new("2025-01-01", 100),
//!     RawObservation::new("2025-01-05", "200.00"),
//! ];
//! let range = AnalysisRange::parse("2025-01-01:2025-01-07")?;
//!
//! let analysis = analyze_balance_history(&raw, &range)?;
//! println!("ADB: {}", analysis.result.adb_display());
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod normalizer;
pub mod reconstruct;
pub mod schema;
pub mod series;
pub mod utils;

#[cfg(feature = "gemini")]
pub mod llm;

pub use aggregate::{aggregate, monthly_breakdown, AggregateResult, Aggregator, AnalysisWarning};
pub use config::{AdbConfig, IntradayOrder, MalformedRowPolicy};
pub use error::{AdbError, ObservationField, Result};
pub use ingestion::*;
pub use normalizer::{normalize, NormalizationReport, Normalizer, SkippedObservation};
pub use reconstruct::{reconstruct, Reconstructor};
pub use schema::*;
pub use series::*;

use log::{info, warn};
use rust_decimal::Decimal;

/// Everything one analysis run produces.
#[derive(Debug, Clone)]
pub struct AdbAnalysis {
    pub series: CanonicalSeries,
    pub daily: DailySeries,
    pub result: AggregateResult,
    pub skipped: Vec<SkippedObservation>,
    display_decimal_places: u32,
}

impl AdbAnalysis {
    /// ADB rounded with the configured display precision.
    pub fn adb_display(&self) -> Decimal {
        self.result.adb_rounded(self.display_decimal_places)
    }
}

pub struct AdbProcessor {
    config: AdbConfig,
}

impl AdbProcessor {
    pub fn new(config: AdbConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AdbConfig {
        &self.config
    }

    pub fn analyze(&self, raw: &[RawObservation], range: &AnalysisRange) -> Result<AdbAnalysis> {
        range.validate()?;

        info!(
            "Analyzing {} raw observations over {} to {}",
            raw.len(),
            range.start,
            range.end
        );

        let report = Normalizer::new(&self.config).normalize_with_report(raw)?;
        self.analyze_report(report, range)
    }

    /// Analyzes from the first to the last observation.
    pub fn analyze_observed_period(&self, raw: &[RawObservation]) -> Result<AdbAnalysis> {
        let report = Normalizer::new(&self.config).normalize_with_report(raw)?;
        let range = AnalysisRange::covering(&report.series).ok_or(AdbError::EmptyExtraction)?;
        info!(
            "Analyzing {} raw observations over observed period {} to {}",
            raw.len(),
            range.start,
            range.end
        );
        self.analyze_report(report, &range)
    }

    fn analyze_report(
        &self,
        report: NormalizationReport,
        range: &AnalysisRange,
    ) -> Result<AdbAnalysis> {
        if report.series.is_empty() && self.config.fail_on_empty_extraction {
            return Err(AdbError::EmptyExtraction);
        }

        let daily = reconstruct(&report.series, range)?;
        let mut result = aggregate(&daily)?;
        annotate(&mut result, &report);

        for warning in &result.warnings {
            warn!("ADB analysis warning: {:?}", warning);
        }
        info!(
            "ADB over {} days: {} (closing balance {})",
            result.days_counted,
            result.adb_rounded(self.config.display_decimal_places),
            result.closing_balance
        );

        Ok(AdbAnalysis {
            series: report.series,
            daily,
            result,
            skipped: report.skipped,
            display_decimal_places: self.config.display_decimal_places,
        })
    }
}

impl Default for AdbProcessor {
    fn default() -> Self {
        Self {
            config: AdbConfig::default(),
        }
    }
}

/// Strict analysis with the default configuration.
pub fn analyze_balance_history(
    raw: &[RawObservation],
    range: &AnalysisRange,
) -> Result<AdbAnalysis> {
    AdbProcessor::default().analyze(raw, range)
}

fn annotate(result: &mut AggregateResult, report: &NormalizationReport) {
    if report.series.is_empty() {
        // No observations at all supersedes the leading gap.
        result.warnings.retain(|w| !matches!(w, AnalysisWarning::LeadingGap { .. }));
        result.warnings.insert(0, AnalysisWarning::EmptyExtraction);
    } else {
        let first_known = report.series.first_date();
        for warning in &mut result.warnings {
            if let AnalysisWarning::LeadingGap {
                first_observation, ..
            } = warning
            {
                if first_observation.is_none() {
                    *first_observation = first_known;
                }
            }
        }
    }

    if !report.skipped.is_empty() {
        result.warnings.push(AnalysisWarning::MalformedRowsSkipped {
            count: report.skipped.len(),
        });
    }
}
