//! Read-side insights over the persisted ledger
//!
//! Every detector is a pure function of a ledger snapshot. Nothing is cached
//! between runs; callers fetch `get_all()` and pass the records in.
//!
//! ## Detectors
//!
//! - **Subscriptions** - recurring debits grouped by simplified label
//! - **Outliers** - purchases far above their category's usual spend
//! - **Fees** - rows whose category carries the bank-fee marker
//! - **Summary** - income, expenses and per-category spend for a period
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_core::insights::InsightsAnalyzer;
//!
//! let analyzer = InsightsAnalyzer::with_config(config.insights.clone());
//! let report = analyzer.analyze_all(&db.get_all()?);
//! ```

pub mod fees;
pub mod outliers;
pub mod subscriptions;
pub mod summary;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::categorize::CategorizationConfig;
use crate::error::Result;
use crate::models::TransactionRecord;

pub use fees::{FeeReport, FeeRow};
pub use outliers::OutlierPurchase;
pub use subscriptions::Subscription;
pub use summary::{CategorySpend, LedgerSummary, SummaryFilter};

/// Insight thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    /// Flag spend above mean + k standard deviations of its category
    pub outlier_std_devs: f64,
    /// Never flag spend at or below this absolute amount
    pub outlier_floor: f64,
    /// Category substring identifying bank fees
    pub fee_marker: String,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            outlier_std_devs: 2.0,
            outlier_floor: 20.0,
            fee_marker: "Frais Bancaires".to_string(),
        }
    }
}

/// Insight detectors that can be run on their own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Subscriptions,
    Outliers,
    Fees,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::Subscriptions => "subscriptions",
            InsightKind::Outliers => "outliers",
            InsightKind::Fees => "fees",
        }
    }

    pub fn all() -> &'static [InsightKind] {
        &[
            InsightKind::Subscriptions,
            InsightKind::Outliers,
            InsightKind::Fees,
        ]
    }
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InsightKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "subscriptions" | "subscription" => Ok(InsightKind::Subscriptions),
            "outliers" | "outlier" | "large" => Ok(InsightKind::Outliers),
            "fees" | "fee" => Ok(InsightKind::Fees),
            _ => Err(format!("Unknown insight kind: {}", s)),
        }
    }
}

/// Output of all three detectors over one snapshot
#[derive(Debug, Clone, Default, Serialize)]
pub struct InsightsReport {
    pub subscriptions: Vec<Subscription>,
    pub outliers: Vec<OutlierPurchase>,
    pub fees: FeeReport,
}

impl InsightsReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Runs the insight detectors with one set of thresholds
#[derive(Debug, Clone, Default)]
pub struct InsightsAnalyzer {
    config: InsightsConfig,
}

impl InsightsAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: InsightsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InsightsConfig {
        &self.config
    }

    pub fn subscriptions(&self, records: &[TransactionRecord]) -> Vec<Subscription> {
        subscriptions::find_subscriptions(records)
    }

    pub fn outliers(&self, records: &[TransactionRecord]) -> Vec<OutlierPurchase> {
        outliers::find_outliers(
            records,
            self.config.outlier_std_devs,
            self.config.outlier_floor,
        )
    }

    pub fn fees(&self, records: &[TransactionRecord]) -> FeeReport {
        fees::isolate_fees(records, &self.config.fee_marker)
    }

    pub fn summary(
        &self,
        records: &[TransactionRecord],
        filter: &SummaryFilter,
        categorization: &CategorizationConfig,
    ) -> LedgerSummary {
        LedgerSummary::compute(records, filter, categorization)
    }

    /// Run the subscription, outlier and fee detectors
    pub fn analyze_all(&self, records: &[TransactionRecord]) -> InsightsReport {
        let report = InsightsReport {
            subscriptions: self.subscriptions(records),
            outliers: self.outliers(records),
            fees: self.fees(records),
        };
        debug!(
            subscriptions = report.subscriptions.len(),
            outliers = report.outliers.len(),
            fees = report.fees.rows.len(),
            "Insight analysis complete"
        );
        report
    }
}
