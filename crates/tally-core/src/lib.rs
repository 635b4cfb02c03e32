//! Tally Core Library
//!
//! Shared functionality for the tally household ledger:
//! - Statement import with column normalization and defensive parsing
//! - Content fingerprints for idempotent re-import
//! - Keyword rule categorization with diff-only re-sweeps
//! - Monthly recurring charge detection
//! - Insights: subscriptions, outlier purchases, bank fees, period summary
//! - SQLite-backed ledger and rule store

pub mod categorize;
pub mod config;
pub mod db;
pub mod detect;
pub mod error;
pub mod fingerprint;
pub mod import;
pub mod insights;
pub mod ledger;
pub mod models;
pub mod pipeline;

/// Record builders and in-memory collaborators
#[cfg(test)]
pub mod test_utils;

pub use categorize::{categorize, CategorizationConfig, CategorizeMode, CategorizeReport, Categorizer};
pub use config::Config;
pub use db::{Database, TransactionQuery};
pub use detect::{DetectionConfig, DetectionReport, RecurrenceDetector};
pub use error::{Error, Result};
pub use import::{read_statement, AmountConvention, ImportConfig, Normalizer, RawTable};
pub use insights::{InsightKind, InsightsAnalyzer, InsightsConfig, InsightsReport, SummaryFilter};
pub use ledger::{LedgerRepository, RuleSource};
pub use models::{
    AccountType, BudgetKind, BudgetKindChange, CategorizationRule, CategoryChange, RuleSet,
    TransactionRecord,
};
pub use pipeline::{
    apply_budget_kind_changes, apply_category_changes, plan_recategorization, plan_redetection,
    recategorize_ledger, redetect_ledger, ImportPipeline, ImportReport,
};
