//! Recurring charge detection
//!
//! Rows sharing an account and a simplified label form a group. A group is a monthly series
//! when it has enough members, stable amounts, and every gap between
//! consecutive dates falls in the monthly band. Members of a series are marked
//! `Recurring`, every other row `Punctual`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::{AccountType, BudgetKind, BudgetKindChange, LedgerRow, TransactionRecord};

/// Grouping key: rows of different accounts never share a series
type GroupKey<'a> = (Option<AccountType>, &'a str);

/// Slack on the amount tolerance so values exactly at the boundary survive
/// float rounding (10.5 / 10.0 - 1.0 is not exactly 0.05)
const TOLERANCE_EPSILON: f64 = 1e-9;

/// Detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Smallest group that can form a series
    pub min_occurrences: usize,
    /// Allowed |amount - mean| / |mean| for every member (0.05 = 5%)
    pub amount_tolerance: f64,
    /// Shortest allowed gap between consecutive charges, inclusive
    pub min_interval_days: i64,
    /// Longest allowed gap between consecutive charges, inclusive
    pub max_interval_days: i64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_occurrences: 3,
            amount_tolerance: 0.05,
            min_interval_days: 28,
            max_interval_days: 32,
        }
    }
}

/// Why a group was not recognised as a monthly series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TooFew,
    Undated,
    ZeroMean,
    UnstableAmount,
    IrregularInterval,
}

/// Counts from a detection pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectionReport {
    pub groups: usize,
    pub recurring_groups: usize,
    pub recurring_rows: usize,
}

pub struct RecurrenceDetector {
    config: DetectionConfig,
}

impl Default for RecurrenceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl RecurrenceDetector {
    pub fn new() -> Self {
        Self {
            config: DetectionConfig::default(),
        }
    }

    pub fn with_config(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Annotate every row with its budget kind.
    ///
    /// The result does not depend on input order: each group is sorted by date
    /// here before intervals are measured.
    pub fn detect<R: LedgerRow>(&self, rows: &mut [R]) -> DetectionReport {
        let mut groups: HashMap<GroupKey<'_>, Vec<usize>> = HashMap::new();
        for (idx, row) in rows.iter().enumerate() {
            let label = row.simplified_label().trim();
            if !label.is_empty() {
                groups
                    .entry((row.account_type(), label))
                    .or_default()
                    .push(idx);
            }
        }

        let mut report = DetectionReport {
            groups: groups.len(),
            ..Default::default()
        };
        let mut recurring = vec![false; rows.len()];

        for ((_, label), members) in &groups {
            match self.check_group(rows, members) {
                Ok(()) => {
                    debug!("'{}': monthly series of {} charges", label, members.len());
                    report.recurring_groups += 1;
                    report.recurring_rows += members.len();
                    for &idx in members {
                        recurring[idx] = true;
                    }
                }
                Err(reason) => {
                    if reason != Rejection::TooFew {
                        debug!("'{}': not recurring ({:?})", label, reason);
                    }
                }
            }
        }

        for (row, is_recurring) in rows.iter_mut().zip(recurring) {
            row.set_budget_kind(if is_recurring {
                BudgetKind::Recurring
            } else {
                BudgetKind::Punctual
            });
        }

        debug!(
            "Recurrence: {} of {} groups recurring ({} rows)",
            report.recurring_groups, report.groups, report.recurring_rows
        );
        report
    }

    /// Re-run detection over ledger records and return only the rows whose
    /// budget kind changed.
    pub fn detect_changes(&self, records: &mut [TransactionRecord]) -> Vec<BudgetKindChange> {
        let before: Vec<BudgetKind> = records.iter().map(|r| r.budget_kind).collect();

        self.detect(records);

        let changes: Vec<BudgetKindChange> = records
            .iter()
            .zip(before)
            .filter(|(record, previous)| record.budget_kind != *previous)
            .map(|(record, _)| BudgetKindChange {
                fingerprint: record.fingerprint.clone(),
                budget_kind: record.budget_kind,
            })
            .collect();

        info!(
            "Recurrence sweep over {} records: {} budget kinds changed",
            records.len(),
            changes.len()
        );
        changes
    }

    fn check_group<R: LedgerRow>(
        &self,
        rows: &[R],
        members: &[usize],
    ) -> std::result::Result<(), Rejection> {
        if members.len() < self.config.min_occurrences.max(1) {
            return Err(Rejection::TooFew);
        }

        let mut dated = Vec::with_capacity(members.len());
        for &idx in members {
            let row = &rows[idx];
            let date = row.operation_date().ok_or(Rejection::Undated)?;
            dated.push((date, row.amount()));
        }

        let mean = dated.iter().map(|(_, a)| a).sum::<f64>() / dated.len() as f64;
        if mean == 0.0 {
            return Err(Rejection::ZeroMean);
        }

        let limit = self.config.amount_tolerance + TOLERANCE_EPSILON;
        if !dated
            .iter()
            .all(|(_, amount)| (amount - mean).abs() / mean.abs() <= limit)
        {
            return Err(Rejection::UnstableAmount);
        }

        dated.sort_by_key(|(date, _)| *date);
        let regular = dated.windows(2).all(|w| {
            let gap = (w[1].0 - w[0].0).num_days();
            (self.config.min_interval_days..=self.config.max_interval_days).contains(&gap)
        });
        if !regular {
            return Err(Rejection::IrregularInterval);
        }

        Ok(())
    }
}
