//! Keyword rule categorization
//!
//! Rules come as an ordered [`RuleSet`] snapshot. Every category is tried in
//! order against every candidate row, so when two categories match the same
//! label the one declared last wins. More specific rules are expected to be
//! declared later.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::{CategoryChange, LedgerRow, RuleSet, TransactionRecord};

/// Which rows a categorization pass may touch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategorizeMode {
    /// Only rows without a category (import time)
    FillEmptyOnly,
    /// Every row (bulk re-sweep after rule changes)
    ForceAll,
}

/// Categorization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorizationConfig {
    /// Category values that count as empty, matched case-insensitively as substrings
    pub uncategorized_markers: Vec<String>,
}

impl Default for CategorizationConfig {
    fn default() -> Self {
        Self {
            uncategorized_markers: vec!["A catégoriser".to_string(), "Non catégorisé".to_string()],
        }
    }
}

impl CategorizationConfig {
    /// Whether a category value counts as "no category"
    pub fn is_uncategorized(&self, category: Option<&str>) -> bool {
        match category.map(str::trim) {
            None | Some("") => true,
            Some(value) => {
                let value = value.to_lowercase();
                self.uncategorized_markers
                    .iter()
                    .map(|m| m.trim().to_lowercase())
                    .any(|m| !m.is_empty() && value.contains(m.as_str()))
            }
        }
    }
}

/// Counts from a categorization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategorizeReport {
    pub candidates: usize,
    pub matched: usize,
}

struct CompiledRule<'a> {
    category: &'a str,
    keywords: Vec<String>,
}

/// Applies a rule snapshot to rows
pub struct Categorizer<'a> {
    rules: Vec<CompiledRule<'a>>,
    config: CategorizationConfig,
}

impl<'a> Categorizer<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self::with_config(rules, &CategorizationConfig::default())
    }

    pub fn with_config(rules: &'a RuleSet, config: &CategorizationConfig) -> Self {
        let rules = rules
            .iter()
            .map(|rule| CompiledRule {
                category: rule.category.as_str(),
                keywords: rule
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect(),
            })
            .collect();

        Self {
            rules,
            config: config.clone(),
        }
    }

    pub fn is_uncategorized(&self, category: Option<&str>) -> bool {
        self.config.is_uncategorized(category)
    }

    /// The category the rules assign to a label, if any (last match wins)
    pub fn match_label(&self, label: &str) -> Option<&'a str> {
        let label = label.to_lowercase();
        let mut matched = None;
        for rule in &self.rules {
            if rule.keywords.iter().any(|k| label.contains(k.as_str())) {
                matched = Some(rule.category);
            }
        }
        matched
    }

    /// Set the category of every candidate row whose label matches a rule.
    ///
    /// Candidates are chosen before any assignment, so a row filled by this
    /// pass stays a candidate for later categories in the same pass. Rows that
    /// match nothing keep their prior category.
    pub fn categorize<R: LedgerRow>(&self, rows: &mut [R], mode: CategorizeMode) -> CategorizeReport {
        let candidates: Vec<bool> = rows
            .iter()
            .map(|row| match mode {
                CategorizeMode::ForceAll => true,
                CategorizeMode::FillEmptyOnly => self.is_uncategorized(row.category()),
            })
            .collect();

        let mut report = CategorizeReport::default();
        for (row, is_candidate) in rows.iter_mut().zip(candidates) {
            if !is_candidate {
                continue;
            }
            report.candidates += 1;
            if let Some(category) = self.match_label(row.raw_label()) {
                debug!("'{}' → {}", row.raw_label(), category);
                row.set_category(category);
                report.matched += 1;
            }
        }

        debug!(
            "Categorized {} of {} candidate rows ({:?})",
            report.matched, report.candidates, mode
        );
        report
    }

    /// Force-apply the rules to ledger records and return only the rows whose
    /// category actually changed.
    pub fn sweep(&self, records: &mut [TransactionRecord]) -> Vec<CategoryChange> {
        let before: Vec<Option<String>> = records.iter().map(|r| r.category.clone()).collect();

        self.categorize(records, CategorizeMode::ForceAll);

        let changes: Vec<CategoryChange> = records
            .iter()
            .zip(before)
            .filter_map(|(record, previous)| match &record.category {
                Some(category) if previous.as_deref() != Some(category.as_str()) => {
                    Some(CategoryChange {
                        fingerprint: record.fingerprint.clone(),
                        category: category.clone(),
                    })
                }
                _ => None,
            })
            .collect();

        info!(
            "Rule sweep over {} records: {} categories changed",
            records.len(),
            changes.len()
        );
        changes
    }
}

/// Categorize rows with a rule snapshot
pub fn categorize<R: LedgerRow>(rows: &mut [R], rules: &RuleSet, mode: CategorizeMode) -> CategorizeReport {
    Categorizer::new(rules).categorize(rows, mode)
}
