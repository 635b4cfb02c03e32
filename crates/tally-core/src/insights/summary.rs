//! Period totals and data-quality share for the ledger

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::categorize::CategorizationConfig;
use crate::models::{AccountType, TransactionRecord};

/// Which records a summary covers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryFilter {
    pub account: Option<AccountType>,
    /// Inclusive lower bound on the operation date
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the operation date
    pub to: Option<NaiveDate>,
}

impl SummaryFilter {
    /// Undated records only match when no date bound is set
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        if self.account.is_some_and(|a| a != record.account_type) {
            return false;
        }
        if self.from.is_none() && self.to.is_none() {
            return true;
        }
        let Some(date) = record.operation_date else {
            return false;
        };
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpend {
    pub category: String,
    /// Absolute amount spent
    pub total: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LedgerSummary {
    pub transactions: usize,
    pub income: f64,
    /// Absolute total of debits
    pub expenses: f64,
    pub net: f64,
    /// Debits per category, largest first; uncategorized debits are left out
    pub by_category: Vec<CategorySpend>,
    pub uncategorized: usize,
    pub uncategorized_percent: f64,
}

impl LedgerSummary {
    pub fn compute(
        records: &[TransactionRecord],
        filter: &SummaryFilter,
        categorization: &CategorizationConfig,
    ) -> Self {
        let mut summary = LedgerSummary::default();
        let mut spend: HashMap<String, (f64, usize)> = HashMap::new();

        for record in records.iter().filter(|r| filter.matches(r)) {
            summary.transactions += 1;
            let uncategorized = categorization.is_uncategorized(record.category.as_deref());
            if uncategorized {
                summary.uncategorized += 1;
            }

            if record.amount > 0.0 {
                summary.income += record.amount;
            } else if record.amount < 0.0 {
                summary.expenses += record.amount.abs();
                if let (false, Some(category)) = (uncategorized, record.category.as_deref()) {
                    let entry = spend.entry(category.trim().to_string()).or_default();
                    entry.0 += record.amount.abs();
                    entry.1 += 1;
                }
            }
        }

        summary.net = summary.income - summary.expenses;
        if summary.transactions > 0 {
            summary.uncategorized_percent =
                summary.uncategorized as f64 * 100.0 / summary.transactions as f64;
        }

        summary.by_category = spend
            .into_iter()
            .map(|(category, (total, count))| CategorySpend {
                category,
                total,
                count,
            })
            .collect();
        summary.by_category.sort_by(|a, b| {
            b.total
                .total_cmp(&a.total)
                .then_with(|| a.category.cmp(&b.category))
        });

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::record;

    fn ledger() -> Vec<TransactionRecord> {
        vec![
            record("salary")
                .with_amount(2500.0)
                .with_date("2024-01-28")
                .with_category("Salaire"),
            record("rent")
                .with_amount(-800.0)
                .with_date("2024-01-02")
                .with_category("Loyer"),
            record("food1")
                .with_amount(-60.0)
                .with_date("2024-01-10")
                .with_category("Courses"),
            record("food2")
                .with_amount(-40.0)
                .with_date("2024-02-10")
                .with_category("Courses"),
            record("unknown").with_amount(-15.0).with_date("2024-01-20"),
            record("joint")
                .with_amount(-300.0)
                .with_date("2024-01-15")
                .with_category("Courses")
                .with_account(AccountType::Commun),
        ]
    }

    #[test]
    fn test_totals_and_category_ranking() {
        let summary =
            LedgerSummary::compute(&ledger(), &SummaryFilter::default(), &CategorizationConfig::default());

        assert_eq!(summary.transactions, 6);
        assert_eq!(summary.income, 2500.0);
        assert_eq!(summary.expenses, 1215.0);
        assert_eq!(summary.net, 1285.0);
        let ranking: Vec<_> = summary
            .by_category
            .iter()
            .map(|c| (c.category.as_str(), c.total))
            .collect();
        assert_eq!(ranking, vec![("Loyer", 800.0), ("Courses", 400.0)]);
        assert_eq!(summary.uncategorized, 1);
    }

    #[test]
    fn test_account_and_date_filters() {
        let filter = SummaryFilter {
            account: Some(AccountType::Perso),
            from: NaiveDate::from_ymd_opt(2024, 1, 1),
            to: NaiveDate::from_ymd_opt(2024, 1, 31),
        };
        let summary = LedgerSummary::compute(&ledger(), &filter, &CategorizationConfig::default());

        assert_eq!(summary.transactions, 4);
        assert_eq!(summary.expenses, 875.0);
        assert_eq!(summary.uncategorized_percent, 25.0);
    }

    #[test]
    fn test_undated_rows_excluded_by_date_bounds() {
        let records = vec![record("x").with_amount(-5.0)];
        let bounded = SummaryFilter {
            from: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..Default::default()
        };
        let config = CategorizationConfig::default();
        assert_eq!(LedgerSummary::compute(&records, &bounded, &config).transactions, 0);
        assert_eq!(
            LedgerSummary::compute(&records, &SummaryFilter::default(), &config).transactions,
            1
        );
    }

    #[test]
    fn test_markers_count_as_uncategorized() {
        let records = vec![record("x").with_amount(-5.0).with_category("A catégoriser")];
        let config = CategorizationConfig {
            uncategorized_markers: vec!["A catégoriser".into()],
        };
        let summary = LedgerSummary::compute(&records, &SummaryFilter::default(), &config);
        assert_eq!(summary.uncategorized, 1);
        assert!(summary.by_category.is_empty());
    }

    #[test]
    fn test_empty_ledger() {
        let summary =
            LedgerSummary::compute(&[], &SummaryFilter::default(), &CategorizationConfig::default());
        assert_eq!(summary, LedgerSummary::default());
    }
}
