//! Subscription finder

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{BudgetKind, TransactionRecord};

/// One recurring debit series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subscription {
    pub label: String,
    /// Mean absolute amount per payment
    pub mean_amount: f64,
    pub payments: usize,
    pub last_payment: Option<NaiveDate>,
    pub fingerprints: Vec<String>,
}

/// Group recurring debits by simplified label, largest mean first
pub fn find_subscriptions(records: &[TransactionRecord]) -> Vec<Subscription> {
    let mut groups: BTreeMap<&str, Vec<&TransactionRecord>> = BTreeMap::new();
    for record in records
        .iter()
        .filter(|r| r.budget_kind == BudgetKind::Recurring && r.amount < 0.0)
    {
        groups
            .entry(record.simplified_label.as_str())
            .or_default()
            .push(record);
    }

    let mut subscriptions: Vec<Subscription> = groups
        .into_iter()
        .map(|(label, members)| {
            let total: f64 = members.iter().map(|r| r.amount.abs()).sum();
            Subscription {
                label: label.to_string(),
                mean_amount: total / members.len() as f64,
                payments: members.len(),
                last_payment: members.iter().filter_map(|r| r.operation_date).max(),
                fingerprints: members.iter().map(|r| r.fingerprint.clone()).collect(),
            }
        })
        .collect();

    // BTreeMap order keeps ties stable by label
    subscriptions.sort_by(|a, b| b.mean_amount.total_cmp(&a.mean_amount));
    subscriptions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::record;

    fn recurring(fp: &str, label: &str, amount: f64, date: &str) -> TransactionRecord {
        let mut r = record(fp)
            .with_simplified(label)
            .with_amount(amount)
            .with_date(date);
        r.budget_kind = BudgetKind::Recurring;
        r
    }

    #[test]
    fn test_groups_and_sorts_by_mean() {
        let records = vec![
            recurring("n1", "NETFLIX", -13.49, "2024-01-05"),
            recurring("n2", "NETFLIX", -13.49, "2024-02-05"),
            recurring("l1", "LOYER", -800.0, "2024-01-01"),
            recurring("l2", "LOYER", -810.0, "2024-02-01"),
            recurring("l3", "LOYER", -790.0, "2024-03-01"),
        ];
        let subs = find_subscriptions(&records);

        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].label, "LOYER");
        assert_eq!(subs[0].mean_amount, 800.0);
        assert_eq!(subs[0].payments, 3);
        assert_eq!(subs[0].last_payment, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(subs[0].fingerprints, vec!["l1", "l2", "l3"]);
        assert_eq!(subs[1].label, "NETFLIX");
    }

    #[test]
    fn test_ignores_credits_and_punctual_rows() {
        let records = vec![
            recurring("salary", "SALAIRE", 2500.0, "2024-01-28"),
            record("fnac").with_simplified("FNAC").with_amount(-89.0),
        ];
        assert!(find_subscriptions(&records).is_empty());
    }
}
