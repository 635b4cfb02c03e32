//! Outlier purchase finder
//!
//! Each debit is compared with the other debits of its category. A purchase
//! is flagged when its absolute amount is above `mean + k * std_dev` for the
//! category and also above a fixed floor, which keeps low-variance categories
//! of small amounts quiet.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::TransactionRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierPurchase {
    pub fingerprint: String,
    pub date: Option<NaiveDate>,
    pub label: String,
    pub category: String,
    /// Absolute amount spent
    pub amount: f64,
    pub category_mean: f64,
    pub category_std_dev: f64,
}

#[derive(Debug, Clone, Copy)]
struct CategoryStats {
    mean: f64,
    std_dev: f64,
}

impl CategoryStats {
    /// Mean and sample standard deviation; a single value has a deviation of 0
    fn from_amounts(amounts: &[f64]) -> Self {
        let n = amounts.len() as f64;
        let mean = amounts.iter().sum::<f64>() / n;
        let std_dev = if amounts.len() < 2 {
            0.0
        } else {
            let variance = amounts.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / (n - 1.0);
            variance.sqrt()
        };
        Self { mean, std_dev }
    }
}

fn spend_category(record: &TransactionRecord) -> Option<&str> {
    if record.amount >= 0.0 {
        return None;
    }
    record
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
}

/// Debits far above their category's usual spend, largest first
pub fn find_outliers(records: &[TransactionRecord], std_devs: f64, floor: f64) -> Vec<OutlierPurchase> {
    let mut amounts: HashMap<&str, Vec<f64>> = HashMap::new();
    for record in records {
        if let Some(category) = spend_category(record) {
            amounts.entry(category).or_default().push(record.amount.abs());
        }
    }

    let stats: HashMap<&str, CategoryStats> = amounts
        .iter()
        .map(|(category, values)| (*category, CategoryStats::from_amounts(values)))
        .collect();

    let mut outliers: Vec<OutlierPurchase> = records
        .iter()
        .filter_map(|record| {
            let category = spend_category(record)?;
            let stat = stats.get(category)?;
            let spent = record.amount.abs();
            let threshold = stat.mean + std_devs * stat.std_dev;
            (spent > threshold && spent > floor).then(|| OutlierPurchase {
                fingerprint: record.fingerprint.clone(),
                date: record.operation_date,
                label: record.raw_label.clone(),
                category: category.to_string(),
                amount: spent,
                category_mean: stat.mean,
                category_std_dev: stat.std_dev,
            })
        })
        .collect();

    outliers.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    outliers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::record;

    fn spend(fp: &str, category: &str, amount: f64) -> TransactionRecord {
        record(fp)
            .with_label(fp)
            .with_amount(amount)
            .with_category(category)
    }

    #[test]
    fn test_flags_purchase_far_above_category() {
        let mut records: Vec<_> = (0..9)
            .map(|i| spend(&format!("c{}", i), "Courses", -50.0))
            .collect();
        records.push(spend("big", "Courses", -400.0));

        let outliers = find_outliers(&records, 2.0, 20.0);
        assert_eq!(outliers.len(), 1);
        assert_eq!(outliers[0].fingerprint, "big");
        assert_eq!(outliers[0].amount, 400.0);
        assert_eq!(outliers[0].category, "Courses");
    }

    #[test]
    fn test_floor_suppresses_small_amounts() {
        // Every spend is at or below 20, however skewed the category
        let mut records: Vec<_> = (0..9)
            .map(|i| spend(&format!("p{}", i), "Boulangerie", -1.0))
            .collect();
        records.push(spend("croissants", "Boulangerie", -20.0));

        assert!(find_outliers(&records, 2.0, 20.0).is_empty());
    }

    #[test]
    fn test_single_observation_has_zero_deviation() {
        let stats = CategoryStats::from_amounts(&[42.0]);
        assert_eq!(stats.mean, 42.0);
        assert_eq!(stats.std_dev, 0.0);

        // mean + 0 equals the amount itself, so it is never strictly above
        let records = vec![spend("solo", "Voyage", -900.0)];
        assert!(find_outliers(&records, 2.0, 20.0).is_empty());
    }

    #[test]
    fn test_sample_standard_deviation() {
        let stats = CategoryStats::from_amounts(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(stats.mean, 5.0);
        assert!((stats.std_dev - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_skips_credits_and_uncategorized() {
        let mut records: Vec<_> = (0..9)
            .map(|i| spend(&format!("s{}", i), "Salaire", 10.0))
            .collect();
        records.push(spend("bonus", "Salaire", 5000.0));
        records.push(record("mystery").with_amount(-10_000.0));

        assert!(find_outliers(&records, 2.0, 20.0).is_empty());
    }
}
