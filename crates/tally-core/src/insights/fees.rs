//! Bank fee isolation

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::TransactionRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeRow {
    pub fingerprint: String,
    pub date: Option<NaiveDate>,
    pub label: String,
    pub category: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeeReport {
    pub rows: Vec<FeeRow>,
    /// Sum of absolute fee amounts
    pub total: f64,
}

/// Every row whose category contains `marker` (case-sensitive substring, so
/// suffixed sub-labels such as "Frais Bancaires - Carte" still match)
pub fn isolate_fees(records: &[TransactionRecord], marker: &str) -> FeeReport {
    if marker.is_empty() {
        return FeeReport::default();
    }

    let rows: Vec<FeeRow> = records
        .iter()
        .filter_map(|record| {
            let category = record.category.as_deref()?;
            category.contains(marker).then(|| FeeRow {
                fingerprint: record.fingerprint.clone(),
                date: record.operation_date,
                label: record.raw_label.clone(),
                category: category.to_string(),
                amount: record.amount,
            })
        })
        .collect();

    let total = rows.iter().map(|r| r.amount.abs()).sum();
    FeeReport { rows, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::record;

    #[test]
    fn test_substring_match_and_total() {
        let records = vec![
            record("a").with_amount(-2.0).with_category("Frais Bancaires"),
            record("b").with_amount(-3.5).with_category("Frais Bancaires - Carte"),
            record("c").with_amount(-40.0).with_category("Courses"),
            record("d").with_amount(-1.0),
        ];
        let report = isolate_fees(&records, "Frais Bancaires");

        let fingerprints: Vec<_> = report.rows.iter().map(|r| r.fingerprint.as_str()).collect();
        assert_eq!(fingerprints, vec!["a", "b"]);
        assert_eq!(report.total, 5.5);
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let records = vec![record("a").with_amount(-2.0).with_category("frais bancaires")];
        assert!(isolate_fees(&records, "Frais Bancaires").rows.is_empty());
    }

    #[test]
    fn test_empty_marker_matches_nothing() {
        let records = vec![record("a").with_amount(-2.0).with_category("Courses")];
        assert_eq!(isolate_fees(&records, ""), FeeReport::default());
    }
}
