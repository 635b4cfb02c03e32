//! Content-addressed transaction fingerprints used as the deduplication key

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use crate::models::AccountType;

const FIELD_SEPARATOR: &[u8] = b"\x1f";

/// Date component of the fingerprint: ISO date when the cell parsed, else the raw text
pub fn date_key(parsed: Option<NaiveDate>, raw: &str) -> String {
    match parsed {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => raw.trim().to_string(),
    }
}

/// Hash (operation date, raw label, amount, account type) into a hex SHA-256.
///
/// The label is case-folded and whitespace-collapsed and the amount is rendered
/// to cents, so the same statement line exported with different casing or
/// padding yields the same fingerprint.
pub fn fingerprint(
    operation_date: &str,
    raw_label: &str,
    amount: f64,
    account_type: AccountType,
) -> String {
    let label = raw_label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let mut hasher = Sha256::new();
    hasher.update(operation_date.trim().as_bytes());
    hasher.update(FIELD_SEPARATOR);
    hasher.update(label.as_bytes());
    hasher.update(FIELD_SEPARATOR);
    hasher.update(amount_key(amount).as_bytes());
    hasher.update(FIELD_SEPARATOR);
    hasher.update(account_type.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

fn amount_key(amount: f64) -> String {
    let cents = (amount * 100.0).round();
    // -0.00 and 0.00 are the same line
    let cents = if cents == 0.0 { 0.0 } else { cents };
    format!("{:.2}", cents / 100.0)
}
