//! Transaction command implementations

use anyhow::{Context, Result};
use tally_core::{
    config::Config,
    db::{Database, TransactionQuery},
    ledger::LedgerRepository,
    models::BudgetKind,
};

use super::{format_amount, parse_account, short_fingerprint, truncate};

pub fn cmd_transactions_list(
    db: &Database,
    config: &Config,
    account: Option<&str>,
    uncategorized: bool,
    limit: usize,
) -> Result<()> {
    let query = TransactionQuery {
        account: account.map(parse_account).transpose()?,
        uncategorized_only: uncategorized,
        uncategorized_markers: config.categorization.uncategorized_markers.clone(),
        limit: Some(limit),
    };
    let transactions = db.list_transactions(&query)?;

    if transactions.is_empty() {
        println!("No transactions found. Import some with:");
        println!("  tally import --file statement.csv --account perso");
        return Ok(());
    }

    println!();
    if uncategorized {
        println!("📝 Uncategorized Transactions");
    } else {
        println!("📝 Recent Transactions");
    }
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in transactions {
        let date = tx
            .operation_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "----------".to_string());
        let kind = match tx.budget_kind {
            BudgetKind::Recurring => "🔁",
            BudgetKind::Punctual => "  ",
        };
        println!(
            "   {} │ {} │ {:>10} │ {:<16} │ {} {}",
            short_fingerprint(&tx.fingerprint),
            date,
            format_amount(tx.amount),
            truncate(tx.category.as_deref().unwrap_or("-"), 16),
            kind,
            truncate(&tx.raw_label, 36)
        );
    }

    Ok(())
}

/// Resolve a full fingerprint from a unique prefix
fn resolve_fingerprint(db: &Database, prefix: &str) -> Result<String> {
    let prefix = prefix.trim();
    if let Some(record) = db.get_record(prefix)? {
        return Ok(record.fingerprint);
    }

    let matches: Vec<String> = db
        .get_all()?
        .into_iter()
        .map(|r| r.fingerprint)
        .filter(|fp| fp.starts_with(prefix))
        .collect();
    match matches.as_slice() {
        [] => anyhow::bail!("Transaction {} not found", prefix),
        [only] => Ok(only.clone()),
        _ => anyhow::bail!(
            "Fingerprint prefix {} is ambiguous ({} matches)",
            prefix,
            matches.len()
        ),
    }
}

pub fn cmd_transactions_set_category(
    db: &Database,
    fingerprint: &str,
    category: &str,
    sub_category: &str,
) -> Result<()> {
    let fingerprint = resolve_fingerprint(db, fingerprint)?;
    db.update_category(&fingerprint, category.trim(), sub_category.trim())
        .context("Failed to update category")?;

    if sub_category.trim().is_empty() {
        println!("✅ {} → {}", short_fingerprint(&fingerprint), category.trim());
    } else {
        println!(
            "✅ {} → {} / {}",
            short_fingerprint(&fingerprint),
            category.trim(),
            sub_category.trim()
        );
    }
    Ok(())
}

pub fn cmd_transactions_set_kind(db: &Database, fingerprint: &str, kind: &str) -> Result<()> {
    let kind: BudgetKind = kind.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let fingerprint = resolve_fingerprint(db, fingerprint)?;
    db.update_budget_kind(&fingerprint, kind)
        .context("Failed to update budget kind")?;

    println!(
        "✅ {} marked as {}",
        short_fingerprint(&fingerprint),
        kind.display_label()
    );
    Ok(())
}
