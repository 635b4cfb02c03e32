//! Ledger record operations

use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, OptionalExtension};
use tracing::{debug, warn};

use super::Database;
use crate::error::{Error, Result};
use crate::ledger::LedgerRepository;
use crate::categorize::CategorizationConfig;
use crate::models::{AccountType, BudgetKind, BudgetKindChange, CategoryChange, TransactionRecord};

const RECORD_COLUMNS: &str = "fingerprint, account_type, amount, operation_date, value_date, \
     account_date, raw_label, simplified_label, reference, extra_info, operation_type, \
     category, sub_category, debit, credit, pointed, budget_kind";

/// Filters for listing ledger rows
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    pub account: Option<AccountType>,
    /// Only rows with no category: NULL, blank, or containing one of
    /// `uncategorized_markers`
    pub uncategorized_only: bool,
    pub uncategorized_markers: Vec<String>,
    pub limit: Option<usize>,
}

fn date_to_sql(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

fn date_from_sql(value: Option<String>) -> Option<NaiveDate> {
    value.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}

impl Database {
    /// Insert records, skipping fingerprints already in the ledger.
    /// Returns the number of rows actually inserted.
    pub fn insert_records(&self, records: &[TransactionRecord]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR IGNORE INTO transactions ({}) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                RECORD_COLUMNS
            ))?;
            for record in records {
                inserted += stmt.execute(params![
                    record.fingerprint,
                    record.account_type.as_str(),
                    record.amount,
                    date_to_sql(record.operation_date),
                    date_to_sql(record.value_date),
                    date_to_sql(record.account_date),
                    record.raw_label,
                    record.simplified_label,
                    record.reference,
                    record.extra_info,
                    record.operation_type,
                    record.category,
                    record.sub_category,
                    record.debit,
                    record.credit,
                    record.pointed,
                    record.budget_kind.as_str(),
                ])?;
            }
        }
        tx.commit()?;

        debug!("Inserted {} of {} records", inserted, records.len());
        Ok(inserted)
    }

    /// Every ledger record, in insertion order
    pub fn all_records(&self) -> Result<Vec<TransactionRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions ORDER BY rowid",
            RECORD_COLUMNS
        ))?;
        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Ledger rows, most recent first
    pub fn list_transactions(&self, query: &TransactionQuery) -> Result<Vec<TransactionRecord>> {
        let conn = self.conn()?;

        let mut conditions = Vec::new();
        let mut values: Vec<String> = Vec::new();
        if let Some(account) = query.account {
            conditions.push("account_type = ?");
            values.push(account.as_str().to_string());
        }
        if query.uncategorized_only && query.uncategorized_markers.is_empty() {
            conditions.push("(category IS NULL OR TRIM(category) = '')");
        }
        // Markers are matched after the query: SQLite LOWER only folds ASCII
        let filter_markers = query.uncategorized_only && !query.uncategorized_markers.is_empty();

        let mut sql = format!("SELECT {} FROM transactions", RECORD_COLUMNS);
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY operation_date DESC NULLS LAST, rowid DESC");
        if let (Some(limit), false) = (query.limit, filter_markers) {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = conn.prepare(&sql)?;
        let mut records = stmt
            .query_map(params_from_iter(values.iter()), Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if filter_markers {
            let categorization = CategorizationConfig {
                uncategorized_markers: query.uncategorized_markers.clone(),
            };
            records.retain(|r| categorization.is_uncategorized(r.category.as_deref()));
            if let Some(limit) = query.limit {
                records.truncate(limit);
            }
        }
        Ok(records)
    }

    pub fn get_record(&self, fingerprint: &str) -> Result<Option<TransactionRecord>> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM transactions WHERE fingerprint = ?",
                    RECORD_COLUMNS
                ),
                params![fingerprint],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Count total transactions
    pub fn count_transactions(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Set category and sub-category of one record
    pub fn set_category(&self, fingerprint: &str, category: &str, sub_category: &str) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE transactions SET category = ?, sub_category = ? WHERE fingerprint = ?",
            params![category, sub_category, fingerprint],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("transaction {}", fingerprint)));
        }
        Ok(())
    }

    pub fn set_budget_kind(&self, fingerprint: &str, kind: BudgetKind) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE transactions SET budget_kind = ? WHERE fingerprint = ?",
            params![kind.as_str(), fingerprint],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("transaction {}", fingerprint)));
        }
        Ok(())
    }

    /// Apply a category diff in one transaction; an unknown fingerprint rolls
    /// the whole diff back. Sub-categories of changed rows are cleared.
    pub fn set_categories(&self, changes: &[CategoryChange]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "UPDATE transactions SET category = ?, sub_category = '' WHERE fingerprint = ?",
            )?;
            for change in changes {
                if stmt.execute(params![change.category, change.fingerprint])? == 0 {
                    return Err(Error::NotFound(format!("transaction {}", change.fingerprint)));
                }
            }
        }
        tx.commit()?;

        debug!("Applied {} category changes", changes.len());
        Ok(changes.len())
    }

    /// Apply a budget kind diff in one transaction
    pub fn set_budget_kinds(&self, changes: &[BudgetKindChange]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt =
                tx.prepare("UPDATE transactions SET budget_kind = ? WHERE fingerprint = ?")?;
            for change in changes {
                if stmt.execute(params![change.budget_kind.as_str(), change.fingerprint])? == 0 {
                    return Err(Error::NotFound(format!("transaction {}", change.fingerprint)));
                }
            }
        }
        tx.commit()?;

        debug!("Applied {} budget kind changes", changes.len());
        Ok(changes.len())
    }

    pub(crate) fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<TransactionRecord> {
        let fingerprint: String = row.get(0)?;
        let account_str: String = row.get(1)?;
        let kind_str: String = row.get(16)?;

        let account_type = account_str.parse().unwrap_or_else(|_| {
            warn!("Unknown account type '{}' on {}", account_str, fingerprint);
            AccountType::Perso
        });
        let budget_kind = kind_str.parse().unwrap_or_else(|_| {
            warn!("Unknown budget kind '{}' on {}", kind_str, fingerprint);
            BudgetKind::Punctual
        });

        Ok(TransactionRecord {
            fingerprint,
            account_type,
            amount: row.get(2)?,
            operation_date: date_from_sql(row.get(3)?),
            value_date: date_from_sql(row.get(4)?),
            account_date: date_from_sql(row.get(5)?),
            raw_label: row.get(6)?,
            simplified_label: row.get(7)?,
            reference: row.get(8)?,
            extra_info: row.get(9)?,
            operation_type: row.get(10)?,
            category: row.get(11)?,
            sub_category: row.get(12)?,
            debit: row.get(13)?,
            credit: row.get(14)?,
            pointed: row.get(15)?,
            budget_kind,
        })
    }
}

impl LedgerRepository for Database {
    fn add_many(&self, records: &[TransactionRecord]) -> Result<usize> {
        self.insert_records(records)
    }

    fn get_all(&self) -> Result<Vec<TransactionRecord>> {
        self.all_records()
    }

    fn update_category(&self, fingerprint: &str, category: &str, sub_category: &str) -> Result<()> {
        self.set_category(fingerprint, category, sub_category)
    }

    fn update_budget_kind(&self, fingerprint: &str, kind: BudgetKind) -> Result<()> {
        self.set_budget_kind(fingerprint, kind)
    }

    fn update_categories(&self, changes: &[CategoryChange]) -> Result<usize> {
        self.set_categories(changes)
    }

    fn update_budget_kinds(&self, changes: &[BudgetKindChange]) -> Result<usize> {
        self.set_budget_kinds(changes)
    }
}
