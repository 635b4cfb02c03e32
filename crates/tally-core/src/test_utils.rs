//! Test utilities for tally-core
//!
//! Record builders and in-memory collaborators, so engine tests do not need a
//! database.

use std::cell::RefCell;

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::ledger::{LedgerRepository, RuleSource};
use crate::models::{AccountType, BudgetKind, RuleSet, TransactionRecord};

/// A bare Perso record with the given fingerprint
pub fn record(fingerprint: &str) -> TransactionRecord {
    TransactionRecord {
        fingerprint: fingerprint.to_string(),
        account_type: AccountType::Perso,
        amount: 0.0,
        operation_date: None,
        value_date: None,
        account_date: None,
        raw_label: String::new(),
        simplified_label: String::new(),
        reference: None,
        extra_info: None,
        operation_type: None,
        category: None,
        sub_category: None,
        debit: 0.0,
        credit: 0.0,
        pointed: false,
        budget_kind: BudgetKind::Punctual,
    }
}

impl TransactionRecord {
    pub fn with_label(mut self, label: &str) -> Self {
        self.raw_label = label.to_string();
        self
    }

    pub fn with_simplified(mut self, label: &str) -> Self {
        self.simplified_label = label.to_string();
        self
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = amount;
        if amount < 0.0 {
            self.debit = amount;
        } else {
            self.credit = amount;
        }
        self
    }

    /// ISO date (YYYY-MM-DD)
    pub fn with_date(mut self, date: &str) -> Self {
        self.operation_date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok();
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn with_sub_category(mut self, sub_category: &str) -> Self {
        self.sub_category = Some(sub_category.to_string());
        self
    }

    pub fn with_account(mut self, account_type: AccountType) -> Self {
        self.account_type = account_type;
        self
    }
}

/// Fixed rule snapshot
pub struct StaticRules(pub RuleSet);

impl RuleSource for StaticRules {
    fn get_rules(&self) -> Result<RuleSet> {
        Ok(self.0.clone())
    }
}

/// Insertion-ordered ledger kept in memory
#[derive(Default)]
pub struct MemoryLedger {
    records: RefCell<Vec<TransactionRecord>>,
}

impl MemoryLedger {
    pub fn with_records(records: Vec<TransactionRecord>) -> Self {
        Self {
            records: RefCell::new(records),
        }
    }

    pub fn get(&self, fingerprint: &str) -> Option<TransactionRecord> {
        self.records
            .borrow()
            .iter()
            .find(|r| r.fingerprint == fingerprint)
            .cloned()
    }

    fn update<F: FnOnce(&mut TransactionRecord)>(&self, fingerprint: &str, f: F) -> Result<()> {
        let mut records = self.records.borrow_mut();
        let record = records
            .iter_mut()
            .find(|r| r.fingerprint == fingerprint)
            .ok_or_else(|| Error::NotFound(format!("transaction {}", fingerprint)))?;
        f(record);
        Ok(())
    }
}

impl LedgerRepository for MemoryLedger {
    fn add_many(&self, records: &[TransactionRecord]) -> Result<usize> {
        let mut stored = self.records.borrow_mut();
        let mut inserted = 0;
        for record in records {
            if !stored.iter().any(|r| r.fingerprint == record.fingerprint) {
                stored.push(record.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn get_all(&self) -> Result<Vec<TransactionRecord>> {
        Ok(self.records.borrow().clone())
    }

    fn update_category(&self, fingerprint: &str, category: &str, sub_category: &str) -> Result<()> {
        self.update(fingerprint, |r| {
            r.category = Some(category.to_string());
            r.sub_category = Some(sub_category.to_string());
        })
    }

    fn update_budget_kind(&self, fingerprint: &str, kind: BudgetKind) -> Result<()> {
        self.update(fingerprint, |r| r.budget_kind = kind)
    }
}
