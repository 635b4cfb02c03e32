//! Collaborator seams between the engine and storage
//!
//! The pipeline never opens a database itself. It is handed a [`RuleSource`]
//! and a [`LedgerRepository`]; [`crate::db::Database`] implements both, tests
//! use in-memory fakes.

use crate::error::Result;
use crate::models::{BudgetKind, BudgetKindChange, CategoryChange, RuleSet, TransactionRecord};

/// Read-only access to the categorization rules
pub trait RuleSource {
    /// Snapshot of the rules in declaration order
    fn get_rules(&self) -> Result<RuleSet>;
}

/// Persistence for ledger records
pub trait LedgerRepository {
    /// Insert records, ignoring fingerprints already present.
    /// Returns how many were newly inserted.
    fn add_many(&self, records: &[TransactionRecord]) -> Result<usize>;

    /// Every record in the ledger
    fn get_all(&self) -> Result<Vec<TransactionRecord>>;

    fn update_category(&self, fingerprint: &str, category: &str, sub_category: &str) -> Result<()>;

    fn update_budget_kind(&self, fingerprint: &str, kind: BudgetKind) -> Result<()>;

    /// Apply a category diff, clearing the sub-category of every changed row.
    /// Stores that can should apply all of it or none of it.
    fn update_categories(&self, changes: &[CategoryChange]) -> Result<usize> {
        for change in changes {
            self.update_category(&change.fingerprint, &change.category, "")?;
        }
        Ok(changes.len())
    }

    /// Apply a budget kind diff
    fn update_budget_kinds(&self, changes: &[BudgetKindChange]) -> Result<usize> {
        for change in changes {
            self.update_budget_kind(&change.fingerprint, change.budget_kind)?;
        }
        Ok(changes.len())
    }
}

impl<T: RuleSource + ?Sized> RuleSource for &T {
    fn get_rules(&self) -> Result<RuleSet> {
        (**self).get_rules()
    }
}

impl<T: LedgerRepository + ?Sized> LedgerRepository for &T {
    fn add_many(&self, records: &[TransactionRecord]) -> Result<usize> {
        (**self).add_many(records)
    }

    fn get_all(&self) -> Result<Vec<TransactionRecord>> {
        (**self).get_all()
    }

    fn update_category(&self, fingerprint: &str, category: &str, sub_category: &str) -> Result<()> {
        (**self).update_category(fingerprint, category, sub_category)
    }

    fn update_budget_kind(&self, fingerprint: &str, kind: BudgetKind) -> Result<()> {
        (**self).update_budget_kind(fingerprint, kind)
    }

    fn update_categories(&self, changes: &[CategoryChange]) -> Result<usize> {
        (**self).update_categories(changes)
    }

    fn update_budget_kinds(&self, changes: &[BudgetKindChange]) -> Result<usize> {
        (**self).update_budget_kinds(changes)
    }
}
