//! Import and re-sweep orchestration
//!
//! Import runs normalize → categorize → detect → fingerprint over one
//! statement, then hands the finished records to the ledger in a single
//! `add_many` call. Nothing is written until every stage has succeeded.

use std::io::Read;

use serde::Serialize;
use tracing::{debug, info};

use crate::categorize::{CategorizationConfig, CategorizeMode, Categorizer};
use crate::config::Config;
use crate::detect::RecurrenceDetector;
use crate::error::Result;
use crate::import::{read_statement, Normalizer, RawTable};
use crate::ledger::{LedgerRepository, RuleSource};
use crate::models::{AccountType, BudgetKindChange, CategoryChange, RuleSet, TransactionRecord};

/// Outcome of importing one statement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Rows read from the statement
    pub parsed: usize,
    /// Rows the rules assigned a category to
    pub categorized: usize,
    /// Rows still without a category after the rules ran
    pub uncategorized: usize,
    /// Rows marked as part of a monthly series within the statement
    pub recurring: usize,
    /// Rows newly added to the ledger
    pub inserted: usize,
    /// Rows whose fingerprint was already known
    pub duplicates: usize,
}

pub struct ImportPipeline {
    normalizer: Normalizer,
    detector: RecurrenceDetector,
    categorization: CategorizationConfig,
}

impl ImportPipeline {
    pub fn new(config: &Config) -> Self {
        Self {
            normalizer: Normalizer::new(config.import.clone()),
            detector: RecurrenceDetector::with_config(config.detection.clone()),
            categorization: config.categorization.clone(),
        }
    }

    /// Build ledger records from a statement without touching storage
    pub fn process(
        &self,
        table: &RawTable,
        account_type: AccountType,
        rules: &RuleSet,
    ) -> Result<(Vec<TransactionRecord>, ImportReport)> {
        let mut rows = self.normalizer.normalize(table)?;

        let categorizer = Categorizer::with_config(rules, &self.categorization);
        let categorized = categorizer.categorize(&mut rows, CategorizeMode::FillEmptyOnly);
        let detected = self.detector.detect(&mut rows);

        let records: Vec<TransactionRecord> = rows
            .into_iter()
            .map(|row| row.into_record(account_type))
            .collect();

        let uncategorized = records
            .iter()
            .filter(|r| self.categorization.is_uncategorized(r.category.as_deref()))
            .count();
        let report = ImportReport {
            parsed: records.len(),
            categorized: categorized.matched,
            uncategorized,
            recurring: detected.recurring_rows,
            ..Default::default()
        };
        debug!(
            "Processed {} rows for {}: {} categorized, {} recurring",
            report.parsed, account_type, report.categorized, report.recurring
        );
        Ok((records, report))
    }

    /// Process a statement with the current rules and store the new records
    pub fn run<S, L>(
        &self,
        table: &RawTable,
        account_type: AccountType,
        rules: &S,
        ledger: &L,
    ) -> Result<ImportReport>
    where
        S: RuleSource + ?Sized,
        L: LedgerRepository + ?Sized,
    {
        let rules = rules.get_rules()?;
        let (records, mut report) = self.process(table, account_type, &rules)?;

        report.inserted = ledger.add_many(&records)?;
        report.duplicates = records.len() - report.inserted;

        info!(
            "Imported {} rows into {}: {} new, {} already known",
            report.parsed, account_type, report.inserted, report.duplicates
        );
        Ok(report)
    }

    /// Read a semicolon-delimited statement and import it
    pub fn import_reader<R, S, L>(
        &self,
        reader: R,
        account_type: AccountType,
        rules: &S,
        ledger: &L,
    ) -> Result<ImportReport>
    where
        R: Read,
        S: RuleSource + ?Sized,
        L: LedgerRepository + ?Sized,
    {
        let table = read_statement(reader)?;
        self.run(&table, account_type, rules, ledger)
    }
}

/// Category changes a forced rule sweep over the whole ledger would make
pub fn plan_recategorization<S, L>(
    rules: &S,
    ledger: &L,
    categorization: &CategorizationConfig,
) -> Result<Vec<CategoryChange>>
where
    S: RuleSource + ?Sized,
    L: LedgerRepository + ?Sized,
{
    let rules = rules.get_rules()?;
    let mut records = ledger.get_all()?;
    Ok(Categorizer::with_config(&rules, categorization).sweep(&mut records))
}

/// Write category changes back; the sub-category of a changed row is cleared
pub fn apply_category_changes<L>(ledger: &L, changes: &[CategoryChange]) -> Result<usize>
where
    L: LedgerRepository + ?Sized,
{
    ledger.update_categories(changes)
}

/// Re-apply the current rules to every ledger record
pub fn recategorize_ledger<S, L>(
    rules: &S,
    ledger: &L,
    categorization: &CategorizationConfig,
) -> Result<Vec<CategoryChange>>
where
    S: RuleSource + ?Sized,
    L: LedgerRepository + ?Sized,
{
    let changes = plan_recategorization(rules, ledger, categorization)?;
    apply_category_changes(ledger, &changes)?;
    info!("Recategorized {} ledger rows", changes.len());
    Ok(changes)
}

/// Budget kind changes a detection pass over the whole ledger would make
pub fn plan_redetection<L>(ledger: &L, detector: &RecurrenceDetector) -> Result<Vec<BudgetKindChange>>
where
    L: LedgerRepository + ?Sized,
{
    let mut records = ledger.get_all()?;
    Ok(detector.detect_changes(&mut records))
}

pub fn apply_budget_kind_changes<L>(ledger: &L, changes: &[BudgetKindChange]) -> Result<usize>
where
    L: LedgerRepository + ?Sized,
{
    ledger.update_budget_kinds(changes)
}

/// Re-run recurrence detection across the whole ledger
pub fn redetect_ledger<L>(ledger: &L, detector: &RecurrenceDetector) -> Result<Vec<BudgetKindChange>>
where
    L: LedgerRepository + ?Sized,
{
    let changes = plan_redetection(ledger, detector)?;
    apply_budget_kind_changes(ledger, &changes)?;
    info!("Updated budget kind of {} ledger rows", changes.len());
    Ok(changes)
}
