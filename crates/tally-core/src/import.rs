//! Statement import: reading semicolon-delimited bank exports and normalizing
//! their columns onto the canonical transaction shape
//!
//! Exports differ in column spelling (case, spacing, accents, underscores) and
//! are noisy in their cell contents. Unparsable amounts become zero and
//! unparsable dates become `None`; neither rejects a row. Only a file with no
//! header, no data rows, or no recognizable column is refused.

use std::collections::HashMap;
use std::io::Read;

use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::fingerprint::{date_key, fingerprint};
use crate::models::{AccountType, BudgetKind, LedgerRow, TransactionRecord};

/// How the debit column is signed in the export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountConvention {
    /// Debits already carry a minus sign: amount = credit + debit
    #[default]
    SignedDebit,
    /// Debits are positive magnitudes: amount = credit - debit
    PositiveDebit,
}

impl AmountConvention {
    pub fn signed_amount(&self, debit: f64, credit: f64) -> f64 {
        match self {
            Self::SignedDebit => credit + debit,
            Self::PositiveDebit => credit - debit,
        }
    }
}

/// Import settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// chrono format for every date column (day/month/year)
    pub date_format: String,
    pub amount_convention: AmountConvention,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            date_format: "%d/%m/%Y".to_string(),
            amount_convention: AmountConvention::SignedDebit,
        }
    }
}

/// A statement as read from disk, before any column interpretation
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Canonical statement columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    OperationDate,
    AccountingDate,
    ValueDate,
    RawLabel,
    SimplifiedLabel,
    Reference,
    ExtraInfo,
    OperationType,
    Debit,
    Credit,
    Category,
    SubCategory,
    Pointed,
}

impl Column {
    /// Recognize a header after folding its spelling
    pub fn from_header(header: &str) -> Option<Self> {
        let folded = fold_column_name(header);
        let column = match folded.as_str() {
            "date operation" | "date d operation" | "date op" | "operation date" => {
                Self::OperationDate
            }
            "date de comptabilisation" | "date comptable" | "date compte" | "accounting date" => {
                Self::AccountingDate
            }
            "date de valeur" | "date valeur" | "value date" => Self::ValueDate,
            "libelle operation" | "libelle d operation" | "libelle op" | "libelle" | "label" => {
                Self::RawLabel
            }
            "libelle simplifie" | "libelle simple" | "simplified label" => Self::SimplifiedLabel,
            "reference" => Self::Reference,
            "informations complementaires" | "info complementaires" | "extra info" => {
                Self::ExtraInfo
            }
            "type operation" | "type d operation" | "type op" | "operation type" => {
                Self::OperationType
            }
            "debit" => Self::Debit,
            "credit" => Self::Credit,
            "categorie" | "category" => Self::Category,
            "sous categorie" | "sub category" => Self::SubCategory,
            "pointage operation" | "pointage op" | "pointage" => Self::Pointed,
            _ => return None,
        };
        Some(column)
    }
}

/// Case-fold a column name, strip Latin accents, and collapse separators
/// (whitespace, underscores, hyphens, apostrophes) into single spaces.
pub fn fold_column_name(name: &str) -> String {
    let mapped: String = name
        .trim_start_matches('\u{feff}')
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'à' | 'â' | 'ä' | 'á' | 'ã' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' | 'í' => 'i',
            'ô' | 'ö' | 'ó' | 'õ' => 'o',
            'ù' | 'û' | 'ü' | 'ú' => 'u',
            'ç' => 'c',
            '_' | '-' | '\'' | '’' => ' ',
            other => other,
        })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode statement bytes. UTF-8 is used when the bytes are valid UTF-8,
/// otherwise they are read as latin-1 (every byte maps to the same code point).
pub fn decode_statement(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.trim_start_matches('\u{feff}').to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Read a semicolon-delimited statement into a raw table
pub fn read_statement<R: Read>(mut reader: R) -> Result<RawTable> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let text = decode_statement(&bytes);

    let mut rdr = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(Error::EmptyInput("no header row".into()));
    }

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }

    if rows.is_empty() {
        return Err(Error::EmptyInput("no transaction rows".into()));
    }

    debug!("Read statement with {} columns, {} rows", headers.len(), rows.len());
    Ok(RawTable { headers, rows })
}

/// A statement row with canonical fields and typed values, not yet fingerprinted
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    /// Operation date cell as exported, kept for the fingerprint
    pub raw_operation_date: String,
    pub operation_date: Option<NaiveDate>,
    pub value_date: Option<NaiveDate>,
    pub account_date: Option<NaiveDate>,
    pub raw_label: String,
    pub simplified_label: String,
    pub reference: Option<String>,
    pub extra_info: Option<String>,
    pub operation_type: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub debit: f64,
    pub credit: f64,
    pub amount: f64,
    pub pointed: bool,
    pub budget_kind: BudgetKind,
}

impl NormalizedRow {
    /// Fingerprint the row and turn it into a ledger record
    pub fn into_record(self, account_type: AccountType) -> TransactionRecord {
        let date = date_key(self.operation_date, &self.raw_operation_date);
        let fingerprint = fingerprint(&date, &self.raw_label, self.amount, account_type);

        TransactionRecord {
            fingerprint,
            account_type,
            amount: self.amount,
            operation_date: self.operation_date,
            value_date: self.value_date,
            account_date: self.account_date,
            raw_label: self.raw_label,
            simplified_label: self.simplified_label,
            reference: self.reference,
            extra_info: self.extra_info,
            operation_type: self.operation_type,
            category: self.category,
            sub_category: self.sub_category,
            debit: self.debit,
            credit: self.credit,
            pointed: self.pointed,
            budget_kind: self.budget_kind,
        }
    }
}

impl LedgerRow for NormalizedRow {
    fn raw_label(&self) -> &str {
        &self.raw_label
    }

    fn simplified_label(&self) -> &str {
        &self.simplified_label
    }

    fn account_type(&self) -> Option<AccountType> {
        None
    }

    fn amount(&self) -> f64 {
        self.amount
    }

    fn operation_date(&self) -> Option<NaiveDate> {
        self.operation_date
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    fn set_category(&mut self, category: &str) {
        self.category = Some(category.to_string());
    }

    fn budget_kind(&self) -> BudgetKind {
        self.budget_kind
    }

    fn set_budget_kind(&mut self, kind: BudgetKind) {
        self.budget_kind = kind;
    }
}

/// Maps raw statement columns onto canonical rows
pub struct Normalizer {
    config: ImportConfig,
}

impl Normalizer {
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    pub fn normalize(&self, table: &RawTable) -> Result<Vec<NormalizedRow>> {
        if table.is_empty() {
            return Err(Error::EmptyInput("no transaction rows".into()));
        }

        let mut columns: HashMap<Column, usize> = HashMap::new();
        for (i, header) in table.headers.iter().enumerate() {
            match Column::from_header(header) {
                Some(column) => {
                    columns.entry(column).or_insert(i);
                }
                None => debug!("Ignoring unknown column '{}'", header),
            }
        }

        if columns.is_empty() {
            return Err(Error::EmptyInput(
                "no recognized columns (is the file semicolon-delimited?)".into(),
            ));
        }
        if !columns.contains_key(&Column::RawLabel) {
            warn!("Statement has no operation label column; labels will be empty");
        }

        let rows: Vec<NormalizedRow> = table
            .rows
            .iter()
            .map(|row| self.normalize_row(&columns, row))
            .collect();

        debug!("Normalized {} rows", rows.len());
        Ok(rows)
    }

    fn normalize_row(&self, columns: &HashMap<Column, usize>, row: &[String]) -> NormalizedRow {
        let cell = |column: Column| cell_value(columns, row, column);
        let text = |column: Column| {
            let value = cell_value(columns, row, column).trim();
            (!value.is_empty()).then(|| value.to_string())
        };
        let date = |column: Column| parse_date(cell(column), &self.config.date_format);

        let debit = parse_amount(cell(Column::Debit));
        let credit = parse_amount(cell(Column::Credit));
        let amount = self.config.amount_convention.signed_amount(debit, credit);

        NormalizedRow {
            raw_operation_date: cell(Column::OperationDate).trim().to_string(),
            operation_date: date(Column::OperationDate),
            value_date: date(Column::ValueDate),
            account_date: date(Column::AccountingDate),
            raw_label: cell(Column::RawLabel).trim().to_string(),
            simplified_label: cell(Column::SimplifiedLabel).trim().to_string(),
            reference: text(Column::Reference),
            extra_info: text(Column::ExtraInfo),
            operation_type: text(Column::OperationType),
            category: text(Column::Category),
            sub_category: text(Column::SubCategory),
            debit,
            credit,
            amount,
            pointed: parse_flag(cell(Column::Pointed)),
            budget_kind: BudgetKind::Punctual,
        }
    }
}

/// The cell for a canonical column, or "" when the column or cell is missing
fn cell_value<'a>(columns: &HashMap<Column, usize>, row: &'a [String], column: Column) -> &'a str {
    columns
        .get(&column)
        .and_then(|&i| row.get(i))
        .map(|s| s.as_str())
        .unwrap_or("")
}

/// Parse an amount cell. Accepts a comma decimal separator, a leading `+`,
/// and space or dot thousands separators. Anything unparsable is zero.
pub fn parse_amount(s: &str) -> f64 {
    let mut cleaned: String = s
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '\u{202f}')
        .collect();

    if let Some(stripped) = cleaned.strip_prefix('+') {
        cleaned = stripped.to_string();
    }
    if cleaned.contains(',') {
        // "1.234,56": dots are thousands separators
        cleaned = cleaned.replace('.', "").replace(',', ".");
    }

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Parse a date cell with an explicit format; anything unparsable is `None`
pub fn parse_date(s: &str, format: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, format).ok()
}

fn parse_flag(s: &str) -> bool {
    match s.trim().to_lowercase().as_str() {
        "" | "0" | "false" | "non" | "no" | "n" => false,
        "1" | "true" | "oui" | "yes" | "o" | "y" | "x" => true,
        other => parse_amount(other) != 0.0,
    }
}
