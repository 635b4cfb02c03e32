//! Domain models for tally

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which household account a statement belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    /// Personal account
    Perso,
    /// Joint account
    Commun,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Perso => "Perso",
            Self::Commun => "Commun",
        }
    }

    pub fn all() -> &'static [AccountType] {
        &[Self::Perso, Self::Commun]
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "perso" | "personal" => Ok(Self::Perso),
            "commun" | "joint" => Ok(Self::Commun),
            _ => Err(format!("Unknown account type: {}", s)),
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a transaction belongs to a detected monthly series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetKind {
    /// One-off transaction
    #[default]
    Punctual,
    /// Member of a monthly-repeating series
    Recurring,
}

impl BudgetKind {
    /// Canonical storage symbol
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Punctual => "punctual",
            Self::Recurring => "recurring",
        }
    }

    /// Text shown to the user
    pub fn display_label(&self) -> &'static str {
        match self {
            Self::Punctual => "Ponctuel",
            Self::Recurring => "Récurrente",
        }
    }
}

impl std::str::FromStr for BudgetKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "punctual" | "ponctuel" => Ok(Self::Punctual),
            "recurring" | "récurrente" | "recurrente" => Ok(Self::Recurring),
            _ => Err(format!("Unknown budget kind: {}", s)),
        }
    }
}

impl std::fmt::Display for BudgetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_label())
    }
}

/// A canonical ledger transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Content hash, the unique key. Computed once at import.
    pub fingerprint: String,
    pub account_type: AccountType,
    /// Positive = credit, negative = debit
    pub amount: f64,
    pub operation_date: Option<NaiveDate>,
    pub value_date: Option<NaiveDate>,
    pub account_date: Option<NaiveDate>,
    pub raw_label: String,
    /// Normalized merchant label, the recurrence grouping key
    pub simplified_label: String,
    pub reference: Option<String>,
    pub extra_info: Option<String>,
    pub operation_type: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    /// Debit column as exported, after numeric coercion
    pub debit: f64,
    /// Credit column as exported, after numeric coercion
    pub credit: f64,
    /// Bank reconciliation ("pointage") flag
    pub pointed: bool,
    pub budget_kind: BudgetKind,
}

/// Row access shared by freshly normalized rows and persisted records.
///
/// The categorizer and the recurrence detector run on both: on import batches
/// before fingerprinting, and on the full ledger during re-sweeps.
pub trait LedgerRow {
    fn raw_label(&self) -> &str;
    fn simplified_label(&self) -> &str;
    /// Account the row is known to belong to, `None` within a single-account batch
    fn account_type(&self) -> Option<AccountType>;
    fn amount(&self) -> f64;
    fn operation_date(&self) -> Option<NaiveDate>;
    fn category(&self) -> Option<&str>;
    fn set_category(&mut self, category: &str);
    fn budget_kind(&self) -> BudgetKind;
    fn set_budget_kind(&mut self, kind: BudgetKind);
}

impl LedgerRow for TransactionRecord {
    fn raw_label(&self) -> &str {
        &self.raw_label
    }

    fn simplified_label(&self) -> &str {
        &self.simplified_label
    }

    fn account_type(&self) -> Option<AccountType> {
        Some(self.account_type)
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

/// A category and the keywords that select it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizationRule {
    pub category: String,
    pub keywords: Vec<String>,
}

/// An immutable, ordered snapshot of categorization rules.
///
/// Category order is significant: when several categories match the same row,
/// the one declared last wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<CategorizationRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<CategorizationRule>) -> Self {
        Self { rules }
    }

    /// Build from (category, keywords) pairs, keeping their order
    pub fn from_pairs<C, K, I>(pairs: I) -> Self
    where
        C: Into<String>,
        K: Into<String>,
        I: IntoIterator<Item = (C, Vec<K>)>,
    {
        Self {
            rules: pairs
                .into_iter()
                .map(|(category, keywords)| CategorizationRule {
                    category: category.into(),
                    keywords: keywords.into_iter().map(Into::into).collect(),
                })
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategorizationRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn keyword_count(&self) -> usize {
        self.rules.iter().map(|r| r.keywords.len()).sum()
    }
}

/// A category assignment that differs from what the ledger holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryChange {
    pub fingerprint: String,
    pub category: String,
}

/// A budget kind that differs from what the ledger holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetKindChange {
    pub fingerprint: String,
    pub budget_kind: BudgetKind,
}
