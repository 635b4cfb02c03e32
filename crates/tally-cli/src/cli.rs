//! CLI argument definitions using clap
//!
//! The command implementations live in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Household bank statement ledger
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Import bank statements, categorize them and surface spending insights", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "tally.db", global = true)]
    pub db: PathBuf,

    /// Configuration file (defaults to the user override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and seed the default rules
    Init,

    /// Import a semicolon-delimited bank statement
    Import {
        /// Statement file to import
        #[arg(short, long)]
        file: PathBuf,

        /// Account the statement belongs to: perso, commun
        #[arg(short, long, default_value = "perso")]
        account: String,

        /// Parse, categorize and detect without writing to the ledger
        #[arg(long)]
        dry_run: bool,
    },

    /// Browse and edit ledger transactions
    Transactions {
        #[command(subcommand)]
        action: Option<TransactionsAction>,
    },

    /// Manage categories and sub-categories
    Categories {
        #[command(subcommand)]
        action: Option<CategoriesAction>,
    },

    /// Manage keyword rules
    Rules {
        #[command(subcommand)]
        action: Option<RulesAction>,
    },

    /// Re-apply the current rules to the whole ledger
    Recategorize {
        /// Show the changes without applying them
        #[arg(long)]
        dry_run: bool,
    },

    /// Re-run recurring charge detection over the whole ledger
    Redetect {
        /// Show the changes without applying them
        #[arg(long)]
        dry_run: bool,
    },

    /// Show subscriptions, outlier purchases and bank fees
    Insights {
        /// Insight kind: subscriptions, outliers, fees (all if omitted)
        #[arg(short, long)]
        kind: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Income, expenses and spend per category
    Summary {
        /// Restrict to one account: perso, commun
        #[arg(short, long)]
        account: Option<String>,

        /// First operation date included (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Last operation date included (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum TransactionsAction {
    /// List transactions, most recent first
    List {
        /// Restrict to one account: perso, commun
        #[arg(short, long)]
        account: Option<String>,

        /// Only transactions without a category
        #[arg(long)]
        uncategorized: bool,

        /// Maximum number of transactions to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Set the category of a transaction
    SetCategory {
        /// Transaction fingerprint
        fingerprint: String,

        /// Category name
        category: String,

        /// Sub-category name
        #[arg(long, default_value = "")]
        sub: String,
    },

    /// Set the budget kind of a transaction: punctual, recurring
    SetKind {
        /// Transaction fingerprint
        fingerprint: String,

        /// Budget kind
        kind: String,
    },
}

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// List categories with their keyword counts
    List,

    /// Add a category
    Add {
        /// Category name
        name: String,
    },

    /// Add a sub-category under an existing category
    AddSub {
        /// Sub-category name
        name: String,

        /// Parent category
        #[arg(short, long)]
        parent: String,
    },

    /// Show categories with their sub-categories
    Tree,
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// List keyword rules in matching order
    List,

    /// Attach a keyword to a category
    Add {
        /// Category name
        category: String,

        /// Keyword matched against raw labels (case-insensitive)
        keyword: String,
    },
}
