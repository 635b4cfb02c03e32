//! Tally CLI
//!
//! Usage:
//!   tally init                                   # Initialize database
//!   tally import --file statement.csv --account perso
//!   tally transactions list --uncategorized      # Rows the rules missed
//!   tally rules add Courses LIDL                 # Teach a new keyword
//!   tally recategorize                           # Re-apply rules to the ledger
//!   tally insights --kind outliers               # Unusually large purchases
//!   tally summary --from 2024-01-01 --to 2024-03-31

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins, then --verbose, then info
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, &config),

        Commands::Import {
            file,
            account,
            dry_run,
        } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_import(&db, &config, &file, &account, dry_run)
        }

        Commands::Transactions { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None => commands::cmd_transactions_list(&db, &config, None, false, 50),
                Some(TransactionsAction::List {
                    account,
                    uncategorized,
                    limit,
                }) => commands::cmd_transactions_list(
                    &db,
                    &config,
                    account.as_deref(),
                    uncategorized,
                    limit,
                ),
                Some(TransactionsAction::SetCategory {
                    fingerprint,
                    category,
                    sub,
                }) => commands::cmd_transactions_set_category(&db, &fingerprint, &category, &sub),
                Some(TransactionsAction::SetKind { fingerprint, kind }) => {
                    commands::cmd_transactions_set_kind(&db, &fingerprint, &kind)
                }
            }
        }

        Commands::Categories { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None | Some(CategoriesAction::List) => commands::cmd_categories_list(&db),
                Some(CategoriesAction::Add { name }) => commands::cmd_categories_add(&db, &name),
                Some(CategoriesAction::AddSub { name, parent }) => {
                    commands::cmd_categories_add_sub(&db, &name, &parent)
                }
                Some(CategoriesAction::Tree) => commands::cmd_categories_tree(&db),
            }
        }

        Commands::Rules { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None | Some(RulesAction::List) => commands::cmd_rules_list(&db),
                Some(RulesAction::Add { category, keyword }) => {
                    commands::cmd_rules_add(&db, &category, &keyword)
                }
            }
        }

        Commands::Recategorize { dry_run } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_recategorize(&db, &config, dry_run)
        }

        Commands::Redetect { dry_run } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_redetect(&db, &config, dry_run)
        }

        Commands::Insights { kind, json } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_insights(&db, &config, kind.as_deref(), json)
        }

        Commands::Summary { account, from, to } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_summary(
                &db,
                &config,
                account.as_deref(),
                from.as_deref(),
                to.as_deref(),
            )
        }
    }
}
