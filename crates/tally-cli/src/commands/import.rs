//! Statement import command

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use tally_core::{
    config::Config, db::Database, import::read_statement, ledger::RuleSource,
    pipeline::ImportPipeline,
};

use super::{format_amount, parse_account, truncate};

pub fn cmd_import(
    db: &Database,
    config: &Config,
    file: &Path,
    account: &str,
    dry_run: bool,
) -> Result<()> {
    let account_type = parse_account(account)?;
    let statement =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;

    println!(
        "📥 Importing {} into the {} account...",
        file.display(),
        account_type
    );

    let pipeline = ImportPipeline::new(config);

    if dry_run {
        let table = read_statement(statement)
            .with_context(|| format!("Failed to read statement: {}", file.display()))?;
        let rules = db.get_rules().context("Failed to load rules")?;
        let (records, report) = pipeline.process(&table, account_type, &rules)?;

        println!("   Parsed: {}", report.parsed);
        println!("   Categorized: {}", report.categorized);
        println!("   Uncategorized: {}", report.uncategorized);
        println!("   Recurring: {}", report.recurring);
        println!();
        for record in records.iter().take(20) {
            let date = record
                .operation_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "----------".to_string());
            println!(
                "   {} │ {:>10} │ {:<16} │ {}",
                date,
                format_amount(record.amount),
                truncate(record.category.as_deref().unwrap_or("-"), 16),
                truncate(&record.raw_label, 40)
            );
        }
        if records.len() > 20 {
            println!("   ... and {} more", records.len() - 20);
        }
        println!();
        println!("🔎 Dry run: nothing was written to the ledger.");
        return Ok(());
    }

    let report = pipeline
        .import_reader(statement, account_type, db, db)
        .with_context(|| format!("Failed to import {}", file.display()))?;

    println!("✅ Import complete!");
    println!("   Parsed: {}", report.parsed);
    println!("   Imported: {}", report.inserted);
    println!("   Skipped (already in ledger): {}", report.duplicates);
    println!("   Categorized by rules: {}", report.categorized);
    println!("   Recurring: {}", report.recurring);

    if report.inserted > 0 && report.uncategorized > 0 {
        println!();
        println!(
            "💡 {} rows have no category. Run 'tally transactions list --uncategorized' to review them.",
            report.uncategorized
        );
    }

    Ok(())
}
