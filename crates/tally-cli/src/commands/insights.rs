//! Ledger sweeps, insights and the period summary

use anyhow::{Context, Result};
use tally_core::{
    config::Config,
    db::Database,
    detect::RecurrenceDetector,
    insights::{
        FeeReport, InsightKind, InsightsAnalyzer, LedgerSummary, OutlierPurchase, Subscription,
        SummaryFilter,
    },
    ledger::LedgerRepository,
    models::BudgetKind,
    pipeline::{
        apply_budget_kind_changes, apply_category_changes, plan_recategorization,
        plan_redetection,
    },
};

use super::{parse_account, parse_date_arg, short_fingerprint, truncate};

pub fn cmd_recategorize(db: &Database, config: &Config, dry_run: bool) -> Result<()> {
    println!("🏷️  Re-applying keyword rules to the ledger...");

    let changes = plan_recategorization(db, db, &config.categorization)
        .context("Failed to compute category changes")?;

    if changes.is_empty() {
        println!("✅ Every transaction already matches the current rules.");
        return Ok(());
    }

    for change in changes.iter().take(20) {
        println!("   {} → {}", short_fingerprint(&change.fingerprint), change.category);
    }
    if changes.len() > 20 {
        println!("   ... and {} more", changes.len() - 20);
    }
    println!();

    if dry_run {
        println!("🔎 Dry run: {} transactions would change.", changes.len());
        return Ok(());
    }

    let applied = apply_category_changes(db, &changes).context("Failed to apply category changes")?;
    println!("✅ Updated {} transactions (sub-categories cleared).", applied);
    Ok(())
}

pub fn cmd_redetect(db: &Database, config: &Config, dry_run: bool) -> Result<()> {
    println!("🔁 Detecting monthly series across the ledger...");

    let detector = RecurrenceDetector::with_config(config.detection.clone());
    let changes = plan_redetection(db, &detector).context("Failed to compute budget kind changes")?;

    if changes.is_empty() {
        println!("✅ Budget kinds are up to date.");
        return Ok(());
    }

    let recurring = changes
        .iter()
        .filter(|c| c.budget_kind == BudgetKind::Recurring)
        .count();
    println!("   Now recurring: {}", recurring);
    println!("   Now punctual: {}", changes.len() - recurring);
    println!();

    if dry_run {
        println!("🔎 Dry run: {} transactions would change.", changes.len());
        return Ok(());
    }

    let applied =
        apply_budget_kind_changes(db, &changes).context("Failed to apply budget kind changes")?;
    println!("✅ Updated {} transactions.", applied);
    Ok(())
}

pub fn cmd_insights(db: &Database, config: &Config, kind: Option<&str>, json: bool) -> Result<()> {
    let kind: Option<InsightKind> = kind
        .map(|k| k.parse::<InsightKind>().map_err(|e: String| anyhow::anyhow!(e)))
        .transpose()?;

    let records = db.get_all().context("Failed to load ledger")?;
    let analyzer = InsightsAnalyzer::with_config(config.insights.clone());

    match kind {
        None => {
            let report = analyzer.analyze_all(&records);
            if json {
                println!("{}", report.to_json()?);
            } else {
                print_subscriptions(&report.subscriptions);
                print_outliers(&report.outliers);
                print_fees(&report.fees);
            }
        }
        Some(InsightKind::Subscriptions) => {
            let subscriptions = analyzer.subscriptions(&records);
            if json {
                println!("{}", serde_json::to_string_pretty(&subscriptions)?);
            } else {
                print_subscriptions(&subscriptions);
            }
        }
        Some(InsightKind::Outliers) => {
            let outliers = analyzer.outliers(&records);
            if json {
                println!("{}", serde_json::to_string_pretty(&outliers)?);
            } else {
                print_outliers(&outliers);
            }
        }
        Some(InsightKind::Fees) => {
            let fees = analyzer.fees(&records);
            if json {
                println!("{}", serde_json::to_string_pretty(&fees)?);
            } else {
                print_fees(&fees);
            }
        }
    }

    Ok(())
}

fn print_subscriptions(subscriptions: &[Subscription]) {
    println!();
    println!("🔁 Subscriptions ({})", subscriptions.len());
    println!("   ─────────────────────────────────────────────────────────────");
    if subscriptions.is_empty() {
        println!("   No recurring debits. Try 'tally redetect' after importing more months.");
        return;
    }
    for sub in subscriptions {
        let last = sub
            .last_payment
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "   {:<30} {:>9.2}/mo │ {} payments │ last {}",
            truncate(&sub.label, 30),
            sub.mean_amount.abs(),
            sub.payments,
            last
        );
    }
}

fn print_outliers(outliers: &[OutlierPurchase]) {
    println!();
    println!("📈 Outlier purchases ({})", outliers.len());
    println!("   ─────────────────────────────────────────────────────────────");
    if outliers.is_empty() {
        println!("   Nothing stands out.");
        return;
    }
    for outlier in outliers {
        let date = outlier
            .date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "----------".to_string());
        println!(
            "   {} │ {:>9.2} │ {:<16} (avg {:.2}) │ {}",
            date,
            outlier.amount,
            truncate(&outlier.category, 16),
            outlier.category_mean,
            truncate(&outlier.label, 32)
        );
    }
}

fn print_fees(fees: &FeeReport) {
    println!();
    println!("🏦 Bank fees ({})", fees.rows.len());
    println!("   ─────────────────────────────────────────────────────────────");
    if fees.rows.is_empty() {
        println!("   No bank fees found.");
        return;
    }
    for fee in &fees.rows {
        let date = fee
            .date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "----------".to_string());
        println!("   {} │ {:>9.2} │ {}", date, fee.amount.abs(), truncate(&fee.label, 40));
    }
    println!("   Total: {:.2}", fees.total);
}

pub fn cmd_summary(
    db: &Database,
    config: &Config,
    account: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<()> {
    let filter = SummaryFilter {
        account: account.map(parse_account).transpose()?,
        from: from.map(parse_date_arg).transpose()?,
        to: to.map(parse_date_arg).transpose()?,
    };
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            anyhow::bail!("--from {} is after --to {}", from, to);
        }
    }

    let records = db.get_all().context("Failed to load ledger")?;
    let summary = InsightsAnalyzer::with_config(config.insights.clone()).summary(
        &records,
        &filter,
        &config.categorization,
    );
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &LedgerSummary) {
    println!();
    println!("📊 Summary");
    println!("   ─────────────────────────────");
    println!("   Transactions: {}", summary.transactions);
    println!("   Income:   {:>12.2}", summary.income);
    println!("   Expenses: {:>12.2}", summary.expenses);
    println!("   Net:      {:>12.2}", summary.net);

    if !summary.by_category.is_empty() {
        println!();
        println!("   Spend by category");
        for spend in &summary.by_category {
            println!(
                "   {:<20} {:>10.2} ({} rows)",
                truncate(&spend.category, 20),
                spend.total,
                spend.count
            );
        }
    }

    println!();
    if summary.uncategorized > 0 {
        println!(
            "⚠️  {} uncategorized ({:.1}%). Add rules, then run 'tally recategorize'.",
            summary.uncategorized, summary.uncategorized_percent
        );
    } else if summary.transactions > 0 {
        println!("✅ Every transaction has a category.");
    }
}
