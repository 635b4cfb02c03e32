//! Category, sub-category and keyword rule commands

use anyhow::{Context, Result};
use tally_core::{db::Database, ledger::RuleSource};

pub fn cmd_categories_list(db: &Database) -> Result<()> {
    let categories = db.list_categories()?;

    if categories.is_empty() {
        println!("No categories yet. Seed the defaults with: tally init");
        return Ok(());
    }

    println!();
    println!("🗂️  Categories");
    println!("   ─────────────────────────────");
    for category in categories {
        println!(
            "   {:<24} {:>3} keyword{}",
            category.name,
            category.keyword_count,
            if category.keyword_count == 1 { "" } else { "s" }
        );
    }

    Ok(())
}

pub fn cmd_categories_add(db: &Database, name: &str) -> Result<()> {
    db.add_category(name)
        .with_context(|| format!("Failed to add category '{}'", name.trim()))?;
    println!("✅ Added category: {}", name.trim());
    println!(
        "   Attach keywords with: tally rules add \"{}\" <KEYWORD>",
        name.trim()
    );
    Ok(())
}

pub fn cmd_categories_add_sub(db: &Database, name: &str, parent: &str) -> Result<()> {
    db.add_sub_category(name, parent)
        .with_context(|| format!("Failed to add sub-category '{}'", name.trim()))?;
    println!("✅ Added sub-category: {} / {}", parent.trim(), name.trim());
    Ok(())
}

pub fn cmd_categories_tree(db: &Database) -> Result<()> {
    let tree = db.sub_category_tree()?;

    if tree.is_empty() {
        println!("No categories yet. Seed the defaults with: tally init");
        return Ok(());
    }

    println!();
    for node in tree {
        println!("📁 {}", node.name);
        let last = node.sub_categories.len().saturating_sub(1);
        for (i, sub) in node.sub_categories.iter().enumerate() {
            let branch = if i == last { "└──" } else { "├──" };
            println!("   {} {}", branch, sub);
        }
    }

    Ok(())
}

pub fn cmd_rules_list(db: &Database) -> Result<()> {
    let rules = db.get_rules()?;

    if rules.keyword_count() == 0 {
        println!("No rules defined. Add one with:");
        println!("  tally rules add <CATEGORY> <KEYWORD>");
        return Ok(());
    }

    println!();
    println!("📋 Keyword Rules (later categories win on overlap)");
    println!("   ─────────────────────────────────────────────────────────────");
    for (i, rule) in rules.iter().enumerate() {
        if rule.keywords.is_empty() {
            continue;
        }
        println!("   {:>2}. {:<18} {}", i + 1, rule.category, rule.keywords.join(", "));
    }
    println!();
    println!("   Total: {} keywords", rules.keyword_count());

    Ok(())
}

pub fn cmd_rules_add(db: &Database, category: &str, keyword: &str) -> Result<()> {
    db.add_rule(category, keyword)
        .with_context(|| format!("Failed to add rule '{}' → {}", keyword.trim(), category.trim()))?;
    println!("✅ Added rule: {} → {}", keyword.trim(), category.trim());
    println!("   Apply it to existing transactions with: tally recategorize");
    Ok(())
}
