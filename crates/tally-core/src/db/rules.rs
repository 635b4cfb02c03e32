//! Categories, sub-categories and keyword rules

use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use tracing::info;

use super::{unique_violation, Database, DbConn};
use crate::error::{Error, Result};
use crate::ledger::RuleSource;
use crate::models::{CategorizationRule, RuleSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub keyword_count: usize,
}

/// A category with its sub-categories
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryNode {
    pub name: String,
    pub sub_categories: Vec<String>,
}

fn clean_name(value: &str, what: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::InvalidData(format!("{} must not be empty", what)));
    }
    Ok(value.to_string())
}

fn category_id(conn: &DbConn, name: &str) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM categories WHERE name = ?",
            params![name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

impl Database {
    /// Create a category; names are unique
    pub fn add_category(&self, name: &str) -> Result<i64> {
        let name = clean_name(name, "category name")?;
        let conn = self.conn()?;
        conn.execute("INSERT INTO categories (name) VALUES (?)", params![name])
            .map_err(|e| unique_violation(e, format!("category '{}' already exists", name)))?;
        Ok(conn.last_insert_rowid())
    }

    /// Attach a keyword to an existing category; keywords are unique across
    /// all categories
    pub fn add_rule(&self, category: &str, keyword: &str) -> Result<i64> {
        let keyword = clean_name(keyword, "keyword")?;
        let conn = self.conn()?;
        let id = category_id(&conn, category.trim())?
            .ok_or_else(|| Error::NotFound(format!("category '{}' does not exist", category)))?;

        conn.execute(
            "INSERT INTO categorization_rules (category_id, keyword) VALUES (?, ?)",
            params![id, keyword],
        )
        .map_err(|e| unique_violation(e, format!("keyword '{}' already has a rule", keyword)))?;
        Ok(conn.last_insert_rowid())
    }

    /// Create a sub-category under an existing parent category
    pub fn add_sub_category(&self, name: &str, parent: &str) -> Result<i64> {
        let name = clean_name(name, "sub-category name")?;
        let conn = self.conn()?;
        let parent_id = category_id(&conn, parent.trim())?.ok_or_else(|| {
            Error::NotFound(format!("parent category '{}' does not exist", parent))
        })?;

        conn.execute(
            "INSERT INTO sub_categories (category_id, name) VALUES (?, ?)",
            params![parent_id, name],
        )
        .map_err(|e| {
            unique_violation(
                e,
                format!("sub-category '{}' already exists under '{}'", name, parent),
            )
        })?;
        Ok(conn.last_insert_rowid())
    }

    /// Categories in declaration order
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT c.id, c.name, COUNT(r.id)
            FROM categories c
            LEFT JOIN categorization_rules r ON r.category_id = c.id
            GROUP BY c.id
            ORDER BY c.id
            "#,
        )?;
        let categories = stmt
            .query_map([], |row| {
                let count: i64 = row.get(2)?;
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    keyword_count: count as usize,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    /// Every category with its sub-categories, both in declaration order
    pub fn sub_category_tree(&self) -> Result<Vec<CategoryNode>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT c.name, s.name
            FROM categories c
            LEFT JOIN sub_categories s ON s.category_id = c.id
            ORDER BY c.id, s.id
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut tree: Vec<CategoryNode> = Vec::new();
        for (category, sub) in rows {
            if tree.last().map(|n| n.name.as_str()) != Some(category.as_str()) {
                tree.push(CategoryNode {
                    name: category,
                    sub_categories: Vec::new(),
                });
            }
            if let (Some(sub), Some(node)) = (sub, tree.last_mut()) {
                node.sub_categories.push(sub);
            }
        }
        Ok(tree)
    }

    /// Rule snapshot: categories in declaration order, keywords in insertion order
    pub fn rules_snapshot(&self) -> Result<RuleSet> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT c.name, r.keyword
            FROM categories c
            LEFT JOIN categorization_rules r ON r.category_id = c.id
            ORDER BY c.id, r.id
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut rules: Vec<CategorizationRule> = Vec::new();
        for (category, keyword) in rows {
            if rules.last().map(|r| r.category.as_str()) != Some(category.as_str()) {
                rules.push(CategorizationRule {
                    category,
                    keywords: Vec::new(),
                });
            }
            if let (Some(keyword), Some(rule)) = (keyword, rules.last_mut()) {
                rule.keywords.push(keyword);
            }
        }
        Ok(RuleSet::new(rules))
    }

    /// Write a rule set into an empty rule store. A store that already has
    /// categories is left untouched. Returns the number of keywords written.
    pub fn seed_rules(&self, rules: &RuleSet) -> Result<usize> {
        let mut conn = self.conn()?;
        let existing: i64 = conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        if existing > 0 {
            return Ok(0);
        }

        let tx = conn.transaction()?;
        let mut keywords = 0;
        for rule in rules.iter() {
            let name = clean_name(&rule.category, "category name")?;
            tx.execute(
                "INSERT OR IGNORE INTO categories (name) VALUES (?)",
                params![name],
            )?;
            let id: i64 = tx.query_row(
                "SELECT id FROM categories WHERE name = ?",
                params![name],
                |row| row.get(0),
            )?;
            for keyword in rule.keywords.iter().map(|k| k.trim()).filter(|k| !k.is_empty()) {
                keywords += tx.execute(
                    "INSERT OR IGNORE INTO categorization_rules (category_id, keyword) VALUES (?, ?)",
                    params![id, keyword],
                )?;
            }
        }
        tx.commit()?;

        info!("Seeded {} categories with {} keywords", rules.len(), keywords);
        Ok(keywords)
    }
}

impl RuleSource for Database {
    fn get_rules(&self) -> Result<RuleSet> {
        self.rules_snapshot()
    }
}
