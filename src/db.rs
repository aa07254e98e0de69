// 💾 Budget Store - SQLite-backed catalog store and plan archive
//
// The engine itself never touches I/O; this module is the collaborator
// that owns it. Two roles:
//   - Catalog store: categories / subcategories / impacts / income config
//   - Plan Archive: durable, immutable submitted plans
//
// The changes map of a plan is stored as JSON in a TEXT column, timestamps
// as RFC3339 strings.

use crate::catalog::{BudgetConfig, Category, Impact, Subcategory, ThresholdType};
use crate::plan::Plan;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // Subcategory ownership cascades on category delete
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // ==========================================================================
    // Catalog Tables
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            icon TEXT NOT NULL,
            color TEXT NOT NULL,
            display_order INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subcategories (
            id TEXT PRIMARY KEY,
            category_id TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            default_value INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // At most one impact per (subcategory, threshold) pair
    conn.execute(
        "CREATE TABLE IF NOT EXISTS subcategory_impacts (
            id TEXT PRIMARY KEY,
            subcategory_id TEXT NOT NULL REFERENCES subcategories(id) ON DELETE CASCADE,
            threshold_type TEXT NOT NULL,
            message TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(subcategory_id, threshold_type)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS budget_config (
            id TEXT PRIMARY KEY,
            total_income INTEGER NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Plan Archive
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS budget_plans (
            id TEXT PRIMARY KEY,
            user_name TEXT,
            user_age INTEGER,
            user_occupation TEXT,
            changes TEXT NOT NULL,
            total_income INTEGER NOT NULL,
            total_expenses INTEGER NOT NULL,
            deficit INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subcategories_category ON subcategories(category_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_impacts_subcategory ON subcategory_impacts(subcategory_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_plans_created ON budget_plans(created_at)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// CATALOG STORE
// ============================================================================

/// Insert a category (without its subcategories)
pub fn insert_category(conn: &Connection, category: &Category) -> Result<()> {
    conn.execute(
        "INSERT INTO categories (id, name, icon, color, display_order, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            category.id,
            category.name,
            category.icon,
            category.color,
            category.display_order,
            category.created_at.to_rfc3339(),
        ],
    )
    .context("Failed to insert category")?;

    Ok(())
}

pub fn insert_subcategory(conn: &Connection, subcategory: &Subcategory) -> Result<()> {
    conn.execute(
        "INSERT INTO subcategories (id, category_id, name, default_value, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            subcategory.id,
            subcategory.category_id,
            subcategory.name,
            subcategory.default_value,
            subcategory.created_at.to_rfc3339(),
        ],
    )
    .context("Failed to insert subcategory")?;

    Ok(())
}

/// Insert or update the impact for this (subcategory, threshold) pair.
/// Authoring the same threshold twice replaces the message, preserving
/// the at-most-one invariant.
pub fn upsert_impact(conn: &Connection, impact: &Impact) -> Result<()> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT id FROM subcategory_impacts
             WHERE subcategory_id = ?1 AND threshold_type = ?2",
            params![impact.subcategory_id, impact.threshold_type.as_str()],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(id) => {
            conn.execute(
                "UPDATE subcategory_impacts SET message = ?1 WHERE id = ?2",
                params![impact.message, id],
            )
            .context("Failed to update impact")?;
        }
        None => {
            conn.execute(
                "INSERT INTO subcategory_impacts (id, subcategory_id, threshold_type, message, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    impact.id,
                    impact.subcategory_id,
                    impact.threshold_type.as_str(),
                    impact.message,
                    impact.created_at.to_rfc3339(),
                ],
            )
            .context("Failed to insert impact")?;
        }
    }

    Ok(())
}

pub fn delete_impact(conn: &Connection, impact_id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM subcategory_impacts WHERE id = ?1",
        params![impact_id],
    )?;

    Ok(())
}

/// Load the full catalog tree: categories ordered by display_order, each
/// with its subcategories and their impacts embedded.
pub fn fetch_categories(conn: &Connection) -> Result<Vec<Category>> {
    // Impacts first, grouped by subcategory
    let mut stmt = conn.prepare(
        "SELECT id, subcategory_id, threshold_type, message, created_at
         FROM subcategory_impacts",
    )?;

    let mut impacts_by_subcategory: HashMap<String, Vec<Impact>> = HashMap::new();
    let impact_rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    for row in impact_rows {
        let (id, subcategory_id, threshold_str, message, created_at_str) = row?;

        let Some(threshold_type) = ThresholdType::parse(&threshold_str) else {
            anyhow::bail!("Unknown threshold type in store: {}", threshold_str);
        };

        impacts_by_subcategory
            .entry(subcategory_id.clone())
            .or_default()
            .push(Impact {
                id,
                subcategory_id,
                threshold_type,
                message,
                created_at: parse_timestamp(&created_at_str)?,
            });
    }

    // Subcategories grouped by category, in creation order
    let mut stmt = conn.prepare(
        "SELECT id, category_id, name, default_value, created_at
         FROM subcategories
         ORDER BY created_at, id",
    )?;

    let mut subs_by_category: HashMap<String, Vec<Subcategory>> = HashMap::new();
    let sub_rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, i64>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    for row in sub_rows {
        let (id, category_id, name, default_value, created_at_str) = row?;

        let impacts = impacts_by_subcategory.remove(&id).unwrap_or_default();
        subs_by_category
            .entry(category_id.clone())
            .or_default()
            .push(Subcategory {
                id,
                category_id,
                name,
                default_value,
                created_at: parse_timestamp(&created_at_str)?,
                impacts,
            });
    }

    // Categories in display order
    let mut stmt = conn.prepare(
        "SELECT id, name, icon, color, display_order, created_at
         FROM categories
         ORDER BY display_order",
    )?;

    let category_rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, i64>(4)?,
            row.get::<_, String>(5)?,
        ))
    })?;

    let mut categories = Vec::new();
    for row in category_rows {
        let (id, name, icon, color, display_order, created_at_str) = row?;

        let subcategories = subs_by_category.remove(&id).unwrap_or_default();
        categories.push(Category {
            id,
            name,
            icon,
            color,
            display_order,
            created_at: parse_timestamp(&created_at_str)?,
            subcategories,
        });
    }

    Ok(categories)
}

pub fn delete_category(conn: &Connection, category_id: &str) -> Result<()> {
    // Subcategories and impacts cascade
    conn.execute("DELETE FROM categories WHERE id = ?1", params![category_id])?;

    Ok(())
}

// ============================================================================
// BUDGET CONFIG
// ============================================================================

/// Insert a config; activating it deactivates every other config so that
/// at most one is active.
pub fn insert_config(conn: &Connection, config: &BudgetConfig) -> Result<()> {
    if config.is_active {
        conn.execute("UPDATE budget_config SET is_active = 0", [])?;
    }

    conn.execute(
        "INSERT INTO budget_config (id, total_income, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            config.id,
            config.total_income,
            config.is_active as i64,
            config.created_at.to_rfc3339(),
        ],
    )
    .context("Failed to insert budget config")?;

    Ok(())
}

pub fn get_active_config(conn: &Connection) -> Result<Option<BudgetConfig>> {
    let config = conn
        .query_row(
            "SELECT id, total_income, is_active, created_at
             FROM budget_config
             WHERE is_active = 1",
            [],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    match config {
        Some((id, total_income, is_active, created_at_str)) => Ok(Some(BudgetConfig {
            id,
            total_income,
            is_active: is_active != 0,
            created_at: parse_timestamp(&created_at_str)?,
        })),
        None => Ok(None),
    }
}

// ============================================================================
// PLAN ARCHIVE
// ============================================================================

pub fn create_plan(conn: &Connection, plan: &Plan) -> Result<()> {
    let changes_json =
        serde_json::to_string(&plan.changes).context("Failed to serialize plan changes")?;

    conn.execute(
        "INSERT INTO budget_plans (
            id, user_name, user_age, user_occupation, changes,
            total_income, total_expenses, deficit, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            plan.id,
            plan.user_name,
            plan.user_age,
            plan.user_occupation,
            changes_json,
            plan.total_income,
            plan.total_expenses,
            plan.deficit,
            plan.created_at.to_rfc3339(),
        ],
    )
    .context("Failed to insert plan")?;

    Ok(())
}

/// All plans, newest first
pub fn list_plans(conn: &Connection) -> Result<Vec<Plan>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_name, user_age, user_occupation, changes,
                total_income, total_expenses, deficit, created_at
         FROM budget_plans
         ORDER BY created_at DESC",
    )?;

    let rows = stmt
        .query_map([], map_plan_row)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(finish_plan_row).collect()
}

pub fn get_plan(conn: &Connection, plan_id: &str) -> Result<Option<Plan>> {
    let row = conn
        .query_row(
            "SELECT id, user_name, user_age, user_occupation, changes,
                    total_income, total_expenses, deficit, created_at
             FROM budget_plans
             WHERE id = ?1",
            params![plan_id],
            map_plan_row,
        )
        .optional()?;

    row.map(finish_plan_row).transpose()
}

pub fn delete_plan(conn: &Connection, plan_id: &str) -> Result<()> {
    conn.execute("DELETE FROM budget_plans WHERE id = ?1", params![plan_id])?;

    Ok(())
}

pub fn count_plans(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM budget_plans", [], |row| row.get(0))?;

    Ok(count)
}

// Raw row before JSON/timestamp parsing (those need anyhow, not rusqlite)
type PlanRow = (
    String,
    Option<String>,
    Option<i64>,
    Option<String>,
    String,
    i64,
    i64,
    i64,
    String,
);

fn map_plan_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PlanRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

fn finish_plan_row(row: PlanRow) -> Result<Plan> {
    let (
        id,
        user_name,
        user_age,
        user_occupation,
        changes_json,
        total_income,
        total_expenses,
        deficit,
        created_at_str,
    ) = row;

    let changes: HashMap<String, i64> =
        serde_json::from_str(&changes_json).context("Failed to parse plan changes")?;

    Ok(Plan {
        id,
        user_name,
        user_age,
        user_occupation,
        changes,
        total_income,
        total_expenses,
        deficit,
        created_at: parse_timestamp(&created_at_str)?,
    })
}

// ============================================================================
// SEEDING
// ============================================================================

/// Write a catalog tree (with impacts) into an empty store
pub fn insert_catalog(conn: &Connection, categories: &[Category]) -> Result<()> {
    for category in categories {
        insert_category(conn, category)?;

        for subcategory in &category.subcategories {
            insert_subcategory(conn, subcategory)?;

            for impact in &subcategory.impacts {
                upsert_impact(conn, impact)?;
            }
        }
    }

    Ok(())
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(text)
        .with_context(|| format!("Invalid timestamp in store: {}", text))?;

    Ok(parsed.with_timezone(&Utc))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_catalog;
    use crate::plan::Submitter;
    use crate::session::AdjustmentSession;

    fn create_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_catalog_round_trip() {
        let conn = create_test_db();
        let catalog = default_catalog();

        insert_catalog(&conn, &catalog).unwrap();
        let loaded = fetch_categories(&conn).unwrap();

        assert_eq!(loaded.len(), catalog.len());
        for (original, fetched) in catalog.iter().zip(loaded.iter()) {
            assert_eq!(original.id, fetched.id);
            assert_eq!(original.name, fetched.name);
            assert_eq!(original.subcategories.len(), fetched.subcategories.len());
        }

        // Impact messages survive the trip
        let schools = &loaded[0].subcategories[0];
        assert_eq!(schools.impacts.len(), 4);
    }

    #[test]
    fn test_fetch_categories_ordering() {
        let conn = create_test_db();

        // Insert out of display order
        let second = Category::new("Second", "🏥", "#4CAF50", 2);
        let first = Category::new("First", "🎓", "#2196F3", 1);
        insert_category(&conn, &second).unwrap();
        insert_category(&conn, &first).unwrap();

        let loaded = fetch_categories(&conn).unwrap();
        assert_eq!(loaded[0].name, "First");
        assert_eq!(loaded[1].name, "Second");
    }

    #[test]
    fn test_upsert_impact_replaces_message() {
        let conn = create_test_db();
        let catalog = default_catalog();
        insert_catalog(&conn, &catalog).unwrap();

        let schools_id = catalog[0].subcategories[0].id.clone();
        let revised = Impact::new(&schools_id, ThresholdType::Increase7, "Revised message");
        upsert_impact(&conn, &revised).unwrap();

        let loaded = fetch_categories(&conn).unwrap();
        let impacts = &loaded[0].subcategories[0].impacts;

        // Still exactly one impact per threshold
        assert_eq!(impacts.len(), 4);
        let strong = impacts
            .iter()
            .find(|i| i.threshold_type == ThresholdType::Increase7)
            .unwrap();
        assert_eq!(strong.message, "Revised message");
    }

    #[test]
    fn test_delete_impact() {
        let conn = create_test_db();
        let catalog = default_catalog();
        insert_catalog(&conn, &catalog).unwrap();

        let impact_id = catalog[0].subcategories[0].impacts[0].id.clone();
        delete_impact(&conn, &impact_id).unwrap();

        let loaded = fetch_categories(&conn).unwrap();
        assert_eq!(loaded[0].subcategories[0].impacts.len(), 3);
    }

    #[test]
    fn test_delete_category_cascades() {
        let conn = create_test_db();
        let catalog = default_catalog();
        insert_catalog(&conn, &catalog).unwrap();

        delete_category(&conn, &catalog[0].id).unwrap();

        let loaded = fetch_categories(&conn).unwrap();
        assert_eq!(loaded.len(), catalog.len() - 1);

        let sub_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM subcategories WHERE category_id = ?1",
                params![catalog[0].id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(sub_count, 0);
    }

    #[test]
    fn test_active_config_is_exclusive() {
        let conn = create_test_db();

        let old_config = BudgetConfig::new(50_000_000_000);
        insert_config(&conn, &old_config).unwrap();

        let new_config = BudgetConfig::new(52_000_000_000);
        insert_config(&conn, &new_config).unwrap();

        let active = get_active_config(&conn).unwrap().unwrap();
        assert_eq!(active.id, new_config.id);
        assert_eq!(active.total_income, 52_000_000_000);
    }

    #[test]
    fn test_get_active_config_empty_store() {
        let conn = create_test_db();
        assert!(get_active_config(&conn).unwrap().is_none());
    }

    #[test]
    fn test_plan_round_trip() {
        let conn = create_test_db();
        let catalog = default_catalog();

        let schools_id = catalog[0].subcategories[0].id.clone();
        let mut session = AdjustmentSession::new();
        session.set_change(&schools_id, 12_600_000_000.0).unwrap();

        let plan = Plan::from_session(
            &session,
            &catalog,
            52_000_000_000,
            Submitter::named("Aziza"),
        );
        create_plan(&conn, &plan).unwrap();

        let loaded = get_plan(&conn, &plan.id).unwrap().unwrap();
        assert_eq!(loaded.user_name.as_deref(), Some("Aziza"));
        assert_eq!(loaded.changes[&schools_id], 12_600_000_000);
        assert_eq!(loaded.total_expenses, plan.total_expenses);
        assert_eq!(loaded.deficit, plan.deficit);

        assert_eq!(count_plans(&conn).unwrap(), 1);
    }

    #[test]
    fn test_get_plan_missing() {
        let conn = create_test_db();
        assert!(get_plan(&conn, "no-such-plan").unwrap().is_none());
    }

    #[test]
    fn test_delete_plan() {
        let conn = create_test_db();
        let catalog = default_catalog();

        let plan = Plan::from_session(
            &AdjustmentSession::new(),
            &catalog,
            52_000_000_000,
            Submitter::default(),
        );
        create_plan(&conn, &plan).unwrap();
        assert_eq!(count_plans(&conn).unwrap(), 1);

        delete_plan(&conn, &plan.id).unwrap();
        assert_eq!(count_plans(&conn).unwrap(), 0);
    }
}
