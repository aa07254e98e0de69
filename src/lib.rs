// Civic Budget - Participatory budget simulation core
// Exposes all modules for use in the CLI, API server, and tests

pub mod catalog;      // Data model: categories, subcategories, impacts, config
pub mod calculations; // Range policy, totals, percent helpers
pub mod session;      // One user's in-progress adjustment session
pub mod impact;       // Threshold chain + impact message resolution
pub mod plan;         // Immutable finalized submissions
pub mod aggregate;    // Population statistics across all plans
pub mod format;       // Number formatting for reports
pub mod db;           // SQLite catalog store + plan archive

// Re-export commonly used types
pub use catalog::{
    default_catalog, find_subcategory, subcategory_baselines,
    BudgetConfig, Category, Impact, Subcategory, ThresholdType,
};
pub use calculations::{
    calc_percent, category_default_total, category_total, compute_range,
    deficit, global_default_expenses, global_expenses, percent_of_total,
};
pub use session::{AdjustmentSession, SessionError, SNAP_TOLERANCE};
pub use impact::{active_impact, active_threshold};
pub use plan::{Plan, Submitter};
pub use aggregate::{
    AggregatedStats, Aggregator, CategoryAggregation, SubcategoryAggregation,
};
pub use format::{format_mln, format_number, parse_formatted_number};
pub use db::{
    count_plans, create_plan, delete_category, delete_impact, delete_plan,
    fetch_categories, get_active_config, get_plan, insert_catalog,
    insert_category, insert_config, insert_subcategory, list_plans,
    setup_database, upsert_impact,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
