// 📐 Budget Calculations - Range policy and totals
//
// Pure arithmetic over the catalog and one adjustment session. Inputs are
// small (tens of categories, hundreds of subcategories) so everything is
// recomputed on demand, nothing is cached.

use crate::catalog::Category;
use crate::session::AdjustmentSession;

/// Allowed adjustment range for a baseline: ±10%.
///
/// A zero baseline yields a zero-width range, which callers must treat as
/// "adjustment disabled", not as an error.
pub fn compute_range(default_value: i64) -> (f64, f64) {
    let base = default_value as f64;
    (base * 0.9, base * 1.1)
}

/// Percentage change of `changed` relative to `original`.
/// A zero original yields 0 rather than NaN/Infinity.
pub fn calc_percent(original: f64, changed: f64) -> f64 {
    if original == 0.0 {
        return 0.0;
    }
    (changed - original) / original * 100.0
}

/// Share of `part` in `whole` as a percentage, guarded against empty wholes
pub fn percent_of_total(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

/// Current total of one category under the session's overrides
pub fn category_total(category: &Category, session: &AdjustmentSession) -> f64 {
    category
        .subcategories
        .iter()
        .map(|sub| session.current_value(sub))
        .sum()
}

/// Baseline total of one category (no overrides applied)
pub fn category_default_total(category: &Category) -> f64 {
    category
        .subcategories
        .iter()
        .map(|sub| sub.default_value as f64)
        .sum()
}

/// Current total expenses across the whole catalog
pub fn global_expenses(categories: &[Category], session: &AdjustmentSession) -> f64 {
    categories
        .iter()
        .map(|category| category_total(category, session))
        .sum()
}

/// Baseline total expenses across the whole catalog
pub fn global_default_expenses(categories: &[Category]) -> f64 {
    categories.iter().map(category_default_total).sum()
}

/// Income minus expenses. Negative = shortfall, positive = surplus.
pub fn deficit(total_income: i64, expenses: f64) -> f64 {
    total_income as f64 - expenses
}

// ============================================================================
// TESTS
// ============================================================================
