// 📊 Aggregation Engine - Population statistics across submitted plans
//
// A single read-only fold over the whole plan archive plus the catalog's
// current baselines. The fold is commutative and associative: plan order
// never matters. Results are recomputed from source records on every call,
// never cached, so they are always consistent with the archive.

use crate::catalog::{subcategory_baselines, Category};
use crate::plan::Plan;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ============================================================================
// AGGREGATED OUTPUT
// ============================================================================

/// Per-subcategory population statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubcategoryAggregation {
    pub subcategory_id: String,
    pub subcategory_name: String,

    /// Current baseline from the catalog
    pub default_value: i64,

    /// Net delta from baseline summed across every plan that touched
    /// this line item. Opposing adjustments cancel.
    pub total_change: i64,

    /// total_change relative to baseline; 0 for a zero baseline
    pub percent_change: f64,

    /// How many plans contain an override for this line item
    pub participant_count: usize,

    pub category_color: String,
}

/// Category node mirroring the catalog shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryAggregation {
    pub category_id: String,
    pub category_name: String,
    pub category_icon: String,
    pub category_color: String,
    pub subcategories: Vec<SubcategoryAggregation>,
}

/// Global summary plus the per-category tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedStats {
    pub total_plans: usize,

    /// Distinct submitter display names, with missing names pooled into
    /// one "anonymous" bucket. An approximation, not an identity count:
    /// two people sharing a name are counted once.
    pub total_participants: usize,

    pub original_income: i64,
    pub proposed_income: i64,
    pub income_change: i64,

    pub original_expenses: i64,
    pub proposed_expenses: i64,
    pub expenses_change: i64,

    pub original_deficit: i64,
    pub proposed_deficit: i64,
    pub deficit_change: i64,

    pub categories: Vec<CategoryAggregation>,
}

impl AggregatedStats {
    /// One-line report for logs and the CLI
    pub fn summary(&self) -> String {
        format!(
            "{} plans from {} participants: expenses {} -> {} ({:+}), deficit {} -> {}",
            self.total_plans,
            self.total_participants,
            self.original_expenses,
            self.proposed_expenses,
            self.expenses_change,
            self.original_deficit,
            self.proposed_deficit,
        )
    }
}

// ============================================================================
// AGGREGATOR
// ============================================================================

/// Folds the plan archive into population statistics.
///
/// Income source: `with_income` pins income to the live budget config,
/// which holds even when the archive is empty. `new()` falls back to the
/// first plan's recorded income - the historical behavior, kept for
/// archives that predate an income config (0 when the archive is empty).
pub struct Aggregator {
    fixed_income: Option<i64>,
}

impl Aggregator {
    pub fn new() -> Self {
        Aggregator { fixed_income: None }
    }

    pub fn with_income(total_income: i64) -> Self {
        Aggregator {
            fixed_income: Some(total_income),
        }
    }

    /// Aggregate the full archive against the catalog's current baselines.
    ///
    /// An empty archive yields a fully-shaped all-zero result, not an
    /// error. A change entry whose subcategory no longer exists in the
    /// catalog is skipped entirely: it contributes to neither the deltas
    /// nor the proposed totals, and never aborts the fold.
    pub fn aggregate(&self, plans: &[Plan], categories: &[Category]) -> AggregatedStats {
        let baselines = subcategory_baselines(categories);

        let original_expenses: i64 = baselines.values().sum();
        let original_income = self
            .fixed_income
            .or_else(|| plans.first().map(|plan| plan.total_income))
            .unwrap_or(0);
        let original_deficit = original_income - original_expenses;

        // Fold every plan's changes into per-subcategory tallies
        let mut tallies: HashMap<&str, Tally> = HashMap::new();

        for plan in plans {
            for (subcategory_id, new_value) in &plan.changes {
                let Some(baseline) = baselines.get(subcategory_id) else {
                    // Stale reference: the subcategory was deleted after
                    // this plan was submitted. Skip, never fail.
                    continue;
                };

                let tally = tallies.entry(subcategory_id.as_str()).or_default();
                tally.total_change += new_value - baseline;
                tally.participant_count += 1;
            }
        }

        let total_change_sum: i64 = tallies.values().map(|t| t.total_change).sum();
        let proposed_expenses = original_expenses + total_change_sum;
        let proposed_income = original_income; // income is not adjustable
        let proposed_deficit = proposed_income - proposed_expenses;

        let total_participants = plans
            .iter()
            .map(|plan| plan.display_name())
            .collect::<HashSet<_>>()
            .len();

        // Build the output tree mirroring the catalog shape
        let category_aggregations = categories
            .iter()
            .map(|category| CategoryAggregation {
                category_id: category.id.clone(),
                category_name: category.name.clone(),
                category_icon: category.icon.clone(),
                category_color: category.color.clone(),
                subcategories: category
                    .subcategories
                    .iter()
                    .map(|sub| {
                        let tally = tallies.get(sub.id.as_str()).copied().unwrap_or_default();
                        let percent_change = if sub.default_value > 0 {
                            tally.total_change as f64 / sub.default_value as f64 * 100.0
                        } else {
                            0.0
                        };

                        SubcategoryAggregation {
                            subcategory_id: sub.id.clone(),
                            subcategory_name: sub.name.clone(),
                            default_value: sub.default_value,
                            total_change: tally.total_change,
                            percent_change,
                            participant_count: tally.participant_count,
                            category_color: category.color.clone(),
                        }
                    })
                    .collect(),
            })
            .collect();

        AggregatedStats {
            total_plans: plans.len(),
            total_participants,
            original_income,
            proposed_income,
            income_change: proposed_income - original_income,
            original_expenses,
            proposed_expenses,
            expenses_change: proposed_expenses - original_expenses,
            original_deficit,
            proposed_deficit,
            deficit_change: proposed_deficit - original_deficit,
            categories: category_aggregations,
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    total_change: i64,
    participant_count: usize,
}

// ============================================================================
// TESTS
// ============================================================================
