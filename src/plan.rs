// 📋 Budget Plan - Immutable finalized submission
//
// A plan is a point-in-time copy of one user's adjustment session plus
// optional submitter metadata and the totals computed at submission time.
// Created once, never mutated, removable only by explicit deletion.
//
// All monetary values are rounded to integers (smallest currency unit)
// before they enter the archive, so floating drift from the interactive
// sliders never accumulates across submissions.

use crate::calculations::{deficit, global_expenses};
use crate::catalog::Category;
use crate::session::AdjustmentSession;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// SUBMITTER
// ============================================================================

/// Optional self-reported metadata attached to a submission.
/// All fields optional - anonymous submissions are first-class.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submitter {
    pub user_name: Option<String>,
    pub user_age: Option<i64>,
    pub user_occupation: Option<String>,
}

impl Submitter {
    pub fn named(name: &str) -> Self {
        Submitter {
            user_name: Some(name.to_string()),
            ..Default::default()
        }
    }
}

// ============================================================================
// PLAN
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,

    pub user_name: Option<String>,
    pub user_age: Option<i64>,
    pub user_occupation: Option<String>,

    /// Full changes map at time of submission: subcategory id → new value.
    /// A copy, not a reference to the live session.
    pub changes: HashMap<String, i64>,

    pub total_income: i64,
    pub total_expenses: i64,

    /// total_income - total_expenses at submission time
    pub deficit: i64,

    pub created_at: DateTime<Utc>,
}

impl Plan {
    /// Finalize a session into an immutable plan.
    ///
    /// Every override is rounded to the smallest currency unit and totals
    /// are computed against the catalog as it stood at submission.
    pub fn from_session(
        session: &AdjustmentSession,
        categories: &[Category],
        total_income: i64,
        submitter: Submitter,
    ) -> Plan {
        let changes: HashMap<String, i64> = session
            .iter()
            .map(|(id, value)| (id.clone(), value.round() as i64))
            .collect();

        let total_expenses = global_expenses(categories, session).round() as i64;
        let plan_deficit = deficit(total_income, total_expenses as f64).round() as i64;

        Plan {
            id: uuid::Uuid::new_v4().to_string(),
            user_name: submitter.user_name,
            user_age: submitter.user_age,
            user_occupation: submitter.user_occupation,
            changes,
            total_income,
            total_expenses,
            deficit: plan_deficit,
            created_at: Utc::now(),
        }
    }

    /// Display name used for participant counting; missing names share
    /// one "anonymous" bucket.
    pub fn display_name(&self) -> &str {
        self.user_name.as_deref().unwrap_or("anonymous")
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;

    fn create_test_catalog() -> Vec<Category> {
        vec![
            Category::new("Education", "🎓", "#2196F3", 1)
                .with_subcategory("Schools", 12_000_000_000)
                .with_subcategory("Preschools", 6_500_000_000),
        ]
    }

    #[test]
    fn test_from_session_copies_and_rounds_changes() {
        let catalog = create_test_catalog();
        let schools_id = catalog[0].subcategories[0].id.clone();

        let mut session = AdjustmentSession::new();
        session.set_change(&schools_id, 12_500_000_000.4).unwrap();

        let plan = Plan::from_session(&session, &catalog, 20_000_000_000, Submitter::default());

        assert_eq!(plan.changes[&schools_id], 12_500_000_000);

        // Later session mutations must not touch the plan
        session.clear_changes();
        assert_eq!(plan.changes.len(), 1);
    }

    #[test]
    fn test_from_session_totals() {
        let catalog = create_test_catalog();
        let schools_id = catalog[0].subcategories[0].id.clone();

        let mut session = AdjustmentSession::new();
        session.set_change(&schools_id, 12_600_000_000.0).unwrap();

        let income = 20_000_000_000;
        let plan = Plan::from_session(&session, &catalog, income, Submitter::named("Aziza"));

        let expected_expenses = 12_600_000_000 + 6_500_000_000;
        assert_eq!(plan.total_expenses, expected_expenses);
        assert_eq!(plan.deficit, income - expected_expenses);
        assert_eq!(plan.user_name.as_deref(), Some("Aziza"));
    }

    #[test]
    fn test_empty_session_plan_matches_baselines() {
        let catalog = create_test_catalog();
        let session = AdjustmentSession::new();

        let plan = Plan::from_session(&session, &catalog, 20_000_000_000, Submitter::default());

        assert!(plan.changes.is_empty());
        assert_eq!(plan.total_expenses, 12_000_000_000 + 6_500_000_000);
    }

    #[test]
    fn test_display_name_anonymous_bucket() {
        let catalog = create_test_catalog();
        let session = AdjustmentSession::new();

        let anonymous =
            Plan::from_session(&session, &catalog, 1_000, Submitter::default());
        assert_eq!(anonymous.display_name(), "anonymous");

        let named = Plan::from_session(&session, &catalog, 1_000, Submitter::named("Botir"));
        assert_eq!(named.display_name(), "Botir");
    }
}
