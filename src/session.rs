// ✏️ Adjustment Session - One user's in-progress overrides
//
// The session is an explicit owned value handed to the pure calculation
// functions, never ambient state. Absence of a key means "use baseline".
// Values are kept raw (no clamping here) - the interaction layer owns
// clamping to the slider range; the session only refuses values that could
// poison downstream arithmetic (NaN, infinities, negatives).

use crate::catalog::{subcategory_baselines, Category, Subcategory};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Values closer to baseline than this are treated as "no change".
/// Keeps slider float drift from being persisted as a real adjustment.
pub const SNAP_TOLERANCE: f64 = 1000.0;

// ============================================================================
// SESSION ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Value was NaN or infinite
    NotFinite { subcategory_id: String },

    /// Budget values cannot go below zero
    Negative { subcategory_id: String, value: f64 },
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::NotFinite { subcategory_id } => {
                write!(f, "non-finite value for subcategory {}", subcategory_id)
            }
            SessionError::Negative {
                subcategory_id,
                value,
            } => {
                write!(
                    f,
                    "negative value {} for subcategory {}",
                    value, subcategory_id
                )
            }
        }
    }
}

impl std::error::Error for SessionError {}

// ============================================================================
// ADJUSTMENT SESSION
// ============================================================================

/// Mutable working set of one user's overrides, keyed by subcategory id.
///
/// Created empty when a user begins editing, mutated by discrete calls,
/// cleared on reset or after successful submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdjustmentSession {
    changes: HashMap<String, f64>,
}

impl AdjustmentSession {
    pub fn new() -> Self {
        AdjustmentSession {
            changes: HashMap::new(),
        }
    }

    /// Store a raw override, replacing any existing entry.
    ///
    /// Rejects non-finite and negative values so they are never stored;
    /// does NOT clamp to the adjustment range - that is the caller's job.
    pub fn set_change(&mut self, subcategory_id: &str, value: f64) -> Result<(), SessionError> {
        if !value.is_finite() {
            return Err(SessionError::NotFinite {
                subcategory_id: subcategory_id.to_string(),
            });
        }
        if value < 0.0 {
            return Err(SessionError::Negative {
                subcategory_id: subcategory_id.to_string(),
                value,
            });
        }

        self.changes.insert(subcategory_id.to_string(), value);
        Ok(())
    }

    /// Delete an override, reverting the subcategory to baseline
    pub fn remove_change(&mut self, subcategory_id: &str) {
        self.changes.remove(subcategory_id);
    }

    /// Empty the session entirely
    pub fn clear_changes(&mut self) {
        self.changes.clear();
    }

    /// Set or remove depending on distance from baseline: values within
    /// `SNAP_TOLERANCE` of the baseline snap back to "no change".
    pub fn apply_change(
        &mut self,
        subcategory_id: &str,
        value: f64,
        baseline: i64,
    ) -> Result<(), SessionError> {
        if (value - baseline as f64).abs() < SNAP_TOLERANCE {
            self.remove_change(subcategory_id);
            Ok(())
        } else {
            self.set_change(subcategory_id, value)
        }
    }

    pub fn get(&self, subcategory_id: &str) -> Option<f64> {
        self.changes.get(subcategory_id).copied()
    }

    /// Override if present, baseline otherwise
    pub fn current_value(&self, subcategory: &Subcategory) -> f64 {
        self.get(&subcategory.id)
            .unwrap_or(subcategory.default_value as f64)
    }

    pub fn is_changed(&self, subcategory_id: &str) -> bool {
        self.changes.contains_key(subcategory_id)
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Iterate over (subcategory id, override) entries
    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.changes.iter()
    }

    /// Net change against the catalog: sum of deltas from baseline.
    ///
    /// Overrides referencing subcategories no longer in the catalog
    /// contribute nothing.
    pub fn total_change(&self, categories: &[Category]) -> f64 {
        let baselines = subcategory_baselines(categories);

        self.changes
            .iter()
            .filter_map(|(id, value)| {
                baselines
                    .get(id)
                    .map(|baseline| value - *baseline as f64)
            })
            .sum()
    }
}

// ============================================================================
// TESTS
// ============================================================================
