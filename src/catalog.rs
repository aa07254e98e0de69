// 🗂️ Budget Catalog - Categories, subcategories and impact messages
//
// The catalog is the read-only reference tree the whole simulator works
// against: ordered categories, each owning an ordered list of subcategories,
// each subcategory carrying its approved baseline value and the narrative
// impact messages that appear when an adjustment crosses a threshold.
//
// All monetary values are integers in the smallest currency unit (so'm).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// THRESHOLD TYPE
// ============================================================================

/// The four fixed percentage-change bands an impact message can be
/// attached to. `Increase7` / `Decrease7` are the stronger narratives and
/// take priority over the ±3% bands when both apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThresholdType {
    #[serde(rename = "increase_3")]
    Increase3,

    #[serde(rename = "increase_7")]
    Increase7,

    #[serde(rename = "decrease_3")]
    Decrease3,

    #[serde(rename = "decrease_7")]
    Decrease7,
}

impl ThresholdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdType::Increase3 => "increase_3",
            ThresholdType::Increase7 => "increase_7",
            ThresholdType::Decrease3 => "decrease_3",
            ThresholdType::Decrease7 => "decrease_7",
        }
    }

    /// Parse from the stored string form ("increase_3", ...)
    pub fn parse(s: &str) -> Option<ThresholdType> {
        match s {
            "increase_3" => Some(ThresholdType::Increase3),
            "increase_7" => Some(ThresholdType::Increase7),
            "decrease_3" => Some(ThresholdType::Decrease3),
            "decrease_7" => Some(ThresholdType::Decrease7),
            _ => None,
        }
    }

    pub fn is_increase(&self) -> bool {
        matches!(self, ThresholdType::Increase3 | ThresholdType::Increase7)
    }

    /// Human-readable band label ("+7%", "-3%", ...)
    pub fn label(&self) -> &'static str {
        match self {
            ThresholdType::Increase3 => "+3%",
            ThresholdType::Increase7 => "+7%",
            ThresholdType::Decrease3 => "-3%",
            ThresholdType::Decrease7 => "-7%",
        }
    }
}

// ============================================================================
// IMPACT MESSAGE
// ============================================================================

/// Narrative consequence message shown when a subcategory's adjustment
/// crosses one of the fixed thresholds.
///
/// Invariant: at most one impact per (subcategory, threshold type) pair.
/// The store enforces this with a unique index and upsert semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Impact {
    pub id: String,
    pub subcategory_id: String,
    pub threshold_type: ThresholdType,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Impact {
    pub fn new(subcategory_id: &str, threshold_type: ThresholdType, message: &str) -> Self {
        Impact {
            id: uuid::Uuid::new_v4().to_string(),
            subcategory_id: subcategory_id.to_string(),
            threshold_type,
            message: message.to_string(),
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// SUBCATEGORY
// ============================================================================

/// One adjustable budget line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: String,

    /// Owning category UUID
    pub category_id: String,

    pub name: String,

    /// Approved baseline value in smallest currency unit.
    /// Zero is valid but degenerate: the adjustment range collapses and
    /// percentage change is undefined (treated as 0 everywhere).
    pub default_value: i64,

    pub created_at: DateTime<Utc>,

    /// Authored impact messages, at most one per threshold type
    #[serde(default)]
    pub impacts: Vec<Impact>,
}

impl Subcategory {
    pub fn new(category_id: &str, name: &str, default_value: i64) -> Self {
        Subcategory {
            id: uuid::Uuid::new_v4().to_string(),
            category_id: category_id.to_string(),
            name: name.to_string(),
            default_value,
            created_at: Utc::now(),
            impacts: Vec::new(),
        }
    }

    /// Check whether this line item can be adjusted at all
    pub fn is_adjustable(&self) -> bool {
        self.default_value > 0
    }
}

// ============================================================================
// CATEGORY
// ============================================================================

/// Top-level budget category (e.g. "Education", "Healthcare").
///
/// Owns its subcategories exclusively; deleting a category cascades to its
/// subcategories and their impacts (enforced by the store, not the engine).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,

    pub name: String,

    /// Icon for UI display (e.g. "🎓")
    pub icon: String,

    /// Color for UI display (e.g. "#2196F3")
    pub color: String,

    /// Position in the catalog ordering (ascending)
    pub display_order: i64,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
}

impl Category {
    pub fn new(name: &str, icon: &str, color: &str, display_order: i64) -> Self {
        Category {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            color: color.to_string(),
            display_order,
            created_at: Utc::now(),
            subcategories: Vec::new(),
        }
    }

    /// Append a subcategory owned by this category
    pub fn with_subcategory(mut self, name: &str, default_value: i64) -> Self {
        let sub = Subcategory::new(&self.id, name, default_value);
        self.subcategories.push(sub);
        self
    }
}

// ============================================================================
// BUDGET CONFIG
// ============================================================================

/// Global income configuration. Exactly one config is active at a time;
/// the active config supplies total income to the totals calculator and
/// the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    pub id: String,
    pub total_income: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl BudgetConfig {
    pub fn new(total_income: i64) -> Self {
        BudgetConfig {
            id: uuid::Uuid::new_v4().to_string(),
            total_income,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// CATALOG LOOKUPS
// ============================================================================

/// Build a subcategory id → baseline lookup across the whole catalog
pub fn subcategory_baselines(categories: &[Category]) -> HashMap<String, i64> {
    let mut baselines = HashMap::new();

    for category in categories {
        for sub in &category.subcategories {
            baselines.insert(sub.id.clone(), sub.default_value);
        }
    }

    baselines
}

/// Find a subcategory anywhere in the catalog
pub fn find_subcategory<'a>(categories: &'a [Category], subcategory_id: &str) -> Option<&'a Subcategory> {
    categories
        .iter()
        .flat_map(|c| c.subcategories.iter())
        .find(|s| s.id == subcategory_id)
}

// ============================================================================
// DEFAULT CATALOG
// ============================================================================

/// Demo regional budget used by `civic-budget seed`.
///
/// Structure (baselines in so'm):
/// - Education: schools, preschools, vocational training
/// - Healthcare: polyclinics, emergency services
/// - Roads & Transport: road repair, public transport subsidy
/// - Public Spaces: parks & greenery, street lighting
pub fn default_catalog() -> Vec<Category> {
    let mut categories = Vec::new();

    // ========================================================================
    // EDUCATION
    // ========================================================================
    let education = Category::new("Education", "🎓", "#2196F3", 1)
        .with_subcategory("Schools", 12_000_000_000)
        .with_subcategory("Preschools", 6_500_000_000)
        .with_subcategory("Vocational training", 2_200_000_000);
    categories.push(education);

    // ========================================================================
    // HEALTHCARE
    // ========================================================================
    let healthcare = Category::new("Healthcare", "🏥", "#4CAF50", 2)
        .with_subcategory("Polyclinics", 9_300_000_000)
        .with_subcategory("Emergency services", 4_100_000_000);
    categories.push(healthcare);

    // ========================================================================
    // ROADS & TRANSPORT
    // ========================================================================
    let roads = Category::new("Roads & Transport", "🛣️", "#FF9800", 3)
        .with_subcategory("Road repair", 10_000_000_000)
        .with_subcategory("Public transport subsidy", 3_800_000_000);
    categories.push(roads);

    // ========================================================================
    // PUBLIC SPACES
    // ========================================================================
    let public_spaces = Category::new("Public Spaces", "🌳", "#9C27B0", 4)
        .with_subcategory("Parks & greenery", 2_700_000_000)
        .with_subcategory("Street lighting", 1_900_000_000);
    categories.push(public_spaces);

    // Attach a few authored impact messages to the demo catalog
    let schools_id = categories[0].subcategories[0].id.clone();
    categories[0].subcategories[0].impacts = vec![
        Impact::new(
            &schools_id,
            ThresholdType::Increase7,
            "Two new schools can open next year and class sizes shrink noticeably.",
        ),
        Impact::new(
            &schools_id,
            ThresholdType::Increase3,
            "Existing schools receive updated textbooks and lab equipment.",
        ),
        Impact::new(
            &schools_id,
            ThresholdType::Decrease3,
            "Planned renovations are postponed; some classes move to second shift.",
        ),
        Impact::new(
            &schools_id,
            ThresholdType::Decrease7,
            "Teacher hiring freezes and two rural schools face closure.",
        ),
    ];

    categories
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_type_round_trip() {
        for t in [
            ThresholdType::Increase3,
            ThresholdType::Increase7,
            ThresholdType::Decrease3,
            ThresholdType::Decrease7,
        ] {
            assert_eq!(ThresholdType::parse(t.as_str()), Some(t));
        }

        assert_eq!(ThresholdType::parse("increase_5"), None);
    }

    #[test]
    fn test_threshold_type_serde_names() {
        let json = serde_json::to_string(&ThresholdType::Increase7).unwrap();
        assert_eq!(json, "\"increase_7\"");

        let parsed: ThresholdType = serde_json::from_str("\"decrease_3\"").unwrap();
        assert_eq!(parsed, ThresholdType::Decrease3);
    }

    #[test]
    fn test_subcategory_ownership() {
        let category = Category::new("Education", "🎓", "#2196F3", 1)
            .with_subcategory("Schools", 12_000_000_000)
            .with_subcategory("Preschools", 6_500_000_000);

        assert_eq!(category.subcategories.len(), 2);
        for sub in &category.subcategories {
            assert_eq!(sub.category_id, category.id);
        }
    }

    #[test]
    fn test_subcategory_baselines_lookup() {
        let categories = default_catalog();
        let baselines = subcategory_baselines(&categories);

        let total_subcategories: usize =
            categories.iter().map(|c| c.subcategories.len()).sum();
        assert_eq!(baselines.len(), total_subcategories);

        let schools = &categories[0].subcategories[0];
        assert_eq!(baselines[&schools.id], schools.default_value);
    }

    #[test]
    fn test_find_subcategory() {
        let categories = default_catalog();
        let target = &categories[2].subcategories[0];

        let found = find_subcategory(&categories, &target.id).unwrap();
        assert_eq!(found.name, target.name);

        assert!(find_subcategory(&categories, "no-such-id").is_none());
    }

    #[test]
    fn test_default_catalog_is_ordered() {
        let categories = default_catalog();

        let orders: Vec<i64> = categories.iter().map(|c| c.display_order).collect();
        let mut sorted = orders.clone();
        sorted.sort();
        assert_eq!(orders, sorted);
    }

    #[test]
    fn test_default_catalog_impacts_are_unique_per_threshold() {
        let categories = default_catalog();
        let schools = &categories[0].subcategories[0];

        assert_eq!(schools.impacts.len(), 4);

        let mut seen = std::collections::HashSet::new();
        for impact in &schools.impacts {
            assert!(seen.insert(impact.threshold_type));
            assert_eq!(impact.subcategory_id, schools.id);
        }
    }

    #[test]
    fn test_zero_baseline_is_not_adjustable() {
        let sub = Subcategory::new("cat", "Frozen line", 0);
        assert!(!sub.is_adjustable());
    }
}
