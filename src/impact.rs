// 💬 Impact Resolver - Which consequence message applies right now
//
// Threshold selection is an ordered predicate chain evaluated top to
// bottom, first match wins. The ±7% bands are checked before the ±3% bands:
// above 7% both predicates hold and the stronger narrative must win.

use crate::catalog::{Impact, ThresholdType};
use crate::calculations::calc_percent;

/// Threshold bands in priority order. Order is load-bearing: at exactly
/// +7% both increase predicates match and `Increase7` must be selected.
const THRESHOLD_PRIORITY: [ThresholdType; 4] = [
    ThresholdType::Increase7,
    ThresholdType::Increase3,
    ThresholdType::Decrease7,
    ThresholdType::Decrease3,
];

fn threshold_matches(threshold: ThresholdType, percent_change: f64) -> bool {
    match threshold {
        ThresholdType::Increase7 => percent_change >= 7.0,
        ThresholdType::Increase3 => percent_change >= 3.0,
        ThresholdType::Decrease7 => percent_change <= -7.0,
        ThresholdType::Decrease3 => percent_change <= -3.0,
    }
}

/// Select the active threshold band for a percentage change, if any
pub fn active_threshold(percent_change: f64) -> Option<ThresholdType> {
    THRESHOLD_PRIORITY
        .iter()
        .copied()
        .find(|threshold| threshold_matches(*threshold, percent_change))
}

/// Resolve the consequence message for a subcategory's current value.
///
/// Returns None when:
/// - the baseline is 0 (percentage change is undefined)
/// - no threshold band is active (change within ±3%)
/// - a band is active but no message was authored for it
pub fn active_impact<'a>(
    current_value: f64,
    default_value: i64,
    impacts: &'a [Impact],
) -> Option<&'a Impact> {
    if default_value == 0 {
        return None;
    }

    let percent_change = calc_percent(default_value as f64, current_value);
    let threshold = active_threshold(percent_change)?;

    impacts
        .iter()
        .find(|impact| impact.threshold_type == threshold)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Impact;

    fn create_test_impacts() -> Vec<Impact> {
        vec![
            Impact::new("sub-1", ThresholdType::Increase3, "Mild improvement"),
            Impact::new("sub-1", ThresholdType::Increase7, "Strong improvement"),
            Impact::new("sub-1", ThresholdType::Decrease3, "Mild cuts"),
            Impact::new("sub-1", ThresholdType::Decrease7, "Severe cuts"),
        ]
    }

    #[test]
    fn test_active_threshold_bands() {
        assert_eq!(active_threshold(8.0), Some(ThresholdType::Increase7));
        assert_eq!(active_threshold(4.0), Some(ThresholdType::Increase3));
        assert_eq!(active_threshold(1.0), None);
        assert_eq!(active_threshold(0.0), None);
        assert_eq!(active_threshold(-1.0), None);
        assert_eq!(active_threshold(-4.0), Some(ThresholdType::Decrease3));
        assert_eq!(active_threshold(-8.0), Some(ThresholdType::Decrease7));
    }

    #[test]
    fn test_seven_wins_over_three_at_boundary() {
        // At exactly 7% both increase predicates are true; the stronger
        // narrative must be selected.
        assert_eq!(active_threshold(7.0), Some(ThresholdType::Increase7));
        assert_eq!(active_threshold(-7.0), Some(ThresholdType::Decrease7));

        // Exactly 3% is still the mild band
        assert_eq!(active_threshold(3.0), Some(ThresholdType::Increase3));
        assert_eq!(active_threshold(-3.0), Some(ThresholdType::Decrease3));
    }

    #[test]
    fn test_active_impact_monotonicity() {
        let impacts = create_test_impacts();
        let baseline = 10_000_000_000_i64;
        let base = baseline as f64;

        let strong = active_impact(base * 1.08, baseline, &impacts).unwrap();
        assert_eq!(strong.threshold_type, ThresholdType::Increase7);

        let mild = active_impact(base * 1.04, baseline, &impacts).unwrap();
        assert_eq!(mild.threshold_type, ThresholdType::Increase3);

        assert!(active_impact(base * 1.01, baseline, &impacts).is_none());

        let mild_cut = active_impact(base * 0.96, baseline, &impacts).unwrap();
        assert_eq!(mild_cut.threshold_type, ThresholdType::Decrease3);

        let severe_cut = active_impact(base * 0.92, baseline, &impacts).unwrap();
        assert_eq!(severe_cut.threshold_type, ThresholdType::Decrease7);
    }

    #[test]
    fn test_boundary_value_scenario() {
        // Baseline 100, current 107 -> exactly +7% -> increase_7
        let impacts = create_test_impacts();

        let impact = active_impact(107.0, 100, &impacts).unwrap();
        assert_eq!(impact.threshold_type, ThresholdType::Increase7);
        assert_eq!(impact.message, "Strong improvement");
    }

    #[test]
    fn test_zero_baseline_yields_none() {
        let impacts = create_test_impacts();
        assert!(active_impact(500.0, 0, &impacts).is_none());
    }

    #[test]
    fn test_unauthored_threshold_yields_none() {
        // Only the +3% band has a message; +8% selects the +7% band,
        // which has nothing authored.
        let impacts = vec![Impact::new(
            "sub-1",
            ThresholdType::Increase3,
            "Mild improvement",
        )];

        assert!(active_impact(108.0, 100, &impacts).is_none());
        assert!(active_impact(104.0, 100, &impacts).is_some());
    }

    #[test]
    fn test_empty_impacts_yields_none() {
        assert!(active_impact(110.0, 100, &[]).is_none());
    }
}
