//! Zone classification and trend tracking.

use strata_core::config::ZoneThresholds;
use strata_core::constants::{MAIN_SEQUENCE_DISTANCE, TREND_TOLERANCE};

use super::types::{CouplingTrend, ModuleMetrics, TrendDirection, Zone};

/// Classify a module on the (I, A) plane. Pure function of its metrics.
///
/// - Zone of Pain: I ≤ pain_instability_max and A ≤ pain_abstractness_max
/// - Zone of Uselessness: I ≥ uselessness_instability_min and A ≥ uselessness_abstractness_min
/// - Main Sequence: D below 0.3
/// - Transitional: everything else
pub fn classify_zone(instability: f64, abstractness: f64, distance: f64, thresholds: &ZoneThresholds) -> Zone {
    if instability <= thresholds.pain_instability_max && abstractness <= thresholds.pain_abstractness_max {
        Zone::ZoneOfPain
    } else if instability >= thresholds.uselessness_instability_min
        && abstractness >= thresholds.uselessness_abstractness_min
    {
        Zone::ZoneOfUselessness
    } else if distance < MAIN_SEQUENCE_DISTANCE {
        Zone::MainSequence
    } else {
        Zone::Transitional
    }
}

/// Compare two snapshots of the same module by distance.
pub fn compute_trend(previous: &ModuleMetrics, current: &ModuleMetrics) -> CouplingTrend {
    let direction = if current.distance < previous.distance - TREND_TOLERANCE {
        TrendDirection::Improving
    } else if current.distance > previous.distance + TREND_TOLERANCE {
        TrendDirection::Degrading
    } else {
        TrendDirection::Stable
    };

    CouplingTrend {
        module: current.module.clone(),
        previous_distance: previous.distance,
        current_distance: current.distance,
        previous_zone: previous.zone,
        current_zone: current.zone,
        direction,
    }
}
