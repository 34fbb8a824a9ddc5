//! Architecture health score.
//!
//! Five penalty components, each clamped to [0, 100], combined with the
//! configured weights and subtracted from 100.

use strata_core::config::HealthWeights;

use super::types::{DependencyCycle, HealthBreakdown, ModuleMetrics};

pub fn is_hotspot(metrics: &ModuleMetrics, threshold: u32) -> bool {
    metrics.total_coupling() >= threshold
}

fn ratio_penalty(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (count as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
    }
}

pub fn compute_health(
    metrics: &[ModuleMetrics],
    cycles: &[DependencyCycle],
    hotspot_threshold: u32,
    weights: &HealthWeights,
) -> HealthBreakdown {
    if metrics.is_empty() {
        return HealthBreakdown::perfect();
    }
    let n = metrics.len();

    let cycle_penalty = cycles
        .iter()
        .map(|c| c.severity.penalty())
        .sum::<f64>()
        .clamp(0.0, 100.0);

    let problematic = metrics.iter().filter(|m| m.zone.is_problematic()).count();
    let zone_penalty = ratio_penalty(problematic, n);

    let hotspots = metrics.iter().filter(|m| is_hotspot(m, hotspot_threshold)).count();
    let hotspot_penalty = ratio_penalty(hotspots, n);

    let total_exports: u32 = metrics.iter().map(|m| m.export_count).sum();
    let unused: u32 = metrics.iter().map(|m| m.unused_exports).sum();
    let unused_export_penalty = ratio_penalty(unused as usize, total_exports as usize);

    let avg_distance = metrics.iter().map(|m| m.distance).sum::<f64>() / n as f64;
    let distance_penalty = (avg_distance * 100.0).clamp(0.0, 100.0);

    let weighted = cycle_penalty * weights.cycles
        + zone_penalty * weights.zones
        + hotspot_penalty * weights.hotspots
        + unused_export_penalty * weights.unused_exports
        + distance_penalty * weights.distance;

    HealthBreakdown {
        cycle_penalty,
        zone_penalty,
        hotspot_penalty,
        unused_export_penalty,
        distance_penalty,
        score: (100.0 - weighted).clamp(0.0, 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupling::types::{CycleSeverity, ModuleRole, Zone};

    fn module(ca: u32, ce: u32, distance: f64, zone: Zone) -> ModuleMetrics {
        ModuleMetrics {
            module: "m".into(),
            language: None,
            file_count: 1,
            ca,
            ce,
            instability: 0.0,
            abstractness: 0.0,
            distance,
            export_count: 4,
            abstract_export_count: 0,
            used_exports: 2,
            unused_exports: 2,
            zone,
            role: ModuleRole::Balanced,
        }
    }

    #[test]
    fn empty_graph_is_perfect() {
        let h = compute_health(&[], &[], 3, &HealthWeights::default());
        assert_eq!(h.score, 100.0);
    }

    #[test]
    fn components_are_weighted() {
        let metrics = vec![
            module(2, 2, 0.0, Zone::MainSequence),
            module(0, 1, 1.0, Zone::ZoneOfPain),
        ];
        let cycles = vec![DependencyCycle {
            id: "x".into(),
            members: vec!["a".into(), "b".into(), "c".into()],
            severity: CycleSeverity::Medium,
            files_affected: 3,
            break_points: Vec::new(),
        }];
        let h = compute_health(&metrics, &cycles, 3, &HealthWeights::default());
        assert_eq!(h.cycle_penalty, 10.0);
        assert_eq!(h.zone_penalty, 50.0);
        assert_eq!(h.hotspot_penalty, 50.0);
        assert_eq!(h.unused_export_penalty, 50.0);
        assert_eq!(h.distance_penalty, 50.0);
        // 10*0.3 + 50*0.2 + 50*0.2 + 50*0.15 + 50*0.15 = 38
        assert!((h.score - 62.0).abs() < 1e-9);
    }

    #[test]
    fn many_critical_cycles_clamp_component() {
        let cycles: Vec<DependencyCycle> = (0..10)
            .map(|i| DependencyCycle {
                id: i.to_string(),
                members: vec!["a".into(); 6],
                severity: CycleSeverity::Critical,
                files_affected: 6,
                break_points: Vec::new(),
            })
            .collect();
        let metrics = vec![module(1, 1, 0.0, Zone::MainSequence)];
        let h = compute_health(&metrics, &cycles, 3, &HealthWeights::default());
        assert_eq!(h.cycle_penalty, 100.0);
        assert!(h.score >= 0.0 && h.score <= 100.0);
    }
}
