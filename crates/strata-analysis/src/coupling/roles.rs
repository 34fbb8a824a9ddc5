//! Median-based role assignment.
//!
//! Two phases: [`RoleThresholds::collect`] reads every module's counts,
//! then [`RoleThresholds::classify`] labels modules one at a time. Keeping
//! them apart lets the incremental coordinator reclassify only affected
//! modules when the medians have not moved.

use serde::{Deserialize, Serialize};
use strata_core::constants::ROLE_MEDIAN_FLOOR;

use super::types::{ModuleMetrics, ModuleRole};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoleThresholds {
    pub median_ca: f64,
    pub median_ce: f64,
}

impl Default for RoleThresholds {
    fn default() -> Self {
        let floor = ROLE_MEDIAN_FLOOR as f64;
        Self {
            median_ca: floor,
            median_ce: floor,
        }
    }
}

impl RoleThresholds {
    /// Medians of Ca and Ce across all modules, floored at 2.
    pub fn collect<'a, I>(metrics: I) -> Self
    where
        I: IntoIterator<Item = &'a ModuleMetrics>,
    {
        let (mut ca, mut ce): (Vec<u32>, Vec<u32>) =
            metrics.into_iter().map(|m| (m.ca, m.ce)).unzip();
        let floor = ROLE_MEDIAN_FLOOR as f64;
        Self {
            median_ca: median(&mut ca).max(floor),
            median_ce: median(&mut ce).max(floor),
        }
    }

    pub fn classify(&self, ca: u32, ce: u32) -> ModuleRole {
        if ca == 0 && ce == 0 {
            return ModuleRole::Isolated;
        }
        let high_ca = ca as f64 >= self.median_ca;
        let high_ce = ce as f64 >= self.median_ce;
        match (high_ca, high_ce) {
            (true, true) => ModuleRole::Hub,
            (true, false) => ModuleRole::Authority,
            _ => ModuleRole::Balanced,
        }
    }
}

/// Assign roles to every module.
pub fn assign_roles(metrics: &mut [ModuleMetrics]) -> RoleThresholds {
    let thresholds = RoleThresholds::collect(metrics.iter());
    for m in metrics.iter_mut() {
        m.role = thresholds.classify(m.ca, m.ce);
    }
    thresholds
}

fn median(values: &mut [u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] as f64 + values[mid] as f64) / 2.0
    } else {
        values[mid] as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupling::types::Zone;

    fn counts(module: &str, ca: u32, ce: u32) -> ModuleMetrics {
        ModuleMetrics {
            module: module.to_string(),
            language: None,
            file_count: 1,
            ca,
            ce,
            instability: 0.0,
            abstractness: 0.0,
            distance: 0.0,
            export_count: 0,
            abstract_export_count: 0,
            used_exports: 0,
            unused_exports: 0,
            zone: Zone::Transitional,
            role: ModuleRole::Isolated,
        }
    }

    #[test]
    fn floor_applies_to_sparse_graphs() {
        let t = RoleThresholds::collect(std::iter::empty());
        assert_eq!(t.median_ca, 2.0);
        assert_eq!(t.classify(1, 1), ModuleRole::Balanced);
        assert_eq!(t.classify(2, 2), ModuleRole::Hub);
        assert_eq!(t.classify(3, 0), ModuleRole::Authority);
        assert_eq!(t.classify(0, 0), ModuleRole::Isolated);
    }

    #[test]
    fn median_of_even_count_averages_middle_values() {
        let mut values = vec![1, 9, 3, 5];
        assert_eq!(median(&mut values), 4.0);
    }

    #[test]
    fn thresholds_follow_medians_above_the_floor() {
        let mut metrics = vec![
            counts("a", 0, 3),
            counts("b", 3, 3),
            counts("c", 4, 5),
            counts("d", 5, 1),
            counts("e", 6, 3),
        ];
        let t = RoleThresholds::collect(metrics.iter());
        assert_eq!(t.median_ca, 4.0);
        assert_eq!(t.median_ce, 3.0);

        // (3, 3) would be a hub under the floor; here Ca falls short.
        assert_eq!(RoleThresholds::default().classify(3, 3), ModuleRole::Hub);
        assert_eq!(t.classify(3, 3), ModuleRole::Balanced);

        let returned = assign_roles(&mut metrics);
        assert_eq!(returned, t);
        let roles: Vec<ModuleRole> = metrics.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                ModuleRole::Balanced,
                ModuleRole::Balanced,
                ModuleRole::Hub,
                ModuleRole::Authority,
                ModuleRole::Hub,
            ]
        );
    }
}
