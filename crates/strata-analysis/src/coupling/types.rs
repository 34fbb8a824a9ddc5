//! Coupling analysis types: metrics, zones, roles, cycles, impact, health.

use serde::{Deserialize, Serialize};
use strata_core::config::Granularity;

/// Robert C. Martin coupling metrics for a single module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleMetrics {
    /// Module identifier (file, directory or package path).
    pub module: String,
    pub language: Option<String>,
    pub file_count: u32,
    /// Afferent coupling: distinct modules depending on this one.
    pub ca: u32,
    /// Efferent coupling: distinct modules this one depends on.
    pub ce: u32,
    /// Ce / (Ca + Ce). 0 when isolated.
    pub instability: f64,
    /// Abstract exports / total exports. 0 when nothing is exported.
    pub abstractness: f64,
    /// |A + I - 1|.
    pub distance: f64,
    pub export_count: u32,
    pub abstract_export_count: u32,
    pub used_exports: u32,
    pub unused_exports: u32,
    pub zone: Zone,
    pub role: ModuleRole,
}

impl ModuleMetrics {
    pub fn total_coupling(&self) -> u32 {
        self.ca + self.ce
    }
}

/// Position relative to the main sequence on the (I, A) plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// Stable and concrete. Hard to change, many depend on it.
    ZoneOfPain,
    /// Unstable and abstract. Abstractions nobody leans on.
    ZoneOfUselessness,
    MainSequence,
    Transitional,
}

impl Zone {
    pub const ALL: [Zone; 4] = [
        Zone::ZoneOfPain,
        Zone::ZoneOfUselessness,
        Zone::MainSequence,
        Zone::Transitional,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ZoneOfPain => "zone_of_pain",
            Self::ZoneOfUselessness => "zone_of_uselessness",
            Self::MainSequence => "main_sequence",
            Self::Transitional => "transitional",
        }
    }

    pub fn is_problematic(&self) -> bool {
        matches!(self, Self::ZoneOfPain | Self::ZoneOfUselessness)
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Structural role derived from median-relative Ca and Ce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleRole {
    /// Many dependents and many dependencies.
    Hub,
    /// Many dependents, few dependencies.
    Authority,
    Balanced,
    /// No edges at all.
    Isolated,
}

impl ModuleRole {
    pub const ALL: [ModuleRole; 4] = [
        ModuleRole::Hub,
        ModuleRole::Authority,
        ModuleRole::Balanced,
        ModuleRole::Isolated,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Hub => "hub",
            Self::Authority => "authority",
            Self::Balanced => "balanced",
            Self::Isolated => "isolated",
        }
    }
}

impl std::fmt::Display for ModuleRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Cycle severity, ordered Low < Medium < High < Critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CycleSeverity {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Health penalty contributed by one cycle of this severity.
    pub fn penalty(&self) -> f64 {
        match self {
            Self::Critical => 25.0,
            Self::High => 15.0,
            Self::Medium => 10.0,
            Self::Low => 5.0,
        }
    }
}

impl std::fmt::Display for CycleSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A strongly connected component with two or more members, or one member
/// with a self-loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyCycle {
    /// Hash of the sorted member set; stable across discovery order.
    pub id: String,
    /// Members in dependency-walk order starting from the smallest path.
    pub members: Vec<String>,
    pub severity: CycleSeverity,
    /// Total files across all member modules.
    pub files_affected: u32,
    /// Ranked cheapest-first.
    pub break_points: Vec<BreakPoint>,
}

impl DependencyCycle {
    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn contains(&self, module: &str) -> bool {
        self.members.iter().any(|m| m == module)
    }
}

/// How to cut a cycle edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakApproach {
    ExtractInterface,
    IntroduceMediator,
    DependencyInversion,
    MergeModules,
    ExtractCommon,
}

impl BreakApproach {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ExtractInterface => "extract_interface",
            Self::IntroduceMediator => "introduce_mediator",
            Self::DependencyInversion => "dependency_inversion",
            Self::MergeModules => "merge_modules",
            Self::ExtractCommon => "extract_common",
        }
    }
}

/// Effort tier. `VeryHigh` is only produced by impact analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffortLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// A candidate edge to cut inside a cycle. Lower score = cut first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakPoint {
    pub from: String,
    pub to: String,
    /// Ce(from) / max(Ca(to), 1).
    pub score: f64,
    /// Distinct symbols imported across all parallel edges.
    pub symbol_count: u32,
    pub approach: BreakApproach,
    pub effort: EffortLevel,
    pub rationale: String,
}

/// Module-level health used by impact reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleHealth {
    /// 0..=100.
    pub score: f64,
    pub issues: Vec<String>,
}

/// Estimated blast radius of refactoring one module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefactorImpact {
    pub module: String,
    pub direct_dependents: Vec<String>,
    /// Everything that transitively depends on the module, direct included.
    pub transitive_dependents: Vec<String>,
    pub affected_tests: Vec<String>,
    pub used_call_graph: bool,
    pub health: ModuleHealth,
    pub effort: EffortLevel,
    pub risk: RiskLevel,
    pub suggestions: Vec<String>,
}

impl RefactorImpact {
    pub fn total_affected(&self) -> usize {
        self.transitive_dependents.len()
    }
}

/// A module whose Ca + Ce meets the hotspot threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub module: String,
    pub total_coupling: u32,
    pub incoming: Vec<String>,
    pub outgoing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnusedExport {
    pub module: String,
    pub name: String,
    pub kind: String,
    pub file: String,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Degrading,
    Stable,
}

/// Distance trend for one module between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouplingTrend {
    pub module: String,
    pub previous_distance: f64,
    pub current_distance: f64,
    pub previous_zone: Zone,
    pub current_zone: Zone,
    pub direction: TrendDirection,
}

/// Which backend computed counts and cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    InMemory,
    Relational,
}

impl BackendKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InMemory => "in_memory",
            Self::Relational => "relational",
        }
    }
}

/// How complete the cycle set is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CycleStatus {
    /// Exact SCC detection.
    Complete,
    /// Reachability bounded at `max_depth`; long cycles may be missed.
    Approximate { max_depth: u32 },
    /// No cycle detection ran; metrics only.
    Skipped { reason: String },
}

impl CycleStatus {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Approximate { .. } => "approximate",
            Self::Skipped { .. } => "skipped",
        }
    }
}

/// The five weighted penalty components and the resulting score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthBreakdown {
    pub cycle_penalty: f64,
    pub zone_penalty: f64,
    pub hotspot_penalty: f64,
    pub unused_export_penalty: f64,
    pub distance_penalty: f64,
    pub score: f64,
}

impl HealthBreakdown {
    pub fn perfect() -> Self {
        Self {
            cycle_penalty: 0.0,
            zone_penalty: 0.0,
            hotspot_penalty: 0.0,
            unused_export_penalty: 0.0,
            distance_penalty: 0.0,
            score: 100.0,
        }
    }
}

/// Per-zone and per-role module counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CouplingSummary {
    pub zone_counts: Vec<(Zone, u32)>,
    pub role_counts: Vec<(ModuleRole, u32)>,
}

impl CouplingSummary {
    pub fn zone_count(&self, zone: Zone) -> u32 {
        self.zone_counts
            .iter()
            .find(|(z, _)| *z == zone)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    pub fn role_count(&self, role: ModuleRole) -> u32 {
        self.role_counts
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

/// Run-level statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub started_at: i64,
    pub duration_ms: u64,
    pub granularity: Granularity,
    pub files_analyzed: u32,
    pub module_count: u32,
    pub edge_count: u32,
    pub backend: BackendKind,
    pub cycle_status: CycleStatus,
}

/// Full coupling analysis result. Metrics are sorted by module path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouplingAnalysisResult {
    pub metrics: Vec<ModuleMetrics>,
    pub cycles: Vec<DependencyCycle>,
    pub hotspots: Vec<Hotspot>,
    pub unused_exports: Vec<UnusedExport>,
    pub health: HealthBreakdown,
    pub summary: CouplingSummary,
    pub stats: RunStats,
}
