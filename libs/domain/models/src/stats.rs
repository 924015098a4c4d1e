// [libs/domain/models/src/stats.rs]
/*!
 * APARATO: CONGRESS STATS ENTITY (ESTRATO L2)
 * RESPONSABILIDAD: Proyección precomputada de agregados usados por el
 * front-end de la página de inicio. No es fuente de verdad; se puede
 * recomputar en cualquier momento a partir de los Bills.
 */

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyAreaCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SponsorCount {
    pub name: String,
    pub party: String,
    pub state: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineMetric {
    pub stage: i32,
    pub average_days_from_introduction: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageCounts {
    pub introduced: i64,
    pub in_committee: i64,
    pub passed_one_chamber: i64,
    pub passed_both_chambers: i64,
    pub vetoed: i64,
    pub to_president: i64,
    pub signed: i64,
    pub became_law: i64,
}

/// Observability snapshot over `bills.synced_endpoints`: how many rows
/// are fully synced, partially synced, or never classified at all
/// (legacy, mask is `NULL`). Exposed by the completeness control-surface
/// route; never read by the Aggregate Recomputer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletenessSummary {
    pub total: i64,
    pub complete: i64,
    pub partial: i64,
    pub legacy: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CongressStats {
    pub congress: i32,
    pub total_count: i64,
    pub house_count: i64,
    pub senate_count: i64,
    pub stage_counts: StageCounts,
    pub top_policy_areas: Vec<PolicyAreaCount>,
    pub top_sponsors: Vec<SponsorCount>,
    pub timeline_metrics: Vec<TimelineMetric>,
    pub updated_at: String,
}
