// [apps/orchestrator/src/orchestrator.rs]
/*!
 * APARATO: SYNC ORCHESTRATOR (ESTRATO L1-APP)
 * RESPONSABILIDAD: Arranca una corrida de sincronización: crea la
 * instantánea y encola una tarea `SyncBatch` inicial por cada tipo de
 * proyecto de ley, escalonada en el tiempo para no saturar el límite de
 * tasa de congress.gov con ocho cadenas arrancando a la vez.
 */

use capitol_domain_models::bill::BillType;
use capitol_domain_models::snapshot::SyncType;
use capitol_domain_models::task::{TaskKind, TaskPayload};
use chrono::{Datelike, Duration, Utc};
use tracing::{info, warn};

use crate::errors::OrchestratorError;
use crate::state::AppState;

/// `⌊(year − 1789) / 2⌋ + 1`: el número de congreso en curso para una
/// fecha dada. El 1er Congreso corrió 1789-1791.
pub fn current_congress_for_year(year: i32) -> i32 {
    (year - 1789) / 2 + 1
}

pub fn current_congress() -> i32 {
    current_congress_for_year(Utc::now().year())
}

/// Crea una instantánea y encola una cadena `SyncBatch` por cada uno de
/// los ocho tipos de proyecto de ley, escalonadas por `stagger`.
async fn sync_congress(
    state: &AppState,
    sync_type: SyncType,
    congress: i32,
    updated_since: Option<String>,
    stagger: std::time::Duration,
) -> Result<String, OrchestratorError> {
    let snapshots = state.snapshots()?;
    let snapshot_id = snapshots.create(sync_type, congress).await?;

    let scheduler = state.scheduler()?;
    let now = Utc::now();
    let stagger_duration = Duration::from_std(stagger).unwrap_or_else(|_| Duration::zero());

    for (index, bill_type) in BillType::ALL.iter().enumerate() {
        let run_at = (now + stagger_duration * index as i32).to_rfc3339();
        let payload = TaskPayload {
            snapshot_id: Some(snapshot_id.clone()),
            congress: Some(congress),
            bill_type: Some(bill_type.as_str().to_string()),
            offset: Some(0),
            updated_since: updated_since.clone(),
            chain_success: None,
            chain_failed: None,
        };
        scheduler.enqueue(TaskKind::SyncBatch, &payload, &run_at).await?;
    }

    info!(snapshot_id = %snapshot_id, congress, sync_type = sync_type.as_str(), "sync chains enqueued");
    Ok(snapshot_id)
}

/// Trae únicamente los bills actualizados en las últimas
/// `incremental_lookback_hours` horas; pensado para correr una vez al
/// día sobre el congreso en curso.
pub async fn incremental_sync(state: &AppState, congress: Option<i32>) -> Result<String, OrchestratorError> {
    let congress = congress.unwrap_or_else(current_congress);
    let lookback = Duration::hours(state.config.incremental_lookback_hours);
    let updated_since = (Utc::now() - lookback).to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

    sync_congress(
        state,
        SyncType::Incremental,
        congress,
        Some(updated_since),
        state.config.incremental_stagger(),
    )
    .await
}

/// Recorre el congreso entero sin filtro de fecha, con un escalonamiento
/// más amplio entre cadenas; pensado para correr una vez a la semana.
pub async fn full_sync(state: &AppState, congress: Option<i32>) -> Result<String, OrchestratorError> {
    let congress = congress.unwrap_or_else(current_congress);
    let lookback = Duration::days(state.config.full_lookback_days);
    let updated_since = (Utc::now() - lookback).to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

    sync_congress(
        state,
        SyncType::Full,
        congress,
        Some(updated_since),
        state.config.full_stagger(),
    )
    .await
}

/// Arranca tres corridas históricas sin filtro de fecha para el
/// congreso en curso y los dos anteriores, cada una separada dos horas
/// de la siguiente para no competir por el mismo presupuesto de tasa.
pub async fn initial_historical_pull(state: &AppState) -> Result<Vec<String>, OrchestratorError> {
    let current = current_congress();
    let congresses = [current, current - 1, current - 2];
    let mut snapshot_ids = Vec::new();

    for (index, congress) in congresses.iter().enumerate() {
        let delay = Duration::hours(2) * index as i32;
        let start_at = Utc::now() + delay;
        if delay > Duration::zero() {
            warn!(congress, delay_hours = index * 2, "historical pull for this congress scheduled to start later");
        }

        let snapshots = state.snapshots()?;
        let snapshot_id = snapshots.create(SyncType::Historical, *congress).await?;

        let scheduler = state.scheduler()?;
        let bill_stagger = Duration::from_std(state.config.full_stagger()).unwrap_or_else(|_| Duration::zero());
        for (bill_index, bill_type) in BillType::ALL.iter().enumerate() {
            let run_at = (start_at + bill_stagger * bill_index as i32).to_rfc3339();
            let payload = TaskPayload {
                snapshot_id: Some(snapshot_id.clone()),
                congress: Some(*congress),
                bill_type: Some(bill_type.as_str().to_string()),
                offset: Some(0),
                updated_since: None,
                chain_success: None,
                chain_failed: None,
            };
            scheduler.enqueue(TaskKind::SyncBatch, &payload, &run_at).await?;
        }

        snapshot_ids.push(snapshot_id);
    }

    Ok(snapshot_ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_congress_matches_known_anchors() {
        assert_eq!(current_congress_for_year(1789), 1);
        assert_eq!(current_congress_for_year(2023), 118);
        assert_eq!(current_congress_for_year(2025), 119);
        assert_eq!(current_congress_for_year(2026), 119);
    }
}
