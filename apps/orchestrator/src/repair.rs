// [apps/orchestrator/src/repair.rs]
/*!
 * APARATO: REPAIR WORKER (ESTRATO L1-APP)
 * RESPONSABILIDAD: `repairIncompleteBills` y su variante sin llamadas a
 * la API, `backfillSyncStatus`. Ambas seleccionan Bills cuya máscara de
 * completitud es `NULL` o distinta de 31, y convergen hacia 31 sin
 * volver a tocar los sub-endpoints ya sincronizados.
 */

use capitol_domain_models::bill::Bill;
use capitol_domain_models::endpoint_bits;
use capitol_domain_models::snapshot::SyncType;
use capitol_domain_models::task::{TaskKind, TaskPayload};
use capitol_infra_congress_client::FetchOutcome;
use chrono::{Duration as ChronoDuration, Utc};
use tracing::{info, warn};

use crate::state::AppState;

/// Bills por lote, tanto para reparación como para backfill puro.
const REPAIR_BATCH_SIZE: u32 = 20;
const BACKFILL_BATCH_SIZE: u32 = 200;
const REPAIR_NEXT_BATCH_DELAY_SECS: i64 = 10;
const BACKFILL_NEXT_BATCH_DELAY_SECS: i64 = 2;

/// Calcula la máscara "desde los datos" de un Bill leyendo sus cuatro
/// tablas hijas, sin ninguna llamada a la API. Usado tanto por el modo
/// de backfill puro como por el primer paso de reparación de un Bill
/// legado.
async fn mask_from_children(state: &AppState, bill_id: &str) -> i32 {
    let has_actions = match state.actions() {
        Ok(repo) => repo.list_for_bill(bill_id).await.map(|rows| !rows.is_empty()).unwrap_or(false),
        Err(_) => false,
    };
    let has_subject = match state.subjects() {
        Ok(repo) => repo.get(bill_id).await.ok().flatten().is_some(),
        Err(_) => false,
    };
    let has_summary = match state.summaries() {
        Ok(repo) => repo.list_for_bill(bill_id).await.map(|rows| !rows.is_empty()).unwrap_or(false),
        Err(_) => false,
    };
    let has_text = match state.texts() {
        Ok(repo) => repo.list_for_bill(bill_id).await.map(|rows| !rows.is_empty()).unwrap_or(false),
        Err(_) => false,
    };

    endpoint_bits::from_child_presence(has_actions, has_subject, has_summary, has_text)
}

/// Variante "legado, sin HTTP" de la reparación: calcula la máscara de
/// cada Bill incompleto a partir de sus hijos y la persiste, sin
/// intentar re-obtener nada de congress.gov. Autoprogramable en trozos
/// de `BACKFILL_BATCH_SIZE` cada `BACKFILL_NEXT_BATCH_DELAY_SECS`.
pub async fn backfill_sync_status(state: &AppState, congress: Option<i32>) {
    let Ok(bills_repo) = state.bills() else {
        return;
    };
    let candidates = match bills_repo.list_incomplete(congress, BACKFILL_BATCH_SIZE).await {
        Ok(bills) => bills,
        Err(error) => {
            warn!(%error, "backfill: failed to list incomplete bills");
            return;
        }
    };

    if candidates.is_empty() {
        info!(congress = ?congress, "backfill converged, no incomplete bills remain");
        return;
    }

    let now = Utc::now().to_rfc3339();
    for bill in &candidates {
        let mask = mask_from_children(state, &bill.bill_id).await;
        if let Err(error) = bills_repo.update_synced_endpoints(&bill.bill_id, mask, &now).await {
            warn!(bill_id = %bill.bill_id, %error, "backfill: failed to persist computed mask");
        }
    }

    if candidates.len() as u32 >= BACKFILL_BATCH_SIZE {
        enqueue_next_backfill(state, congress).await;
    }
}

async fn enqueue_next_backfill(state: &AppState, congress: Option<i32>) {
    let Ok(scheduler) = state.scheduler() else {
        return;
    };
    let run_at = (Utc::now() + ChronoDuration::seconds(BACKFILL_NEXT_BATCH_DELAY_SECS)).to_rfc3339();
    let payload = TaskPayload {
        congress,
        ..Default::default()
    };
    if let Err(error) = scheduler.enqueue(TaskKind::BackfillBatch, &payload, &run_at).await {
        warn!(%error, "backfill: failed to enqueue next chunk");
    }
}

/// `repairIncompleteBills`: para cada Bill incompleto, rellena
/// únicamente los sub-endpoints faltantes. Un Bill legado (máscara
/// `NULL`) primero se resuelve por lectura de hijos; si eso ya alcanza
/// 31 no hace falta ninguna llamada HTTP para ese Bill.
pub async fn repair_incomplete_bills(state: &AppState, congress: Option<i32>) {
    let Ok(bills_repo) = state.bills() else {
        return;
    };
    let candidates = match bills_repo.list_incomplete(congress, REPAIR_BATCH_SIZE).await {
        Ok(bills) => bills,
        Err(error) => {
            warn!(%error, "repair: failed to list incomplete bills");
            return;
        }
    };

    if candidates.is_empty() {
        info!(congress = ?congress, "repair converged, no incomplete bills remain");
        return;
    }

    let mut consecutive_failures = 0u32;
    let batch_len = candidates.len() as u32;

    for bill in candidates {
        let starting_mask = match bill.synced_endpoints {
            Some(mask) => mask,
            None => mask_from_children(state, &bill.bill_id).await,
        };

        let final_mask = repair_one_bill(state, &bill, starting_mask).await;

        let now = Utc::now().to_rfc3339();
        if let Err(error) = bills_repo.update_synced_endpoints(&bill.bill_id, final_mask, &now).await {
            warn!(bill_id = %bill.bill_id, %error, "repair: failed to persist repaired mask");
        }

        if final_mask > starting_mask || endpoint_bits::is_complete(final_mask) {
            consecutive_failures = 0;
        } else {
            consecutive_failures += 1;
        }

        if consecutive_failures >= state.config.consecutive_fail_limit {
            warn!(congress = ?congress, "repair circuit breaker tripped, abandoning batch");
            return;
        }
    }

    if batch_len >= REPAIR_BATCH_SIZE {
        enqueue_next_repair(state, congress).await;
    }
}

/// Rellena únicamente los bits faltantes de un único Bill. Un bit de
/// detalle faltante bloquea la reparación de los hijos: sin título ni
/// fecha de introducción no hay Bill válido que los sub-endpoints
/// puedan colgar de él, así que esos casos se dejan para un ciclo
/// posterior en vez de sintetizar un detalle a medias.
async fn repair_one_bill(state: &AppState, bill: &Bill, starting_mask: i32) -> i32 {
    let mut mask = starting_mask;
    if mask & endpoint_bits::DETAIL == 0 {
        return mask;
    }

    let type_str = bill.bill_type.as_str();

    if mask & endpoint_bits::ACTIONS == 0 {
        if let Ok(FetchOutcome::Ok(response)) = state
            .congress_client
            .actions(bill.congress, type_str, bill.bill_number)
            .await
        {
            let actions: Vec<_> = response
                .actions
                .into_iter()
                .filter_map(|dto| {
                    let code = dto.action_code?;
                    if code.is_empty() {
                        return None;
                    }
                    Some(capitol_domain_models::action::BillAction {
                        bill_id: bill.bill_id.clone(),
                        action_code: code,
                        action_date: dto.action_date,
                        source_system_code: dto.source_system.as_ref().and_then(|s| s.code),
                        source_system_name: dto.source_system.and_then(|s| s.name),
                        text: dto.text.unwrap_or_default(),
                        action_type: dto.action_type,
                    })
                })
                .collect();
            match state.actions() {
                Ok(repo) => match repo.replace_all(&bill.bill_id, &actions).await {
                    Ok(()) => mask |= endpoint_bits::ACTIONS,
                    Err(error) => {
                        warn!(bill_id = %bill.bill_id, %error, "repair: failed to persist actions, leaving bit unset")
                    }
                },
                Err(_) => {}
            }
        }
    }

    if mask & endpoint_bits::SUBJECTS == 0 {
        if let Ok(FetchOutcome::Ok(response)) = state
            .congress_client
            .subjects(bill.congress, type_str, bill.bill_number)
            .await
        {
            match response.subjects.policy_area {
                Some(policy_area) => {
                    let subject = capitol_domain_models::subject::BillSubject {
                        bill_id: bill.bill_id.clone(),
                        policy_area_name: policy_area.name,
                        policy_area_update_date: policy_area.update_date,
                    };
                    match state.subjects() {
                        Ok(repo) => match repo.upsert(&subject).await {
                            Ok(()) => mask |= endpoint_bits::SUBJECTS,
                            Err(error) => {
                                warn!(bill_id = %bill.bill_id, %error, "repair: failed to persist subject, leaving bit unset")
                            }
                        },
                        Err(_) => {}
                    }
                }
                None => mask |= endpoint_bits::SUBJECTS,
            }
        }
    }

    if mask & endpoint_bits::SUMMARIES == 0 {
        if let Ok(FetchOutcome::Ok(response)) = state
            .congress_client
            .summaries(bill.congress, type_str, bill.bill_number)
            .await
        {
            if let Ok(repo) = state.summaries() {
                let mut all_persisted = true;
                for dto in response.summaries {
                    let summary = capitol_domain_models::summary::BillSummary {
                        bill_id: bill.bill_id.clone(),
                        version_code: dto.version_code,
                        action_date: dto.action_date,
                        action_desc: dto.action_desc.unwrap_or_default(),
                        text: dto.text.unwrap_or_default(),
                        update_date: dto.update_date,
                    };
                    if let Err(error) = repo.upsert_if_newer(&summary).await {
                        warn!(bill_id = %bill.bill_id, %error, "repair: failed to persist summary, leaving bit unset");
                        all_persisted = false;
                    }
                }
                if all_persisted {
                    mask |= endpoint_bits::SUMMARIES;
                }
            }
        }
    }

    if mask & endpoint_bits::TEXT == 0 {
        if let Ok(FetchOutcome::Ok(response)) = state
            .congress_client
            .text(bill.congress, type_str, bill.bill_number)
            .await
        {
            match response.text_versions.into_iter().last() {
                Some(latest) => {
                    let text_url = latest
                        .formats
                        .iter()
                        .find(|f| f.format_type == "Formatted Text")
                        .map(|f| f.url.clone());
                    let pdf_url = latest
                        .formats
                        .iter()
                        .find(|f| f.format_type == "PDF")
                        .map(|f| f.url.clone());
                    let text = capitol_domain_models::text::BillText {
                        bill_id: bill.bill_id.clone(),
                        date: latest.date,
                        version_type: latest.version_type.unwrap_or_default(),
                        text_url,
                        pdf_url,
                    };
                    match state.texts() {
                        Ok(repo) => match repo.insert_if_absent(&text).await {
                            Ok(()) => mask |= endpoint_bits::TEXT,
                            Err(error) => {
                                warn!(bill_id = %bill.bill_id, %error, "repair: failed to persist text, leaving bit unset")
                            }
                        },
                        Err(_) => {}
                    }
                }
                None => mask |= endpoint_bits::TEXT,
            }
        }
    }

    mask
}

async fn enqueue_next_repair(state: &AppState, congress: Option<i32>) {
    let Ok(scheduler) = state.scheduler() else {
        return;
    };
    let run_at = (Utc::now() + ChronoDuration::seconds(REPAIR_NEXT_BATCH_DELAY_SECS)).to_rfc3339();
    let payload = TaskPayload {
        congress,
        ..Default::default()
    };
    if let Err(error) = scheduler.enqueue(TaskKind::RepairBatch, &payload, &run_at).await {
        warn!(%error, "repair: failed to enqueue next batch");
    }
}

/// Entrada de control-surface: crea una instantánea `repair` y encola el
/// primer lote inmediatamente. Las corridas subsiguientes se
/// autoprograman desde `repair_incomplete_bills` sin volver a pasar por
/// aquí.
pub async fn kick_off_repair(state: &AppState, congress: Option<i32>) -> Result<String, crate::errors::OrchestratorError> {
    let snapshots = state.snapshots()?;
    let snapshot_id = snapshots.create(SyncType::Repair, congress.unwrap_or(0)).await?;

    let scheduler = state.scheduler()?;
    let payload = TaskPayload {
        congress,
        ..Default::default()
    };
    scheduler
        .enqueue(TaskKind::RepairBatch, &payload, &Utc::now().to_rfc3339())
        .await?;

    Ok(snapshot_id)
}

/// Entrada de control-surface para el modo legado puro, sin HTTP.
pub async fn kick_off_backfill(state: &AppState, congress: Option<i32>) -> Result<String, crate::errors::OrchestratorError> {
    let snapshots = state.snapshots()?;
    let snapshot_id = snapshots.create(SyncType::Backfill, congress.unwrap_or(0)).await?;

    let scheduler = state.scheduler()?;
    let payload = TaskPayload {
        congress,
        ..Default::default()
    };
    scheduler
        .enqueue(TaskKind::BackfillBatch, &payload, &Utc::now().to_rfc3339())
        .await?;

    Ok(snapshot_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use capitol_domain_models::bill::{BillType, Stage};
    use capitol_infra_congress_client::CongressApiClient;
    use capitol_infra_db::DbClient;
    use std::sync::Arc;

    async fn test_state() -> AppState {
        let db = DbClient::connect("file::memory:?cache=shared", None).await.unwrap();
        let config = Arc::new(crate::config::Config {
            congress_api_key: "test-key".into(),
            sync_auth_token: None,
            database_url: "file::memory:?cache=shared".into(),
            database_auth_token: None,
            port: 0,
            batch_size: 50,
            inter_request_delay_ms: 1,
            max_retries: 1,
            initial_backoff_secs: 0,
            consecutive_fail_limit: 5,
            incremental_lookback_hours: 26,
            full_lookback_days: 7,
            incremental_stagger_ms: 1,
            full_stagger_ms: 1,
            dispatcher_concurrency: 1,
        });
        let client = Arc::new(CongressApiClient::new("test-key").unwrap());
        AppState::new(config, db, client)
    }

    fn legacy_bill(bill_id: &str) -> Bill {
        Bill {
            bill_id: bill_id.into(),
            congress: 119,
            bill_type: BillType::Hr,
            bill_number: 1,
            title: "An Act".into(),
            title_without_number: "An Act".into(),
            introduced_date: "2025-01-01".into(),
            sponsor: None,
            stage: Stage::INTRODUCED.0,
            stage_description: "Introduced".into(),
            synced_endpoints: None,
            last_sync_attempt: None,
            created_at: "2025-01-01T00:00:00Z".into(),
            updated_at: "2025-01-01T00:00:00Z".into(),
        }
    }

    #[tokio::test]
    async fn backfill_computes_mask_from_existing_children_only() {
        let state = test_state().await;
        let bills = state.bills().unwrap();
        bills.upsert(&legacy_bill("1hr119")).await.unwrap();

        let actions = state.actions().unwrap();
        actions
            .replace_all(
                "1hr119",
                &[capitol_domain_models::action::BillAction {
                    bill_id: "1hr119".into(),
                    action_code: "5000".into(),
                    action_date: "2025-01-02".into(),
                    source_system_code: None,
                    source_system_name: None,
                    text: "Referred to committee".into(),
                    action_type: None,
                }],
            )
            .await
            .unwrap();

        let texts = state.texts().unwrap();
        texts
            .insert_if_absent(&capitol_domain_models::text::BillText {
                bill_id: "1hr119".into(),
                date: "2025-01-02".into(),
                version_type: "Introduced in House".into(),
                text_url: None,
                pdf_url: None,
            })
            .await
            .unwrap();

        backfill_sync_status(&state, None).await;

        let fetched = bills.get("1hr119").await.unwrap().unwrap();
        assert_eq!(
            fetched.synced_endpoints,
            Some(endpoint_bits::DETAIL | endpoint_bits::ACTIONS | endpoint_bits::TEXT)
        );
    }

    #[tokio::test]
    async fn backfill_is_a_noop_when_nothing_is_incomplete() {
        let state = test_state().await;
        let bills = state.bills().unwrap();
        let mut complete = legacy_bill("1hr119");
        complete.synced_endpoints = Some(endpoint_bits::COMPLETE);
        bills.upsert(&complete).await.unwrap();

        backfill_sync_status(&state, None).await;

        let fetched = bills.get("1hr119").await.unwrap().unwrap();
        assert_eq!(fetched.synced_endpoints, Some(endpoint_bits::COMPLETE));
    }

    #[tokio::test]
    async fn repair_blocked_without_detail_bit_leaves_mask_unchanged() {
        let state = test_state().await;
        let mut bill = legacy_bill("1hr119");
        bill.synced_endpoints = Some(0);
        let mask = repair_one_bill(&state, &bill, 0).await;
        assert_eq!(mask, 0);
    }
}
