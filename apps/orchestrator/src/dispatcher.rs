// [apps/orchestrator/src/dispatcher.rs]
/*!
 * APARATO: TASK DISPATCHER (ESTRATO L1-APP)
 * RESPONSABILIDAD: El único lector de `scheduled_tasks`. Reclama la
 * tarea debida más antigua, la enruta al manejador de su `TaskKind` y
 * resuelve su destino final (`done` o `failed`), con un límite de
 * concurrencia fijo en vez de un `tokio::spawn` sin cota.
 */

use std::str::FromStr;
use std::sync::Arc;

use capitol_domain_models::bill::BillType;
use capitol_domain_models::task::{ScheduledTask, TaskKind};
use tokio::sync::Semaphore;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, instrument, warn};

use crate::batch_worker::{self, BatchContext};
use crate::orchestrator;
use crate::recompute;
use crate::repair;
use crate::state::AppState;

/// Cuánto espera el despachador antes de volver a consultar la cola
/// cuando no encontró ninguna tarea debida.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Bucle principal: consulta la cola indefinidamente, despachando cada
/// tarea reclamada a una corrutina bajo el límite de concurrencia del
/// semáforo. Pensado para correr como una tarea de fondo de larga vida
/// junto a la superficie HTTP.
pub async fn run(state: Arc<AppState>) {
    let semaphore = Arc::new(Semaphore::new(state.config.dispatcher_concurrency));

    loop {
        let claimed = match state.scheduler() {
            Ok(scheduler) => scheduler.claim_due_task().await,
            Err(error) => {
                error!(%error, "dispatcher could not open a scheduler connection");
                sleep(IDLE_POLL_INTERVAL).await;
                continue;
            }
        };

        let task = match claimed {
            Ok(Some(task)) => task,
            Ok(None) => {
                sleep(IDLE_POLL_INTERVAL).await;
                continue;
            }
            Err(error) => {
                error!(%error, "failed to claim due task");
                sleep(IDLE_POLL_INTERVAL).await;
                continue;
            }
        };

        let permit = Arc::clone(&semaphore).acquire_owned().await;
        let Ok(permit) = permit else {
            continue;
        };

        let state = Arc::clone(&state);
        tokio::spawn(async move {
            let _permit = permit;
            execute_task(&state, task).await;
        });
    }
}

#[instrument(skip(state, task), fields(task_id = %task.id, kind = task.kind.as_str()))]
async fn execute_task(state: &AppState, task: ScheduledTask) {
    debug!("dispatching claimed task");

    let outcome = match task.kind {
        TaskKind::SyncBatch => {
            run_sync_batch(state, &task).await;
            Ok(())
        }
        TaskKind::RepairBatch => {
            repair::repair_incomplete_bills(state, task.payload.congress).await;
            Ok(())
        }
        TaskKind::BackfillBatch => {
            repair::backfill_sync_status(state, task.payload.congress).await;
            Ok(())
        }
        TaskKind::RecomputeStats => {
            match task.payload.congress {
                Some(congress) => recompute::recompute_congress_stats(state, congress).await,
                None => recompute::recompute_all_known_congresses(state).await,
            }
            Ok(())
        }
        TaskKind::CronIncremental => orchestrator::incremental_sync(state, task.payload.congress)
            .await
            .map(|_| ()),
        TaskKind::CronFull => orchestrator::full_sync(state, task.payload.congress).await.map(|_| ()),
        TaskKind::CronRepair => repair::kick_off_repair(state, task.payload.congress).await.map(|_| ()),
        TaskKind::CronRecomputeStats => {
            recompute::recompute_all_known_congresses(state).await;
            Ok(())
        }
    };

    let Ok(scheduler) = state.scheduler() else {
        error!(task_id = %task.id, "could not open a connection to settle task outcome");
        return;
    };

    match outcome {
        Ok(()) => {
            if let Err(error) = scheduler.mark_done(&task.id).await {
                warn!(task_id = %task.id, %error, "failed to mark task done");
            }
        }
        Err(error) => {
            warn!(task_id = %task.id, %error, "task handler failed, marking dead");
            if let Err(error) = scheduler.mark_dead(&task.id).await {
                warn!(task_id = %task.id, %error, "failed to mark task dead");
            }
        }
    }
}

async fn run_sync_batch(state: &AppState, task: &ScheduledTask) {
    let payload = &task.payload;

    let Some(congress) = payload.congress else {
        warn!(task_id = %task.id, "sync_batch task missing congress, discarding");
        return;
    };
    let Some(bill_type) = payload
        .bill_type
        .as_deref()
        .and_then(|raw| BillType::from_str(raw).ok())
    else {
        warn!(task_id = %task.id, "sync_batch task missing or unrecognized bill_type, discarding");
        return;
    };
    let Some(snapshot_id) = payload.snapshot_id.clone() else {
        warn!(task_id = %task.id, "sync_batch task missing snapshot_id, discarding");
        return;
    };

    let ctx = BatchContext {
        congress,
        bill_type,
        offset: payload.offset.unwrap_or(0).max(0) as u32,
        snapshot_id,
        updated_since: payload.updated_since.clone(),
        chain_success_so_far: payload.chain_success.unwrap_or(0),
        chain_failed_so_far: payload.chain_failed.unwrap_or(0),
    };

    batch_worker::sync_bill_batch(state, ctx).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use capitol_domain_models::snapshot::SyncType;
    use capitol_domain_models::task::TaskPayload;
    use capitol_infra_congress_client::CongressApiClient;
    use capitol_infra_db::DbClient;

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
            dispatcher_concurrency: 2,
        });
        let client = Arc::new(CongressApiClient::new("test-key").unwrap());
        AppState::new(config, db, client)
    }

    fn sample_bill() -> capitol_domain_models::bill::Bill {
        capitol_domain_models::bill::Bill {
            bill_id: "1hr119".into(),
            congress: 119,
            bill_type: BillType::Hr,
            bill_number: 1,
            title: "An Act".into(),
            title_without_number: "An Act".into(),
            introduced_date: "2025-01-01".into(),
            sponsor: None,
            stage: capitol_domain_models::bill::Stage::INTRODUCED.0,
            stage_description: "Introduced".into(),
            synced_endpoints: Some(31),
            last_sync_attempt: None,
            created_at: "2025-01-01T00:00:00Z".into(),
            updated_at: "2025-01-01T00:00:00Z".into(),
        }
    }

    #[tokio::test]
    async fn recompute_stats_task_without_congress_runs_against_all_known() {
        let state = test_state().await;
        let bills = state.bills().unwrap();
        bills.upsert(&sample_bill()).await.unwrap();

        let scheduler = state.scheduler().unwrap();
        let id = scheduler
            .enqueue(TaskKind::RecomputeStats, &TaskPayload::default(), &chrono::Utc::now().to_rfc3339())
            .await
            .unwrap();
        let task = scheduler.claim_due_task().await.unwrap().unwrap();
        assert_eq!(task.id, id);

        execute_task(&state, task).await;

        let stats = state.stats().unwrap();
        assert!(stats.get(119).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn cron_repair_task_creates_a_repair_snapshot() {
        let state = test_state().await;
        let scheduler = state.scheduler().unwrap();
        let id = scheduler
            .enqueue(TaskKind::CronRepair, &TaskPayload::default(), &chrono::Utc::now().to_rfc3339())
            .await
            .unwrap();
        let task = scheduler.claim_due_task().await.unwrap().unwrap();
        assert_eq!(task.id, id);

        execute_task(&state, task).await;

        let scheduled = scheduler.claim_due_task().await.unwrap();
        assert!(scheduled.is_some());
        assert_eq!(scheduled.unwrap().kind, TaskKind::RepairBatch);
    }

    #[tokio::test]
    async fn malformed_sync_batch_payload_is_discarded_not_retried() {
        let state = test_state().await;
        let scheduler = state.scheduler().unwrap();
        let id = scheduler
            .enqueue(TaskKind::SyncBatch, &TaskPayload::default(), &chrono::Utc::now().to_rfc3339())
            .await
            .unwrap();
        let task = scheduler.claim_due_task().await.unwrap().unwrap();
        assert_eq!(task.id, id);

        execute_task(&state, task).await;

        let snapshot = SyncType::Incremental;
        let _ = snapshot;
    }
}
