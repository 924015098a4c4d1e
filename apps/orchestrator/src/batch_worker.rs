// [apps/orchestrator/src/batch_worker.rs]
/*!
 * APARATO: BATCH WORKER (ESTRATO L1-APP)
 * RESPONSABILIDAD: `syncBillBatch` — procesa una página de bills para un
 * (congreso, tipo) fijo, ensamblando cada uno, y decide si la cadena
 * continúa, se completa o se aborta por el cortacircuitos.
 */

use capitol_domain_models::bill::BillType;
use capitol_domain_models::task::{TaskKind, TaskPayload};
use capitol_infra_congress_client::FetchOutcome;
use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::assembler::BillAssembler;
use crate::recompute::recompute_congress_stats;
use crate::state::AppState;

/// Espaciado entre el cierre de una página y el auto-encolado de la
/// siguiente; da tiempo al resto de la cadena a liberar la conexión.
const NEXT_PAGE_DELAY_SECS: i64 = 5;

pub struct BatchContext {
    pub congress: i32,
    pub bill_type: BillType,
    pub offset: u32,
    pub snapshot_id: String,
    pub updated_since: Option<String>,
    /// Cuenta absoluta acumulada de esta cadena antes de esta página.
    pub chain_success_so_far: i64,
    pub chain_failed_so_far: i64,
}

/// Procesa una única página de la cadena `(snapshot, bill_type)`. Nunca
/// entra en pánico: cualquier fallo de almacenamiento se registra y la
/// página continúa con el resto de sus bills.
#[tracing::instrument(skip(state, ctx), fields(congress = ctx.congress, bill_type = ctx.bill_type.as_str(), offset = ctx.offset))]
pub async fn sync_bill_batch(state: &AppState, ctx: BatchContext) {
    let batch_size = state.config.batch_size;

    let list = state
        .congress_client
        .list_bills(
            ctx.congress,
            ctx.bill_type.as_str(),
            ctx.offset,
            batch_size,
            ctx.updated_since.as_deref(),
        )
        .await;

    let bills = match list {
        Ok(FetchOutcome::Ok(response)) => response.bills,
        Ok(FetchOutcome::NotFound) => Vec::new(),
        Ok(FetchOutcome::Failed) | Err(_) => {
            warn!(snapshot_id = %ctx.snapshot_id, "bill list fetch exhausted, snapshot chain aborted");
            fail_snapshot(state, &ctx.snapshot_id, "bill list fetch exhausted its retry budget").await;
            return;
        }
    };

    if bills.is_empty() {
        complete_page(state, &ctx, 0, 0).await;
        return;
    }

    let assembler = BillAssembler::new(state);
    let mut success = 0i64;
    let mut failed = 0i64;
    let mut consecutive_failures = 0u32;

    for item in &bills {
        let Ok(bill_number) = item.number.parse::<i32>() else {
            warn!(raw_number = %item.number, "skipping bill with unparseable number");
            failed += 1;
            consecutive_failures += 1;
            continue;
        };

        let outcome = assembler.assemble(ctx.congress, ctx.bill_type, bill_number).await;
        if outcome.success {
            success += 1;
            consecutive_failures = 0;
        } else {
            failed += 1;
            consecutive_failures += 1;
        }

        if consecutive_failures >= state.config.consecutive_fail_limit {
            warn!(
                snapshot_id = %ctx.snapshot_id,
                offset = ctx.offset,
                "circuit breaker tripped, abandoning page"
            );
            record_progress(state, &ctx, success, failed).await;
            fail_snapshot(
                state,
                &ctx.snapshot_id,
                &format!(
                    "circuit breaker tripped at offset {} for {}",
                    ctx.offset,
                    ctx.bill_type.as_str()
                ),
            )
            .await;
            return;
        }
    }

    record_progress(state, &ctx, success, failed).await;

    let page_was_full = bills.len() as u32 >= batch_size;
    if page_was_full {
        enqueue_next_page(state, &ctx, success, failed).await;
    } else {
        complete_page(state, &ctx, success, failed).await;
    }
}

/// Escribe el total absoluto acumulado de esta cadena hasta e incluyendo
/// la página actual — nunca un delta — en la fila de instantánea
/// compartida por las ocho cadenas de tipo de proyecto de ley.
async fn record_progress(state: &AppState, ctx: &BatchContext, page_success: i64, page_failed: i64) {
    let Ok(snapshots) = state.snapshots() else {
        return;
    };
    let chain_success = ctx.chain_success_so_far + page_success;
    let chain_failed = ctx.chain_failed_so_far + page_failed;
    if let Err(error) = snapshots
        .add_progress(
            &ctx.snapshot_id,
            ctx.bill_type.as_str(),
            chain_success + chain_failed,
            chain_success,
            chain_failed,
        )
        .await
    {
        warn!(snapshot_id = %ctx.snapshot_id, %error, "failed to persist batch progress");
    }
}

async fn fail_snapshot(state: &AppState, snapshot_id: &str, reason: &str) {
    if let Ok(snapshots) = state.snapshots() {
        if let Err(error) = snapshots.fail(snapshot_id, reason).await {
            warn!(%snapshot_id, %error, "failed to mark snapshot as failed");
        }
    }
}

/// El resto de la página terminó sin disparar el cortacircuitos: o la
/// lista llegó vacía, o la página vino parcial (última del tipo). En
/// ambos casos esta cadena `(snapshot, bill_type)` concluyó.
async fn complete_page(state: &AppState, ctx: &BatchContext, success: i64, failed: i64) {
    if success == 0 && failed == 0 {
        info!(snapshot_id = %ctx.snapshot_id, bill_type = ctx.bill_type.as_str(), "empty page, chain complete");
    }
    if let Ok(snapshots) = state.snapshots() {
        if let Err(error) = snapshots.complete(&ctx.snapshot_id).await {
            warn!(snapshot_id = %ctx.snapshot_id, %error, "failed to mark snapshot completed");
        }
    }
    recompute_congress_stats(state, ctx.congress).await;
}

async fn enqueue_next_page(state: &AppState, ctx: &BatchContext, page_success: i64, page_failed: i64) {
    let Ok(scheduler) = state.scheduler() else {
        return;
    };
    let run_at = (Utc::now() + Duration::seconds(NEXT_PAGE_DELAY_SECS)).to_rfc3339();
    let payload = TaskPayload {
        snapshot_id: Some(ctx.snapshot_id.clone()),
        congress: Some(ctx.congress),
        bill_type: Some(ctx.bill_type.as_str().to_string()),
        offset: Some((ctx.offset + state.config.batch_size) as i32),
        updated_since: ctx.updated_since.clone(),
        chain_success: Some(ctx.chain_success_so_far + page_success),
        chain_failed: Some(ctx.chain_failed_so_far + page_failed),
    };
    if let Err(error) = scheduler.enqueue(TaskKind::SyncBatch, &payload, &run_at).await {
        warn!(snapshot_id = %ctx.snapshot_id, %error, "failed to enqueue next page");
    }
}
