// [libs/infra/db/src/repositories/scheduler.rs]
/*!
 * =================================================================
 * APARATO: SCHEDULED TASK REPOSITORY (ESTRATO L3)
 * RESPONSABILIDAD: Cola de tareas durable que reemplaza una cadena de
 * `setTimeout`/`runAfter` en memoria. Una tarea encolada sobrevive un
 * reinicio del proceso porque vive en la tabla `scheduled_tasks`, no en
 * un temporizador del runtime.
 *
 * # Mathematical Proof (Claim Exclusivity):
 * Al envolver la búsqueda y la transición de estado de una tarea en una
 * única transacción serializable, dos despachadores concurrentes nunca
 * pueden reclamar la misma fila: el segundo ve el `UPDATE` del primero
 * ya comprometido o aborta por conflicto de escritura.
 * =================================================================
 */

use capitol_domain_models::task::{ScheduledTask, TaskKind, TaskPayload, TaskStatus};
use chrono::{Duration, Utc};
use libsql::{params, Connection};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::DbError;

/// Cuánto tiempo puede quedar una tarea en `claimed` sin completarse
/// antes de considerarse abandonada por un worker caído.
const STALE_CLAIM_THRESHOLD_MINUTES: i64 = 15;

pub struct SchedulerRepository {
    connection: Connection,
}

impl SchedulerRepository {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    #[instrument(skip(self, payload))]
    pub async fn enqueue(&self, kind: TaskKind, payload: &TaskPayload, run_at: &str) -> Result<String, DbError> {
        let id = Uuid::new_v4().to_string();
        let payload_json = serde_json::to_string(payload).map_err(|e| DbError::MappingError(e.to_string()))?;

        self.connection
            .execute(
                r#"
                INSERT INTO scheduled_tasks (id, kind, payload_json, run_at, status)
                VALUES (?1, ?2, ?3, ?4, 'pending')
                "#,
                params![id.clone(), kind.as_str(), payload_json, run_at],
            )
            .await?;

        info!(task_id = %id, kind = kind.as_str(), run_at, "task enqueued");
        Ok(id)
    }

    /// Reclama atómicamente la tarea debida más antigua: primero intenta
    /// recuperar una tarea `claimed` abandonada (un despachador que murió
    /// a mitad de ejecución), y solo si no hay ninguna, expande la
    /// frontera reclamando la próxima tarea `pending` cuyo `run_at` ya
    /// venció.
    #[instrument(skip(self))]
    pub async fn claim_due_task(&self) -> Result<Option<ScheduledTask>, DbError> {
        let now = Utc::now();
        let stale_threshold = (now - Duration::minutes(STALE_CLAIM_THRESHOLD_MINUTES)).to_rfc3339();
        let now_str = now.to_rfc3339();

        let tx = self
            .connection
            .transaction()
            .await
            .map_err(|_| DbError::TransactionError)?;

        let mut stale_rows = tx
            .query(
                r#"
                SELECT id FROM scheduled_tasks
                WHERE status = 'claimed' AND claimed_at < ?1
                ORDER BY claimed_at ASC
                LIMIT 1
                "#,
                params![stale_threshold],
            )
            .await?;

        let reclaimed_id: Option<String> = match stale_rows.next().await? {
            Some(row) => Some(row.get(0)?),
            None => None,
        };
        drop(stale_rows);

        let claimed_id = if let Some(id) = reclaimed_id {
            tx.execute(
                "UPDATE scheduled_tasks SET claimed_at = ?2 WHERE id = ?1",
                params![id.clone(), now_str.clone()],
            )
            .await?;
            warn!(task_id = %id, "reclaimed stale task from a dead dispatcher");
            Some(id)
        } else {
            let mut due_rows = tx
                .query(
                    r#"
                    SELECT id FROM scheduled_tasks
                    WHERE status = 'pending' AND run_at <= ?1
                    ORDER BY run_at ASC
                    LIMIT 1
                    "#,
                    params![now_str.clone()],
                )
                .await?;

            match due_rows.next().await? {
                Some(row) => {
                    let id: String = row.get(0)?;
                    drop(due_rows);
                    tx.execute(
                        "UPDATE scheduled_tasks SET status = 'claimed', claimed_at = ?2 WHERE id = ?1",
                        params![id.clone(), now_str.clone()],
                    )
                    .await?;
                    Some(id)
                }
                None => None,
            }
        };

        let Some(id) = claimed_id else {
            tx.commit().await.map_err(|_| DbError::TransactionError)?;
            return Ok(None);
        };

        let mut row_result = tx
            .query("SELECT * FROM scheduled_tasks WHERE id = ?1", params![id.clone()])
            .await?;
        let row = row_result
            .next()
            .await?
            .ok_or_else(|| DbError::MappingError("claimed task vanished mid-transaction".into()))?;
        let task = map_row_to_task(
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
        )?;
        drop(row_result);

        tx.commit().await.map_err(|_| DbError::TransactionError)?;
        Ok(Some(task))
    }

    pub async fn mark_done(&self, id: &str) -> Result<(), DbError> {
        let affected = self
            .connection
            .execute("UPDATE scheduled_tasks SET status = 'done' WHERE id = ?1", params![id])
            .await?;
        if affected == 0 {
            return Err(DbError::TaskNotFound);
        }
        Ok(())
    }

    /// Reintenta una tarea fallida de forma transitoria: vuelve a
    /// `pending` con un `run_at` futuro, para que el despachador la
    /// recoja de nuevo tras el backoff.
    pub async fn retry_later(&self, id: &str, run_at: &str) -> Result<(), DbError> {
        let affected = self
            .connection
            .execute(
                "UPDATE scheduled_tasks SET status = 'pending', run_at = ?2, claimed_at = NULL WHERE id = ?1",
                params![id, run_at],
            )
            .await?;
        if affected == 0 {
            return Err(DbError::TaskNotFound);
        }
        Ok(())
    }

    /// Sella una tarea como definitivamente fallida; no se reintentará más.
    pub async fn mark_dead(&self, id: &str) -> Result<(), DbError> {
        let affected = self
            .connection
            .execute("UPDATE scheduled_tasks SET status = 'failed' WHERE id = ?1", params![id])
            .await?;
        if affected == 0 {
            return Err(DbError::TaskNotFound);
        }
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn map_row_to_task(
    id: String,
    kind: String,
    payload_json: String,
    run_at: String,
    status: String,
    claimed_at: Option<String>,
    created_at: String,
) -> Result<ScheduledTask, DbError> {
    let kind: TaskKind = kind
        .parse()
        .map_err(|e: String| DbError::MappingError(e))?;
    let status = match status.as_str() {
        "pending" => TaskStatus::Pending,
        "claimed" => TaskStatus::Claimed,
        "done" => TaskStatus::Done,
        "failed" => TaskStatus::Failed,
        other => return Err(DbError::MappingError(format!("unrecognized task status: {other}"))),
    };
    let payload: TaskPayload = serde_json::from_str(&payload_json).map_err(|e| DbError::MappingError(e.to_string()))?;

    Ok(ScheduledTask {
        id,
        kind,
        payload,
        run_at,
        status,
        claimed_at,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use libsql::Builder;

    async fn test_connection() -> Connection {
        let db = Builder::new_local("file::memory:?cache=shared").build().await.unwrap();
        let conn = db.connect().unwrap();
        crate::schema::apply_full_schema(&conn).await.unwrap();
        conn
    }

    #[tokio::test]
    async fn claims_pending_task_due_in_the_past() {
        let repo = SchedulerRepository::new(test_connection().await);
        let past = (Utc::now() - Duration::minutes(1)).to_rfc3339();
        let id = repo
            .enqueue(TaskKind::CronIncremental, &TaskPayload::default(), &past)
            .await
            .unwrap();

        let claimed = repo.claim_due_task().await.unwrap().unwrap();
        assert_eq!(claimed.id, id);
        assert_eq!(claimed.status, TaskStatus::Claimed);
    }

    #[tokio::test]
    async fn does_not_claim_task_scheduled_in_the_future() {
        let repo = SchedulerRepository::new(test_connection().await);
        let future = (Utc::now() + Duration::hours(1)).to_rfc3339();
        repo.enqueue(TaskKind::CronFull, &TaskPayload::default(), &future)
            .await
            .unwrap();

        assert!(repo.claim_due_task().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn same_task_is_never_claimed_twice_concurrently() {
        let repo = SchedulerRepository::new(test_connection().await);
        let past = (Utc::now() - Duration::minutes(1)).to_rfc3339();
        repo.enqueue(TaskKind::SyncBatch, &TaskPayload::default(), &past)
            .await
            .unwrap();

        let first = repo.claim_due_task().await.unwrap();
        let second = repo.claim_due_task().await.unwrap();
        assert!(first.is_some());
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn retry_later_returns_task_to_pending() {
        let repo = SchedulerRepository::new(test_connection().await);
        let past = (Utc::now() - Duration::minutes(1)).to_rfc3339();
        let id = repo
            .enqueue(TaskKind::RepairBatch, &TaskPayload::default(), &past)
            .await
            .unwrap();
        repo.claim_due_task().await.unwrap();

        let retry_at = (Utc::now() - Duration::seconds(1)).to_rfc3339();
        repo.retry_later(&id, &retry_at).await.unwrap();

        let reclaimed = repo.claim_due_task().await.unwrap().unwrap();
        assert_eq!(reclaimed.id, id);
        assert_eq!(reclaimed.status, TaskStatus::Claimed);
    }
}
