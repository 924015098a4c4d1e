// [libs/infra/db/src/repositories/snapshot.rs]
/*!
 * APARATO: SYNC SNAPSHOT REPOSITORY (ESTRATO L3)
 * RESPONSABILIDAD: Rastro durable de una corrida de sincronización. Hasta
 * ocho cadenas (una por tipo de proyecto de ley) comparten la misma fila
 * de instantánea y pueden reportar su página concurrentemente, así que
 * cada cadena escribe el valor absoluto acumulado de su propia porción
 * (derivado de su `offset`) en `sync_snapshot_progress`, nunca un delta;
 * el total de la instantánea es la suma de esas porciones, recalculada
 * en la misma transacción que la escritura de la porción. Dos cadenas
 * nunca se pisan entre sí porque cada una es dueña de su propia fila de
 * progreso.
 */

use capitol_domain_models::snapshot::{SyncSnapshot, SyncStatus, SyncType};
use libsql::{params, Connection};
use uuid::Uuid;

use crate::errors::DbError;

pub struct SnapshotRepository {
    connection: Connection,
}

impl SnapshotRepository {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    pub async fn create(&self, sync_type: SyncType, congress: i32) -> Result<String, DbError> {
        let id = Uuid::new_v4().to_string();
        self.connection
            .execute(
                r#"
                INSERT INTO sync_snapshots (id, sync_type, congress, status)
                VALUES (?1, ?2, ?3, 'running')
                "#,
                params![id.clone(), sync_type.as_str(), congress],
            )
            .await?;
        Ok(id)
    }

    /// Registra el valor absoluto acumulado de progreso de una cadena
    /// `(snapshot_id, bill_type)` — no un delta de esta página — y
    /// recalcula el total de la instantánea como la suma de todas las
    /// porciones conocidas, dentro de la misma transacción. Sobrescribir
    /// con un absoluto (en vez de incrementar) hace que reintentar el
    /// reporte de una página ya contabilizada sea un no-op en vez de
    /// contarla dos veces.
    pub async fn add_progress(
        &self,
        id: &str,
        bill_type: &str,
        chain_processed: i64,
        chain_success: i64,
        chain_failed: i64,
    ) -> Result<(), DbError> {
        let tx = self
            .connection
            .transaction()
            .await
            .map_err(|_| DbError::TransactionError)?;

        tx.execute(
            r#"
            INSERT INTO sync_snapshot_progress (snapshot_id, bill_type, processed, success, failed)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(snapshot_id, bill_type) DO UPDATE SET
                processed = excluded.processed,
                success = excluded.success,
                failed = excluded.failed
            "#,
            params![id, bill_type, chain_processed, chain_success, chain_failed],
        )
        .await?;

        tx.execute(
            r#"
            UPDATE sync_snapshots
            SET total_processed = (SELECT COALESCE(SUM(processed), 0) FROM sync_snapshot_progress WHERE snapshot_id = ?1),
                total_success = (SELECT COALESCE(SUM(success), 0) FROM sync_snapshot_progress WHERE snapshot_id = ?1),
                total_failed = (SELECT COALESCE(SUM(failed), 0) FROM sync_snapshot_progress WHERE snapshot_id = ?1)
            WHERE id = ?1
            "#,
            params![id],
        )
        .await?;

        tx.commit().await.map_err(|_| DbError::TransactionError)?;
        Ok(())
    }

    pub async fn complete(&self, id: &str) -> Result<(), DbError> {
        self.connection
            .execute(
                r#"
                UPDATE sync_snapshots
                SET status = 'completed', completed_at = CURRENT_TIMESTAMP
                WHERE id = ?1
                "#,
                params![id],
            )
            .await?;
        Ok(())
    }

    pub async fn fail(&self, id: &str, error_details: &str) -> Result<(), DbError> {
        self.connection
            .execute(
                r#"
                UPDATE sync_snapshots
                SET status = 'failed', completed_at = CURRENT_TIMESTAMP, error_details = ?2
                WHERE id = ?1
                "#,
                params![id, error_details],
            )
            .await?;
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Option<SyncSnapshot>, DbError> {
        let mut rows = self
            .connection
            .query("SELECT * FROM sync_snapshots WHERE id = ?1", params![id])
            .await?;
        match rows.next().await? {
            Some(row) => {
                let sync_type_str: String = row.get(1)?;
                let status_str: String = row.get(3)?;
                Ok(Some(SyncSnapshot {
                    id: row.get(0)?,
                    sync_type: parse_sync_type(&sync_type_str)?,
                    congress: row.get(2)?,
                    status: parse_sync_status(&status_str)?,
                    started_at: row.get(4)?,
                    completed_at: row.get(5)?,
                    total_processed: row.get(6)?,
                    total_success: row.get(7)?,
                    total_failed: row.get(8)?,
                    error_details: row.get(9)?,
                }))
            }
            None => Ok(None),
        }
    }
}

fn parse_sync_type(value: &str) -> Result<SyncType, DbError> {
    match value {
        "incremental" => Ok(SyncType::Incremental),
        "full" => Ok(SyncType::Full),
        "historical" => Ok(SyncType::Historical),
        "repair" => Ok(SyncType::Repair),
        "backfill" => Ok(SyncType::Backfill),
        other => Err(DbError::MappingError(format!("unrecognized sync_type: {other}"))),
    }
}

fn parse_sync_status(value: &str) -> Result<SyncStatus, DbError> {
    match value {
        "running" => Ok(SyncStatus::Running),
        "completed" => Ok(SyncStatus::Completed),
        "failed" => Ok(SyncStatus::Failed),
        other => Err(DbError::MappingError(format!("unrecognized status: {other}"))),
    }
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
    async fn lifecycle_from_running_to_completed() {
        let repo = SnapshotRepository::new(test_connection().await);
        let id = repo.create(SyncType::Incremental, 119).await.unwrap();

        repo.add_progress(&id, "hr", 50, 48, 2).await.unwrap();
        repo.complete(&id).await.unwrap();

        let snapshot = repo.get(&id).await.unwrap().unwrap();
        assert_eq!(snapshot.status, SyncStatus::Completed);
        assert_eq!(snapshot.total_success, 48);
        assert!(snapshot.completed_at.is_some());
    }

    #[tokio::test]
    async fn concurrent_chains_both_land_on_the_shared_snapshot() {
        let repo = SnapshotRepository::new(test_connection().await);
        let id = repo.create(SyncType::Full, 119).await.unwrap();

        // Two bill-type chains, each reporting the absolute cumulative
        // count of its own slice; the snapshot total is their sum.
        repo.add_progress(&id, "hr", 50, 50, 0).await.unwrap();
        repo.add_progress(&id, "s", 12, 10, 2).await.unwrap();

        let snapshot = repo.get(&id).await.unwrap().unwrap();
        assert_eq!(snapshot.total_processed, 62);
        assert_eq!(snapshot.total_success, 60);
        assert_eq!(snapshot.total_failed, 2);
    }

    #[tokio::test]
    async fn resubmitting_the_same_chain_progress_does_not_double_count() {
        let repo = SnapshotRepository::new(test_connection().await);
        let id = repo.create(SyncType::Full, 119).await.unwrap();

        // A batch worker retrying a page it already reported sends the
        // same absolute cumulative value again; the total must not grow.
        repo.add_progress(&id, "hr", 50, 50, 0).await.unwrap();
        repo.add_progress(&id, "hr", 50, 50, 0).await.unwrap();

        let snapshot = repo.get(&id).await.unwrap().unwrap();
        assert_eq!(snapshot.total_processed, 50);
        assert_eq!(snapshot.total_success, 50);
    }
}
