// [libs/infra/db/src/repositories/system_state.rs]
/*!
 * APARATO: SYSTEM STATE REPOSITORY (ESTRATO L3)
 * RESPONSABILIDAD: Un pequeño almacén clave-valor para guardas de
 * idempotencia que no pertenecen a ninguna entidad del catálogo
 * legislativo — concretamente, la fecha UTC en la que cada disparador
 * de cron encendió por última vez, para que un reinicio de proceso a
 * mitad de minuto no lo dispare dos veces el mismo día/semana.
 */

use libsql::{params, Connection};

use crate::errors::DbError;

pub struct SystemStateRepository {
    connection: Connection,
}

impl SystemStateRepository {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, DbError> {
        let mut rows = self
            .connection
            .query(
                "SELECT state_value FROM system_state WHERE state_key = ?1",
                params![key],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), DbError> {
        self.connection
            .execute(
                r#"
                INSERT INTO system_state (state_key, state_value) VALUES (?1, ?2)
                ON CONFLICT(state_key) DO UPDATE SET state_value = excluded.state_value
                "#,
                params![key, value],
            )
            .await?;
        Ok(())
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
    async fn unset_key_reads_as_none() {
        let repo = SystemStateRepository::new(test_connection().await);
        assert_eq!(repo.get("cron_incremental_last_fired").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_then_get_round_trips_and_overwrites() {
        let repo = SystemStateRepository::new(test_connection().await);
        repo.set("cron_incremental_last_fired", "2026-07-20").await.unwrap();
        assert_eq!(
            repo.get("cron_incremental_last_fired").await.unwrap(),
            Some("2026-07-20".to_string())
        );

        repo.set("cron_incremental_last_fired", "2026-07-21").await.unwrap();
        assert_eq!(
            repo.get("cron_incremental_last_fired").await.unwrap(),
            Some("2026-07-21".to_string())
        );
    }
}
