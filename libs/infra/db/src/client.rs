// [libs/infra/db/src/client.rs]
/*!
 * =================================================================
 * APARATO: DATABASE CONNECTION CLIENT (ESTRATO L3)
 * RESPONSABILIDAD: GESTIÓN DE ENLACES Y BOOTSTRAP DE ESQUEMA
 *
 * # Mathematical Proof (In-Memory Consistency):
 * Para garantizar que el esquema sea visible entre hilos en modo RAM,
 * el cliente detecta URLs de memoria y abre un ancla de persistencia
 * antes del bootstrap, asegurando que las tablas residan en un
 * segmento de memoria compartido en vez de purgarse entre conexiones.
 * =================================================================
 */

use std::sync::Arc;

use libsql::{Builder, Connection, Database};
use tracing::{error, info, instrument};

use crate::errors::DbError;
use crate::schema::apply_full_schema;

#[derive(Clone)]
pub struct DbClient {
    driver: Arc<Database>,
    /// Mantiene viva la base de datos en memoria evitando que libSQL la purgue.
    _memory_persistence_anchor: Option<Arc<Connection>>,
}

impl DbClient {
    #[instrument(skip(access_token))]
    pub async fn connect(connection_url: &str, access_token: Option<String>) -> Result<Self, DbError> {
        if connection_url.is_empty() {
            return Err(DbError::ConnectionError("DATABASE_URL is undefined".into()));
        }

        info!(url = connection_url, "opening database link");

        let is_remote =
            connection_url.starts_with("libsql://") || connection_url.starts_with("https://");
        let is_memory = connection_url.contains(":memory:") || connection_url.contains("mode=memory");

        let driver = if is_remote {
            let token = access_token.ok_or_else(|| {
                DbError::ConnectionError("remote access denied: token missing".into())
            })?;
            Builder::new_remote(connection_url.to_string(), token)
                .build()
                .await
        } else {
            Builder::new_local(connection_url).build().await
        }
        .map_err(|e| DbError::ConnectionError(format!("driver ignition failure: {e}")))?;

        let driver = Arc::new(driver);
        let mut anchor = None;

        if is_memory {
            let anchor_conn = driver
                .connect()
                .map_err(|e| DbError::ConnectionError(format!("anchor fault: {e}")))?;
            apply_full_schema(&anchor_conn)
                .await
                .map_err(|e| DbError::ConnectionError(format!("schema sync fault: {e}")))?;
            anchor = Some(Arc::new(anchor_conn));
            info!("memory strata anchored");
        } else {
            let bootstrap_conn = driver
                .connect()
                .map_err(|e| DbError::ConnectionError(format!("bootstrap link fault: {e}")))?;
            apply_full_schema(&bootstrap_conn)
                .await
                .map_err(|e| DbError::ConnectionError(format!("schema sync fault: {e}")))?;
        }

        Ok(Self {
            driver,
            _memory_persistence_anchor: anchor,
        })
    }

    pub fn get_connection(&self) -> Result<Connection, DbError> {
        self.driver.connect().map_err(|e| {
            error!(error = %e, "connection allocation failed");
            DbError::ConnectionError(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connects_and_applies_schema_in_memory() {
        let client = DbClient::connect("file::memory:?cache=shared", None)
            .await
            .unwrap();
        let conn = client.get_connection().unwrap();
        let mut rows = conn
            .query("SELECT COUNT(*) FROM bills", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let count: i64 = row.get(0).unwrap();
        assert_eq!(count, 0);
    }
}
