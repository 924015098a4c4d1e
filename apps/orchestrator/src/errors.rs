// [apps/orchestrator/src/errors.rs]
/*!
 * APARATO: ORCHESTRATOR ERROR CATALOG (ESTRATO L1-APP)
 * RESPONSABILIDAD: Taxonomía tipada para las fallas propias de este
 * binario; el resto del árbol de llamadas se compone con `anyhow` en
 * los bordes (handlers de tareas, rutas, `main`).
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("CONFIG_FAULT: {0}")]
    Configuration(String),

    #[error("STORE_FAULT: {0}")]
    Store(#[from] capitol_infra_db::DbError),

    #[error("SNAPSHOT_FAULT: {0}")]
    Snapshot(String),
}
