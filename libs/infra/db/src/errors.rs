// [libs/infra/db/src/errors.rs]
/*!
 * APARATO: DATABASE ERROR CATALOG (ESTRATO L3)
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("CONNECTION_FAULT: database uplink severed -> {0}")]
    ConnectionError(String),

    #[error("CONFIG_FAULT: {0}")]
    ConfigurationError(String),

    #[error("QUERY_FAULT: {0}")]
    QueryError(#[from] libsql::Error),

    #[error("MAPPING_FAULT: {0}")]
    MappingError(String),

    #[error("TASK_FAULT: no due scheduled task was available to claim")]
    NoTaskAvailable,

    #[error("TASK_FAULT: scheduled task not found")]
    TaskNotFound,

    #[error("TRANSACTION_FAULT: transaction failed to commit")]
    TransactionError,
}
