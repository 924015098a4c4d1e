// [libs/domain/models/src/snapshot.rs]
/*!
 * APARATO: SYNC SNAPSHOT ENTITY (ESTRATO L2)
 * RESPONSABILIDAD: Rastro durable de una ejecución de sincronización
 * orquestada; soporta reporte de progreso y detección de corridas
 * estancadas.
 */

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncType {
    Incremental,
    Full,
    Historical,
    Repair,
    Backfill,
}

impl SyncType {
    pub const fn as_str(self) -> &'static str {
        match self {
            SyncType::Incremental => "incremental",
            SyncType::Full => "full",
            SyncType::Historical => "historical",
            SyncType::Repair => "repair",
            SyncType::Backfill => "backfill",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Running,
    Completed,
    Failed,
}

impl SyncStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            SyncStatus::Running => "running",
            SyncStatus::Completed => "completed",
            SyncStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSnapshot {
    pub id: String,
    pub sync_type: SyncType,
    pub congress: i32,
    pub status: SyncStatus,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub total_processed: i64,
    pub total_success: i64,
    pub total_failed: i64,
    pub error_details: Option<String>,
}
