// [libs/domain/models/src/task.rs]
/*!
 * APARATO: SCHEDULED TASK ENTITY (ESTRATO L2, AMBIENTE)
 * RESPONSABILIDAD: Representación durable de un paso auto-programado de
 * una cadena (página de lote, reparación, recómputo, disparo de cron).
 *
 * Esta entidad no forma parte del modelo analítico de §3 de la
 * especificación; es el sustrato concreto del "persistent job queue with
 * delayed enqueue" que las Notas de Diseño piden en reemplazo de un
 * temporizador en memoria.
 */

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    SyncBatch,
    RepairBatch,
    BackfillBatch,
    RecomputeStats,
    CronIncremental,
    CronFull,
    CronRepair,
    CronRecomputeStats,
}

impl TaskKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            TaskKind::SyncBatch => "sync_batch",
            TaskKind::RepairBatch => "repair_batch",
            TaskKind::BackfillBatch => "backfill_batch",
            TaskKind::RecomputeStats => "recompute_stats",
            TaskKind::CronIncremental => "cron_incremental",
            TaskKind::CronFull => "cron_full",
            TaskKind::CronRepair => "cron_repair",
            TaskKind::CronRecomputeStats => "cron_recompute_stats",
        }
    }
}

impl std::str::FromStr for TaskKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "sync_batch" => Ok(TaskKind::SyncBatch),
            "repair_batch" => Ok(TaskKind::RepairBatch),
            "backfill_batch" => Ok(TaskKind::BackfillBatch),
            "recompute_stats" => Ok(TaskKind::RecomputeStats),
            "cron_incremental" => Ok(TaskKind::CronIncremental),
            "cron_full" => Ok(TaskKind::CronFull),
            "cron_repair" => Ok(TaskKind::CronRepair),
            "cron_recompute_stats" => Ok(TaskKind::CronRecomputeStats),
            other => Err(format!("unrecognized task kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Claimed,
    Done,
    Failed,
}

impl TaskStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Claimed => "claimed",
            TaskStatus::Done => "done",
            TaskStatus::Failed => "failed",
        }
    }
}

/// Cuerpo de una tarea programada, serializado a JSON en la columna
/// `payload_json`. Todos los campos son opcionales a nivel de struct
/// porque cada variante de `TaskKind` usa un subconjunto distinto.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPayload {
    pub snapshot_id: Option<String>,
    pub congress: Option<i32>,
    pub bill_type: Option<String>,
    pub offset: Option<i32>,
    pub updated_since: Option<String>,
    /// Cuenta absoluta acumulada de esta cadena antes de la página que
    /// esta tarea procesa; sólo usado por `SyncBatch`, para que cada
    /// página escriba el total de su propia porción, no un delta.
    pub chain_success: Option<i64>,
    pub chain_failed: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: String,
    pub kind: TaskKind,
    pub payload: TaskPayload,
    pub run_at: String,
    pub status: TaskStatus,
    pub claimed_at: Option<String>,
    pub created_at: String,
}
