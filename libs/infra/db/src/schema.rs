// [libs/infra/db/src/schema.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN DATABASE SCHEMA (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * # Mathematical Proof (Idempotent Convergence):
 * Cada sentencia es `CREATE ... IF NOT EXISTS` o una migración tolerante
 * a "duplicate column name"; aplicar este módulo N veces sobre el mismo
 * enlace converge al mismo esquema que aplicarlo una vez.
 * =================================================================
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument, warn};

/**
 * ESTRATO 1: SOLIDIFICACIÓN (Génesis de Tablas)
 */
const TACTICAL_TABLES: &[(&str, &str)] = &[
    ("TABLE_BILLS", r#"
        CREATE TABLE IF NOT EXISTS bills (
            bill_id TEXT PRIMARY KEY,
            congress INTEGER NOT NULL,
            bill_type TEXT NOT NULL,
            bill_number INTEGER NOT NULL,
            title TEXT NOT NULL DEFAULT '',
            title_without_number TEXT NOT NULL DEFAULT '',
            introduced_date TEXT NOT NULL DEFAULT '',
            sponsor_first_name TEXT,
            sponsor_last_name TEXT,
            sponsor_party TEXT,
            sponsor_state TEXT,
            stage INTEGER NOT NULL DEFAULT 20,
            stage_description TEXT NOT NULL DEFAULT 'Introduced',
            synced_endpoints INTEGER,
            last_sync_attempt TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_BILL_ACTIONS", r#"
        CREATE TABLE IF NOT EXISTS bill_actions (
            bill_id TEXT NOT NULL,
            action_code TEXT NOT NULL,
            action_date TEXT NOT NULL,
            source_system_code INTEGER,
            source_system_name TEXT,
            text TEXT NOT NULL DEFAULT '',
            action_type TEXT,
            PRIMARY KEY (bill_id, action_date, action_code)
        );
    "#),
    ("TABLE_BILL_SUBJECTS", r#"
        CREATE TABLE IF NOT EXISTS bill_subjects (
            bill_id TEXT PRIMARY KEY,
            policy_area_name TEXT NOT NULL,
            policy_area_update_date TEXT
        );
    "#),
    ("TABLE_BILL_SUMMARIES", r#"
        CREATE TABLE IF NOT EXISTS bill_summaries (
            bill_id TEXT NOT NULL,
            version_code TEXT NOT NULL,
            action_date TEXT NOT NULL DEFAULT '',
            action_desc TEXT NOT NULL DEFAULT '',
            text TEXT NOT NULL DEFAULT '',
            update_date TEXT NOT NULL,
            PRIMARY KEY (bill_id, version_code)
        );
    "#),
    ("TABLE_BILL_TEXTS", r#"
        CREATE TABLE IF NOT EXISTS bill_texts (
            bill_id TEXT NOT NULL,
            date TEXT NOT NULL,
            version_type TEXT NOT NULL,
            text_url TEXT,
            pdf_url TEXT,
            PRIMARY KEY (bill_id, date, version_type)
        );
    "#),
    ("TABLE_SYNC_SNAPSHOTS", r#"
        CREATE TABLE IF NOT EXISTS sync_snapshots (
            id TEXT PRIMARY KEY,
            sync_type TEXT NOT NULL,
            congress INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'running',
            started_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            completed_at TEXT,
            total_processed INTEGER NOT NULL DEFAULT 0,
            total_success INTEGER NOT NULL DEFAULT 0,
            total_failed INTEGER NOT NULL DEFAULT 0,
            error_details TEXT
        );
    "#),
    ("TABLE_CONGRESS_STATS", r#"
        CREATE TABLE IF NOT EXISTS congress_stats (
            congress INTEGER PRIMARY KEY,
            total_count INTEGER NOT NULL DEFAULT 0,
            house_count INTEGER NOT NULL DEFAULT 0,
            senate_count INTEGER NOT NULL DEFAULT 0,
            stage_counts_json TEXT NOT NULL DEFAULT '{}',
            top_policy_areas_json TEXT NOT NULL DEFAULT '[]',
            top_sponsors_json TEXT NOT NULL DEFAULT '[]',
            timeline_metrics_json TEXT NOT NULL DEFAULT '[]',
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_SCHEDULED_TASKS", r#"
        CREATE TABLE IF NOT EXISTS scheduled_tasks (
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            payload_json TEXT NOT NULL DEFAULT '{}',
            run_at TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            claimed_at TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_SYSTEM_STATE", r#"
        CREATE TABLE IF NOT EXISTS system_state (
            state_key TEXT PRIMARY KEY,
            state_value TEXT NOT NULL
        );
    "#),
    ("TABLE_SYNC_SNAPSHOT_PROGRESS", r#"
        CREATE TABLE IF NOT EXISTS sync_snapshot_progress (
            snapshot_id TEXT NOT NULL,
            bill_type TEXT NOT NULL,
            processed INTEGER NOT NULL DEFAULT 0,
            success INTEGER NOT NULL DEFAULT 0,
            failed INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (snapshot_id, bill_type)
        );
    "#),
];

/**
 * ESTRATO 2: EVOLUCIÓN (Mutaciones de Columna)
 * Vacío por ahora; preservado como punto de extensión para migraciones
 * incrementales futuras sin romper instalaciones existentes.
 */
const EVOLUTIONARY_STRATA: &[(&str, &str)] = &[];

/**
 * ESTRATO 3: ENDURECIMIENTO (Índices de Aceleración)
 */
const ACCELERATION_INDEXES: &[(&str, &str)] = &[
    ("IDX_BILLS_STAGE", "CREATE INDEX IF NOT EXISTS idx_bills_stage ON bills(stage);"),
    (
        "IDX_BILLS_SYNCED_ENDPOINTS",
        "CREATE INDEX IF NOT EXISTS idx_bills_synced_endpoints ON bills(synced_endpoints);",
    ),
    (
        "IDX_BILLS_CONGRESS_TYPE",
        "CREATE INDEX IF NOT EXISTS idx_bills_congress_type ON bills(congress, bill_type);",
    ),
    (
        "IDX_BILL_ACTIONS_BILL_ID",
        "CREATE INDEX IF NOT EXISTS idx_bill_actions_bill_id ON bill_actions(bill_id);",
    ),
    (
        "IDX_SCHEDULED_TASKS_DISPATCH",
        "CREATE INDEX IF NOT EXISTS idx_scheduled_tasks_dispatch ON scheduled_tasks(status, run_at);",
    ),
];

#[instrument(skip(database_connection))]
pub async fn apply_full_schema(database_connection: &Connection) -> Result<()> {
    info!("applying database schema");

    solidify_base_strata(database_connection).await?;
    execute_evolutionary_repair(database_connection).await?;
    harden_access_layer(database_connection).await?;

    info!("schema applied and certified");
    Ok(())
}

async fn solidify_base_strata(db: &Connection) -> Result<()> {
    for (identifier, sql) in TACTICAL_TABLES {
        debug!("  solidifying: {}", identifier);
        db.execute(*sql, ())
            .await
            .with_context(|| format!("table solidification failed: {identifier}"))?;
    }
    Ok(())
}

async fn execute_evolutionary_repair(db: &Connection) -> Result<()> {
    for (identifier, sql) in EVOLUTIONARY_STRATA {
        match db.execute(*sql, ()).await {
            Ok(_) => info!("  applied evolutionary stratum {}", identifier),
            Err(e) => {
                let message = e.to_string();
                if message.contains("duplicate column name") {
                    debug!("  {} already level", identifier);
                } else {
                    warn!("  {} check incomplete: {}", identifier, message);
                }
            }
        }
    }
    Ok(())
}

async fn harden_access_layer(db: &Connection) -> Result<()> {
    for (identifier, sql) in ACCELERATION_INDEXES {
        debug!("  hardening: {}", identifier);
        db.execute(*sql, ())
            .await
            .with_context(|| format!("index hardening failed: {identifier}"))?;
    }
    Ok(())
}
