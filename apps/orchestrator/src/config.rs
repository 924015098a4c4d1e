// [apps/orchestrator/src/config.rs]
/*!
 * APARATO: SOVEREIGN WORKER DIRECTIVES (ESTRATO L1-APP)
 * RESPONSABILIDAD: Única fuente de verdad para los parámetros de ajuste
 * del pipeline de ingesta, vinculada tanto a la línea de comandos como
 * al entorno. Ningún componente lee `std::env` directamente fuera de
 * este módulo y de `main.rs`.
 */

use std::time::Duration;

use clap::Parser;

/// Directivas de ajuste inyectadas en cada componente del pipeline.
#[derive(Debug, Clone, Parser)]
#[command(name = "capitol-orchestrator", about = "Congress bill ingestion service")]
pub struct Config {
    /// Clave de API de congress.gov; el Fetcher rehúsa arrancar sin ella.
    #[arg(long, env = "CONGRESS_API_KEY")]
    pub congress_api_key: String,

    /// Secreto compartido que protege las rutas de disparo manual.
    #[arg(long, env = "SYNC_AUTH_TOKEN")]
    pub sync_auth_token: Option<String>,

    /// Cadena de conexión del almacén libSQL.
    #[arg(long, env = "DATABASE_URL", default_value = "file:capitol-sync.db")]
    pub database_url: String,

    /// Token de acceso para un objetivo libSQL/Turso remoto.
    #[arg(long, env = "DATABASE_AUTH_TOKEN")]
    pub database_auth_token: Option<String>,

    /// Puerto de escucha de la superficie de control HTTP.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Tamaño de página al listar bills (B); el tope superior de la API es 250.
    #[arg(long, env = "BATCH_SIZE", default_value_t = 50)]
    pub batch_size: u32,

    /// Espaciado mínimo entre peticiones salientes consecutivas (D_req), en ms.
    #[arg(long, env = "INTER_REQUEST_DELAY_MS", default_value_t = 750)]
    pub inter_request_delay_ms: u64,

    /// Presupuesto de reintentos ante 429 antes de declarar la obtención fallida.
    #[arg(long, env = "MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,

    /// Retardo base del backoff exponencial (B), en segundos.
    #[arg(long, env = "INITIAL_BACKOFF_SECS", default_value_t = 10)]
    pub initial_backoff_secs: u64,

    /// Fallos consecutivos dentro de una página que disparan el cortacircuitos.
    #[arg(long, env = "CONSECUTIVE_FAIL_LIMIT", default_value_t = 5)]
    pub consecutive_fail_limit: u32,

    /// Ventana retrospectiva de `incrementalSync`, en horas.
    #[arg(long, env = "INCREMENTAL_LOOKBACK_HOURS", default_value_t = 26)]
    pub incremental_lookback_hours: i64,

    /// Ventana retrospectiva de `fullSync`, en días.
    #[arg(long, env = "FULL_LOOKBACK_DAYS", default_value_t = 7)]
    pub full_lookback_days: i64,

    /// Escalonamiento entre cadenas de tipo de proyecto de ley para una
    /// sincronización incremental, en milisegundos.
    #[arg(long, env = "INCREMENTAL_STAGGER_MS", default_value_t = 120_000)]
    pub incremental_stagger_ms: u64,

    /// Escalonamiento entre cadenas de tipo de proyecto de ley para una
    /// sincronización completa o histórica, en milisegundos.
    #[arg(long, env = "FULL_STAGGER_MS", default_value_t = 600_000)]
    pub full_stagger_ms: u64,

    /// Concurrencia máxima del despachador de tareas programadas.
    #[arg(long, env = "DISPATCHER_CONCURRENCY", default_value_t = 4)]
    pub dispatcher_concurrency: usize,
}

impl Config {
    pub fn inter_request_delay(&self) -> Duration {
        Duration::from_millis(self.inter_request_delay_ms)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_secs(self.initial_backoff_secs)
    }

    pub fn incremental_stagger(&self) -> Duration {
        Duration::from_millis(self.incremental_stagger_ms)
    }

    pub fn full_stagger(&self) -> Duration {
        Duration::from_millis(self.full_stagger_ms)
    }
}
