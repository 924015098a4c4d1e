// [libs/infra/db/src/lib.rs]
/*!
 * =================================================================
 * APARATO: STORE WRITER (ESTRATO L3)
 * RESPONSABILIDAD: Único punto de acceso al sustrato de persistencia
 * libSQL: conexión, esquema y repositorios por entidad.
 * =================================================================
 */

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;

pub use client::DbClient;
pub use errors::DbError;
pub use repositories::{
    ActionRepository, BillRepository, SchedulerRepository, SnapshotRepository, StatsRepository,
    SubjectRepository, SummaryRepository, SystemStateRepository, TextRepository,
};
