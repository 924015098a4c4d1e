// [apps/orchestrator/src/state.rs]
/*!
 * APARATO: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: El único struct compartido entre rutas HTTP y
 * daemons de fondo; barato de clonar (un `Arc` por campo no trivial).
 */

use std::sync::Arc;

use capitol_infra_congress_client::CongressApiClient;
use capitol_infra_db::{
    ActionRepository, BillRepository, DbClient, SchedulerRepository, SnapshotRepository,
    StatsRepository, SubjectRepository, SummaryRepository, SystemStateRepository, TextRepository,
};

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: DbClient,
    pub congress_client: Arc<CongressApiClient>,
}

impl AppState {
    pub fn new(config: Arc<Config>, db: DbClient, congress_client: Arc<CongressApiClient>) -> Self {
        Self {
            config,
            db,
            congress_client,
        }
    }

    pub fn bills(&self) -> Result<BillRepository, capitol_infra_db::DbError> {
        Ok(BillRepository::new(self.db.get_connection()?))
    }

    pub fn actions(&self) -> Result<ActionRepository, capitol_infra_db::DbError> {
        Ok(ActionRepository::new(self.db.get_connection()?))
    }

    pub fn subjects(&self) -> Result<SubjectRepository, capitol_infra_db::DbError> {
        Ok(SubjectRepository::new(self.db.get_connection()?))
    }

    pub fn summaries(&self) -> Result<SummaryRepository, capitol_infra_db::DbError> {
        Ok(SummaryRepository::new(self.db.get_connection()?))
    }

    pub fn texts(&self) -> Result<TextRepository, capitol_infra_db::DbError> {
        Ok(TextRepository::new(self.db.get_connection()?))
    }

    pub fn snapshots(&self) -> Result<SnapshotRepository, capitol_infra_db::DbError> {
        Ok(SnapshotRepository::new(self.db.get_connection()?))
    }

    pub fn stats(&self) -> Result<StatsRepository, capitol_infra_db::DbError> {
        Ok(StatsRepository::new(self.db.get_connection()?))
    }

    pub fn scheduler(&self) -> Result<SchedulerRepository, capitol_infra_db::DbError> {
        Ok(SchedulerRepository::new(self.db.get_connection()?))
    }

    pub fn system_state(&self) -> Result<SystemStateRepository, capitol_infra_db::DbError> {
        Ok(SystemStateRepository::new(self.db.get_connection()?))
    }
}
