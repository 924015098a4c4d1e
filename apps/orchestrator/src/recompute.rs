// [apps/orchestrator/src/recompute.rs]
/*!
 * APARATO: AGGREGATE RECOMPUTER BINDING (ESTRATO L1-APP)
 * RESPONSABILIDAD: Puente delgado entre los disparadores de la
 * aplicación (fin de lote, cron diario, superficie de control) y
 * `StatsRepository::recompute`, que hace todo el trabajo real en SQL.
 */

use tracing::warn;

use crate::state::AppState;

pub async fn recompute_congress_stats(state: &AppState, congress: i32) {
    let Ok(stats) = state.stats() else {
        return;
    };
    if let Err(error) = stats.recompute(congress).await {
        warn!(congress, %error, "failed to recompute congress stats");
    }
}

/// Recalcula los agregados de todos los congresos con al menos un bill
/// almacenado; invocado por el cron diario y por la ruta de control
/// `recomputeAllStats`.
pub async fn recompute_all_known_congresses(state: &AppState) {
    let Ok(bills) = state.bills() else {
        return;
    };
    let congresses = match bills.distinct_congresses().await {
        Ok(list) => list,
        Err(error) => {
            warn!(%error, "failed to list known congresses for stats recompute");
            return;
        }
    };

    for congress in congresses {
        recompute_congress_stats(state, congress).await;
    }
}
