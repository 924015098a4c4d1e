// [apps/orchestrator/src/cron.rs]
/*!
 * APARATO: CRON PACEMAKER (ESTRATO L1-APP)
 * RESPONSABILIDAD: Late el reloj de pared UTC cada minuto y encola las
 * cuatro corridas automáticas contra la cola durable de tareas. Guarda
 * la fecha UTC del último disparo de cada horario en `system_state`
 * para que un reinicio del proceso a mitad de hora no dispare la misma
 * corrida dos veces en el mismo día.
 */

use std::sync::Arc;

use capitol_domain_models::task::{TaskKind, TaskPayload};
use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::state::AppState;

const TICK_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

struct CronSchedule {
    state_key: &'static str,
    task_kind: TaskKind,
    hour: u32,
    weekday: Option<Weekday>,
}

/// Incremental diaria 01:00 UTC, completa semanal domingo 02:00 UTC,
/// reparación semanal miércoles 03:00 UTC, recómputo de agregados
/// diario 04:00 UTC.
const SCHEDULES: &[CronSchedule] = &[
    CronSchedule {
        state_key: "cron_incremental_last_fired",
        task_kind: TaskKind::CronIncremental,
        hour: 1,
        weekday: None,
    },
    CronSchedule {
        state_key: "cron_full_last_fired",
        task_kind: TaskKind::CronFull,
        hour: 2,
        weekday: Some(Weekday::Sun),
    },
    CronSchedule {
        state_key: "cron_repair_last_fired",
        task_kind: TaskKind::CronRepair,
        hour: 3,
        weekday: Some(Weekday::Wed),
    },
    CronSchedule {
        state_key: "cron_recompute_stats_last_fired",
        task_kind: TaskKind::CronRecomputeStats,
        hour: 4,
        weekday: None,
    },
];

/// Late indefinidamente; pensado para correr como tarea de fondo junto
/// al despachador y a la superficie HTTP.
pub async fn run(state: Arc<AppState>) {
    let mut ticker = interval(TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let now = Utc::now();
        for schedule in SCHEDULES {
            if let Err(error) = check_and_fire(&state, schedule, now).await {
                error!(state_key = schedule.state_key, %error, "cron schedule check failed");
            }
        }
    }
}

fn schedule_matches(schedule: &CronSchedule, now: DateTime<Utc>) -> bool {
    if now.hour() != schedule.hour {
        return false;
    }
    match schedule.weekday {
        Some(weekday) => now.weekday() == weekday,
        None => true,
    }
}

async fn check_and_fire(
    state: &AppState,
    schedule: &CronSchedule,
    now: DateTime<Utc>,
) -> Result<(), capitol_infra_db::DbError> {
    if !schedule_matches(schedule, now) {
        return Ok(());
    }

    let today = now.format("%Y-%m-%d").to_string();
    let system_state = state.system_state()?;
    if system_state.get(schedule.state_key).await? == Some(today.clone()) {
        return Ok(());
    }

    let scheduler = state.scheduler()?;
    scheduler
        .enqueue(schedule.task_kind, &TaskPayload::default(), &now.to_rfc3339())
        .await?;
    system_state.set(schedule.state_key, &today).await?;

    info!(
        state_key = schedule.state_key,
        kind = schedule.task_kind.as_str(),
        fired_on = %today,
        "cron schedule fired"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use capitol_infra_congress_client::CongressApiClient;
    use capitol_infra_db::DbClient;
    use chrono::TimeZone;
    use std::sync::Arc;

    async fn test_state() -> AppState {
        let db = DbClient::connect("file::memory:?cache=shared", None).await.unwrap();
        let config = Arc::new(crate::config::Config {
            congress_api_key: "test-key".into(),
            sync_auth_token: None,
            database_url: "file::memory:?cache=shared".into(),
            database_auth_token: None,
            port: 0,
            batch_size: 50,
            inter_request_delay_ms: 1,
            max_retries: 1,
            initial_backoff_secs: 0,
            consecutive_fail_limit: 5,
            incremental_lookback_hours: 26,
            full_lookback_days: 7,
            incremental_stagger_ms: 1,
            full_stagger_ms: 1,
            dispatcher_concurrency: 1,
        });
        let client = Arc::new(CongressApiClient::new("test-key").unwrap());
        AppState::new(config, db, client)
    }

    #[test]
    fn weekly_schedule_only_matches_its_named_weekday() {
        let full = &SCHEDULES[1];
        let sunday_one_am = Utc.with_ymd_and_hms(2026, 7, 26, 2, 0, 0).unwrap();
        let monday_one_am = Utc.with_ymd_and_hms(2026, 7, 27, 2, 0, 0).unwrap();
        assert!(schedule_matches(full, sunday_one_am));
        assert!(!schedule_matches(full, monday_one_am));
    }

    #[tokio::test]
    async fn firing_once_guards_against_a_second_fire_same_day() {
        let state = test_state().await;
        let incremental = &SCHEDULES[0];
        let at_one_am = Utc.with_ymd_and_hms(2026, 7, 27, 1, 0, 0).unwrap();

        check_and_fire(&state, incremental, at_one_am).await.unwrap();
        check_and_fire(&state, incremental, at_one_am + chrono::Duration::seconds(30))
            .await
            .unwrap();

        let scheduler = state.scheduler().unwrap();
        let first = scheduler.claim_due_task().await.unwrap();
        assert!(first.is_some());
        let second = scheduler.claim_due_task().await.unwrap();
        assert!(second.is_none());
    }
}
