// [apps/orchestrator/src/main.rs]
/*!
 * APARATO: BINARY ENTRY POINT (ESTRATO L1-APP)
 * RESPONSABILIDAD: Ensambla la configuración, la conexión a la base de
 * datos y el cliente HTTP, y levanta los tres procesos de fondo del
 * núcleo: el despachador de tareas, el marcapasos de cron y la
 * superficie de control.
 */

use std::sync::Arc;
use std::time::Duration;

use capitol_infra_congress_client::{CongressApiClient, FetcherTuning};
use capitol_infra_db::DbClient;
use capitol_orchestrator::{cron, dispatcher, routes, AppState, Config};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();

    capitol_shared_telemetry::init_tracing("capitol_orchestrator");

    let db = DbClient::connect(&config.database_url, config.database_auth_token.clone()).await?;

    let tuning = FetcherTuning {
        inter_request_spacing: config.inter_request_delay(),
        max_retries: config.max_retries,
        initial_backoff: config.initial_backoff(),
    };
    let congress_client = CongressApiClient::with_tuning(config.congress_api_key.clone(), tuning)?;

    let port = config.port;
    let state = AppState::new(Arc::new(config), db, Arc::new(congress_client));
    let shared_state = Arc::new(state.clone());

    tokio::spawn(dispatcher::run(Arc::clone(&shared_state)));
    tokio::spawn(cron::run(Arc::clone(&shared_state)));

    let app = routes::build_router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "control surface listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received, draining in-flight requests");
    tokio::time::sleep(Duration::from_millis(100)).await;
}
