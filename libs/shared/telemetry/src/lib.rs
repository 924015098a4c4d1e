// [libs/shared/telemetry/src/lib.rs]
/*!
 * =================================================================
 * APARATO: STRUCTURED TELEMETRY (ESTRATO L4, AMBIENTE)
 * RESPONSABILIDAD: Inicialización del trazado estructurado y captura
 * de pánicos para los binarios del ecosistema.
 *
 * # Mathematical Proof (Observability Integrity):
 * El registro no bloqueante garantiza que el rastro de ejecución se
 * preserve incluso ante una terminación abrupta del proceso.
 * =================================================================
 */

use std::panic;

use tracing::{error, info, instrument};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as formatting_layer, EnvFilter};

/// Inicializa el trazado estructurado y el hook de pánico global.
///
/// - Desarrollo (`debug_assertions`): logs compactos y legibles.
/// - Producción: líneas JSON aplanadas, aptas para ingesta por un
///   agregador de logs externo.
///
/// # Panics
/// Entra en pánico si otro suscriptor global ya fue inicializado.
#[instrument(skip_all)]
pub fn init_tracing(service_name: &str) {
    let environmental_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "{}={level},tower_http=warn,hyper=warn,libsql=warn",
            service_name,
            level = if cfg!(debug_assertions) { "debug" } else { "info" }
        )
        .into()
    });

    let is_production = !cfg!(debug_assertions);

    if is_production {
        tracing_subscriber::registry()
            .with(environmental_filter)
            .with(formatting_layer::layer().json().flatten_event(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(environmental_filter)
            .with(formatting_layer::layer().compact().with_target(false))
            .init();
    }

    let service_id = service_name.to_string();
    panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown location".to_string());

        let payload = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| panic_info.payload().downcast_ref::<String>().map(|s| s.as_str()))
            .unwrap_or("no panic message");

        error!(
            target: "panic_monitor",
            service = %service_id,
            location = %location,
            "thread terminated abruptly: {}",
            payload
        );
    }));

    info!(service = service_name, "telemetry initialized");
}
