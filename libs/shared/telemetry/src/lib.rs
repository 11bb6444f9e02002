// [libs/shared/telemetry/src/lib.rs]
/*!
 * =================================================================
 * APARATO: TELEMETRY INIT
 * CLASIFICACIÓN: SHARED UTILITY (ESTRATO L0)
 * RESPONSABILIDAD: TRAZADO ESTRUCTURADO PARA LOS BINARIOS DEL PIPELINE
 * =================================================================
 */

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as formatting_layer, EnvFilter};

/// Desarrollo: salida compacta legible por humanos. Producción: JSON
/// aplanado listo para un colector de logs. Silencia el ruido de `libsql`.
pub fn init_tracing(service_name: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "{service_name}={level},libsql=error",
            level = if cfg!(debug_assertions) { "debug" } else { "info" }
        )
        .into()
    });

    if cfg!(debug_assertions) {
        tracing_subscriber::registry()
            .with(filter)
            .with(formatting_layer::layer().compact().with_target(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(formatting_layer::layer().json().flatten_event(true))
            .init();
    }
}
