// [apps/pipeline/src/main.rs]
//
// =================================================================
// APARATO: PIPELINE CLI
// CLASIFICACIÓN: BINARIO DE APLICACIÓN
// RESPONSABILIDAD: CORRER EL DAG FIJO DE ONCE ETAPAS PARA UNA COLECCIÓN (§6)
//
// `pipeline --collection <id>` es el punto de entrada de una corrida
// completa: carga contexto, abre el almacén de estado, ejecuta el DAG vía
// `PipelineDriver` y siempre intenta escribir los reportes de cierre
// (§4.10), gane o pierda el DAG. El código de salida refleja solo el DAG;
// una falla de reporte se registra pero no lo cambia (§7: "post-processing
// failures are logged, not fatal").
// =================================================================

use clap::Parser;
use ripple_core_pipeline_driver::PipelineDriver;
use ripple_infra_collection_context::{read_seed_reaches, CollectionContext};
use ripple_infra_job_client::JobClient;
use ripple_infra_state_store::{StateStoreClient, StateStoreRepository};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "pipeline", about = "Corre el DAG de cómputo hidráulico para una colección")]
struct Args {
    /// Identificador de la colección (nombre del subdirectorio bajo `collections_root_dir`).
    #[arg(long)]
    collection: String,

    /// Ruta al YAML de configuración. Por defecto, `RIPPLE_CONFIG_PATH`.
    #[arg(long, env = "RIPPLE_CONFIG_PATH")]
    config: PathBuf,

    /// Corre el barrido de reconciliación opcional (§4.9) después del DAG.
    #[arg(long, default_value_t = false)]
    reconcile: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    ripple_shared_telemetry::init_tracing("pipeline");

    let args = Args::parse();

    match run(&args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            warn!("el DAG abortó una o más etapas bajo stop_on_error=true");
            ExitCode::FAILURE
        }
        Err(error) => {
            error!(%error, "corrida de colección fallida");
            ExitCode::FAILURE
        }
    }
}

/// Devuelve `Ok(true)` si el DAG corrió hasta el final sin abortar,
/// `Ok(false)` si `stop_on_error` interrumpió el DAG en alguna etapa —
/// ambos casos llegan a la fase de reporte; solo un error de arranque
/// (configuración, almacén de estado inalcanzable) es `Err`.
async fn run(args: &Args) -> anyhow::Result<bool> {
    let context = CollectionContext::load(&args.config, &args.collection)?;
    info!(collection = %context.collection_id, "contexto de colección resuelto");

    let busy_timeout_ms = context.config.database.db_conn_timeout_seconds * 1000;
    let state_store_path = context.paths.state_store_file.to_string_lossy().into_owned();
    let store_client = StateStoreClient::connect(&state_store_path, busy_timeout_ms).await?;
    let store = StateStoreRepository::new(store_client);

    let seed_reaches = read_seed_reaches(&context.config.paths.nwm_flowlines_path).await?;
    let settings = &context.config.ripple_settings;
    store.init(&settings.ras_version, settings.us_depth_increment, settings.ds_depth_increment, &seed_reaches).await?;

    let job_client = JobClient::new(
        context.env.ripple1d_api_url.clone(),
        context.config.polling.default_poll_wait_seconds,
        context.config.polling.api_launch_jobs_retry_wait_seconds,
    );

    let models = context.discover_models()?;
    info!(model_count = models.len(), "modelos descubiertos en source_models/");

    let driver = PipelineDriver::new(&job_client, &store, &context.paths, &context.config, &context.collection_id);
    let report = driver.run_collection(models).await?;

    if args.reconcile {
        match ripple_infra_reporting::reconcile(&store, &job_client, &context.config).await {
            Ok(reconcile_report) => info!(?reconcile_report, "barrido de reconciliación completado"),
            Err(error) => warn!(%error, "barrido de reconciliación falló; no es fatal"),
        }
    }

    if let Err(error) = ripple_infra_reporting::write_failed_jobs_report(&store, &job_client, &context.config, &context.paths.failed_jobs_report).await {
        warn!(%error, "reporte de misiones falladas no se pudo escribir");
    }
    if let Err(error) = ripple_infra_reporting::write_timedout_jobs_report(&store, &job_client, &context.config, &context.paths.timedout_jobs_report).await {
        warn!(%error, "reporte de misiones expiradas no se pudo escribir");
    }

    Ok(report.aborted_at.is_none())
}
