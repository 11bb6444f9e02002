// [apps/batch-pipeline/src/main.rs]
//
// =================================================================
// APARATO: BATCH PIPELINE CLI
// CLASIFICACIÓN: BINARIO DE APLICACIÓN
// RESPONSABILIDAD: ABANICO DE COLECCIONES, UNA POR PROCESO HIJO (§6)
//
// `batch-pipeline --collection-list <...>` es el driver externo al CORE
// (§8 "Propagation policy": "the outer batch driver ... converts any
// uncaught exception into a failed S3 move of the collection directory").
// Por colección: spawnea el binario `pipeline` como hijo, captura su
// stdout/stderr en `<collections_root>/<id>/<id>.log`, y mueve el directorio
// de resultado al destino S3 de éxito o de fallo según el código de salida.
// El movimiento a S3 se delega al CLI `aws` (narrow interface, §1 Non-goals
// "S3 downloads of input artifacts" — sin tender un SDK de AWS completo
// para un `mv` de un directorio).
// =================================================================

use clap::Parser;
use ripple_infra_collection_context::CollectionContext;
use std::path::{Path, PathBuf};
use std::process::{ExitCode, Stdio};
use tokio::fs;
use tokio::process::Command;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "batch-pipeline", about = "Corre el pipeline para una lista de colecciones, una por proceso hijo")]
struct Args {
    /// Ruta a un archivo con un id de colección por línea, o una cadena entre
    /// comillas con ids separados por espacios.
    #[arg(long)]
    collection_list: String,

    /// Ruta al YAML de configuración, reenviada a cada hijo `pipeline`.
    #[arg(long, env = "RIPPLE_CONFIG_PATH")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    ripple_shared_telemetry::init_tracing("batch-pipeline");

    let args = Args::parse();
    let collections = match resolve_collection_list(&args.collection_list).await {
        Ok(collections) => collections,
        Err(error) => {
            error!(%error, "no se pudo resolver --collection-list");
            return ExitCode::FAILURE;
        }
    };

    if collections.is_empty() {
        warn!("--collection-list no produjo ningún id de colección");
        return ExitCode::SUCCESS;
    }

    let pipeline_binary = match sibling_pipeline_binary() {
        Ok(path) => path,
        Err(error) => {
            error!(%error, "no se encontró el binario `pipeline` junto a batch-pipeline");
            return ExitCode::FAILURE;
        }
    };

    let mut any_failed = false;
    for collection_id in collections {
        match run_one_collection(&pipeline_binary, &args.config, &collection_id).await {
            Ok(true) => info!(collection = %collection_id, "colección completada con éxito"),
            Ok(false) => {
                any_failed = true;
                warn!(collection = %collection_id, "colección terminó en fallo; movida al destino de fallo");
            }
            Err(error) => {
                any_failed = true;
                error!(collection = %collection_id, %error, "fallo irrecuperable procesando la colección");
            }
        }
    }

    if any_failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// `--collection-list` acepta una ruta a un archivo (un id por línea) o una
/// cadena entre comillas con ids separados por espacios; se intenta leer
/// como archivo primero y se recurre a split-por-espacios si no existe.
async fn resolve_collection_list(raw: &str) -> anyhow::Result<Vec<String>> {
    let path = Path::new(raw);
    if path.is_file() {
        let contents = fs::read_to_string(path).await?;
        Ok(contents.lines().map(str::trim).filter(|line| !line.is_empty()).map(str::to_string).collect())
    } else {
        Ok(raw.split_whitespace().map(str::to_string).collect())
    }
}

/// Ubica el binario `pipeline` en el mismo directorio que el ejecutable
/// actual — ambos binarios del workspace se compilan al mismo `target/`.
fn sibling_pipeline_binary() -> anyhow::Result<PathBuf> {
    let current = std::env::current_exe()?;
    let dir = current.parent().ok_or_else(|| anyhow::anyhow!("ejecutable actual sin directorio padre"))?;
    let candidate = dir.join("pipeline");
    if candidate.is_file() {
        Ok(candidate)
    } else {
        Err(anyhow::anyhow!("binario `pipeline` no encontrado en {}", dir.display()))
    }
}

/// Corre una colección en un proceso hijo, captura su salida en el log de
/// la colección y mueve el directorio de resultado según el éxito del
/// proceso. Devuelve `Ok(true)` en éxito, `Ok(false)` en fallo ya manejado
/// (S3 movido al destino de fallo); `Err` solo ante un fallo de E/S previo
/// a poder clasificar el resultado.
async fn run_one_collection(pipeline_binary: &Path, config_path: &Path, collection_id: &str) -> anyhow::Result<bool> {
    let context = CollectionContext::load(config_path, collection_id)?;
    let log_path = context.paths.root.join(format!("{collection_id}.log"));
    let log_file = std::fs::File::create(&log_path)?;
    let log_file_stderr = log_file.try_clone()?;

    info!(collection = %collection_id, log = %log_path.display(), "lanzando proceso hijo `pipeline`");

    let status = Command::new(pipeline_binary)
        .arg("--collection")
        .arg(collection_id)
        .arg("--config")
        .arg(config_path)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log_file))
        .stderr(Stdio::from(log_file_stderr))
        .status()
        .await?;

    let succeeded = status.success();
    move_collection_to_s3(&context, succeeded).await?;
    Ok(succeeded)
}

/// Mueve `<collections_root>/<id>` al destino S3 correspondiente (§6): el
/// de éxito tal cual, el de fallo con un prefijo con timestamp UTC para no
/// pisar corridas fallidas anteriores. Ausencia de destino configurado deja
/// el directorio en disco y solo lo registra — mover a S3 es un efecto
/// adicional, no una condición de éxito del batch.
async fn move_collection_to_s3(context: &CollectionContext, succeeded: bool) -> anyhow::Result<()> {
    let destination_uri = if succeeded {
        context.config.batch.s3_success_uri.clone()
    } else {
        context.config.batch.s3_failure_uri.clone().map(|base| {
            let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ");
            format!("{}/{}-{}", base.trim_end_matches('/'), stamp, context.collection_id)
        })
    };

    let Some(destination_uri) = destination_uri else {
        warn!(collection = %context.collection_id, succeeded, "sin destino S3 configurado; la colección permanece en disco");
        return Ok(());
    };

    info!(collection = %context.collection_id, destination = %destination_uri, "moviendo directorio de colección a S3");
    let status = Command::new("aws")
        .args(["s3", "mv", "--recursive"])
        .arg(&context.paths.root)
        .arg(&destination_uri)
        .status()
        .await?;

    if !status.success() {
        warn!(collection = %context.collection_id, %destination_uri, "movimiento a S3 falló; el directorio permanece en disco");
    }
    Ok(())
}
