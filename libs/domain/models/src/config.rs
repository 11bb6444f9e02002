// [libs/domain/models/src/config.rs]
//! Forma tipada de la configuración YAML de una colección (§6). Se deserializa
//! tal cual con `serde_yaml` en `ripple-infra-collection-context`; este módulo
//! solo posee las formas, no la carga de archivo ni el `.env`.

use crate::entity::EntityDomain;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub ripple_settings: RippleSettings,
    pub processing_steps: HashMap<String, ProcessingStepConfig>,
    pub polling: PollingConfig,
    pub database: DatabaseConfig,
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub flows2fim: Flows2FimConfig,
    #[serde(default)]
    pub qc: QcConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    pub collections_root_dir: PathBuf,
    pub nwm_flowlines_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RippleSettings {
    pub ras_version: String,
    pub us_depth_increment: f64,
    pub ds_depth_increment: f64,
    pub resolution: f64,
    pub resolution_units: String,
    pub terrain_source_url: String,
    pub source_network: String,
    pub source_network_version: String,
    pub source_network_type: String,
}

/// Configuración de una única etapa del DAG fijo (§4.8). La clave del mapa en
/// `PipelineConfig::processing_steps` es el nombre corto de la etapa
/// (`conflate_model`, `extract_submodel`, ...); este struct trae lo que el
/// Step Processor necesita para armarla contra la API remota.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingStepConfig {
    pub api_process_name: String,
    pub domain: EntityDomain,
    pub payload_template: serde_json::Value,
    pub timeout_minutes: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    pub default_poll_wait_seconds: u64,
    pub api_launch_jobs_retry_wait_seconds: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Segundos; convertido a milisegundos para el PRAGMA busy_timeout (§4.1).
    pub db_conn_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    pub optimum_parallel_process_count: usize,
    #[serde(default)]
    pub stop_on_error: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Flows2FimConfig {
    pub binary_path: Option<PathBuf>,
    pub gdal_bin_path: Option<PathBuf>,
    pub gdal_scripts_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QcConfig {
    pub template_qgis_file: Option<PathBuf>,
}

/// Destinos de `batch-pipeline` tras ejecutar cada colección hija (§6 CLI):
/// un bucket/prefijo de éxito y uno de fallo con timestamp.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchConfig {
    pub s3_success_uri: Option<String>,
    pub s3_failure_uri: Option<String>,
}
