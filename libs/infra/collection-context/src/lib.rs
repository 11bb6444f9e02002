// [libs/infra/collection-context/src/lib.rs]
/*!
 * =================================================================
 * APARATO: COLLECTION CONTEXT
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L8)
 * RESPONSABILIDAD: CONFIGURACIÓN, ENTORNO Y RUTAS DE UNA COLECCIÓN
 *
 * Holds immutable references the rest of the pipeline borrows from — never
 * stored inside the Step Processor itself (§9, "Cyclic ownership").
 * =================================================================
 */

pub mod env;
pub mod errors;
pub mod models;
pub mod network;
pub mod paths;

pub use env::RuntimeEnv;
pub use errors::ContextError;
pub use network::read_seed_reaches;
pub use paths::CollectionPaths;

use ripple_domain_models::{ModelRecord, PipelineConfig};
use std::path::Path;
use tracing::{info, instrument};

/// Contexto inmutable de una colección: configuración cargada, entorno
/// resuelto y rutas derivadas. Construido una vez al arranque de
/// `pipeline --collection <id>` y prestado por referencia a cada etapa.
#[derive(Debug, Clone)]
pub struct CollectionContext {
    pub collection_id: String,
    pub config: PipelineConfig,
    pub env: RuntimeEnv,
    pub paths: CollectionPaths,
}

impl CollectionContext {
    /// Carga la configuración YAML desde `config_path`, hidrata `.env` y
    /// resuelve todas las rutas de la colección. Un YAML faltante o
    /// malformado, o una variable de entorno requerida ausente, es fatal al
    /// arranque (§7 "Configuration error").
    #[instrument(skip(config_path))]
    pub fn load(config_path: &Path, collection_id: &str) -> Result<Self, ContextError> {
        let raw_yaml = std::fs::read_to_string(config_path)?;
        let config: PipelineConfig = serde_yaml::from_str(&raw_yaml)?;
        let env = RuntimeEnv::load()?;
        let paths = CollectionPaths::resolve(&config.paths.collections_root_dir, collection_id);

        if !paths.root.is_dir() {
            return Err(ContextError::CollectionRootMissing(paths.root.display().to_string()));
        }

        info!(collection_id, root = %paths.root.display(), "contexto de colección cargado");

        Ok(Self { collection_id: collection_id.to_string(), config, env, paths })
    }

    /// Modelos en disco bajo `source_models/` (§2 "Model").
    pub fn discover_models(&self) -> Result<Vec<ModelRecord>, ContextError> {
        models::discover_models(&self.collection_id, &self.paths.source_models_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_minimal_config(path: &Path, collections_root: &Path) {
        let yaml = format!(
            r#"
paths:
  collections_root_dir: "{root}"
  nwm_flowlines_path: "{root}/flowlines.gpkg"
ripple_settings:
  ras_version: "6.3"
  us_depth_increment: 0.5
  ds_depth_increment: 0.5
  resolution: 3.0
  resolution_units: meters
  terrain_source_url: "https://example.invalid/terrain"
  source_network: nwm_3_0
  source_network_version: "3.0"
  source_network_type: flowlines
processing_steps: {{}}
polling:
  default_poll_wait_seconds: 10
  api_launch_jobs_retry_wait_seconds: 5.0
database:
  db_conn_timeout_seconds: 10
execution:
  optimum_parallel_process_count: 5
  stop_on_error: false
"#,
            root = collections_root.display()
        );
        fs::write(path, yaml).unwrap();
    }

    #[test]
    fn load_fails_fatally_when_collection_root_is_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.yaml");
        write_minimal_config(&config_path, tmp.path());

        std::env::set_var("RIPPLE1D_API_URL", "http://localhost:9999");
        let result = CollectionContext::load(&config_path, "huc-missing");
        assert!(matches!(result, Err(ContextError::CollectionRootMissing(_))));
    }

    #[test]
    fn load_succeeds_and_resolves_paths_when_root_exists() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.yaml");
        write_minimal_config(&config_path, tmp.path());
        fs::create_dir_all(tmp.path().join("huc-1203")).unwrap();

        std::env::set_var("RIPPLE1D_API_URL", "http://localhost:9999");
        let context = CollectionContext::load(&config_path, "huc-1203").unwrap();
        assert_eq!(context.collection_id, "huc-1203");
        assert!(context.paths.root.ends_with("huc-1203"));
    }
}
