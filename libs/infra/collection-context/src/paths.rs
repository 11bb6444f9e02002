// [libs/infra/collection-context/src/paths.rs]
//! Resolución de rutas rooteadas en `<collections_root>/<collection_id>/`
//! (§6 "Persisted state layout"). Ningún otro módulo concatena estos
//! segmentos a mano.

use std::path::{Path, PathBuf};

/// Rutas resueltas de una colección concreta. Construido una vez por
/// `CollectionContext::load` y pasado por referencia a los demás estratos.
#[derive(Debug, Clone)]
pub struct CollectionPaths {
    pub root: PathBuf,
    pub source_models_dir: PathBuf,
    pub submodels_dir: PathBuf,
    pub library_dir: PathBuf,
    pub library_extent_dir: PathBuf,
    pub state_store_file: PathBuf,
    pub start_reaches_csv: PathBuf,
    pub failed_jobs_report: PathBuf,
    pub timedout_jobs_report: PathBuf,
}

impl CollectionPaths {
    pub fn resolve(collections_root_dir: &Path, collection_id: &str) -> Self {
        let root = collections_root_dir.join(collection_id);
        Self {
            source_models_dir: root.join("source_models"),
            submodels_dir: root.join("submodels"),
            library_dir: root.join("library"),
            library_extent_dir: root.join("library_extent"),
            state_store_file: root.join("ripple.gpkg"),
            start_reaches_csv: root.join("start_reaches.csv"),
            failed_jobs_report: root.join("failed_jobs_report.xlsx"),
            timedout_jobs_report: root.join("timedout_jobs_report.xlsx"),
            root,
        }
    }

    /// `submodels/<reach_id>/<reach_id>.gpkg` — insumo de la corrida de un reach.
    pub fn submodel_gpkg(&self, reach_id: i64) -> PathBuf {
        self.submodels_dir.join(reach_id.to_string()).join(format!("{reach_id}.gpkg"))
    }

    /// `submodels/<reach_id>/<reach_id>.db` — resultados per-reach, consumidos
    /// y borrados por el Rating-Curve Loader (§4.7).
    pub fn submodel_result_db(&self, reach_id: i64) -> PathBuf {
        self.submodels_dir.join(reach_id.to_string()).join(format!("{reach_id}.db"))
    }

    pub fn source_model_gpkg(&self, model_id: &str, model_name: &str) -> PathBuf {
        self.source_models_dir.join(model_id).join(format!("{model_name}.gpkg"))
    }

    pub fn source_model_conflation_json(&self, model_id: &str, model_name: &str) -> PathBuf {
        self.source_models_dir.join(model_id).join(format!("{model_name}.conflation.json"))
    }

    pub fn library_entry(&self, reach_id: i64) -> PathBuf {
        self.library_dir.join(reach_id.to_string())
    }

    pub fn library_extent_entry(&self, reach_id: i64) -> PathBuf {
        self.library_extent_dir.join(reach_id.to_string())
    }
}
