// [libs/infra/collection-context/src/models.rs]
//! Enumeración de modelos en disco bajo `source_models/<model_id>/` (§2
//! "Model", §6). Un modelo es identificado por el nombre de su subdirectorio;
//! su `model_name` se deriva del único `.gpkg` que contiene (§6: el patrón
//! es `source_models/<model_id>/<model_name>.gpkg`).

use crate::errors::ContextError;
use ripple_domain_models::ModelRecord;
use std::path::Path;
use tracing::warn;

/// Recorre `source_models_dir` y produce un `ModelRecord` por subdirectorio
/// que contiene exactamente un `.gpkg`. Subdirectorios vacíos o con más de
/// un `.gpkg` se registran como advertencia y se omiten: un reimplementador
/// posterior puede decidir tratarlos como error duro si el caso aparece en
/// producción.
pub fn discover_models(collection_id: &str, source_models_dir: &Path) -> Result<Vec<ModelRecord>, ContextError> {
    if !source_models_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut models = Vec::new();

    for entry in std::fs::read_dir(source_models_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let model_id = entry.file_name().to_string_lossy().into_owned();
        let model_dir = entry.path();

        let gpkg_files: Vec<_> = std::fs::read_dir(&model_dir)?
            .filter_map(|candidate| candidate.ok())
            .filter(|candidate| candidate.path().extension().and_then(|ext| ext.to_str()) == Some("gpkg"))
            .collect();

        match gpkg_files.as_slice() {
            [single] => {
                let model_name = single.path().file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| model_id.clone());
                models.push(ModelRecord { collection_id: collection_id.to_string(), model_id, model_name });
            }
            [] => warn!(model_id, "modelo sin archivo .gpkg; se omite"),
            _ => warn!(model_id, count = gpkg_files.len(), "modelo con múltiples .gpkg; se omite"),
        }
    }

    models.sort_by(|a, b| a.model_id.cmp(&b.model_id));
    Ok(models)
}
