// [libs/core/pipeline-driver/src/conflation_files.rs]
//! Lectura de `source_models/<model_id>/<model_name>.conflation.json` (§6
//! "Persisted state layout") hacia `ConflationPayload` (§4.1 "Conflation
//! merge order"). El archivo no fija `model_id` en su cuerpo — se inyecta
//! desde el `ModelRecord` que ya lo conoce por su ruta en disco.

use ripple_domain_models::{ConflationPayload, ConflationReachEntry, ModelRecord};
use ripple_infra_collection_context::CollectionPaths;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct ConflationFileBody {
    reaches: HashMap<i64, ConflationReachEntry>,
    #[serde(default)]
    total_ras_length: Option<f64>,
}

/// Lee el archivo de conflación de cada modelo dado. Un archivo ausente o
/// malformado para un modelo se registra y se omite — no aborta la carga del
/// resto de los modelos de la colección.
pub fn read_conflation_payloads(paths: &CollectionPaths, models: &[ModelRecord]) -> Vec<ConflationPayload> {
    let mut payloads = Vec::new();

    for model in models {
        let file_path = paths.source_model_conflation_json(&model.model_id, &model.model_name);
        let raw = match std::fs::read_to_string(&file_path) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(model_id = %model.model_id, path = %file_path.display(), %error, "archivo de conflación ilegible; se omite el modelo");
                continue;
            }
        };

        match serde_json::from_str::<ConflationFileBody>(&raw) {
            Ok(body) => payloads.push(ConflationPayload {
                model_id: model.model_id.clone(),
                reaches: body.reaches,
                total_ras_length: body.total_ras_length,
            }),
            Err(error) => warn!(model_id = %model.model_id, %error, "archivo de conflación malformado; se omite el modelo"),
        }
    }

    payloads
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(id: &str, name: &str) -> ModelRecord {
        ModelRecord { collection_id: "huc-1203".into(), model_id: id.into(), model_name: name.into() }
    }

    #[test]
    fn reads_reaches_and_injects_model_id_from_record() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = CollectionPaths::resolve(tmp.path(), "huc-1203");
        let model_dir = paths.source_models_dir.join("M1");
        std::fs::create_dir_all(&model_dir).unwrap();
        std::fs::write(
            model_dir.join("BaldEagle.conflation.json"),
            r#"{"reaches": {"100": {"eclipsed": true}}, "total_ras_length": 42.0}"#,
        )
        .unwrap();

        let payloads = read_conflation_payloads(&paths, &[model("M1", "BaldEagle")]);
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].model_id, "M1");
        assert!(payloads[0].reaches.get(&100).unwrap().eclipsed);
    }

    #[test]
    fn missing_file_is_skipped_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = CollectionPaths::resolve(tmp.path(), "huc-1203");
        let payloads = read_conflation_payloads(&paths, &[model("Ghost", "NoFile")]);
        assert!(payloads.is_empty());
    }
}
