// [libs/core/step-processor/src/conflate.rs]
//! Especialización Conflate (§4.3): entidad = Modelo; el payload referencia
//! el archivo de "red fuente" externo (`ripple_settings.source_network*`) del
//! que se conflacionan las secciones transversales.

use crate::processor::SubmissionInput;
use crate::template::format_payload;
use ripple_domain_models::{EntityRef, ModelRecord, RippleSettings};
use ripple_infra_collection_context::CollectionPaths;
use std::collections::HashMap;

pub fn build_conflate_submission(
    model: &ModelRecord,
    paths: &CollectionPaths,
    settings: &RippleSettings,
    nwm_flowlines_path: &std::path::Path,
    template: &serde_json::Value,
) -> SubmissionInput {
    let source_model_directory = paths.source_models_dir.join(&model.model_id);

    let mut substitutions = HashMap::new();
    substitutions.insert("model_id".to_string(), model.model_id.clone());
    substitutions.insert("model_name".to_string(), model.model_name.clone());
    substitutions.insert("source_model_directory".to_string(), source_model_directory.display().to_string());
    substitutions.insert("submodels_directory".to_string(), paths.submodels_dir.display().to_string());
    substitutions.insert("library_directory".to_string(), paths.library_dir.display().to_string());
    substitutions.insert("source_network".to_string(), settings.source_network.clone());
    substitutions.insert("source_network_version".to_string(), settings.source_network_version.clone());
    substitutions.insert("source_network_type".to_string(), settings.source_network_type.clone());
    substitutions.insert("nwm_flowlines_path".to_string(), nwm_flowlines_path.display().to_string());

    let payload = format_payload(template, &substitutions);

    SubmissionInput::Submit { entity: EntityRef::Model { model_id: model.model_id.clone() }, payload }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;

    #[test]
    fn conflate_payload_carries_source_network_reference() {
        let paths = CollectionPaths::resolve(Path::new("/data"), "huc-1203");
        let settings = RippleSettings {
            ras_version: "6.3".into(),
            us_depth_increment: 0.5,
            ds_depth_increment: 0.5,
            resolution: 3.0,
            resolution_units: "meters".into(),
            terrain_source_url: "https://example.invalid".into(),
            source_network: "nwm_3_0".into(),
            source_network_version: "3.0".into(),
            source_network_type: "flowlines".into(),
        };
        let model = ModelRecord { collection_id: "huc-1203".into(), model_id: "M1".into(), model_name: "BaldEagle".into() };
        let template = json!({ "model_id": "{model_id}", "source_network": "{source_network}" });

        let submission = build_conflate_submission(&model, &paths, &settings, Path::new("/data/flowlines.gpkg"), &template);
        match submission {
            SubmissionInput::Submit { entity, payload } => {
                assert_eq!(entity, EntityRef::Model { model_id: "M1".into() });
                assert_eq!(payload["model_id"], json!("M1"));
                assert_eq!(payload["source_network"], json!("nwm_3_0"));
            }
            SubmissionInput::SkipNotAccepted { .. } => panic!("conflate never skips"),
        }
    }
}
