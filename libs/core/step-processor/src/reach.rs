// [libs/core/step-processor/src/reach.rs]
//! Especialización Generic Reach (§4.3): entidad = Reach; usa su
//! `(id, model_id)` y las rutas resueltas de la colección. Cubre todas las
//! etapas por-reach que no necesitan el preámbulo KWSE: `extract_submodel`,
//! `create_ras_terrain`, `create_model_run_normal_depth`,
//! `run_incremental_normal_depth`, `nd_create_rating_curves_db`,
//! `create_fim_lib`.

use crate::processor::SubmissionInput;
use crate::template::format_payload;
use ripple_domain_models::{EntityRef, ReachRecord};
use ripple_infra_collection_context::CollectionPaths;
use std::collections::HashMap;

pub fn build_reach_submission(reach: &ReachRecord, paths: &CollectionPaths, template: &serde_json::Value) -> SubmissionInput {
    let mut substitutions = HashMap::new();
    substitutions.insert("nwm_reach_id".to_string(), reach.reach_id.to_string());
    substitutions.insert("model_id".to_string(), reach.model_id.clone().unwrap_or_default());
    substitutions.insert("model_name".to_string(), reach.model_name.clone().unwrap_or_default());
    substitutions.insert("submodels_directory".to_string(), paths.submodels_dir.display().to_string());
    substitutions.insert("library_directory".to_string(), paths.library_dir.display().to_string());
    if let Some(model_id) = &reach.model_id {
        substitutions.insert(
            "source_model_directory".to_string(),
            paths.source_models_dir.join(model_id).display().to_string(),
        );
    }

    let payload = format_payload(template, &substitutions);
    SubmissionInput::Submit { entity: EntityRef::Reach { reach_id: reach.reach_id }, payload }
}
