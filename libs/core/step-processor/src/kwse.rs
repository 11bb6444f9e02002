// [libs/core/step-processor/src/kwse.rs]
//! Especialización KWSE (§4.3): antes de someter, consulta el rango de
//! elevación `nd` de la base de resultados del reach aguas abajo e inyecta
//! `min_elevation`/`max_elevation`. Si el rango es `None` (base ausente o sin
//! filas `nd`), la entidad se clasifica `not_accepted` sin llamada HTTP
//! (§4.3: "classify as not_accepted without an HTTP call", escenario E5).

use crate::processor::SubmissionInput;
use crate::template::format_payload;
use ripple_domain_models::{EntityRef, ReachRecord};
use ripple_infra_collection_context::CollectionPaths;
use ripple_infra_submodel_reader::elevation_range;
use std::collections::HashMap;

pub async fn build_kwse_submission(
    reach: &ReachRecord,
    downstream_reach_id: i64,
    paths: &CollectionPaths,
    template: &serde_json::Value,
) -> Result<SubmissionInput, ripple_infra_submodel_reader::SubmodelReaderError> {
    let downstream_db = paths.submodel_result_db(downstream_reach_id);
    let range = elevation_range(&downstream_db).await?;

    let Some(range) = range else {
        return Ok(SubmissionInput::SkipNotAccepted { entity: EntityRef::Reach { reach_id: reach.reach_id } });
    };

    let mut substitutions = HashMap::new();
    substitutions.insert("nwm_reach_id".to_string(), reach.reach_id.to_string());
    substitutions.insert("model_id".to_string(), reach.model_id.clone().unwrap_or_default());
    substitutions.insert("model_name".to_string(), reach.model_name.clone().unwrap_or_default());
    substitutions.insert("submodels_directory".to_string(), paths.submodels_dir.display().to_string());
    substitutions.insert("library_directory".to_string(), paths.library_dir.display().to_string());
    substitutions.insert("min_elevation".to_string(), range.min_elevation.to_string());
    substitutions.insert("max_elevation".to_string(), range.max_elevation.to_string());

    let payload = format_payload(template, &substitutions);
    Ok(SubmissionInput::Submit { entity: EntityRef::Reach { reach_id: reach.reach_id }, payload })
}

#[cfg(test)]
mod tests {
    use super::*;
    use libsql::Builder;
    use serde_json::json;
    use std::path::Path;

    fn reach(id: i64) -> ReachRecord {
        ReachRecord { reach_id: id, nwm_to_id: None, updated_to_id: None, model_id: Some("M1".into()), model_name: Some("BaldEagle".into()), eclipsed: false }
    }

    #[tokio::test]
    async fn missing_downstream_db_yields_skip_not_accepted() {
        // E5 scenario.
        let tmp = tempfile::tempdir().unwrap();
        let paths = CollectionPaths::resolve(tmp.path(), "huc-1203");
        let template = json!({ "min": "{min_elevation}" });

        let submission = build_kwse_submission(&reach(100), 200, &paths, &template).await.unwrap();
        assert!(matches!(submission, SubmissionInput::SkipNotAccepted { entity } if entity == EntityRef::Reach { reach_id: 100 }));
    }

    #[tokio::test]
    async fn present_elevation_range_injects_min_and_max() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = CollectionPaths::resolve(tmp.path(), "huc-1203");
        let downstream_db = paths.submodel_result_db(200);
        std::fs::create_dir_all(downstream_db.parent().unwrap()).unwrap();

        let database = Builder::new_local(downstream_db.to_string_lossy().as_ref()).build().await.unwrap();
        let connection = database.connect().unwrap();
        connection
            .execute(
                "CREATE TABLE rating_curves (reach_id INTEGER, plan_suffix TEXT, map_exist INTEGER, \
                 us_flow REAL, us_depth REAL, us_wse REAL, ds_depth REAL, ds_wse REAL)",
                (),
            )
            .await
            .unwrap();
        connection.execute("INSERT INTO rating_curves VALUES (200, 'nd', 1, 10.0, 1.0, 5.0, 0.5, 4.5)", ()).await.unwrap();
        connection.execute("INSERT INTO rating_curves VALUES (200, 'nd', 1, 20.0, 2.0, 9.0, 1.5, 8.5)", ()).await.unwrap();

        let template = json!({ "min": "{min_elevation}", "max": "{max_elevation}" });
        let submission = build_kwse_submission(&reach(100), 200, &paths, &template).await.unwrap();

        match submission {
            SubmissionInput::Submit { payload, .. } => {
                assert_eq!(payload["min"], json!("5"));
                assert_eq!(payload["max"], json!("9"));
            }
            SubmissionInput::SkipNotAccepted { .. } => panic!("expected a submission"),
        }
    }
}
