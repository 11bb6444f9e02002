// [libs/core/pipeline-driver/src/lib.rs]
/*!
 * =================================================================
 * APARATO: PIPELINE DRIVER
 * CLASIFICACIÓN: CORE ENGINE (ESTRATO L7)
 * RESPONSABILIDAD: DAG FIJO DE ONCE ETAPAS POR COLECCIÓN
 * =================================================================
 */

pub mod conflation_files;
pub mod driver;
pub mod errors;

pub use driver::{DriverReport, PipelineDriver};
pub use errors::PipelineDriverError;

#[cfg(test)]
mod integration_tests {
    use super::*;
    use ripple_domain_models::{ModelRecord, PipelineConfig};
    use ripple_infra_collection_context::CollectionPaths;
    use ripple_infra_job_client::JobClient;
    use ripple_infra_state_store::{StateStoreClient, StateStoreRepository};
    use serde_json::json;
    use std::path::Path;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_with_all_stages() -> PipelineConfig {
        let yaml = r#"
paths:
  collections_root_dir: "/tmp/does-not-matter"
  nwm_flowlines_path: "/tmp/does-not-matter/flowlines.gpkg"
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
processing_steps:
  conflate_model: { api_process_name: conflate_model, domain: model, payload_template: {}, timeout_minutes: 20 }
  extract_submodel: { api_process_name: extract_submodel, domain: reach, payload_template: {}, timeout_minutes: 10 }
  create_ras_terrain: { api_process_name: create_ras_terrain, domain: reach, payload_template: {}, timeout_minutes: 10 }
  create_model_run_normal_depth: { api_process_name: create_model_run_normal_depth, domain: reach, payload_template: {}, timeout_minutes: 20 }
  run_incremental_normal_depth: { api_process_name: run_incremental_normal_depth, domain: reach, payload_template: {}, timeout_minutes: 20 }
  nd_create_rating_curves_db: { api_process_name: nd_create_rating_curves_db, domain: reach, payload_template: {}, timeout_minutes: 15 }
  run_iknown_wse: { api_process_name: run_known_wse, domain: reach, payload_template: {}, timeout_minutes: 240 }
  create_irating_curves_db: { api_process_name: create_rating_curves_db, domain: reach, payload_template: {}, timeout_minutes: 15 }
  run_known_wse: { api_process_name: run_known_wse, domain: reach, payload_template: {}, timeout_minutes: 240 }
  kwse_create_rating_curves_db: { api_process_name: create_rating_curves_db, domain: reach, payload_template: {}, timeout_minutes: 15 }
  create_fim_lib: { api_process_name: create_fim_lib, domain: reach, payload_template: {}, timeout_minutes: 150 }
polling:
  default_poll_wait_seconds: 1
  api_launch_jobs_retry_wait_seconds: 0.1
database:
  db_conn_timeout_seconds: 5
execution:
  optimum_parallel_process_count: 4
  stop_on_error: false
"#;
        serde_yaml::from_str(yaml).unwrap()
    }

    /// Un modelo, dos reaches, red lineal: conflate -> update_network ->
    /// las cinco etapas nd en lote -> iKWSE -> kwse -> fusión -> fim_lib. La
    /// API remota siempre acepta y resuelve de inmediato, así que todo debe
    /// sobrevivir hasta `create_fim_lib` (estilo E1).
    #[tokio::test]
    async fn full_dag_survives_linear_two_reach_collection() {
        let dir = tempfile::tempdir().unwrap();
        let paths = CollectionPaths::resolve(Path::new(dir.path()), "huc-1203");
        std::fs::create_dir_all(&paths.root).unwrap();
        std::fs::create_dir_all(paths.source_models_dir.join("M1")).unwrap();
        std::fs::write(
            paths.source_models_dir.join("M1").join("BaldEagle.conflation.json"),
            r#"{"reaches": {"100": {}, "200": {}}, "total_ras_length": 12.0}"#,
        )
        .unwrap();
        for reach_id in [100_i64, 200] {
            std::fs::create_dir_all(paths.submodels_dir.join(reach_id.to_string())).unwrap();
        }

        let client = StateStoreClient::connect(":memory:", 5000).await.unwrap();
        let store = StateStoreRepository::new(client);
        store.init("1.0.0", 0.5, 0.5, &[(100, Some(200)), (200, None)]).await.unwrap();

        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/processes/.+/execution$"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"jobID": "job-x", "status": "accepted"})))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/jobs/.+$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jobID": "job-x", "status": "successful", "updated": "2026-01-01T00:00:00Z"})))
            .mount(&mock_server)
            .await;

        let job_client = JobClient::new(mock_server.uri(), 1, 0.1);
        let config = config_with_all_stages();
        let models = vec![ModelRecord { collection_id: "huc-1203".into(), model_id: "M1".into(), model_name: "BaldEagle".into() }];

        let driver = PipelineDriver::new(&job_client, &store, &paths, &config, "huc-1203");
        let report = driver.run_collection(models).await.unwrap();

        assert!(report.aborted_at.is_none());
        let stage_keys: Vec<&str> = report.stage_outcomes.iter().map(|(k, _)| *k).collect();
        assert!(stage_keys.contains(&"conflate_model"));
        assert!(stage_keys.contains(&"nd_create_rating_curves_db"));
        assert!(stage_keys.contains(&"run_known_wse"));
        assert!(stage_keys.contains(&"create_fim_lib"));
        assert!(report.walk_report.is_some());
    }

    /// Sin modelos conflados con éxito, el driver debe devolver un reporte
    /// que contenga solo `conflate_model` y terminar sin error.
    #[tokio::test]
    async fn no_surviving_models_short_circuits_the_dag() {
        let dir = tempfile::tempdir().unwrap();
        let paths = CollectionPaths::resolve(Path::new(dir.path()), "huc-1203");
        std::fs::create_dir_all(&paths.root).unwrap();

        let client = StateStoreClient::connect(":memory:", 5000).await.unwrap();
        let store = StateStoreRepository::new(client);
        store.init("1.0.0", 0.5, 0.5, &[]).await.unwrap();

        let job_client = JobClient::new("http://127.0.0.1:0", 1, 0.01);
        let config = config_with_all_stages();

        let driver = PipelineDriver::new(&job_client, &store, &paths, &config, "huc-1203");
        let report = driver.run_collection(Vec::new()).await.unwrap();

        assert_eq!(report.stage_outcomes.len(), 1);
        assert_eq!(report.stage_outcomes[0].0, "conflate_model");
    }
}
