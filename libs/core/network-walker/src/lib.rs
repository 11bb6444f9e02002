// [libs/core/network-walker/src/lib.rs]
/*!
 * =================================================================
 * APARATO: NETWORK WALKER
 * CLASIFICACIÓN: CORE ENGINE (ESTRATO L5)
 * RESPONSABILIDAD: FASE iKWSE: RECORRIDO CONCURRENTE AGUAS-ABAJO-PRIMERO
 * =================================================================
 */

pub mod errors;
pub mod walk;

pub use errors::NetworkWalkerError;
pub use walk::{IkwseStageConfigs, NetworkWalker, WalkReport, WalkStageConfig};

#[cfg(test)]
mod integration_tests {
    use super::*;
    use ripple_infra_collection_context::CollectionPaths;
    use ripple_infra_job_client::JobClient;
    use ripple_infra_state_store::{StateStoreClient, StateStoreRepository};
    use serde_json::json;
    use std::path::Path;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn stage_config(stage_key: &'static str, api_process_name: &str) -> WalkStageConfig {
        WalkStageConfig {
            stage_key,
            api_process_name: api_process_name.to_string(),
            payload_template: json!({"inputs": {"reach_id": "{nwm_reach_id}"}}),
            timeout_minutes: 5,
        }
    }

    async fn seeded_store(reaches: &[(i64, Option<i64>)]) -> StateStoreRepository {
        let client = StateStoreClient::connect(":memory:", 5000).await.unwrap();
        let store = StateStoreRepository::new(client);
        store.init("1.0.0", 0.5, 0.5, reaches).await.unwrap();
        store
    }

    /// Red lineal de dos reaches (5 aguas abajo de 10): el walker debe
    /// someter iKWSE para 10 (aguas abajo=5) y omitirlo para 5 (es salida),
    /// y construir rc_db para ambos (§4.5, caso E1-like de dos reaches).
    #[tokio::test]
    async fn walks_linear_two_reach_network_outlet_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&[(10, Some(5)), (5, None)]).await;

        let submodels_dir = dir.path().join("submodels");
        for reach_id in [5_i64, 10] {
            std::fs::create_dir_all(submodels_dir.join(reach_id.to_string())).unwrap();
        }

        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/processes/.+/execution$"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"jobID": "job-1", "status": "accepted"})))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/jobs/.+$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jobID": "job-1", "status": "successful", "updated": "2026-01-01T00:00:00Z"})))
            .mount(&mock_server)
            .await;

        let job_client = JobClient::new(mock_server.uri(), 1, 0.1);
        let paths = CollectionPaths::resolve(Path::new(dir.path()), "huc-test");

        let walker = NetworkWalker::new(job_client, store, paths, 4);
        let configs = IkwseStageConfigs {
            run_iknown_wse: stage_config("run_iknown_wse", "run_known_wse"),
            create_irating_curves_db: stage_config("create_irating_curves_db", "create_rating_curves_db"),
        };

        let report = walker.run(&configs).await.unwrap();
        assert_eq!(report.processed, 2);
        assert!(report.rc_db_succeeded.contains(&5));
        assert!(report.rc_db_succeeded.contains(&10));

        let start_reaches = std::fs::read_to_string(dir.path().join("huc-test").join("start_reaches.csv")).unwrap();
        assert_eq!(start_reaches, "5,nd\n");
    }

    /// Sin `<id>.db` aguas abajo: el reach de salida (sin aguas abajo) no
    /// debe llamar a iKWSE en absoluto, solo al paso rc_db (§4.5, "If
    /// min/max absent, skip the KWSE submit but continue" aplicado a un
    /// reach de salida que nunca entra a `run_ikwse_stage`).
    #[tokio::test]
    async fn outlet_reach_skips_ikwse_and_still_builds_rating_curves_db() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&[(5, None)]).await;
        std::fs::create_dir_all(dir.path().join("submodels").join("5")).unwrap();

        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/processes/create_rating_curves_db/execution$"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"jobID": "job-2", "status": "accepted"})))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/jobs/.+$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jobID": "job-2", "status": "successful", "updated": "2026-01-01T00:00:00Z"})))
            .mount(&mock_server)
            .await;

        let job_client = JobClient::new(mock_server.uri(), 1, 0.1);
        let paths = CollectionPaths::resolve(Path::new(dir.path()), "huc-test");
        let walker = NetworkWalker::new(job_client, store, paths, 1);
        let configs = IkwseStageConfigs {
            run_iknown_wse: stage_config("run_iknown_wse", "run_known_wse"),
            create_irating_curves_db: stage_config("create_irating_curves_db", "create_rating_curves_db"),
        };

        let report = walker.run(&configs).await.unwrap();
        assert_eq!(report.rc_db_succeeded, vec![5]);
    }
}
