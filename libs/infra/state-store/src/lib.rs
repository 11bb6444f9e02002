// [libs/infra/state-store/src/lib.rs]
//
// =================================================================
// APARATO: STATE STORE
// CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L1)
// RESPONSABILIDAD: ALMACÉN RELACIONAL EMBEBIDO DE ESTADO DE MISIÓN
// =================================================================

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;

pub use client::StateStoreClient;
pub use errors::StateStoreError;
pub use repositories::{RatingCurveTable, StateStoreRepository};

#[cfg(test)]
mod integration_tests {
    use super::*;
    use ripple_domain_models::{ConflationPayload, ConflationReachEntry, JobStatus, ModelRecord};
    use std::collections::HashMap;

    async fn fresh_repository() -> StateStoreRepository {
        let client = StateStoreClient::connect(":memory:", 10_000).await.expect("connect");
        StateStoreRepository::new(client)
    }

    #[tokio::test]
    async fn init_seeds_network_and_processing_from_reaches() {
        let repo = fresh_repository().await;
        repo.init("1.0.0", 0.5, 0.5, &[(100, Some(200)), (200, None)]).await.unwrap();

        let valid = repo.get_valid_reaches().await.unwrap();
        assert_eq!(valid.get(&100), Some(&Some(200)));
        assert_eq!(valid.get(&200), Some(&None));
    }

    #[tokio::test]
    async fn two_reach_linear_network_update_network_sets_downstream() {
        // E1 precondition: no eclipsed reaches, update_network is a no-op on
        // a linear chain because nothing was skipped.
        let repo = fresh_repository().await;
        repo.init("1.0.0", 0.5, 0.5, &[(100, Some(200)), (200, None)]).await.unwrap();
        let applied = repo.run_update_network().await.unwrap();
        assert_eq!(applied, 0);
    }

    #[tokio::test]
    async fn eclipsed_middle_reach_updates_downstream_across_the_gap() {
        // E2 scenario.
        let repo = fresh_repository().await;
        repo.init("1.0.0", 0.5, 0.5, &[(100, Some(150)), (150, Some(200)), (200, None)]).await.unwrap();

        let mut reaches = HashMap::new();
        reaches.insert(150, ConflationReachEntry { eclipsed: true });
        let payload = ConflationPayload { model_id: "M".into(), reaches, total_ras_length: Some(10.0) };
        repo.update_conflation(&payload).await.unwrap();

        let applied = repo.run_update_network().await.unwrap();
        assert_eq!(applied, 1);

        let connection = repo
            .get_reaches_by_models(&["nonexistent".to_string()])
            .await
            .unwrap();
        assert!(connection.is_empty());
    }

    #[tokio::test]
    async fn update_models_then_query_by_status_round_trips() {
        let repo = fresh_repository().await;
        repo.insert_models(&[ModelRecord {
            collection_id: "C".into(),
            model_id: "M".into(),
            model_name: "Model One".into(),
        }])
        .await
        .unwrap();

        repo.update_models("C", "conflate_model", JobStatus::Successful, &[("M".into(), "job-1".into())])
            .await
            .unwrap();

        let records = repo
            .get_entities_by_process_and_status(ripple_domain_models::EntityDomain::Model, "conflate_model", JobStatus::Successful)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].job_id, "job-1");
    }

    #[tokio::test]
    async fn rating_curve_insert_is_idempotent_under_unique_constraint() {
        // E6 scenario.
        let repo = fresh_repository().await;
        repo.init("1.0.0", 0.5, 0.5, &[(100, None)]).await.unwrap();

        let row = ripple_domain_models::RatingCurveRow {
            reach_id: 100,
            us_flow: 10.0,
            us_depth: 1.0,
            us_wse: 5.0,
            ds_depth: 0.5,
            ds_wse: 4.5,
            boundary_condition: ripple_domain_models::BoundaryCondition::Nd,
        };

        let first = repo.insert_rating_curves(RatingCurveTable::WithMap, &[row.clone()]).await.unwrap();
        let second = repo.insert_rating_curves(RatingCurveTable::WithMap, &[row]).await.unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 0);
    }
}
