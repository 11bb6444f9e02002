// [libs/infra/reporting/src/reconcile.rs]
//! Barrido de reconciliación opcional (§4.9): re-sondea el servicio remoto
//! por cada `(id, job_id)` ya persistido en una etapa y reescribe el
//! `status` si cambió. Pensado para correr fuera del DAG normal, después de
//! una interrupción del proceso que dejó misiones en vuelo sin clasificar.

use crate::errors::ReportingError;
use ripple_domain_models::{PipelineConfig, FIXED_STAGE_ORDER};
use ripple_infra_job_client::JobClient;
use ripple_infra_state_store::StateStoreRepository;
use tracing::{info, instrument};

#[derive(Debug, Default, Clone)]
pub struct ReconcileReport {
    pub checked: usize,
    pub updated: usize,
}

/// Para cada etapa con configuración conocida, vuelve a consultar cada
/// `job_id` registrado y reescribe su `status` en el almacén. No distingue
/// si el valor cambió: `update_status` es idempotente y el costo de
/// reescribir un valor igual es despreciable frente a una consulta SQL
/// adicional para comparar.
#[instrument(skip(store, job_client, config))]
pub async fn reconcile(store: &StateStoreRepository, job_client: &JobClient, config: &PipelineConfig) -> Result<ReconcileReport, ReportingError> {
    let mut report = ReconcileReport::default();

    for stage in FIXED_STAGE_ORDER {
        let Some(step) = config.processing_steps.get(*stage) else {
            continue;
        };
        let pairs = store.get_all_job_ids_for_stage(step.domain, stage).await?;

        for (entity_id, job_id) in pairs {
            report.checked += 1;
            let status = job_client.poll_once(&job_id).await;
            store.update_status(step.domain, stage, status, &entity_id).await?;
            report.updated += 1;
        }
    }

    info!(checked = report.checked, updated = report.updated, "barrido de reconciliación completado");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_domain_models::{EntityDomain, JobStatus};
    use ripple_infra_state_store::StateStoreClient;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_with_one_reach_stage() -> PipelineConfig {
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
  extract_submodel: { api_process_name: extract_submodel, domain: reach, payload_template: {}, timeout_minutes: 10 }
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

    #[tokio::test]
    async fn reconcile_rewrites_status_from_fresh_poll() {
        let client = StateStoreClient::connect(":memory:", 5000).await.unwrap();
        let store = StateStoreRepository::new(client);
        store.init("1.0.0", 0.5, 0.5, &[(100, None)]).await.unwrap();
        store.update_processing("extract_submodel", JobStatus::Accepted, &[(100, "job-100".to_string())]).await.unwrap();

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/jobs/.+$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "successful", "updated": "2026-01-01 00:00:00"})))
            .mount(&mock_server)
            .await;
        let job_client = JobClient::new(mock_server.uri(), 1, 0.01);
        let config = config_with_one_reach_stage();

        let report = reconcile(&store, &job_client, &config).await.unwrap();
        assert_eq!(report.checked, 1);
        assert_eq!(report.updated, 1);

        let remaining_unknown = store.get_entities_by_process_and_status(EntityDomain::Reach, "extract_submodel", JobStatus::Unknown).await.unwrap();
        assert!(remaining_unknown.is_empty());
    }
}
