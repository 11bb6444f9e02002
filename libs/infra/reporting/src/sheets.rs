// [libs/infra/reporting/src/sheets.rs]
//! Construcción de los dos libros `.xlsx` de la colección (§4.10): uno por
//! misiones falladas, otro por misiones expiradas (`unknown`), una hoja por
//! etapa de `FIXED_STAGE_ORDER` presente en `processing_steps`.

use crate::errors::ReportingError;
use ripple_domain_models::{EntityRef, JobRecord, JobStatus, PipelineConfig, FIXED_STAGE_ORDER};
use ripple_infra_job_client::JobClient;
use ripple_infra_state_store::StateStoreRepository;
use rust_xlsxwriter::Workbook;
use std::path::Path;
use tracing::{info, instrument};

fn entity_label(entity: &EntityRef) -> String {
    match entity {
        EntityRef::Model { model_id } => model_id.clone(),
        EntityRef::Reach { reach_id } => reach_id.to_string(),
    }
}

/// Hojas `.xlsx` de una sola etapa: filas `(id entidad, job_id)` más las
/// columnas adicionales que el llamador resuelva por fila.
async fn entities_for_stage(
    store: &StateStoreRepository,
    config: &PipelineConfig,
    stage: &str,
    status: JobStatus,
) -> Result<Vec<JobRecord>, ReportingError> {
    let Some(step) = config.processing_steps.get(stage) else {
        return Ok(Vec::new());
    };
    Ok(store.get_entities_by_process_and_status(step.domain, stage, status).await?)
}

/// Libro de misiones falladas (§4.10 "failed jobs report"): una hoja por
/// etapa con `(id, job_id, error, traceback)` para cada entidad `failed`.
#[instrument(skip(store, job_client, config))]
pub async fn write_failed_jobs_report(
    store: &StateStoreRepository,
    job_client: &JobClient,
    config: &PipelineConfig,
    out_path: &Path,
) -> Result<(), ReportingError> {
    let mut workbook = Workbook::new();
    let mut any_sheet = false;

    for stage in FIXED_STAGE_ORDER {
        let failed = entities_for_stage(store, config, stage, JobStatus::Failed).await?;
        if failed.is_empty() {
            continue;
        }
        any_sheet = true;

        let sheet = workbook.add_worksheet();
        sheet.set_name(*stage)?;
        sheet.write_string(0, 0, "entity_id")?;
        sheet.write_string(0, 1, "job_id")?;
        sheet.write_string(0, 2, "error")?;
        sheet.write_string(0, 3, "traceback")?;
        sheet.write_string(0, 4, "payload")?;

        for (row_index, record) in failed.iter().enumerate() {
            let row = (row_index + 1) as u32;
            let (error, traceback) = job_client.fetch_error(&record.job_id).await;
            let payload = job_client.fetch_payload(&record.job_id).await;
            sheet.write_string(row, 0, entity_label(&record.entity))?;
            sheet.write_string(row, 1, &record.job_id)?;
            sheet.write_string(row, 2, &error)?;
            sheet.write_string(row, 3, &traceback)?;
            sheet.write_string(row, 4, &serde_json::Value::Object(payload).to_string())?;
        }
    }

    if any_sheet {
        workbook.save(out_path)?;
        info!(path = %out_path.display(), "reporte de misiones falladas escrito");
    } else {
        info!("sin misiones falladas en ninguna etapa; se omite el reporte");
    }
    Ok(())
}

/// Libro de misiones expiradas (§4.10 "timed-out jobs report"): una hoja por
/// etapa con `(id, job_id, ...)` y el detalle de `fetch_metadata` para cada
/// entidad `unknown` — el caso que la poda normal del Step Processor no
/// resuelve a un veredicto terminal (§4.2 "Idle-timeout semantics").
#[instrument(skip(store, job_client, config))]
pub async fn write_timedout_jobs_report(
    store: &StateStoreRepository,
    job_client: &JobClient,
    config: &PipelineConfig,
    out_path: &Path,
) -> Result<(), ReportingError> {
    let mut workbook = Workbook::new();
    let mut any_sheet = false;

    for stage in FIXED_STAGE_ORDER {
        let timedout = entities_for_stage(store, config, stage, JobStatus::Unknown).await?;
        if timedout.is_empty() {
            continue;
        }
        any_sheet = true;

        let sheet = workbook.add_worksheet();
        sheet.set_name(*stage)?;
        for (col, header) in [
            "entity_id",
            "job_id",
            "accept_time",
            "start_time",
            "status_time",
            "dismiss_time",
            "finish_duration_minutes",
            "ogc_status",
            "payload",
        ]
        .iter()
        .enumerate()
        {
            sheet.write_string(0, col as u16, *header)?;
        }

        for (row_index, record) in timedout.iter().enumerate() {
            let row = (row_index + 1) as u32;
            let metadata = job_client.fetch_metadata(&record.job_id).await.ok();
            let entry = metadata.as_ref().and_then(|map| map.get(&record.job_id));
            let payload = job_client.fetch_payload(&record.job_id).await;

            sheet.write_string(row, 0, entity_label(&record.entity))?;
            sheet.write_string(row, 1, &record.job_id)?;
            sheet.write_string(row, 2, entry.and_then(|e| e.accept_time.clone()).unwrap_or_default())?;
            sheet.write_string(row, 3, entry.and_then(|e| e.start_time.clone()).unwrap_or_default())?;
            sheet.write_string(row, 4, entry.and_then(|e| e.status_time.clone()).unwrap_or_default())?;
            sheet.write_string(row, 5, entry.and_then(|e| e.dismiss_time.clone()).unwrap_or_default())?;
            if let Some(minutes) = entry.and_then(|e| e.finish_duration_minutes) {
                sheet.write_number(row, 6, minutes)?;
            }
            sheet.write_string(row, 7, entry.and_then(|e| e.ogc_status.clone()).unwrap_or_default())?;
            sheet.write_string(row, 8, &serde_json::Value::Object(payload).to_string())?;
        }
    }

    if any_sheet {
        workbook.save(out_path)?;
        info!(path = %out_path.display(), "reporte de misiones expiradas escrito");
    } else {
        info!("sin misiones expiradas en ninguna etapa; se omite el reporte");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_infra_collection_context::CollectionPaths;
    use ripple_infra_state_store::StateStoreClient;
    use std::path::Path as StdPath;
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
    async fn failed_jobs_report_skips_writing_when_nothing_failed() {
        let dir = tempfile::tempdir().unwrap();
        let paths = CollectionPaths::resolve(StdPath::new(dir.path()), "huc-1203");
        std::fs::create_dir_all(&paths.root).unwrap();

        let client = StateStoreClient::connect(":memory:", 5000).await.unwrap();
        let store = StateStoreRepository::new(client);
        store.init("1.0.0", 0.5, 0.5, &[(100, None)]).await.unwrap();

        let job_client = JobClient::new("http://127.0.0.1:0", 1, 0.01);
        let config = config_with_one_reach_stage();

        write_failed_jobs_report(&store, &job_client, &config, &paths.failed_jobs_report).await.unwrap();
        assert!(!paths.failed_jobs_report.exists());
    }

    #[tokio::test]
    async fn failed_jobs_report_writes_one_sheet_with_error_detail() {
        let dir = tempfile::tempdir().unwrap();
        let paths = CollectionPaths::resolve(StdPath::new(dir.path()), "huc-1203");
        std::fs::create_dir_all(&paths.root).unwrap();

        let client = StateStoreClient::connect(":memory:", 5000).await.unwrap();
        let store = StateStoreRepository::new(client);
        store.init("1.0.0", 0.5, 0.5, &[(100, None)]).await.unwrap();
        store
            .update_status(ripple_domain_models::EntityDomain::Reach, "extract_submodel", JobStatus::Failed, "100")
            .await
            .unwrap();

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/jobs/.+$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": {"err": "boom", "tb": "trace"}
            })))
            .mount(&mock_server)
            .await;

        let job_client = JobClient::new(mock_server.uri(), 1, 0.01);
        let config = config_with_one_reach_stage();

        write_failed_jobs_report(&store, &job_client, &config, &paths.failed_jobs_report).await.unwrap();
        assert!(paths.failed_jobs_report.exists());
    }
}
