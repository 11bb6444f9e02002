// [libs/infra/job-client/src/client.rs]
/*!
 * =================================================================
 * APARATO: JOB CLIENT
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L2)
 * RESPONSABILIDAD: SOMETIDA, SONDEO Y CLASIFICACIÓN DE MISIONES REMOTAS
 *
 * "Client timeout" no mide tiempo pared desde la sometida: mide
 * `now_UTC - parse(updated)`, donde `updated` es el último timestamp de
 * estado reportado por el servidor (§4.2, "Idle-timeout semantics").
 * =================================================================
 */

use crate::errors::JobClientError;
use crate::wire::{JobErrorResponse, JobMetadataResponse, JobStatusResponse, SubmitResponse};
use chrono::{NaiveDateTime, Utc};
use ripple_domain_models::{EntityRef, JobRecord, JobStatus};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

const MAX_SUBMIT_ATTEMPTS: u32 = 5;
const SERVER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone)]
pub struct JobClient {
    http: Client,
    base_url: String,
    poll_wait: Duration,
    retry_wait_seconds: f64,
}

impl JobClient {
    pub fn new(base_url: impl Into<String>, poll_wait_seconds: u64, retry_wait_seconds: f64) -> Self {
        Self {
            http: Client::builder()
                .user_agent("ripple-pipeline-job-client/0.1")
                .build()
                .expect("FATAL: job client initialization failed"),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            poll_wait: Duration::from_secs(poll_wait_seconds),
            retry_wait_seconds,
        }
    }

    /// `POST /processes/<api_name>/execution` con hasta 5 intentos; un 500
    /// duerme `intento × retry_wait` y reintenta, cualquier otro código
    /// distinto de 201 falla de inmediato (§9: "Retry on 500 only").
    #[instrument(skip(self, payload))]
    pub async fn submit(&self, api_name: &str, payload: &serde_json::Value) -> (String, JobStatus) {
        let url = format!("{}/processes/{api_name}/execution", self.base_url);

        for attempt in 1..=MAX_SUBMIT_ATTEMPTS {
            let response = match self.http.post(&url).json(payload).send().await {
                Ok(response) => response,
                Err(error) => {
                    warn!(attempt, %error, "fallo de red al someter la misión");
                    tokio::time::sleep(Duration::from_secs_f64(attempt as f64 * self.retry_wait_seconds)).await;
                    continue;
                }
            };

            match response.status() {
                StatusCode::CREATED => {
                    return match response.json::<SubmitResponse>().await {
                        Ok(body) => (body.job_id, JobStatus::Accepted),
                        Err(error) => {
                            error!(%error, "respuesta 201 con envoltorio ilegible");
                            (String::new(), JobStatus::NotAccepted)
                        }
                    };
                }
                StatusCode::INTERNAL_SERVER_ERROR => {
                    debug!(attempt, "500 del servicio remoto, reintentando");
                    tokio::time::sleep(Duration::from_secs_f64(attempt as f64 * self.retry_wait_seconds)).await;
                }
                other => {
                    warn!(status = %other, "sometida rechazada sin reintento");
                    return (String::new(), JobStatus::NotAccepted);
                }
            }
        }

        (String::new(), JobStatus::NotAccepted)
    }

    fn parse_server_timestamp(raw: &str) -> Result<chrono::DateTime<Utc>, JobClientError> {
        NaiveDateTime::parse_from_str(raw, SERVER_TIMESTAMP_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(|_| JobClientError::TimestampParseFault(raw.to_string()))
    }

    async fn fetch_status(&self, job_id: &str) -> Result<JobStatusResponse, JobClientError> {
        let url = format!("{}/jobs/{job_id}", self.base_url);
        Ok(self.http.get(&url).send().await?.json::<JobStatusResponse>().await?)
    }

    /// Sondea a `poll_wait` hasta obtener un veredicto terminal o caer en
    /// inactividad. `true` en `successful`, `false` en `failed` o timeout.
    #[instrument(skip(self))]
    pub async fn check_successful(&self, job_id: &str, idle_timeout_minutes: i64) -> bool {
        loop {
            let status = match self.fetch_status(job_id).await {
                Ok(status) => status,
                Err(error) => {
                    warn!(job_id, %error, "fallo de sondeo, reintentando tras poll_wait");
                    tokio::time::sleep(self.poll_wait).await;
                    continue;
                }
            };

            match status.status.as_str() {
                "successful" => return true,
                "failed" => return false,
                _ => {
                    if let Ok(updated) = Self::parse_server_timestamp(&status.updated) {
                        let idle_for = Utc::now().signed_duration_since(updated);
                        if idle_for.num_minutes() > idle_timeout_minutes {
                            debug!(job_id, idle_minutes = idle_for.num_minutes(), "misión marcada unknown por inactividad");
                            return false;
                        }
                    }
                    tokio::time::sleep(self.poll_wait).await;
                }
            }
        }
    }

    /// Clasifica un único registro aceptado tras sondear su veredicto
    /// terminal o su timeout de inactividad (§4.2 "wait_for_jobs").
    async fn classify_one(&self, job_id: &str, idle_timeout_minutes: i64) -> JobStatus {
        loop {
            let status = match self.fetch_status(job_id).await {
                Ok(status) => status,
                Err(error) => {
                    warn!(job_id, %error, "fallo de sondeo, reintentando tras poll_wait");
                    tokio::time::sleep(self.poll_wait).await;
                    continue;
                }
            };

            match status.status.as_str() {
                "successful" => return JobStatus::Successful,
                "failed" => return JobStatus::Failed,
                _ => {
                    if let Ok(updated) = Self::parse_server_timestamp(&status.updated) {
                        let idle_for = Utc::now().signed_duration_since(updated);
                        if idle_for.num_minutes() > idle_timeout_minutes {
                            return JobStatus::Unknown;
                        }
                    }
                    tokio::time::sleep(self.poll_wait).await;
                }
            }
        }
    }

    /// Espera serialmente (un GET en vuelo a la vez; la paralelización es
    /// libertad de implementación, no requisito, §4.2) el veredicto de cada
    /// registro aceptado y reescribe su `status` en el lugar.
    #[instrument(skip(self, records))]
    pub async fn wait_for_jobs(
        &self,
        mut records: Vec<JobRecord>,
        idle_timeout_minutes: i64,
    ) -> (Vec<JobRecord>, Vec<JobRecord>, Vec<JobRecord>) {
        let (mut succeeded, mut failed, mut unknown) = (Vec::new(), Vec::new(), Vec::new());

        for record in records.drain(..) {
            let verdict = self.classify_one(&record.job_id, idle_timeout_minutes).await;
            let classified = JobRecord { status: verdict, ..record };
            match verdict {
                JobStatus::Successful => succeeded.push(classified),
                JobStatus::Failed => failed.push(classified),
                _ => unknown.push(classified),
            }
        }

        (succeeded, failed, unknown)
    }

    /// Sondeo único sin bucle de espera, usado por el barrido de
    /// reconciliación (§4.9) para refrescar un `status` persistido sin
    /// bloquear en inactividad — ese juicio es responsabilidad del Reportero,
    /// no del cliente.
    #[instrument(skip(self))]
    pub async fn poll_once(&self, job_id: &str) -> JobStatus {
        match self.fetch_status(job_id).await {
            Ok(status) => match status.status.as_str() {
                "successful" => JobStatus::Successful,
                "failed" => JobStatus::Failed,
                _ => JobStatus::Unknown,
            },
            Err(error) => {
                warn!(job_id, %error, "fallo de sondeo único durante reconciliación");
                JobStatus::Unknown
            }
        }
    }

    /// `(err_text, traceback_text)`; valores por defecto si los campos
    /// están ausentes (§4.2 "fetch_error").
    #[instrument(skip(self))]
    pub async fn fetch_error(&self, job_id: &str) -> (String, String) {
        let url = format!("{}/jobs/{job_id}?tb=true", self.base_url);
        let fallback = ("No error message".to_string(), "No traceback".to_string());

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(job_id, %error, "fallo al solicitar el error de la misión");
                return fallback;
            }
        };

        match response.json::<JobErrorResponse>().await {
            Ok(body) => {
                let body = body.result.unwrap_or_default();
                (
                    body.err.unwrap_or_else(|| fallback.0.clone()),
                    body.tb.unwrap_or_else(|| fallback.1.clone()),
                )
            }
            Err(error) => {
                warn!(job_id, %error, "envoltorio de error ilegible");
                fallback
            }
        }
    }

    /// `func_kwargs` de la misión, o un mapa vacío si el campo falta
    /// (§4.2 "fetch_payload").
    #[instrument(skip(self))]
    pub async fn fetch_payload(&self, job_id: &str) -> serde_json::Map<String, serde_json::Value> {
        match self.fetch_metadata(job_id).await {
            Ok(metadata) => metadata
                .get(job_id)
                .map(|entry| entry.func_kwargs.clone())
                .unwrap_or_default(),
            Err(error) => {
                warn!(job_id, %error, "metadata de misión ilegible");
                serde_json::Map::new()
            }
        }
    }

    /// `GET /jobs/<id>/metadata`, usado tanto por `fetch_payload` como por
    /// el Reportero (§4.10) para el detalle de trabajos expirados.
    #[instrument(skip(self))]
    pub async fn fetch_metadata(&self, job_id: &str) -> Result<JobMetadataResponse, JobClientError> {
        let url = format!("{}/jobs/{job_id}/metadata", self.base_url);
        Ok(self.http.get(&url).send().await?.json::<JobMetadataResponse>().await?)
    }

    /// `DELETE /jobs/<id>` por cada id; nunca propaga fallos (§4.2 "dismiss").
    #[instrument(skip(self, job_ids))]
    pub async fn dismiss(&self, job_ids: &[String]) {
        for job_id in job_ids {
            let url = format!("{}/jobs/{job_id}", self.base_url);
            if let Err(error) = self.http.delete(&url).send().await {
                warn!(job_id, %error, "fallo al descartar la misión; se ignora");
            }
        }
    }
}

/// Clasifica un lote de entidades recién sometidas en buckets `accepted` /
/// `not_accepted` a partir de los veredictos de `submit` (§4.3, paso 1 del
/// Step Processor). Función pura, sin E/S: separada para que el Step
/// Processor pueda probarla sin un cliente HTTP real.
pub fn bucket_submissions(entities: Vec<(EntityRef, (String, JobStatus))>) -> (Vec<JobRecord>, Vec<JobRecord>) {
    let mut accepted = Vec::new();
    let mut not_accepted = Vec::new();

    for (entity, (job_id, status)) in entities {
        let record = JobRecord { entity, job_id, status };
        match record.status {
            JobStatus::Accepted => accepted.push(record),
            _ => not_accepted.push(record),
        }
    }

    (accepted, not_accepted)
}
