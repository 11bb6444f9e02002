// [libs/infra/job-client/src/wire.rs]
//! Formas de respuesta del servicio remoto (§4.2). Sin lógica: solo la
//! deserialización del contrato HTTP.

use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    #[serde(rename = "jobID")]
    pub job_id: String,
}

#[derive(Debug, Deserialize)]
pub struct JobStatusResponse {
    pub status: String,
    pub updated: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct JobErrorBody {
    pub err: Option<String>,
    pub tb: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JobErrorResponse {
    #[serde(default)]
    pub result: Option<JobErrorBody>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JobMetadataEntry {
    pub accept_time: Option<String>,
    pub start_time: Option<String>,
    pub status_time: Option<String>,
    pub dismiss_time: Option<String>,
    pub finish_duration_minutes: Option<f64>,
    pub ogc_status: Option<String>,
    #[serde(default)]
    pub func_kwargs: serde_json::Map<String, serde_json::Value>,
}

pub type JobMetadataResponse = HashMap<String, JobMetadataEntry>;
