// [libs/infra/job-client/src/errors.rs]
/*!
 * =================================================================
 * APARATO: JOB CLIENT ERROR CATALOG
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L2)
 * RESPONSABILIDAD: CATALOGACIÓN DE FALLOS DE COMUNICACIÓN REMOTA
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobClientError {
    #[error("[L2_NET_FAULT]: REMOTE_SERVICE_UNREACHABLE -> {0}")]
    NetworkFault(#[from] reqwest::Error),

    #[error("[L2_DECODE_FAULT]: RESPONSE_ENVELOPE_REJECTED -> {0}")]
    DecodingFault(#[from] serde_json::Error),

    #[error("[L2_TIMESTAMP_FAULT]: UNPARSEABLE_SERVER_TIMESTAMP -> {0}")]
    TimestampParseFault(String),
}
