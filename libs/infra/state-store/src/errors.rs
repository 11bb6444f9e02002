// [libs/infra/state-store/src/errors.rs]
/*!
 * =================================================================
 * APARATO: STATE STORE ERROR CATALOG
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L1)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE PERSISTENCIA
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateStoreError {
    #[error("[L1_DB_NET_FAULT]: STATE_STORE_UPLINK_SEVERED -> {0}")]
    ConnectionError(String),

    #[error("[L1_DB_QUERY_FAULT]: SQL_QUERY_REJECTED -> {0}")]
    QueryError(#[from] libsql::Error),

    #[error("[L1_DB_MAPPING_FAULT]: DATA_MAPPING_VIOLATION -> {0}")]
    MappingError(String),

    #[error("[L1_DB_SCHEMA_FAULT]: UNRECOGNIZED_STAGE_KEY -> {0}")]
    UnrecognizedStage(String),

    #[error("[L1_DB_FAULT]: TRANSACTION_COLLAPSE -> {0}")]
    TransactionError(String),

    #[error("[L1_DB_FAULT]: METADATA_ALREADY_SEEDED")]
    MetadataAlreadySeeded,
}
