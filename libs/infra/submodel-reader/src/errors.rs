// [libs/infra/submodel-reader/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubmodelReaderError {
    #[error("[L1b_SUBMODEL_FAULT]: RESULT_DB_UNREADABLE -> {0}")]
    QueryError(#[from] libsql::Error),

    #[error("[L1b_SUBMODEL_FAULT]: UNRECOGNIZED_BOUNDARY_CONDITION -> {0}")]
    UnrecognizedBoundaryCondition(String),
}
