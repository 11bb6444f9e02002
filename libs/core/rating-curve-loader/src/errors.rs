// [libs/core/rating-curve-loader/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RatingCurveLoaderError {
    #[error("[L6_STATE_FAULT]: {0}")]
    StateStore(#[from] ripple_infra_state_store::StateStoreError),

    #[error("[L6_READ_FAULT]: {0}")]
    SubmodelReader(#[from] ripple_infra_submodel_reader::SubmodelReaderError),

    #[error("[L6_IO_FAULT]: {0}")]
    Io(#[from] std::io::Error),
}
