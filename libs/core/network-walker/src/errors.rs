// [libs/core/network-walker/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetworkWalkerError {
    #[error("[L5_STATE_FAULT]: {0}")]
    StateStore(#[from] ripple_infra_state_store::StateStoreError),

    #[error("[L5_SUBMODEL_FAULT]: {0}")]
    SubmodelReader(#[from] ripple_infra_submodel_reader::SubmodelReaderError),

    #[error("[L5_IO_FAULT]: {0}")]
    Io(#[from] std::io::Error),
}
