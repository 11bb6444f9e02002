// [libs/core/step-processor/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StepProcessorError {
    #[error("[L3_STATE_FAULT]: {0}")]
    StateStore(#[from] ripple_infra_state_store::StateStoreError),

    #[error("[L3_SUBMODEL_FAULT]: {0}")]
    SubmodelReader(#[from] ripple_infra_submodel_reader::SubmodelReaderError),
}
