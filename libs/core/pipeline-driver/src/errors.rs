// [libs/core/pipeline-driver/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineDriverError {
    #[error("[L7_STATE_FAULT]: {0}")]
    StateStore(#[from] ripple_infra_state_store::StateStoreError),

    #[error("[L7_STEP_FAULT]: {0}")]
    StepProcessor(#[from] ripple_core_step_processor::StepProcessorError),

    #[error("[L7_WALK_FAULT]: {0}")]
    NetworkWalker(#[from] ripple_core_network_walker::NetworkWalkerError),

    #[error("[L7_MERGE_FAULT]: {0}")]
    RatingCurveLoader(#[from] ripple_core_rating_curve_loader::RatingCurveLoaderError),

    #[error("[L7_READ_FAULT]: {0}")]
    SubmodelReader(#[from] ripple_infra_submodel_reader::SubmodelReaderError),

    #[error("[L7_CONTEXT_FAULT]: {0}")]
    Context(#[from] ripple_infra_collection_context::ContextError),

    #[error("[L7_IO_FAULT]: {0}")]
    Io(#[from] std::io::Error),

    #[error("[L7_CONFIG_FAULT]: STAGE_CONFIG_MISSING -> '{0}' no está en processing_steps")]
    MissingStageConfig(&'static str),
}
