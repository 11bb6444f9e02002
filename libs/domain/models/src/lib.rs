// [libs/domain/models/src/lib.rs]
//
// =================================================================
// APARATO: DOMAIN MODELS
// CLASIFICACIÓN: CONTRATOS SOBERANOS (ESTRATO L0)
// RESPONSABILIDAD: TIPOS COMPARTIDOS ENTRE TODAS LAS CAPAS DEL PIPELINE
//
// Sin lógica de E/S. Si un tipo de aquí necesita conocer SQL, HTTP o el
// sistema de archivos, pertenece a otra capa.
// =================================================================

pub mod config;
pub mod entity;
pub mod stage;

pub use config::{
    BatchConfig, DatabaseConfig, ExecutionConfig, Flows2FimConfig, PathsConfig, PipelineConfig,
    PollingConfig, ProcessingStepConfig, QcConfig, RippleSettings,
};
pub use entity::{
    BoundaryCondition, ConflationPayload, ConflationReachEntry, ElevationRange, EntityDomain,
    EntityRef, JobRecord, JobStatus, ModelRecord, RatingCurveRow, ReachRecord,
};
pub use stage::{next_stage, phase_of, previous_stage, stage_index, StagePhase, FIXED_STAGE_ORDER};
