// [libs/core/step-processor/src/lib.rs]
/*!
 * =================================================================
 * APARATO: STEP PROCESSOR
 * CLASIFICACIÓN: CORE ENGINE (ESTRATO L3/L4)
 * RESPONSABILIDAD: TEMPLATE GENÉRICO DE ETAPA + ESPECIALIZACIONES DE PAYLOAD
 * =================================================================
 */

pub mod conflate;
pub mod errors;
pub mod kwse;
pub mod processor;
pub mod reach;
pub mod template;

pub use errors::StepProcessorError;
pub use processor::{run_stage, StepOutcome, SubmissionInput};
