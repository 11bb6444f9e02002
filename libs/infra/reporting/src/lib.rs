// [libs/infra/reporting/src/lib.rs]
/*!
 * =================================================================
 * APARATO: REPORTING
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L2)
 * RESPONSABILIDAD: REPORTES .XLSX Y BARRIDO DE RECONCILIACIÓN (§4.9, §4.10)
 *
 * Corre después del DAG, nunca como parte de él: una etapa que falla no
 * impide que el reporte se escriba, y el reporte no decide el código de
 * salida del binario (eso es responsabilidad de `apps/pipeline`).
 * =================================================================
 */

pub mod errors;
pub mod reconcile;
pub mod sheets;

pub use errors::ReportingError;
pub use reconcile::{reconcile, ReconcileReport};
pub use sheets::{write_failed_jobs_report, write_timedout_jobs_report};
