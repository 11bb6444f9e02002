// [libs/infra/reporting/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportingError {
    #[error("[L2_STATE_FAULT]: {0}")]
    StateStore(#[from] ripple_infra_state_store::StateStoreError),

    #[error("[L2_XLSX_FAULT]: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("[L2_IO_FAULT]: {0}")]
    Io(#[from] std::io::Error),
}
