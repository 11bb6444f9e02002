// [libs/infra/collection-context/src/errors.rs]
/*!
 * =================================================================
 * APARATO: COLLECTION CONTEXT ERROR CATALOG
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L8)
 * RESPONSABILIDAD: CATALOGACIÓN DE FALLOS DE ARRANQUE (FATALES, §7)
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("[L8_CONFIG_FAULT]: CONFIG_FILE_UNREADABLE -> {0}")]
    ConfigUnreadable(#[from] std::io::Error),

    #[error("[L8_CONFIG_FAULT]: CONFIG_YAML_MALFORMED -> {0}")]
    ConfigMalformed(#[from] serde_yaml::Error),

    #[error("[L8_CONFIG_FAULT]: COLLECTION_ROOT_MISSING -> {0}")]
    CollectionRootMissing(String),

    #[error("[L8_CONFIG_FAULT]: REQUIRED_ENV_VAR_MISSING -> {0}")]
    MissingEnvVar(String),

    #[error("[L8_SEED_FAULT]: NWM_FLOWLINES_UNREADABLE -> {0}")]
    FlowlinesUnreadable(#[from] libsql::Error),
}
