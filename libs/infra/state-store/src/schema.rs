// [libs/infra/state-store/src/schema.rs]
/*!
 * =================================================================
 * APARATO: STATE STORE SCHEMA
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L1)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * La tabla `processing` genera un par de columnas `<stage>_job_id` /
 * `<stage>_status` por cada entrada de `FIXED_STAGE_ORDER` (§9, "Column-set
 * evolution") en lugar de enumerarlas a mano.
 * =================================================================
 */

use crate::errors::StateStoreError;
use libsql::Connection;
use ripple_domain_models::FIXED_STAGE_ORDER;
use tracing::{debug, instrument};

const TABLE_METADATA: &str = r#"
    CREATE TABLE IF NOT EXISTS metadata (
        tool_version TEXT NOT NULL,
        us_depth_increment REAL NOT NULL,
        ds_depth_increment REAL NOT NULL
    );
"#;

const TABLE_MODELS: &str = r#"
    CREATE TABLE IF NOT EXISTS models (
        collection_id TEXT NOT NULL,
        model_id TEXT NOT NULL,
        model_name TEXT NOT NULL,
        conflate_model_job_id TEXT,
        conflate_model_status TEXT,
        PRIMARY KEY (collection_id, model_id)
    );
"#;

const TABLE_REACHES: &str = r#"
    CREATE TABLE IF NOT EXISTS reaches (
        reach_id INTEGER PRIMARY KEY,
        nwm_to_id INTEGER,
        geom BLOB
    );
"#;

const TABLE_NETWORK: &str = r#"
    CREATE TABLE IF NOT EXISTS network (
        reach_id INTEGER PRIMARY KEY REFERENCES reaches(reach_id),
        nwm_to_id INTEGER,
        updated_to_id INTEGER
    );
"#;

const TABLE_RATING_CURVES_TEMPLATE: &str = r#"
    CREATE TABLE IF NOT EXISTS {table} (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        reach_id INTEGER NOT NULL,
        us_flow REAL,
        us_depth REAL,
        us_wse REAL,
        ds_depth REAL,
        ds_wse REAL,
        boundary_condition TEXT NOT NULL CHECK (boundary_condition IN ('nd', 'kwse')),
        UNIQUE(reach_id, us_flow, ds_wse, boundary_condition)
    );
"#;

const ACCELERATION_INDEXES: &[(&str, &str)] = &[
    ("IDX_NETWORK_NWM_TO_ID", "CREATE INDEX IF NOT EXISTS idx_network_nwm_to_id ON network(nwm_to_id);"),
    ("IDX_NETWORK_UPDATED_TO_ID", "CREATE INDEX IF NOT EXISTS idx_network_updated_to_id ON network(updated_to_id);"),
    ("IDX_RATING_CURVES_REACH_ID", "CREATE INDEX IF NOT EXISTS idx_rating_curves_reach_id ON rating_curves(reach_id);"),
    ("IDX_RATING_CURVES_NO_MAP_REACH_ID", "CREATE INDEX IF NOT EXISTS idx_rating_curves_no_map_reach_id ON rating_curves_no_map(reach_id);"),
];

fn processing_table_ddl() -> String {
    let mut columns = String::from(
        "reach_id INTEGER PRIMARY KEY REFERENCES reaches(reach_id), \
         collection_id TEXT, \
         model_id TEXT, \
         eclipsed INTEGER NOT NULL DEFAULT 0",
    );
    for stage in FIXED_STAGE_ORDER {
        columns.push_str(&format!(", {stage}_job_id TEXT, {stage}_status TEXT"));
    }
    format!("CREATE TABLE IF NOT EXISTS processing ({columns});")
}

#[instrument(skip(connection))]
pub async fn apply_schema(connection: &Connection) -> Result<(), StateStoreError> {
    debug!("aplicando esquema del almacén de estado");

    connection.execute(TABLE_METADATA, ()).await?;
    connection.execute(TABLE_MODELS, ()).await?;
    connection.execute(TABLE_REACHES, ()).await?;
    connection.execute(TABLE_NETWORK, ()).await?;
    connection.execute(&processing_table_ddl(), ()).await?;
    connection
        .execute(&TABLE_RATING_CURVES_TEMPLATE.replace("{table}", "rating_curves"), ())
        .await?;
    connection
        .execute(&TABLE_RATING_CURVES_TEMPLATE.replace("{table}", "rating_curves_no_map"), ())
        .await?;

    for (identifier, sql) in ACCELERATION_INDEXES {
        debug!(identifier, "creando índice de aceleración");
        connection.execute(sql, ()).await?;
    }

    Ok(())
}
