// [libs/infra/state-store/src/repositories/queries.rs]
/*!
 * =================================================================
 * APARATO: STATE STORE SQL REGISTRY
 * CLASIFICACIÓN: INFRASTRUCTURE SQL (ESTRATO L1)
 * RESPONSABILIDAD: DEFINICIÓN DE SENTENCIAS PARA EL ALMACÉN DE ESTADO
 *
 * Las consultas que tocan columnas por etapa (`<stage>_job_id` /
 * `<stage>_status`) se generan en tiempo de ejecución porque SQLite no
 * permite enlazar nombres de columna como parámetros; `stage` siempre
 * proviene de `FIXED_STAGE_ORDER`, nunca de entrada externa sin validar.
 * =================================================================
 */

// --- ESTRATO DE INICIALIZACIÓN ---

pub const COUNT_METADATA: &str = "SELECT COUNT(*) FROM metadata";

pub const INSERT_METADATA: &str = r#"
    INSERT INTO metadata (tool_version, us_depth_increment, ds_depth_increment)
    VALUES (?1, ?2, ?3)
"#;

pub const SEED_REACH: &str = r#"
    INSERT OR IGNORE INTO reaches (reach_id, nwm_to_id, geom) VALUES (?1, ?2, ?3)
"#;

pub const SEED_NETWORK_FROM_REACHES: &str = r#"
    INSERT OR IGNORE INTO network (reach_id, nwm_to_id, updated_to_id)
    SELECT reach_id, nwm_to_id, NULL FROM reaches
"#;

pub const SEED_PROCESSING_FROM_REACHES: &str = r#"
    INSERT OR IGNORE INTO processing (reach_id, collection_id, model_id, eclipsed)
    SELECT reach_id, NULL, NULL, 0 FROM reaches
"#;

// --- ESTRATO DE MODELOS ---

pub const INSERT_MODEL: &str = r#"
    INSERT OR IGNORE INTO models (collection_id, model_id, model_name)
    VALUES (?1, ?2, ?3)
"#;

pub fn update_model_stage(stage: &str) -> String {
    format!(
        "UPDATE models SET {stage}_job_id = ?1, {stage}_status = ?2 \
         WHERE collection_id = ?3 AND model_id = ?4"
    )
}

// --- ESTRATO DE PROCESAMIENTO (REACHES) ---

pub fn update_processing_stage(stage: &str) -> String {
    format!("UPDATE processing SET {stage}_job_id = ?1, {stage}_status = ?2 WHERE reach_id = ?3")
}

pub const UPDATE_CONFLATION_REACH: &str = r#"
    UPDATE processing SET model_id = ?1, eclipsed = ?2 WHERE reach_id = ?3
"#;

// --- ESTRATO DE RED ---

pub const SELECT_VALID_REACHES: &str = r#"
    SELECT n.reach_id, n.nwm_to_id
    FROM network n
    JOIN processing p ON p.reach_id = n.reach_id
    WHERE p.eclipsed = 0
"#;

pub const SELECT_ECLIPSED_REACHES: &str = r#"
    SELECT n.reach_id, n.nwm_to_id
    FROM network n
    JOIN processing p ON p.reach_id = n.reach_id
    WHERE p.eclipsed = 1
"#;

pub const UPDATE_NETWORK_EDGE: &str = "UPDATE network SET updated_to_id = ?1 WHERE reach_id = ?2";

pub const SELECT_UPSTREAM_REACHES: &str = "SELECT reach_id FROM network WHERE updated_to_id = ?1";

/// Reaches de salida (outlets) tras Update-Network: no eclipsados y sin
/// aguas abajo (§4.5 "Inputs: the set of outlet reaches").
pub const SELECT_OUTLET_REACHES: &str = r#"
    SELECT n.reach_id
    FROM network n
    JOIN processing p ON p.reach_id = n.reach_id
    WHERE p.eclipsed = 0 AND n.updated_to_id IS NULL
"#;

pub fn select_reaches_by_models(model_count: usize) -> String {
    let placeholders: Vec<String> = (1..=model_count).map(|i| format!("?{i}")).collect();
    format!(
        "SELECT n.reach_id, n.updated_to_id, p.model_id, m.model_name \
         FROM network n \
         JOIN processing p ON p.reach_id = n.reach_id \
         JOIN models m ON m.model_id = p.model_id AND m.collection_id = p.collection_id \
         WHERE p.eclipsed = 0 AND p.model_id IN ({})",
        placeholders.join(", ")
    )
}

// --- ESTRATO DE RECONSULTA (REPORTING / RECONCILIATION) ---

pub fn select_entities_by_process_and_status_reach(stage: &str) -> String {
    format!("SELECT reach_id, {stage}_job_id, {stage}_status FROM processing WHERE {stage}_status = ?1")
}

pub fn select_entities_by_process_and_status_model(stage: &str) -> String {
    format!("SELECT model_id, {stage}_job_id, {stage}_status FROM models WHERE {stage}_status = ?1")
}

pub fn update_single_status_reach(stage: &str) -> String {
    format!("UPDATE processing SET {stage}_status = ?1 WHERE reach_id = ?2")
}

pub fn update_single_status_model(stage: &str) -> String {
    format!("UPDATE models SET {stage}_status = ?1 WHERE model_id = ?2")
}

pub fn select_all_job_ids_for_stage_reach(stage: &str) -> String {
    format!("SELECT reach_id, {stage}_job_id FROM processing WHERE {stage}_job_id IS NOT NULL")
}

pub fn select_all_job_ids_for_stage_model(stage: &str) -> String {
    format!("SELECT model_id, {stage}_job_id FROM models WHERE {stage}_job_id IS NOT NULL")
}

pub fn select_failed_or_unknown_reach(stage: &str) -> String {
    format!(
        "SELECT reach_id, {stage}_job_id, {stage}_status FROM processing \
         WHERE {stage}_status IN ('failed', 'unknown')"
    )
}

// --- ESTRATO DE CURVAS DE GASTO ---

/// Genera un `INSERT OR IGNORE` multi-fila para `rating_curves` o
/// `rating_curves_no_map`. `row_count` determina cuántos grupos `(?,?,...)`
/// se emiten; el llamador aplana los parámetros en el mismo orden.
pub fn insert_rating_curve_batch(table: &str, row_count: usize) -> String {
    let row_placeholder = "(?, ?, ?, ?, ?, ?, ?)";
    let values_clause = std::iter::repeat(row_placeholder)
        .take(row_count)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT OR IGNORE INTO {table} \
         (reach_id, us_flow, us_depth, us_wse, ds_depth, ds_wse, boundary_condition) \
         VALUES {values_clause}"
    )
}
