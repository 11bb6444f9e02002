// [libs/infra/state-store/src/repositories/mod.rs]
/*!
 * =================================================================
 * APARATO: STATE STORE REPOSITORY
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L1)
 * RESPONSABILIDAD: OPERACIONES TRANSACCIONALES SOBRE EL ALMACÉN EMBEBIDO
 *
 * Cada método abre su propia conexión, ejecuta y cierra (§4.1: "every write
 * path opens, writes, commits, closes"). Los fallos aquí no se reintentan:
 * se propagan al llamador.
 * =================================================================
 */

pub mod conflation;
pub mod network_math;
pub mod queries;

use crate::client::StateStoreClient;
use crate::errors::StateStoreError;
use libsql::params;
use ripple_domain_models::{
    ConflationPayload, EntityDomain, EntityRef, JobRecord, JobStatus, ModelRecord, RatingCurveRow,
    ReachRecord, FIXED_STAGE_ORDER,
};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{info, instrument, warn};

/// Presupuesto de parámetros conservador conocido-seguro para sentencias
/// multi-fila (§4.7: "a conservative 240 rows × 4 params per batch").
const SAFE_PARAM_BUDGET: usize = 240 * 4;
const PARAMS_PER_RATING_CURVE_ROW: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingCurveTable {
    WithMap,
    NoMap,
}

impl RatingCurveTable {
    fn table_name(&self) -> &'static str {
        match self {
            RatingCurveTable::WithMap => "rating_curves",
            RatingCurveTable::NoMap => "rating_curves_no_map",
        }
    }
}

#[derive(Clone)]
pub struct StateStoreRepository {
    client: StateStoreClient,
}

impl StateStoreRepository {
    pub fn new(client: StateStoreClient) -> Self {
        Self { client }
    }

    fn ensure_known_stage(stage: &str) -> Result<(), StateStoreError> {
        if FIXED_STAGE_ORDER.contains(&stage) {
            Ok(())
        } else {
            Err(StateStoreError::UnrecognizedStage(stage.to_string()))
        }
    }

    /// Crea tablas/índices (delegado al cliente en `connect`), siembra
    /// `network`/`processing` desde `reaches` e inserta la fila única de
    /// `metadata`. Idempotente: una segunda llamada no duplica la fila de
    /// metadata ni los reaches ya sembrados.
    #[instrument(skip(self, reaches))]
    pub async fn init(
        &self,
        tool_version: &str,
        us_depth_increment: f64,
        ds_depth_increment: f64,
        reaches: &[(i64, Option<i64>)],
    ) -> Result<(), StateStoreError> {
        let connection = self.client.open_call_scoped_connection().await?;

        for (reach_id, nwm_to_id) in reaches {
            connection
                .execute(queries::SEED_REACH, params![*reach_id, *nwm_to_id, Option::<Vec<u8>>::None])
                .await?;
        }
        connection.execute(queries::SEED_NETWORK_FROM_REACHES, ()).await?;
        connection.execute(queries::SEED_PROCESSING_FROM_REACHES, ()).await?;

        let mut existing = connection.query(queries::COUNT_METADATA, ()).await?;
        let already_seeded = existing
            .next()
            .await?
            .map(|row| row.get::<i64>(0).unwrap_or(0) > 0)
            .unwrap_or(false);

        if already_seeded {
            warn!("la fila de metadata ya existía; se omite la reinserción");
        } else {
            connection
                .execute(queries::INSERT_METADATA, params![tool_version, us_depth_increment, ds_depth_increment])
                .await?;
        }

        info!(reach_count = reaches.len(), "almacén de estado inicializado");
        Ok(())
    }

    #[instrument(skip(self, models))]
    pub async fn insert_models(&self, models: &[ModelRecord]) -> Result<(), StateStoreError> {
        let connection = self.client.open_call_scoped_connection().await?;
        for model in models {
            connection
                .execute(queries::INSERT_MODEL, params![model.collection_id.clone(), model.model_id.clone(), model.model_name.clone()])
                .await?;
        }
        Ok(())
    }

    #[instrument(skip(self, rows))]
    pub async fn update_models(
        &self,
        collection_id: &str,
        stage: &str,
        status: JobStatus,
        rows: &[(String, String)],
    ) -> Result<(), StateStoreError> {
        Self::ensure_known_stage(stage)?;
        let connection = self.client.open_call_scoped_connection().await?;
        let sql = queries::update_model_stage(stage);
        for (model_id, job_id) in rows {
            connection
                .execute(&sql, params![job_id.clone(), status.as_str(), collection_id.to_string(), model_id.clone()])
                .await?;
        }
        Ok(())
    }

    #[instrument(skip(self, rows))]
    pub async fn update_processing(
        &self,
        stage: &str,
        status: JobStatus,
        rows: &[(i64, String)],
    ) -> Result<(), StateStoreError> {
        Self::ensure_known_stage(stage)?;
        let connection = self.client.open_call_scoped_connection().await?;
        let sql = queries::update_processing_stage(stage);
        for (reach_id, job_id) in rows {
            connection.execute(&sql, params![job_id.clone(), status.as_str(), *reach_id]).await?;
        }
        Ok(())
    }

    #[instrument(skip(self, payload))]
    pub async fn update_conflation(&self, payload: &ConflationPayload) -> Result<(), StateStoreError> {
        let connection = self.client.open_call_scoped_connection().await?;
        for (&reach_id, entry) in payload.reaches.iter() {
            connection
                .execute(queries::UPDATE_CONFLATION_REACH, params![payload.model_id.clone(), entry.eclipsed as i64, reach_id])
                .await?;
        }
        Ok(())
    }

    /// Aplica una serie de payloads en disputa en el orden prescrito por
    /// `conflation::order_conflation_payloads` antes de persistirlos.
    pub async fn load_conflation_payloads(&self, payloads: Vec<ConflationPayload>) -> Result<(), StateStoreError> {
        for payload in conflation::order_conflation_payloads(payloads) {
            self.update_conflation(&payload).await?;
        }
        Ok(())
    }

    async fn select_reach_to_id_map(&self, sql: &str) -> Result<HashMap<i64, Option<i64>>, StateStoreError> {
        let connection = self.client.open_call_scoped_connection().await?;
        let mut rows = connection.query(sql, ()).await?;
        let mut map = HashMap::new();
        while let Some(row) = rows.next().await? {
            let reach_id: i64 = row.get(0)?;
            let to_id: Option<i64> = row.get(1)?;
            map.insert(reach_id, to_id);
        }
        Ok(map)
    }

    pub async fn get_valid_reaches(&self) -> Result<HashMap<i64, Option<i64>>, StateStoreError> {
        self.select_reach_to_id_map(queries::SELECT_VALID_REACHES).await
    }

    pub async fn get_eclipsed_reaches(&self) -> Result<HashMap<i64, Option<i64>>, StateStoreError> {
        self.select_reach_to_id_map(queries::SELECT_ECLIPSED_REACHES).await
    }

    #[instrument(skip(self, edges))]
    pub async fn update_network(&self, edges: &[(i64, i64)]) -> Result<(), StateStoreError> {
        let connection = self.client.open_call_scoped_connection().await?;
        for (reach_id, updated_to_id) in edges {
            connection.execute(queries::UPDATE_NETWORK_EDGE, params![*updated_to_id, *reach_id]).await?;
        }
        Ok(())
    }

    /// Ejecuta el algoritmo completo de Update-Network: lee los reaches
    /// válidos/eclipsados, calcula las aristas y las aplica en bloque.
    /// Devuelve el número de aristas aplicadas.
    #[instrument(skip(self))]
    pub async fn run_update_network(&self) -> Result<usize, StateStoreError> {
        let valid = self.get_valid_reaches().await?;
        let eclipsed = self.get_eclipsed_reaches().await?;
        let edges = network_math::compute_update_network(&valid, &eclipsed);
        let applied = edges.len();
        self.update_network(&edges).await?;
        Ok(applied)
    }

    #[instrument(skip(self))]
    pub async fn get_reaches_by_models(&self, model_ids: &[String]) -> Result<Vec<ReachRecord>, StateStoreError> {
        if model_ids.is_empty() {
            return Ok(Vec::new());
        }
        let connection = self.client.open_call_scoped_connection().await?;
        let sql = queries::select_reaches_by_models(model_ids.len());
        let bound_params: Vec<libsql::Value> = model_ids.iter().map(|id| id.clone().into()).collect();
        let mut rows = connection.query(&sql, bound_params).await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(ReachRecord {
                reach_id: row.get(0)?,
                nwm_to_id: None,
                updated_to_id: row.get(1)?,
                model_id: row.get(2)?,
                model_name: row.get(3)?,
                eclipsed: false,
            });
        }
        Ok(records)
    }

    /// Reaches de salida tras Update-Network (§4.5 "Inputs"): semilla del
    /// recorrido del Network Walker.
    #[instrument(skip(self))]
    pub async fn get_outlet_reaches(&self) -> Result<Vec<i64>, StateStoreError> {
        let connection = self.client.open_call_scoped_connection().await?;
        let mut rows = connection.query(queries::SELECT_OUTLET_REACHES, ()).await?;
        let mut outlets = Vec::new();
        while let Some(row) = rows.next().await? {
            outlets.push(row.get(0)?);
        }
        Ok(outlets)
    }

    #[instrument(skip(self))]
    pub async fn get_upstream_reaches(&self, reach_id: i64) -> Result<Vec<i64>, StateStoreError> {
        let connection = self.client.open_call_scoped_connection().await?;
        let mut rows = connection.query(queries::SELECT_UPSTREAM_REACHES, params![reach_id]).await?;
        let mut upstream = Vec::new();
        while let Some(row) = rows.next().await? {
            upstream.push(row.get(0)?);
        }
        Ok(upstream)
    }

    #[instrument(skip(self))]
    pub async fn get_entities_by_process_and_status(
        &self,
        domain: EntityDomain,
        stage: &str,
        status: JobStatus,
    ) -> Result<Vec<JobRecord>, StateStoreError> {
        Self::ensure_known_stage(stage)?;
        let connection = self.client.open_call_scoped_connection().await?;
        let sql = match domain {
            EntityDomain::Reach => queries::select_entities_by_process_and_status_reach(stage),
            EntityDomain::Model => queries::select_entities_by_process_and_status_model(stage),
        };
        let mut rows = connection.query(&sql, params![status.as_str()]).await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            let entity = match domain {
                EntityDomain::Reach => EntityRef::Reach { reach_id: row.get(0)? },
                EntityDomain::Model => EntityRef::Model { model_id: row.get(0)? },
            };
            let job_id: Option<String> = row.get(1)?;
            let status_text: Option<String> = row.get(2)?;
            let status = status_text
                .and_then(|text| JobStatus::from_str(&text).ok())
                .unwrap_or(JobStatus::Unknown);
            records.push(JobRecord { entity, job_id: job_id.unwrap_or_default(), status });
        }
        Ok(records)
    }

    /// Reescritura de una sola fila, usada exclusivamente por el barrido de
    /// reconciliación (§4.9) — nunca por el Step Processor en el flujo normal.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        domain: EntityDomain,
        stage: &str,
        status: JobStatus,
        entity_id: &str,
    ) -> Result<(), StateStoreError> {
        Self::ensure_known_stage(stage)?;
        let connection = self.client.open_call_scoped_connection().await?;
        match domain {
            EntityDomain::Reach => {
                let reach_id: i64 = entity_id
                    .parse()
                    .map_err(|_| StateStoreError::MappingError(format!("NON_NUMERIC_REACH_ID: {entity_id}")))?;
                connection.execute(&queries::update_single_status_reach(stage), params![status.as_str(), reach_id]).await?;
            }
            EntityDomain::Model => {
                connection
                    .execute(&queries::update_single_status_model(stage), params![status.as_str(), entity_id.to_string()])
                    .await?;
            }
        }
        Ok(())
    }

    /// Todos los `(entity_id, job_id)` persistidos para una etapa, usado por
    /// el barrido de reconciliación para volver a consultar al servicio remoto.
    #[instrument(skip(self))]
    pub async fn get_all_job_ids_for_stage(
        &self,
        domain: EntityDomain,
        stage: &str,
    ) -> Result<Vec<(String, String)>, StateStoreError> {
        Self::ensure_known_stage(stage)?;
        let connection = self.client.open_call_scoped_connection().await?;
        let sql = match domain {
            EntityDomain::Reach => queries::select_all_job_ids_for_stage_reach(stage),
            EntityDomain::Model => queries::select_all_job_ids_for_stage_model(stage),
        };
        let mut rows = connection.query(&sql, ()).await?;
        let mut pairs = Vec::new();
        while let Some(row) = rows.next().await? {
            let entity_id: String = match domain {
                EntityDomain::Reach => row.get::<i64>(0)?.to_string(),
                EntityDomain::Model => row.get(0)?,
            };
            let job_id: String = row.get(1)?;
            pairs.push((entity_id, job_id));
        }
        Ok(pairs)
    }

    #[instrument(skip(self))]
    pub async fn get_failed_or_unknown_reaches(&self, stage: &str) -> Result<Vec<JobRecord>, StateStoreError> {
        Self::ensure_known_stage(stage)?;
        let connection = self.client.open_call_scoped_connection().await?;
        let mut rows = connection.query(&queries::select_failed_or_unknown_reach(stage), ()).await?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            let reach_id: i64 = row.get(0)?;
            let job_id: Option<String> = row.get(1)?;
            let status_text: String = row.get(2)?;
            let status = JobStatus::from_str(&status_text).unwrap_or(JobStatus::Unknown);
            records.push(JobRecord { entity: EntityRef::Reach { reach_id }, job_id: job_id.unwrap_or_default(), status });
        }
        Ok(records)
    }

    fn rows_per_batch() -> usize {
        SAFE_PARAM_BUDGET / PARAMS_PER_RATING_CURVE_ROW
    }

    /// Inserta filas de curva de gasto en lotes que respetan el presupuesto
    /// conservador de parámetros (§4.7). Devuelve el total de filas
    /// efectivamente insertadas (los duplicados vía `UNIQUE` no cuentan).
    #[instrument(skip(self, rows))]
    pub async fn insert_rating_curves(
        &self,
        table: RatingCurveTable,
        rows: &[RatingCurveRow],
    ) -> Result<u64, StateStoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let connection = self.client.open_call_scoped_connection().await?;
        let batch_size = Self::rows_per_batch();
        let mut total_inserted: u64 = 0;

        for chunk in rows.chunks(batch_size) {
            let sql = queries::insert_rating_curve_batch(table.table_name(), chunk.len());
            let mut bound_params: Vec<libsql::Value> = Vec::with_capacity(chunk.len() * PARAMS_PER_RATING_CURVE_ROW);
            for row in chunk {
                bound_params.push(row.reach_id.into());
                bound_params.push(row.us_flow.into());
                bound_params.push(row.us_depth.into());
                bound_params.push(row.us_wse.into());
                bound_params.push(row.ds_depth.into());
                bound_params.push(row.ds_wse.into());
                bound_params.push(row.boundary_condition.as_str().into());
            }
            total_inserted += connection.execute(&sql, bound_params).await?;
        }

        Ok(total_inserted)
    }
}
