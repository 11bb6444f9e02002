// [libs/core/pipeline-driver/src/driver.rs]
/*!
 * =================================================================
 * APARATO: PIPELINE DRIVER
 * CLASIFICACIÓN: CORE ENGINE (ESTRATO L7)
 * RESPONSABILIDAD: DAG FIJO DE ONCE ETAPAS POR COLECCIÓN (§4.8)
 *
 * conflate_model -> [load_conflation -> update_network -> selección de
 * reaches] -> extract_submodel -> create_ras_terrain ->
 * create_model_run_normal_depth -> run_incremental_normal_depth ->
 * nd_create_rating_curves_db -> recorrido iKWSE (outlets) ->
 * run_known_wse (no-outlets) -> kwse_create_rating_curves_db ->
 * fusión de curvas de gasto -> create_fim_lib.
 *
 * Cada etapa entrega a la siguiente exactamente su `valid_entities()`
 * (succeeded ∪ unknown, §4.3/§8 invariante 3). Una etapa batch que falla con
 * `stop_on_error=true` aborta el resto del DAG (§4.8, §7); el abandono de la
 * fase de reporte es responsabilidad de `apps/pipeline`, no de este driver.
 * =================================================================
 */

use crate::conflation_files::read_conflation_payloads;
use crate::errors::PipelineDriverError;
use ripple_core_network_walker::{IkwseStageConfigs, NetworkWalker, WalkReport, WalkStageConfig};
use ripple_core_rating_curve_loader::{self as rating_curve_loader, MergeReport};
use ripple_core_step_processor::{conflate, reach, run_stage, StepOutcome, SubmissionInput};
use ripple_domain_models::{EntityDomain, EntityRef, ModelRecord, PipelineConfig, ProcessingStepConfig, ReachRecord};
use ripple_infra_collection_context::CollectionPaths;
use ripple_infra_job_client::JobClient;
use ripple_infra_state_store::StateStoreRepository;
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument, warn};

/// Resumen de una corrida completa del DAG, usado por `apps/pipeline` para
/// decidir el código de salida y alimentar el reporte final (§4.8, §6).
#[derive(Debug, Default)]
pub struct DriverReport {
    pub stage_outcomes: Vec<(&'static str, StepOutcome)>,
    pub walk_report: Option<WalkReport>,
    pub merge_report: Option<MergeReport>,
    pub aborted_at: Option<&'static str>,
}

pub struct PipelineDriver<'a> {
    job_client: &'a JobClient,
    store: &'a StateStoreRepository,
    paths: &'a CollectionPaths,
    config: &'a PipelineConfig,
    collection_id: &'a str,
}

impl<'a> PipelineDriver<'a> {
    pub fn new(job_client: &'a JobClient, store: &'a StateStoreRepository, paths: &'a CollectionPaths, config: &'a PipelineConfig, collection_id: &'a str) -> Self {
        Self { job_client, store, paths, config, collection_id }
    }

    fn stage_config(&self, stage_key: &'static str) -> Result<&ProcessingStepConfig, PipelineDriverError> {
        self.config.processing_steps.get(stage_key).ok_or(PipelineDriverError::MissingStageConfig(stage_key))
    }

    /// Corre una etapa por-reach genérica (§4.3 especialización Generic
    /// Reach) contra el conjunto de reaches dado, devolviendo su `StepOutcome`.
    async fn run_generic_reach_stage(&self, stage_key: &'static str, reaches: &[ReachRecord]) -> Result<StepOutcome, PipelineDriverError> {
        let config = self.stage_config(stage_key)?;
        let inputs: Vec<SubmissionInput> = reaches.iter().map(|r| reach::build_reach_submission(r, self.paths, &config.payload_template)).collect();

        let outcome = run_stage(
            self.job_client,
            self.store,
            self.collection_id,
            stage_key,
            &config.api_process_name,
            EntityDomain::Reach,
            config.timeout_minutes as i64,
            inputs,
        )
        .await?;
        Ok(outcome)
    }

    /// Etapa `conflate_model` (§4.3 especialización Conflate): un modelo por
    /// entidad, someter el conjunto completo descubierto en disco.
    async fn run_conflate_stage(&self, models: &[ModelRecord]) -> Result<StepOutcome, PipelineDriverError> {
        let config = self.stage_config("conflate_model")?;
        let settings = &self.config.ripple_settings;
        let nwm_flowlines_path = &self.config.paths.nwm_flowlines_path;

        let inputs: Vec<SubmissionInput> = models
            .iter()
            .map(|model| conflate::build_conflate_submission(model, self.paths, settings, nwm_flowlines_path, &config.payload_template))
            .collect();

        let outcome = run_stage(
            self.job_client,
            self.store,
            self.collection_id,
            "conflate_model",
            &config.api_process_name,
            EntityDomain::Model,
            config.timeout_minutes as i64,
            inputs,
        )
        .await?;
        Ok(outcome)
    }

    /// Etapas 2 a 6 del DAG (§4.8): la familia por-reach que corre de una
    /// vez sobre el conjunto vigente, encadenando `valid_entities()` entre
    /// etapas consecutivas.
    async fn run_batch_reach_phase(&self, report: &mut DriverReport, initial_reaches: Vec<ReachRecord>) -> Result<Option<Vec<ReachRecord>>, PipelineDriverError> {
        const BATCH_STAGES: [&str; 5] =
            ["extract_submodel", "create_ras_terrain", "create_model_run_normal_depth", "run_incremental_normal_depth", "nd_create_rating_curves_db"];

        let mut by_reach_id: HashMap<i64, ReachRecord> = initial_reaches.into_iter().map(|r| (r.reach_id, r)).collect();

        for stage_key in BATCH_STAGES {
            let current: Vec<ReachRecord> = by_reach_id.values().cloned().collect();
            if current.is_empty() {
                warn!(stage = stage_key, "conjunto de reaches vacío; se omite la etapa");
                continue;
            }

            let outcome = self.run_generic_reach_stage(stage_key, &current).await;
            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(error) if self.config.execution.stop_on_error => {
                    warn!(stage = stage_key, %error, "etapa abortó el DAG (stop_on_error=true)");
                    report.aborted_at = Some(stage_key);
                    return Ok(None);
                }
                Err(error) => return Err(error),
            };

            let valid_ids: HashSet<i64> = outcome
                .valid_entities()
                .into_iter()
                .filter_map(|entity| match entity {
                    EntityRef::Reach { reach_id } => Some(reach_id),
                    EntityRef::Model { .. } => None,
                })
                .collect();
            by_reach_id.retain(|reach_id, _| valid_ids.contains(reach_id));

            report.stage_outcomes.push((stage_key, outcome));
        }

        Ok(Some(by_reach_id.into_values().collect()))
    }

    /// Etapa final `create_fim_lib` (§4.8), corrida sobre los reaches que
    /// sobrevivieron la fusión de curvas de gasto.
    async fn run_fim_lib_stage(&self, reaches: &[ReachRecord]) -> Result<StepOutcome, PipelineDriverError> {
        self.run_generic_reach_stage("create_fim_lib", reaches).await
    }

    /// Ejecuta el DAG completo de once etapas para la colección (§4.8).
    /// Devuelve un reporte parcial incluso si una etapa aborta el resto
    /// bajo `stop_on_error=true` — el llamador decide qué hacer con él.
    #[instrument(skip(self, models))]
    pub async fn run_collection(&self, models: Vec<ModelRecord>) -> Result<DriverReport, PipelineDriverError> {
        let mut report = DriverReport::default();

        if !models.is_empty() {
            self.store.insert_models(&models).await?;
        }

        let conflate_outcome = self.run_conflate_stage(&models).await?;
        let valid_model_ids: Vec<String> = conflate_outcome
            .valid_entities()
            .into_iter()
            .filter_map(|entity| match entity {
                EntityRef::Model { model_id } => Some(model_id),
                EntityRef::Reach { .. } => None,
            })
            .collect();
        report.stage_outcomes.push(("conflate_model", conflate_outcome));

        if valid_model_ids.is_empty() {
            info!("ningún modelo pasó conflate_model; el DAG termina sin reaches que procesar");
            return Ok(report);
        }

        let valid_models: Vec<ModelRecord> = models.into_iter().filter(|m| valid_model_ids.contains(&m.model_id)).collect();
        let payloads = read_conflation_payloads(self.paths, &valid_models);
        self.store.load_conflation_payloads(payloads).await?;
        let edges_applied = self.store.run_update_network().await?;
        info!(edges_applied, "Update-Network completado");

        let initial_reaches = self.store.get_reaches_by_models(&valid_model_ids).await?;

        let Some(reaches_after_nd) = self.run_batch_reach_phase(&mut report, initial_reaches).await? else {
            return Ok(report);
        };
        if reaches_after_nd.is_empty() {
            info!("ningún reach sobrevivió la fase nd; el DAG termina antes de la fase iKWSE");
            return Ok(report);
        }

        let walker = NetworkWalker::new(self.job_client.clone(), self.store.clone(), self.paths.clone(), self.config.execution.optimum_parallel_process_count);
        let outlets: HashSet<i64> = walker.seed_outlets().await?.into_iter().collect();
        let walk_configs = IkwseStageConfigs {
            run_iknown_wse: self.walk_stage_config("run_iknown_wse")?,
            create_irating_curves_db: self.walk_stage_config("create_irating_curves_db")?,
        };
        let walk_report = walker.run(&walk_configs).await?;

        let by_reach_id: HashMap<i64, ReachRecord> = reaches_after_nd.into_iter().map(|r| (r.reach_id, r)).collect();
        let kwse_candidates: Vec<ReachRecord> = walk_report
            .rc_db_succeeded
            .iter()
            .filter(|reach_id| !outlets.contains(reach_id))
            .filter_map(|reach_id| by_reach_id.get(reach_id).cloned())
            .collect();
        report.walk_report = Some(walk_report);

        let reaches_after_kwse = if kwse_candidates.is_empty() {
            warn!("ningún reach no-salida sobrevivió la fase iKWSE; se omite run_known_wse");
            Vec::new()
        } else {
            match self.run_kwse_stage(&kwse_candidates, &mut report).await? {
                Some(reaches) => reaches,
                None => return Ok(report),
            }
        };

        rating_curve_loader::merge_all(self.store, self.paths).await.map(|merge_report| {
            report.merge_report = Some(merge_report);
        })?;

        if !reaches_after_kwse.is_empty() {
            let fim_lib_outcome = self.run_fim_lib_stage(&reaches_after_kwse).await;
            match fim_lib_outcome {
                Ok(outcome) => report.stage_outcomes.push(("create_fim_lib", outcome)),
                Err(error) if self.config.execution.stop_on_error => {
                    warn!(%error, "create_fim_lib abortó (stop_on_error=true)");
                    report.aborted_at = Some("create_fim_lib");
                }
                Err(error) => return Err(error),
            }
        }

        Ok(report)
    }

    fn walk_stage_config(&self, stage_key: &'static str) -> Result<WalkStageConfig, PipelineDriverError> {
        let config = self.stage_config(stage_key)?;
        Ok(WalkStageConfig {
            stage_key,
            api_process_name: config.api_process_name.clone(),
            payload_template: config.payload_template.clone(),
            timeout_minutes: config.timeout_minutes as i64,
        })
    }

    /// Etapa final KWSE (§4.6): especialización con preámbulo de rango de
    /// elevación aguas abajo (§4.3 KWSE). `downstream_id` de cada candidato
    /// se resuelve contra `network` vía `updated_to_id`, ya presente en el
    /// `ReachRecord` cargado tras Update-Network.
    async fn run_kwse_stage(&self, candidates: &[ReachRecord], report: &mut DriverReport) -> Result<Option<Vec<ReachRecord>>, PipelineDriverError> {
        let config = self.stage_config("run_known_wse")?;
        let mut inputs = Vec::with_capacity(candidates.len());

        for reach in candidates {
            let Some(downstream_id) = reach.updated_to_id else {
                warn!(reach_id = reach.reach_id, "candidato KWSE sin aguas abajo tras Update-Network; se omite");
                continue;
            };
            let submission = ripple_core_step_processor::kwse::build_kwse_submission(reach, downstream_id, self.paths, &config.payload_template).await?;
            inputs.push(submission);
        }

        let outcome = run_stage(
            self.job_client,
            self.store,
            self.collection_id,
            "run_known_wse",
            &config.api_process_name,
            EntityDomain::Reach,
            config.timeout_minutes as i64,
            inputs,
        )
        .await;

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(error) if self.config.execution.stop_on_error => {
                warn!(%error, "run_known_wse abortó el DAG (stop_on_error=true)");
                report.aborted_at = Some("run_known_wse");
                return Ok(None);
            }
            Err(error) => return Err(error.into()),
        };

        let valid_ids: HashSet<i64> = outcome
            .valid_entities()
            .into_iter()
            .filter_map(|entity| match entity {
                EntityRef::Reach { reach_id } => Some(reach_id),
                EntityRef::Model { .. } => None,
            })
            .collect();
        let by_reach_id: HashMap<i64, &ReachRecord> = candidates.iter().map(|r| (r.reach_id, r)).collect();
        let kwse_config = self.stage_config("kwse_create_rating_curves_db")?.clone();

        report.stage_outcomes.push(("run_known_wse", outcome));

        let rc_candidates: Vec<ReachRecord> = valid_ids.into_iter().filter_map(|id| by_reach_id.get(&id).cloned().cloned()).collect();
        if rc_candidates.is_empty() {
            return Ok(Some(Vec::new()));
        }

        let inputs: Vec<SubmissionInput> =
            rc_candidates.iter().map(|r| reach::build_reach_submission(r, self.paths, &kwse_config.payload_template)).collect();
        let rc_outcome = run_stage(
            self.job_client,
            self.store,
            self.collection_id,
            "kwse_create_rating_curves_db",
            &kwse_config.api_process_name,
            EntityDomain::Reach,
            kwse_config.timeout_minutes as i64,
            inputs,
        )
        .await;

        let rc_outcome = match rc_outcome {
            Ok(outcome) => outcome,
            Err(error) if self.config.execution.stop_on_error => {
                warn!(%error, "kwse_create_rating_curves_db abortó el DAG (stop_on_error=true)");
                report.aborted_at = Some("kwse_create_rating_curves_db");
                return Ok(None);
            }
            Err(error) => return Err(error.into()),
        };

        let valid_ids: HashSet<i64> = rc_outcome
            .valid_entities()
            .into_iter()
            .filter_map(|entity| match entity {
                EntityRef::Reach { reach_id } => Some(reach_id),
                EntityRef::Model { .. } => None,
            })
            .collect();
        report.stage_outcomes.push(("kwse_create_rating_curves_db", rc_outcome));

        Ok(Some(rc_candidates.into_iter().filter(|r| valid_ids.contains(&r.reach_id)).collect()))
    }
}
