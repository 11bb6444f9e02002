// [libs/core/network-walker/src/walk.rs]
/*!
 * =================================================================
 * APARATO: iKWSE NETWORK WALKER
 * CLASIFICACIÓN: CORE ENGINE (ESTRATO L5)
 * RESPONSABILIDAD: RECORRIDO CONCURRENTE AGUAS-ABAJO-PRIMERO DE LA RED
 *
 * Encola un reach solo tras fijarse la frontera de su aguas abajo (§4.5).
 * Pool acotado a `OPTIMUM_PARALLEL_PROCESS_COUNT`; el bucle de planificación
 * drena la cola, somete al pool, duerme ~1s y cosecha futuros terminados
 * (§4.5 "Scheduler loop"), siguiendo el patrón `JoinSet` + `Semaphore` que
 * `zed-industries-codex`'s `mcp_connection_manager.rs` usa para acotar
 * trabajo concurrente sobre una cola compartida.
 * =================================================================
 */

use crate::errors::NetworkWalkerError;
use ripple_core_step_processor::template::format_payload;
use ripple_domain_models::JobStatus;
use ripple_infra_collection_context::CollectionPaths;
use ripple_infra_job_client::JobClient;
use ripple_infra_state_store::StateStoreRepository;
use ripple_infra_submodel_reader::elevation_range;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

const SCHEDULER_TICK: Duration = Duration::from_secs(1);

/// Configuración de una de las dos etapas de la fase iKWSE (§4.5): el
/// nombre de columna/etapa en `processing`, el nombre de proceso remoto y el
/// timeout de sondeo. `payload_template` es el mismo tipo que el resto del
/// Step Processor consume (§4.3).
#[derive(Debug, Clone)]
pub struct WalkStageConfig {
    pub stage_key: &'static str,
    pub api_process_name: String,
    pub payload_template: serde_json::Value,
    pub timeout_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct IkwseStageConfigs {
    pub run_iknown_wse: WalkStageConfig,
    pub create_irating_curves_db: WalkStageConfig,
}

struct WalkItem {
    reach_id: i64,
    downstream_id: Option<i64>,
}

/// Qué pasó con el paso 1 (iKWSE) de un reach, para el resumen de fase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IkwseOutcome {
    /// El reach no tenía aguas abajo (es salida); el paso 1 no aplica.
    NotApplicable,
    /// Sin rango de elevación aguas abajo; se omitió la sometida.
    SkippedNoDownstreamRange,
    /// Se sometió `run_known_wse`, exitosa o no.
    Submitted,
}

/// Resumen final de la fase iKWSE, usado por el Pipeline Driver para decidir
/// si procede a la etapa KWSE final (§4.6) y para el log de cierre de fase.
#[derive(Debug, Default, Clone)]
pub struct WalkReport {
    pub processed: usize,
    pub ikwse_submitted: usize,
    pub ikwse_skipped_no_downstream_range: usize,
    pub rc_db_succeeded: Vec<i64>,
    pub rc_db_gated_out: Vec<i64>,
}

#[derive(Clone)]
pub struct NetworkWalker {
    job_client: JobClient,
    store: StateStoreRepository,
    paths: CollectionPaths,
    parallelism: usize,
    write_lock: Arc<Mutex<()>>,
}

impl NetworkWalker {
    pub fn new(job_client: JobClient, store: StateStoreRepository, paths: CollectionPaths, parallelism: usize) -> Self {
        Self { job_client, store, paths, parallelism: parallelism.max(1), write_lock: Arc::new(Mutex::new(())) }
    }

    /// Semilla del recorrido: los reaches de salida (sin aguas abajo) tras
    /// Update-Network (§4.5 "Inputs"), también usados para materializar
    /// `start_reaches.csv` (§6 Persisted state layout).
    #[instrument(skip(self))]
    pub async fn seed_outlets(&self) -> Result<Vec<i64>, NetworkWalkerError> {
        Ok(self.store.get_outlet_reaches().await?)
    }

    /// Escribe `start_reaches.csv` como `<outlet_id>,nd` por línea (§6
    /// "Persisted state layout"; E1: "`start_reaches.csv` contains `200,nd`").
    /// Cada reach de salida arranca su rama de la fase iKWSE sin frontera
    /// descendente, es decir, tratado como una corrida `nd`.
    fn write_start_reaches_csv(&self, outlets: &[i64]) -> Result<(), NetworkWalkerError> {
        let mut contents = String::new();
        for reach_id in outlets {
            contents.push_str(&reach_id.to_string());
            contents.push_str(",nd\n");
        }
        if let Some(parent) = self.paths.start_reaches_csv.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.paths.start_reaches_csv, contents)?;
        Ok(())
    }

    /// Ejecuta la fase iKWSE completa hasta que la cola y el trabajo en
    /// vuelo se agoten (§4.5 "Scheduler loop").
    #[instrument(skip(self, configs))]
    pub async fn run(&self, configs: &IkwseStageConfigs) -> Result<WalkReport, NetworkWalkerError> {
        let outlets = self.seed_outlets().await?;
        self.write_start_reaches_csv(&outlets)?;
        let queue = Arc::new(Mutex::new(VecDeque::from_iter(
            outlets.into_iter().map(|reach_id| WalkItem { reach_id, downstream_id: None }),
        )));
        let report = Arc::new(Mutex::new(WalkReport::default()));
        let semaphore = Arc::new(Semaphore::new(self.parallelism));
        let mut in_flight: JoinSet<()> = JoinSet::new();

        loop {
            loop {
                let permit = match semaphore.clone().try_acquire_owned() {
                    Ok(permit) => permit,
                    Err(_) => break,
                };
                let item = {
                    let mut guard = queue.lock().await;
                    guard.pop_front()
                };
                let Some(item) = item else {
                    drop(permit);
                    break;
                };

                let walker = self.clone();
                let configs = configs.clone();
                let queue = queue.clone();
                let report = report.clone();

                in_flight.spawn(async move {
                    let _permit = permit;
                    let outcome = walker.process_one(&item, &configs).await;
                    let (gate_passed, ikwse_outcome) = match outcome {
                        Ok(result) => result,
                        Err(error) => {
                            warn!(reach_id = item.reach_id, %error, "fallo procesando reach en la fase iKWSE");
                            (false, IkwseOutcome::NotApplicable)
                        }
                    };

                    let upstream = walker.store.get_upstream_reaches(item.reach_id).await.unwrap_or_else(|error| {
                        warn!(reach_id = item.reach_id, %error, "fallo consultando aguas arriba; se detiene esta rama");
                        Vec::new()
                    });

                    {
                        let mut guard = queue.lock().await;
                        for upstream_reach_id in upstream {
                            guard.push_back(WalkItem {
                                reach_id: upstream_reach_id,
                                downstream_id: if gate_passed { Some(item.reach_id) } else { None },
                            });
                        }
                    }

                    let mut report_guard = report.lock().await;
                    report_guard.processed += 1;
                    match ikwse_outcome {
                        IkwseOutcome::Submitted => report_guard.ikwse_submitted += 1,
                        IkwseOutcome::SkippedNoDownstreamRange => report_guard.ikwse_skipped_no_downstream_range += 1,
                        IkwseOutcome::NotApplicable => {}
                    }
                    if gate_passed {
                        report_guard.rc_db_succeeded.push(item.reach_id);
                    } else {
                        report_guard.rc_db_gated_out.push(item.reach_id);
                    }
                });
            }

            let queue_empty = queue.lock().await.is_empty();
            if queue_empty && in_flight.is_empty() {
                break;
            }

            tokio::time::sleep(SCHEDULER_TICK).await;
            while in_flight.try_join_next().is_some() {}
        }

        while in_flight.join_next().await.is_some() {}

        let final_report = Arc::try_unwrap(report).map(Mutex::into_inner).unwrap_or_default();
        info!(
            processed = final_report.processed,
            rc_db_succeeded = final_report.rc_db_succeeded.len(),
            rc_db_gated_out = final_report.rc_db_gated_out.len(),
            "fase iKWSE completada"
        );
        Ok(final_report)
    }

    /// Procedimiento de un worker para `(r, d)` (§4.5 "Worker procedure").
    /// Devuelve `(gate_passed, ikwse_outcome)`: `gate_passed` habilita a su
    /// aguas arriba a tratarlo como frontera válida (rc_db construido);
    /// `ikwse_outcome` distingue si el paso 1 se sometió o se omitió por
    /// falta de rango aguas abajo, para el resumen de la fase.
    async fn process_one(&self, item: &WalkItem, configs: &IkwseStageConfigs) -> Result<(bool, IkwseOutcome), NetworkWalkerError> {
        let (ikwse_gate_passed, ikwse_outcome) = match item.downstream_id {
            None => (true, IkwseOutcome::NotApplicable),
            Some(downstream_id) => self.run_ikwse_stage(item.reach_id, downstream_id, &configs.run_iknown_wse).await?,
        };

        if !ikwse_gate_passed {
            return Ok((false, ikwse_outcome));
        }

        let rc_db_passed = self
            .run_rating_curves_db_stage(item.reach_id, item.downstream_id.is_some(), &configs.create_irating_curves_db)
            .await?;
        Ok((rc_db_passed, ikwse_outcome))
    }

    /// Paso 1: busca el rango de elevación `nd` del reach aguas abajo y, si
    /// existe, somete `run_known_wse` con `plan_suffix="ikwse"`. Ausencia de
    /// rango salta la sometida pero no bloquea el resto de la rama (§4.5:
    /// "If min/max absent, skip the KWSE submit but continue").
    async fn run_ikwse_stage(&self, reach_id: i64, downstream_id: i64, config: &WalkStageConfig) -> Result<(bool, IkwseOutcome), NetworkWalkerError> {
        let downstream_db = self.paths.submodel_result_db(downstream_id);
        let range = elevation_range(&downstream_db).await?;

        let Some(range) = range else {
            debug!(reach_id, downstream_id, "sin rango de elevación aguas abajo, se omite la sometida de iKWSE");
            return Ok((true, IkwseOutcome::SkippedNoDownstreamRange));
        };

        let mut substitutions = HashMap::new();
        substitutions.insert("nwm_reach_id".to_string(), reach_id.to_string());
        substitutions.insert("plan_suffix".to_string(), "ikwse".to_string());
        substitutions.insert("min_elevation".to_string(), range.min_elevation.to_string());
        substitutions.insert("max_elevation".to_string(), range.max_elevation.to_string());
        substitutions.insert("submodels_directory".to_string(), self.paths.submodels_dir.display().to_string());

        let payload = format_payload(&config.payload_template, &substitutions);
        let (job_id, submit_status) = self.job_client.submit(&config.api_process_name, &payload).await;

        self.persist_reach_status(config.stage_key, submit_status, reach_id, &job_id).await?;

        if submit_status != JobStatus::Accepted {
            return Ok((false, IkwseOutcome::Submitted));
        }

        let verdict = self.wait_single(reach_id, &job_id, config.timeout_minutes).await;
        self.persist_reach_status(config.stage_key, verdict, reach_id, &job_id).await?;

        Ok((verdict.is_valid_for_next_stage(), IkwseOutcome::Submitted))
    }

    /// Paso 2: somete `create_rating_curves_db` con la lista efectiva de
    /// planes (§4.5). `has_ikwse_plan` decide si el plan `ikwse` entra en la
    /// lista además de `nd`.
    async fn run_rating_curves_db_stage(&self, reach_id: i64, has_ikwse_plan: bool, config: &WalkStageConfig) -> Result<bool, NetworkWalkerError> {
        let plan_list = if has_ikwse_plan { "nd,ikwse" } else { "nd" };

        let mut substitutions = HashMap::new();
        substitutions.insert("nwm_reach_id".to_string(), reach_id.to_string());
        substitutions.insert("plan_list".to_string(), plan_list.to_string());
        substitutions.insert("submodels_directory".to_string(), self.paths.submodels_dir.display().to_string());

        let payload = format_payload(&config.payload_template, &substitutions);
        let (job_id, submit_status) = self.job_client.submit(&config.api_process_name, &payload).await;

        self.persist_reach_status(config.stage_key, submit_status, reach_id, &job_id).await?;

        if submit_status != JobStatus::Accepted {
            return Ok(false);
        }

        let verdict = self.wait_single(reach_id, &job_id, config.timeout_minutes).await;
        self.persist_reach_status(config.stage_key, verdict, reach_id, &job_id).await?;

        Ok(verdict.is_valid_for_next_stage())
    }

    async fn wait_single(&self, reach_id: i64, job_id: &str, timeout_minutes: i64) -> JobStatus {
        let record = ripple_domain_models::JobRecord::new(
            ripple_domain_models::EntityRef::Reach { reach_id },
            job_id.to_string(),
            JobStatus::Accepted,
        );
        let (succeeded, failed, unknown) = self.job_client.wait_for_jobs(vec![record], timeout_minutes).await;
        if !succeeded.is_empty() {
            JobStatus::Successful
        } else if !failed.is_empty() {
            JobStatus::Failed
        } else {
            debug_assert!(!unknown.is_empty() || job_id.is_empty());
            JobStatus::Unknown
        }
    }

    /// Escrituras serializadas por un candado de proceso (§5: "writes from
    /// the Network Walker are additionally guarded by an in-process lock"),
    /// superpuesto al aislamiento por conexión-por-llamada del almacén.
    async fn persist_reach_status(&self, stage_key: &'static str, status: JobStatus, reach_id: i64, job_id: &str) -> Result<(), NetworkWalkerError> {
        let _guard = self.write_lock.lock().await;
        self.store
            .update_processing(stage_key, status, std::slice::from_ref(&(reach_id, job_id.to_string())))
            .await?;
        Ok(())
    }
}
