// [libs/core/step-processor/src/processor.rs]
/*!
 * =================================================================
 * APARATO: GENERIC STEP PROCESSOR
 * CLASIFICACIÓN: CORE ENGINE (ESTRATO L3)
 * RESPONSABILIDAD: SOMETIDA -> ESPERA -> CLASIFICACIÓN -> PERSISTENCIA
 *
 * Una única implementación concreta parametrizada por `(EntityDomain,
 * payload ya formateado, decisión de pre-sometida)` en lugar de la
 * jerarquía Conflate/GenericReach/KWSE del original (§9, "Dynamic dispatch
 * over stages"): la decisión de saltar la sometida de KWSE (§4.3) se toma
 * en la especialización antes de llegar aquí, como una variante de
 * `SubmissionInput` en vez de un gancho virtual.
 * =================================================================
 */

use crate::errors::StepProcessorError;
use ripple_domain_models::{EntityDomain, EntityRef, JobRecord, JobStatus};
use ripple_infra_job_client::JobClient;
use ripple_infra_state_store::StateStoreRepository;
use tracing::{info, instrument};

/// Una entidad lista para someterse, o ya decidida como `not_accepted` sin
/// llamada HTTP (§4.3 KWSE specialization: "classify as not_accepted
/// without an HTTP call").
pub enum SubmissionInput {
    Submit { entity: EntityRef, payload: serde_json::Value },
    SkipNotAccepted { entity: EntityRef },
}

impl SubmissionInput {
    pub fn entity(&self) -> &EntityRef {
        match self {
            SubmissionInput::Submit { entity, .. } => entity,
            SubmissionInput::SkipNotAccepted { entity } => entity,
        }
    }
}

/// Resultado completo de una etapa, incluido el conjunto `valid_entities`
/// (§4.3: "succeeded ∪ unknown") que la siguiente etapa del DAG consume.
#[derive(Debug, Default, Clone)]
pub struct StepOutcome {
    pub accepted: Vec<JobRecord>,
    pub not_accepted: Vec<JobRecord>,
    pub succeeded: Vec<JobRecord>,
    pub failed: Vec<JobRecord>,
    pub unknown: Vec<JobRecord>,
}

impl StepOutcome {
    /// `{e | status ∈ {successful, unknown}}` (§4.3, §8 invariant 3).
    pub fn valid_entities(&self) -> Vec<EntityRef> {
        self.succeeded
            .iter()
            .chain(self.unknown.iter())
            .map(|record| record.entity.clone())
            .collect()
    }
}

fn model_rows(records: &[JobRecord]) -> Vec<(String, String)> {
    records
        .iter()
        .map(|record| match &record.entity {
            EntityRef::Model { model_id } => (model_id.clone(), record.job_id.clone()),
            EntityRef::Reach { .. } => unreachable!("model_rows called on a Reach record"),
        })
        .collect()
}

fn reach_rows(records: &[JobRecord]) -> Vec<(i64, String)> {
    records
        .iter()
        .map(|record| match &record.entity {
            EntityRef::Reach { reach_id } => (*reach_id, record.job_id.clone()),
            EntityRef::Model { .. } => unreachable!("reach_rows called on a Model record"),
        })
        .collect()
}

async fn persist_bucket(
    store: &StateStoreRepository,
    collection_id: &str,
    domain: EntityDomain,
    stage_key: &'static str,
    status: JobStatus,
    records: &[JobRecord],
) -> Result<(), StepProcessorError> {
    if records.is_empty() {
        return Ok(());
    }
    match domain {
        EntityDomain::Model => store.update_models(collection_id, stage_key, status, &model_rows(records)).await?,
        EntityDomain::Reach => store.update_processing(stage_key, status, &reach_rows(records)).await?,
    }
    Ok(())
}

/// Corre el template completo de una etapa para un lote de entidades ya
/// resueltas por la especialización (§4.3):
///
/// 1. Somete (o salta) cada entidad, clasificando en `accepted`/`not_accepted`.
/// 2. Persiste ambos buckets — estrictamente antes de esperar (§5 ordering).
/// 3. Espera el veredicto terminal de cada `accepted` con el timeout de la etapa.
/// 4. Persiste `successful`/`failed`/`unknown` — estrictamente después de esperar.
#[instrument(skip(job_client, store, inputs), fields(stage = stage_key))]
pub async fn run_stage(
    job_client: &JobClient,
    store: &StateStoreRepository,
    collection_id: &str,
    stage_key: &'static str,
    api_process_name: &str,
    domain: EntityDomain,
    timeout_minutes: i64,
    inputs: Vec<SubmissionInput>,
) -> Result<StepOutcome, StepProcessorError> {
    let mut accepted = Vec::new();
    let mut not_accepted = Vec::new();

    for input in inputs {
        match input {
            SubmissionInput::Submit { entity, payload } => {
                let (job_id, status) = job_client.submit(api_process_name, &payload).await;
                let record = JobRecord::new(entity, job_id, status);
                match status {
                    JobStatus::Accepted => accepted.push(record),
                    _ => not_accepted.push(record),
                }
            }
            SubmissionInput::SkipNotAccepted { entity } => {
                not_accepted.push(JobRecord::new(entity, "", JobStatus::NotAccepted));
            }
        }
    }

    persist_bucket(store, collection_id, domain, stage_key, JobStatus::Accepted, &accepted).await?;
    persist_bucket(store, collection_id, domain, stage_key, JobStatus::NotAccepted, &not_accepted).await?;

    let (succeeded, failed, unknown) = job_client.wait_for_jobs(accepted.clone(), timeout_minutes).await;

    persist_bucket(store, collection_id, domain, stage_key, JobStatus::Successful, &succeeded).await?;
    persist_bucket(store, collection_id, domain, stage_key, JobStatus::Failed, &failed).await?;
    persist_bucket(store, collection_id, domain, stage_key, JobStatus::Unknown, &unknown).await?;

    info!(
        accepted = accepted.len(),
        not_accepted = not_accepted.len(),
        succeeded = succeeded.len(),
        failed = failed.len(),
        unknown = unknown.len(),
        "etapa completada"
    );

    Ok(StepOutcome { accepted, not_accepted, succeeded, failed, unknown })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_infra_state_store::StateStoreClient;

    async fn fresh_store() -> StateStoreRepository {
        let client = StateStoreClient::connect(":memory:", 10_000).await.unwrap();
        StateStoreRepository::new(client)
    }

    #[test]
    fn valid_entities_is_the_union_of_succeeded_and_unknown_never_failed() {
        let outcome = StepOutcome {
            accepted: vec![],
            not_accepted: vec![JobRecord::new(EntityRef::Reach { reach_id: 1 }, "", JobStatus::NotAccepted)],
            succeeded: vec![JobRecord::new(EntityRef::Reach { reach_id: 2 }, "j2", JobStatus::Successful)],
            failed: vec![JobRecord::new(EntityRef::Reach { reach_id: 3 }, "j3", JobStatus::Failed)],
            unknown: vec![JobRecord::new(EntityRef::Reach { reach_id: 4 }, "j4", JobStatus::Unknown)],
        };
        let valid = outcome.valid_entities();
        assert_eq!(valid.len(), 2);
        assert!(valid.contains(&EntityRef::Reach { reach_id: 2 }));
        assert!(valid.contains(&EntityRef::Reach { reach_id: 4 }));
    }

    #[tokio::test]
    async fn skip_not_accepted_entities_never_reach_the_job_client() {
        // E5-style scenario at the engine level: an entity pre-decided as
        // not_accepted must be persisted without ever calling submit/wait.
        let store = fresh_store().await;
        store.init("1.0.0", 0.5, 0.5, &[(100, None)]).await.unwrap();

        let job_client = JobClient::new("http://127.0.0.1:1", 1, 0.01);
        let inputs = vec![SubmissionInput::SkipNotAccepted { entity: EntityRef::Reach { reach_id: 100 } }];

        let outcome = run_stage(
            &job_client,
            &store,
            "collection-a",
            "run_known_wse",
            "run-known-wse",
            EntityDomain::Reach,
            1,
            inputs,
        )
        .await
        .unwrap();

        assert_eq!(outcome.not_accepted.len(), 1);
        assert!(outcome.accepted.is_empty());
        assert!(outcome.valid_entities().is_empty());
    }
}
