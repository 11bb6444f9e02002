// [libs/infra/job-client/src/lib.rs]
//
// =================================================================
// APARATO: JOB CLIENT
// CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L2)
// RESPONSABILIDAD: ADAPTADOR DELGADO SOBRE EL SERVICIO REMOTO DE MISIONES
// =================================================================

pub mod client;
pub mod errors;
pub mod wire;

pub use client::{bucket_submissions, JobClient};
pub use errors::JobClientError;

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_domain_models::{EntityRef, JobStatus};

    #[test]
    fn bucket_submissions_separates_accepted_from_everything_else() {
        let entities = vec![
            (EntityRef::Reach { reach_id: 1 }, ("job-1".to_string(), JobStatus::Accepted)),
            (EntityRef::Reach { reach_id: 2 }, (String::new(), JobStatus::NotAccepted)),
        ];
        let (accepted, not_accepted) = bucket_submissions(entities);
        assert_eq!(accepted.len(), 1);
        assert_eq!(not_accepted.len(), 1);
        assert_eq!(accepted[0].job_id, "job-1");
    }
}
