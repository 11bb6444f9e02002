// [libs/infra/state-store/src/repositories/conflation.rs]
//! Orden de aplicación de payloads de conflación en disputa (§4.1 "Conflation
//! merge order"): ascendente por `(reach_count, total_ras_length)`, de modo
//! que el último en aplicarse — el de mayor confianza — gane.

use ripple_domain_models::ConflationPayload;

pub fn order_conflation_payloads(mut payloads: Vec<ConflationPayload>) -> Vec<ConflationPayload> {
    payloads.sort_by(|a, b| a.merge_priority_key().cmp(&b.merge_priority_key()));
    payloads
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn payload(model_id: &str, reach_count: usize, total_ras_length: Option<f64>) -> ConflationPayload {
        let reaches = (0..reach_count as i64)
            .map(|id| (id, ripple_domain_models::ConflationReachEntry { eclipsed: false }))
            .collect::<HashMap<_, _>>();
        ConflationPayload { model_id: model_id.to_string(), reaches, total_ras_length }
    }

    #[test]
    fn smaller_payload_sorts_before_larger_one() {
        let ordered = order_conflation_payloads(vec![
            payload("big", 10, Some(500.0)),
            payload("small", 2, Some(10.0)),
        ]);
        assert_eq!(ordered[0].model_id, "small");
        assert_eq!(ordered[1].model_id, "big");
    }

    #[test]
    fn missing_length_treated_as_zero() {
        let ordered = order_conflation_payloads(vec![
            payload("has_length", 3, Some(1.0)),
            payload("no_length", 3, None),
        ]);
        assert_eq!(ordered[0].model_id, "no_length");
        assert_eq!(ordered[1].model_id, "has_length");
    }
}
