// [libs/infra/state-store/src/repositories/network_math.rs]
/*!
 * =================================================================
 * APARATO: UPDATE-NETWORK ALGORITHM
 * CLASIFICACIÓN: INFRASTRUCTURE MATH (ESTRATO L1)
 * RESPONSABILIDAD: CÁLCULO PURO DEL GRAFO POSTERIOR A CONFLACIÓN
 *
 * Sin E/S. Toma los dos mapas ya leídos del almacén (reaches válidos y
 * eclipsados) y produce el conjunto de aristas a aplicar en bloque (§4.1
 * "Update-Network algorithm").
 * =================================================================
 */

use std::collections::HashMap;

/// Para cada reach válido `r` con aguas abajo `t` presente, salta los reaches
/// eclipsados intermedios hasta encontrar un reach válido o quedarse sin
/// aguas abajo. Emite `(r, nuevo_downstream)` solo cuando el recorrido
/// termina en un reach válido.
pub fn compute_update_network(
    valid_reaches: &HashMap<i64, Option<i64>>,
    eclipsed_reaches: &HashMap<i64, Option<i64>>,
) -> Vec<(i64, i64)> {
    let mut edges = Vec::new();

    for (&reach_id, &downstream) in valid_reaches {
        let Some(mut cursor) = downstream else { continue };

        loop {
            match eclipsed_reaches.get(&cursor) {
                Some(Some(next)) => cursor = *next,
                Some(None) => {
                    // El reach eclipsado es en sí mismo un punto terminal: no hay aguas abajo.
                    cursor = i64::MIN;
                    break;
                }
                None => break,
            }
        }

        if cursor != i64::MIN && valid_reaches.contains_key(&cursor) {
            edges.push((reach_id, cursor));
        }
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_network_no_eclipsed_reaches_emits_the_direct_edge() {
        // E1: two-reach linear network, nothing eclipsed — updated_to_id(100)
        // still resolves to 200 since 200 is already a valid reach.
        let valid = HashMap::from([(100, Some(200)), (200, None)]);
        let eclipsed = HashMap::new();
        assert_eq!(compute_update_network(&valid, &eclipsed), vec![(100, 200)]);
    }

    #[test]
    fn eclipsed_middle_reach_is_skipped() {
        let valid = HashMap::from([(100, Some(150)), (200, None)]);
        let eclipsed = HashMap::from([(150, Some(200))]);
        let edges = compute_update_network(&valid, &eclipsed);
        assert_eq!(edges, vec![(100, 200)]);
    }

    #[test]
    fn chain_of_eclipsed_reaches_is_fully_skipped() {
        let valid = HashMap::from([(100, Some(150)), (300, None)]);
        let eclipsed = HashMap::from([(150, Some(250)), (250, Some(300))]);
        let edges = compute_update_network(&valid, &eclipsed);
        assert_eq!(edges, vec![(100, 300)]);
    }

    #[test]
    fn dead_end_through_eclipsed_reaches_emits_no_edge() {
        let valid = HashMap::from([(100, Some(150))]);
        let eclipsed = HashMap::from([(150, Some(999))]);
        // 999 no está en ninguno de los dos mapas: "leaves both maps".
        assert_eq!(compute_update_network(&valid, &eclipsed), Vec::<(i64, i64)>::new());
    }

    #[test]
    fn eclipsed_terminal_reach_emits_no_edge() {
        let valid = HashMap::from([(100, Some(150))]);
        let eclipsed = HashMap::from([(150, None)]);
        assert_eq!(compute_update_network(&valid, &eclipsed), Vec::<(i64, i64)>::new());
    }
}
