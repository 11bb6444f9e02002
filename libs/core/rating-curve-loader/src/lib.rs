// [libs/core/rating-curve-loader/src/lib.rs]
/*!
 * =================================================================
 * APARATO: RATING-CURVE LOADER
 * CLASIFICACIÓN: CORE ENGINE (ESTRATO L6)
 * RESPONSABILIDAD: FUSIÓN DE RESULTADOS POR-REACH EN EL ALMACÉN CENTRAL
 *
 * Por cada `submodels/<id>/<id>.db` presente (§4.7): lee filas `nd`/`kwse`,
 * las separa por `map_exist`, inserta con `INSERT OR IGNORE` (idempotente
 * bajo la clave única, §8 invariante 4) y borra el archivo local solo si la
 * fusión de esa base terminó sin error (§9 "Per-reach DB deletion after
 * merge" — decisión tomada: conservar en disco ante cualquier fallo parcial
 * para inspección manual, ver DESIGN.md).
 * =================================================================
 */

pub mod errors;

pub use errors::RatingCurveLoaderError;

use ripple_domain_models::RatingCurveRow;
use ripple_infra_collection_context::CollectionPaths;
use ripple_infra_state_store::{RatingCurveTable, StateStoreRepository};
use ripple_infra_submodel_reader::read_rating_curve_rows;
use tracing::{info, instrument, warn};

#[derive(Debug, Default, Clone)]
pub struct MergeReport {
    pub merged_reach_ids: Vec<i64>,
    pub kept_for_inspection: Vec<i64>,
    pub rows_with_map: u64,
    pub rows_no_map: u64,
}

/// Reach ids con un subdirectorio `submodels/<id>/` conteniendo `<id>.db`.
fn discover_result_dbs(submodels_dir: &std::path::Path) -> std::io::Result<Vec<i64>> {
    if !submodels_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut ids = Vec::new();
    for entry in std::fs::read_dir(submodels_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Ok(reach_id) = entry.file_name().to_string_lossy().parse::<i64>() else { continue };
        let db_path = entry.path().join(format!("{reach_id}.db"));
        if db_path.is_file() {
            ids.push(reach_id);
        }
    }
    ids.sort_unstable();
    Ok(ids)
}

/// Funde todas las bases de resultados por-reach presentes bajo
/// `paths.submodels_dir` en el almacén central. Un fallo al fundir una base
/// individual se registra y no interrumpe el resto del lote (§7
/// "Per-reach result-DB merge error").
#[instrument(skip(store, paths))]
pub async fn merge_all(store: &StateStoreRepository, paths: &CollectionPaths) -> Result<MergeReport, RatingCurveLoaderError> {
    let mut report = MergeReport::default();

    for reach_id in discover_result_dbs(&paths.submodels_dir)? {
        match merge_one(store, paths, reach_id).await {
            Ok((with_map, no_map)) => {
                report.merged_reach_ids.push(reach_id);
                report.rows_with_map += with_map;
                report.rows_no_map += no_map;
            }
            Err(error) => {
                warn!(reach_id, %error, "fusión de curva de gasto falló; se conserva la base para inspección");
                report.kept_for_inspection.push(reach_id);
            }
        }
    }

    info!(
        merged = report.merged_reach_ids.len(),
        kept_for_inspection = report.kept_for_inspection.len(),
        rows_with_map = report.rows_with_map,
        rows_no_map = report.rows_no_map,
        "fusión de curvas de gasto completada"
    );

    Ok(report)
}

async fn merge_one(store: &StateStoreRepository, paths: &CollectionPaths, reach_id: i64) -> Result<(u64, u64), RatingCurveLoaderError> {
    let db_path = paths.submodel_result_db(reach_id);
    let rows = read_rating_curve_rows(&db_path).await?;

    let (with_map, no_map): (Vec<RatingCurveRow>, Vec<RatingCurveRow>) =
        rows.into_iter().fold((Vec::new(), Vec::new()), |(mut with_map, mut no_map), (row, map_exist)| {
            if map_exist {
                with_map.push(row);
            } else {
                no_map.push(row);
            }
            (with_map, no_map)
        });

    let with_map_inserted = store.insert_rating_curves(RatingCurveTable::WithMap, &with_map).await?;
    let no_map_inserted = store.insert_rating_curves(RatingCurveTable::NoMap, &no_map).await?;

    std::fs::remove_file(&db_path)?;

    Ok((with_map_inserted, no_map_inserted))
}
