// [libs/infra/submodel-reader/src/lib.rs]
/*!
 * =================================================================
 * APARATO: SUBMODEL RESULT DB READER
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L1b)
 * RESPONSABILIDAD: LECTURA DE `submodels/<id>/<id>.db` (RANGO DE ELEVACIÓN Y
 * FILAS DE CURVA DE GASTO)
 *
 * La base de resultados por reach vive fuera del almacén central de estado:
 * la produce el servicio remoto de cómputo y la consume este crate antes de
 * que `ripple-core-rating-curve-loader` la funda en el almacén central y la
 * elimine (§4.7). Sin conexión persistente: cada llamada abre, lee y cierra.
 * =================================================================
 */

pub mod errors;

pub use errors::SubmodelReaderError;

use libsql::Builder;
use ripple_domain_models::{BoundaryCondition, ElevationRange, RatingCurveRow};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, instrument};

/// `MIN(us_wse), MAX(us_wse)` sobre las curvas `nd` de `db_path` (§4.3 KWSE
/// preamble, §4.5 worker paso 1). `None` si el archivo no existe o si no
/// tiene filas `nd` — ambos casos significan "frontera aún no disponible".
#[instrument]
pub async fn elevation_range(db_path: &Path) -> Result<Option<ElevationRange>, SubmodelReaderError> {
    if !db_path.is_file() {
        debug!(path = %db_path.display(), "submodelo aún no existe, sin rango de elevación");
        return Ok(None);
    }

    let database = Builder::new_local(db_path.to_string_lossy().as_ref()).build().await?;
    let connection = database.connect()?;

    let mut rows = connection
        .query(
            "SELECT MIN(us_wse), MAX(us_wse) FROM rating_curves WHERE plan_suffix = 'nd'",
            (),
        )
        .await?;

    let Some(row) = rows.next().await? else {
        return Ok(None);
    };

    let min_elevation: Option<f64> = row.get(0)?;
    let max_elevation: Option<f64> = row.get(1)?;

    match (min_elevation, max_elevation) {
        (Some(min_elevation), Some(max_elevation)) => Ok(Some(ElevationRange { min_elevation, max_elevation })),
        _ => Ok(None),
    }
}

/// Filas `nd`/`kwse` de `db_path`, con su bandera `map_exist` (§4.7). Una
/// fila `(row, false)` va a `rating_curves_no_map`; `(row, true)` va a
/// `rating_curves`. El archivo ausente se trata como "sin filas".
#[instrument]
pub async fn read_rating_curve_rows(db_path: &Path) -> Result<Vec<(RatingCurveRow, bool)>, SubmodelReaderError> {
    if !db_path.is_file() {
        return Ok(Vec::new());
    }

    let database = Builder::new_local(db_path.to_string_lossy().as_ref()).build().await?;
    let connection = database.connect()?;

    let mut rows = connection
        .query(
            "SELECT reach_id, us_flow, us_depth, us_wse, ds_depth, ds_wse, plan_suffix, map_exist \
             FROM rating_curves WHERE plan_suffix IN ('nd', 'kwse')",
            (),
        )
        .await?;

    let mut results = Vec::new();
    while let Some(row) = rows.next().await? {
        let boundary_text: String = row.get(6)?;
        let boundary_condition = BoundaryCondition::from_str(&boundary_text)
            .map_err(SubmodelReaderError::UnrecognizedBoundaryCondition)?;
        let map_exist: i64 = row.get(7)?;

        results.push((
            RatingCurveRow {
                reach_id: row.get(0)?,
                us_flow: row.get(1)?,
                us_depth: row.get(2)?,
                us_wse: row.get(3)?,
                ds_depth: row.get(4)?,
                ds_wse: row.get(5)?,
                boundary_condition,
            },
            map_exist != 0,
        ));
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_result_db(path: &Path) {
        let database = Builder::new_local(path.to_string_lossy().as_ref()).build().await.unwrap();
        let connection = database.connect().unwrap();
        connection
            .execute(
                "CREATE TABLE rating_curves (reach_id INTEGER, plan_suffix TEXT, map_exist INTEGER, \
                 us_flow REAL, us_depth REAL, us_wse REAL, ds_depth REAL, ds_wse REAL)",
                (),
            )
            .await
            .unwrap();
        connection
            .execute(
                "INSERT INTO rating_curves VALUES (100, 'nd', 1, 10.0, 1.0, 5.0, 0.5, 4.5)",
                (),
            )
            .await
            .unwrap();
        connection
            .execute(
                "INSERT INTO rating_curves VALUES (100, 'nd', 1, 20.0, 2.0, 6.0, 1.5, 5.5)",
                (),
            )
            .await
            .unwrap();
        connection
            .execute(
                "INSERT INTO rating_curves VALUES (100, 'kwse', 0, 30.0, 3.0, 7.0, 2.5, 6.5)",
                (),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_db_file_yields_no_elevation_range() {
        let tmp = tempfile::tempdir().unwrap();
        let result = elevation_range(&tmp.path().join("200.db")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn elevation_range_spans_nd_rows_only() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("100.db");
        seeded_result_db(&db_path).await;

        let range = elevation_range(&db_path).await.unwrap().unwrap();
        assert_eq!(range.min_elevation, 5.0);
        assert_eq!(range.max_elevation, 6.0);
    }

    #[tokio::test]
    async fn read_rating_curve_rows_reports_map_exist_flag_per_row() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("100.db");
        seeded_result_db(&db_path).await;

        let rows = read_rating_curve_rows(&db_path).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows.iter().filter(|(_, map_exist)| *map_exist).count(), 2);
        assert_eq!(rows.iter().filter(|(_, map_exist)| !*map_exist).count(), 1);
    }
}
