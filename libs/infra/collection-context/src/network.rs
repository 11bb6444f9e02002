// [libs/infra/collection-context/src/network.rs]
//! Lectura de `NWM_FLOWLINES_PATH` (§6 "paths"): un GeoPackage ya filtrado a
//! la huella de la colección por una herramienta externa a este CORE, con
//! una capa `reaches(reach_id, nwm_to_id, geom)` (§4.1). Un GeoPackage es un
//! archivo SQLite, así que se lee con el mismo driver que el almacén de
//! estado en lugar de tender un stack geoespacial completo para un `SELECT`
//! de dos columnas.

use crate::errors::ContextError;
use libsql::Builder;
use std::path::Path;
use tracing::{info, instrument};

/// `(reach_id, nwm_to_id)` por fila de la capa `reaches`, en el orden que
/// entrega SQLite. Alimenta `StateStoreRepository::init` (§4.1 "seeded from
/// the filtered flowline file").
#[instrument]
pub async fn read_seed_reaches(nwm_flowlines_path: &Path) -> Result<Vec<(i64, Option<i64>)>, ContextError> {
    let database = Builder::new_local(nwm_flowlines_path.to_string_lossy().as_ref()).build().await?;
    let connection = database.connect()?;

    let mut rows = connection.query("SELECT reach_id, nwm_to_id FROM reaches", ()).await?;

    let mut seeds = Vec::new();
    while let Some(row) = rows.next().await? {
        let reach_id: i64 = row.get(0)?;
        let nwm_to_id: Option<i64> = row.get(1)?;
        seeds.push((reach_id, nwm_to_id));
    }

    info!(count = seeds.len(), path = %nwm_flowlines_path.display(), "reaches NWM leídos para sembrar la red");
    Ok(seeds)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_flowlines_gpkg(path: &Path) {
        let database = Builder::new_local(path.to_string_lossy().as_ref()).build().await.unwrap();
        let connection = database.connect().unwrap();
        connection.execute("CREATE TABLE reaches (reach_id INTEGER PRIMARY KEY, nwm_to_id INTEGER, geom BLOB)", ()).await.unwrap();
        connection.execute("INSERT INTO reaches (reach_id, nwm_to_id) VALUES (100, 200)", ()).await.unwrap();
        connection.execute("INSERT INTO reaches (reach_id, nwm_to_id) VALUES (200, NULL)", ()).await.unwrap();
    }

    #[tokio::test]
    async fn reads_reach_id_and_nwm_to_id_pairs_in_file_order() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("flowlines.gpkg");
        seeded_flowlines_gpkg(&path).await;

        let seeds = read_seed_reaches(&path).await.unwrap();
        assert_eq!(seeds, vec![(100, Some(200)), (200, None)]);
    }
}
