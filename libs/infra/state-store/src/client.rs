// [libs/infra/state-store/src/client.rs]
/*!
 * =================================================================
 * APARATO: STATE STORE CONNECTION CLIENT
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L1)
 * RESPONSABILIDAD: GESTIÓN DE ENLACES Y PERSISTENCIA ACID
 *
 * Una conexión se abre por llamada (§4.1: "concurrency via a connection
 * opened per call in WAL mode with a busy-timeout of ≥10s"). No se
 * mantiene un pool: el propio archivo SQLite arbitra vía WAL + busy_timeout.
 * =================================================================
 */

use crate::errors::StateStoreError;
use crate::schema::apply_schema;
use libsql::{Builder, Database};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct StateStoreClient {
    database: Arc<Database>,
    busy_timeout_ms: u64,
}

impl StateStoreClient {
    /// Abre (o crea) el archivo `ripple.gpkg` de una colección y aplica el
    /// esquema. `busy_timeout_ms` viene de `database.DB_CONN_TIMEOUT` (§6),
    /// convertido de segundos a milisegundos por el llamador.
    #[instrument(skip(database_path))]
    pub async fn connect(database_path: &str, busy_timeout_ms: u64) -> Result<Self, StateStoreError> {
        if database_path.is_empty() {
            return Err(StateStoreError::ConnectionError("STATE_STORE_PATH_UNDEFINED".into()));
        }

        info!(database_path, "abriendo el almacén de estado");

        let database = Builder::new_local(database_path)
            .build()
            .await
            .map_err(|e| StateStoreError::ConnectionError(format!("DRIVER_IGNITION_FAILURE: {e}")))?;

        let client = Self { database: Arc::new(database), busy_timeout_ms };

        let bootstrap_connection = client.get_connection()?;
        client.apply_pragmas(&bootstrap_connection).await?;
        apply_schema(&bootstrap_connection).await?;

        Ok(client)
    }

    pub fn get_connection(&self) -> Result<libsql::Connection, StateStoreError> {
        self.database
            .connect()
            .map_err(|e| StateStoreError::ConnectionError(format!("CONNECTION_ALLOCATION_FAULT: {e}")))
    }

    async fn apply_pragmas(&self, connection: &libsql::Connection) -> Result<(), StateStoreError> {
        connection.execute("PRAGMA journal_mode = WAL;", ()).await?;
        connection
            .execute(&format!("PRAGMA busy_timeout = {};", self.busy_timeout_ms), ())
            .await?;
        Ok(())
    }

    /// Abre una conexión fresca con las PRAGMAs de concurrencia ya aplicadas;
    /// usado por cada operación del repositorio (§4.1 policy: "every write
    /// path opens, writes, commits, closes").
    pub async fn open_call_scoped_connection(&self) -> Result<libsql::Connection, StateStoreError> {
        let connection = self.get_connection()?;
        self.apply_pragmas(&connection).await?;
        Ok(connection)
    }
}
