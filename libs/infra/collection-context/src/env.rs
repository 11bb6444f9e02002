// [libs/infra/collection-context/src/env.rs]
//! Variables de entorno cargadas desde `.env` (§6): URL del servicio remoto
//! de cómputo, URL de STAC (consumida fuera del CORE, §1 Out of scope) y
//! credenciales AWS (idem). El CORE solo necesita `RIPPLE1D_API_URL`; las
//! demás se exponen para que el nivel de aplicación (reporting, colaboradores
//! externos) no tenga que releer `.env` por su cuenta.

use crate::errors::ContextError;

#[derive(Debug, Clone)]
pub struct RuntimeEnv {
    pub ripple1d_api_url: String,
    pub stac_url: Option<String>,
}

impl RuntimeEnv {
    /// Carga `.env` (si existe; ausencia no es fatal, §6) y lee las
    /// variables relevantes para el CORE. `RIPPLE1D_API_URL` ausente es un
    /// error de configuración fatal (§7): el Job Client no puede construirse
    /// sin ella.
    pub fn load() -> Result<Self, ContextError> {
        dotenvy::dotenv().ok();

        let ripple1d_api_url = std::env::var("RIPPLE1D_API_URL")
            .map_err(|_| ContextError::MissingEnvVar("RIPPLE1D_API_URL".to_string()))?;
        let stac_url = std::env::var("STAC_URL").ok();

        Ok(Self { ripple1d_api_url, stac_url })
    }
}
