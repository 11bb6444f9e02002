// [libs/domain/models/src/entity.rs]
//! Contratos de entidades del pipeline hidráulico: modelos, alcances (reaches),
//! misiones de cómputo y curvas de gasto.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Dominio de una entidad procesada por una etapa (§4.3 "domain").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityDomain {
    Model,
    Reach,
}

/// Variante soberana que evita la jerarquía de subclases del original
/// (Conflate/GenericReach/KWSE): una sola unión etiquetada que carga o
/// bien un Modelo o bien un Reach, consumida por un único Step Processor
/// genérico (ver DESIGN NOTES §9, "Dynamic dispatch over stages").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum EntityRef {
    Model { model_id: String },
    Reach { reach_id: i64 },
}

impl EntityRef {
    pub fn domain(&self) -> EntityDomain {
        match self {
            EntityRef::Model { .. } => EntityDomain::Model,
            EntityRef::Reach { .. } => EntityDomain::Reach,
        }
    }

    /// Identificador nominal usado como clave primaria en las tablas de estado.
    pub fn identifier(&self) -> String {
        match self {
            EntityRef::Model { model_id } => model_id.clone(),
            EntityRef::Reach { reach_id } => reach_id.to_string(),
        }
    }
}

/// Veredicto de una misión remota (§3 "Job record").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Accepted,
    NotAccepted,
    Successful,
    Failed,
    /// Veredicto de lado cliente: el servidor aún reporta `running` pero el
    /// reloj de inactividad expiró. No es un fallo definitivo (§4.2).
    Unknown,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Accepted => "accepted",
            JobStatus::NotAccepted => "not_accepted",
            JobStatus::Successful => "successful",
            JobStatus::Failed => "failed",
            JobStatus::Unknown => "unknown",
        }
    }

    /// True para los estados que alimentan la siguiente etapa (§8, invariante 3).
    pub fn is_valid_for_next_stage(&self) -> bool {
        matches!(self, JobStatus::Successful | JobStatus::Unknown)
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "accepted" => Ok(JobStatus::Accepted),
            "not_accepted" => Ok(JobStatus::NotAccepted),
            "successful" => Ok(JobStatus::Successful),
            "failed" => Ok(JobStatus::Failed),
            "unknown" => Ok(JobStatus::Unknown),
            other => Err(format!("UNRECOGNIZED_JOB_STATUS: {other}")),
        }
    }
}

/// Resultado de la clasificación de una entidad tras someterla a una etapa.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub entity: EntityRef,
    pub job_id: String,
    pub status: JobStatus,
}

impl JobRecord {
    pub fn new(entity: EntityRef, job_id: impl Into<String>, status: JobStatus) -> Self {
        Self { entity, job_id: job_id.into(), status }
    }
}

/// Fila `models` (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRecord {
    pub collection_id: String,
    pub model_id: String,
    pub model_name: String,
}

/// Fila `reaches`/`network` fusionada a nivel de dominio (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReachRecord {
    pub reach_id: i64,
    pub nwm_to_id: Option<i64>,
    pub updated_to_id: Option<i64>,
    pub model_id: Option<String>,
    pub model_name: Option<String>,
    pub eclipsed: bool,
}

/// Condición de frontera de una corrida hidráulica (GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryCondition {
    Nd,
    Kwse,
}

impl BoundaryCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryCondition::Nd => "nd",
            BoundaryCondition::Kwse => "kwse",
        }
    }
}

impl std::str::FromStr for BoundaryCondition {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "nd" => Ok(BoundaryCondition::Nd),
            "kwse" => Ok(BoundaryCondition::Kwse),
            other => Err(format!("UNRECOGNIZED_BOUNDARY_CONDITION: {other}")),
        }
    }
}

/// Fila de curva de gasto (§3 "Rating curve row").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingCurveRow {
    pub reach_id: i64,
    pub us_flow: f64,
    pub us_depth: f64,
    pub us_wse: f64,
    pub ds_depth: f64,
    pub ds_wse: f64,
    pub boundary_condition: BoundaryCondition,
}

/// Rango de elevación aguas arriba usado como frontera de una corrida KWSE (§4.3, §4.5).
#[derive(Debug, Clone, Copy)]
pub struct ElevationRange {
    pub min_elevation: f64,
    pub max_elevation: f64,
}

/// Una entrada de un payload de conflación para un único reach (§9, "Conflation
/// JSON schema drift"): se prefiere la forma explícita `eclipsed: bool`,
/// ausente == false.
#[derive(Debug, Clone, Deserialize)]
pub struct ConflationReachEntry {
    #[serde(default)]
    pub eclipsed: bool,
}

/// Payload de conflación completo para un modelo (§4.1 "Conflation merge order").
#[derive(Debug, Clone, Deserialize)]
pub struct ConflationPayload {
    pub model_id: String,
    pub reaches: HashMap<i64, ConflationReachEntry>,
    /// Longitud RAS total cubierta por el modelo; ausente se trata como 0.
    #[serde(default)]
    pub total_ras_length: Option<f64>,
}

impl ConflationPayload {
    pub fn reach_count(&self) -> usize {
        self.reaches.len()
    }

    pub fn total_ras_length_or_zero(&self) -> f64 {
        self.total_ras_length.unwrap_or(0.0)
    }

    /// Clave de ordenamiento ascendente usada para resolver conflación
    /// disputada entre varios modelos (§4.1): el pago más grande/confiable
    /// se aplica al final y por lo tanto gana.
    pub fn merge_priority_key(&self) -> (usize, ordered_float::OrderedFloat<f64>) {
        (self.reach_count(), ordered_float::OrderedFloat(self.total_ras_length_or_zero()))
    }
}

pub mod ordered_float {
    //! Envoltorio mínimo de orden total sobre `f64`, suficiente para ordenar
    //! claves de prioridad de conflación (NaN no aparece en longitudes RAS).
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct OrderedFloat<T>(pub T);

    impl Eq for OrderedFloat<f64> {}

    impl PartialOrd for OrderedFloat<f64> {
        fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
            Some(self.cmp(other))
        }
    }

    impl Ord for OrderedFloat<f64> {
        fn cmp(&self, other: &Self) -> std::cmp::Ordering {
            self.0.partial_cmp(&other.0).unwrap_or(std::cmp::Ordering::Equal)
        }
    }
}
