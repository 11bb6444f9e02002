// [libs/core/step-processor/src/template.rs]
//! Sustitución de placeholders en un `payload_template` de configuración
//! (§4.3): `{model_id}`, `{model_name}`, `{nwm_reach_id}`,
//! `{source_model_directory}`, `{submodels_directory}`, `{library_directory}`
//! y cualquier otra clave que la especialización de la etapa inyecte (p.ej.
//! `{source_network}` para conflación). Los valores no-string del template
//! pasan intactos (§4.3: "Non-string template values pass through unchanged").

use serde_json::Value;
use std::collections::HashMap;

/// Reescribe recursivamente todo valor `String` del template reemplazando
/// cada `{clave}` presente en `substitutions`. Claves del template ausentes
/// en `substitutions` quedan literales: es responsabilidad del llamador
/// proveer exactamente las que la etapa declara usar.
pub fn format_payload(template: &Value, substitutions: &HashMap<String, String>) -> Value {
    match template {
        Value::String(text) => Value::String(substitute(text, substitutions)),
        Value::Array(items) => Value::Array(items.iter().map(|item| format_payload(item, substitutions)).collect()),
        Value::Object(map) => {
            let rewritten = map.iter().map(|(key, value)| (key.clone(), format_payload(value, substitutions))).collect();
            Value::Object(rewritten)
        }
        other => other.clone(),
    }
}

fn substitute(text: &str, substitutions: &HashMap<String, String>) -> String {
    let mut result = text.to_string();
    for (key, value) in substitutions {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}
