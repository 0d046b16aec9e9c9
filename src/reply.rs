//! Ledger reply decoding and DID Document mapping.
//!
//! Read replies carry the record under `result.data` as a JSON string that holds
//! another JSON document, so the payload is decoded twice.

use serde_json::{Map, Value};

use crate::error::{RequestStage, ResolutionError};
use crate::types::{DIDDocument, PublicKey, Service};

/// Raw attribute holding the service endpoints
pub const ENDPOINT_ATTRIBUTE: &str = "endpoint";

/// Extracts the record carried by a read reply.
///
/// Returns `Ok(None)` when the ledger has no record: the reply has no `result`,
/// `data` is missing or null, or the inner document is `null`. Any other shape is
/// an invalid reply.
pub fn reply_data(
    stage: RequestStage,
    reply: &str,
) -> Result<Option<Map<String, Value>>, ResolutionError> {
    let invalid = |message: String| ResolutionError::InvalidLedgerReply { stage, message };

    let reply = match serde_json::from_str::<Value>(reply).map_err(|e| invalid(e.to_string()))? {
        Value::Object(reply) => reply,
        other => return Err(invalid(format!("reply is not an object: {}", other))),
    };
    let result = match reply.get("result") {
        None => return Ok(None),
        Some(Value::Object(result)) => result,
        Some(other) => return Err(invalid(format!("result is not an object: {}", other))),
    };
    let data = match result.get("data") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(data)) => data,
        Some(other) => return Err(invalid(format!("data is not a string: {}", other))),
    };

    match serde_json::from_str::<Value>(data).map_err(|e| invalid(e.to_string()))? {
        Value::Null => Ok(None),
        Value::Object(content) => Ok(Some(content)),
        other => Err(invalid(format!("data is not an object: {}", other))),
    }
}

/// Builds the DID Document for `identifier` from the NYM record and the optional
/// ATTRIB record
pub fn build_document(
    identifier: &str,
    nym: &Map<String, Value>,
    attrib: Option<&Map<String, Value>>,
) -> Result<DIDDocument, ResolutionError> {
    let verkey = match nym.get("verkey") {
        None => None,
        Some(value) => scalar_text(RequestStage::Nym, "verkey", value)?,
    };
    let public_keys = vec![PublicKey::ed25519(identifier.to_string(), verkey)];

    let services = match attrib
        .and_then(|attrib| attrib.get(ENDPOINT_ATTRIBUTE))
        .and_then(Value::as_object)
    {
        Some(endpoint) => endpoint_services(endpoint)?,
        None => Vec::new(),
    };

    Ok(DIDDocument::new(identifier.to_string(), public_keys, services))
}

fn endpoint_services(endpoint: &Map<String, Value>) -> Result<Vec<Service>, ResolutionError> {
    let mut services = Vec::new();
    for (name, value) in endpoint {
        if let Some(value) = scalar_text(RequestStage::Attrib, name, value)? {
            services.push(Service::new(name.clone(), value));
        }
    }
    Ok(services)
}

// Strings as-is, numbers and booleans as their JSON text, null as absent.
fn scalar_text(stage: RequestStage, field: &str, value: &Value) -> Result<Option<String>, ResolutionError> {
    match value {
        Value::Null => Ok(None),
        Value::String(value) => Ok(Some(value.clone())),
        Value::Number(_) | Value::Bool(_) => Ok(Some(value.to_string())),
        Value::Array(_) | Value::Object(_) => Err(ResolutionError::InvalidLedgerReply {
            stage,
            message: format!("{} is not a scalar: {}", field, value),
        }),
    }
}
