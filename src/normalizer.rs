use crate::error::ForwarderError;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::Value;
use std::borrow::Cow;
use tracing::debug;

const ENVELOPE_FIELDS: [&str; 3] = ["stream", "partition", "value"];

// Falsy: absent, null, false, zero, and empty strings/arrays/objects.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

/// True when `event` carries truthy `stream`, `partition` and `value` fields.
pub fn is_envelope(event: &Value) -> bool {
    event
        .as_object()
        .is_some_and(|obj| ENVELOPE_FIELDS.iter().all(|f| is_truthy(obj.get(*f))))
}

fn unwrap_envelope(event: &Value) -> Result<Value, ForwarderError> {
    let encoded = event
        .get("value")
        .and_then(Value::as_str)
        .ok_or(ForwarderError::EnvelopeValueType)?;
    let decoded = String::from_utf8(STANDARD.decode(encoded)?)?;
    serde_json::from_str(&decoded).map_err(ForwarderError::EnvelopeValue)
}

/// Strips streaming envelopes from `raw` when every record is one.
///
/// Returns the input untouched (borrowed) as soon as any record is not an
/// envelope. Otherwise returns a JSON array of the decoded inner events, in
/// input order. A top-level non-array value is treated as a one-element list.
pub fn normalize(raw: &[u8]) -> Result<Cow<'_, [u8]>, ForwarderError> {
    let parsed: Value = serde_json::from_slice(raw).map_err(|source| ForwarderError::Parse {
        stage: "normalization",
        source,
    })?;

    let events = match &parsed {
        Value::Array(events) => events.as_slice(),
        single => std::slice::from_ref(single),
    };

    let mut converted = Vec::with_capacity(events.len());
    for event in events {
        if !is_envelope(event) {
            debug!("Streaming format not detected");
            return Ok(Cow::Borrowed(raw));
        }
        converted.push(unwrap_envelope(event)?);
    }

    let bytes = serde_json::to_vec(&converted).map_err(ForwarderError::Serialize)?;
    debug!("Streaming format detected, unwrapped {} records", converted.len());
    Ok(Cow::Owned(bytes))
}
