use serde_json::{Map, Value};

use crate::op::Operation;
use crate::outcome::{Outcome, OutputRecord, RejectReason};

pub const DELETED_FIELD: &str = "_deleted";
pub const OP_FIELD: &str = "_op";
pub const TS_FIELD: &str = "_ts_ms";
pub const SOURCE_TS_FIELD: &str = "_source_ts_ms";

/// Flatten a serialized Debezium envelope into a row.
///
/// c/u/r take the `after` image, d takes `before` and is marked `_deleted`.
/// A missing image yields a metadata-only row. The envelope must carry a
/// truthy `payload` and `op`, a known op code and a non-null `payload.source`.
pub fn flatten_event(raw: &str) -> Outcome {
    try_flatten(raw).into()
}

fn try_flatten(raw: &str) -> Result<OutputRecord, RejectReason> {
    let envelope: Value =
        serde_json::from_str(raw).map_err(|e| RejectReason::Malformed(e.to_string()))?;

    let payload = envelope
        .get("payload")
        .filter(|v| truthy(v))
        .ok_or(RejectReason::MissingPayload)?;
    let op_value = payload
        .get("op")
        .filter(|v| truthy(v))
        .ok_or(RejectReason::MissingOp)?;
    let op = op_value
        .as_str()
        .and_then(Operation::from_code)
        .ok_or_else(|| RejectReason::UnknownOp(op_value.to_string()))?;

    let mut record = row_image(payload, op);
    if op.is_delete() {
        record.insert(DELETED_FIELD.to_string(), Value::Bool(true));
    }

    let source = payload
        .get("source")
        .filter(|v| !v.is_null())
        .ok_or(RejectReason::MissingSource)?;

    record.insert(OP_FIELD.to_string(), Value::String(op.code().to_string()));
    // Absent timestamps are left out of the row, explicit nulls are kept.
    if let Some(ts) = payload.get("ts_ms") {
        record.insert(TS_FIELD.to_string(), ts.clone());
    }
    if let Some(ts) = source.get("ts_ms") {
        record.insert(SOURCE_TS_FIELD.to_string(), ts.clone());
    }

    Ok(record)
}

/// Copy of the row image for `op`; empty unless the image is an object.
fn row_image(payload: &Value, op: Operation) -> OutputRecord {
    match payload.get(op.row_field()) {
        Some(Value::Object(columns)) => columns.clone(),
        _ => Map::new(),
    }
}

/// Envelope presence check: null, false, zero and "" count as absent.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
