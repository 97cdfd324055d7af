use cdcflat_api::transform::DROP_SENTINEL;
use serde_json::{Map, Value};

/// Flattened row: business columns followed by the injected CDC metadata.
pub type OutputRecord = Map<String, Value>;

/// Why a change event was dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("not valid JSON: {0}")]
    Malformed(String),

    #[error("envelope has no payload")]
    MissingPayload,

    #[error("payload has no op")]
    MissingOp,

    #[error("unrecognized op {0}")]
    UnknownOp(String),

    #[error("payload has no source")]
    MissingSource,
}

impl RejectReason {
    /// Stable label for log fields and run statistics.
    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::Malformed(_) => "malformed",
            RejectReason::MissingPayload => "missing_payload",
            RejectReason::MissingOp => "missing_op",
            RejectReason::UnknownOp(_) => "unknown_op",
            RejectReason::MissingSource => "missing_source",
        }
    }
}

/// Result of flattening one change event.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Accepted(OutputRecord),
    Rejected(RejectReason),
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted(_))
    }

    pub fn record(&self) -> Option<&OutputRecord> {
        match self {
            Outcome::Accepted(record) => Some(record),
            Outcome::Rejected(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&RejectReason> {
        match self {
            Outcome::Accepted(_) => None,
            Outcome::Rejected(reason) => Some(reason),
        }
    }

    /// Serialize for the sink. Rejections become the empty mapping.
    pub fn into_wire(self) -> String {
        match self {
            Outcome::Accepted(record) => serde_json::to_string(&Value::Object(record))
                .unwrap_or_else(|_| DROP_SENTINEL.to_string()),
            Outcome::Rejected(_) => DROP_SENTINEL.to_string(),
        }
    }
}

impl From<Result<OutputRecord, RejectReason>> for Outcome {
    fn from(result: Result<OutputRecord, RejectReason>) -> Self {
        match result {
            Ok(record) => Outcome::Accepted(record),
            Err(reason) => Outcome::Rejected(reason),
        }
    }
}
