//! Debezium change-event flattener.
//!
//! Turns a Debezium envelope (`{"payload": {"op", "before", "after",
//! "source", "ts_ms"}}`) into a flat row for an analytical table sink:
//! the row image plus `_op`, `_ts_ms`, `_source_ts_ms`, and `_deleted`
//! for deletes. Anything that cannot be flattened is answered with `{}`,
//! which downstream consumers drop.

pub mod config;
pub mod flatten;
pub mod op;
pub mod outcome;

use cdcflat_api::config::ConfigValues;
use cdcflat_api::error::PluginError;
use cdcflat_api::transform::RecordTransform;

pub use config::FlattenConfig;
pub use flatten::{flatten_event, DELETED_FIELD, OP_FIELD, SOURCE_TS_FIELD, TS_FIELD};
pub use op::Operation;
pub use outcome::{Outcome, OutputRecord, RejectReason};

/// Stateless flatten transform. Safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct DebeziumFlatten {
    config: FlattenConfig,
}

impl DebeziumFlatten {
    pub fn new(config: FlattenConfig) -> Self {
        Self { config }
    }

    pub fn from_config(values: &ConfigValues) -> Result<Self, PluginError> {
        let config = FlattenConfig::from_config(values).map_err(|e| e.with_context("debezium"))?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &FlattenConfig {
        &self.config
    }

    /// Typed flatten without logging.
    pub fn flatten(&self, raw: &str) -> Outcome {
        flatten_event(raw)
    }

    fn log_rejection(&self, reason: &RejectReason, raw: &str) {
        let input = truncate_chars(raw, self.config.log_input_limit);
        if self.config.log_rejected {
            tracing::warn!(reason = reason.label(), error = %reason, input, "dropping change event");
        } else {
            tracing::debug!(reason = reason.label(), error = %reason, input, "dropping change event");
        }
    }
}

impl RecordTransform for DebeziumFlatten {
    fn name(&self) -> &'static str {
        "debezium-flatten"
    }

    fn transform(&self, raw: &str) -> String {
        let outcome = self.flatten(raw);
        if let Outcome::Rejected(reason) = &outcome {
            self.log_rejection(reason, raw);
        }
        outcome.into_wire()
    }
}

fn truncate_chars(s: &str, limit: u64) -> &str {
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    match s.char_indices().nth(limit) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ---------------------------------------------------------------------------
// FFI exports for dynamic (.so) loading
// ---------------------------------------------------------------------------

cdcflat_api::cf_abi_version_fn!();
cdcflat_api::cf_config_params_fn!(FlattenConfig);
cdcflat_api::cf_create_transform_fn!(DebeziumFlatten);
cdcflat_api::cf_destroy_fn!(cf_destroy_transform, cdcflat_api::transform::RecordTransform);
