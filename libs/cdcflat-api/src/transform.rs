/// Wire form of a dropped record: an empty JSON object.
pub const DROP_SENTINEL: &str = "{}";

/// Single-record transform hosted by a stream runtime.
///
/// Text in, text out. Implementations are total: every input produces a
/// serialized mapping, and a record that cannot or should not be delivered
/// comes back as [`DROP_SENTINEL`]. The runtime owns batching, retries and
/// delivery; a transform keeps no state between calls and may be shared
/// across threads.
pub trait RecordTransform: Send + Sync {
    /// Short identifier used in host logs.
    fn name(&self) -> &'static str;

    fn transform(&self, raw: &str) -> String;
}

/// `true` when `output` is the drop sentinel.
pub fn is_dropped(output: &str) -> bool {
    output.trim() == DROP_SENTINEL
}
