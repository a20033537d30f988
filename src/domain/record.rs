use serde_json::Value;

/// One request payload read from the data source.
///
/// `sequence` is assigned at read time (1-based) and survives the trip
/// through the queue, so outcomes can be put back in read order.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestRecord {
    pub sequence: u64,
    pub payload: Value,
}

impl RequestRecord {
    #[must_use]
    pub const fn new(sequence: u64, payload: Value) -> Self {
        Self { sequence, payload }
    }
}
