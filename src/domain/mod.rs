//! Values that flow through a run: request records in, outcomes out.
mod outcome;
mod record;


pub use outcome::{FailureKind, Outcome, TRANSPORT_FAILURE_STATUS};
pub use record::RequestRecord;
