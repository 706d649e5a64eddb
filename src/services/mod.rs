pub mod backoff;
pub mod failure_ledger;
pub mod template;

pub use backoff::{BackoffPolicy, Delay};
pub use failure_ledger::{FailureLedger, FailureRecord};
pub use template::{render, NAME_PLACEHOLDER};
