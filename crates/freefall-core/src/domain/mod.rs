//! Domain model: status record, deadlines, execution errors and outcomes.
//!
//! Nothing here touches storage or the clock; the runner in `app` owns the
//! state machine and only uses these types to describe it.

pub mod deadline;
pub mod errors;
pub mod ids;
pub mod outcome;
pub mod status;

pub use self::deadline::{Deadline, DeadlineError};
pub use self::errors::{ErrorKind, WorkError};
pub use self::ids::AttemptId;
pub use self::outcome::{Outcome, OutcomeKind, Retry, RetryCause, SkipReason};
pub use self::status::Status;
