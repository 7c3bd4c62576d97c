//! Job state machine.
//!
//! The process runs at most one job at a time. Its state lives in a single
//! [`JobState`] slot that the running job updates and that clients poll:
//!
//! ```text
//! idle ──submit──▶ processing ──▶ completed
//!                      │      └──▶ failed
//!                      ▲
//!   completed/failed ──┘ (next submit resets the slot)
//! ```

mod context;
mod error;
mod state;
mod types;

pub use context::JobContext;
pub use error::{JobError, SubmitError};
pub use state::JobState;
pub use types::{JobSnapshot, JobStatus, LatencyLog};
