//! Domain model (IDs, work items, worker state, errors).

pub mod errors;
pub mod ids;
pub mod state;
pub mod work;

pub use self::errors::{BuildError, ErrorKind, FanoutError};
pub use self::ids::{BatchId, WorkerId};
pub use self::state::WorkerState;
pub use self::work::{ItemFailure, WorkItem, WorkResult};
