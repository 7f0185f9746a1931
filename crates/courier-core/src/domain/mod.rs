//! Domain model (IDs, tasks, retry policy, configuration, errors).

pub mod config;
pub mod errors;
pub mod ids;
pub mod retry;
pub mod task;

pub use self::config::{DEFAULT_QUEUE, DispatchConfig, TaskOptions};
pub use self::errors::{ConfigError, DispatchError, SubmissionError};
pub use self::ids::{BatchId, InvalidTraceId, TraceId};
pub use self::retry::RetryPolicy;
pub use self::task::{ACCEPT_HEADER, HOST_HEADER, Headers, HttpMethod, TRACE_HEADER, Task};
