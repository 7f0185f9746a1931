//! Retry policy attached to each queued task.

use serde::{Deserialize, Serialize};

/// How often the queue provider may re-run a task after it fails downstream.
///
/// This crate never retries anything itself; the policy is only carried on
/// the task so the provider can apply it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Whatever the target queue is configured with.
    #[default]
    ProviderDefault,

    /// Run at most once (provider retry limit = 0).
    NoRetries,

    /// Explicit task retry limit.
    Limit(u32),
}

impl RetryPolicy {
    /// Task retry limit to hand to the provider, `None` meaning "use the queue's default".
    pub fn task_retry_limit(&self) -> Option<u32> {
        match self {
            RetryPolicy::ProviderDefault => None,
            RetryPolicy::NoRetries => Some(0),
            RetryPolicy::Limit(n) => Some(*n),
        }
    }

    pub fn is_provider_default(&self) -> bool {
        matches!(self, RetryPolicy::ProviderDefault)
    }
}
