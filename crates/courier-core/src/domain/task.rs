//! Task: one queued unit of work, as handed to the queue provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::{RetryPolicy, TraceId};

pub const ACCEPT_HEADER: &str = "Accept";
pub const TRACE_HEADER: &str = "X-Cloud-Trace-Context";
pub const HOST_HEADER: &str = "Host";

/// HTTP method used to deliver the task. Only POST is ever produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

/// Ordered header list.
///
/// Names compare case-insensitively. `set` replaces an existing entry and
/// moves it to the end, so a later assignment always wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.0.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.0.push((name, value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.set(name, value);
        }
        headers
    }
}

/// One serialized call, ready for the provider.
///
/// Built by `TaskBuilder`, never mutated afterwards. Ownership moves into
/// either the active batch or the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub(crate) url: String,
    pub(crate) method: HttpMethod,
    pub(crate) headers: Headers,
    pub(crate) payload: Vec<u8>,
    pub(crate) content_type: String,
    pub(crate) retry: RetryPolicy,
    pub(crate) countdown: Option<Duration>,
    pub(crate) eta: Option<DateTime<Utc>>,
    pub(crate) trace_id: TraceId,
}

impl Task {
    /// `/<Service>/<method>`
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Delay relative to enqueue time.
    pub fn countdown(&self) -> Option<Duration> {
        self.countdown
    }

    /// Absolute earliest execution time.
    pub fn eta(&self) -> Option<DateTime<Utc>> {
        self.eta
    }

    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }
}
