//! Dispatch configuration (queue, task options, headers, host).
//!
//! Every field has a default, so a partial JSON document is enough.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use super::{ConfigError, HOST_HEADER, Headers, RetryPolicy};

pub const DEFAULT_QUEUE: &str = "default";

/// Provider-level options every task starts from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskOptions {
    /// Delay relative to enqueue time.
    pub countdown: Option<Duration>,

    /// Absolute earliest execution time.
    pub eta: Option<DateTime<Utc>>,

    /// Headers carried by the options themselves. Lowest precedence.
    pub headers: Headers,

    pub retry: RetryPolicy,
}

impl TaskOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn countdown(mut self, countdown: Duration) -> Self {
        self.countdown = Some(countdown);
        self
    }

    pub fn eta(mut self, eta: DateTime<Utc>) -> Self {
        self.eta = Some(eta);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Immutable configuration captured by a dispatch client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub queue_name: String,
    pub options: TaskOptions,

    /// Static headers applied to every task. Highest precedence.
    pub extra_headers: BTreeMap<String, String>,

    /// Routes tasks to a specific deployment via the `Host` header.
    pub host: Option<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_name: DEFAULT_QUEUE.to_string(),
            options: TaskOptions::default(),
            extra_headers: BTreeMap::new(),
            host: None,
        }
    }
}

impl DispatchConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_queue_name(&self.queue_name) {
            return Err(ConfigError::InvalidQueueName(self.queue_name.clone()));
        }
        if self.options.countdown.is_some() && self.options.eta.is_some() {
            return Err(ConfigError::ConflictingSchedule);
        }
        if let Some(host) = self.host.as_deref() {
            if host.trim().is_empty() {
                return Err(ConfigError::EmptyHost);
            }
            validate_header(HOST_HEADER, host)?;
        }
        let option_headers = self.options.headers.iter();
        let extra_headers = self.extra_headers.iter().map(|(n, v)| (n.as_str(), v.as_str()));
        for (name, value) in option_headers.chain(extra_headers) {
            validate_header(name, value)?;
        }
        // BTreeMap keys are case-sensitive, header names are not
        let mut names: Vec<&str> = self.extra_headers.keys().map(String::as_str).collect();
        names.sort_by_key(|n| n.to_ascii_lowercase());
        if let Some(pair) = names.windows(2).find(|w| w[0].eq_ignore_ascii_case(w[1])) {
            return Err(ConfigError::DuplicateHeader(pair[1].to_string()));
        }
        Ok(())
    }

    /// Sets a static header, replacing any entry whose name differs only by case.
    pub fn set_extra_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.extra_headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        self.extra_headers.insert(name, value.into());
    }
}

/// Provider queue names: 1-100 characters of `[A-Za-z0-9-]`.
fn is_valid_queue_name(name: &str) -> bool {
    (1..=100).contains(&name.len()) && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

fn validate_header(name: &str, value: &str) -> Result<(), ConfigError> {
    // RFC 7230 token characters
    let is_tchar = |b: u8| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b);
    if name.is_empty() || !name.bytes().all(is_tchar) {
        return Err(ConfigError::InvalidHeaderName(name.to_string()));
    }
    if value.contains(['\r', '\n']) {
        return Err(ConfigError::InvalidHeaderValue(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_config_is_valid() {
        let config = DispatchConfig::default();
        assert_eq!(config.queue_name, "default");
        assert!(config.options.retry.is_provider_default());
        assert!(config.host.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let json = r#"
        {
          "queue_name": "mail",
          "options": { "retry": "no_retries" },
          "extra_headers": { "X-Tenant": "acme" }
        }"#;
        let config = DispatchConfig::from_json(json).expect("deserialize");
        assert_eq!(config.queue_name, "mail");
        assert_eq!(config.options.retry, RetryPolicy::NoRetries);
        assert_eq!(config.extra_headers.get("X-Tenant").map(String::as_str), Some("acme"));
        assert_eq!(config.options.countdown, None);
        assert_eq!(config.host, None);
    }

    #[test]
    fn empty_json_is_default() {
        let config = DispatchConfig::from_json("{}").expect("deserialize");
        assert_eq!(config, DispatchConfig::default());
    }

    #[rstest]
    #[case::empty("")]
    #[case::underscore("mail_queue")]
    #[case::space("mail queue")]
    #[case::too_long("qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqq")]
    fn invalid_queue_names_are_rejected(#[case] name: &str) {
        let config = DispatchConfig {
            queue_name: name.to_string(),
            ..DispatchConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidQueueName(name.to_string()))
        );
    }

    #[rstest]
    #[case::empty("", ConfigError::InvalidHeaderName(String::new()))]
    #[case::colon("X:Bad", ConfigError::InvalidHeaderName("X:Bad".to_string()))]
    #[case::space("X Bad", ConfigError::InvalidHeaderName("X Bad".to_string()))]
    fn invalid_header_names_are_rejected(#[case] name: &str, #[case] expected: ConfigError) {
        let mut config = DispatchConfig::default();
        config.extra_headers.insert(name.to_string(), "v".to_string());
        assert_eq!(config.validate(), Err(expected));
    }

    #[test]
    fn header_value_with_newline_is_rejected() {
        let config = DispatchConfig {
            options: TaskOptions::new().header("X-Note", "a\r\nInjected: 1"),
            ..DispatchConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidHeaderValue("X-Note".to_string()))
        );
    }

    #[test]
    fn countdown_and_eta_conflict() {
        let config = DispatchConfig {
            options: TaskOptions::new()
                .countdown(Duration::from_secs(5))
                .eta(Utc::now()),
            ..DispatchConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ConflictingSchedule));
    }

    #[test]
    fn blank_host_is_rejected() {
        let config = DispatchConfig {
            host: Some("  ".to_string()),
            ..DispatchConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyHost));
    }

    #[rstest]
    #[case::crlf("worker\r\nX-Injected: 1")]
    #[case::lf("worker\nX-Injected: 1")]
    #[case::cr("worker\r")]
    fn host_with_line_break_is_rejected(#[case] host: &str) {
        let config = DispatchConfig {
            host: Some(host.to_string()),
            ..DispatchConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidHeaderValue(HOST_HEADER.to_string()))
        );
    }

    #[test]
    fn case_variant_extra_headers_from_json_are_rejected() {
        let json = r#"{ "extra_headers": { "x-tenant": "first", "X-Tenant": "second" } }"#;
        let config = DispatchConfig::from_json(json).expect("deserialize");
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateHeader(_))));
    }

    #[test]
    fn set_extra_header_replaces_case_variants() {
        let mut config = DispatchConfig::default();
        config.set_extra_header("x-tenant", "first");
        config.set_extra_header("X-Tenant", "second");
        assert_eq!(config.extra_headers.len(), 1);
        assert_eq!(config.extra_headers["X-Tenant"], "second");
        assert!(config.validate().is_ok());
    }
}
