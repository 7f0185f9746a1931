//! TaskBuilder - 1 回の呼び出しから 1 個の Task を組み立てる
//!
//! # ヘッダーの優先順位（後勝ち）
//! 1. TaskOptions 自身のヘッダー
//! 2. `Accept: text/plain`
//! 3. トレースヘッダー
//! 4. `Host`（設定されていれば）
//! 5. 設定の追加ヘッダー
//!
//! トレース ID 以外は入力だけで決まる。共有可変状態は持たないので
//! 複数スレッドから同時に使ってよい。

use serde::Serialize;

use crate::domain::{
    ACCEPT_HEADER, DispatchConfig, HOST_HEADER, HttpMethod, TRACE_HEADER, Task, TraceId,
};
use crate::typed::{CodecError, PayloadCodec};

pub struct TaskBuilder<'a> {
    service: &'a str,
    config: &'a DispatchConfig,
    codec: PayloadCodec,
}

impl<'a> TaskBuilder<'a> {
    pub fn new(service: &'a str, config: &'a DispatchConfig, codec: PayloadCodec) -> Self {
        Self {
            service,
            config,
            codec,
        }
    }

    /// Builds the task for `service.method(argument)` with a fresh trace id.
    pub fn build<A: Serialize + ?Sized>(
        &self,
        method: &str,
        argument: &A,
    ) -> Result<Task, CodecError> {
        self.build_traced(method, argument, TraceId::random())
    }

    pub fn build_traced<A: Serialize + ?Sized>(
        &self,
        method: &str,
        argument: &A,
        trace_id: TraceId,
    ) -> Result<Task, CodecError> {
        let encoded = self.codec.encode(argument)?;
        let options = &self.config.options;

        let mut headers = options.headers.clone();
        headers.set(ACCEPT_HEADER, "text/plain");
        headers.set(TRACE_HEADER, trace_id.header_value());
        if let Some(host) = &self.config.host {
            headers.set(HOST_HEADER, host.as_str());
        }
        for (name, value) in &self.config.extra_headers {
            headers.set(name.as_str(), value.as_str());
        }

        Ok(Task {
            url: format!("/{}/{}", self.service, method),
            method: HttpMethod::Post,
            headers,
            payload: encoded.bytes,
            content_type: encoded.content_type.to_string(),
            retry: options.retry,
            countdown: options.countdown,
            eta: options.eta,
            trace_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RetryPolicy, TaskOptions};
    use std::collections::HashMap;
    use std::time::Duration;

    #[derive(Serialize)]
    struct Ping {
        id: u32,
    }

    fn is_trace_value(value: &str) -> bool {
        match value.strip_suffix("/0;o=1") {
            Some(hex) => {
                hex.len() == 32 && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
            }
            None => false,
        }
    }

    #[test]
    fn builds_post_task_with_wire_headers() {
        let config = DispatchConfig::default();
        let task = TaskBuilder::new("Notifier", &config, PayloadCodec::Json)
            .build("notify", &Ping { id: 1 })
            .unwrap();

        assert_eq!(task.url(), "/Notifier/notify");
        assert_eq!(task.method(), HttpMethod::Post);
        assert_eq!(task.headers().get("Accept"), Some("text/plain"));
        let trace = task.headers().get(TRACE_HEADER).unwrap();
        assert!(is_trace_value(trace), "bad trace header {trace}");
        assert_eq!(trace, task.trace_id().header_value());
        assert!(!task.headers().contains(HOST_HEADER));
        assert_eq!(task.payload(), br#"{"id":1}"#);
        assert_eq!(task.content_type(), "application/json; charset=utf-8");
        assert_eq!(task.retry(), RetryPolicy::ProviderDefault);
    }

    #[test]
    fn tasks_differ_only_in_trace_id() {
        let config = DispatchConfig::default();
        let builder = TaskBuilder::new("Notifier", &config, PayloadCodec::Json);
        let a = builder.build("notify", &Ping { id: 1 }).unwrap();
        let b = builder.build("notify", &Ping { id: 1 }).unwrap();

        assert_ne!(a.trace_id(), b.trace_id());
        let fixed = TraceId::from_u128(42);
        let a = builder.build_traced("notify", &Ping { id: 1 }, fixed).unwrap();
        let b = builder.build_traced("notify", &Ping { id: 1 }, fixed).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn later_header_sources_win() {
        let config = DispatchConfig {
            options: TaskOptions::new()
                .header("Accept", "application/json")
                .header("X-Origin", "options")
                .header("Host", "from-options"),
            host: Some("worker.example.com".to_string()),
            extra_headers: [
                ("X-Origin".to_string(), "extra".to_string()),
                ("X-Cloud-Trace-Context".to_string(), "pinned".to_string()),
            ]
            .into_iter()
            .collect(),
            ..DispatchConfig::default()
        };
        let task = TaskBuilder::new("Notifier", &config, PayloadCodec::Json)
            .build("notify", &Ping { id: 1 })
            .unwrap();

        let headers = task.headers();
        assert_eq!(headers.get("Accept"), Some("text/plain"));
        assert_eq!(headers.get("Host"), Some("worker.example.com"));
        assert_eq!(headers.get("X-Origin"), Some("extra"));
        assert_eq!(headers.get(TRACE_HEADER), Some("pinned"));
        assert_eq!(headers.len(), 4);
    }

    #[test]
    fn options_are_copied_onto_task() {
        let config = DispatchConfig {
            options: TaskOptions::new()
                .countdown(Duration::from_secs(30))
                .retry(RetryPolicy::NoRetries),
            ..DispatchConfig::default()
        };
        let task = TaskBuilder::new("Notifier", &config, PayloadCodec::Json)
            .build("notify", &Ping { id: 1 })
            .unwrap();

        assert_eq!(task.countdown(), Some(Duration::from_secs(30)));
        assert_eq!(task.eta(), None);
        assert_eq!(task.retry().task_retry_limit(), Some(0));
    }

    #[test]
    fn encoding_failure_is_returned() {
        let config = DispatchConfig::default();
        let mut bad = HashMap::new();
        bad.insert(vec![1u8], 1);
        let result = TaskBuilder::new("Notifier", &config, PayloadCodec::Json).build("notify", &bad);
        assert!(matches!(result, Err(CodecError::Json(_))));
    }
}
