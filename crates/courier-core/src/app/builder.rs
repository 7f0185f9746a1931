//! DispatchClientBuilder - クライアントの構築と設定
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）: 不正なサービス形状・設定は build() で弾く
//! - build() は設定をコピーするので、その後ビルダーを変更しても
//!   作成済みのクライアントには影響しない

use std::marker::PhantomData;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::client::{ClientInner, DispatchClient};
use super::submitter::QueueSubmitter;
use crate::domain::{ConfigError, DispatchConfig, RetryPolicy, TaskOptions};
use crate::typed::{MethodRegistry, PayloadCodec, Service};

/// DispatchClientBuilder はサービス `S` 用のクライアントを構築
///
/// # 使用例
/// ```ignore
/// let notifier = DispatchClient::<NotifierService>::builder()
///     .in_queue("notifications")
///     .no_retries()
///     .header("X-Tenant", "acme")
///     .build(QueueSubmitter::new(provider))?;
/// ```
pub struct DispatchClientBuilder<S: Service> {
    config: DispatchConfig,
    codec: PayloadCodec,
    _service: PhantomData<fn() -> S>,
}

impl<S: Service> DispatchClientBuilder<S> {
    pub fn new() -> Self {
        Self::from_config(DispatchConfig::default())
    }

    /// Starts from a loaded configuration (e.g. `DispatchConfig::from_json`).
    pub fn from_config(config: DispatchConfig) -> Self {
        Self {
            config,
            codec: PayloadCodec::default(),
            _service: PhantomData,
        }
    }

    /// Replaces the base task options, retry policy included.
    pub fn with(mut self, options: TaskOptions) -> Self {
        self.config.options = options;
        self
    }

    /// Don't retry the task if it fails.
    pub fn no_retries(self) -> Self {
        self.retry(RetryPolicy::NoRetries)
    }

    pub fn retry_limit(self, limit: u32) -> Self {
        self.retry(RetryPolicy::Limit(limit))
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.options.retry = retry;
        self
    }

    pub fn in_queue(mut self, queue_name: impl Into<String>) -> Self {
        self.config.queue_name = queue_name.into();
        self
    }

    /// Routes every task to `host`.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = Some(host.into());
        self
    }

    /// Adds a static header. A repeated name (in any letter case) keeps the last value.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.set_extra_header(name, value);
        self
    }

    pub fn countdown(mut self, countdown: Duration) -> Self {
        self.config.options.countdown = Some(countdown);
        self
    }

    pub fn eta(mut self, eta: DateTime<Utc>) -> Self {
        self.config.options.eta = Some(eta);
        self
    }

    pub fn codec(mut self, codec: PayloadCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Validates the service shape and the configuration, then builds the client.
    ///
    /// # 検証
    /// - 全メソッドが「引数 1 個・戻り値 unit」であること
    /// - キュー名・ヘッダー・スケジュール設定が正しいこと
    pub fn build(&self, submitter: QueueSubmitter) -> Result<DispatchClient<S>, ConfigError> {
        let descriptor = MethodRegistry::global().descriptor::<S>()?;
        self.config.validate()?;
        Ok(DispatchClient::from_inner(ClientInner {
            descriptor,
            config: self.config.clone(),
            codec: self.codec,
            submitter,
        }))
    }
}

impl<S: Service> Default for DispatchClientBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Service> Clone for DispatchClientBuilder<S> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            codec: self.codec,
            _service: PhantomData,
        }
    }
}
