//! DispatchClient - サービスの呼び出しをキュー投入に変える公開入口
//!
//! # 二層構造
//! - **表層**: `dispatch_service!` が生成するサービス trait（`Notifier::notify` など）
//! - **内部**: `Invoke<S>`（メソッド名 + 引数 → Task → 投入 or バッチ）
//!
//! 生成されたサービス trait は `Invoke<S>` を実装する型すべてに実装されるので、
//! `DispatchClient<S>`（常に即時投入）と `ContextClient<'_, S>`
//! （コンテキストがバッチ中ならバッチへ）の両方がそのまま使える。

use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::builder::DispatchClientBuilder;
use super::context::CallContext;
use super::submitter::QueueSubmitter;
use super::task_builder::TaskBuilder;
use crate::domain::{DispatchConfig, DispatchError, Task};
use crate::typed::{PayloadCodec, Service, ServiceDescriptor};

/// Invoke は「メソッド名 + 引数 1 個」を受け取ってタスクを 1 個ディスパッチする
///
/// 成功時の値は常に `()`。リモート側の戻り値は存在しない。
#[allow(async_fn_in_trait)]
pub trait Invoke<S: Service> {
    async fn invoke<A: Serialize + ?Sized>(
        &self,
        method: &'static str,
        argument: &A,
    ) -> Result<(), DispatchError>;
}

pub(crate) struct ClientInner {
    pub(crate) descriptor: Arc<ServiceDescriptor>,
    pub(crate) config: DispatchConfig,
    pub(crate) codec: PayloadCodec,
    pub(crate) submitter: QueueSubmitter,
}

/// Client whose service methods enqueue tasks instead of running anything.
///
/// Immutable after `build()` and cheap to clone; safe to share across threads.
pub struct DispatchClient<S: Service> {
    inner: Arc<ClientInner>,
    _service: PhantomData<fn() -> S>,
}

impl<S: Service> DispatchClient<S> {
    pub(crate) fn from_inner(inner: ClientInner) -> Self {
        Self {
            inner: Arc::new(inner),
            _service: PhantomData,
        }
    }

    pub fn builder() -> DispatchClientBuilder<S> {
        DispatchClientBuilder::new()
    }

    /// Client with the default configuration.
    pub fn create(submitter: QueueSubmitter) -> Result<Self, DispatchError> {
        Ok(Self::builder().build(submitter)?)
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.inner.config
    }

    pub fn descriptor(&self) -> &ServiceDescriptor {
        &self.inner.descriptor
    }

    pub fn queue_name(&self) -> &str {
        &self.inner.config.queue_name
    }

    /// Binds this client to `cx` so calls join its active batch.
    pub fn within<'c>(&'c self, cx: &'c CallContext) -> ContextClient<'c, S> {
        ContextClient { client: self, cx }
    }

    /// Resolves `method`, checks the argument type and builds its task.
    pub fn build_task<A: Serialize + ?Sized>(
        &self,
        method: &str,
        argument: &A,
    ) -> Result<Task, DispatchError> {
        let descriptor = &self.inner.descriptor;
        let signature = descriptor
            .method(method)
            .ok_or_else(|| DispatchError::UnknownMethod {
                service: descriptor.name().to_string(),
                method: method.to_string(),
            })?;

        let actual = type_name::<A>();
        if let Some(expected) = signature.argument_type()
            && expected != actual
        {
            return Err(DispatchError::ArgumentType {
                service: descriptor.name().to_string(),
                method: method.to_string(),
                expected,
                actual,
            });
        }

        let task = TaskBuilder::new(descriptor.name(), &self.inner.config, self.inner.codec)
            .build(method, argument)?;
        debug!(
            service = descriptor.name(),
            method,
            queue = %self.inner.config.queue_name,
            trace_id = %task.trace_id(),
            "built task"
        );
        Ok(task)
    }

    async fn submit_now(&self, task: Task) -> Result<(), DispatchError> {
        let inner = &self.inner;
        inner
            .submitter
            .submit(&inner.config.queue_name, vec![task])
            .await?;
        Ok(())
    }
}

impl<S: Service> Clone for DispatchClient<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _service: PhantomData,
        }
    }
}

impl<S: Service> std::fmt::Debug for DispatchClient<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchClient")
            .field("service", &self.inner.descriptor.name())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl<S: Service> Invoke<S> for DispatchClient<S> {
    async fn invoke<A: Serialize + ?Sized>(
        &self,
        method: &'static str,
        argument: &A,
    ) -> Result<(), DispatchError> {
        let task = self.build_task(method, argument)?;
        self.submit_now(task).await
    }
}

/// A client bound to a `CallContext`.
pub struct ContextClient<'c, S: Service> {
    client: &'c DispatchClient<S>,
    cx: &'c CallContext,
}

impl<S: Service> Invoke<S> for ContextClient<'_, S> {
    async fn invoke<A: Serialize + ?Sized>(
        &self,
        method: &'static str,
        argument: &A,
    ) -> Result<(), DispatchError> {
        let task = self.client.build_task(method, argument)?;
        let inner = &self.client.inner;
        match self.cx.try_append(&inner.config.queue_name, &inner.submitter, task) {
            Ok(()) => Ok(()),
            Err(task) => self.client.submit_now(task).await,
        }
    }
}
