//! courier-core
//!
//! Turns calls on a typed service interface into durably-queued,
//! fire-and-forget tasks.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（Task, Headers, RetryPolicy, DispatchConfig, ids, errors）
//! - **ports**: 抽象化レイヤー（QueueProvider）
//! - **typed**: 型付きサービス API（Service trait, MethodRegistry, PayloadCodec, `dispatch_service!`）
//! - **app**: ディスパッチ本体（DispatchClient, TaskBuilder, CallContext, QueueSubmitter）
//! - **impls**: 実装（InMemoryQueueProvider など開発用）
//!
//! # 流れ
//! `DispatchClient::builder().build()` → サービス trait のメソッド呼び出し →
//! `TaskBuilder` で Task を作る → コンテキストがバッチ中ならバッチへ、
//! そうでなければ `QueueSubmitter` で即時投入。

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod typed;

pub use app::{CallContext, ContextClient, DispatchClient, DispatchClientBuilder, Invoke, QueueSubmitter};
pub use domain::{DispatchConfig, DispatchError, RetryPolicy, Task, TaskOptions};
pub use ports::QueueProvider;
pub use typed::{PayloadCodec, Service};
