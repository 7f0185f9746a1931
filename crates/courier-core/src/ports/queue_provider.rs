//! QueueProvider port - 永続タスクキュー（外部システム）への投入口
//!
//! このクレートが外部キューに求めるのは「名前付きキューへのまとめて投入」だけ。
//! 実行・リトライ・配送はすべてプロバイダ側の責務。
//!
//! # 実装
//! - **InMemoryQueueProvider**: 開発・テスト用（`impls::inmem_queue`）

use async_trait::async_trait;

use crate::domain::Task;

/// Hard provider limit on tasks per `enqueue_batch` call.
pub const MAX_TASKS_PER_CALL: usize = 100;

/// QueueProvider は名前付きキューへタスクを投入する
///
/// # 設計原則
/// - 1 回の呼び出しで最大 `MAX_TASKS_PER_CALL` 件
/// - 成功したら投入済み（取り消し不可）
/// - `Send + Sync` を要求（複数スレッドから共有される）
#[async_trait]
pub trait QueueProvider: Send + Sync {
    async fn enqueue_batch(&self, queue: &str, tasks: Vec<Task>) -> Result<(), ProviderError>;
}

/// ProviderError はプロバイダ側の拒否・障害
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("batch of {len} tasks exceeds the provider limit of {limit}")]
    BatchTooLarge { len: usize, limit: usize },

    #[error("queue '{0}' does not exist")]
    UnknownQueue(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("provider rejected the batch: {0}")]
    Rejected(String),
}
