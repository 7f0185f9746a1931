//! CallContext - 呼び出し側が持ち回す実行コンテキスト（バッチ状態）
//!
//! # 状態遷移
//! `INACTIVE → ACTIVE → (COMMITTING | ABORTING) → INACTIVE`
//!
//! - ACTIVE の間、このコンテキスト経由の呼び出しは即時投入せずバッチに溜める
//! - body が Ok で終われば、キューごとにまとめて投入（COMMITTING）
//! - body が Err で終われば、溜めたタスクを捨てる（ABORTING）
//! - 入れ子の run_batched は `DispatchError::BatchMisuse`
//!
//! # 学習ポイント
//! - `RefCell` を持つので `!Sync`: コンテキストは 1 つの実行単位に閉じる。
//!   ロックは不要（コンパイラが共有を禁止する）。
//! - Drop ガードで、panic や future の drop でもバッチを必ず破棄する

use std::cell::RefCell;
use std::future::Future;

use tracing::{debug, info};

use super::submitter::QueueSubmitter;
use crate::domain::{BatchId, DispatchError, Task};

/// Tasks waiting for one queue of one provider.
struct PendingQueue {
    queue: String,
    submitter: QueueSubmitter,
    tasks: Vec<Task>,
}

struct PendingBatch {
    id: BatchId,
    /// First-use order.
    queues: Vec<PendingQueue>,
}

impl PendingBatch {
    fn new() -> Self {
        Self {
            id: BatchId::generate(),
            queues: Vec::new(),
        }
    }

    fn push(&mut self, queue: &str, submitter: &QueueSubmitter, task: Task) {
        let existing = self
            .queues
            .iter_mut()
            .find(|p| p.queue == queue && p.submitter.same_provider(submitter));
        match existing {
            Some(pending) => pending.tasks.push(task),
            None => self.queues.push(PendingQueue {
                queue: queue.to_string(),
                submitter: submitter.clone(),
                tasks: vec![task],
            }),
        }
    }

    fn len(&self) -> usize {
        self.queues.iter().map(|p| p.tasks.len()).sum()
    }

    async fn commit(self) -> Result<(), DispatchError> {
        let total = self.len();
        if total == 0 {
            return Ok(());
        }
        info!(batch = %self.id, queues = self.queues.len(), "enqueueing {total} tasks");

        let mut completed_queues = Vec::new();
        for pending in self.queues {
            if let Err(mut err) = pending.submitter.submit(&pending.queue, pending.tasks).await {
                err.completed_queues = completed_queues;
                return Err(err.into());
            }
            completed_queues.push(pending.queue);
        }
        Ok(())
    }
}

/// Execution context threaded through calls that may be batched.
///
/// # 使用例
/// ```ignore
/// let cx = CallContext::new();
/// cx.run_batched(|| async {
///     notifier.within(&cx).notify(ping_a).await?;
///     notifier.within(&cx).notify(ping_b).await?;
///     Ok::<_, DispatchError>(())
/// })
/// .await?;
/// ```
#[derive(Default)]
pub struct CallContext {
    batch: RefCell<Option<PendingBatch>>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_batching(&self) -> bool {
        self.batch.borrow().is_some()
    }

    /// Id of the active batch, if any.
    pub fn batch_id(&self) -> Option<BatchId> {
        self.batch.borrow().as_ref().map(|b| b.id)
    }

    /// Tasks accumulated by the active batch so far.
    pub fn pending_tasks(&self) -> usize {
        self.batch.borrow().as_ref().map_or(0, PendingBatch::len)
    }

    /// Appends `task` to the active batch, or hands it back when no batch is active.
    pub(crate) fn try_append(
        &self,
        queue: &str,
        submitter: &QueueSubmitter,
        task: Task,
    ) -> Result<(), Task> {
        match self.batch.borrow_mut().as_mut() {
            Some(batch) => {
                batch.push(queue, submitter, task);
                Ok(())
            }
            None => Err(task),
        }
    }

    /// Runs `body` with batching enabled on this context.
    ///
    /// Tasks are submitted only if `body` returns `Ok`, one queue at a time in
    /// first-use order. On `Err` nothing is submitted and the error is returned
    /// unchanged.
    ///
    /// # Errors
    /// - `DispatchError::BatchMisuse` if a batch is already active here
    /// - `DispatchError::Submission` if the commit fails
    pub async fn run_batched<F, Fut, T, E>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<DispatchError>,
    {
        if self.is_batching() {
            return Err(DispatchError::BatchMisuse.into());
        }
        *self.batch.borrow_mut() = Some(PendingBatch::new());
        let guard = ActiveBatch { cx: self };

        let outcome = body().await;
        let batch = guard.finish();

        match outcome {
            Ok(value) => {
                if let Some(batch) = batch {
                    batch.commit().await?;
                }
                Ok(value)
            }
            Err(err) => {
                if let Some(batch) = batch {
                    debug!(batch = %batch.id, discarded = batch.len(), "batch body failed; nothing enqueued");
                }
                Err(err)
            }
        }
    }
}

/// Clears the batch when the scope ends, however it ends.
struct ActiveBatch<'a> {
    cx: &'a CallContext,
}

impl ActiveBatch<'_> {
    fn finish(self) -> Option<PendingBatch> {
        self.cx.batch.borrow_mut().take()
    }
}

impl Drop for ActiveBatch<'_> {
    fn drop(&mut self) {
        self.cx.batch.borrow_mut().take();
    }
}
