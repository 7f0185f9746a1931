//! InMemoryQueueProvider - 開発用のタスクキュー
//!
//! # 学習ポイント
//! - Mutex + Condvar による blocking pop
//! - Async での blocking 処理の扱い（spawn_blocking）
//! - キュー名ごとに複数キューを管理

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::domain::Task;
use crate::ports::{MAX_TASKS_PER_CALL, ProviderError, QueueProvider};

/// One accepted `enqueue_batch` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub queue: String,
    pub tasks: usize,
}

#[derive(Default)]
struct State {
    queues: HashMap<String, VecDeque<Task>>,
    submissions: Vec<Submission>,
}

/// InMemoryQueueProvider は開発用のキュー
///
/// # 実装詳細
/// - HashMap<String, VecDeque<Task>> でキュー名ごとに管理
/// - Mutex で排他制御、Condvar で投入時に待機側へ通知
/// - `with_queues` で作ると、知らないキュー名への投入を拒否する
///
/// # 使用例
/// ```ignore
/// let provider = Arc::new(InMemoryQueueProvider::new());
/// provider.enqueue_batch("default", tasks).await?;
/// let task = provider.pop("default", Duration::from_secs(5)).await?;
/// ```
pub struct InMemoryQueueProvider {
    state: Arc<Mutex<State>>,
    condvar: Arc<Condvar>,
    known_queues: Option<HashSet<String>>,
}

impl InMemoryQueueProvider {
    /// Accepts any queue name.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            condvar: Arc::new(Condvar::new()),
            known_queues: None,
        }
    }

    /// Accepts only the listed queue names.
    pub fn with_queues(names: &[&str]) -> Self {
        Self {
            known_queues: Some(names.iter().map(|n| n.to_string()).collect()),
            ..Self::new()
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accepted calls, in order.
    pub fn submissions(&self) -> Vec<Submission> {
        self.lock().submissions.clone()
    }

    pub fn len(&self, queue: &str) -> usize {
        self.lock().queues.get(queue).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self, queue: &str) -> bool {
        self.len(queue) == 0
    }

    /// Removes and returns every task queued on `queue`, oldest first.
    pub fn drain(&self, queue: &str) -> Vec<Task> {
        self.lock()
            .queues
            .get_mut(queue)
            .map(|q| q.drain(..).collect())
            .unwrap_or_default()
    }

    /// Waits up to `timeout` for a task on `queue`. `Ok(None)` means the wait timed out.
    pub async fn pop(&self, queue: &str, timeout: Duration) -> Result<Option<Task>, ProviderError> {
        let state = self.state.clone();
        let condvar = self.condvar.clone();
        let queue = queue.to_string();

        tokio::task::spawn_blocking(move || {
            let start = Instant::now();
            let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
            loop {
                if let Some(task) = guard.queues.get_mut(&queue).and_then(VecDeque::pop_front) {
                    return Some(task);
                }
                let elapsed = start.elapsed();
                if elapsed >= timeout {
                    return None;
                }
                let (next, _) = condvar
                    .wait_timeout(guard, timeout - elapsed)
                    .unwrap_or_else(PoisonError::into_inner);
                guard = next;
            }
        })
        .await
        .map_err(pop_failed)
    }
}

fn pop_failed(err: tokio::task::JoinError) -> ProviderError {
    ProviderError::Unavailable(format!("pop failed: {err}"))
}

impl Default for InMemoryQueueProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueProvider for InMemoryQueueProvider {
    async fn enqueue_batch(&self, queue: &str, tasks: Vec<Task>) -> Result<(), ProviderError> {
        if tasks.len() > MAX_TASKS_PER_CALL {
            return Err(ProviderError::BatchTooLarge {
                len: tasks.len(),
                limit: MAX_TASKS_PER_CALL,
            });
        }
        if let Some(known) = &self.known_queues
            && !known.contains(queue)
        {
            return Err(ProviderError::UnknownQueue(queue.to_string()));
        }

        let mut state = self.lock();
        state.submissions.push(Submission {
            queue: queue.to_string(),
            tasks: tasks.len(),
        });
        state.queues.entry(queue.to_string()).or_default().extend(tasks);
        drop(state);

        // 待機中のスレッドに通知
        self.condvar.notify_all();
        Ok(())
    }
}
