//! QueueSubmitter - タスク列を上限付きのチャンクに分けて投入する
//!
//! # 部分失敗の扱い
//! チャンクは順番に投入し、最初に失敗したところで打ち切る。
//! それより前のチャンクは投入済み（取り消せない）なので、
//! SubmissionError に「何チャンク・何件入ったか」を載せて返す。
//! 投入自体のリトライはしない（実行後のリトライはプロバイダの責務）。

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{SubmissionError, Task};
use crate::ports::{MAX_TASKS_PER_CALL, QueueProvider};

/// Shared handle to a queue provider. Cheap to clone.
#[derive(Clone)]
pub struct QueueSubmitter {
    provider: Arc<dyn QueueProvider>,
}

impl QueueSubmitter {
    pub fn new(provider: Arc<dyn QueueProvider>) -> Self {
        Self { provider }
    }

    /// True when both handles point at the same provider instance.
    pub fn same_provider(&self, other: &QueueSubmitter) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.provider), Arc::as_ptr(&other.provider))
    }

    /// Submits `tasks` to `queue` in order, at most `MAX_TASKS_PER_CALL` per call.
    ///
    /// An empty list makes no provider call.
    pub async fn submit(&self, queue: &str, tasks: Vec<Task>) -> Result<(), SubmissionError> {
        let total_chunks = tasks.len().div_ceil(MAX_TASKS_PER_CALL);
        let mut remaining = tasks.into_iter();
        let mut committed_tasks = 0;

        for index in 0..total_chunks {
            let chunk: Vec<Task> = remaining.by_ref().take(MAX_TASKS_PER_CALL).collect();
            let len = chunk.len();
            debug!(queue, chunk = index, tasks = len, "submitting chunk");

            if let Err(source) = self.provider.enqueue_batch(queue, chunk).await {
                warn!(
                    queue,
                    chunk = index,
                    total_chunks,
                    committed_tasks,
                    error = %source,
                    "chunk rejected; remaining chunks not submitted"
                );
                return Err(SubmissionError {
                    queue: queue.to_string(),
                    committed_chunks: index,
                    committed_tasks,
                    failed_chunk: index,
                    total_chunks,
                    completed_queues: Vec::new(),
                    source,
                });
            }
            committed_tasks += len;
        }
        Ok(())
    }
}

impl fmt::Debug for QueueSubmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueSubmitter")
            .field("provider", &Arc::as_ptr(&self.provider))
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::app::TaskBuilder;
    use crate::domain::DispatchConfig;
    use crate::impls::{InMemoryQueueProvider, Submission};
    use crate::ports::ProviderError;
    use crate::typed::PayloadCodec;
    use async_trait::async_trait;
    use rstest::rstest;
    use std::sync::Mutex;

    pub(crate) fn numbered_tasks(n: usize) -> Vec<Task> {
        let config = DispatchConfig::default();
        let builder = TaskBuilder::new("Counter", &config, PayloadCodec::Json);
        (0..n).map(|i| builder.build("count", &i).unwrap()).collect()
    }

    /// Accepts calls until `fail_at`, then rejects every call.
    pub(crate) struct FlakyProvider {
        fail_at: usize,
        pub(crate) calls: Mutex<Vec<usize>>,
    }

    impl FlakyProvider {
        pub(crate) fn failing_at(fail_at: usize) -> Self {
            Self {
                fail_at,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl QueueProvider for FlakyProvider {
        async fn enqueue_batch(&self, _queue: &str, tasks: Vec<Task>) -> Result<(), ProviderError> {
            let mut calls = self.calls.lock().unwrap();
            if calls.len() >= self.fail_at {
                return Err(ProviderError::Unavailable("injected".to_string()));
            }
            calls.push(tasks.len());
            Ok(())
        }
    }

    #[rstest]
    #[case::empty(0, vec![])]
    #[case::single(1, vec![1])]
    #[case::exactly_full(100, vec![100])]
    #[case::one_over(101, vec![100, 1])]
    #[case::several(250, vec![100, 100, 50])]
    #[tokio::test]
    async fn splits_into_provider_sized_chunks(#[case] n: usize, #[case] expected: Vec<usize>) {
        let provider = Arc::new(InMemoryQueueProvider::new());
        let submitter = QueueSubmitter::new(provider.clone());
        let tasks = numbered_tasks(n);

        submitter.submit("default", tasks.clone()).await.unwrap();

        let sizes: Vec<usize> = provider.submissions().iter().map(|s| s.tasks).collect();
        assert_eq!(sizes, expected);
        // 順序がチャンクをまたいで保たれること
        assert_eq!(provider.drain("default"), tasks);
    }

    #[tokio::test]
    async fn stops_at_first_failed_chunk() {
        let provider = Arc::new(FlakyProvider::failing_at(1));
        let submitter = QueueSubmitter::new(provider.clone());

        let err = submitter
            .submit("default", numbered_tasks(250))
            .await
            .unwrap_err();

        assert_eq!(err.queue, "default");
        assert_eq!(err.committed_chunks, 1);
        assert_eq!(err.committed_tasks, 100);
        assert_eq!(err.failed_chunk, 1);
        assert_eq!(err.total_chunks, 3);
        assert!(err.is_partial());
        assert_eq!(err.source, ProviderError::Unavailable("injected".to_string()));
        // 3 つ目のチャンクは試みない
        assert_eq!(*provider.calls.lock().unwrap(), vec![100]);
    }

    #[tokio::test]
    async fn failure_on_first_chunk_is_not_partial() {
        let provider = Arc::new(InMemoryQueueProvider::with_queues(&["default"]));
        let submitter = QueueSubmitter::new(provider.clone());

        let err = submitter.submit("mail", numbered_tasks(3)).await.unwrap_err();

        assert_eq!(err.committed_chunks, 0);
        assert!(!err.is_partial());
        assert_eq!(err.source, ProviderError::UnknownQueue("mail".to_string()));
        assert_eq!(provider.submissions(), Vec::<Submission>::new());
    }

    #[test]
    fn same_provider_compares_instances() {
        let provider = Arc::new(InMemoryQueueProvider::new());
        let a = QueueSubmitter::new(provider.clone());
        let b = QueueSubmitter::new(provider);
        let c = QueueSubmitter::new(Arc::new(InMemoryQueueProvider::new()));
        assert!(a.same_provider(&b));
        assert!(!a.same_provider(&c));
    }
}
