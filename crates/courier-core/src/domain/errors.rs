//! Errors - エラー型と分類
//!
//! # 分類
//! - **ConfigError**: クライアント構築時（サービス形状・設定値の不正）
//! - **CodecError**: 呼び出し時の引数エンコード失敗（キューには入らない）
//! - **BatchMisuse**: 同じコンテキストでのバッチの入れ子
//! - **SubmissionError**: プロバイダへの投入失敗（どこまで投入済みかを保持）
//!
//! どのエラーも呼び出し元へそのまま返す。内部リトライはしない。

use crate::ports::ProviderError;
use crate::typed::CodecError;

/// Invalid service shape or configuration value, raised by `build()`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("service name must not be empty")]
    EmptyServiceName,

    #[error("service '{0}' declares no methods")]
    NoMethods(String),

    #[error("service '{service}' declares method '{method}' more than once")]
    DuplicateMethod { service: String, method: String },

    #[error("{service}.{method} takes {arity} arguments; queued methods take exactly one")]
    WrongArity {
        service: String,
        method: String,
        arity: usize,
    },

    #[error("{service}.{method} returns {returns}; queued methods must return unit")]
    NonUnitReturn {
        service: String,
        method: String,
        returns: String,
    },

    #[error("invalid queue name '{0}' (expected 1-100 of [A-Za-z0-9-])")]
    InvalidQueueName(String),

    #[error("invalid header name '{0}'")]
    InvalidHeaderName(String),

    #[error("header '{0}' has a value containing CR or LF")]
    InvalidHeaderValue(String),

    #[error("header '{0}' is set more than once with different letter case")]
    DuplicateHeader(String),

    #[error("host override must not be empty")]
    EmptyHost,

    #[error("countdown and eta are mutually exclusive")]
    ConflictingSchedule,
}

/// A chunk was rejected by the provider.
///
/// Submission stops at the first failed chunk. Chunks `0..committed_chunks`
/// of `queue` are durably queued and cannot be withdrawn; nothing after the
/// failed chunk was attempted.
#[derive(Debug, thiserror::Error)]
#[error(
    "submitting to queue '{queue}' failed at chunk {failed_chunk} of {total_chunks} \
     ({committed_tasks} tasks already queued)"
)]
pub struct SubmissionError {
    pub queue: String,
    pub committed_chunks: usize,
    pub committed_tasks: usize,
    pub failed_chunk: usize,
    pub total_chunks: usize,
    /// Queues fully submitted earlier in the same batch commit.
    pub completed_queues: Vec<String>,
    #[source]
    pub source: ProviderError,
}

impl SubmissionError {
    /// True when at least one task reached the provider before the failure.
    pub fn is_partial(&self) -> bool {
        self.committed_tasks > 0 || !self.completed_queues.is_empty()
    }
}

/// DispatchError はディスパッチ呼び出しの失敗
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("encoding argument failed: {0}")]
    Encoding(#[from] CodecError),

    #[error("service '{service}' has no queued method '{method}'")]
    UnknownMethod { service: String, method: String },

    #[error("{service}.{method} expects {expected}, got {actual}")]
    ArgumentType {
        service: String,
        method: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("already in a batch")]
    BatchMisuse,

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_error_reports_progress() {
        let err = SubmissionError {
            queue: "mail".to_string(),
            committed_chunks: 2,
            committed_tasks: 200,
            failed_chunk: 2,
            total_chunks: 3,
            completed_queues: vec![],
            source: ProviderError::Unavailable("down".to_string()),
        };
        assert!(err.is_partial());
        let msg = err.to_string();
        assert!(msg.contains("'mail'"));
        assert!(msg.contains("chunk 2 of 3"));
        assert!(msg.contains("200 tasks"));
    }

    #[test]
    fn config_error_converts_into_dispatch_error() {
        let err: DispatchError = ConfigError::EmptyHost.into();
        assert!(matches!(err, DispatchError::Config(ConfigError::EmptyHost)));
        assert_eq!(err.to_string(), "host override must not be empty");
    }
}
