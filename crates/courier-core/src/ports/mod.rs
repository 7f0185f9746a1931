//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」。外部の永続キューへの
//! インターフェースだけを定義し、実装の詳細は `impls` に置く。

pub mod queue_provider;

pub use self::queue_provider::{MAX_TASKS_PER_CALL, ProviderError, QueueProvider};
