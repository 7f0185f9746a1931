//! App - ディスパッチの組み立て
//!
//! - **builder**: クライアントの構築と起動時検証
//! - **client**: サービス呼び出し → タスク（公開入口）
//! - **task_builder**: 1 呼び出し → 1 タスク
//! - **context**: 呼び出し側が持ち回すバッチ状態
//! - **submitter**: チャンク分割して投入

pub mod builder;
pub mod client;
pub mod context;
pub mod submitter;
pub mod task_builder;

pub use self::builder::DispatchClientBuilder;
pub use self::client::{ContextClient, DispatchClient, Invoke};
pub use self::context::CallContext;
pub use self::submitter::QueueSubmitter;
pub use self::task_builder::TaskBuilder;
