//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemoryQueueProvider**: 開発用のタスクキュー
//!
//! 本番用のプロバイダ（クラウドのタスクキューなど）は別クレートに置く想定。

pub mod inmem_queue;

pub use self::inmem_queue::{InMemoryQueueProvider, Submission};
