//! Typed - 型付きサービス API
//!
//! メソッド名の typo や引数の数の誤りを型と起動時検証で排除します。
//!
//! # 構成
//! - **service**: `Service` trait とメソッドシグネチャ
//! - **registry**: 検証済み記述子のキャッシュ
//! - **codec**: 引数 → (bytes, content-type)
//! - **macros**: `dispatch_service!`（サービス trait とアダプタの生成）

pub mod codec;
mod macros;
pub mod registry;
pub mod service;

pub use self::codec::{CodecError, EncodedPayload, PayloadCodec};
pub use self::registry::MethodRegistry;
pub use self::service::{MethodSignature, Service, ServiceDescriptor};
