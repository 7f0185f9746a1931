//! Domain identifiers (strongly-typed IDs).
//!
//! # 二種類の ID
//! - **TraceId**: 1 呼び出しごとに生成する 128-bit のランダム値。
//!   下流の相関（トレース）のためだけに使い、このクレートでは意味を持たない。
//! - **BatchId**: バッチ 1 回ごとに振る ULID。ログの相関用。
//!
//! ## Phantom Type パターン
//! `Id<T>` というジェネリック型で共通実装を提供しつつ、
//! `T` はマーカー型としてコンパイル時の型安全性だけを提供します。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ULID ベース ID 型のマーカー trait
///
/// Display で使うプレフィックス（"batch-" など）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型（ULID ベース）
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    /// 現在時刻 + 乱数で新しい ID を生成
    pub fn generate() -> Self {
        Self::from_ulid(Ulid::new())
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Batch のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Batch {}

impl IdMarker for Batch {
    fn prefix() -> &'static str {
        "batch-"
    }
}

/// Identifier of one batching scope (log correlation only).
pub type BatchId = Id<Batch>;

/// Per-call random correlation token.
///
/// Displayed as 32 lowercase hex digits. Uniqueness comes from 128 random
/// bits, not from any clock or counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TraceId(u128);

impl TraceId {
    pub fn random() -> Self {
        Self(rand::random())
    }

    pub fn from_u128(value: u128) -> Self {
        Self(value)
    }

    pub fn as_u128(&self) -> u128 {
        self.0
    }

    /// Value of the trace header: `<32 hex>/0;o=1` (span 0, sampled).
    pub fn header_value(&self) -> String {
        format!("{self}/0;o=1")
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl From<TraceId> for String {
    fn from(id: TraceId) -> Self {
        id.to_string()
    }
}

/// Text that is not exactly 32 lowercase hex digits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid trace id '{0}' (expected 32 lowercase hex digits)")]
pub struct InvalidTraceId(String);

impl TryFrom<String> for TraceId {
    type Error = InvalidTraceId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let is_lower_hex = |b: u8| b.is_ascii_digit() || (b'a'..=b'f').contains(&b);
        if value.len() != 32 || !value.bytes().all(is_lower_hex) {
            return Err(InvalidTraceId(value));
        }
        u128::from_str_radix(&value, 16)
            .map(TraceId)
            .map_err(|_| InvalidTraceId(value))
    }
}
