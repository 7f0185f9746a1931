//! MethodRegistry - 検証済み ServiceDescriptor のキャッシュ
//!
//! # 学習ポイント
//! - `TypeId` をキーにした型ごとのキャッシュ
//! - `OnceLock` によるプロセス全体で 1 つのインスタンス
//! - Arc による共有所有権（クライアント間で同じ記述子を共有）
//!
//! 記述子はサービス型ごとに 1 回だけ作って検証し、以後は不変。
//! 検証に失敗したサービスはキャッシュしない（毎回同じエラーを返す）。

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use super::service::{Service, ServiceDescriptor};
use crate::domain::ConfigError;

/// MethodRegistry はサービス型 → 記述子 を保持
///
/// # 使用例
/// ```ignore
/// let descriptor = MethodRegistry::global().descriptor::<NotifierService>()?;
/// assert_eq!(descriptor.name(), "Notifier");
/// ```
#[derive(Default)]
pub struct MethodRegistry {
    descriptors: RwLock<HashMap<TypeId, Arc<ServiceDescriptor>>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// プロセス共有のレジストリ
    pub fn global() -> &'static MethodRegistry {
        static GLOBAL: OnceLock<MethodRegistry> = OnceLock::new();
        GLOBAL.get_or_init(MethodRegistry::new)
    }

    /// Returns the cached descriptor of `S`, building and validating it on first use.
    pub fn descriptor<S: Service>(&self) -> Result<Arc<ServiceDescriptor>, ConfigError> {
        let key = TypeId::of::<S>();
        if let Some(found) = self
            .descriptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(found));
        }

        let built = Arc::new(ServiceDescriptor::of::<S>()?);
        let mut descriptors = self
            .descriptors
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // 並行して誰かが先に入れていればそちらを使う
        Ok(Arc::clone(descriptors.entry(key).or_insert(built)))
    }

    pub fn contains<S: Service>(&self) -> bool {
        self.descriptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<S>())
    }

    pub fn len(&self) -> usize {
        self.descriptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
