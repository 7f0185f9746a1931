//! Service trait - キューで呼び出せるサービスインターフェースの定義
//!
//! # 学習ポイント
//! - Associated Constants (`const NAME`)
//! - `std::any::type_name` による引数型の記録
//! - 起動時検証（Fail-fast）: 形が不正なサービスは build 時に弾く
//!
//! 通常は `dispatch_service!` マクロが `Service` を実装するので、
//! 手書きするのは特殊なケースだけ。

use std::any::type_name;

use crate::domain::ConfigError;

/// Service は URL の先頭セグメントと、キュー可能なメソッド一覧を対応付ける
///
/// # 使用例
/// ```ignore
/// enum NotifierService {}
///
/// impl Service for NotifierService {
///     const NAME: &'static str = "Notifier";
///
///     fn methods() -> Vec<MethodSignature> {
///         vec![MethodSignature::new("notify").param::<Ping>()]
///     }
/// }
/// ```
pub trait Service: Send + Sync + 'static {
    /// `/<NAME>/<method>` の `<NAME>` 部分
    const NAME: &'static str;

    fn methods() -> Vec<MethodSignature>;
}

/// Declared shape of one service method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    name: &'static str,
    params: Vec<&'static str>,
    returns: Option<&'static str>,
}

impl MethodSignature {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            params: Vec::new(),
            returns: None,
        }
    }

    /// Appends a parameter of type `T`.
    pub fn param<T: ?Sized>(mut self) -> Self {
        self.params.push(type_name::<T>());
        self
    }

    /// Declares the return type. `()` keeps the method eligible.
    pub fn returns<T: ?Sized>(mut self) -> Self {
        let name = type_name::<T>();
        self.returns = (name != "()").then_some(name);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn params(&self) -> &[&'static str] {
        &self.params
    }

    /// Type name of the single argument, if the method has exactly one.
    pub fn argument_type(&self) -> Option<&'static str> {
        match self.params.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub fn returns_unit(&self) -> bool {
        self.returns.is_none()
    }
}

/// Validated method table of one service. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    name: &'static str,
    methods: Vec<MethodSignature>,
}

impl ServiceDescriptor {
    pub fn of<S: Service>() -> Result<Self, ConfigError> {
        Self::new(S::NAME, S::methods())
    }

    /// Every method must take exactly one argument and return unit.
    pub fn new(name: &'static str, methods: Vec<MethodSignature>) -> Result<Self, ConfigError> {
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyServiceName);
        }
        if methods.is_empty() {
            return Err(ConfigError::NoMethods(name.to_string()));
        }
        for (i, method) in methods.iter().enumerate() {
            if methods[..i].iter().any(|m| m.name == method.name) {
                return Err(ConfigError::DuplicateMethod {
                    service: name.to_string(),
                    method: method.name.to_string(),
                });
            }
            if method.params.len() != 1 {
                return Err(ConfigError::WrongArity {
                    service: name.to_string(),
                    method: method.name.to_string(),
                    arity: method.params.len(),
                });
            }
            if let Some(returns) = method.returns {
                return Err(ConfigError::NonUnitReturn {
                    service: name.to_string(),
                    method: method.name.to_string(),
                    returns: returns.to_string(),
                });
            }
        }
        Ok(Self { name, methods })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn method(&self, name: &str) -> Option<&MethodSignature> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn methods(&self) -> &[MethodSignature] {
        &self.methods
    }
}
