//! 依赖注入容器
//!
//! 注册表（`ServiceCollection`）、注册描述（`ServiceDescriptor`）与
//! 按生命周期解析服务的 `ServiceProvider`。

pub mod collection;
pub mod descriptor;
pub mod key;
pub mod provider;

pub use collection::ServiceCollection;
pub use descriptor::{
    AnyArc, ImplementationType, Implements, Injectable, ServiceDescriptor, ServiceFactory,
    ServiceImplementation,
};
pub use key::ServiceKey;
pub use provider::{ProviderStats, Resolver, ServiceProvider, ServiceScope};

// 生命周期枚举放在容器模块层级，供各子模块通过 `super::ServiceLifetime` 引用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceLifetime {
    /// Single instance for the entire provider lifetime
    Singleton,
    /// New instance per resolve
    Transient,
    /// Per-scope instance (shared within one scope)
    Scoped,
}
