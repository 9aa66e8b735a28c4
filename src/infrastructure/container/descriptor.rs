//! 服务注册描述
//!
//! 一条注册把服务键映射到三种实现形态之一：
//! - 类型注册：按需构造具体类型（`Injectable`），再上转为服务类型
//! - 工厂注册：每次创建时调用工厂，工厂可访问解析器
//! - 实例注册：预先构建好的实例，重复使用
//!
//! 类型擦除后的值（`AnyArc`）内部始终保存 `Arc<S>`，`S` 为描述中的服务类型，
//! 因此 `dyn Trait` 形式的服务也能往返于擦除形态。

use super::key::ServiceKey;
use super::provider::Resolver;
use super::ServiceLifetime;
use crate::errors::ContainerError;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 类型擦除的服务实例
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// 类型擦除的服务工厂
pub type ServiceFactory = Arc<dyn Fn(&Resolver) -> Result<AnyArc, ContainerError> + Send + Sync>;

type Caster = Arc<dyn Fn(AnyArc) -> Result<AnyArc, ContainerError> + Send + Sync>;

/// 可由容器构造的具体类型
pub trait Injectable: Sized + Send + Sync + 'static {
    /// 从解析器中取出依赖并构造实例
    fn inject(resolver: &Resolver) -> Result<Self, ContainerError>;
}

/// 具体类型到服务类型的上转
///
/// 每个类型自动实现 `Implements<Self>`；trait 对象服务用 [`implements!`](crate::implements) 声明。
pub trait Implements<S: ?Sized + Send + Sync + 'static>: Send + Sync + 'static {
    fn upcast(self: Arc<Self>) -> Arc<S>;
}

impl<T: Send + Sync + 'static> Implements<T> for T {
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// 声明具体类型实现了一个或多个 trait 对象服务
///
/// ```ignore
/// implements!(HelloMessageProvider => dyn MessageProvider);
/// ```
#[macro_export]
macro_rules! implements {
    ($implementation:ty => $($service:ty),+ $(,)?) => {
        $(
            impl $crate::Implements<$service> for $implementation {
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$service> {
                    self
                }
            }
        )+
    };
}

pub(crate) fn erase<S: ?Sized + Send + Sync + 'static>(value: Arc<S>) -> AnyArc {
    Arc::new(value)
}

pub(crate) fn unerase<S: ?Sized + Send + Sync + 'static>(
    value: &AnyArc,
    context: &str,
) -> Result<Arc<S>, ContainerError> {
    value
        .downcast_ref::<Arc<S>>()
        .cloned()
        .ok_or_else(|| ContainerError::TypeCastFailed {
            expected: std::any::type_name::<S>(),
            context: context.to_string(),
        })
}

/// 类型注册的实现信息
#[derive(Clone)]
pub struct ImplementationType {
    /// 具体类型的键
    key: ServiceKey,
    /// 构造具体类型，产出擦除后的 `Arc<I>`
    activate: ServiceFactory,
    /// 擦除后的 `Arc<I>` 上转为擦除后的 `Arc<S>`
    upcast: Caster,
}

impl ImplementationType {
    pub fn of<S, I>() -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable + Implements<S>,
    {
        Self {
            key: ServiceKey::of::<I>(),
            activate: Arc::new(|resolver: &Resolver| {
                I::inject(resolver).map(|value| erase(Arc::new(value)))
            }),
            upcast: Arc::new(|value: AnyArc| {
                let concrete = unerase::<I>(&value, "implementation up-cast")?;
                Ok(erase(<I as Implements<S>>::upcast(concrete)))
            }),
        }
    }

    /// 具体类型的键
    pub fn key(&self) -> ServiceKey {
        self.key
    }

    /// 以具体类型自身作为服务类型的副本
    pub(crate) fn unabstracted(&self) -> Self {
        Self {
            key: self.key,
            activate: Arc::clone(&self.activate),
            upcast: Arc::new(|value: AnyArc| Ok(value)),
        }
    }

    pub(crate) fn activate(&self, resolver: &Resolver) -> Result<AnyArc, ContainerError> {
        let concrete = (self.activate)(resolver)?;
        self.upcast(concrete)
    }

    pub(crate) fn upcast(&self, concrete: AnyArc) -> Result<AnyArc, ContainerError> {
        (self.upcast)(concrete)
    }
}

impl fmt::Debug for ImplementationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ImplementationType").field(&self.key).finish()
    }
}

/// 注册的三种形态
#[derive(Clone)]
pub enum ServiceImplementation {
    Type(ImplementationType),
    Factory(ServiceFactory),
    Instance(AnyArc),
}

impl ServiceImplementation {
    /// 形态名称（用于日志）
    pub fn shape(&self) -> &'static str {
        match self {
            ServiceImplementation::Type(_) => "type",
            ServiceImplementation::Factory(_) => "factory",
            ServiceImplementation::Instance(_) => "instance",
        }
    }
}

impl fmt::Debug for ServiceImplementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceImplementation::Type(implementation) => implementation.fmt(f),
            ServiceImplementation::Factory(_) => f.write_str("Factory(..)"),
            ServiceImplementation::Instance(_) => f.write_str("Instance(..)"),
        }
    }
}

/// 服务注册信息
#[derive(Clone, Debug)]
pub struct ServiceDescriptor {
    key: ServiceKey,
    lifetime: ServiceLifetime,
    implementation: ServiceImplementation,
}

impl ServiceDescriptor {
    pub fn new(
        key: ServiceKey,
        lifetime: ServiceLifetime,
        implementation: ServiceImplementation,
    ) -> Self {
        Self {
            key,
            lifetime,
            implementation,
        }
    }

    /// 类型注册：服务 `S` 由具体类型 `I` 实现
    pub fn from_type<S, I>(lifetime: ServiceLifetime) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable + Implements<S>,
    {
        Self::new(
            ServiceKey::of::<S>(),
            lifetime,
            ServiceImplementation::Type(ImplementationType::of::<S, I>()),
        )
    }

    /// 工厂注册
    pub fn from_factory<S, F>(lifetime: ServiceLifetime, factory: F) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver) -> Result<Arc<S>, ContainerError> + Send + Sync + 'static,
    {
        let factory: ServiceFactory =
            Arc::new(move |resolver: &Resolver| factory(resolver).map(erase::<S>));
        Self::new(
            ServiceKey::of::<S>(),
            lifetime,
            ServiceImplementation::Factory(factory),
        )
    }

    /// 实例注册，始终为单例
    pub fn from_instance<S>(instance: Arc<S>) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        Self::new(
            ServiceKey::of::<S>(),
            ServiceLifetime::Singleton,
            ServiceImplementation::Instance(erase(instance)),
        )
    }

    pub fn key(&self) -> ServiceKey {
        self.key
    }

    pub fn lifetime(&self) -> ServiceLifetime {
        self.lifetime
    }

    pub fn implementation(&self) -> &ServiceImplementation {
        &self.implementation
    }

    /// 类型注册的具体类型键；工厂与实例注册没有声明的实现类型
    pub fn implementation_key(&self) -> Option<ServiceKey> {
        match &self.implementation {
            ServiceImplementation::Type(implementation) => Some(implementation.key()),
            ServiceImplementation::Factory(_) | ServiceImplementation::Instance(_) => None,
        }
    }
}
