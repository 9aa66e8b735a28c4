//! 服务装饰（装饰器模式）
//!
//! 用装饰后的注册替换已有注册，保留原有生命周期：
//! - 实例注册：捕获原实例，每次解析时对同一实例应用装饰
//! - 工厂注册：捕获原工厂，先调用原工厂再应用装饰
//! - 类型注册：新的工厂直接构造具体实例后应用装饰；具体类型尚未注册时以自身为键补充注册
//!
//! 同一服务可以多次装饰，按调用顺序逐层包裹。

mod rewrite;

use crate::errors::{ContainerError, DecorationError};
use crate::infrastructure::container::{
    Resolver, ServiceCollection, ServiceDescriptor, ServiceKey,
};
use std::sync::Arc;

/// 装饰服务 `S`
///
/// `S` 必须恰好有一条注册；类型注册时具体类型不能就是 `S` 本身。
/// 校验失败时注册表保持不变。
pub fn decorate<S, F>(registrations: &mut ServiceCollection, decoration: F) -> Result<(), DecorationError>
where
    S: ?Sized + Send + Sync + 'static,
    F: Fn(Arc<S>) -> Arc<S> + Send + Sync + 'static,
{
    decorate_with::<S, _>(registrations, move |subject, _| Ok(decoration(subject)))
}

/// 装饰服务 `S`，装饰函数可通过解析器获取额外依赖
pub fn decorate_with<S, F>(
    registrations: &mut ServiceCollection,
    decoration: F,
) -> Result<(), DecorationError>
where
    S: ?Sized + Send + Sync + 'static,
    F: Fn(Arc<S>, &Resolver) -> Result<Arc<S>, ContainerError> + Send + Sync + 'static,
{
    let key = ServiceKey::of::<S>();
    let (index, original) = locate(registrations, key)?;
    if original.implementation_key() == Some(key) {
        return Err(DecorationError::MissingAbstraction {
            type_name: key.type_name(),
        });
    }

    let shape = original.implementation().shape();
    let lifetime = original.lifetime();
    let rewrite = rewrite::rewrite::<S>(original, Arc::new(decoration));
    // 已有的具体类型注册保持原样
    let concrete = rewrite
        .concrete
        .filter(|concrete| registrations.count_of(concrete.key()) == 0);

    registrations.replace(index, rewrite.decorated);
    if let Some(concrete) = concrete {
        tracing::debug!(
            implementation = concrete.key().type_name(),
            lifetime = ?lifetime,
            "Implementation re-registered under its own type"
        );
        registrations.register(concrete);
    }

    tracing::debug!(
        service = key.type_name(),
        shape,
        lifetime = ?lifetime,
        "Service decorated"
    );
    Ok(())
}

/// 查找唯一的注册
fn locate(
    registrations: &ServiceCollection,
    key: ServiceKey,
) -> Result<(usize, &ServiceDescriptor), DecorationError> {
    let mut matches = registrations
        .iter()
        .enumerate()
        .filter(|(_, descriptor)| descriptor.key() == key);

    match (matches.next(), matches.next()) {
        (Some(found), None) => Ok(found),
        (None, _) => Err(DecorationError::NotRegistered {
            type_name: key.type_name(),
        }),
        (Some(_), Some(_)) => Err(DecorationError::AmbiguousRegistration {
            type_name: key.type_name(),
            count: 2 + matches.count(),
        }),
    }
}

/// 绑定到某个注册表的装饰器
#[derive(Debug)]
pub struct ServiceDecorator<'a> {
    services: &'a mut ServiceCollection,
}

impl<'a> ServiceDecorator<'a> {
    pub fn new(services: &'a mut ServiceCollection) -> Self {
        Self { services }
    }

    pub fn decorate<S, F>(&mut self, decoration: F) -> Result<&mut Self, DecorationError>
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<S>) -> Arc<S> + Send + Sync + 'static,
    {
        decorate::<S, F>(self.services, decoration)?;
        Ok(self)
    }

    pub fn decorate_with<S, F>(&mut self, decoration: F) -> Result<&mut Self, DecorationError>
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<S>, &Resolver) -> Result<Arc<S>, ContainerError> + Send + Sync + 'static,
    {
        decorate_with::<S, F>(self.services, decoration)?;
        Ok(self)
    }
}

/// `ServiceCollection` 上的装饰扩展方法
pub trait DecorateExt {
    fn decorate<S, F>(&mut self, decoration: F) -> Result<&mut Self, DecorationError>
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<S>) -> Arc<S> + Send + Sync + 'static;

    fn decorate_with<S, F>(&mut self, decoration: F) -> Result<&mut Self, DecorationError>
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<S>, &Resolver) -> Result<Arc<S>, ContainerError> + Send + Sync + 'static;
}

impl DecorateExt for ServiceCollection {
    fn decorate<S, F>(&mut self, decoration: F) -> Result<&mut Self, DecorationError>
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<S>) -> Arc<S> + Send + Sync + 'static,
    {
        decorate::<S, F>(self, decoration)?;
        Ok(self)
    }

    fn decorate_with<S, F>(&mut self, decoration: F) -> Result<&mut Self, DecorationError>
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<S>, &Resolver) -> Result<Arc<S>, ContainerError> + Send + Sync + 'static,
    {
        decorate_with::<S, F>(self, decoration)?;
        Ok(self)
    }
}
