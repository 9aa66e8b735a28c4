//! 按注册形态重建装饰后的注册

use crate::errors::ContainerError;
use crate::infrastructure::container::descriptor::{erase, unerase};
use crate::infrastructure::container::{
    Resolver, ServiceDescriptor, ServiceFactory, ServiceImplementation,
};
use std::sync::Arc;

/// 重建结果：替换原注册的装饰注册，以及类型注册时新增的具体类型注册
pub(super) struct Rewrite {
    pub decorated: ServiceDescriptor,
    pub concrete: Option<ServiceDescriptor>,
}

pub(super) fn rewrite<S>(
    original: &ServiceDescriptor,
    decoration: Arc<dyn Fn(Arc<S>, &Resolver) -> Result<Arc<S>, ContainerError> + Send + Sync>,
) -> Rewrite
where
    S: ?Sized + Send + Sync + 'static,
{
    let key = original.key();
    let lifetime = original.lifetime();

    let (factory, concrete): (ServiceFactory, Option<ServiceDescriptor>) =
        match original.implementation() {
            ServiceImplementation::Instance(instance) => {
                let instance = instance.clone();
                let factory: ServiceFactory = Arc::new(move |resolver: &Resolver| {
                    let subject = unerase::<S>(&instance, "decorated instance")?;
                    decoration(subject, resolver).map(erase::<S>)
                });
                (factory, None)
            }
            ServiceImplementation::Factory(inner) => {
                let inner = Arc::clone(inner);
                let factory: ServiceFactory = Arc::new(move |resolver: &Resolver| {
                    let produced = inner(resolver)?;
                    let subject = unerase::<S>(&produced, "decorated factory")?;
                    decoration(subject, resolver).map(erase::<S>)
                });
                (factory, None)
            }
            ServiceImplementation::Type(implementation) => {
                let concrete = ServiceDescriptor::new(
                    implementation.key(),
                    lifetime,
                    ServiceImplementation::Type(implementation.unabstracted()),
                );
                let implementation = implementation.clone();
                // 被装饰实例随装饰后的注册一起缓存，不经由具体类型的注册
                let factory: ServiceFactory = Arc::new(move |resolver: &Resolver| {
                    let produced = implementation.activate(resolver)?;
                    let subject = unerase::<S>(&produced, "decorated type")?;
                    decoration(subject, resolver).map(erase::<S>)
                });
                (factory, Some(concrete))
            }
        };

    Rewrite {
        decorated: ServiceDescriptor::new(key, lifetime, ServiceImplementation::Factory(factory)),
        concrete,
    }
}
