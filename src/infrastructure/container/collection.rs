//! 服务注册表

use super::descriptor::{Implements, Injectable, ServiceDescriptor};
use super::key::ServiceKey;
use super::provider::{Resolver, ServiceProvider};
use super::ServiceLifetime;
use crate::config::ProviderOptions;
use crate::errors::ContainerError;
use std::sync::Arc;

/// 可变的服务注册列表
///
/// 同一服务键允许多条注册，构建容器时以最后一条为准。
#[derive(Clone, Debug, Default)]
pub struct ServiceCollection {
    descriptors: Vec<ServiceDescriptor>,
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一条注册
    pub fn register(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        tracing::trace!(
            service = descriptor.key().type_name(),
            shape = descriptor.implementation().shape(),
            lifetime = ?descriptor.lifetime(),
            "Service registered"
        );
        self.descriptors.push(descriptor);
        self
    }

    /// 类型注册：服务 `S` 由具体类型 `I` 实现
    pub fn register_type<S, I>(&mut self, lifetime: ServiceLifetime) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable + Implements<S>,
    {
        self.register(ServiceDescriptor::from_type::<S, I>(lifetime))
    }

    pub fn register_singleton<S, I>(&mut self) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable + Implements<S>,
    {
        self.register_type::<S, I>(ServiceLifetime::Singleton)
    }

    pub fn register_scoped<S, I>(&mut self) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable + Implements<S>,
    {
        self.register_type::<S, I>(ServiceLifetime::Scoped)
    }

    pub fn register_transient<S, I>(&mut self) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable + Implements<S>,
    {
        self.register_type::<S, I>(ServiceLifetime::Transient)
    }

    /// 工厂注册
    pub fn register_factory<S, F>(&mut self, lifetime: ServiceLifetime, factory: F) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver) -> Result<Arc<S>, ContainerError> + Send + Sync + 'static,
    {
        self.register(ServiceDescriptor::from_factory::<S, F>(lifetime, factory))
    }

    /// 实例注册（单例）
    pub fn register_instance<S>(&mut self, instance: Arc<S>) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.register(ServiceDescriptor::from_instance(instance))
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ServiceDescriptor> {
        self.descriptors.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ServiceDescriptor> {
        self.descriptors.get(index)
    }

    /// 服务键对应的所有注册位置
    pub fn positions_of(&self, key: ServiceKey) -> Vec<usize> {
        self.descriptors
            .iter()
            .enumerate()
            .filter(|(_, descriptor)| descriptor.key() == key)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn count_of(&self, key: ServiceKey) -> usize {
        self.descriptors
            .iter()
            .filter(|descriptor| descriptor.key() == key)
            .count()
    }

    pub fn contains<S: ?Sized + 'static>(&self) -> bool {
        self.count_of(ServiceKey::of::<S>()) > 0
    }

    /// 原地替换一条注册，返回被替换的注册；越界时返回 `None` 且不做修改
    pub fn replace(&mut self, index: usize, descriptor: ServiceDescriptor) -> Option<ServiceDescriptor> {
        let slot = self.descriptors.get_mut(index)?;
        Some(std::mem::replace(slot, descriptor))
    }

    /// 移除服务 `S` 的所有注册，返回移除数量
    pub fn remove_all<S: ?Sized + 'static>(&mut self) -> usize {
        let key = ServiceKey::of::<S>();
        let before = self.descriptors.len();
        self.descriptors.retain(|descriptor| descriptor.key() != key);
        before - self.descriptors.len()
    }

    /// 以默认选项构建容器；注册表保持可用
    pub fn build_provider(&self) -> ServiceProvider {
        self.build_provider_with(ProviderOptions::default())
    }

    pub fn build_provider_with(&self, options: ProviderOptions) -> ServiceProvider {
        ServiceProvider::new(&self.descriptors, options)
    }
}

impl<'a> IntoIterator for &'a ServiceCollection {
    type Item = &'a ServiceDescriptor;
    type IntoIter = std::slice::Iter<'a, ServiceDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}
