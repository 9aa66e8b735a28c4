//! 服务解析
//!
//! `ServiceProvider` 由 `ServiceCollection` 构建，按生命周期解析服务：
//! - 单例缓存在根容器中（DashMap）
//! - 作用域实例缓存在各自的 `ServiceScope` 中
//! - 瞬态服务每次解析都重新创建
//!
//! 创建服务时不持有任何缓存锁，工厂中可以继续解析其他服务；
//! 并发创建同一服务时，以先写入缓存的实例为准。

use super::descriptor::{unerase, AnyArc, ServiceDescriptor, ServiceImplementation};
use super::key::ServiceKey;
use super::ServiceLifetime;
use crate::config::ProviderOptions;
use crate::errors::ContainerError;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// 内部容器统计信息（原子计数器）
#[derive(Default)]
struct InnerStats {
    total_resolutions: AtomicU64,
    singleton_cache_hits: AtomicU64,
    singleton_cache_misses: AtomicU64,
    scoped_creations: AtomicU64,
    transient_creations: AtomicU64,
}

/// 容器统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderStats {
    /// 总解析次数（包含嵌套解析）
    pub total_resolutions: u64,
    pub singleton_cache_hits: u64,
    pub singleton_cache_misses: u64,
    pub scoped_creations: u64,
    pub transient_creations: u64,
}

impl ProviderStats {
    /// 单例缓存命中率（小数形式）
    pub fn hit_rate(&self) -> f64 {
        let total = self.singleton_cache_hits + self.singleton_cache_misses;
        if total == 0 {
            0.0
        } else {
            self.singleton_cache_hits as f64 / total as f64
        }
    }
}

/// 作用域实例缓存
struct ScopeCache {
    id: Uuid,
    is_root: bool,
    instances: Mutex<HashMap<ServiceKey, AnyArc>>,
}

impl ScopeCache {
    fn new(is_root: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            is_root,
            instances: Mutex::new(HashMap::new()),
        }
    }
}

struct ProviderInner {
    /// 每个服务键对应最后一条注册
    registrations: HashMap<ServiceKey, ServiceDescriptor>,
    singletons: DashMap<ServiceKey, AnyArc>,
    root_scope: Arc<ScopeCache>,
    options: ProviderOptions,
    stats: InnerStats,
}

/// 根服务容器
#[derive(Clone)]
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

impl ServiceProvider {
    pub(crate) fn new<'a, I>(descriptors: I, options: ProviderOptions) -> Self
    where
        I: IntoIterator<Item = &'a ServiceDescriptor>,
    {
        let mut registrations = HashMap::new();
        for descriptor in descriptors {
            registrations.insert(descriptor.key(), descriptor.clone());
        }

        tracing::debug!(
            registered_services = registrations.len(),
            validate_scopes = options.validate_scopes,
            detect_cycles = options.detect_cycles,
            "Service provider built"
        );

        Self {
            inner: Arc::new(ProviderInner {
                registrations,
                singletons: DashMap::new(),
                root_scope: Arc::new(ScopeCache::new(true)),
                options,
                stats: InnerStats::default(),
            }),
        }
    }

    /// 根解析器
    pub fn resolver(&self) -> Resolver {
        Resolver::new(Arc::clone(&self.inner), Arc::clone(&self.inner.root_scope))
    }

    /// 解析服务
    pub fn resolve<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<S>, ContainerError> {
        self.resolver().resolve::<S>()
    }

    /// 解析服务，未注册时返回 `None`
    pub fn try_resolve<S: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<S>> {
        self.resolver().try_resolve::<S>()
    }

    /// 检查服务是否已注册
    pub fn is_registered<S: ?Sized + 'static>(&self) -> bool {
        self.inner.registrations.contains_key(&ServiceKey::of::<S>())
    }

    /// 创建新的作用域
    pub fn create_scope(&self) -> ServiceScope {
        let cache = Arc::new(ScopeCache::new(false));
        tracing::trace!(scope_id = %cache.id, "Scope created");
        ServiceScope {
            inner: Arc::clone(&self.inner),
            cache,
        }
    }

    pub fn options(&self) -> &ProviderOptions {
        &self.inner.options
    }

    /// 获取容器统计信息
    pub fn stats(&self) -> ProviderStats {
        let stats = &self.inner.stats;
        ProviderStats {
            total_resolutions: stats.total_resolutions.load(Ordering::Relaxed),
            singleton_cache_hits: stats.singleton_cache_hits.load(Ordering::Relaxed),
            singleton_cache_misses: stats.singleton_cache_misses.load(Ordering::Relaxed),
            scoped_creations: stats.scoped_creations.load(Ordering::Relaxed),
            transient_creations: stats.transient_creations.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("registered_services", &self.inner.registrations.len())
            .field("options", &self.inner.options)
            .finish()
    }
}

/// 服务作用域，作用域服务在同一作用域内共享
pub struct ServiceScope {
    inner: Arc<ProviderInner>,
    cache: Arc<ScopeCache>,
}

impl ServiceScope {
    pub fn id(&self) -> Uuid {
        self.cache.id
    }

    pub fn resolver(&self) -> Resolver {
        Resolver::new(Arc::clone(&self.inner), Arc::clone(&self.cache))
    }

    pub fn resolve<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<S>, ContainerError> {
        self.resolver().resolve::<S>()
    }

    pub fn try_resolve<S: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<S>> {
        self.resolver().try_resolve::<S>()
    }
}

impl Drop for ServiceScope {
    fn drop(&mut self) {
        tracing::trace!(
            scope_id = %self.cache.id,
            instances = self.cache.instances.lock().len(),
            "Scope ended"
        );
    }
}

impl fmt::Debug for ServiceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceScope").field("id", &self.cache.id).finish()
    }
}

/// 单次解析的上下文，传给工厂与装饰函数
///
/// 记录当前解析链，用于循环依赖检测。
pub struct Resolver {
    inner: Arc<ProviderInner>,
    scope: Arc<ScopeCache>,
    chain: RefCell<Vec<ServiceKey>>,
}

impl Resolver {
    fn new(inner: Arc<ProviderInner>, scope: Arc<ScopeCache>) -> Self {
        Self {
            inner,
            scope,
            chain: RefCell::new(Vec::new()),
        }
    }

    pub fn resolve<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<S>, ContainerError> {
        let value = self.resolve_key(ServiceKey::of::<S>())?;
        unerase::<S>(&value, "resolve")
    }

    pub fn try_resolve<S: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<S>> {
        match self.resolve::<S>() {
            Ok(service) => Some(service),
            Err(ContainerError::ServiceNotRegistered { .. }) => None,
            Err(error) => {
                tracing::warn!(
                    service = std::any::type_name::<S>(),
                    error = %error,
                    "Service resolution failed"
                );
                None
            }
        }
    }

    /// 按服务键解析出擦除后的实例
    pub fn resolve_key(&self, key: ServiceKey) -> Result<AnyArc, ContainerError> {
        self.inner
            .stats
            .total_resolutions
            .fetch_add(1, Ordering::Relaxed);

        let descriptor = self
            .inner
            .registrations
            .get(&key)
            .ok_or(ContainerError::ServiceNotRegistered {
                type_name: key.type_name(),
            })?;

        if !self.inner.options.detect_cycles {
            return self.resolve_descriptor(descriptor);
        }

        {
            let mut chain = self.chain.borrow_mut();
            if chain.contains(&key) {
                let mut names: Vec<&'static str> = chain.iter().map(|k| k.type_name()).collect();
                names.push(key.type_name());
                return Err(ContainerError::CircularDependency { chain: names });
            }
            chain.push(key);
        }

        let result = self.resolve_descriptor(descriptor);
        self.chain.borrow_mut().pop();
        result
    }

    fn resolve_descriptor(&self, descriptor: &ServiceDescriptor) -> Result<AnyArc, ContainerError> {
        let key = descriptor.key();
        let stats = &self.inner.stats;

        match descriptor.lifetime() {
            ServiceLifetime::Singleton => {
                if let Some(cached) = self.inner.singletons.get(&key) {
                    stats.singleton_cache_hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(cached.value().clone());
                }
                stats.singleton_cache_misses.fetch_add(1, Ordering::Relaxed);

                let created = self.create(descriptor)?;
                let stored = self.inner.singletons.entry(key).or_insert(created);
                Ok(stored.value().clone())
            }
            ServiceLifetime::Scoped => {
                if self.scope.is_root && self.inner.options.validate_scopes {
                    return Err(ContainerError::ScopeRequired {
                        type_name: key.type_name(),
                    });
                }
                if let Some(cached) = self.scope.instances.lock().get(&key) {
                    return Ok(cached.clone());
                }

                let created = self.create(descriptor)?;
                stats.scoped_creations.fetch_add(1, Ordering::Relaxed);
                let mut instances = self.scope.instances.lock();
                Ok(instances.entry(key).or_insert(created).clone())
            }
            ServiceLifetime::Transient => {
                stats.transient_creations.fetch_add(1, Ordering::Relaxed);
                self.create(descriptor)
            }
        }
    }

    fn create(&self, descriptor: &ServiceDescriptor) -> Result<AnyArc, ContainerError> {
        tracing::trace!(
            service = descriptor.key().type_name(),
            shape = descriptor.implementation().shape(),
            lifetime = ?descriptor.lifetime(),
            scope_id = %self.scope.id,
            "Creating service"
        );

        match descriptor.implementation() {
            ServiceImplementation::Type(implementation) => implementation.activate(self),
            ServiceImplementation::Factory(factory) => factory(self),
            ServiceImplementation::Instance(instance) => Ok(instance.clone()),
        }
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("scope_id", &self.scope.id)
            .field("chain", &self.chain.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::container::ServiceCollection;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug)]
    struct Counter {
        id: usize,
    }

    fn counting_collection(lifetime: ServiceLifetime) -> (ServiceCollection, Arc<AtomicUsize>) {
        let created = Arc::new(AtomicUsize::new(0));
        let created_clone = Arc::clone(&created);
        let mut services = ServiceCollection::new();
        services.register_factory::<Counter, _>(lifetime, move |_| {
            let id = created_clone.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Counter { id }))
        });
        (services, created)
    }

    #[test]
    fn test_singleton_is_created_once() {
        let (services, created) = counting_collection(ServiceLifetime::Singleton);
        let provider = services.build_provider();

        let first = provider.resolve::<Counter>().unwrap();
        let second = provider.resolve::<Counter>().unwrap();
        let from_scope = provider.create_scope().resolve::<Counter>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &from_scope));
        assert_eq!(created.load(Ordering::SeqCst), 1);

        let stats = provider.stats();
        assert_eq!(stats.total_resolutions, 3);
        assert_eq!(stats.singleton_cache_misses, 1);
        assert_eq!(stats.singleton_cache_hits, 2);
    }

    #[test]
    fn test_transient_is_created_every_time() {
        let (services, created) = counting_collection(ServiceLifetime::Transient);
        let provider = services.build_provider();

        let first = provider.resolve::<Counter>().unwrap();
        let second = provider.resolve::<Counter>().unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(created.load(Ordering::SeqCst), 2);
        assert_eq!(provider.stats().transient_creations, 2);
    }

    #[test]
    fn test_scoped_is_shared_within_scope() {
        let (services, created) = counting_collection(ServiceLifetime::Scoped);
        let provider = services.build_provider();

        let scope_a = provider.create_scope();
        let scope_b = provider.create_scope();
        let a1 = scope_a.resolve::<Counter>().unwrap();
        let a2 = scope_a.resolve::<Counter>().unwrap();
        let b1 = scope_b.resolve::<Counter>().unwrap();

        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b1));
        assert_ne!(scope_a.id(), scope_b.id());
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_scoped_from_root() {
        let (services, _) = counting_collection(ServiceLifetime::Scoped);

        let lenient = services.build_provider();
        let first = lenient.resolve::<Counter>().unwrap();
        let second = lenient.resolve::<Counter>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let strict = services.build_provider_with(ProviderOptions::strict());
        assert!(matches!(
            strict.resolve::<Counter>(),
            Err(ContainerError::ScopeRequired { .. })
        ));
        assert!(strict.create_scope().resolve::<Counter>().is_ok());
    }

    #[test]
    fn test_not_registered() {
        let provider = ServiceCollection::new().build_provider();
        assert!(matches!(
            provider.resolve::<Counter>(),
            Err(ContainerError::ServiceNotRegistered { .. })
        ));
        assert!(provider.try_resolve::<Counter>().is_none());
        assert!(!provider.is_registered::<Counter>());
    }

    struct Chicken;
    struct Egg;

    #[test]
    fn test_circular_dependency_is_reported() {
        let mut services = ServiceCollection::new();
        services.register_factory::<Chicken, _>(ServiceLifetime::Transient, |resolver| {
            resolver.resolve::<Egg>()?;
            Ok(Arc::new(Chicken))
        });
        services.register_factory::<Egg, _>(ServiceLifetime::Transient, |resolver| {
            resolver.resolve::<Chicken>()?;
            Ok(Arc::new(Egg))
        });
        let provider = services.build_provider();

        match provider.resolve::<Chicken>() {
            Err(ContainerError::CircularDependency { chain }) => {
                assert_eq!(chain.len(), 3);
                assert_eq!(chain.first(), chain.last());
            }
            other => panic!("expected circular dependency, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_last_registration_wins() {
        let mut services = ServiceCollection::new();
        services.register_instance(Arc::new(String::from("first")));
        services.register_instance(Arc::new(String::from("second")));
        let provider = services.build_provider();

        assert_eq!(provider.resolve::<String>().unwrap().as_str(), "second");
    }
}
