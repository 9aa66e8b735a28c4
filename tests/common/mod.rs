//! 集成测试共用的服务

#![allow(dead_code)]

use service_decoration::{implements, ContainerError, Injectable, Resolver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 测试用的服务trait
pub trait MessageProvider: Send + Sync {
    fn message(&self) -> String;
}

/// 基础实现，默认问候语为 "Hello"
#[derive(Debug)]
pub struct HelloMessageProvider {
    greeting: String,
}

impl HelloMessageProvider {
    pub fn new() -> Self {
        Self::with_greeting("Hello")
    }

    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        Self {
            greeting: greeting.into(),
        }
    }
}

impl Default for HelloMessageProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageProvider for HelloMessageProvider {
    fn message(&self) -> String {
        self.greeting.clone()
    }
}

impl Injectable for HelloMessageProvider {
    fn inject(_resolver: &Resolver) -> Result<Self, ContainerError> {
        Ok(Self::new())
    }
}

implements!(HelloMessageProvider => dyn MessageProvider);

/// 在消息前加上 "Decorated: "
pub struct MessageProviderDecorator {
    inner: Arc<dyn MessageProvider>,
}

impl MessageProviderDecorator {
    pub fn wrap(inner: Arc<dyn MessageProvider>) -> Arc<dyn MessageProvider> {
        Arc::new(Self { inner })
    }
}

impl MessageProvider for MessageProviderDecorator {
    fn message(&self) -> String {
        format!("Decorated: {}", self.inner.message())
    }
}

/// 带额外前缀依赖的装饰器
pub struct MessageProviderDecoratorExtraDependencies {
    inner: Arc<dyn MessageProvider>,
    extra: String,
}

impl MessageProviderDecoratorExtraDependencies {
    pub fn wrap(inner: Arc<dyn MessageProvider>, extra: impl Into<String>) -> Arc<dyn MessageProvider> {
        Arc::new(Self {
            inner,
            extra: extra.into(),
        })
    }
}

impl MessageProvider for MessageProviderDecoratorExtraDependencies {
    fn message(&self) -> String {
        format!("{}{}", self.extra, self.inner.message())
    }
}

/// 由容器注入的前缀
#[derive(Debug)]
pub struct ExtraText {
    pub value: String,
}

impl Injectable for ExtraText {
    fn inject(_resolver: &Resolver) -> Result<Self, ContainerError> {
        Ok(Self {
            value: "Extra injected: ".to_string(),
        })
    }
}

/// 依赖 `dyn MessageProvider` 的消费者
#[derive(Debug)]
pub struct Message {
    pub content: String,
}

impl Injectable for Message {
    fn inject(resolver: &Resolver) -> Result<Self, ContainerError> {
        let provider = resolver.resolve::<dyn MessageProvider>()?;
        Ok(Self {
            content: provider.message(),
        })
    }
}

/// 依赖具体类型 `HelloMessageProvider` 的消费者
#[derive(Debug)]
pub struct Letter {
    pub content: String,
}

impl Injectable for Letter {
    fn inject(resolver: &Resolver) -> Result<Self, ContainerError> {
        let provider = resolver.resolve::<HelloMessageProvider>()?;
        Ok(Self {
            content: provider.message(),
        })
    }
}

/// 统计调用次数的计数器
#[derive(Debug, Default, Clone)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn hit(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
