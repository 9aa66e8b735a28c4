pub mod config;
pub mod errors;
pub mod infrastructure;
pub mod logging;

// Re-export commonly used items for convenience
pub use config::ProviderOptions;
pub use errors::{AppError, ConfigError, ContainerError, DecorationError};
pub use infrastructure::container::{
    AnyArc, ImplementationType, Implements, Injectable, ProviderStats, Resolver, ServiceCollection,
    ServiceDescriptor, ServiceFactory, ServiceImplementation, ServiceKey, ServiceLifetime,
    ServiceProvider, ServiceScope,
};
pub use infrastructure::decoration::{decorate, decorate_with, DecorateExt, ServiceDecorator};
