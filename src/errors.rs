use thiserror::Error;

/// 应用级错误，聚合容器、装饰与配置错误
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),
    #[error("Decoration error: {0}")]
    Decoration(#[from] DecorationError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// 依赖注入容器错误
#[derive(Debug, Error)]
pub enum ContainerError {
    /// 服务未注册
    #[error("Service '{type_name}' is not registered")]
    ServiceNotRegistered { type_name: &'static str },

    /// 循环依赖检测 - 包含完整的解析链
    #[error("Circular dependency detected: {}", chain.join(" -> "))]
    CircularDependency { chain: Vec<&'static str> },

    /// 类型转换失败
    #[error("Type cast failed: expected '{expected}' in {context}")]
    TypeCastFailed {
        expected: &'static str,
        context: String,
    },

    /// 作用域服务在根容器中解析（开启作用域校验时）
    #[error("Scoped service '{type_name}' cannot be resolved from the root provider")]
    ScopeRequired { type_name: &'static str },

    /// 服务创建失败
    #[error("Failed to create service '{service_type}': {reason}")]
    CreationFailed {
        service_type: &'static str,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ContainerError {
    /// 以底层错误构造创建失败错误
    pub fn creation_failed<E>(service_type: &'static str, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::CreationFailed {
            service_type,
            reason: error.to_string(),
            source: Some(Box::new(error)),
        }
    }
}

/// 服务装饰错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecorationError {
    #[error("Type '{type_name}' not found in services")]
    NotRegistered { type_name: &'static str },

    #[error("Type '{type_name}' has {count} registrations, decoration requires exactly one")]
    AmbiguousRegistration { type_name: &'static str, count: usize },

    #[error("Type '{type_name}' is registered as its own implementation and has no abstraction to decorate")]
    MissingAbstraction { type_name: &'static str },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
}
