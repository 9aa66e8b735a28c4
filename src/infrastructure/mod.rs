//! 基础设施层
//!
//! 提供：
//! - 依赖注入容器（注册表、注册描述、解析器）
//! - 服务装饰

// 容器实现
pub mod container;
pub mod decoration;

// 重新导出API
pub use container::{ServiceCollection, ServiceLifetime, ServiceProvider};
pub use decoration::{decorate, decorate_with, DecorateExt, ServiceDecorator};
