//! # 基础设施组合层
//!
//! 把配置源、组件容器与默认协作者组合成一个可运行的应用。
//!
//! ## 主要功能
//!
//! - **应用构建器**: 使用构建者模式注册组件、加载器和配置源
//! - **默认协作者**: 未提供时自动注册 `Logger`、`Tracer` 与配置源
//! - **生命周期管理**: 引导、启动、等待退出信号、按逆序关闭
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use config_impl::ConfigLocation;
//! use infrastructure_composition::{Application, LoggingConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = Application::builder()
//!         .with_name("demo")
//!         .with_config_location(ConfigLocation::from_args())
//!         .with_logging(LoggingConfig::development())
//!         .build()?;
//!
//!     // 启动后等待 Ctrl-C，随后按逆序停止组件
//!     app.run().await?;
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod builder;
pub mod loaders;
pub mod logging;


// 重新导出主要类型
pub use application::{Application, ApplicationStatus};
pub use builder::ApplicationBuilder;
pub use loaders::{ConfigBackend, LOGGER_IDENTITY, TRACER_IDENTITY};
pub use logging::{LogFormat, LoggingConfig};

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;
