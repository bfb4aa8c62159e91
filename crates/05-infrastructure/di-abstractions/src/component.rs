//! 组件定义

use crate::provider::Provider;
use crate::request::{DependencyRequest, Injected};
use infrastructure_common::{Active, DependencyResult, Initialize};

/// 容器管理的组件
///
/// 组件先以普通值注册，由容器按 [`dependencies`](Component::dependencies) 声明的请求逐个注入字段，
/// 随后冻结为共享实例。生命周期行为通过 `as_*` 方法暴露：
///
/// - [`as_initialize`](Component::as_initialize) - 引导阶段的初始化钩子
/// - [`as_active`](Component::as_active) - 启动/停止钩子
/// - [`as_provider`](Component::as_provider) - 按需构造值的提供者
///
/// 通常由 `#[derive(Component)]` 生成。
pub trait Component: Send + Sync + 'static {
    /// 声明依赖请求
    fn dependencies(&self) -> DependencyResult<Vec<DependencyRequest>> {
        Ok(Vec::new())
    }

    /// 常规注入，在组件冻结前调用
    fn inject(&mut self, value: Injected) -> DependencyResult<()> {
        Err(value.unexpected())
    }

    /// 延迟绑定注入，在所有组件冻结后调用
    fn inject_late(&self, value: Injected) -> DependencyResult<()> {
        Err(value.unexpected())
    }

    fn as_initialize(&self) -> Option<&dyn Initialize> {
        None
    }

    fn as_active(&self) -> Option<&dyn Active> {
        None
    }

    fn as_provider(&self) -> Option<&dyn Provider> {
        None
    }
}

impl Component for infrastructure_common::TracingLogger {}

impl Component for infrastructure_common::DefaultTracer {}
