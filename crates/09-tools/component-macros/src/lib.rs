//! # Component Macros
//!
//! 为 Lorn 容器的组件生成 `di_abstractions::Component` 实现。
//!
//! ## 字段属性
//!
//! - `#[inject]` - 按字段类型注入默认实现
//! - `#[inject("name")]` - 按组件标识注入
//! - `#[inject("name,optional")]` - 可选注入，找不到时保持默认值
//! - `#[inject("config,key=default")]` - 绑定配置值
//!
//! 字段类型为 `Late<T>` 时作为延迟绑定处理，可用于打破依赖环。
//!
//! ## 结构体属性
//!
//! `#[component(init, active, provider)]` 声明组件实现了哪些生命周期 trait。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use di_abstractions::{Component, Inject};
//!
//! #[derive(Component, Default)]
//! #[component(active)]
//! pub struct Server {
//!     #[inject]
//!     cache: Inject<dyn Cache>,
//!     #[inject("config,server.port=8080")]
//!     port: u16,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod component;
mod utils;

/// 组件派生宏
///
/// 生成 `dependencies`、`inject`、`inject_late` 以及声明过的 `as_*` 方法。
/// 标签格式错误或配置标签缺少键时在编译期报错。
#[proc_macro_derive(Component, attributes(inject, component))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    component::expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
