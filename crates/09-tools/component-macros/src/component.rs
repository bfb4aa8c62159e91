//! `#[derive(Component)]` 实现

use crate::utils::{config_tag_has_key, field_kind, inject_tag, FieldKind};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{punctuated::Punctuated, Data, DeriveInput, Fields, Ident, LitStr, Meta, Result, Token, Type};

/// 结构体级参数 `#[component(init, active, provider)]`
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ComponentArgs {
    /// 实现了 `Initialize`
    pub init: bool,
    /// 实现了 `Active`
    pub active: bool,
    /// 实现了 `Provider`
    pub provider: bool,
}

impl ComponentArgs {
    fn from_input(input: &DeriveInput) -> Result<Self> {
        let mut args = ComponentArgs::default();
        for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("component")) {
            let parsed = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
            for meta in parsed {
                let Meta::Path(path) = &meta else {
                    return Err(syn::Error::new_spanned(meta, "组件参数只接受 init、active、provider"));
                };
                if path.is_ident("init") {
                    args.init = true;
                } else if path.is_ident("active") {
                    args.active = true;
                } else if path.is_ident("provider") {
                    args.provider = true;
                } else {
                    return Err(syn::Error::new_spanned(path, "未知的组件参数, 可选值: init、active、provider"));
                }
            }
        }
        Ok(args)
    }
}

/// 一个带 `#[inject]` 的字段
struct InjectField {
    ident: Ident,
    ty: Type,
    tag: LitStr,
    kind: FieldKind,
}

fn inject_fields(input: &DeriveInput) -> Result<Vec<InjectField>> {
    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Component 只能派生在结构体上",
            ))
        }
    };

    let named = match fields {
        Fields::Named(named) => &named.named,
        Fields::Unit => return Ok(Vec::new()),
        Fields::Unnamed(unnamed) => {
            return match unnamed.unnamed.iter().find_map(|f| inject_tag(f).transpose()) {
                Some(_) => Err(syn::Error::new_spanned(unnamed, "注入字段必须具名")),
                None => Ok(Vec::new()),
            }
        }
    };

    let mut result = Vec::new();
    for field in named {
        let Some(tag) = inject_tag(field)? else {
            continue;
        };
        let kind = field_kind(&field.ty, &tag.value());
        if kind == FieldKind::Config && !config_tag_has_key(&tag.value()) {
            return Err(syn::Error::new_spanned(&tag, "配置标签缺少配置键, 应写作 \"config,key\""));
        }
        // Fields::Named 保证存在字段名
        if let Some(ident) = field.ident.clone() {
            result.push(InjectField {
                ident,
                ty: field.ty.clone(),
                tag,
                kind,
            });
        }
    }
    Ok(result)
}

/// 生成 `Component` 实现
pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let args = ComponentArgs::from_input(&input)?;
    let fields = inject_fields(&input)?;

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let dependencies = expand_dependencies(&fields);
    let inject = expand_inject(&fields);
    let inject_late = expand_inject_late(&fields);
    let hooks = expand_hooks(&args);

    Ok(quote! {
        impl #impl_generics ::di_abstractions::Component for #name #ty_generics #where_clause {
            #dependencies
            #inject
            #inject_late
            #hooks
        }
    })
}

fn expand_dependencies(fields: &[InjectField]) -> TokenStream {
    if fields.is_empty() {
        return TokenStream::new();
    }
    let requests = fields.iter().map(|field| {
        let slot = field.ident.to_string();
        let ty = &field.ty;
        let tag = &field.tag;
        match field.kind {
            FieldKind::Config => quote! {
                ::di_abstractions::DependencyRequest::config::<#ty>(#slot, #tag)?
            },
            FieldKind::Component | FieldKind::Late => quote! {
                ::di_abstractions::DependencyRequest::component::<#ty>(#slot, #tag)?
            },
        }
    });
    quote! {
        fn dependencies(&self) -> ::di_abstractions::DependencyResult<::std::vec::Vec<::di_abstractions::DependencyRequest>> {
            ::std::result::Result::Ok(::std::vec![#(#requests),*])
        }
    }
}

fn expand_inject(fields: &[InjectField]) -> TokenStream {
    let arms: Vec<_> = fields
        .iter()
        .filter(|field| field.kind != FieldKind::Late)
        .map(|field| {
            let ident = &field.ident;
            let slot = ident.to_string();
            quote! { #slot => self.#ident = value.take()?, }
        })
        .collect();
    if arms.is_empty() {
        return TokenStream::new();
    }
    quote! {
        fn inject(&mut self, value: ::di_abstractions::Injected) -> ::di_abstractions::DependencyResult<()> {
            let slot = value.slot().to_owned();
            match slot.as_str() {
                #(#arms)*
                _ => return ::std::result::Result::Err(value.unexpected()),
            }
            ::std::result::Result::Ok(())
        }
    }
}

fn expand_inject_late(fields: &[InjectField]) -> TokenStream {
    let arms: Vec<_> = fields
        .iter()
        .filter(|field| field.kind == FieldKind::Late)
        .map(|field| {
            let ident = &field.ident;
            let slot = ident.to_string();
            quote! { #slot => self.#ident.fill(value), }
        })
        .collect();
    if arms.is_empty() {
        return TokenStream::new();
    }
    quote! {
        fn inject_late(&self, value: ::di_abstractions::Injected) -> ::di_abstractions::DependencyResult<()> {
            let slot = value.slot().to_owned();
            match slot.as_str() {
                #(#arms)*
                _ => ::std::result::Result::Err(value.unexpected()),
            }
        }
    }
}

fn expand_hooks(args: &ComponentArgs) -> TokenStream {
    let mut hooks = TokenStream::new();
    if args.init {
        hooks.extend(quote! {
            fn as_initialize(&self) -> ::std::option::Option<&dyn ::di_abstractions::Initialize> {
                ::std::option::Option::Some(self)
            }
        });
    }
    if args.active {
        hooks.extend(quote! {
            fn as_active(&self) -> ::std::option::Option<&dyn ::di_abstractions::Active> {
                ::std::option::Option::Some(self)
            }
        });
    }
    if args.provider {
        hooks.extend(quote! {
            fn as_provider(&self) -> ::std::option::Option<&dyn ::di_abstractions::Provider> {
                ::std::option::Option::Some(self)
            }
        });
    }
    hooks
}
