//! Reflect derive macro implementation

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::Data;
use syn::DataEnum;
use syn::DataStruct;
use syn::DeriveInput;
use syn::Fields;
use syn::Ident;
use syn::Type;
use syn::parse_macro_input;

use crate::attributes::ContainerAttrs;
use crate::attributes::FieldAttrs;
use crate::attributes::doc_comment;

/// Implementation of the Reflect derive macro
pub fn derive_reflect_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Reflect cannot be derived for generic types",
        ));
    }
    let attrs = ContainerAttrs::parse(&input.attrs)?;
    match &input.data {
        Data::Struct(data) => expand_struct(input, &attrs, data),
        Data::Enum(data) => expand_enum(input, &attrs, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &input.ident,
            "Reflect cannot be derived for unions",
        )),
    }
}

/// One reflected struct member
struct Member<'a> {
    ident:       &'a Ident,
    ty:          &'a Type,
    name:        String,
    prop:        bool,
    description: String,
}

/// `Typed::type_name_of` body shared by structs and enums
fn type_name_tokens(input: &DeriveInput, attrs: &ContainerAttrs) -> TokenStream2 {
    let short = input.ident.to_string();
    let namespace = attrs
        .namespace
        .as_ref()
        .map_or_else(|| quote! { ::core::module_path!() }, |ns| quote! { #ns });
    quote! {
        ::reflect_mcp::reflect::TypeName::from(::std::format!("{}::{}", #namespace, #short))
    }
}

fn expand_struct(
    input: &DeriveInput,
    attrs: &ContainerAttrs,
    data: &DataStruct,
) -> syn::Result<TokenStream2> {
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Reflect can only be derived for structs with named fields",
        ));
    };

    let mut members = Vec::new();
    let mut handle_field = None;
    for field in &fields.named {
        let field_attrs = FieldAttrs::parse(&field.attrs)?;
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        if field_attrs.handle {
            if handle_field.replace(ident).is_some() {
                return Err(syn::Error::new_spanned(
                    ident,
                    "only one field can be marked #[reflect(handle)]",
                ));
            }
            continue;
        }
        if field_attrs.skip {
            continue;
        }
        let name = field_attrs
            .rename
            .unwrap_or_else(|| attrs.rename_all.apply(&ident.to_string()));
        members.push(Member {
            ident,
            ty: &field.ty,
            name,
            prop: field_attrs.prop,
            description: doc_comment(&field.attrs),
        });
    }

    let ident = &input.ident;
    let type_name = type_name_tokens(input, attrs);
    let description = doc_comment(&input.attrs);

    let kind_of = |member: &Member<'_>| {
        if member.prop {
            quote! { ::reflect_mcp::reflect::MemberKind::Property }
        } else {
            quote! { ::reflect_mcp::reflect::MemberKind::Field }
        }
    };
    let names_of = |prop: bool| {
        let names = members.iter().filter(|m| m.prop == prop).map(|m| &m.name);
        quote! { ::std::vec![#(::std::string::String::from(#names)),*] }
    };
    let field_names = names_of(false);
    let prop_names = names_of(true);

    let member_arms = members.iter().map(|m| {
        let kind = kind_of(m);
        let name = &m.name;
        let field = m.ident;
        quote! { (#kind, #name) => ::core::option::Option::Some(&self.#field) }
    });
    let member_mut_arms = members.iter().map(|m| {
        let kind = kind_of(m);
        let name = &m.name;
        let field = m.ident;
        quote! { (#kind, #name) => ::core::option::Option::Some(&mut self.#field) }
    });
    let member_infos = members.iter().map(|m| {
        let name = &m.name;
        let ty = m.ty;
        let doc = &m.description;
        let constructor = if m.prop {
            quote! { property }
        } else {
            quote! { field }
        };
        quote! {
            ::reflect_mcp::reflect::MemberInfo::#constructor(
                #name,
                <#ty as ::reflect_mcp::reflect::Typed>::type_name_of(),
            )
            .with_description(#doc)
        }
    });
    let dependencies = members.iter().map(|m| {
        let ty = m.ty;
        quote! { registry.register::<#ty>(); }
    });

    let instance_handle = handle_field.map(|field| {
        quote! {
            fn instance_handle(&self) -> ::core::option::Option<::reflect_mcp::reflect::Handle> {
                ::core::option::Option::Some(self.#field)
            }
        }
    });

    let reflect_impl = reflect_boilerplate(
        ident,
        &quote! { ::reflect_mcp::reflect::Shape::Composite },
        &quote! {
            fn member_names(
                &self,
                kind: ::reflect_mcp::reflect::MemberKind,
            ) -> ::std::vec::Vec<::std::string::String> {
                match kind {
                    ::reflect_mcp::reflect::MemberKind::Field => #field_names,
                    ::reflect_mcp::reflect::MemberKind::Property => #prop_names,
                }
            }

            #[allow(clippy::match_single_binding, reason = "types without reflected members")]
            fn member(
                &self,
                kind: ::reflect_mcp::reflect::MemberKind,
                name: &str,
            ) -> ::core::option::Option<&dyn ::reflect_mcp::reflect::Reflect> {
                match (kind, name) {
                    #(#member_arms,)*
                    _ => ::core::option::Option::None,
                }
            }

            #[allow(clippy::match_single_binding, reason = "types without reflected members")]
            fn member_mut(
                &mut self,
                kind: ::reflect_mcp::reflect::MemberKind,
                name: &str,
            ) -> ::core::option::Option<&mut dyn ::reflect_mcp::reflect::Reflect> {
                match (kind, name) {
                    #(#member_mut_arms,)*
                    _ => ::core::option::Option::None,
                }
            }

            #instance_handle
        },
    );

    let info = quote! {
        ::reflect_mcp::reflect::TypeInfo::composite(
            <Self as ::reflect_mcp::reflect::Typed>::type_name_of(),
            ::std::vec![#(#member_infos),*],
        )
    };
    let typed_impl = typed_boilerplate(
        ident,
        attrs,
        &type_name,
        &info,
        &description,
        &quote! { #(#dependencies)* },
    );

    Ok(quote! {
        #reflect_impl
        #typed_impl
    })
}

fn expand_enum(
    input: &DeriveInput,
    attrs: &ContainerAttrs,
    data: &DataEnum,
) -> syn::Result<TokenStream2> {
    if let Some(variant) = data
        .variants
        .iter()
        .find(|v| !matches!(v.fields, Fields::Unit))
    {
        return Err(syn::Error::new_spanned(
            variant,
            "Reflect can only be derived for enums with unit variants",
        ));
    }

    let ident = &input.ident;
    let type_name = type_name_tokens(input, attrs);
    let description = doc_comment(&input.attrs);
    let variants: Vec<_> = data.variants.iter().map(|v| &v.ident).collect();
    let names: Vec<_> = variants.iter().map(ToString::to_string).collect();
    let indices = 0..variants.len();

    let reflect_impl = reflect_boilerplate(
        ident,
        &quote! { ::reflect_mcp::reflect::Shape::Leaf },
        &quote! {
            fn to_json(&self) -> ::reflect_mcp::__private::serde_json::Value {
                let name = match self {
                    #(Self::#variants => #names,)*
                };
                ::reflect_mcp::__private::serde_json::Value::String(
                    ::std::string::String::from(name),
                )
            }

            fn set_json(
                &mut self,
                value: &::reflect_mcp::__private::serde_json::Value,
            ) -> ::core::result::Result<(), ::reflect_mcp::Error> {
                const VARIANTS: &[&str] = &[#(#names),*];
                let index = match value {
                    ::reflect_mcp::__private::serde_json::Value::String(s) => VARIANTS
                        .iter()
                        .position(|variant| variant.eq_ignore_ascii_case(s.trim())),
                    ::reflect_mcp::__private::serde_json::Value::Number(n) => n
                        .as_u64()
                        .and_then(|i| usize::try_from(i).ok())
                        .filter(|i| *i < VARIANTS.len()),
                    _ => ::core::option::Option::None,
                };
                match index {
                    #(::core::option::Option::Some(#indices) => *self = Self::#variants,)*
                    _ => {
                        return ::core::result::Result::Err(::reflect_mcp::Error::unsupported(
                            ::reflect_mcp::reflect::Reflect::type_name(self),
                            value,
                        ));
                    },
                }
                ::core::result::Result::Ok(())
            }
        },
    );

    let info = quote! {
        ::reflect_mcp::reflect::TypeInfo::enumeration(
            <Self as ::reflect_mcp::reflect::Typed>::type_name_of(),
            ::std::vec![#(::std::string::String::from(#names)),*],
        )
    };
    let typed_impl = typed_boilerplate(ident, attrs, &type_name, &info, &description, &quote! {});

    Ok(quote! {
        #reflect_impl
        #typed_impl
    })
}

fn reflect_boilerplate(ident: &Ident, shape: &TokenStream2, body: &TokenStream2) -> TokenStream2 {
    quote! {
        impl ::reflect_mcp::reflect::Reflect for #ident {
            fn type_name(&self) -> ::reflect_mcp::reflect::TypeName {
                <Self as ::reflect_mcp::reflect::Typed>::type_name_of()
            }

            fn shape(&self) -> ::reflect_mcp::reflect::Shape { #shape }

            fn as_any(&self) -> &dyn ::core::any::Any { self }

            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any { self }

            fn into_any(
                self: ::std::boxed::Box<Self>,
            ) -> ::std::boxed::Box<dyn ::core::any::Any> {
                self
            }

            fn clone_reflect(&self) -> ::std::boxed::Box<dyn ::reflect_mcp::reflect::Reflect> {
                ::std::boxed::Box::new(::core::clone::Clone::clone(self))
            }

            #body
        }
    }
}

fn typed_boilerplate(
    ident: &Ident,
    attrs: &ContainerAttrs,
    type_name: &TokenStream2,
    info: &TokenStream2,
    description: &str,
    dependencies: &TokenStream2,
) -> TokenStream2 {
    let bases = &attrs.bases;
    let with_bases = (!bases.is_empty()).then(|| {
        quote! {
            .with_bases([#(::reflect_mcp::reflect::TypeName::from(#bases)),*])
        }
    });
    let ownership = if attrs.container {
        quote! { ::reflect_mcp::reflect::Ownership::HostContainer }
    } else if attrs.host_owned {
        quote! { ::reflect_mcp::reflect::Ownership::Host }
    } else {
        quote! { ::reflect_mcp::reflect::Ownership::Value }
    };
    let registration = attrs.default.then(|| {
        quote! {
            fn registration() -> ::reflect_mcp::reflect::TypeRegistration {
                ::reflect_mcp::reflect::TypeRegistration::with_default::<Self>()
            }
        }
    });

    quote! {
        impl ::reflect_mcp::reflect::Typed for #ident {
            fn type_name_of() -> ::reflect_mcp::reflect::TypeName { #type_name }

            fn type_info() -> ::reflect_mcp::reflect::TypeInfo {
                #info
                    .with_description(#description)
                    #with_bases
                    .with_ownership(#ownership)
            }

            #registration

            fn register_dependencies(registry: &mut ::reflect_mcp::reflect::TypeRegistry) {
                let _ = &registry;
                #dependencies
            }
        }
    }
}
