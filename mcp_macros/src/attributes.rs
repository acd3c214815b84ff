//! Parsing of `#[reflect(...)]` attributes and doc comments

use heck::ToLowerCamelCase;
use heck::ToSnakeCase;
use syn::Attribute;
use syn::Expr;
use syn::ExprLit;
use syn::Lit;
use syn::LitStr;
use syn::Meta;

/// Member naming applied to every field without an explicit `rename`
#[derive(Clone, Copy, Default)]
pub enum RenameRule {
    #[default]
    Verbatim,
    CamelCase,
    SnakeCase,
}

impl RenameRule {
    fn parse(lit: &LitStr) -> syn::Result<Self> {
        match lit.value().as_str() {
            "camelCase" => Ok(Self::CamelCase),
            "snake_case" => Ok(Self::SnakeCase),
            other => Err(syn::Error::new(
                lit.span(),
                format!("unsupported rename_all rule `{other}`, expected \"camelCase\" or \"snake_case\""),
            )),
        }
    }

    pub fn apply(self, name: &str) -> String {
        match self {
            Self::Verbatim => name.to_string(),
            Self::CamelCase => name.to_lower_camel_case(),
            Self::SnakeCase => name.to_snake_case(),
        }
    }
}

/// Attributes on the deriving type
#[derive(Default)]
pub struct ContainerAttrs {
    pub namespace:  Option<String>,
    pub bases:      Vec<String>,
    pub host_owned: bool,
    pub container:  bool,
    pub default:    bool,
    pub rename_all: RenameRule,
}

impl ContainerAttrs {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("reflect")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("namespace") {
                    let s: LitStr = meta.value()?.parse()?;
                    parsed.namespace = Some(s.value());
                    Ok(())
                } else if meta.path.is_ident("base") {
                    let s: LitStr = meta.value()?.parse()?;
                    parsed.bases.push(s.value());
                    Ok(())
                } else if meta.path.is_ident("host_owned") {
                    parsed.host_owned = true;
                    Ok(())
                } else if meta.path.is_ident("container") {
                    parsed.container = true;
                    Ok(())
                } else if meta.path.is_ident("default") {
                    parsed.default = true;
                    Ok(())
                } else if meta.path.is_ident("rename_all") {
                    let s: LitStr = meta.value()?.parse()?;
                    parsed.rename_all = RenameRule::parse(&s)?;
                    Ok(())
                } else {
                    Err(meta.error("unsupported reflect attribute"))
                }
            })?;
        }
        Ok(parsed)
    }
}

/// Attributes on one field
#[derive(Default)]
pub struct FieldAttrs {
    pub prop:   bool,
    pub skip:   bool,
    pub handle: bool,
    pub rename: Option<String>,
}

impl FieldAttrs {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("reflect")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("prop") {
                    parsed.prop = true;
                    Ok(())
                } else if meta.path.is_ident("skip") {
                    parsed.skip = true;
                    Ok(())
                } else if meta.path.is_ident("handle") {
                    parsed.handle = true;
                    Ok(())
                } else if meta.path.is_ident("rename") {
                    let s: LitStr = meta.value()?.parse()?;
                    parsed.rename = Some(s.value());
                    Ok(())
                } else {
                    Err(meta.error("unsupported reflect field attribute"))
                }
            })?;
        }
        Ok(parsed)
    }
}

/// Doc comment lines joined with spaces
pub fn doc_comment(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) => Some(s.value().trim().to_string()),
                _ => None,
            },
            _ => None,
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
