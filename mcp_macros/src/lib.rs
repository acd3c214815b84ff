//! Procedural macros for reflect_mcp

mod attributes;
mod reflect;

use proc_macro::TokenStream;

/// Derives `Reflect` and `Typed` for named structs and fieldless enums.
///
/// # Example
///
/// ```ignore
/// /// Position, rotation and scale of an entity
/// #[derive(Clone, Default, Reflect)]
/// #[reflect(namespace = "scene", base = "scene::Component", host_owned, rename_all = "camelCase")]
/// pub struct Transform {
///     #[reflect(handle)]
///     pub handle:   Handle,
///     /// World position
///     #[reflect(prop)]
///     pub position: Vec3,
///     pub parent:   ObjectRef,
/// }
/// ```
///
/// Container attributes:
/// - `namespace = "..."`: prefix of the type name, defaults to the module path
/// - `base = "..."`: declared base type, repeatable, nearest first
/// - `host_owned`: instances live in the host and are addressed by handle
/// - `container`: host-owned entity carrying attached components
/// - `default`: register a `Default` constructor so new instances can be created
/// - `rename_all = "camelCase" | "snake_case"`: member naming
///
/// Field attributes:
/// - `prop`: expose under `props` instead of `fields`
/// - `skip`: not reflected
/// - `handle`: holds the instance handle, not reflected
/// - `rename = "..."`: member name
///
/// Doc comments on the type and its fields become descriptions.
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream { reflect::derive_reflect_impl(input) }
