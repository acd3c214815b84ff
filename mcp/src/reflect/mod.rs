//! Runtime reflection model
//!
//! Every marshallable type implements [`Reflect`] (dynamic access to its value) and [`Typed`]
//! (its static [`TypeInfo`]). Both are normally produced by `#[derive(Reflect)]`; primitives,
//! `String`, `Option<T>`, `Vec<T>`, [`Handle`] and [`ObjectRef`] are implemented here.

mod handle;
mod impls;
mod registry;
mod type_info;
mod type_name;

use std::any::Any;

pub use handle::Handle;
pub use handle::ObjectRef;
pub use registry::TypeRegistration;
pub use registry::TypeRegistry;
pub use reflect_mcp_macros::Reflect;
use serde_json::Map;
use serde_json::Value;
use strum::IntoEnumIterator;
pub use type_info::MemberInfo;
pub use type_info::MemberKind;
pub use type_info::Ownership;
pub use type_info::Primitive;
pub use type_info::TypeInfo;
pub use type_info::TypeKind;
pub use type_name::TypeName;

use crate::error::Error;

/// Dynamic access pattern a value supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Read and written as one JSON value
    Leaf,
    /// Named members under `fields` / `props`
    Composite,
    /// Positional elements
    Sequence,
}

/// Dynamic view of a marshallable value
///
/// Leaf types implement `to_json`/`set_json`; composites expose members; sequences expose
/// elements. The defaults describe "not supported" so each shape only overrides its own part.
pub trait Reflect: Any + Send + Sync {
    /// Fully qualified runtime type name
    fn type_name(&self) -> TypeName;

    /// Access pattern of this value
    fn shape(&self) -> Shape;

    /// Upcast for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Owned upcast for downcasting
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Deep copy behind a fresh box
    fn clone_reflect(&self) -> Box<dyn Reflect>;

    /// JSON preview of the value
    ///
    /// Composites and sequences default to a structural walk of their members/elements.
    fn to_json(&self) -> Value {
        match self.shape() {
            Shape::Leaf => Value::Null,
            Shape::Composite => {
                let mut map = Map::new();
                for kind in MemberKind::iter() {
                    for name in self.member_names(kind) {
                        if let Some(member) = self.member(kind, &name) {
                            map.insert(name, member.to_json());
                        }
                    }
                }
                Value::Object(map)
            },
            Shape::Sequence => Value::Array(
                (0..self.element_count())
                    .filter_map(|index| self.element(index))
                    .map(Reflect::to_json)
                    .collect(),
            ),
        }
    }

    /// Overwrite a leaf from JSON
    fn set_json(&mut self, value: &Value) -> Result<(), Error> {
        Err(Error::unsupported(self.type_name(), value))
    }

    /// Names of the members of one kind, in declaration order
    fn member_names(&self, _kind: MemberKind) -> Vec<String> { Vec::new() }

    /// Borrow a member
    fn member(&self, _kind: MemberKind, _name: &str) -> Option<&dyn Reflect> { None }

    /// Mutably borrow a member
    fn member_mut(&mut self, _kind: MemberKind, _name: &str) -> Option<&mut dyn Reflect> { None }

    /// Number of sequence elements
    fn element_count(&self) -> usize { 0 }

    /// Borrow a sequence element
    fn element(&self, _index: usize) -> Option<&dyn Reflect> { None }

    /// Mutably borrow a sequence element
    fn element_mut(&mut self, _index: usize) -> Option<&mut dyn Reflect> { None }

    /// Append an element of the sequence's item type
    fn push_element(&mut self, element: Box<dyn Reflect>) -> Result<(), Error> {
        Err(Error::UnsupportedConversion {
            type_name: self.type_name().to_string(),
            found:     format!("element of type '{}'", element.type_name()),
        })
    }

    /// Shorten a sequence to `len` elements
    fn truncate_elements(&mut self, _len: usize) {}

    /// Opaque reference of a host-owned instance
    fn instance_handle(&self) -> Option<Handle> { None }

    /// Present value of an optional
    fn inner_value(&self) -> Option<&dyn Reflect> { None }

    /// Present value of an optional, filled with a default first when absent
    fn inner_value_mut(&mut self) -> Option<&mut dyn Reflect> { None }
}

impl dyn Reflect {
    /// Downcast to a concrete type
    pub fn downcast_ref<T: Reflect>(&self) -> Option<&T> { self.as_any().downcast_ref::<T>() }

    /// Mutably downcast to a concrete type
    pub fn downcast_mut<T: Reflect>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// True when the value is a `T`
    pub fn is<T: Reflect>(&self) -> bool { self.as_any().is::<T>() }
}

impl std::fmt::Debug for dyn Reflect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.type_name(), self.to_json())
    }
}

/// Static type description of a [`Reflect`] type
pub trait Typed: Reflect + Sized {
    /// Fully qualified name, without building the whole [`TypeInfo`]
    fn type_name_of() -> TypeName;

    /// Full static description
    fn type_info() -> TypeInfo;

    /// Registration entry; types with a default value override this to supply a constructor
    fn registration() -> TypeRegistration { TypeRegistration::new(Self::type_info()) }

    /// Register the types this type's members and elements refer to
    fn register_dependencies(_registry: &mut TypeRegistry) {}
}
