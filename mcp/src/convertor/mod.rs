//! Convertors: per-family strategies for serializing and populating reflected values
//!
//! The registry asks every convertor for its [`Priority`] against a concrete type and picks the
//! highest. The generic object convertor always applies with the lowest priority, so resolution
//! never fails.

mod generic;
mod host_container;
mod host_object;
mod leaf;
mod optional;
mod registry;
mod sequence;

pub use generic::GenericObjectConvertor;
pub use host_container::HostContainerConvertor;
pub use host_object::HostObjectConvertor;
pub use leaf::EnumConvertor;
pub use leaf::ObjectRefConvertor;
pub use leaf::PrimitiveConvertor;
pub use optional::OptionalConvertor;
pub use registry::ConvertorRegistry;
pub use sequence::SequenceConvertor;

use error_stack::Report;

use crate::error::Error;
use crate::error::Result;
use crate::host::Host;
use crate::marshal::PopulateCx;
use crate::marshal::Reflector;
use crate::marshal::SerializeCx;
use crate::node::SerializedNode;
use crate::reflect::Reflect;
use crate::reflect::TypeInfo;

/// How specifically a convertor targets a type; breaks score ties
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Specificity {
    /// Applies to anything
    Generic,
    /// Applies through an ownership model or declared base type
    Base,
    /// Applies to a whole type family (primitives, enums, sequences)
    Family,
    /// Registered for the exact type
    Exact,
}

/// Score of a convertor for one concrete type; higher wins
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority {
    /// Primary ordering key
    pub score:       u32,
    /// Tie breaker
    pub specificity: Specificity,
}

impl Priority {
    /// The generic fallback
    pub const FALLBACK: Self = Self {
        score:       0,
        specificity: Specificity::Generic,
    };

    /// A type-family match
    pub const fn family() -> Self {
        Self {
            score:       100,
            specificity: Specificity::Family,
        }
    }

    /// A match through a base type `distance` steps up the declared hierarchy
    #[allow(
        clippy::cast_possible_truncation,
        reason = "declared hierarchies are a handful of levels deep"
    )]
    pub const fn base(distance: usize) -> Self {
        let penalty = if distance > 900 { 900 } else { distance as u32 };
        Self {
            score:       1_000 - penalty,
            specificity: Specificity::Base,
        }
    }

    /// A registration for the exact type
    pub const fn exact() -> Self {
        Self {
            score:       10_000,
            specificity: Specificity::Exact,
        }
    }
}

/// Strategy for one family of types
pub trait Convertor: Send + Sync {
    /// Stable identifier, also the final tie breaker during resolution
    fn name(&self) -> &'static str;

    /// Priority for `info`, `None` when the convertor does not apply
    fn priority(&self, info: &TypeInfo) -> Option<Priority>;

    /// Produce the node for `obj`, whose runtime type is described by `info`
    fn serialize(
        &self,
        cx: &mut SerializeCx<'_>,
        obj: &dyn Reflect,
        info: &TypeInfo,
        name: Option<&str>,
        recursive: bool,
        depth: usize,
    ) -> SerializedNode;

    /// Apply `node` onto `obj`, recording every outcome in the context transcript
    ///
    /// Returns true when at least one change was applied.
    fn populate(
        &self,
        cx: &mut PopulateCx<'_>,
        obj: &mut dyn Reflect,
        info: &TypeInfo,
        node: &mut SerializedNode,
        depth: usize,
    ) -> bool;

    /// Keys that may not appear inside a node's `value` unless they can be relocated
    fn restricted_keys(&self, _info: &TypeInfo) -> Vec<String> { Vec::new() }

    /// Build a fresh instance of `info`
    fn create_instance(
        &self,
        reflector: &Reflector,
        _host: &mut dyn Host,
        info: &TypeInfo,
    ) -> Result<Box<dyn Reflect>> {
        reflector
            .types()
            .get(info.name.as_str())
            .and_then(crate::reflect::TypeRegistration::create)
            .ok_or_else(|| {
                Report::new(Error::UnsupportedConversion {
                    type_name: info.name.to_string(),
                    found:     "a request to create an instance without a default".to_string(),
                })
            })
    }
}
