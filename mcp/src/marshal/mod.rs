//! The marshalling engine: serialize live values into [`SerializedNode`] trees and populate them
//! back, one convertor per type family
//!
//! [`Reflector`] bundles the type registry, the convertor registry, the method registry and the
//! bridge configuration. It is immutable once built and shared behind an `Arc` by the request
//! surface.
//!
//! [`SerializedNode`]: crate::node::SerializedNode

mod context;
mod operations;
mod reconcile;

pub use context::PopulateCx;
pub use context::SerializeCx;

use crate::config::BridgeConfig;
use crate::convertor::Convertor;
use crate::convertor::ConvertorRegistry;
use crate::method::MethodInfo;
use crate::method::MethodRegistry;
use crate::node::Transcript;
use crate::reflect::TypeRegistration;
use crate::reflect::TypeRegistry;
use crate::reflect::Typed;

/// Registries and configuration shared by every marshalling and invocation call
#[derive(Debug)]
pub struct Reflector {
    types:      TypeRegistry,
    convertors: ConvertorRegistry,
    methods:    MethodRegistry,
    config:     BridgeConfig,
}

impl Default for Reflector {
    fn default() -> Self { Self::builder().build() }
}

impl Reflector {
    /// Start building a reflector with the built-in types and convertors
    pub fn builder() -> ReflectorBuilder { ReflectorBuilder::default() }

    /// Registered types
    pub const fn types(&self) -> &TypeRegistry { &self.types }

    /// Registered convertors
    pub const fn convertors(&self) -> &ConvertorRegistry { &self.convertors }

    /// Registered invocable methods
    pub const fn methods(&self) -> &MethodRegistry { &self.methods }

    /// Bridge configuration
    pub const fn config(&self) -> &BridgeConfig { &self.config }

    /// Empty transcript indented according to the configuration
    pub fn transcript(&self) -> Transcript { Transcript::new(self.config.padding_width) }
}

/// Builder for [`Reflector`]
#[derive(Debug)]
pub struct ReflectorBuilder {
    types:      TypeRegistry,
    convertors: ConvertorRegistry,
    methods:    MethodRegistry,
    config:     BridgeConfig,
}

impl Default for ReflectorBuilder {
    fn default() -> Self {
        Self {
            types:      TypeRegistry::new(),
            convertors: ConvertorRegistry::with_builtins(),
            methods:    MethodRegistry::default(),
            config:     BridgeConfig::default(),
        }
    }
}

impl ReflectorBuilder {
    /// Register `T` and every type its members refer to
    #[must_use]
    pub fn register_type<T: Typed>(mut self) -> Self {
        self.types.register::<T>();
        self
    }

    /// Register a hand-written type description
    #[must_use]
    pub fn register_registration(mut self, registration: TypeRegistration) -> Self {
        self.types.insert(registration);
        self
    }

    /// Add a convertor, replacing a built-in one of the same name
    #[must_use]
    pub fn convertor(mut self, convertor: impl Convertor + 'static) -> Self {
        self.convertors.register(Box::new(convertor));
        self
    }

    /// Register an invocable method together with its parameter and return types
    #[must_use]
    pub fn method(mut self, method: MethodInfo) -> Self {
        for register in method.dependencies() {
            register(&mut self.types);
        }
        self.methods.register(method);
        self
    }

    /// Replace the configuration
    #[must_use]
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Finish building
    pub fn build(self) -> Reflector {
        Reflector {
            types:      self.types,
            convertors: self.convertors,
            methods:    self.methods,
            config:     self.config,
        }
    }
}

#[cfg(test)]
mod tests;
