use std::collections::BTreeMap;
use std::collections::HashMap;

use error_stack::Report;
use tracing::debug;

use super::Reflect;
use super::TypeInfo;
use super::TypeName;
use super::Typed;
use crate::error::Error;
use crate::error::Result;

/// One registered type: its description plus an optional default constructor
#[derive(Clone)]
pub struct TypeRegistration {
    info:   TypeInfo,
    create: Option<fn() -> Box<dyn Reflect>>,
}

impl TypeRegistration {
    /// Registration without a default constructor
    pub const fn new(info: TypeInfo) -> Self { Self { info, create: None } }

    /// Registration whose instances can be created from `Default`
    pub fn with_default<T: Typed + Default>() -> Self {
        Self {
            info:   T::type_info(),
            create: Some(create_default::<T>),
        }
    }

    /// Static description
    pub const fn info(&self) -> &TypeInfo { &self.info }

    /// Build a default instance, when the type has one
    pub fn create(&self) -> Option<Box<dyn Reflect>> { self.create.map(|create| create()) }
}

fn create_default<T: Typed + Default>() -> Box<dyn Reflect> { Box::new(T::default()) }

impl std::fmt::Debug for TypeRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistration")
            .field("info", &self.info)
            .field("create", &self.create.is_some())
            .finish()
    }
}

/// All types known to the engine, keyed by fully qualified name
///
/// A short-name index allows lenient lookups (`Transform` for `scene::Transform`) as long as the
/// short name is unambiguous.
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    types:       BTreeMap<TypeName, TypeRegistration>,
    short_names: HashMap<String, Vec<TypeName>>,
}

impl TypeRegistry {
    /// Registry preloaded with the built-in leaf and reference types
    pub fn new() -> Self {
        let mut registry = Self::default();
        super::impls::register_builtins(&mut registry);
        registry
    }

    /// Register `T` and everything it refers to
    pub fn register<T: Typed>(&mut self) {
        let name = T::type_name_of();
        if self.types.contains_key(&name) {
            return;
        }
        self.insert(T::registration());
        T::register_dependencies(self);
    }

    /// Insert a prepared registration, replacing any previous one of the same name
    pub fn insert(&mut self, registration: TypeRegistration) {
        let name = registration.info.name.clone();
        debug!(type_name = %name, "Registering type");
        let short = self.short_names.entry(name.short_name()).or_default();
        if !short.contains(&name) {
            short.push(name.clone());
        }
        self.types.insert(name, registration);
    }

    /// Look up a registration by full name, falling back to an unambiguous short name
    pub fn get(&self, name: &str) -> Option<&TypeRegistration> {
        self.types.get(&TypeName::from(name)).or_else(|| {
            match self.short_names.get(name).map(Vec::as_slice) {
                Some([only]) => self.types.get(only),
                _ => None,
            }
        })
    }

    /// Look up a type description
    pub fn info(&self, name: &str) -> Result<&TypeInfo> {
        self.get(name)
            .map(TypeRegistration::info)
            .ok_or_else(|| Report::new(Error::TypeNotFound(name.to_string())))
    }

    /// True when `name` resolves
    pub fn contains(&self, name: &str) -> bool { self.get(name).is_some() }

    /// Every registered type, ordered by name
    pub fn iter(&self) -> impl Iterator<Item = &TypeInfo> {
        self.types.values().map(TypeRegistration::info)
    }

    /// Number of registered types
    pub fn len(&self) -> usize { self.types.len() }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool { self.types.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::ObjectRef;
    use crate::reflect::TypeKind;

    #[test]
    fn test_builtins_are_registered() {
        let registry = TypeRegistry::new();
        for name in ["i32", "f32", "bool", "String", "reflect_mcp::ObjectRef"] {
            assert!(registry.contains(name), "missing builtin {name}");
        }
        assert!(registry.get("f32").and_then(TypeRegistration::create).is_some());
    }

    #[test]
    fn test_short_name_lookup() {
        let registry = TypeRegistry::new();
        let info = registry.info("ObjectRef").map(|info| info.kind.clone());
        assert!(matches!(info, Ok(TypeKind::Reference)));
    }

    #[test]
    fn test_register_pulls_in_item_types() {
        let mut registry = TypeRegistry::default();
        registry.register::<Vec<ObjectRef>>();
        assert!(registry.contains("Vec<reflect_mcp::ObjectRef>"));
        assert!(registry.contains("reflect_mcp::ObjectRef"));
    }

    #[test]
    fn test_unknown_type_is_type_not_found() {
        let registry = TypeRegistry::new();
        let error = registry.info("scene::Missing").map(|_| ());
        assert!(matches!(
            error.map_err(|report| report.current_context().to_string()),
            Err(message) if message == "Type 'scene::Missing' not found."
        ));
    }
}
