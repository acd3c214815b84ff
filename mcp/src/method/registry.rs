use std::sync::Arc;

use serde_json::Value;

use super::Args;
use super::InvokeContext;
use crate::error::Error;
use crate::reflect::Reflect;
use crate::reflect::TypeName;
use crate::reflect::TypeRegistry;
use crate::reflect::Typed;

/// Outcome of a method body: the returned value, if any
pub type MethodResult = std::result::Result<Option<Box<dyn Reflect>>, Error>;

/// Type-erased method body
///
/// Receives the invocation context, the bound target for instance methods, and the bound
/// arguments in declaration order.
pub type InvokeFn =
    Arc<dyn Fn(&mut InvokeContext<'_>, Option<&mut dyn Reflect>, &Args) -> MethodResult + Send + Sync>;

/// Declared parameter of an invocable method
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterInfo {
    /// Parameter name, used for named binding
    pub name:      String,
    /// Declared type
    pub type_name: TypeName,
    /// Value used when the caller leaves the parameter out
    pub default:   Option<Value>,
}

/// One invocable method of the host's type universe
#[derive(Clone)]
pub struct MethodInfo {
    /// Namespace of the declaring type
    pub namespace:      String,
    /// Type the method is declared on
    pub declaring_type: TypeName,
    /// Method name; overloads share it
    pub name:           String,
    /// Free-form description
    pub description:    Option<String>,
    /// Parameters in declaration order
    pub parameters:     Vec<ParameterInfo>,
    /// Returned type, `None` for methods returning nothing
    pub return_type:    Option<TypeName>,
    /// Static methods take no target
    pub is_static:      bool,
    invoke:             InvokeFn,
    dependencies:       Vec<fn(&mut TypeRegistry)>,
}

impl std::fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodInfo")
            .field("signature", &self.signature())
            .finish_non_exhaustive()
    }
}

impl MethodInfo {
    /// Registration functions for the declaring, parameter and return types
    pub fn dependencies(&self) -> &[fn(&mut TypeRegistry)] { &self.dependencies }

    /// Human readable signature, e.g. `static scene::Transform.Distance(a: scene::Vec3) -> f32`
    pub fn signature(&self) -> String {
        let parameters: Vec<String> = self
            .parameters
            .iter()
            .map(|p| match &p.default {
                Some(default) => format!("{}: {} = {default}", p.name, p.type_name),
                None => format!("{}: {}", p.name, p.type_name),
            })
            .collect();
        let prefix = if self.is_static { "static " } else { "" };
        let returns = self
            .return_type
            .as_ref()
            .map_or_else(String::new, |r| format!(" -> {r}"));
        format!(
            "{prefix}{}.{}({}){returns}",
            self.declaring_type,
            self.name,
            parameters.join(", ")
        )
    }

    /// Run the method body
    pub fn call(
        &self,
        cx: &mut InvokeContext<'_>,
        target: Option<&mut dyn Reflect>,
        args: &Args,
    ) -> MethodResult {
        (self.invoke)(cx, target, args)
    }
}

fn register_type<T: Typed>(registry: &mut TypeRegistry) { registry.register::<T>(); }

/// Builder for [`MethodInfo`]
///
/// ```ignore
/// MethodBuilder::instance::<Transform>("Translate")
///     .param_with_default::<f32>("x", json!(0.0))
///     .build_on(|_cx, transform: &mut Transform, args| {
///         transform.position.x += *args.get::<f32>(0)?;
///         Ok(None)
///     })
/// ```
#[derive(Debug)]
pub struct MethodBuilder {
    declaring_type: TypeName,
    name:           String,
    description:    Option<String>,
    parameters:     Vec<ParameterInfo>,
    return_type:    Option<TypeName>,
    is_static:      bool,
    dependencies:   Vec<fn(&mut TypeRegistry)>,
}

impl MethodBuilder {
    fn on<T: Typed>(name: impl Into<String>, is_static: bool) -> Self {
        Self {
            declaring_type: T::type_name_of(),
            name: name.into(),
            description: None,
            parameters: Vec::new(),
            return_type: None,
            is_static,
            dependencies: vec![register_type::<T>],
        }
    }

    /// Instance method of `T`
    pub fn instance<T: Typed>(name: impl Into<String>) -> Self { Self::on::<T>(name, false) }

    /// Static method declared on `T`
    pub fn static_on<T: Typed>(name: impl Into<String>) -> Self { Self::on::<T>(name, true) }

    /// Set the description
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a required parameter
    #[must_use]
    pub fn param<P: Typed>(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(ParameterInfo {
            name:      name.into(),
            type_name: P::type_name_of(),
            default:   None,
        });
        self.dependencies.push(register_type::<P>);
        self
    }

    /// Append a parameter with a default; objects are applied onto the type's zero value
    #[must_use]
    pub fn param_with_default<P: Typed>(mut self, name: impl Into<String>, default: Value) -> Self {
        self = self.param::<P>(name);
        if let Some(last) = self.parameters.last_mut() {
            last.default = Some(default);
        }
        self
    }

    /// Declare the return type
    #[must_use]
    pub fn returns<R: Typed>(mut self) -> Self {
        self.return_type = Some(R::type_name_of());
        self.dependencies.push(register_type::<R>);
        self
    }

    /// Finish with a type-erased body
    pub fn build<F>(self, invoke: F) -> MethodInfo
    where
        F: Fn(&mut InvokeContext<'_>, Option<&mut dyn Reflect>, &Args) -> MethodResult
            + Send
            + Sync
            + 'static,
    {
        MethodInfo {
            namespace:      self.declaring_type.namespace().to_string(),
            declaring_type: self.declaring_type,
            name:           self.name,
            description:    self.description,
            parameters:     self.parameters,
            return_type:    self.return_type,
            is_static:      self.is_static,
            invoke:         Arc::new(invoke),
            dependencies:   self.dependencies,
        }
    }

    /// Finish with a body that receives the target downcast to `T`
    pub fn build_on<T, F>(self, invoke: F) -> MethodInfo
    where
        T: Reflect,
        F: Fn(&mut InvokeContext<'_>, &mut T, &Args) -> MethodResult + Send + Sync + 'static,
    {
        let method = format!("{}.{}", self.declaring_type, self.name);
        self.build(move |cx, target, args| {
            let target = target.ok_or_else(|| {
                Error::InvocationFault(format!("'{method}' needs a target instance"))
            })?;
            let found = target.type_name();
            let target = target.downcast_mut::<T>().ok_or_else(|| {
                Error::InvocationFault(format!("'{method}' cannot be called on '{found}'"))
            })?;
            invoke(cx, target, args)
        })
    }
}

/// Every invocable method, in registration order
#[derive(Debug, Default, Clone)]
pub struct MethodRegistry {
    methods: Vec<MethodInfo>,
}

impl MethodRegistry {
    /// Add a method; overloads are kept side by side
    pub fn register(&mut self, method: MethodInfo) {
        tracing::debug!(signature = %method.signature(), "Registering method");
        self.methods.push(method);
    }

    /// Every method in registration order
    pub fn iter(&self) -> impl Iterator<Item = &MethodInfo> { self.methods.iter() }

    /// Number of registered methods
    pub fn len(&self) -> usize { self.methods.len() }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool { self.methods.is_empty() }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::host::DetachedHost;

    #[test]
    fn test_signature_rendering() {
        let method = MethodBuilder::static_on::<f32>("Lerp")
            .param::<f32>("from")
            .param_with_default::<f32>("t", json!(0.5))
            .returns::<f32>()
            .build(|_cx, _target, _args| Ok(None));
        assert_eq!(method.signature(), "static f32.Lerp(from: f32, t: f32 = 0.5) -> f32");
        assert_eq!(method.namespace, "");
        assert_eq!(method.dependencies().len(), 4);
    }

    #[test]
    fn test_build_on_downcasts_target() {
        let method = MethodBuilder::instance::<String>("Shout").build_on(
            |_cx, text: &mut String, _args| {
                *text = text.to_uppercase();
                Ok(None)
            },
        );
        let mut host = DetachedHost;
        let mut cx = InvokeContext::new(&mut host, None);
        let args = Args::default();

        let mut text = String::from("hello");
        let outcome = method.call(&mut cx, Some(&mut text), &args);
        assert!(outcome.is_ok());
        assert_eq!(text, "HELLO");

        let mut number = 3_i32;
        let outcome = method.call(&mut cx, Some(&mut number), &args);
        assert!(matches!(outcome, Err(Error::InvocationFault(_))));
        assert!(matches!(method.call(&mut cx, None, &args), Err(Error::InvocationFault(_))));
    }
}
