//! Invocable methods: registration, fuzzy lookup and invocation
//!
//! Methods are registered explicitly through [`MethodBuilder`] and stored in the
//! [`MethodRegistry`] of a [`Reflector`](crate::marshal::Reflector). Callers describe the method
//! they want with a partial [`MethodDescriptor`] and [`MatchLevels`]; the resolver ranks the
//! registered methods and the invoker binds arguments from [`SerializedNode`]s.
//!
//! [`SerializedNode`]: crate::node::SerializedNode

mod context;
mod descriptor;
mod invoker;
mod match_level;
mod registry;
mod resolver;

pub use context::Args;
pub use context::InvokeContext;
pub use descriptor::MethodDescriptor;
pub use descriptor::ParameterShape;
pub use invoker::InvocationResult;
pub use invoker::MethodData;
pub use invoker::ParameterData;
pub use match_level::MAX_NAME_LEVEL;
pub use match_level::MAX_PARAMETER_LEVEL;
pub use match_level::MatchLevels;
pub use match_level::compare_names;
pub use match_level::compare_parameters;
pub use registry::InvokeFn;
pub use registry::MethodBuilder;
pub use registry::MethodInfo;
pub use registry::MethodRegistry;
pub use registry::MethodResult;
pub use registry::ParameterInfo;

#[cfg(test)]
mod tests;
