//! Argument binding, execution and result normalization

use error_stack::Report;
use error_stack::ResultExt;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::Args;
use super::InvokeContext;
use super::MethodInfo;
use super::ParameterInfo;
use crate::error::Error;
use crate::error::Result;
use crate::host::Host;
use crate::host::OperationTicket;
use crate::host::PendingOperations;
use crate::marshal::Reflector;
use crate::node::SerializedNode;
use crate::node::Transcript;
use crate::reflect::Reflect;
use crate::reflect::TypeKind;
use crate::reflect::TypeName;

/// Normalized outcome of a method call
#[derive(Debug)]
pub enum InvocationResult {
    /// The method returned nothing
    Empty,
    /// A primitive or enum result, stringified
    Value(String),
    /// Any other result, as a non-recursive node
    Structured(SerializedNode),
    /// The method started a two-phase host operation
    Processing(OperationTicket),
}

/// One parameter of a [`MethodData`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterData {
    /// Parameter name
    pub name:      String,
    /// Declared type
    #[serde(rename = "type")]
    pub type_name: TypeName,
    /// Default used when the argument is left out
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default:   Option<Value>,
    /// JSON schema of the declared type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema:    Option<Value>,
}

/// Method signature as reported by method search
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodData {
    /// Namespace of the declaring type
    pub namespace:   String,
    /// Declaring type
    #[serde(rename = "type")]
    pub type_name:   TypeName,
    /// Method name
    pub name:        String,
    /// Static methods take no target
    pub is_static:   bool,
    /// Returned type, absent when nothing is returned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<TypeName>,
    /// Free-form description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parameters in declaration order
    pub parameters:  Vec<ParameterData>,
}

fn to_fault(method: &MethodInfo, error: Error) -> Report<Error> {
    let error = if matches!(error, Error::InvocationFault(_)) {
        error
    } else {
        Error::InvocationFault(error.to_string())
    };
    Report::new(error).attach(format!("Invoking {}", method.signature()))
}

impl Reflector {
    /// Describe `method` for search results
    pub fn method_data(&self, method: &MethodInfo) -> MethodData {
        MethodData {
            namespace:   method.namespace.clone(),
            type_name:   method.declaring_type.clone(),
            name:        method.name.clone(),
            is_static:   method.is_static,
            return_type: method.return_type.clone(),
            description: method.description.clone(),
            parameters:  method
                .parameters
                .iter()
                .map(|p| ParameterData {
                    name:      p.name.clone(),
                    type_name: p.type_name.clone(),
                    default:   p.default.clone(),
                    schema:    self.schema_of(p.type_name.as_str()).ok(),
                })
                .collect(),
        }
    }

    /// Bind `args` to `method`, run it on `target` and normalize the result
    ///
    /// Arguments are bound by name when every one of them is named, by position otherwise.
    /// Missing arguments take the declared default, else the type's zero value. A host-owned
    /// target is checked out and committed back after the call.
    pub fn invoke(
        &self,
        host: &mut dyn Host,
        operations: Option<&PendingOperations>,
        method: &MethodInfo,
        target: Option<&SerializedNode>,
        args: &[SerializedNode],
        transcript: &mut Transcript,
    ) -> Result<InvocationResult> {
        let args = Args::new(self.bind_arguments(host, method, args, transcript)?);
        let mut instance = if method.is_static {
            None
        } else {
            Some(self.bind_target(host, method, target, transcript)?)
        };
        let commit_to = instance.as_deref().and_then(|obj| {
            self.types()
                .get(obj.type_name().as_str())
                .filter(|registration| registration.info().is_host_owned())
                .and_then(|_| obj.instance_handle())
        });

        debug!(signature = %method.signature(), args = args.len(), "Invoking method");
        let mut cx = InvokeContext::new(&mut *host, operations);
        let bound_target: Option<&mut dyn Reflect> = match instance.as_mut() {
            Some(obj) => Some(obj.as_mut()),
            None => None,
        };
        let outcome = method.call(&mut cx, bound_target, &args);
        let ticket = cx.take_ticket();
        let returned = outcome.map_err(|error| to_fault(method, error))?;

        if let (Some(handle), Some(obj)) = (commit_to, instance) {
            host.apply(handle, obj)
                .map_err(Report::new)
                .attach(format!("Committing target '{handle}' of {}", method.signature()))?;
        }

        if let Some(ticket) = ticket {
            return Ok(InvocationResult::Processing(ticket));
        }
        Ok(self.normalize(host, returned, transcript))
    }

    fn normalize(
        &self,
        host: &dyn Host,
        returned: Option<Box<dyn Reflect>>,
        transcript: &mut Transcript,
    ) -> InvocationResult {
        let Some(value) = returned else {
            return InvocationResult::Empty;
        };
        let type_name = value.type_name();
        let scalar = self.types().get(type_name.as_str()).is_some_and(|registration| {
            matches!(
                registration.info().kind,
                TypeKind::Primitive { .. } | TypeKind::Enum { .. }
            )
        });
        if scalar {
            return InvocationResult::Value(match value.to_json() {
                Value::String(s) => s,
                other => other.to_string(),
            });
        }
        InvocationResult::Structured(self.serialize(
            host,
            Some(value.as_ref()),
            &type_name,
            None,
            false,
            transcript,
        ))
    }

    fn bind_target(
        &self,
        host: &mut dyn Host,
        method: &MethodInfo,
        target: Option<&SerializedNode>,
        transcript: &mut Transcript,
    ) -> Result<Box<dyn Reflect>> {
        let Some(node) = target.filter(|node| !node.is_empty()) else {
            return self
                .create_instance(host, &method.declaring_type)
                .attach(format!("Creating a target for {}", method.signature()));
        };
        self.deserialize(host, node, &method.declaring_type, transcript)?
            .ok_or_else(|| {
                Report::new(Error::invalid(
                    "target",
                    format!("{} needs a target, got null", method.signature()),
                ))
            })
    }

    fn bind_arguments(
        &self,
        host: &mut dyn Host,
        method: &MethodInfo,
        args: &[SerializedNode],
        transcript: &mut Transcript,
    ) -> Result<Vec<Option<Box<dyn Reflect>>>> {
        let parameters = &method.parameters;
        let mut slots: Vec<Option<&SerializedNode>> = vec![None; parameters.len()];

        if !args.is_empty() && args.iter().all(|arg| arg.name.is_some()) {
            for arg in args {
                let name = arg.name.as_deref().unwrap_or_default();
                let slot = parameters
                    .iter()
                    .position(|p| p.name == name)
                    .or_else(|| parameters.iter().position(|p| p.name.eq_ignore_ascii_case(name)))
                    .and_then(|index| slots.get_mut(index))
                    .ok_or_else(|| {
                        Report::new(Error::ParameterCountMismatch(format!(
                            "{} has no parameter named '{name}'",
                            method.signature()
                        )))
                    })?;
                if slot.replace(arg).is_some() {
                    return Err(Report::new(Error::invalid(
                        "arguments",
                        format!("'{name}' was supplied more than once"),
                    )));
                }
            }
        } else {
            if args.len() > parameters.len() {
                return Err(Report::new(Error::ParameterCountMismatch(format!(
                    "{} takes {} arguments, {} supplied",
                    method.signature(),
                    parameters.len(),
                    args.len()
                ))));
            }
            for (slot, arg) in slots.iter_mut().zip(args) {
                *slot = Some(arg);
            }
        }

        parameters
            .iter()
            .zip(slots)
            .map(|(parameter, slot)| {
                self.bind_argument(host, method, parameter, slot, transcript)
                    .attach(format!("Binding parameter '{}'", parameter.name))
            })
            .collect()
    }

    fn bind_argument(
        &self,
        host: &mut dyn Host,
        method: &MethodInfo,
        parameter: &ParameterInfo,
        supplied: Option<&SerializedNode>,
        transcript: &mut Transcript,
    ) -> Result<Option<Box<dyn Reflect>>> {
        if let Some(node) = supplied {
            return self.deserialize(host, node, &parameter.type_name, transcript);
        }
        if let Some(default) = &parameter.default {
            let node = SerializedNode::leaf(parameter.type_name.clone(), None, default.clone());
            return self.deserialize(host, &node, &parameter.type_name, transcript);
        }

        let registration = self.types().get(parameter.type_name.as_str());
        if registration.is_some_and(|registration| registration.info().is_host_owned()) {
            return Ok(None);
        }
        registration
            .and_then(crate::reflect::TypeRegistration::create)
            .map(Some)
            .ok_or_else(|| {
                Report::new(Error::ParameterCountMismatch(format!(
                    "missing argument '{}' of {}, and '{}' has no zero value",
                    parameter.name,
                    method.signature(),
                    parameter.type_name
                )))
            })
    }
}
