//! Entry points of the marshalling engine

use error_stack::Report;
use error_stack::ResultExt;
use serde_json::Value;
use tracing::debug;

use super::PopulateCx;
use super::Reflector;
use super::SerializeCx;
use crate::error::Error;
use crate::error::Result;
use crate::host::Host;
use crate::node::LineLevel;
use crate::node::SerializedNode;
use crate::node::Transcript;
use crate::reflect::Handle;
use crate::reflect::Ownership;
use crate::reflect::Reflect;
use crate::reflect::TypeName;
use crate::reflect::TypeRegistration;

impl Reflector {
    /// Serialize `obj`, or a null leaf of `declared` when there is no object
    pub fn serialize(
        &self,
        host: &dyn Host,
        obj: Option<&dyn Reflect>,
        declared: &TypeName,
        name: Option<&str>,
        recursive: bool,
        transcript: &mut Transcript,
    ) -> SerializedNode {
        let mut cx = SerializeCx {
            reflector: self,
            host,
            transcript,
        };
        cx.serialize(obj, declared, name, recursive, 0)
    }

    /// Serialize the live host object behind `handle`
    pub fn serialize_handle(
        &self,
        host: &dyn Host,
        handle: Handle,
        name: Option<&str>,
        recursive: bool,
        transcript: &mut Transcript,
    ) -> Result<SerializedNode> {
        let obj = host
            .resolve(handle)
            .ok_or_else(|| Report::new(Error::ReferenceNotFound(handle.id())))?;
        Ok(self.serialize(host, Some(obj), &obj.type_name(), name, recursive, transcript))
    }

    /// Apply `node` onto `obj`; returns true when at least one change was applied
    pub fn populate(
        &self,
        host: &mut dyn Host,
        obj: &mut dyn Reflect,
        node: &mut SerializedNode,
        transcript: &mut Transcript,
    ) -> bool {
        self.populate_with(host, obj, node, transcript, true)
    }

    fn populate_with(
        &self,
        host: &mut dyn Host,
        obj: &mut dyn Reflect,
        node: &mut SerializedNode,
        transcript: &mut Transcript,
        relocation_warnings: bool,
    ) -> bool {
        let mut cx = PopulateCx {
            reflector: self,
            host,
            transcript,
            relocation_warnings,
        };
        cx.populate(obj, node, 0)
    }

    /// Apply `node` onto the host object behind `handle`
    ///
    /// The object is checked out, populated as a private copy and committed only when something
    /// was applied. A node naming a component type while `handle` is a container entity targets
    /// the matching attached component instead.
    pub fn populate_handle(
        &self,
        host: &mut dyn Host,
        handle: Handle,
        node: &mut SerializedNode,
        transcript: &mut Transcript,
    ) -> Result<bool> {
        let target = self.redirect_to_component(host, handle, node, transcript);
        let mut copy = host
            .checkout(target)
            .map_err(Report::new)
            .attach(format!("Populating object '{target}'"))?;

        let applied = self.populate(host, copy.as_mut(), node, transcript);
        if applied {
            host.apply(target, copy)
                .map_err(Report::new)
                .attach(format!("Committing object '{target}'"))?;
            debug!(handle = %target, "Committed populated object");
        }
        Ok(applied)
    }

    fn redirect_to_component(
        &self,
        host: &dyn Host,
        handle: Handle,
        node: &SerializedNode,
        transcript: &mut Transcript,
    ) -> Handle {
        if node.type_name.is_empty() {
            return handle;
        }
        let wanted = node.type_name.as_str();
        let info_of = |handle: Handle| {
            host.resolve(handle)
                .and_then(|obj| self.types.get(obj.type_name().as_str()))
                .map(TypeRegistration::info)
        };

        let Some(entity) = info_of(handle) else {
            return handle;
        };
        if entity.ownership != Ownership::HostContainer
            || entity.name.matches(wanted)
            || node.type_name.matches(entity.name.as_str())
        {
            return handle;
        }

        let component = host.attached(handle).into_iter().find(|component| {
            info_of(*component).is_some_and(|info| {
                info.name.matches(wanted) || info.bases.iter().any(|base| base.matches(wanted))
            })
        });
        match component {
            Some(component) => {
                transcript.warning(
                    0,
                    format!(
                        "'{wanted}' is a component of entity '{handle}'. Populating component '{component}' instead."
                    ),
                );
                component
            },
            None => handle,
        }
    }

    /// Build a fresh value of `node.type_name` (or `declared` when the node has none)
    ///
    /// Host-owned types are resolved by the reference in `value`. An explicit `null` yields
    /// `None` unless the type itself accepts null. Any error line produced while populating the
    /// new value fails the whole call.
    pub fn deserialize(
        &self,
        host: &mut dyn Host,
        node: &SerializedNode,
        declared: &TypeName,
        transcript: &mut Transcript,
    ) -> Result<Option<Box<dyn Reflect>>> {
        let type_name = if node.type_name.is_empty() {
            declared
        } else {
            &node.type_name
        };
        let info = self.types.info(type_name.as_str())?;

        if info.is_host_owned() {
            let Some(reference) = node.object_ref() else {
                if node.value.is_none() || node.is_explicit_null() {
                    return Ok(None);
                }
                return Err(Report::new(Error::invalid(
                    "reference",
                    format!("'{}' is host-owned and must be passed as {{\"handle\": <id>}}", info.name),
                )));
            };
            if reference.is_null() {
                return Ok(None);
            }
            return host.checkout(reference.handle).map(Some).map_err(Report::new);
        }

        if node.is_explicit_null() {
            return Ok(self.types.get(info.name.as_str()).and_then(|registration| {
                let mut obj = registration.create()?;
                obj.set_json(&Value::Null).ok().map(|()| obj)
            }));
        }

        let mut obj = self.create_instance(host, &info.name)?;
        if node.is_empty() {
            return Ok(Some(obj));
        }

        let errors_before = transcript.count(LineLevel::Error);
        let mut node = node.clone();
        if node.type_name.is_empty() {
            node.type_name = info.name.clone();
        }
        // relocation is silent for fresh values
        self.populate_with(host, obj.as_mut(), &mut node, transcript, false);
        if transcript.count(LineLevel::Error) > errors_before {
            return Err(Report::new(Error::UnsupportedConversion {
                type_name: info.name.to_string(),
                found:     "a node with invalid entries".to_string(),
            })
            .attach(transcript.render()));
        }
        Ok(Some(obj))
    }

    /// New instance of `type_name` through its convertor's creation hook
    pub fn create_instance(
        &self,
        host: &mut dyn Host,
        type_name: &TypeName,
    ) -> Result<Box<dyn Reflect>> {
        let info = self.types.info(type_name.as_str())?;
        self.convertors
            .resolve(info)
            .create_instance(self, host, info)
    }
}
