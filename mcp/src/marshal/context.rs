use error_stack::Report;
use heck::ToSnakeCase;
use strum::IntoEnumIterator;

use super::Reflector;
use super::reconcile;
use crate::error::Error;
use crate::error::Result;
use crate::host::Host;
use crate::node::SerializedNode;
use crate::node::Transcript;
use crate::reflect::Handle;
use crate::reflect::MemberInfo;
use crate::reflect::MemberKind;
use crate::reflect::Reflect;
use crate::reflect::TypeInfo;
use crate::reflect::TypeName;

/// State threaded through one recursive serialization
pub struct SerializeCx<'a> {
    /// Registries and configuration
    pub reflector:  &'a Reflector,
    /// Read access to live host objects
    pub host:       &'a dyn Host,
    /// Diagnostic trail of this call
    pub transcript: &'a mut Transcript,
}

impl SerializeCx<'_> {
    /// Serialize `obj`, or a null leaf of `declared` when there is no object
    ///
    /// The runtime type of a present object wins over the declared type.
    pub fn serialize(
        &mut self,
        obj: Option<&dyn Reflect>,
        declared: &TypeName,
        name: Option<&str>,
        recursive: bool,
        depth: usize,
    ) -> SerializedNode {
        let Some(obj) = obj else {
            return SerializedNode::leaf(declared.clone(), name, serde_json::Value::Null);
        };
        let runtime = obj.type_name();
        let reflector = self.reflector;
        match reflector.types().get(runtime.as_str()) {
            Some(registration) => {
                let info = registration.info();
                reflector
                    .convertors()
                    .resolve(info)
                    .serialize(self, obj, info, name, recursive, depth)
            },
            None => {
                self.transcript.warning(
                    depth,
                    format!("Type '{runtime}' is not registered, using its JSON preview."),
                );
                SerializedNode::leaf(runtime, name, obj.to_json())
            },
        }
    }

    /// Serialize every declared member of `obj` into `node.fields` / `node.props`
    ///
    /// Host-owned members are always written as reference leaves.
    pub fn serialize_members(
        &mut self,
        obj: &dyn Reflect,
        info: &TypeInfo,
        node: &mut SerializedNode,
        depth: usize,
    ) {
        let reflector = self.reflector;
        for member in info.members() {
            let value = obj.member(member.kind, &member.name);
            let nested_host_owned = value
                .and_then(|v| reflector.types().get(v.type_name().as_str()))
                .is_some_and(|registration| registration.info().is_host_owned());
            let child = self.serialize(
                value,
                &member.type_name,
                Some(&member.name),
                !nested_host_owned,
                depth + 1,
            );
            node.entries_mut(member.kind).push(child);
        }
    }
}

/// State threaded through one recursive population
pub struct PopulateCx<'a> {
    /// Registries and configuration
    pub reflector:           &'a Reflector,
    /// Read/write access to live host objects
    pub host:                &'a mut dyn Host,
    /// Diagnostic trail of this call
    pub transcript:          &'a mut Transcript,
    /// Warn when member keys are moved out of a value composite's `value`
    pub relocation_warnings: bool,
}

impl PopulateCx<'_> {
    /// Apply `node` onto `obj` through the convertor of its runtime type
    pub fn populate(
        &mut self,
        obj: &mut dyn Reflect,
        node: &mut SerializedNode,
        depth: usize,
    ) -> bool {
        let runtime = obj.type_name();
        let reflector = self.reflector;
        let Some(registration) = reflector.types().get(runtime.as_str()) else {
            self.transcript
                .error(depth, Error::TypeNotFound(runtime.to_string()).to_string());
            return false;
        };
        let info = registration.info();

        if !node.type_name.is_empty() && !Self::accepts(info, &node.type_name) {
            self.transcript.error(
                depth,
                format!(
                    "Type mismatch: '{}' cannot be applied to '{}'.",
                    node.type_name, info.name
                ),
            );
            return false;
        }

        reflector
            .convertors()
            .resolve(info)
            .populate(self, obj, info, node, depth)
    }

    /// True when a node declaring `requested` may target an instance of `info`
    fn accepts(info: &TypeInfo, requested: &TypeName) -> bool {
        info.name.matches(requested.as_str())
            || requested.matches(info.name.as_str())
            || info.bases.iter().any(|base| base.matches(requested.as_str()))
    }

    /// Apply every `fields` / `props` entry of `node` onto the matching member of `obj`
    ///
    /// Entries fail independently; returns true when at least one entry applied.
    pub fn populate_members(
        &mut self,
        obj: &mut dyn Reflect,
        info: &TypeInfo,
        node: &mut SerializedNode,
        depth: usize,
    ) -> bool {
        let mut applied = false;
        for kind in MemberKind::iter() {
            let mut entries = std::mem::take(node.entries_mut(kind));
            for entry in &mut entries {
                applied |= self.populate_member(obj, info, kind, entry, depth + 1);
            }
            *node.entries_mut(kind) = entries;
        }
        applied
    }

    fn populate_member(
        &mut self,
        obj: &mut dyn Reflect,
        info: &TypeInfo,
        kind: MemberKind,
        entry: &mut SerializedNode,
        depth: usize,
    ) -> bool {
        let Some(name) = entry.name.clone() else {
            self.transcript.error(
                depth,
                format!(
                    "An entry in '{}' of '{}' has no name.",
                    kind.node_key(),
                    info.name
                ),
            );
            return false;
        };
        let Some(member) = find_member(info, kind, &name) else {
            let kind_label = match kind {
                MemberKind::Field => "Field",
                MemberKind::Property => "Property",
            };
            self.transcript.error(
                depth,
                format!("{kind_label} '{name}' not found on '{}'.", info.name),
            );
            return false;
        };
        if member.kind != kind {
            self.transcript.warning(
                depth,
                format!(
                    "'{name}' is a {} of '{}', not a {kind}. Applying it anyway.",
                    member.kind, info.name
                ),
            );
        }
        let Some(target) = obj.member_mut(member.kind, &member.name) else {
            self.transcript.error(
                depth,
                format!("'{name}' of '{}' is not accessible.", info.name),
            );
            return false;
        };
        if let Some(handle) = self.live_handle(target) {
            return self.populate_live(handle, entry, depth);
        }
        self.populate(target, entry, depth)
    }

    /// Handle of a host-owned value; its embedded copy is not the object to change
    fn live_handle(&self, obj: &dyn Reflect) -> Option<Handle> {
        let host_owned = self
            .reflector
            .types()
            .get(obj.type_name().as_str())
            .is_some_and(|registration| registration.info().is_host_owned());
        obj.instance_handle()
            .filter(|handle| host_owned && !handle.is_null())
    }

    /// Populate a checked-out copy of the host object behind `handle` and commit it
    pub fn populate_live(
        &mut self,
        handle: Handle,
        node: &mut SerializedNode,
        depth: usize,
    ) -> bool {
        let mut copy = match self.host.checkout(handle) {
            Ok(copy) => copy,
            Err(error) => {
                self.transcript.error(depth, error.to_string());
                return false;
            },
        };
        if !self.populate(copy.as_mut(), node, depth) {
            return false;
        }
        match self.host.apply(handle, copy) {
            Ok(()) => true,
            Err(error) => {
                self.transcript.error(depth, error.to_string());
                false
            },
        }
    }

    /// Value-body reconciliation, see [`reconcile::reconcile`]
    pub fn reconcile(
        &mut self,
        node: &mut SerializedNode,
        info: &TypeInfo,
        restricted: &[String],
        warn: bool,
        depth: usize,
    ) -> bool {
        reconcile::reconcile(node, info, restricted, warn, depth, self.transcript)
    }

    /// Fresh default instance of a value type
    pub fn create_value(&self, type_name: &TypeName) -> Result<Box<dyn Reflect>> {
        let registration = self.reflector.types().get(type_name.as_str()).ok_or_else(|| {
            Report::new(Error::TypeNotFound(type_name.to_string()))
        })?;
        registration.create().ok_or_else(|| {
            Report::new(Error::UnsupportedConversion {
                type_name: type_name.to_string(),
                found:     "a request for a new element without a default".to_string(),
            })
        })
    }
}

/// Exact name in the requested kind, then in the other kind, then ignoring case style
fn find_member<'i>(info: &'i TypeInfo, kind: MemberKind, name: &str) -> Option<&'i MemberInfo> {
    let members = info.members();
    members
        .iter()
        .find(|m| m.kind == kind && m.name == name)
        .or_else(|| members.iter().find(|m| m.name == name))
        .or_else(|| {
            let wanted = name.to_snake_case();
            members
                .iter()
                .find(|m| m.kind == kind && m.name.to_snake_case() == wanted)
                .or_else(|| members.iter().find(|m| m.name.to_snake_case() == wanted))
        })
}
