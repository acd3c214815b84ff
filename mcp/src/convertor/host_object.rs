use error_stack::Report;
use error_stack::ResultExt;
use serde_json::Map;
use serde_json::Value;

use super::Convertor;
use super::Priority;
use crate::constants::REF_HANDLE;
use crate::constants::REF_KIND;
use crate::error::Error;
use crate::error::Result;
use crate::host::Host;
use crate::json_object::JsonObjectAccess;
use crate::marshal::PopulateCx;
use crate::marshal::Reflector;
use crate::marshal::SerializeCx;
use crate::node::SerializedNode;
use crate::reflect::ObjectRef;
use crate::reflect::Reflect;
use crate::reflect::TypeInfo;

/// Take `handle` / `kind` out of a value body so reconciliation never relocates them
fn split_reference(node: &mut SerializedNode) -> Option<Map<String, Value>> {
    let Some(Value::Object(body)) = node.value.as_mut() else {
        return None;
    };
    if !body.get_field(REF_HANDLE).is_some_and(Value::is_i64) {
        return None;
    }
    let mut reference = Map::new();
    for key in [REF_HANDLE, REF_KIND] {
        if let Some(value) = body.take_field(key) {
            reference.insert_field(key, value);
        }
    }
    if body.is_empty() {
        node.value = None;
    }
    Some(reference)
}

/// Host-owned objects: referenced by handle, populated member by member, never overwritten
#[derive(Debug, Default, Clone, Copy)]
pub struct HostObjectConvertor;

impl HostObjectConvertor {
    /// Opaque reference for a host-owned instance
    pub(crate) fn reference(obj: &dyn Reflect, info: &TypeInfo) -> ObjectRef {
        obj.instance_handle().map_or_else(ObjectRef::null, |handle| {
            ObjectRef::new(handle, info.name.short_name())
        })
    }

    /// Serialize the host object itself: its reference, plus members when recursive
    pub(crate) fn serialize_object(
        cx: &mut SerializeCx<'_>,
        obj: &dyn Reflect,
        info: &TypeInfo,
        name: Option<&str>,
        recursive: bool,
        depth: usize,
    ) -> SerializedNode {
        let reference = Self::reference(obj, info).to_value();
        let mut node = SerializedNode::leaf(info.name.clone(), name, reference);
        if recursive {
            cx.serialize_members(obj, info, &mut node, depth);
        }
        node
    }

    /// Reconcile the node and check that `value` only identifies this instance
    ///
    /// Returns false when reconciliation failed and the node must not be applied.
    pub(crate) fn prepare(
        cx: &mut PopulateCx<'_>,
        obj: &dyn Reflect,
        info: &TypeInfo,
        node: &mut SerializedNode,
        restricted: &[String],
        depth: usize,
    ) -> bool {
        let reference = split_reference(node);
        let reconciled = cx.reconcile(node, info, restricted, true, depth);
        if let Some(reference) = reference {
            match node.value.as_mut() {
                Some(Value::Object(rest)) => rest.extend(reference),
                _ => node.value = Some(Value::Object(reference)),
            }
        }
        if !reconciled {
            return false;
        }
        if let Some(value) = node.value.as_ref() {
            let identifies_self = ObjectRef::from_value(value).is_some_and(|reference| {
                reference.is_null() || Some(reference.handle) == obj.instance_handle()
            });
            if !identifies_self {
                cx.transcript.warning(
                    depth,
                    format!(
                        "Cannot set value for '{}'. Use 'fields' and 'props' to modify a host-owned object.",
                        info.name
                    ),
                );
            }
        }
        true
    }
}

impl Convertor for HostObjectConvertor {
    fn name(&self) -> &'static str { "host_object" }

    fn priority(&self, info: &TypeInfo) -> Option<Priority> {
        info.is_host_owned().then(|| Priority::base(0))
    }

    fn serialize(
        &self,
        cx: &mut SerializeCx<'_>,
        obj: &dyn Reflect,
        info: &TypeInfo,
        name: Option<&str>,
        recursive: bool,
        depth: usize,
    ) -> SerializedNode {
        Self::serialize_object(cx, obj, info, name, recursive, depth)
    }

    fn populate(
        &self,
        cx: &mut PopulateCx<'_>,
        obj: &mut dyn Reflect,
        info: &TypeInfo,
        node: &mut SerializedNode,
        depth: usize,
    ) -> bool {
        if !Self::prepare(cx, obj, info, node, &self.restricted_keys(info), depth) {
            return false;
        }
        if node.is_leaf() {
            cx.transcript
                .warning(depth, format!("Nothing to populate for '{}'.", info.name));
            return false;
        }
        cx.populate_members(obj, info, node, depth)
    }

    fn create_instance(
        &self,
        _reflector: &Reflector,
        host: &mut dyn Host,
        info: &TypeInfo,
    ) -> Result<Box<dyn Reflect>> {
        let handle = host
            .create(&info.name)
            .map_err(Report::new)
            .attach(format!("Creating a new '{}'", info.name))?;
        host.checkout(handle)
            .map_err(Report::new)
            .change_context(Error::failed_to("create", &info.name))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_reference_is_split_from_member_keys() {
        let mut node = SerializedNode::leaf(
            "scene::Light",
            None,
            json!({ "handle": 3, "kind": "Light", "intensity": 2.0 }),
        );
        let reference = split_reference(&mut node);
        assert_eq!(reference.map(Value::Object), Some(json!({ "handle": 3, "kind": "Light" })));
        assert_eq!(node.value, Some(json!({ "intensity": 2.0 })));

        let mut only_members = SerializedNode::leaf("scene::Light", None, json!({ "kind": "Spot" }));
        assert!(split_reference(&mut only_members).is_none());
        assert_eq!(only_members.value, Some(json!({ "kind": "Spot" })));
    }
}
