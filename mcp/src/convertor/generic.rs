use serde_json::Value;

use super::Convertor;
use super::Priority;
use crate::marshal::PopulateCx;
use crate::marshal::SerializeCx;
use crate::node::SerializedNode;
use crate::reflect::Reflect;
use crate::reflect::TypeInfo;

/// Fallback for value composites: walks declared fields and properties
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericObjectConvertor;

impl Convertor for GenericObjectConvertor {
    fn name(&self) -> &'static str { "generic_object" }

    fn priority(&self, _info: &TypeInfo) -> Option<Priority> { Some(Priority::FALLBACK) }

    fn serialize(
        &self,
        cx: &mut SerializeCx<'_>,
        obj: &dyn Reflect,
        info: &TypeInfo,
        name: Option<&str>,
        recursive: bool,
        depth: usize,
    ) -> SerializedNode {
        if !recursive {
            return SerializedNode::leaf(info.name.clone(), name, obj.to_json());
        }
        let mut node = SerializedNode::composite(info.name.clone(), name);
        cx.serialize_members(obj, info, &mut node, depth);
        node
    }

    fn populate(
        &self,
        cx: &mut PopulateCx<'_>,
        obj: &mut dyn Reflect,
        info: &TypeInfo,
        node: &mut SerializedNode,
        depth: usize,
    ) -> bool {
        let restricted = self.restricted_keys(info);
        if !cx.reconcile(node, info, &restricted, cx.relocation_warnings, depth) {
            return false;
        }

        match node.value.take() {
            None => {},
            Some(Value::Object(rest)) => {
                for key in rest.keys() {
                    cx.transcript.warning(
                        depth,
                        format!("'{key}' is not a member of '{}', ignored.", info.name),
                    );
                }
            },
            Some(other) => {
                let error = crate::error::Error::unsupported(&info.name, &other);
                cx.transcript.error(depth, error.to_string());
                return false;
            },
        }

        if node.is_leaf() {
            cx.transcript
                .warning(depth, format!("Nothing to populate for '{}'.", info.name));
            return false;
        }
        cx.populate_members(obj, info, node, depth)
    }
}
