use heck::ToSnakeCase;

use super::Convertor;
use super::HostObjectConvertor;
use super::Priority;
use crate::constants::COMPONENT_NAME_PREFIX;
use crate::marshal::PopulateCx;
use crate::marshal::SerializeCx;
use crate::node::SerializedNode;
use crate::reflect::Handle;
use crate::reflect::Reflect;
use crate::reflect::TypeInfo;
use crate::reflect::TypeName;

/// Host-owned entities that carry attached components
///
/// Serializes each attached component as a synthetic `component_<i>` field and routes field
/// entries that are not declared members to the matching component.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostContainerConvertor;

/// How a component entry was located
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Located {
    ByHandle(Handle),
    ByIndex(Handle),
    ByType(Handle),
}

impl Located {
    const fn handle(self) -> Handle {
        match self {
            Self::ByHandle(handle) | Self::ByIndex(handle) | Self::ByType(handle) => handle,
        }
    }
}

impl HostContainerConvertor {
    /// Find the attached component an entry targets: handle, then index, then type name
    fn locate(
        cx: &PopulateCx<'_>,
        entity: Handle,
        entry: &SerializedNode,
    ) -> Result<Located, String> {
        let attached = cx.host.attached(entity);

        if let Some(reference) = entry.object_ref().filter(|r| !r.is_null()) {
            return attached
                .iter()
                .find(|handle| **handle == reference.handle)
                .map(|handle| Located::ByHandle(*handle))
                .ok_or_else(|| {
                    format!(
                        "Component with handle '{}' is not attached to entity '{entity}'.",
                        reference.handle
                    )
                });
        }

        if let Some(index) = entry.positional_index() {
            return attached
                .get(index)
                .map(|handle| Located::ByIndex(*handle))
                .ok_or_else(|| {
                    format!(
                        "Component index {index} is out of range, entity '{entity}' has {} component(s).",
                        attached.len()
                    )
                });
        }

        if !entry.type_name.is_empty() {
            let wanted = entry.type_name.as_str();
            return attached
                .iter()
                .find(|handle| {
                    cx.host.resolve(**handle).is_some_and(|component| {
                        cx.reflector
                            .types()
                            .get(component.type_name().as_str())
                            .is_some_and(|registration| {
                                let info = registration.info();
                                info.name.matches(wanted)
                                    || info.bases.iter().any(|base| base.matches(wanted))
                            })
                    })
                })
                .map(|handle| Located::ByType(*handle))
                .ok_or_else(|| {
                    format!("No component of type '{wanted}' is attached to entity '{entity}'.")
                });
        }

        Err(format!(
            "No valid criteria to locate a component on entity '{entity}'. Provide a handle in 'value', a '{COMPONENT_NAME_PREFIX}<i>' name or a 'typeName'."
        ))
    }

    /// Populate, detach or reject one component entry
    fn populate_component(
        cx: &mut PopulateCx<'_>,
        entity: Handle,
        entry: &mut SerializedNode,
        depth: usize,
    ) -> bool {
        let located = match Self::locate(cx, entity, entry) {
            Ok(located) => located,
            Err(message) => {
                cx.transcript.error(depth, message);
                return false;
            },
        };
        let handle = located.handle();

        let clears = entry.is_explicit_null() || entry.object_ref().is_some_and(|r| r.is_null());
        if clears && !matches!(located, Located::ByHandle(_)) {
            return match cx.host.detach(entity, handle) {
                Ok(()) => {
                    cx.transcript.success(
                        depth,
                        format!("Component '{handle}' detached from entity '{entity}'."),
                    );
                    true
                },
                Err(error) => {
                    cx.transcript.error(depth, error.to_string());
                    false
                },
            };
        }

        cx.populate_live(handle, entry, depth)
    }

    /// True when `name` addresses a declared field of the entity itself
    fn is_member_entry(info: &TypeInfo, entry: &SerializedNode) -> bool {
        entry.name.as_deref().is_some_and(|name| {
            info.members().iter().any(|member| {
                member.name == name || member.name.to_snake_case() == name.to_snake_case()
            })
        })
    }
}

impl Convertor for HostContainerConvertor {
    fn name(&self) -> &'static str { "host_container" }

    fn priority(&self, info: &TypeInfo) -> Option<Priority> {
        (info.ownership == crate::reflect::Ownership::HostContainer).then(Priority::exact)
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
        let mut node = HostObjectConvertor::serialize_object(cx, obj, info, name, recursive, depth);
        if !recursive {
            return node;
        }
        let Some(entity) = obj.instance_handle() else {
            return node;
        };

        let host = cx.host;
        for (index, handle) in host.attached(entity).into_iter().enumerate() {
            let component_name = format!("{COMPONENT_NAME_PREFIX}{index}");
            let component = host.resolve(handle);
            if component.is_none() {
                cx.transcript.warning(
                    depth + 1,
                    format!("Attached component '{handle}' could not be resolved."),
                );
            }
            let child = cx.serialize(
                component,
                &TypeName::unknown(),
                Some(&component_name),
                true,
                depth + 1,
            );
            node.fields.push(child);
        }
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
        if !HostObjectConvertor::prepare(cx, obj, info, node, &self.restricted_keys(info), depth)
        {
            return false;
        }
        if node.is_leaf() {
            cx.transcript
                .warning(depth, format!("Nothing to populate for '{}'.", info.name));
            return false;
        }

        let (member_fields, mut component_fields): (Vec<_>, Vec<_>) =
            std::mem::take(&mut node.fields)
                .into_iter()
                .partition(|entry| Self::is_member_entry(info, entry));

        let mut applied = false;
        if !member_fields.is_empty() || !node.props.is_empty() {
            let mut members = SerializedNode {
                fields: member_fields,
                props: std::mem::take(&mut node.props),
                ..SerializedNode::composite(info.name.clone(), node.name.as_deref())
            };
            applied |= cx.populate_members(obj, info, &mut members, depth);
            node.props = members.props;
            node.fields = members.fields;
        }

        match obj.instance_handle() {
            Some(entity) => {
                for entry in &mut component_fields {
                    applied |= Self::populate_component(cx, entity, entry, depth + 1);
                }
            },
            None if !component_fields.is_empty() => {
                cx.transcript.error(
                    depth,
                    format!("'{}' has no handle, its components cannot be located.", info.name),
                );
            },
            None => {},
        }
        node.fields.extend(component_fields);
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_entry_detection_is_case_lenient() {
        let info = TypeInfo::composite("scene::Entity", vec![
            crate::reflect::MemberInfo::field("name", TypeName::from("String")),
            crate::reflect::MemberInfo::field("isActive", TypeName::from("bool")),
        ]);
        let entry = |name: &str| SerializedNode::default().named(name);
        assert!(HostContainerConvertor::is_member_entry(&info, &entry("name")));
        assert!(HostContainerConvertor::is_member_entry(&info, &entry("is_active")));
        assert!(!HostContainerConvertor::is_member_entry(&info, &entry("component_0")));
        assert!(!HostContainerConvertor::is_member_entry(
            &info,
            &SerializedNode::default()
        ));
    }

    #[test]
    fn test_located_handle() {
        assert_eq!(Located::ByType(Handle::new(4)).handle(), Handle::new(4));
        assert_eq!(Located::ByIndex(Handle::new(2)).handle(), Handle::new(2));
    }
}
