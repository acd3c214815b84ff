//! `Reflect` / `Typed` for primitives, `String`, `Option<T>`, `Vec<T>` and references

use std::any::Any;

use serde_json::Value;

use super::Handle;
use super::ObjectRef;
use super::Primitive;
use super::Reflect;
use super::Shape;
use super::TypeInfo;
use super::TypeKind;
use super::TypeName;
use super::TypeRegistration;
use super::TypeRegistry;
use super::Typed;
use crate::error::Error;

/// Crate prefix used by the built-in reference types
const BUILTIN_NAMESPACE: &str = "reflect_mcp";

macro_rules! reflect_leaf_boilerplate {
    () => {
        fn type_name(&self) -> TypeName { <Self as Typed>::type_name_of() }

        fn shape(&self) -> Shape { Shape::Leaf }

        fn as_any(&self) -> &dyn Any { self }

        fn as_any_mut(&mut self) -> &mut dyn Any { self }

        fn into_any(self: Box<Self>) -> Box<dyn Any> { self }

        fn clone_reflect(&self) -> Box<dyn Reflect> { Box::new(self.clone()) }
    };
}

/// Integers arrive as JSON numbers or as numeric strings
fn integer_from_json(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn number_from_json(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

macro_rules! impl_integer {
    ($($ty:ty),* $(,)?) => {$(
        impl Reflect for $ty {
            reflect_leaf_boilerplate!();

            fn to_json(&self) -> Value { Value::from(*self) }

            fn set_json(&mut self, value: &Value) -> Result<(), Error> {
                *self = integer_from_json(value)
                    .and_then(|n| <$ty>::try_from(n).ok())
                    .ok_or_else(|| Error::unsupported(stringify!($ty), value))?;
                Ok(())
            }
        }

        impl Typed for $ty {
            fn type_name_of() -> TypeName { TypeName::from(stringify!($ty)) }

            fn type_info() -> TypeInfo { TypeInfo::primitive(stringify!($ty), Primitive::Integer) }

            fn registration() -> TypeRegistration { TypeRegistration::with_default::<Self>() }
        }
    )*};
}

impl_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Reflect for f64 {
    reflect_leaf_boilerplate!();

    fn to_json(&self) -> Value { Value::from(*self) }

    fn set_json(&mut self, value: &Value) -> Result<(), Error> {
        *self = number_from_json(value).ok_or_else(|| Error::unsupported("f64", value))?;
        Ok(())
    }
}

impl Typed for f64 {
    fn type_name_of() -> TypeName { TypeName::from("f64") }

    fn type_info() -> TypeInfo { TypeInfo::primitive("f64", Primitive::Number) }

    fn registration() -> TypeRegistration { TypeRegistration::with_default::<Self>() }
}

impl Reflect for f32 {
    reflect_leaf_boilerplate!();

    fn to_json(&self) -> Value { Value::from(*self) }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "JSON numbers are f64; narrowing to f32 is the requested conversion"
    )]
    fn set_json(&mut self, value: &Value) -> Result<(), Error> {
        *self = number_from_json(value).ok_or_else(|| Error::unsupported("f32", value))? as Self;
        Ok(())
    }
}

impl Typed for f32 {
    fn type_name_of() -> TypeName { TypeName::from("f32") }

    fn type_info() -> TypeInfo { TypeInfo::primitive("f32", Primitive::Number) }

    fn registration() -> TypeRegistration { TypeRegistration::with_default::<Self>() }
}

impl Reflect for bool {
    reflect_leaf_boilerplate!();

    fn to_json(&self) -> Value { Value::Bool(*self) }

    fn set_json(&mut self, value: &Value) -> Result<(), Error> {
        *self = match value {
            Value::Bool(b) => *b,
            Value::String(s) if s.eq_ignore_ascii_case("true") => true,
            Value::String(s) if s.eq_ignore_ascii_case("false") => false,
            _ => return Err(Error::unsupported("bool", value)),
        };
        Ok(())
    }
}

impl Typed for bool {
    fn type_name_of() -> TypeName { TypeName::from("bool") }

    fn type_info() -> TypeInfo { TypeInfo::primitive("bool", Primitive::Boolean) }

    fn registration() -> TypeRegistration { TypeRegistration::with_default::<Self>() }
}

impl Reflect for String {
    reflect_leaf_boilerplate!();

    fn to_json(&self) -> Value { Value::String(self.clone()) }

    fn set_json(&mut self, value: &Value) -> Result<(), Error> {
        match value {
            Value::String(s) => s.clone_into(self),
            Value::Number(n) => *self = n.to_string(),
            Value::Bool(b) => *self = b.to_string(),
            _ => return Err(Error::unsupported("String", value)),
        }
        Ok(())
    }
}

impl Typed for String {
    fn type_name_of() -> TypeName { TypeName::from("String") }

    fn type_info() -> TypeInfo { TypeInfo::primitive("String", Primitive::String) }

    fn registration() -> TypeRegistration { TypeRegistration::with_default::<Self>() }
}

impl Reflect for Handle {
    reflect_leaf_boilerplate!();

    fn to_json(&self) -> Value { Value::from(self.id()) }

    fn set_json(&mut self, value: &Value) -> Result<(), Error> {
        *self = ObjectRef::from_value(value)
            .map(|reference| reference.handle)
            .ok_or_else(|| Error::unsupported(self.type_name(), value))?;
        Ok(())
    }
}

impl Typed for Handle {
    fn type_name_of() -> TypeName { TypeName::from(format!("{BUILTIN_NAMESPACE}::Handle")) }

    fn type_info() -> TypeInfo {
        TypeInfo::reference(Self::type_name_of())
            .with_description("Integer handle of a host-owned object, 0 for null")
    }

    fn registration() -> TypeRegistration { TypeRegistration::with_default::<Self>() }
}

impl Reflect for ObjectRef {
    reflect_leaf_boilerplate!();

    fn to_json(&self) -> Value { self.to_value() }

    fn set_json(&mut self, value: &Value) -> Result<(), Error> {
        *self = Self::from_value(value).ok_or_else(|| Error::unsupported(self.type_name(), value))?;
        Ok(())
    }
}

impl Typed for ObjectRef {
    fn type_name_of() -> TypeName { TypeName::from(format!("{BUILTIN_NAMESPACE}::ObjectRef")) }

    fn type_info() -> TypeInfo {
        TypeInfo::reference(Self::type_name_of())
            .with_description("Reference to a host-owned object by handle")
    }

    fn registration() -> TypeRegistration { TypeRegistration::with_default::<Self>() }
}

/// Optional value; `null` clears it and anything else fills it
impl<T: Typed + Default + Clone> Reflect for Option<T> {
    reflect_leaf_boilerplate!();

    fn to_json(&self) -> Value { self.as_ref().map_or(Value::Null, Reflect::to_json) }

    fn set_json(&mut self, value: &Value) -> Result<(), Error> {
        if value.is_null() {
            *self = None;
            return Ok(());
        }
        let mut inner = self.clone().unwrap_or_default();
        inner.set_json(value)?;
        *self = Some(inner);
        Ok(())
    }

    fn inner_value(&self) -> Option<&dyn Reflect> {
        self.as_ref().map(|inner| inner as &dyn Reflect)
    }

    fn inner_value_mut(&mut self) -> Option<&mut dyn Reflect> {
        Some(self.get_or_insert_with(T::default) as &mut dyn Reflect)
    }
}

impl<T: Typed + Default + Clone> Typed for Option<T> {
    fn type_name_of() -> TypeName { TypeName::from(format!("Option<{}>", T::type_name_of())) }

    fn type_info() -> TypeInfo {
        let inner = T::type_info();
        let info = TypeInfo::optional(Self::type_name_of(), inner.name);
        match inner.description {
            Some(description) => info.with_description(description),
            None => info,
        }
    }

    fn registration() -> TypeRegistration { TypeRegistration::with_default::<Self>() }

    fn register_dependencies(registry: &mut TypeRegistry) { registry.register::<T>(); }
}

impl<T: Typed + Clone> Reflect for Vec<T> {
    fn type_name(&self) -> TypeName { <Self as Typed>::type_name_of() }

    fn shape(&self) -> Shape { Shape::Sequence }

    fn as_any(&self) -> &dyn Any { self }

    fn as_any_mut(&mut self) -> &mut dyn Any { self }

    fn into_any(self: Box<Self>) -> Box<dyn Any> { self }

    fn clone_reflect(&self) -> Box<dyn Reflect> { Box::new(self.clone()) }

    fn element_count(&self) -> usize { self.len() }

    fn element(&self, index: usize) -> Option<&dyn Reflect> {
        self.get(index).map(|element| element as &dyn Reflect)
    }

    fn element_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        self.get_mut(index).map(|element| element as &mut dyn Reflect)
    }

    fn push_element(&mut self, element: Box<dyn Reflect>) -> Result<(), Error> {
        let found = element.type_name();
        match element.into_any().downcast::<T>() {
            Ok(element) => {
                self.push(*element);
                Ok(())
            },
            Err(_) => Err(Error::UnsupportedConversion {
                type_name: self.type_name().to_string(),
                found:     format!("element of type '{found}'"),
            }),
        }
    }

    fn truncate_elements(&mut self, len: usize) { self.truncate(len); }
}

impl<T: Typed + Clone> Typed for Vec<T> {
    fn type_name_of() -> TypeName { TypeName::from(format!("Vec<{}>", T::type_name_of())) }

    fn type_info() -> TypeInfo { TypeInfo::sequence(Self::type_name_of(), T::type_name_of()) }

    fn registration() -> TypeRegistration { TypeRegistration::with_default::<Self>() }

    fn register_dependencies(registry: &mut TypeRegistry) { registry.register::<T>(); }
}

pub(super) fn register_builtins(registry: &mut TypeRegistry) {
    registry.register::<i8>();
    registry.register::<i16>();
    registry.register::<i32>();
    registry.register::<i64>();
    registry.register::<isize>();
    registry.register::<u8>();
    registry.register::<u16>();
    registry.register::<u32>();
    registry.register::<u64>();
    registry.register::<usize>();
    registry.register::<f32>();
    registry.register::<f64>();
    registry.register::<bool>();
    registry.register::<String>();
    registry.register::<Handle>();
    registry.register::<ObjectRef>();
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_integer_conversions() {
        let mut value = 0_u8;
        assert!(value.set_json(&json!(200)).is_ok());
        assert_eq!(value, 200);
        assert!(value.set_json(&json!(300)).is_err());
        assert!(value.set_json(&json!("42")).is_ok());
        assert_eq!(value, 42);
        assert!(value.set_json(&json!(1.5)).is_err());
    }

    #[test]
    fn test_float_and_bool() {
        let mut number = 0.0_f32;
        assert!(number.set_json(&json!(2.5)).is_ok());
        assert!((number - 2.5).abs() < f32::EPSILON);

        let mut flag = false;
        assert!(flag.set_json(&json!("TRUE")).is_ok());
        assert!(flag);
        assert!(flag.set_json(&json!(1)).is_err());
    }

    #[test]
    fn test_option_null_clears() {
        let mut value = Some(3_i32);
        assert!(value.set_json(&Value::Null).is_ok());
        assert_eq!(value, None);
        assert!(value.set_json(&json!(9)).is_ok());
        assert_eq!(value, Some(9));
        assert_eq!(Option::<i32>::type_name_of().as_str(), "Option<i32>");
    }

    #[test]
    fn test_option_exposes_its_inner_value() {
        let mut tags: Option<Vec<String>> = None;
        assert!(tags.inner_value().is_none());
        let inner = tags.inner_value_mut().map(|inner| inner.type_name());
        assert_eq!(inner, Some(TypeName::from("Vec<String>")));
        assert_eq!(tags, Some(Vec::new()));
        assert_eq!(Option::<Vec<String>>::type_info().kind, TypeKind::Optional {
            inner: TypeName::from("Vec<String>"),
        });
    }

    #[test]
    fn test_vec_elements() {
        let mut values = vec![1_i32, 2];
        assert_eq!(values.to_json(), json!([1, 2]));
        assert!(values.push_element(Box::new(3_i32)).is_ok());
        assert!(values.push_element(Box::new(String::from("x"))).is_err());
        values.truncate_elements(1);
        assert_eq!(values, vec![1]);
        assert_eq!(Vec::<i32>::type_info().kind, TypeKind::Sequence {
            item: TypeName::from("i32"),
        });
    }

    #[test]
    fn test_object_ref_leaf() {
        let mut reference = ObjectRef::null();
        assert!(reference.set_json(&json!({"handle": 5, "kind": "Light"})).is_ok());
        assert_eq!(reference.handle, Handle::new(5));
        assert_eq!(reference.to_json(), json!({"handle": 5, "kind": "Light"}));
        assert!(reference.set_json(&json!("five")).is_err());
    }
}
