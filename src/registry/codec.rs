//! Type definitions and JSON → typed value construction.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::registry::{RegistryError, RegistryResult, TypeRegistry};
use crate::rpc::types::ChainType;

/// Built-in scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Bool,
    Unsigned(u32),
    Signed(u32),
    Text,
}

/// How a registered name is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDef {
    Primitive(Primitive),
    /// Ordered (field name, field type) pairs.
    Struct(Vec<(String, String)>),
    /// (variant name, optional payload type) pairs.
    Enum(Vec<(String, Option<String>)>),
}

/// A value built against a registered type.
///
/// Serializes back to the JSON shape it was built from; integers beyond
/// 64 bits become decimal strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    Bool(bool),
    Unsigned(u128),
    Signed(i128),
    Text(String),
    Option(Option<Box<TypedValue>>),
    Vec(Vec<TypedValue>),
    Struct(Vec<(String, TypedValue)>),
    Enum {
        variant: String,
        value: Option<Box<TypedValue>>,
    },
}

impl TypedValue {
    pub fn as_u128(&self) -> Option<u128> {
        match self {
            TypedValue::Unsigned(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Field of a struct value.
    pub fn field(&self, name: &str) -> Option<&TypedValue> {
        match self {
            TypedValue::Struct(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Variant name of an enum value.
    pub fn variant(&self) -> Option<&str> {
        match self {
            TypedValue::Enum { variant, .. } => Some(variant),
            _ => None,
        }
    }
}

impl Serialize for TypedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TypedValue::Bool(b) => serializer.serialize_bool(*b),
            TypedValue::Unsigned(v) => match u64::try_from(*v) {
                Ok(small) => serializer.serialize_u64(small),
                Err(_) => serializer.collect_str(v),
            },
            TypedValue::Signed(v) => match i64::try_from(*v) {
                Ok(small) => serializer.serialize_i64(small),
                Err(_) => serializer.collect_str(v),
            },
            TypedValue::Text(s) => serializer.serialize_str(s),
            TypedValue::Option(Some(inner)) => serializer.serialize_some(inner.as_ref()),
            TypedValue::Option(None) => serializer.serialize_none(),
            TypedValue::Vec(items) => serializer.collect_seq(items),
            TypedValue::Struct(fields) => {
                serializer.collect_map(fields.iter().map(|(name, value)| (name, value)))
            }
            TypedValue::Enum {
                variant,
                value: None,
            } => serializer.serialize_str(variant),
            TypedValue::Enum {
                variant,
                value: Some(inner),
            } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(variant, inner.as_ref())?;
                map.end()
            }
        }
    }
}

impl TryFrom<&TypedValue> for ChainType {
    type Error = RegistryError;

    fn try_from(value: &TypedValue) -> Result<Self, Self::Error> {
        let invalid = |reason: &str| RegistryError::InvalidValue {
            ty: "ChainType".into(),
            reason: reason.into(),
        };
        match value {
            TypedValue::Enum { variant, value } => match variant.as_str() {
                "Development" => Ok(ChainType::Development),
                "Local" => Ok(ChainType::Local),
                "Live" => Ok(ChainType::Live),
                "Custom" => value
                    .as_deref()
                    .and_then(TypedValue::as_str)
                    .map(|name| ChainType::Custom(name.to_owned()))
                    .ok_or_else(|| invalid("Custom requires a name")),
                other => Err(invalid(&format!("unknown variant '{other}'"))),
            },
            _ => Err(invalid("expected an enum value")),
        }
    }
}

pub(crate) fn builtins() -> Vec<(&'static str, TypeDef)> {
    let mut defs = vec![
        ("bool", TypeDef::Primitive(Primitive::Bool)),
        ("Text", TypeDef::Primitive(Primitive::Text)),
        ("String", TypeDef::Primitive(Primitive::Text)),
        (
            "ChainType",
            TypeDef::Enum(vec![
                ("Development".into(), None),
                ("Local".into(), None),
                ("Live".into(), None),
                ("Custom".into(), Some("Text".into())),
            ]),
        ),
    ];
    for (name, bits) in [("u8", 8), ("u16", 16), ("u32", 32), ("u64", 64), ("u128", 128)] {
        defs.push((name, TypeDef::Primitive(Primitive::Unsigned(bits))));
    }
    for (name, bits) in [("i8", 8), ("i16", 16), ("i32", 32), ("i64", 64), ("i128", 128)] {
        defs.push((name, TypeDef::Primitive(Primitive::Signed(bits))));
    }
    defs
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wrapper {
    Option,
    Vec,
}

/// `Option<T>` / `Vec<T>` → (wrapper, `T`).
pub(crate) fn split_generic(name: &str) -> Option<(Wrapper, &str)> {
    let (outer, rest) = name.split_once('<')?;
    let inner = rest.strip_suffix('>')?.trim();
    let wrapper = match outer.trim() {
        "Option" => Wrapper::Option,
        "Vec" => Wrapper::Vec,
        _ => return None,
    };
    Some((wrapper, inner))
}

fn invalid(ty: &str, reason: impl Into<String>) -> RegistryError {
    RegistryError::InvalidValue {
        ty: ty.to_owned(),
        reason: reason.into(),
    }
}

pub(crate) fn build(registry: &TypeRegistry, name: &str, value: &Value) -> RegistryResult<TypedValue> {
    if let Some((wrapper, inner)) = split_generic(name) {
        return match wrapper {
            Wrapper::Option if value.is_null() => Ok(TypedValue::Option(None)),
            Wrapper::Option => Ok(TypedValue::Option(Some(Box::new(build(
                registry, inner, value,
            )?)))),
            Wrapper::Vec => value
                .as_array()
                .ok_or_else(|| invalid(name, "expected an array"))?
                .iter()
                .map(|item| build(registry, inner, item))
                .collect::<RegistryResult<Vec<_>>>()
                .map(TypedValue::Vec),
        };
    }

    let def = registry
        .lookup(name)
        .ok_or_else(|| RegistryError::UnknownType(name.to_owned()))?;

    match def {
        TypeDef::Primitive(kind) => build_primitive(name, kind, value),
        TypeDef::Struct(fields) => {
            let object = value
                .as_object()
                .ok_or_else(|| invalid(name, "expected an object"))?;
            let mut built = Vec::with_capacity(fields.len());
            for (field, ty) in fields {
                let field_value = match object.get(&field) {
                    Some(v) => build(registry, &ty, v)?,
                    None if matches!(split_generic(&ty), Some((Wrapper::Option, _))) => {
                        TypedValue::Option(None)
                    }
                    None => return Err(invalid(name, format!("missing field '{field}'"))),
                };
                built.push((field, field_value));
            }
            Ok(TypedValue::Struct(built))
        }
        TypeDef::Enum(variants) => {
            let (variant, payload) = match value {
                Value::String(s) => (s.as_str(), None),
                Value::Object(map) if map.len() == 1 => {
                    let (k, v) = map.iter().next().ok_or_else(|| invalid(name, "empty object"))?;
                    (k.as_str(), Some(v))
                }
                _ => return Err(invalid(name, "expected a variant name or {variant: value}")),
            };
            let (_, payload_ty) = variants
                .iter()
                .find(|(v, _)| v == variant)
                .ok_or_else(|| invalid(name, format!("unknown variant '{variant}'")))?;
            let value = match (payload_ty, payload) {
                (None, None) => None,
                (Some(ty), Some(v)) => Some(Box::new(build(registry, ty, v)?)),
                (Some(_), None) => return Err(invalid(name, format!("'{variant}' needs a value"))),
                (None, Some(_)) => return Err(invalid(name, format!("'{variant}' takes no value"))),
            };
            Ok(TypedValue::Enum {
                variant: variant.to_owned(),
                value,
            })
        }
    }
}

fn build_primitive(name: &str, kind: Primitive, value: &Value) -> RegistryResult<TypedValue> {
    match kind {
        Primitive::Bool => value
            .as_bool()
            .map(TypedValue::Bool)
            .ok_or_else(|| invalid(name, "expected a boolean")),
        Primitive::Text => value
            .as_str()
            .map(|s| TypedValue::Text(s.to_owned()))
            .ok_or_else(|| invalid(name, "expected a string")),
        Primitive::Unsigned(bits) => {
            let parsed = parse_unsigned(value).ok_or_else(|| invalid(name, "expected an unsigned integer"))?;
            if bits < 128 && parsed >> bits != 0 {
                return Err(invalid(name, format!("{parsed} does not fit in {bits} bits")));
            }
            Ok(TypedValue::Unsigned(parsed))
        }
        Primitive::Signed(bits) => {
            let parsed = parse_signed(value).ok_or_else(|| invalid(name, "expected an integer"))?;
            if bits < 128 {
                let bound = 1i128 << (bits - 1);
                if parsed < -bound || parsed >= bound {
                    return Err(invalid(name, format!("{parsed} does not fit in {bits} bits")));
                }
            }
            Ok(TypedValue::Signed(parsed))
        }
    }
}

fn parse_unsigned(value: &Value) -> Option<u128> {
    match value {
        Value::Number(n) => n.as_u64().map(u128::from),
        Value::String(s) => match s.strip_prefix("0x") {
            Some(digits) => u128::from_str_radix(digits, 16).ok(),
            None => s.parse().ok(),
        },
        _ => None,
    }
}

fn parse_signed(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => n.as_i64().map(i128::from),
        Value::String(s) => match s.strip_prefix('-') {
            Some(rest) if !rest.starts_with(['-', '+']) => {
                parse_signed_digits(rest).and_then(i128::checked_neg)
            }
            Some(_) => None,
            None => parse_signed_digits(s),
        },
        _ => None,
    }
}

fn parse_signed_digits(s: &str) -> Option<i128> {
    match s.strip_prefix("0x") {
        Some(digits) => i128::from_str_radix(digits, 16).ok(),
        None => s.parse().ok(),
    }
}
