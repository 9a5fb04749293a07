//! # Type Reference Resolution
//!
//! Maps schema shapes onto the flat type names the SDK backends emit.
//! Wrapper naming (maps, optionals) is derived from display names so that
//! `MapOf` + `Long` and `Optional` + `LongArray` come out the same way in
//! every backend.

use crate::error::{AppError, AppResult};
use crate::schema::SchemaNode;

/// A resolved reference to a target-language type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeReference {
    /// The base type name (primitive keyword, schema identifier or wrapper
    /// name).
    pub base_type: String,
    /// Array nesting depth; 0 for non-arrays.
    pub array_rank: u8,
    /// The element reference when `array_rank > 0`.
    pub array_element_type: Option<Box<TypeReference>>,
    /// Generic arguments. For map references this holds the value type.
    pub type_arguments: Vec<TypeReference>,
    /// Whether this reference names a string-keyed dictionary wrapper.
    pub is_map: bool,
}

impl TypeReference {
    /// A plain named reference.
    pub fn named(base_type: impl Into<String>) -> TypeReference {
        TypeReference {
            base_type: base_type.into(),
            array_rank: 0,
            array_element_type: None,
            type_arguments: Vec::new(),
            is_map: false,
        }
    }

    /// An array of `element`.
    pub fn array_of(element: TypeReference) -> TypeReference {
        TypeReference {
            base_type: element.base_type.clone(),
            array_rank: element.array_rank + 1,
            array_element_type: Some(Box::new(element)),
            type_arguments: Vec::new(),
            is_map: false,
        }
    }

    /// The flat display name: arrays append `Array` to their element's
    /// display name, everything else is the base type.
    pub fn display_name(&self) -> String {
        match &self.array_element_type {
            Some(element) => format!("{}Array", element.display_name()),
            None => self.base_type.clone(),
        }
    }

    /// The display name with its first character uppercased, as embedded in
    /// wrapper names.
    pub fn upper_display_name(&self) -> String {
        upper_first(&self.display_name())
    }

    /// The optional wrapper reference for this type.
    pub fn optional(&self) -> TypeReference {
        TypeReference {
            base_type: format!("Optional{}", self.upper_display_name()),
            array_rank: 0,
            array_element_type: None,
            type_arguments: vec![self.clone()],
            is_map: false,
        }
    }
}

fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// The primitive (type, format) table. Unknown pairs resolve to `None`.
fn primitive_base(kind: &str, format: Option<&str>) -> Option<&'static str> {
    match (kind, format) {
        ("boolean", _) => Some("bool"),
        ("string", Some("byte")) => Some("byte"),
        ("string", Some("uuid")) => Some("Guid"),
        ("string", _) => Some("string"),
        ("integer", Some("int16")) => Some("short"),
        ("integer", Some("int64")) => Some("long"),
        ("integer", _) => Some("int"),
        ("number", Some("float")) => Some("float"),
        ("number", _) => Some("double"),
        _ => None,
    }
}

/// Resolves a schema node to its target type reference.
///
/// Inline objects have no standalone type name and are rejected; value-less
/// maps of maps are rejected as unsupported.
pub fn resolve(node: &SchemaNode) -> AppResult<TypeReference> {
    match node {
        SchemaNode::Primitive { kind, format } => primitive_base(kind, format.as_deref())
            .map(TypeReference::named)
            .ok_or_else(|| AppError::MalformedNode {
                name: String::new(),
            }),
        SchemaNode::ObjectRef { name } => Ok(TypeReference::named(name.clone())),
        SchemaNode::Enum { name, .. } => Ok(TypeReference::named(name.clone())),
        SchemaNode::Array { items } => Ok(TypeReference::array_of(resolve(items)?)),
        SchemaNode::Map { value } => {
            let value_ref = resolve(value)?;
            if value_ref.is_map {
                return Err(AppError::UnsupportedComposition {
                    name: String::new(),
                });
            }
            Ok(TypeReference {
                base_type: format!("MapOf{}", value_ref.upper_display_name()),
                array_rank: 0,
                array_element_type: None,
                type_arguments: vec![value_ref],
                is_map: true,
            })
        }
        SchemaNode::InlineObject { .. } => Err(AppError::MalformedNode {
            name: String::new(),
        }),
    }
}

/// Resolves the optional wrapper declaration name for a named schema.
///
/// Primitives and enums already have built-in optional wrappers in the SDK
/// runtime, so only object- and array-shaped schemas yield a declaration.
pub fn resolve_optional(name: &str, node: &SchemaNode) -> Option<TypeReference> {
    match node {
        SchemaNode::Primitive { .. } | SchemaNode::Enum { .. } => None,
        SchemaNode::InlineObject { .. }
        | SchemaNode::ObjectRef { .. }
        | SchemaNode::Array { .. }
        | SchemaNode::Map { .. } => {
            let inner = TypeReference::named(name);
            Some(inner.optional())
        }
    }
}
