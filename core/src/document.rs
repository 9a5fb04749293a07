//! # OpenAPI Document Ingestion
//!
//! Loads OpenAPI documents via `openapiv3` and lowers their component
//! schemas into the `SchemaNode` representation. Lowering is per-schema so a
//! single malformed definition is reported without poisoning the rest of the
//! document.

use crate::error::{AppError, AppResult};
use crate::schema::SchemaNode;
use indexmap::IndexMap;
use openapiv3::{
    AdditionalProperties, AnySchema, IntegerFormat, NumberFormat, ObjectType, OpenAPI,
    ReferenceOr, Schema, SchemaKind, StringFormat, StringType, Type, VariantOrUnknownOrEmpty,
};
use std::collections::BTreeSet;

/// An ingested OpenAPI document: its title plus the raw component schema
/// table, in declaration order.
#[derive(Debug, Clone)]
pub struct Document {
    /// The document's `info.title`, used as the origin identifier.
    pub id: String,
    /// `components/schemas`, still in parser form.
    pub schemas: IndexMap<String, ReferenceOr<Schema>>,
}

impl Document {
    /// Parses a YAML OpenAPI document.
    pub fn from_yaml(source: &str) -> AppResult<Document> {
        let api: OpenAPI = serde_yaml::from_str(source)
            .map_err(|e| AppError::General(format!("Failed to parse OpenAPI YAML: {}", e)))?;
        Ok(Document::from_openapi(api))
    }

    /// Parses a JSON OpenAPI document.
    pub fn from_json(source: &str) -> AppResult<Document> {
        let api: OpenAPI = serde_json::from_str(source)
            .map_err(|e| AppError::General(format!("Failed to parse OpenAPI JSON: {}", e)))?;
        Ok(Document::from_openapi(api))
    }

    /// Wraps an already-parsed document.
    pub fn from_openapi(api: OpenAPI) -> Document {
        let schemas = api
            .components
            .map(|components| components.schemas)
            .unwrap_or_default();
        Document {
            id: api.info.title,
            schemas,
        }
    }
}

/// Extracts the identifier from a `$ref` string (the last path segment).
pub fn ref_name(reference: &str) -> String {
    reference
        .rsplit('/')
        .next()
        .unwrap_or(reference)
        .to_string()
}

/// Lowers a possibly-referencing schema entry.
pub fn node_from_ref_or(
    schema: &ReferenceOr<Schema>,
    name_hint: Option<&str>,
) -> AppResult<SchemaNode> {
    match schema {
        ReferenceOr::Reference { reference } => Ok(SchemaNode::ObjectRef {
            name: ref_name(reference),
        }),
        ReferenceOr::Item(item) => node_from_schema(item, name_hint),
    }
}

fn node_from_boxed(
    schema: &ReferenceOr<Box<Schema>>,
    name_hint: Option<&str>,
) -> AppResult<SchemaNode> {
    match schema {
        ReferenceOr::Reference { reference } => Ok(SchemaNode::ObjectRef {
            name: ref_name(reference),
        }),
        ReferenceOr::Item(item) => node_from_schema(item, name_hint),
    }
}

/// Lowers a concrete schema.
///
/// `name_hint` is the declaration name when lowering a top-level component
/// schema; it names enums that carry no `title` of their own.
pub fn node_from_schema(schema: &Schema, name_hint: Option<&str>) -> AppResult<SchemaNode> {
    match &schema.schema_kind {
        SchemaKind::Type(Type::Object(object)) => object_node(object, name_hint),
        SchemaKind::Type(Type::Array(array)) => {
            let items = array.items.as_ref().ok_or_else(|| AppError::MalformedNode {
                name: name_hint.unwrap_or_default().to_string(),
            })?;
            Ok(SchemaNode::Array {
                items: Box::new(node_from_boxed(items, None)?),
            })
        }
        SchemaKind::Type(Type::String(string)) => Ok(string_node(string, name_hint)),
        SchemaKind::Type(Type::Integer(integer)) => Ok(SchemaNode::Primitive {
            kind: "integer".to_string(),
            format: integer_format(&integer.format),
        }),
        SchemaKind::Type(Type::Number(number)) => Ok(SchemaNode::Primitive {
            kind: "number".to_string(),
            format: number_format(&number.format),
        }),
        SchemaKind::Type(Type::Boolean { .. }) => Ok(SchemaNode::primitive("boolean")),
        SchemaKind::OneOf { .. } | SchemaKind::AllOf { .. } | SchemaKind::AnyOf { .. } => {
            Err(AppError::UnsupportedComposition {
                name: name_hint.unwrap_or_default().to_string(),
            })
        }
        SchemaKind::Not { .. } => Err(AppError::UnsupportedComposition {
            name: name_hint.unwrap_or_default().to_string(),
        }),
        SchemaKind::Any(any) => any_node(any, name_hint),
    }
}

fn string_node(string: &StringType, name_hint: Option<&str>) -> SchemaNode {
    let values: Vec<String> = string.enumeration.iter().flatten().cloned().collect();
    if !values.is_empty() {
        // Only declaration names produce enum types; an inline enum has no
        // declaration to reference and degrades to a plain string.
        if let Some(name) = name_hint {
            return SchemaNode::Enum {
                name: name.to_string(),
                values,
            };
        }
    }
    SchemaNode::Primitive {
        kind: "string".to_string(),
        format: string_format(&string.format),
    }
}

fn object_node(object: &ObjectType, name_hint: Option<&str>) -> AppResult<SchemaNode> {
    // Declared properties win over additionalProperties when both appear.
    if object.properties.is_empty() {
        if let Some(AdditionalProperties::Schema(value)) = &object.additional_properties {
            return Ok(SchemaNode::Map {
                value: Box::new(node_from_ref_or(value, None)?),
            });
        }
    }
    lower_properties(&object.properties, &object.required, name_hint)
}

fn any_node(any: &AnySchema, name_hint: Option<&str>) -> AppResult<SchemaNode> {
    if !any.properties.is_empty() {
        return lower_properties(&any.properties, &any.required, name_hint);
    }
    if let Some(AdditionalProperties::Schema(value)) = &any.additional_properties {
        return Ok(SchemaNode::Map {
            value: Box::new(node_from_ref_or(value, None)?),
        });
    }
    if let Some(items) = &any.items {
        return Ok(SchemaNode::Array {
            items: Box::new(node_from_boxed(items, None)?),
        });
    }
    // Neither a type keyword nor a $ref: unresolvable.
    Err(AppError::MalformedNode {
        name: name_hint.unwrap_or_default().to_string(),
    })
}

fn lower_properties(
    properties: &IndexMap<String, ReferenceOr<Box<Schema>>>,
    required: &[String],
    name_hint: Option<&str>,
) -> AppResult<SchemaNode> {
    let mut lowered = IndexMap::new();
    for (property, child) in properties {
        let node = node_from_boxed(child, None)
            .map_err(|e| e.locate(&format!("{}.{}", name_hint.unwrap_or_default(), property)))?;
        lowered.insert(property.clone(), node);
    }
    let required: BTreeSet<String> = required.iter().cloned().collect();
    Ok(SchemaNode::InlineObject {
        properties: lowered,
        required,
    })
}

fn string_format(format: &VariantOrUnknownOrEmpty<StringFormat>) -> Option<String> {
    match format {
        VariantOrUnknownOrEmpty::Item(known) => Some(
            match known {
                StringFormat::Byte => "byte",
                StringFormat::Binary => "binary",
                StringFormat::Date => "date",
                StringFormat::DateTime => "date-time",
                StringFormat::Password => "password",
            }
            .to_string(),
        ),
        VariantOrUnknownOrEmpty::Unknown(other) => Some(other.clone()),
        VariantOrUnknownOrEmpty::Empty => None,
    }
}

fn integer_format(format: &VariantOrUnknownOrEmpty<IntegerFormat>) -> Option<String> {
    match format {
        VariantOrUnknownOrEmpty::Item(known) => Some(
            match known {
                IntegerFormat::Int32 => "int32",
                IntegerFormat::Int64 => "int64",
            }
            .to_string(),
        ),
        VariantOrUnknownOrEmpty::Unknown(other) => Some(other.clone()),
        VariantOrUnknownOrEmpty::Empty => None,
    }
}

fn number_format(format: &VariantOrUnknownOrEmpty<NumberFormat>) -> Option<String> {
    match format {
        VariantOrUnknownOrEmpty::Item(known) => Some(
            match known {
                NumberFormat::Float => "float",
                NumberFormat::Double => "double",
            }
            .to_string(),
        ),
        VariantOrUnknownOrEmpty::Unknown(other) => Some(other.clone()),
        VariantOrUnknownOrEmpty::Empty => None,
    }
}
