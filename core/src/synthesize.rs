//! # Model Declaration Synthesis
//!
//! Turns an object-shaped named schema into a language-neutral model
//! declaration: one field per property, carrying the resolved type, the
//! requiredness flag and a serialization category. Wire names that collide
//! with target-language keywords are renamed at the member level only; the
//! wire name is preserved for serialization.

use crate::error::{AppError, AppResult};
use crate::resolve::{resolve, TypeReference};
use crate::schema::{NamedSchema, SchemaNode};
use std::collections::HashMap;

/// How a field participates in serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A plain value (primitive or object reference).
    Scalar,
    /// An array of values.
    Array,
    /// A string-keyed dictionary.
    Map,
    /// A closed string enum.
    Enum,
}

/// A synthesized field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    /// The property name on the wire.
    pub wire_name: String,
    /// The member name in generated code (wire name, possibly de-conflicted).
    pub member_name: String,
    /// The resolved, non-optional type of the field.
    pub ty: TypeReference,
    /// Whether the property is listed as required.
    pub required: bool,
    /// Serialization category.
    pub kind: FieldKind,
}

/// A synthesized model: a named, ordered field list.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDeclaration {
    /// The schema name.
    pub name: String,
    /// Fields in property declaration order.
    pub fields: Vec<FieldDecl>,
}

/// A name -> shape lookup over the extracted schema set, used to classify
/// reference fields (a `$ref` to an enum serializes as an enum).
pub struct SchemaIndex<'a> {
    by_name: HashMap<&'a str, &'a SchemaNode>,
}

impl<'a> SchemaIndex<'a> {
    /// Builds the index from the extraction output.
    pub fn new(schemas: &'a [NamedSchema]) -> SchemaIndex<'a> {
        let mut by_name = HashMap::new();
        for schema in schemas {
            by_name.insert(schema.name.as_str(), &schema.node);
        }
        SchemaIndex { by_name }
    }

    /// Looks up a schema shape by name.
    pub fn get(&self, name: &str) -> Option<&'a SchemaNode> {
        self.by_name.get(name).copied()
    }

    fn is_enum(&self, name: &str) -> bool {
        matches!(self.get(name), Some(SchemaNode::Enum { .. }))
    }
}

/// Member names that collide with target-language keywords get a `Key`
/// suffix.
const RESERVED_MEMBER_NAMES: &[&str] = &[
    "do",
    "as",
    "if",
    "for",
    "int",
    "long",
    "params",
    "string",
    "var",
    "protected",
    "void",
    "while",
    "public",
    "private",
    "class",
    "interface",
    "const",
];

fn sanitize_member_name(wire_name: &str) -> String {
    if RESERVED_MEMBER_NAMES.contains(&wire_name) {
        format!("{}Key", wire_name)
    } else {
        wire_name.to_string()
    }
}

fn classify(node: &SchemaNode, index: &SchemaIndex) -> FieldKind {
    match node {
        SchemaNode::Array { .. } => FieldKind::Array,
        SchemaNode::Map { .. } => FieldKind::Map,
        SchemaNode::Enum { .. } => FieldKind::Enum,
        SchemaNode::ObjectRef { name } if index.is_enum(name) => FieldKind::Enum,
        _ => FieldKind::Scalar,
    }
}

/// Synthesizes the model declaration for an object-shaped schema.
///
/// Properties that fail to resolve abort the whole declaration; the caller
/// reports the error and skips the model.
pub fn synthesize(schema: &NamedSchema, index: &SchemaIndex) -> AppResult<ModelDeclaration> {
    let SchemaNode::InlineObject {
        properties,
        required,
    } = &schema.node
    else {
        return Err(AppError::MalformedNode {
            name: schema.name.clone(),
        });
    };

    let mut fields = Vec::with_capacity(properties.len());
    for (wire_name, node) in properties {
        let ty = resolve(node)
            .map_err(|e| e.locate(&format!("{}.{}", schema.name, wire_name)))?;
        fields.push(FieldDecl {
            wire_name: wire_name.clone(),
            member_name: sanitize_member_name(wire_name),
            ty,
            required: required.contains(wire_name),
            kind: classify(node, index),
        });
    }

    Ok(ModelDeclaration {
        name: schema.name.clone(),
        fields,
    })
}
