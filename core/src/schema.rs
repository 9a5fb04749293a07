//! # Schema Intermediate Representation
//!
//! A closed tagged union describing the shape of an OpenAPI schema after
//! ingestion. Every downstream stage (equality, extraction, resolution,
//! synthesis) operates on `SchemaNode` rather than on raw parser types, so
//! "is this a map" or "is this a reference" is a single pattern match instead
//! of a cluster of field checks.

use indexmap::IndexMap;
use std::collections::BTreeSet;

/// The shape of a single schema.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// A scalar leaf: `boolean`, `string`, `integer` or `number`, with an
    /// optional wire format (`int64`, `uuid`, `byte`, ...).
    Primitive {
        /// The OpenAPI `type` keyword.
        kind: String,
        /// The OpenAPI `format` keyword, if present.
        format: Option<String>,
    },

    /// A `$ref` to another named schema, reduced to its identifier.
    ObjectRef {
        /// Identifier of the referenced schema (last path segment).
        name: String,
    },

    /// An object with declared properties. An empty property table is a
    /// valid (empty) record.
    InlineObject {
        /// Property name -> shape, in declaration order.
        properties: IndexMap<String, SchemaNode>,
        /// Property names listed under `required`.
        required: BTreeSet<String>,
    },

    /// An array with a single item shape.
    Array {
        /// The item shape.
        items: Box<SchemaNode>,
    },

    /// An object typed purely through `additionalProperties`: a dictionary
    /// from string keys to a single value shape.
    Map {
        /// The value shape.
        value: Box<SchemaNode>,
    },

    /// A string schema restricted to a closed set of values.
    Enum {
        /// The name the generated enum type will carry.
        name: String,
        /// The admissible wire strings, in declaration order.
        values: Vec<String>,
    },
}

impl SchemaNode {
    /// Shorthand for a formatless primitive.
    pub fn primitive(kind: &str) -> SchemaNode {
        SchemaNode::Primitive {
            kind: kind.to_string(),
            format: None,
        }
    }

    /// Shorthand for a primitive with a wire format.
    pub fn primitive_with_format(kind: &str, format: &str) -> SchemaNode {
        SchemaNode::Primitive {
            kind: kind.to_string(),
            format: Some(format.to_string()),
        }
    }

    /// A short label for the node's category, used in difference reports.
    pub fn kind_label(&self) -> &'static str {
        match self {
            SchemaNode::Primitive { .. } => "primitive",
            SchemaNode::ObjectRef { .. } => "reference",
            SchemaNode::InlineObject { .. } => "object",
            SchemaNode::Array { .. } => "array",
            SchemaNode::Map { .. } => "map",
            SchemaNode::Enum { .. } => "enum",
        }
    }
}

/// A schema together with the name it was declared under and the title of
/// the document that declared it.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSchema {
    /// The declaration name (components/schemas key, possibly renamed).
    pub name: String,
    /// The shape.
    pub node: SchemaNode,
    /// Title of the originating document.
    pub origin: String,
}

/// Collects the identifiers of every schema referenced (transitively through
/// properties, array items and map values) by `node`.
pub fn collect_refs(node: &SchemaNode) -> Vec<String> {
    let mut refs = Vec::new();
    walk_refs(node, &mut refs);
    refs
}

fn walk_refs(node: &SchemaNode, refs: &mut Vec<String>) {
    match node {
        SchemaNode::ObjectRef { name } => refs.push(name.clone()),
        SchemaNode::InlineObject { properties, .. } => {
            for child in properties.values() {
                walk_refs(child, refs);
            }
        }
        SchemaNode::Map { value } => walk_refs(value, refs),
        SchemaNode::Array { items } => walk_refs(items, refs),
        SchemaNode::Primitive { .. } | SchemaNode::Enum { .. } => {}
    }
}
