//! # Structural Schema Comparison
//!
//! Decides whether two schema shapes are interchangeable for generation
//! purposes, and enumerates every point of divergence when they are not.
//! References are compared by identifier only; the referenced definitions
//! are not chased.

use crate::schema::SchemaNode;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// A single point of structural divergence between two schemas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Difference {
    /// Dotted path from the comparison root to the diverging aspect.
    pub path: String,
    /// What the left-hand schema declares.
    pub expected: String,
    /// What the right-hand schema declares.
    pub actual: String,
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, found {}",
            self.path, self.expected, self.actual
        )
    }
}

/// Compares two schemas structurally.
///
/// Returns the verdict together with the full list of differences; the list
/// is empty exactly when the verdict is `true`. Comparison keeps descending
/// after a mismatch so callers get every divergence in one pass.
pub fn are_equal(left: &SchemaNode, right: &SchemaNode) -> (bool, Vec<Difference>) {
    let mut differences = Vec::new();
    compare(left, right, "", &mut differences);
    (differences.is_empty(), differences)
}

fn join(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", path, segment)
    }
}

fn fmt_format(format: &Option<String>) -> String {
    match format {
        Some(f) => format!("format '{}'", f),
        None => "no format".to_string(),
    }
}

fn fmt_set(set: &BTreeSet<String>) -> String {
    let items: Vec<&str> = set.iter().map(String::as_str).collect();
    format!("[{}]", items.join(", "))
}

fn compare(left: &SchemaNode, right: &SchemaNode, path: &str, out: &mut Vec<Difference>) {
    match (left, right) {
        (
            SchemaNode::Primitive {
                kind: lk,
                format: lf,
            },
            SchemaNode::Primitive {
                kind: rk,
                format: rf,
            },
        ) => {
            if lk != rk {
                out.push(Difference {
                    path: join(path, "type"),
                    expected: format!("'{}'", lk),
                    actual: format!("'{}'", rk),
                });
            }
            if lf != rf {
                out.push(Difference {
                    path: join(path, "format"),
                    expected: fmt_format(lf),
                    actual: fmt_format(rf),
                });
            }
        }
        (SchemaNode::ObjectRef { name: ln }, SchemaNode::ObjectRef { name: rn }) => {
            // Identifier comparison only; no dereferencing.
            if ln != rn {
                out.push(Difference {
                    path: join(path, "$ref"),
                    expected: format!("'{}'", ln),
                    actual: format!("'{}'", rn),
                });
            }
        }
        (
            SchemaNode::InlineObject {
                properties: lp,
                required: lr,
            },
            SchemaNode::InlineObject {
                properties: rp,
                required: rr,
            },
        ) => {
            if lr != rr {
                out.push(Difference {
                    path: join(path, "required"),
                    expected: fmt_set(lr),
                    actual: fmt_set(rr),
                });
            }
            let left_keys: BTreeSet<String> = lp.keys().cloned().collect();
            let right_keys: BTreeSet<String> = rp.keys().cloned().collect();
            if left_keys != right_keys {
                out.push(Difference {
                    path: join(path, "properties"),
                    expected: fmt_set(&left_keys),
                    actual: fmt_set(&right_keys),
                });
            }
            for (key, left_child) in lp {
                if let Some(right_child) = rp.get(key) {
                    compare(
                        left_child,
                        right_child,
                        &join(path, &format!("properties.{}", key)),
                        out,
                    );
                }
            }
        }
        (SchemaNode::Array { items: li }, SchemaNode::Array { items: ri }) => {
            compare(li, ri, &join(path, "items"), out);
        }
        (SchemaNode::Map { value: lv }, SchemaNode::Map { value: rv }) => {
            compare(lv, rv, &join(path, "additionalProperties"), out);
        }
        (
            SchemaNode::Enum {
                values: lv,
                ..
            },
            SchemaNode::Enum {
                values: rv,
                ..
            },
        ) => {
            if lv != rv {
                out.push(Difference {
                    path: join(path, "enum"),
                    expected: format!("[{}]", lv.join(", ")),
                    actual: format!("[{}]", rv.join(", ")),
                });
            }
        }
        (l, r) => {
            out.push(Difference {
                path: join(path, "type"),
                expected: l.kind_label().to_string(),
                actual: r.kind_label().to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn record(fields: Vec<(&str, SchemaNode)>, required: Vec<&str>) -> SchemaNode {
        let mut properties = IndexMap::new();
        for (name, node) in fields {
            properties.insert(name.to_string(), node);
        }
        SchemaNode::InlineObject {
            properties,
            required: required.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn test_identical_schemas_are_equal() {
        let a = record(
            vec![
                ("id", SchemaNode::primitive_with_format("integer", "int64")),
                ("name", SchemaNode::primitive("string")),
            ],
            vec!["id"],
        );
        let (equal, diffs) = are_equal(&a, &a.clone());
        assert!(equal);
        assert!(diffs.is_empty());
    }

    #[test]
    fn test_format_mismatch_is_reported() {
        let a = SchemaNode::primitive_with_format("integer", "int64");
        let b = SchemaNode::primitive("integer");
        let (equal, diffs) = are_equal(&a, &b);
        assert!(!equal);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "format");
        assert_eq!(diffs[0].to_string(), "format: expected format 'int64', found no format");
    }

    #[test]
    fn test_required_set_ignores_order() {
        let a = record(
            vec![
                ("x", SchemaNode::primitive("string")),
                ("y", SchemaNode::primitive("string")),
            ],
            vec!["x", "y"],
        );
        let b = record(
            vec![
                ("x", SchemaNode::primitive("string")),
                ("y", SchemaNode::primitive("string")),
            ],
            vec!["y", "x"],
        );
        let (equal, _) = are_equal(&a, &b);
        assert!(equal);
    }

    #[test]
    fn test_property_key_set_mismatch() {
        let a = record(vec![("x", SchemaNode::primitive("string"))], vec![]);
        let b = record(vec![("z", SchemaNode::primitive("string"))], vec![]);
        let (equal, diffs) = are_equal(&a, &b);
        assert!(!equal);
        assert_eq!(diffs[0].path, "properties");
    }

    #[test]
    fn test_nested_property_divergence_has_full_path() {
        let a = record(
            vec![(
                "tank",
                record(vec![("depth", SchemaNode::primitive("number"))], vec![]),
            )],
            vec![],
        );
        let b = record(
            vec![(
                "tank",
                record(vec![("depth", SchemaNode::primitive("integer"))], vec![]),
            )],
            vec![],
        );
        let (equal, diffs) = are_equal(&a, &b);
        assert!(!equal);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "properties.tank.properties.depth.type");
    }

    #[test]
    fn test_reference_compared_by_identifier_only() {
        let a = SchemaNode::ObjectRef {
            name: "Fish".to_string(),
        };
        let b = SchemaNode::ObjectRef {
            name: "Tank".to_string(),
        };
        let (equal, diffs) = are_equal(&a, &b);
        assert!(!equal);
        assert_eq!(diffs[0].path, "$ref");
    }

    #[test]
    fn test_category_mismatch() {
        let a = SchemaNode::Map {
            value: Box::new(SchemaNode::primitive("string")),
        };
        let b = record(vec![], vec![]);
        let (equal, diffs) = are_equal(&a, &b);
        assert!(!equal);
        assert_eq!(diffs[0].expected, "map");
        assert_eq!(diffs[0].actual, "object");
    }

    #[test]
    fn test_multiple_differences_all_collected() {
        let a = record(
            vec![
                ("id", SchemaNode::primitive_with_format("integer", "int64")),
                ("name", SchemaNode::primitive("string")),
            ],
            vec!["id"],
        );
        let b = record(
            vec![
                ("id", SchemaNode::primitive_with_format("integer", "int32")),
                ("name", SchemaNode::primitive("boolean")),
            ],
            vec![],
        );
        let (equal, diffs) = are_equal(&a, &b);
        assert!(!equal);
        assert_eq!(diffs.len(), 3);
    }

    #[test]
    fn test_enum_value_list_is_ordered() {
        let a = SchemaNode::Enum {
            name: "Direction".to_string(),
            values: vec!["incoming".to_string(), "outgoing".to_string()],
        };
        let b = SchemaNode::Enum {
            name: "Direction".to_string(),
            values: vec!["outgoing".to_string(), "incoming".to_string()],
        };
        let (equal, diffs) = are_equal(&a, &b);
        assert!(!equal);
        assert_eq!(diffs[0].path, "enum");
    }
}
