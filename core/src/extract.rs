//! # Cross-Document Extraction
//!
//! Pools the component schemas of every ingested document into a single
//! global set: structurally identical duplicates collapse, genuine
//! conflicts are resolved (or rejected) according to the configured
//! strategy, and the survivors are emitted in dependency order.

use crate::document::{self, Document};
use crate::equality::{are_equal, Difference};
use crate::error::{AppError, AppResult};
use crate::schema::{collect_refs, NamedSchema, SchemaNode};
use heck::ToPascalCase;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// How name collisions between structurally different schemas are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolutionStrategy {
    /// Any structural conflict aborts extraction.
    Strict,
    /// Every instance of a conflicted name is renamed; nobody keeps it.
    RenameAll,
    /// The structural variant shared by the most documents keeps the name;
    /// the rest are renamed. A tie renames everybody.
    RenameUncommonConflicts,
}

/// The result of pooling all documents.
#[derive(Debug)]
pub struct Extraction {
    /// The surviving schemas, dependency-ordered (dependencies first).
    pub ordered: Vec<NamedSchema>,
    /// Per-schema lowering failures. These schemas are excluded from
    /// `ordered` but do not abort extraction.
    pub diagnostics: Vec<AppError>,
    /// The structural differences observed between conflicting variants,
    /// with paths prefixed by the contested schema name.
    pub differences: Vec<Difference>,
}

/// Pools `documents` into a deduplicated, dependency-ordered schema set.
pub fn extract(
    documents: &[Document],
    strategy: ConflictResolutionStrategy,
) -> AppResult<Extraction> {
    let mut diagnostics = Vec::new();
    let mut candidates: Vec<NamedSchema> = Vec::new();

    for doc in documents {
        for (name, raw) in &doc.schemas {
            if name.is_empty() {
                continue;
            }
            match document::node_from_ref_or(raw, Some(name)) {
                Ok(node) => candidates.push(NamedSchema {
                    name: name.clone(),
                    node,
                    origin: doc.id.clone(),
                }),
                Err(err) => diagnostics.push(err.locate(name)),
            }
        }
    }

    // Group candidate indices by declared name, first-seen order.
    let mut groups: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (idx, candidate) in candidates.iter().enumerate() {
        groups
            .entry(candidate.name.clone())
            .or_default()
            .push(idx);
    }

    let mut differences = Vec::new();
    let mut renames: HashMap<usize, String> = HashMap::new();
    let mut dropped: HashSet<usize> = HashSet::new();

    for (name, members) in &groups {
        if members.len() <= 1 {
            continue;
        }

        // Partition the claimants into structural-equality classes. The
        // first member of each class is its representative.
        let mut classes: Vec<Vec<usize>> = Vec::new();
        for &idx in members {
            let mut placed = false;
            for class in classes.iter_mut() {
                let (equal, _) = are_equal(&candidates[class[0]].node, &candidates[idx].node);
                if equal {
                    class.push(idx);
                    placed = true;
                    break;
                }
            }
            if !placed {
                classes.push(vec![idx]);
            }
        }

        if classes.len() == 1 {
            // All claimants agree structurally: keep the first, drop the rest.
            for &idx in &members[1..] {
                dropped.insert(idx);
            }
            continue;
        }

        // Record the divergence trail against the first variant.
        for class in &classes[1..] {
            let (_, diffs) = are_equal(&candidates[classes[0][0]].node, &candidates[class[0]].node);
            for diff in diffs {
                differences.push(Difference {
                    path: format!("{}.{}", name, diff.path),
                    expected: diff.expected,
                    actual: diff.actual,
                });
            }
        }

        let winner = match strategy {
            ConflictResolutionStrategy::Strict => {
                let origins: Vec<&str> = members
                    .iter()
                    .map(|&idx| candidates[idx].origin.as_str())
                    .collect();
                return Err(AppError::UnresolvedConflict {
                    name: name.clone(),
                    origins: origins.join(", "),
                });
            }
            ConflictResolutionStrategy::RenameAll => None,
            ConflictResolutionStrategy::RenameUncommonConflicts => strictly_largest(&classes),
        };

        for (class_idx, class) in classes.iter().enumerate() {
            if winner == Some(class_idx) {
                // The winning variant keeps the name; its duplicates collapse.
                for &idx in &class[1..] {
                    dropped.insert(idx);
                }
                continue;
            }
            for &idx in class {
                let prefix = candidates[idx].origin.to_pascal_case();
                renames.insert(idx, format!("{}{}", prefix, name));
            }
        }
    }

    // Per-document rename tables drive reference rewriting: every schema of
    // a document whose X was renamed must point at the renamed X.
    let mut doc_renames: HashMap<&str, HashMap<String, String>> = HashMap::new();
    for (&idx, new_name) in &renames {
        doc_renames
            .entry(candidates[idx].origin.as_str())
            .or_default()
            .insert(candidates[idx].name.clone(), new_name.clone());
    }

    let mut unique: Vec<NamedSchema> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for (idx, candidate) in candidates.iter().enumerate() {
        if dropped.contains(&idx) {
            continue;
        }
        let name = renames
            .get(&idx)
            .cloned()
            .unwrap_or_else(|| candidate.name.clone());
        if !seen.insert(name.clone()) {
            // A rename landed on a name some other schema already holds.
            diagnostics.push(AppError::General(format!(
                "Schema '{}' from document '{}' was dropped: name collides with an earlier declaration",
                name, candidate.origin
            )));
            continue;
        }
        let node = match doc_renames.get(candidate.origin.as_str()) {
            Some(table) => rewrite_refs(candidate.node.clone(), table),
            None => candidate.node.clone(),
        };
        unique.push(NamedSchema {
            name,
            node,
            origin: candidate.origin.clone(),
        });
    }

    let ordered = dependency_order(unique);

    Ok(Extraction {
        ordered,
        diagnostics,
        differences,
    })
}

/// The index of the strictly largest class, or `None` on a tie.
fn strictly_largest(classes: &[Vec<usize>]) -> Option<usize> {
    let mut best: Option<usize> = None;
    let mut best_len = 0usize;
    let mut tied = false;
    for (idx, class) in classes.iter().enumerate() {
        if class.len() > best_len {
            best = Some(idx);
            best_len = class.len();
            tied = false;
        } else if class.len() == best_len {
            tied = true;
        }
    }
    if tied {
        None
    } else {
        best
    }
}

/// Rewrites every `$ref` identifier through the rename table.
fn rewrite_refs(node: SchemaNode, table: &HashMap<String, String>) -> SchemaNode {
    match node {
        SchemaNode::ObjectRef { name } => {
            let name = table.get(&name).cloned().unwrap_or(name);
            SchemaNode::ObjectRef { name }
        }
        SchemaNode::InlineObject {
            properties,
            required,
        } => SchemaNode::InlineObject {
            properties: properties
                .into_iter()
                .map(|(key, child)| (key, rewrite_refs(child, table)))
                .collect(),
            required,
        },
        SchemaNode::Array { items } => SchemaNode::Array {
            items: Box::new(rewrite_refs(*items, table)),
        },
        SchemaNode::Map { value } => SchemaNode::Map {
            value: Box::new(rewrite_refs(*value, table)),
        },
        leaf @ (SchemaNode::Primitive { .. } | SchemaNode::Enum { .. }) => leaf,
    }
}

/// Orders schemas so dependencies precede their dependents. Back edges
/// (reference cycles) are skipped rather than rejected; ties keep the
/// pooled declaration order.
fn dependency_order(schemas: Vec<NamedSchema>) -> Vec<NamedSchema> {
    let index: HashMap<String, usize> = schemas
        .iter()
        .enumerate()
        .map(|(idx, schema)| (schema.name.clone(), idx))
        .collect();

    let mut state = vec![0u8; schemas.len()]; // 0 unvisited, 1 visiting, 2 done
    let mut order: Vec<usize> = Vec::with_capacity(schemas.len());

    fn visit(
        current: usize,
        schemas: &[NamedSchema],
        index: &HashMap<String, usize>,
        state: &mut [u8],
        order: &mut Vec<usize>,
    ) {
        if state[current] != 0 {
            return;
        }
        state[current] = 1;
        for reference in collect_refs(&schemas[current].node) {
            if let Some(&dep) = index.get(&reference) {
                if state[dep] == 0 {
                    visit(dep, schemas, index, state, order);
                }
            }
        }
        state[current] = 2;
        order.push(current);
    }

    for idx in 0..schemas.len() {
        visit(idx, &schemas, &index, &mut state, &mut order);
    }

    let mut by_idx: Vec<Option<NamedSchema>> = schemas.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|idx| by_idx[idx].take())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(title: &str, schema_block: &str) -> Document {
        let source = format!(
            "openapi: 3.0.0\ninfo:\n  title: {}\n  version: 1.0.0\npaths: {{}}\ncomponents:\n  schemas:\n{}",
            title, schema_block
        );
        Document::from_yaml(&source).expect("fixture should parse")
    }

    fn names(extraction: &Extraction) -> Vec<&str> {
        extraction
            .ordered
            .iter()
            .map(|s| s.name.as_str())
            .collect()
    }

    const TUNA_LONG: &str = r#"    Tuna:
      type: object
      required: [foo]
      properties:
        foo:
          type: integer
          format: int64
"#;

    const TUNA_STRING: &str = r#"    Tuna:
      type: object
      required: [foo]
      properties:
        foo:
          type: string
"#;

    #[test]
    fn test_identical_duplicates_collapse() {
        let docs = vec![doc("alpha", TUNA_LONG), doc("beta", TUNA_LONG)];
        let extraction = extract(&docs, ConflictResolutionStrategy::Strict).unwrap();
        assert_eq!(names(&extraction), vec!["Tuna"]);
        assert_eq!(extraction.ordered[0].origin, "alpha");
        assert!(extraction.differences.is_empty());
    }

    #[test]
    fn test_strict_rejects_conflict() {
        let docs = vec![doc("alpha", TUNA_LONG), doc("beta", TUNA_STRING)];
        let err = extract(&docs, ConflictResolutionStrategy::Strict).unwrap_err();
        match err {
            AppError::UnresolvedConflict { name, origins } => {
                assert_eq!(name, "Tuna");
                assert_eq!(origins, "alpha, beta");
            }
            other => panic!("expected UnresolvedConflict, got {:?}", other),
        }
    }

    #[test]
    fn test_rename_all_renames_every_instance() {
        let docs = vec![doc("alpha", TUNA_LONG), doc("beta", TUNA_STRING)];
        let extraction = extract(&docs, ConflictResolutionStrategy::RenameAll).unwrap();
        let mut found = names(&extraction);
        found.sort_unstable();
        assert_eq!(found, vec!["AlphaTuna", "BetaTuna"]);
        assert!(!extraction.differences.is_empty());
    }

    #[test]
    fn test_majority_variant_keeps_name() {
        let docs = vec![
            doc("alpha", TUNA_LONG),
            doc("beta", TUNA_LONG),
            doc("gamma", TUNA_STRING),
        ];
        let extraction =
            extract(&docs, ConflictResolutionStrategy::RenameUncommonConflicts).unwrap();
        let mut found = names(&extraction);
        found.sort_unstable();
        assert_eq!(found, vec!["GammaTuna", "Tuna"]);
        // The kept variant is the majority (long) one.
        let tuna = extraction
            .ordered
            .iter()
            .find(|s| s.name == "Tuna")
            .unwrap();
        assert_eq!(tuna.origin, "alpha");
    }

    #[test]
    fn test_tie_renames_everybody() {
        let docs = vec![doc("alpha", TUNA_LONG), doc("beta", TUNA_STRING)];
        let extraction =
            extract(&docs, ConflictResolutionStrategy::RenameUncommonConflicts).unwrap();
        let mut found = names(&extraction);
        found.sort_unstable();
        assert_eq!(found, vec!["AlphaTuna", "BetaTuna"]);
    }

    #[test]
    fn test_rename_prefix_pascal_cases_title() {
        let docs = vec![
            doc("leaderboards actor", TUNA_LONG),
            doc("beta", TUNA_STRING),
        ];
        let extraction = extract(&docs, ConflictResolutionStrategy::RenameAll).unwrap();
        let mut found = names(&extraction);
        found.sort_unstable();
        assert_eq!(found, vec!["BetaTuna", "LeaderboardsActorTuna"]);
    }

    #[test]
    fn test_references_rewired_in_origin_document() {
        let alpha = r#"    Tuna:
      type: object
      required: [foo]
      properties:
        foo:
          type: integer
          format: int64
    Tank:
      type: object
      properties:
        resident:
          $ref: '#/components/schemas/Tuna'
"#;
        let docs = vec![doc("alpha", alpha), doc("beta", TUNA_STRING)];
        let extraction = extract(&docs, ConflictResolutionStrategy::RenameAll).unwrap();
        let tank = extraction
            .ordered
            .iter()
            .find(|s| s.name == "Tank")
            .unwrap();
        match &tank.node {
            SchemaNode::InlineObject { properties, .. } => {
                assert_eq!(
                    properties.get("resident"),
                    Some(&SchemaNode::ObjectRef {
                        name: "AlphaTuna".to_string()
                    })
                );
            }
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_dependency_order() {
        let alpha = r#"    Tank:
      type: object
      properties:
        resident:
          $ref: '#/components/schemas/Fish'
    Fish:
      type: object
      properties:
        name:
          type: string
"#;
        let docs = vec![doc("alpha", alpha)];
        let extraction = extract(&docs, ConflictResolutionStrategy::Strict).unwrap();
        assert_eq!(names(&extraction), vec!["Fish", "Tank"]);
    }

    #[test]
    fn test_reference_cycle_is_tolerated() {
        let alpha = r#"    Node:
      type: object
      properties:
        next:
          $ref: '#/components/schemas/Node'
        peer:
          $ref: '#/components/schemas/Peer'
    Peer:
      type: object
      properties:
        back:
          $ref: '#/components/schemas/Node'
"#;
        let docs = vec![doc("alpha", alpha)];
        let extraction = extract(&docs, ConflictResolutionStrategy::Strict).unwrap();
        assert_eq!(extraction.ordered.len(), 2);
    }

    #[test]
    fn test_malformed_schema_is_reported_not_fatal() {
        let alpha = r#"    Broken:
      type: array
    Fine:
      type: object
      properties: {}
"#;
        let docs = vec![doc("alpha", alpha)];
        let extraction = extract(&docs, ConflictResolutionStrategy::Strict).unwrap();
        assert_eq!(names(&extraction), vec!["Fine"]);
        assert_eq!(extraction.diagnostics.len(), 1);
        assert!(matches!(
            extraction.diagnostics[0],
            AppError::MalformedNode { ref name } if name == "Broken"
        ));
    }

    #[test]
    fn test_rename_collision_is_reported() {
        let alpha = r#"    Tuna:
      type: object
      required: [foo]
      properties:
        foo:
          type: integer
          format: int64
    AlphaTuna:
      type: object
      properties:
        weight:
          type: number
"#;
        let docs = vec![doc("alpha", alpha), doc("beta", TUNA_STRING)];
        let extraction = extract(&docs, ConflictResolutionStrategy::RenameAll).unwrap();
        // alpha's Tuna is renamed onto the already-declared AlphaTuna.
        let mut found = names(&extraction);
        found.sort_unstable();
        assert_eq!(found, vec!["AlphaTuna", "BetaTuna"]);
        assert_eq!(extraction.diagnostics.len(), 1);
        let message = format!("{}", extraction.diagnostics[0]);
        assert!(message.contains("AlphaTuna"));
        assert!(message.contains("collides"));
    }

    #[test]
    fn test_conflict_differences_are_prefixed() {
        let docs = vec![doc("alpha", TUNA_LONG), doc("beta", TUNA_STRING)];
        let extraction = extract(&docs, ConflictResolutionStrategy::RenameAll).unwrap();
        assert!(extraction
            .differences
            .iter()
            .all(|d| d.path.starts_with("Tuna.")));
    }
}
