#![deny(missing_docs)]

//! # Diff Command
//!
//! Structurally compares the component schemas of two OpenAPI documents and
//! reports every divergence. Exits non-zero when drift is found, so CI can
//! gate on it.

use std::fs;
use std::path::{Path, PathBuf};

use sdkgen_core::document::node_from_ref_or;
use sdkgen_core::{are_equal, AppError, AppResult, Difference, Document};

/// Arguments for the diff command.
#[derive(clap::Args, Debug, Clone)]
pub struct DiffArgs {
    /// The baseline OpenAPI document.
    #[clap(long)]
    pub left: PathBuf,

    /// The OpenAPI document to compare against the baseline.
    #[clap(long)]
    pub right: PathBuf,

    /// Restrict the comparison to a single schema name.
    #[clap(long)]
    pub schema: Option<String>,

    /// Emit the report as JSON instead of text.
    #[clap(long)]
    pub json: bool,
}

/// The drift report for one document pair.
#[derive(Debug, Default)]
pub struct DriftReport {
    /// Schemas present in both documents whose shapes diverge, with their
    /// difference lists.
    pub changed: Vec<(String, Vec<Difference>)>,
    /// Schema names only the baseline declares.
    pub only_left: Vec<String>,
    /// Schema names only the comparison document declares.
    pub only_right: Vec<String>,
}

impl DriftReport {
    /// Whether any drift was found.
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.only_left.is_empty() && self.only_right.is_empty()
    }
}

fn load_document(path: &Path) -> AppResult<Document> {
    let source = fs::read_to_string(path)
        .map_err(|e| AppError::General(format!("Failed to read {:?}: {}", path, e)))?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Document::from_json(&source),
        _ => Document::from_yaml(&source),
    }
    .map_err(|e| AppError::General(format!("{:?}: {}", path, e)))
}

/// Compares the schema tables of two documents.
pub fn compare_documents(
    left: &Document,
    right: &Document,
    only: Option<&str>,
) -> DriftReport {
    let mut report = DriftReport::default();

    for (name, left_raw) in &left.schemas {
        if only.is_some_and(|wanted| wanted != name) {
            continue;
        }
        let Some(right_raw) = right.schemas.get(name) else {
            report.only_left.push(name.clone());
            continue;
        };
        let left_node = node_from_ref_or(left_raw, Some(name));
        let right_node = node_from_ref_or(right_raw, Some(name));
        match (left_node, right_node) {
            (Ok(l), Ok(r)) => {
                let (equal, differences) = are_equal(&l, &r);
                if !equal {
                    report.changed.push((name.clone(), differences));
                }
            }
            // Unloadable shapes cannot be compared; surface them as changed
            // with an empty difference list rather than hiding them.
            (Err(_), Ok(_)) | (Ok(_), Err(_)) => {
                report.changed.push((name.clone(), Vec::new()));
            }
            (Err(_), Err(_)) => {}
        }
    }

    for name in right.schemas.keys() {
        if only.is_some_and(|wanted| wanted != name) {
            continue;
        }
        if !left.schemas.contains_key(name) {
            report.only_right.push(name.clone());
        }
    }

    report
}

fn print_text(report: &DriftReport) {
    for name in &report.only_left {
        println!("- {} (removed)", name);
    }
    for name in &report.only_right {
        println!("+ {} (added)", name);
    }
    for (name, differences) in &report.changed {
        println!("~ {}", name);
        for difference in differences {
            println!("    {}", difference);
        }
    }
}

fn print_json(report: &DriftReport) -> AppResult<()> {
    let changed: Vec<serde_json::Value> = report
        .changed
        .iter()
        .map(|(name, differences)| {
            serde_json::json!({
                "schema": name,
                "differences": differences,
            })
        })
        .collect();
    let value = serde_json::json!({
        "changed": changed,
        "onlyLeft": report.only_left,
        "onlyRight": report.only_right,
    });
    let rendered = serde_json::to_string_pretty(&value)
        .map_err(|e| AppError::General(format!("Failed to render report: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

/// Executes the diff command.
pub fn execute(args: &DiffArgs) -> AppResult<()> {
    let left = load_document(&args.left)?;
    let right = load_document(&args.right)?;

    let report = compare_documents(&left, &right, args.schema.as_deref());

    if args.json {
        print_json(&report)?;
    } else if report.is_empty() {
        println!("No schema drift detected");
    } else {
        print_text(&report);
    }

    if report.is_empty() {
        Ok(())
    } else {
        Err(AppError::General("schema drift detected".to_string()))
    }
}
