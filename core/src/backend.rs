//! # Source Generation Backends
//!
//! The common surface for turning an extracted schema set into text
//! artifacts. Backends never touch the filesystem; they return named file
//! contents and leave writing to the caller.

use crate::error::{AppError, AppResult};
use crate::schema::NamedSchema;
use serde::Serialize;

/// Managed object-model backend.
pub mod managed;

/// Native engine (header/source) backend.
pub mod native;

/// A single generated artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedFile {
    /// Relative output path, forward slashes.
    pub file_name: String,
    /// Full file contents.
    pub content: String,
}

/// Everything a backend needs: the dependency-ordered schema set.
#[derive(Debug)]
pub struct GenerationContext {
    /// Extraction output, dependencies first.
    pub ordered_schemas: Vec<NamedSchema>,
}

/// The outcome of one backend run.
#[derive(Debug)]
pub struct GenerationOutput {
    /// Artifacts to write, in a deterministic order.
    pub files: Vec<GeneratedFile>,
    /// Schemas that could not be rendered. They are excluded from `files`
    /// but do not abort the run.
    pub skipped: Vec<AppError>,
}

/// A source generation backend.
pub trait SourceGenerator {
    /// Short identifier for logs and CLI selection.
    fn target(&self) -> &'static str;

    /// Renders the schema set.
    fn generate(&self, context: &GenerationContext) -> AppResult<GenerationOutput>;
}
