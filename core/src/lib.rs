#![deny(missing_docs)]

//! # SDKGen Core
//!
//! Core library for the OpenAPI-to-client-SDK compiler.

/// Shared error types.
pub mod error;

/// Schema intermediate representation.
pub mod schema;

/// Structural schema comparison.
pub mod equality;

/// OpenAPI document ingestion.
pub mod document;

/// Cross-document schema extraction and deduplication.
pub mod extract;

/// Type reference resolution (schema -> target type name).
pub mod resolve;

/// Model declaration synthesis.
pub mod synthesize;

/// Source generation backends.
pub mod backend;

pub use backend::managed::ManagedModelGenerator;
pub use backend::native::NativeEngineGenerator;
pub use backend::{GeneratedFile, GenerationContext, GenerationOutput, SourceGenerator};
pub use document::Document;
pub use equality::{are_equal, Difference};
pub use error::{AppError, AppResult};
pub use extract::{extract, ConflictResolutionStrategy, Extraction};
pub use resolve::{resolve, resolve_optional, TypeReference};
pub use schema::{collect_refs, NamedSchema, SchemaNode};
pub use synthesize::{synthesize, FieldDecl, FieldKind, ModelDeclaration, SchemaIndex};

/// A placeholder function to verify workspace setup.
pub fn is_operational() -> bool {
    true
}
