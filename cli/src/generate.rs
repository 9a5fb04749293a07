#![deny(missing_docs)]

//! # Generate Command
//!
//! Pools the schemas of every input document and writes the generated SDK
//! sources. Per-schema failures are printed and skipped; only document-level
//! failures and unresolved name conflicts abort the run.

use std::fs;
use std::path::{Path, PathBuf};

use sdkgen_core::{
    extract, AppError, AppResult, ConflictResolutionStrategy, Document, GenerationContext,
    ManagedModelGenerator, NativeEngineGenerator, SourceGenerator,
};

/// Conflict handling, as exposed on the command line.
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum StrategyArg {
    /// Abort on any structural name conflict.
    Strict,
    /// Rename every conflicting instance.
    RenameAll,
    /// Keep the majority variant, rename the rest.
    RenameUncommonConflicts,
}

impl From<StrategyArg> for ConflictResolutionStrategy {
    fn from(arg: StrategyArg) -> ConflictResolutionStrategy {
        match arg {
            StrategyArg::Strict => ConflictResolutionStrategy::Strict,
            StrategyArg::RenameAll => ConflictResolutionStrategy::RenameAll,
            StrategyArg::RenameUncommonConflicts => {
                ConflictResolutionStrategy::RenameUncommonConflicts
            }
        }
    }
}

/// Which backend(s) to run.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineArg {
    /// The managed object-model backend.
    Managed,
    /// The native header/source backend.
    Native,
    /// Both backends.
    All,
}

/// Arguments for the generate command.
#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    /// OpenAPI document(s) to pool. Repeat for multiple inputs.
    #[clap(long = "input", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output directory root.
    #[clap(long, default_value = "generated")]
    pub output: PathBuf,

    /// Conflict resolution strategy.
    #[clap(long, value_enum, default_value = "rename-uncommon-conflicts")]
    pub strategy: StrategyArg,

    /// Target backend.
    #[clap(long, value_enum, default_value = "all")]
    pub engine: EngineArg,
}

/// Loads one OpenAPI document, dispatching on file extension.
fn load_document(path: &Path) -> AppResult<Document> {
    let source = fs::read_to_string(path)
        .map_err(|e| AppError::General(format!("Failed to read {:?}: {}", path, e)))?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Document::from_json(&source),
        _ => Document::from_yaml(&source),
    }
    .map_err(|e| AppError::General(format!("{:?}: {}", path, e)))
}

/// Executes the generation pipeline.
pub fn execute(args: &GenerateArgs) -> AppResult<()> {
    let mut documents = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        documents.push(load_document(input)?);
    }

    let extraction = extract(&documents, args.strategy.into())?;

    for difference in &extraction.differences {
        eprintln!("conflict: {}", difference);
    }
    for diagnostic in &extraction.diagnostics {
        eprintln!("skipped: {}", diagnostic);
    }

    let mut generators: Vec<Box<dyn SourceGenerator>> = Vec::new();
    if matches!(args.engine, EngineArg::Managed | EngineArg::All) {
        generators.push(Box::new(ManagedModelGenerator));
    }
    if matches!(args.engine, EngineArg::Native | EngineArg::All) {
        generators.push(Box::new(NativeEngineGenerator));
    }

    let context = GenerationContext {
        ordered_schemas: extraction.ordered,
    };

    let mut written = 0usize;
    for generator in &generators {
        let output = generator.generate(&context)?;
        for skip in &output.skipped {
            eprintln!("skipped ({}): {}", generator.target(), skip);
        }
        let root = args.output.join(generator.target());
        for file in &output.files {
            let path = root.join(&file.file_name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| AppError::General(format!("Failed to create output dir: {}", e)))?;
            }
            fs::write(&path, &file.content)
                .map_err(|e| AppError::General(format!("Failed to write {:?}: {}", path, e)))?;
            written += 1;
        }
    }

    println!(
        "Generated {} file(s) from {} document(s) into {:?}",
        written,
        documents.len(),
        args.output
    );

    Ok(())
}
