//! Text-to-project materialization pipeline.
//!
//! Turns a model's free-form project description into a downloadable zip:
//! context analysis parametrizes the prompt, the parser recovers `(path,
//! content)` pairs from whatever grammar the model actually used, and the
//! archive builder packages them with per-entry failure isolation.

pub mod archive;
pub mod builder;
pub mod context;
pub mod generator;
pub mod parser;
pub mod prompt;
pub mod structure;

pub use archive::{create_zip_base64, BuildResult};
pub use builder::{ProjectBuilder, ProjectFile};
pub use context::{analyze_context, ProjectContext};
pub use generator::{Completion, ProjectGenerator};
pub use parser::{normalize_path, parse, ParsedFile};
pub use prompt::compose_prompt;
pub use structure::{export_structure, ItemType, ProjectItem, ProjectStructure};
