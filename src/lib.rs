// Library exports for Mason components

pub mod api;
pub mod app;
pub mod chat;
pub mod config;
pub mod output;
pub mod project;

// Re-export commonly used types
pub use api::{ApiClient, ApiResponse, StreamingResponse, Usage};
pub use app::App;
pub use chat::{ChatMessage, ChatSession, MessageType, SessionStore};
pub use config::{AiConfig, Config};
pub use output::OutputHandler;
pub use project::{
    analyze_context, compose_prompt, create_zip_base64, export_structure, normalize_path, parse,
    BuildResult, Completion, ParsedFile, ProjectBuilder, ProjectContext, ProjectGenerator,
    ProjectItem, ProjectStructure,
};
