//! Pipeline orchestration.
//!
//! Sequences context analysis, prompt composition, the model call, parsing
//! and archive assembly, and owns the error boundary: nothing below here
//! throws outward. Every fault becomes a `BuildResult` with `success =
//! false` and a message the caller can show to the user.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use super::archive::{create_zip_base64, BuildResult};
use super::context::analyze_context;
use super::parser::parse;
use super::prompt::compose_prompt;

/// The external model collaborator: one prompt in, the full response text
/// out. Streaming callers must concatenate chunks before handing the text
/// to this pipeline; a partially-streamed response is never parsed.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Runs one materialization attempt per call. Holds no per-request state;
/// concurrent invocations for different sessions share nothing mutable.
pub struct ProjectGenerator {
    client: Arc<dyn Completion>,
}

impl ProjectGenerator {
    pub fn new(client: Arc<dyn Completion>) -> Self {
        Self { client }
    }

    /// Builds a downloadable project from conversation text.
    pub async fn build_project(&self, conversation: &str) -> BuildResult {
        match self.try_build(conversation).await {
            Ok(result) => result,
            Err(e) => BuildResult::failure(format!("project build failed: {}", e)),
        }
    }

    async fn try_build(&self, conversation: &str) -> Result<BuildResult> {
        let context = analyze_context(conversation);
        let prompt = compose_prompt(&context, conversation);

        let response = self.client.complete(&prompt).await?;

        let files = parse(&response);
        if files.is_empty() {
            // Normal outcome for a response that matched no grammar; the
            // archive step is never touched.
            return Ok(BuildResult::failure(
                "no files recognized in the model output - unsupported format",
            ));
        }

        Ok(create_zip_base64(&files))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedModel {
        response: &'static str,
    }

    #[async_trait]
    impl Completion for FixedModel {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.response.to_string())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl Completion for FailingModel {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            anyhow::bail!("connection reset")
        }
    }

    fn generator(response: &'static str) -> ProjectGenerator {
        ProjectGenerator::new(Arc::new(FixedModel { response }))
    }

    #[tokio::test]
    async fn well_formed_response_builds_an_archive() {
        let generator = generator("## /src/main.rs\n```rust\nfn main() {}\n```\n");

        let result = generator.build_project("a rust cli").await;

        assert!(result.success);
        assert!(result.errors.is_empty());
        assert!(!result.zip_base64.is_empty());
    }

    #[tokio::test]
    async fn unrecognized_response_short_circuits_before_archiving() {
        let generator = generator("I'm sorry, I can only chat about the weather.");

        let result = generator.build_project("a rust cli").await;

        assert!(!result.success);
        assert!(result.zip_base64.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("no files recognized"));
    }

    #[tokio::test]
    async fn model_failure_is_shaped_not_thrown() {
        let generator = ProjectGenerator::new(Arc::new(FailingModel));

        let result = generator.build_project("anything").await;

        assert!(!result.success);
        assert!(result.errors[0].contains("connection reset"));
    }

    #[tokio::test]
    async fn per_entry_archive_errors_are_propagated_verbatim() {
        let generator = generator(
            "## /good.txt\n```\nok\n```\n## /../escape.txt\n```\nbad\n```\n",
        );

        let result = generator.build_project("x").await;

        assert!(result.success);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("escape.txt"));
    }
}
