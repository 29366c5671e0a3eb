use std::sync::Arc;

use anyhow::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::api::{ApiClient, ChatMessage as ApiMessage, StreamingResponse};
use crate::chat::{ChatMessage, ChatSession, MessageType};
use crate::config::Config;
use crate::output::OutputHandler;
use crate::project::{BuildResult, ProjectGenerator};

/// Application state for one interactive run: config, the model client and
/// the active session.
pub struct App {
    pub config: Config,
    api_client: Option<ApiClient>,
    pub session: ChatSession,
    pub output: OutputHandler,
}

impl App {
    pub fn new(debug: bool) -> Result<Self> {
        let config = Config::load_or_default()?;

        Ok(Self {
            config,
            api_client: None,
            session: ChatSession::new("interactive"),
            output: OutputHandler::new().with_debug(debug),
        })
    }

    pub fn initialize_api_client(&mut self) -> Result<()> {
        self.api_client = Some(ApiClient::new(
            &self.config.ai.provider,
            &self.config.ai.api_url,
            &self.config.ai.api_key,
            &self.config.ai.model,
        )?);
        Ok(())
    }

    fn api_client(&self) -> Result<&ApiClient> {
        self.api_client
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("API client not initialized"))
    }

    pub fn clear_conversation(&mut self) {
        self.session.messages.clear();
    }

    /// Sends one chat turn, printing chunks as they stream in, and records
    /// both sides in the session.
    pub async fn chat_turn(&mut self, input: &str) -> Result<()> {
        let history: Vec<ApiMessage> = self
            .session
            .messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.message_type {
                    MessageType::User => "user".to_string(),
                    MessageType::Assistant => "assistant".to_string(),
                    _ => "system".to_string(),
                },
                content: m.content.clone(),
            })
            .collect();

        self.session
            .push(ChatMessage::new(MessageType::User, input.to_string()));

        let mut rx = self
            .api_client()?
            .send_message_stream(input, Some(history))
            .await?;

        self.output.start_assistant()?;
        let mut full_response = String::new();

        while let Some(event) = rx.recv().await {
            match event {
                StreamingResponse::Start => {}
                StreamingResponse::Chunk(chunk) => {
                    full_response.push_str(&chunk);
                    self.output.print_streaming_chunk(&chunk)?;
                }
                StreamingResponse::End(_) => break,
                StreamingResponse::Error(e) => {
                    self.output.end_line();
                    anyhow::bail!(e);
                }
            }
        }
        self.output.end_line();

        self.session
            .push(ChatMessage::new(MessageType::Assistant, full_response));
        Ok(())
    }

    /// Runs the materialization pipeline over the current conversation.
    pub async fn build_project(&mut self) -> Result<BuildResult> {
        let conversation = self.session.conversation_text();
        if conversation.is_empty() {
            anyhow::bail!("nothing to build from - the conversation is empty");
        }

        self.build_from_text(&conversation).await
    }

    /// Runs the materialization pipeline over arbitrary conversation text,
    /// using the client set up by `initialize_api_client`.
    pub async fn build_from_text(&self, conversation: &str) -> Result<BuildResult> {
        let client = self.api_client()?.clone();
        let generator = ProjectGenerator::new(Arc::new(client));

        let spinner = build_spinner("asking the model for the project...");
        let result = generator.build_project(conversation).await;
        spinner.finish_and_clear();

        Ok(result)
    }

    /// Decodes a successful build and writes the archive next to the user.
    pub fn write_archive(&mut self, result: &BuildResult, path: &std::path::Path) -> Result<()> {
        let bytes = BASE64.decode(&result.zip_base64)?;
        std::fs::write(path, bytes)?;
        self.output
            .print_system(&format!("archive written to {}", path.display()));
        Ok(())
    }
}

fn build_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn build_from_text_requires_an_initialized_client() {
        let app = App::new(false).unwrap();

        let result = app.build_from_text("user: build a cli").await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not initialized"));
    }

    #[tokio::test]
    async fn initialize_wires_the_configured_client() {
        let mut app = App::new(false).unwrap();
        app.initialize_api_client().unwrap();

        assert!(app.api_client().is_ok());
    }
}
