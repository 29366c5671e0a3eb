use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::project::Completion;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub stream: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub response: String,
    pub success: bool,
    pub error: Option<String>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone)]
pub enum StreamingResponse {
    Start,
    Chunk(String),
    End(ApiResponse),
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AiProvider {
    OpenAi,
    Claude,
    Ollama,
    Custom,
}

const SYSTEM_PROMPT: &str = "You are Mason, an AI assistant that helps users design \
software and can materialize whole projects on request. Be concise and practical.";

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    pub provider: AiProvider,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ApiClient {
    pub fn new(provider: &str, endpoint: &str, api_key: &str, model: &str) -> Result<Self> {
        let provider = match provider.to_lowercase().as_str() {
            "openai" => AiProvider::OpenAi,
            "claude" | "anthropic" => AiProvider::Claude,
            "ollama" => AiProvider::Ollama,
            _ => AiProvider::Custom,
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent("mason-cli/0.1")
            .build()?;

        Ok(Self {
            client,
            provider,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    pub async fn send_message(
        &self,
        message: &str,
        conversation_history: Option<Vec<ChatMessage>>,
    ) -> Result<ApiResponse> {
        let messages = self.assemble_messages(message, conversation_history);

        match self.provider {
            AiProvider::OpenAi | AiProvider::Custom => self.send_openai_request(messages).await,
            AiProvider::Claude => self.send_claude_request(messages).await,
            AiProvider::Ollama => self.send_ollama_request(messages).await,
        }
    }

    /// Streams the response as it arrives. OpenAI-compatible providers use
    /// server-sent events; the rest fall back to a single chunk from the
    /// non-streaming call.
    pub async fn send_message_stream(
        &self,
        message: &str,
        conversation_history: Option<Vec<ChatMessage>>,
    ) -> Result<mpsc::UnboundedReceiver<StreamingResponse>> {
        let messages = self.assemble_messages(message, conversation_history);
        let (tx, rx) = mpsc::unbounded_channel();

        match self.provider {
            AiProvider::OpenAi | AiProvider::Custom => {
                let client = self.clone();
                tokio::spawn(async move {
                    if let Err(e) = client.stream_openai_request(messages, tx.clone()).await {
                        let _ = tx.send(StreamingResponse::Error(format!("streaming error: {}", e)));
                    }
                });
            }
            _ => {
                let client = self.clone();
                tokio::spawn(async move {
                    let _ = tx.send(StreamingResponse::Start);
                    let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
                    let history: Vec<ChatMessage> =
                        messages[..messages.len().saturating_sub(1)].to_vec();
                    match client.send_message(&last, Some(history)).await {
                        Ok(response) => {
                            let _ = tx.send(StreamingResponse::Chunk(response.response.clone()));
                            let _ = tx.send(StreamingResponse::End(response));
                        }
                        Err(e) => {
                            let _ = tx.send(StreamingResponse::Error(format!(
                                "request failed: {}",
                                e
                            )));
                        }
                    }
                });
            }
        }

        Ok(rx)
    }

    fn assemble_messages(
        &self,
        message: &str,
        conversation_history: Option<Vec<ChatMessage>>,
    ) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage {
            role: "system".to_string(),
            content: SYSTEM_PROMPT.to_string(),
        }];

        if let Some(history) = conversation_history {
            messages.extend(history.into_iter().filter(|m| m.role != "system"));
        }

        messages.push(ChatMessage {
            role: "user".to_string(),
            content: message.to_string(),
        });

        messages
    }

    async fn send_openai_request(&self, messages: Vec<ChatMessage>) -> Result<ApiResponse> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: 0.7,
            max_tokens: Some(4096),
            stream: Some(false),
        };

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .json(&request);
        if !self.api_key.is_empty() {
            builder = builder.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            anyhow::bail!("chat completion request failed: {}", error_text);
        }

        let chat_response: ChatResponse = response.json().await?;
        match chat_response.choices.first() {
            Some(choice) => Ok(ApiResponse {
                response: choice.message.content.clone(),
                success: true,
                error: None,
                usage: chat_response.usage,
            }),
            None => Ok(ApiResponse {
                response: String::new(),
                success: false,
                error: Some("no choices in response".to_string()),
                usage: None,
            }),
        }
    }

    async fn send_claude_request(&self, messages: Vec<ChatMessage>) -> Result<ApiResponse> {
        let claude_messages: Vec<Value> = messages
            .iter()
            .filter(|m| m.role != "system")
            .map(|m| json!({ "role": m.role, "content": m.content }))
            .collect();
        let system: String = messages
            .iter()
            .filter(|m| m.role == "system")
            .map(|m| m.content.clone())
            .collect::<Vec<_>>()
            .join("\n");

        let request = json!({
            "model": self.model,
            "system": system,
            "messages": claude_messages,
            "max_tokens": 4096,
            "temperature": 0.7
        });

        let mut builder = self
            .client
            .post(format!("{}/v1/messages", self.endpoint))
            .header("content-type", "application/json")
            .header("anthropic-version", "2023-06-01")
            .json(&request);
        if !self.api_key.is_empty() {
            builder = builder.header("x-api-key", &self.api_key);
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            anyhow::bail!("claude request failed: {}", error_text);
        }

        let body: Value = response.json().await?;
        if let Some(text) = body["content"]
            .as_array()
            .and_then(|blocks| blocks.first())
            .and_then(|block| block["text"].as_str())
        {
            return Ok(ApiResponse {
                response: text.to_string(),
                success: true,
                error: None,
                usage: None,
            });
        }

        Ok(ApiResponse {
            response: String::new(),
            success: false,
            error: Some("could not parse claude response".to_string()),
            usage: None,
        })
    }

    async fn send_ollama_request(&self, messages: Vec<ChatMessage>) -> Result<ApiResponse> {
        let prompt = messages
            .iter()
            .map(|m| format!("{}: {}", m.role.to_uppercase(), m.content))
            .collect::<Vec<_>>()
            .join("\n");

        let request = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": { "temperature": 0.7 }
        });

        let response = self
            .client
            .post(format!("{}/api/generate", self.endpoint))
            .json(&request)
            .send()
            .await?;
        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            anyhow::bail!("ollama request failed: {}", error_text);
        }

        let body: Value = response.json().await?;
        match body["response"].as_str() {
            Some(text) => Ok(ApiResponse {
                response: text.to_string(),
                success: true,
                error: None,
                usage: None,
            }),
            None => Ok(ApiResponse {
                response: String::new(),
                success: false,
                error: Some("could not parse ollama response".to_string()),
                usage: None,
            }),
        }
    }

    /// Streams an OpenAI-compatible chat completion, decoding `data:` SSE
    /// lines into chunks.
    async fn stream_openai_request(
        &self,
        messages: Vec<ChatMessage>,
        tx: mpsc::UnboundedSender<StreamingResponse>,
    ) -> Result<()> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: 0.7,
            max_tokens: Some(4096),
            stream: Some(true),
        };

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .json(&request);
        if !self.api_key.is_empty() {
            builder = builder.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            anyhow::bail!("chat completion request failed: {}", error_text);
        }

        let _ = tx.send(StreamingResponse::Start);

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut full_response = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(newline) = buffer.find('\n') {
                let line = buffer[..newline].trim().to_string();
                buffer.drain(..=newline);

                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };
                let data = data.trim();
                if data == "[DONE]" {
                    continue;
                }

                if let Ok(event) = serde_json::from_str::<Value>(data) {
                    if let Some(delta) = event["choices"][0]["delta"]["content"].as_str() {
                        full_response.push_str(delta);
                        let _ = tx.send(StreamingResponse::Chunk(delta.to_string()));
                    }
                }
            }
        }

        let _ = tx.send(StreamingResponse::End(ApiResponse {
            response: full_response,
            success: true,
            error: None,
            usage: None,
        }));

        Ok(())
    }
}

#[async_trait]
impl Completion for ApiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let response = self.send_message(prompt, None).await?;
        if !response.success {
            anyhow::bail!(
                "model call failed: {}",
                response.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }
        Ok(response.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion_body(content: &str) -> serde_json::Value {
        json!({
            "choices": [{
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
        })
    }

    #[tokio::test]
    async fn openai_request_extracts_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("hello")))
            .mount(&server)
            .await;

        let client = ApiClient::new("openai", &server.uri(), "test-key", "gpt-4").unwrap();
        let response = client.send_message("hi", None).await.unwrap();

        assert!(response.success);
        assert_eq!(response.response, "hello");
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }

    #[tokio::test]
    async fn http_error_surfaces_as_a_failed_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = ApiClient::new("openai", &server.uri(), "k", "gpt-4").unwrap();
        let result = client.send_message("hi", None).await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("boom"));
    }

    #[tokio::test]
    async fn completion_trait_returns_plain_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("## a.txt")))
            .mount(&server)
            .await;

        let client = ApiClient::new("custom", &server.uri(), "", "local").unwrap();
        let text = client.complete("generate").await.unwrap();

        assert_eq!(text, "## a.txt");
    }

    #[test]
    fn provider_names_are_case_insensitive() {
        let client = ApiClient::new("Claude", "https://api.anthropic.com", "k", "m").unwrap();
        assert_eq!(client.provider, AiProvider::Claude);

        let client = ApiClient::new("something-else", "http://localhost", "", "m").unwrap();
        assert_eq!(client.provider, AiProvider::Custom);
    }
}
