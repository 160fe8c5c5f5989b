use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionResponseFormat,
        ChatCompletionResponseFormatType, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use nerdmath_config::OpenAiConfig;
use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::errors::{AiError, AiResult};

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    /// Ask for a single JSON object as the reply.
    pub json_mode: bool,
    pub max_tokens: Option<u16>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> AiResult<String>;
}

/// Chat completions against the OpenAI API.
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig) -> AiResult<Self> {
        let api_key = config.api_key.as_deref().ok_or(AiError::NotConfigured)?;
        let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = &config.api_base {
            openai_config = openai_config.with_api_base(base);
        }
        Ok(Self {
            client: Client::with_config(openai_config),
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> AiResult<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system.as_str())
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.user.as_str())
                .build()?
                .into(),
        ];

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(request.model.as_str()).messages(messages);
        if request.json_mode {
            builder.response_format(ChatCompletionResponseFormat {
                r#type: ChatCompletionResponseFormatType::JsonObject,
            });
        }
        if let Some(max_tokens) = request.max_tokens {
            builder.max_tokens(max_tokens);
        }

        let response = self.client.chat().create(builder.build()?).await?;
        tracing::debug!(model = %request.model, usage = ?response.usage, "Chat completion finished");

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AiError::EmptyResponse)
    }
}

/// Replays canned replies in order; records every request it receives.
///
/// Used by the service tests.
#[derive(Default)]
pub struct StaticLlm {
    replies: Mutex<VecDeque<AiResult<String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl StaticLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: impl Into<String>) -> Self {
        self.replies.lock().push_back(Ok(text.into()));
        self
    }

    pub fn fail(self, error: AiError) -> Self {
        self.replies.lock().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl LlmClient for StaticLlm {
    async fn complete(&self, request: &CompletionRequest) -> AiResult<String> {
        self.requests.lock().push(request.clone());
        self.replies.lock().pop_front().unwrap_or(Err(AiError::EmptyResponse))
    }
}
