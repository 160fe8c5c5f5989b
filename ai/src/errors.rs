use async_openai::error::OpenAIError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("OpenAI API key is not configured")]
    NotConfigured,

    #[error("OpenAI request failed: {0}")]
    OpenAi(#[from] OpenAIError),

    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("Failed to read prompt {name}: {source}")]
    Prompt {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown prompt: {0}")]
    UnknownPrompt(String),
}

pub type AiResult<T> = Result<T, AiError>;
