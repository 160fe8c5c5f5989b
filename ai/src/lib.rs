//! LLM integration for the tutoring endpoints and diagnostic feedback.

pub mod chat;
pub mod comment;
pub mod errors;
pub mod llm;
pub mod prompts;
pub mod tutor;

pub use chat::chat_reply;
pub use comment::LlmCommentWriter;
pub use errors::{AiError, AiResult};
pub use llm::{CompletionRequest, LlmClient, OpenAiClient, StaticLlm};
pub use prompts::PromptLibrary;
pub use tutor::{TutorKind, TutorReply, TutorService, TutorStatus};
