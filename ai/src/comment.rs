use async_trait::async_trait;
use nerdmath_learning::{CommentContext, CommentWriter, LearningError, LearningResult};
use std::sync::Arc;

use crate::llm::{CompletionRequest, LlmClient};
use crate::prompts::{PromptLibrary, DIAGNOSTIC_COMMENT_PROMPT};

const COMMENT_MAX_TOKENS: u16 = 400;

/// Diagnostic feedback written by the LLM from the analysis summary.
pub struct LlmCommentWriter {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLibrary>,
    model: String,
}

impl LlmCommentWriter {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLibrary>, model: impl Into<String>) -> Self {
        Self {
            llm,
            prompts,
            model: model.into(),
        }
    }
}

#[async_trait]
impl CommentWriter for LlmCommentWriter {
    async fn write_comment(&self, context: &CommentContext) -> LearningResult<String> {
        let system = self
            .prompts
            .load(DIAGNOSTIC_COMMENT_PROMPT)
            .map_err(|e| LearningError::Comment(e.to_string()))?;
        let user = serde_json::to_string_pretty(context).map_err(|e| LearningError::Comment(e.to_string()))?;

        let request = CompletionRequest {
            model: self.model.clone(),
            system: system.to_string(),
            user,
            json_mode: false,
            max_tokens: Some(COMMENT_MAX_TOKENS),
        };
        let comment = self
            .llm
            .complete(&request)
            .await
            .map_err(|e| LearningError::Comment(e.to_string()))?;
        Ok(comment.trim().to_string())
    }
}
