use nerdmath_models::ProblemDocument;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::errors::AiResult;
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompts::{PromptLibrary, CONCEPT_PROMPT, RECOMMEND_PROMPT, SOLVE_PROMPT};

const TUTOR_MAX_TOKENS: u16 = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TutorKind {
    Solve,
    Concept,
    Recommend,
}

impl TutorKind {
    pub fn prompt_name(&self) -> &'static str {
        match self {
            TutorKind::Solve => SOLVE_PROMPT,
            TutorKind::Concept => CONCEPT_PROMPT,
            TutorKind::Recommend => RECOMMEND_PROMPT,
        }
    }

    /// Label placed before the learner's text in the user message.
    pub fn label(&self) -> &'static str {
        match self {
            TutorKind::Solve => "사용자 질문",
            TutorKind::Concept => "개념 설명 요청",
            TutorKind::Recommend => "추천 요청",
        }
    }

    /// Key the parsed reply is returned under.
    pub fn response_key(&self) -> &'static str {
        match self {
            TutorKind::Solve => "ai_solution",
            TutorKind::Concept => "ai_concept",
            TutorKind::Recommend => "ai_recommendation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TutorStatus {
    Success,
    PartialSuccess,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TutorReply {
    pub kind: TutorKind,
    pub status: TutorStatus,
    pub payload: Value,
    pub error: Option<String>,
}

impl TutorReply {
    /// `{problem, <response_key>, status[, error]}`
    pub fn into_response(self, problem: &ProblemDocument) -> Value {
        let mut body = Map::new();
        body.insert("problem".to_string(), problem.0.clone());
        body.insert(self.kind.response_key().to_string(), self.payload);
        body.insert("status".to_string(), json!(self.status));
        if let Some(error) = self.error {
            body.insert("error".to_string(), Value::String(error));
        }
        Value::Object(body)
    }
}

pub struct TutorService {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLibrary>,
    model: String,
}

impl TutorService {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLibrary>, model: impl Into<String>) -> Self {
        Self {
            llm,
            prompts,
            model: model.into(),
        }
    }

    pub fn user_message(kind: TutorKind, problem: &ProblemDocument, text: &str) -> String {
        format!("문제: {}\n\n{}: {}", problem.question(), kind.label(), text)
    }

    pub async fn assist(&self, kind: TutorKind, problem: &ProblemDocument, text: &str) -> AiResult<TutorReply> {
        let system = self.prompts.load(kind.prompt_name())?;
        let request = CompletionRequest {
            model: self.model.clone(),
            system: system.to_string(),
            user: Self::user_message(kind, problem, text),
            json_mode: true,
            max_tokens: Some(TUTOR_MAX_TOKENS),
        };

        let raw = self.llm.complete(&request).await?;
        Ok(match serde_json::from_str::<Value>(&raw) {
            Ok(payload) => TutorReply {
                kind,
                status: TutorStatus::Success,
                payload,
                error: None,
            },
            Err(e) => {
                tracing::warn!(problem_id = ?problem.id(), error = %e, "LLM reply was not valid JSON");
                TutorReply {
                    kind,
                    status: TutorStatus::PartialSuccess,
                    payload: json!({ "raw_response": raw }),
                    error: Some(format!("AI 응답 파싱 오류: {}", e)),
                }
            }
        })
    }
}
