use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::{AiError, AiResult};

pub const SOLVE_PROMPT: &str = "solve_prompt_v1";
pub const CONCEPT_PROMPT: &str = "concept_prompt_v1";
pub const RECOMMEND_PROMPT: &str = "rag_prompt_v1";
pub const DIAGNOSTIC_COMMENT_PROMPT: &str = "diagnostic_comment_v1";

const BUILTIN_SOLVE: &str = "당신은 중학교 수학을 가르치는 친절한 AI 튜터입니다. \
주어진 문제와 학생의 질문을 읽고 풀이 과정을 단계별로 설명하세요. \
반드시 JSON 객체로만 답하세요: \
{\"steps\": [\"단계별 풀이\"], \"answer\": \"최종 답\", \"hint\": \"다음에 도움이 될 힌트\"}";

const BUILTIN_CONCEPT: &str = "당신은 중학교 수학 개념을 설명하는 AI 튜터입니다. \
주어진 문제와 관련된 개념을 학생 눈높이에 맞게 설명하세요. \
반드시 JSON 객체로만 답하세요: \
{\"concept\": \"개념 이름\", \"explanation\": \"설명\", \"examples\": [\"예시\"], \"related_concepts\": [\"관련 개념\"]}";

const BUILTIN_RECOMMEND: &str = "당신은 학습 경로를 추천하는 AI 튜터입니다. \
주어진 문제와 요청을 바탕으로 다음에 공부할 개념과 문제 유형을 추천하세요. \
반드시 JSON 객체로만 답하세요: \
{\"recommendations\": [{\"title\": \"추천 항목\", \"reason\": \"추천 이유\"}], \"next_step\": \"다음 학습 단계\"}";

const BUILTIN_DIAGNOSTIC_COMMENT: &str = "당신은 진단 평가 결과를 해설하는 수학 선생님입니다. \
정답률, 풀이 시간, 취약 단원 정보를 바탕으로 학생에게 격려와 구체적인 학습 조언을 \
세 문장 이내의 한국어로 작성하세요. 평문으로만 답하세요.";

fn builtin(name: &str) -> Option<&'static str> {
    match name {
        SOLVE_PROMPT => Some(BUILTIN_SOLVE),
        CONCEPT_PROMPT => Some(BUILTIN_CONCEPT),
        RECOMMEND_PROMPT => Some(BUILTIN_RECOMMEND),
        DIAGNOSTIC_COMMENT_PROMPT => Some(BUILTIN_DIAGNOSTIC_COMMENT),
        _ => None,
    }
}

/// System prompts read from `<dir>/<name>.txt`, cached after the first read.
///
/// A missing file falls back to the built-in prompt of the same name.
pub struct PromptLibrary {
    dir: PathBuf,
    cache: RwLock<HashMap<String, Arc<str>>>,
}

impl PromptLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load(&self, name: &str) -> AiResult<Arc<str>> {
        if let Some(prompt) = self.cache.read().get(name) {
            return Ok(prompt.clone());
        }

        let path = self.dir.join(format!("{}.txt", name));
        let prompt: Arc<str> = match std::fs::read_to_string(&path) {
            Ok(text) => Arc::from(text.trim()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let text = builtin(name).ok_or_else(|| AiError::UnknownPrompt(name.to_string()))?;
                tracing::debug!(prompt = name, "Using built-in prompt");
                Arc::from(text)
            }
            Err(source) => {
                return Err(AiError::Prompt {
                    name: name.to_string(),
                    source,
                })
            }
        };

        self.cache.write().insert(name.to_string(), prompt.clone());
        Ok(prompt)
    }
}
