use async_trait::async_trait;
use nerdmath_models::{LearnerClass, OverallLevel};
use serde::Serialize;

use crate::errors::LearningResult;

/// What a comment writer gets to see about a finished diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentContext {
    pub accuracy_rate: f64,
    pub average_seconds: f64,
    pub total_answers: usize,
    pub overall_level: OverallLevel,
    pub class: LearnerClass,
    pub weak_units: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_range: Option<String>,
}

/// Produces the free-text feedback attached to an analysis.
#[async_trait]
pub trait CommentWriter: Send + Sync {
    async fn write_comment(&self, context: &CommentContext) -> LearningResult<String>;
}

/// Deterministic comment used when no writer is configured or it fails.
pub fn template_comment(context: &CommentContext) -> String {
    let mut comment = format!(
        "정답률 {:.1}%로 전체 성취 수준은 '{}'이며, {} 단계입니다.",
        context.accuracy_rate,
        context.overall_level.label_ko(),
        context.class.label_ko()
    );
    match context.weak_units.as_slice() {
        [] => comment.push_str(" 모든 단원에서 고르게 좋은 결과를 보였으니 심화 문제에 도전해 보세요."),
        [only] => comment.push_str(&format!(" '{}' 단원을 먼저 복습하는 것을 추천합니다.", only)),
        units => {
            let shown: Vec<String> = units.iter().take(3).map(|u| format!("'{}'", u)).collect();
            comment.push_str(&format!(
                " {} 단원이 취약하니 선수 개념부터 차근차근 복습하는 것을 추천합니다.",
                shown.join(", ")
            ));
        }
    }
    comment
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(weak_units: &[&str]) -> CommentContext {
        CommentContext {
            accuracy_rate: 62.5,
            average_seconds: 48.0,
            total_answers: 8,
            overall_level: OverallLevel::Medium,
            class: LearnerClass::Developing,
            weak_units: weak_units.iter().map(|s| s.to_string()).collect(),
            grade_range: None,
        }
    }

    #[test]
    fn test_template_mentions_accuracy_and_units() {
        let comment = template_comment(&context(&["정수와 유리수"]));
        assert!(comment.starts_with("정답률 62.5%"));
        assert!(comment.contains("보통"));
        assert!(comment.contains("'정수와 유리수' 단원을 먼저"));
    }

    #[test]
    fn test_template_lists_at_most_three_units() {
        let comment = template_comment(&context(&["a", "b", "c", "d"]));
        assert!(comment.contains("'a', 'b', 'c'"));
        assert!(!comment.contains("'d'"));
        assert!(template_comment(&context(&[])).contains("심화 문제"));
    }
}
