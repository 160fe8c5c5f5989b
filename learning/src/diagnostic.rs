use chrono::Utc;
use nerdmath_config::LearningConfig;
use nerdmath_database::Catalog;
use nerdmath_models::{
    DiagnosticAnalysis, ExpressDiagnosticRequest, LearnerClass, OverallLevel, RecommendedPathItem, UnitStat,
};
use std::sync::Arc;

use crate::comment::{template_comment, CommentContext, CommentWriter};
use crate::errors::{LearningError, LearningResult};
use crate::units::UnitResolver;

pub fn classify_learner(accuracy_rate: f64, average_seconds: f64) -> LearnerClass {
    if accuracy_rate >= 85.0 && average_seconds <= 120.0 {
        LearnerClass::Advanced
    } else if accuracy_rate >= 70.0 {
        LearnerClass::Proficient
    } else if accuracy_rate >= 40.0 {
        LearnerClass::Developing
    } else {
        LearnerClass::Beginning
    }
}

pub fn overall_level(accuracy_rate: f64) -> OverallLevel {
    if accuracy_rate >= 80.0 {
        OverallLevel::High
    } else if accuracy_rate >= 50.0 {
        OverallLevel::Medium
    } else {
        OverallLevel::Low
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Units with at least one wrong answer, worst first. Ties keep the order in
/// which the units were first answered.
fn rank_weak_units(stats: &[UnitStat]) -> Vec<&UnitStat> {
    let mut weak: Vec<&UnitStat> = stats.iter().filter(|s| s.wrong > 0).collect();
    weak.sort_by(|a, b| {
        b.error_rate
            .total_cmp(&a.error_rate)
            .then_with(|| b.wrong.cmp(&a.wrong))
    });
    weak
}

fn recommended_path(weak: &[&UnitStat], limit: usize) -> Vec<RecommendedPathItem> {
    weak.iter()
        .take(limit)
        .enumerate()
        .map(|(i, stat)| {
            let priority = i as u32 + 1;
            let percent = ((stat.error_rate * 100.0).round() as u32).max(10);
            RecommendedPathItem {
                unit_id: stat
                    .unit_id
                    .clone()
                    .unwrap_or_else(|| format!("unit_{:03}", priority)),
                unit_title: stat.unit_title.clone(),
                priority,
                reason: format!("오답률 {}%로 취약한 단원", percent),
            }
        })
        .collect()
}

/// Scores a diagnostic and produces its analysis.
pub struct DiagnosticService {
    resolver: UnitResolver,
    comments: Option<Arc<dyn CommentWriter>>,
    config: LearningConfig,
}

impl DiagnosticService {
    pub fn new(catalog: Arc<dyn Catalog>, config: LearningConfig) -> Self {
        Self {
            resolver: UnitResolver::new(catalog),
            comments: None,
            config,
        }
    }

    pub fn with_comment_writer(mut self, writer: Arc<dyn CommentWriter>) -> Self {
        self.comments = Some(writer);
        self
    }

    /// Per-unit attempts and misses, in order of first appearance.
    async fn unit_stats(&self, request: &ExpressDiagnosticRequest) -> Vec<UnitStat> {
        let mut stats: Vec<UnitStat> = Vec::new();
        for answer in &request.answers {
            let unit = self.resolver.resolve(&answer.problem_id.to_string()).await;
            let position = stats.iter().position(|s| s.unit_title == unit.title);
            let stat = match position {
                Some(i) => &mut stats[i],
                None => {
                    stats.push(UnitStat {
                        unit_id: unit.unit_id.clone(),
                        unit_title: unit.title.clone(),
                        attempts: 0,
                        wrong: 0,
                        error_rate: 0.0,
                    });
                    let last = stats.len() - 1;
                    &mut stats[last]
                }
            };
            if stat.unit_id.is_none() {
                stat.unit_id = unit.unit_id;
            }
            stat.attempts += 1;
            if !answer.is_correct {
                stat.wrong += 1;
            }
        }
        for stat in &mut stats {
            stat.error_rate = f64::from(stat.wrong) / f64::from(stat.attempts);
        }
        stats
    }

    async fn comment(&self, context: &CommentContext) -> String {
        if let Some(writer) = &self.comments {
            match writer.write_comment(context).await {
                Ok(comment) if !comment.trim().is_empty() => return comment,
                Ok(_) => tracing::warn!("Comment writer returned an empty comment"),
                Err(e) => tracing::warn!(error = %e, "Comment writer failed, using template"),
            }
        }
        template_comment(context)
    }

    pub async fn analyze(&self, request: &ExpressDiagnosticRequest) -> LearningResult<DiagnosticAnalysis> {
        if request.test_id.trim().is_empty() {
            return Err(LearningError::InvalidRequest("testId is required".to_string()));
        }

        let answered = request.answers.len();
        let correct = request.answers.iter().filter(|a| a.is_correct).count();
        let (accuracy_rate, average_seconds) = if answered == 0 {
            (0.0, 0.0)
        } else {
            let total_seconds: f64 = request.answers.iter().map(|a| a.duration_seconds).sum();
            (
                correct as f64 / answered as f64 * 100.0,
                total_seconds / answered as f64,
            )
        };

        let unit_stats = self.unit_stats(request).await;
        let weak = rank_weak_units(&unit_stats);
        let weak_units: Vec<String> = weak.iter().map(|s| s.unit_title.clone()).collect();
        let recommended = recommended_path(&weak, self.config.max_recommended);

        let class = classify_learner(accuracy_rate, average_seconds);
        let level = overall_level(accuracy_rate);
        let context = CommentContext {
            accuracy_rate: round1(accuracy_rate),
            average_seconds: round1(average_seconds),
            total_answers: answered,
            overall_level: level,
            class,
            weak_units: weak_units.clone(),
            grade_range: request.grade_range.clone(),
        };
        let ai_comment = self.comment(&context).await;

        tracing::info!(
            test_id = %request.test_id,
            answered,
            accuracy = context.accuracy_rate,
            weak_units = weak_units.len(),
            class = ?class,
            "Diagnostic analyzed"
        );

        Ok(DiagnosticAnalysis {
            analysis_id: uuid::Uuid::new_v4().to_string(),
            test_id: request.test_id.clone(),
            user_id: request.user_id.clone(),
            accuracy_rate: context.accuracy_rate,
            average_seconds: context.average_seconds,
            weak_concepts: weak_units.clone(),
            weak_units,
            unit_stats,
            overall_level: level,
            class,
            ai_comment,
            recommended_start_unit: recommended.first().map(|r| r.unit_title.clone()),
            recommended_path: recommended,
            recommended_start_concept: None,
            grade_range: request.grade_range.clone(),
            generated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nerdmath_database::InMemoryCatalog;
    use nerdmath_models::ProblemDocument;
    use serde_json::json;

    struct FixedComment(Option<&'static str>);

    #[async_trait]
    impl CommentWriter for FixedComment {
        async fn write_comment(&self, _context: &CommentContext) -> LearningResult<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| LearningError::Comment("offline".to_string()))
        }
    }

    fn request(answers: serde_json::Value) -> ExpressDiagnosticRequest {
        serde_json::from_value(json!({
            "testId": "test-1",
            "userId": 7,
            "gradeRange": "1-2",
            "answers": answers
        }))
        .unwrap()
    }

    fn service() -> DiagnosticService {
        let catalog = InMemoryCatalog::new();
        for (id, unit) in [("a1", "unit_01_01"), ("a2", "unit_01_01"), ("b1", "unit_01_02"), ("b2", "unit_01_02"), ("b3", "unit_01_02")] {
            catalog.insert_problem(ProblemDocument::new(json!({ "problemId": id, "unitId": unit })));
        }
        catalog.insert_unit(serde_json::from_value(json!({ "unitId": "unit_01_01", "title": "소인수분해" })).unwrap());
        catalog.insert_unit(serde_json::from_value(json!({ "unitId": "unit_01_02", "title": "정수와 유리수" })).unwrap());
        DiagnosticService::new(Arc::new(catalog), LearningConfig::default())
    }

    #[test]
    fn test_learner_class_thresholds() {
        assert_eq!(classify_learner(90.0, 60.0), LearnerClass::Advanced);
        assert_eq!(classify_learner(90.0, 180.0), LearnerClass::Proficient);
        assert_eq!(classify_learner(70.0, 10.0), LearnerClass::Proficient);
        assert_eq!(classify_learner(65.0, 120.0), LearnerClass::Developing);
        assert_eq!(classify_learner(39.9, 10.0), LearnerClass::Beginning);
        assert_eq!(overall_level(80.0), OverallLevel::High);
        assert_eq!(overall_level(50.0), OverallLevel::Medium);
        assert_eq!(overall_level(49.9), OverallLevel::Low);
    }

    #[tokio::test]
    async fn test_analysis_ranks_weak_units() {
        let analysis = service()
            .analyze(&request(json!([
                { "problemId": "a1", "isCorrect": false, "durationSeconds": 30 },
                { "problemId": "b1", "isCorrect": false, "durationSeconds": 40 },
                { "problemId": "a2", "isCorrect": true, "durationSeconds": 20 },
                { "problemId": "b2", "isCorrect": false, "durationSeconds": 50 },
                { "problemId": "b3", "isCorrect": true, "durationSeconds": 60 },
                { "problemId": "3.1-01", "isCorrect": true, "durationSeconds": 40 }
            ])))
            .await
            .unwrap();

        assert_eq!(analysis.accuracy_rate, 50.0);
        assert_eq!(analysis.average_seconds, 40.0);
        assert_eq!(analysis.overall_level, OverallLevel::Medium);
        assert_eq!(analysis.class, LearnerClass::Developing);
        assert_eq!(analysis.weak_units, vec!["정수와 유리수", "소인수분해"]);
        assert_eq!(analysis.unit_stats.len(), 3);
        assert_eq!(analysis.unit_stats[2].unit_title, "3. 함수");

        let first = &analysis.recommended_path[0];
        assert_eq!(first.unit_id, "unit_01_02");
        assert_eq!(first.priority, 1);
        assert_eq!(first.reason, "오답률 67%로 취약한 단원");
        assert_eq!(analysis.recommended_start_unit.as_deref(), Some("정수와 유리수"));
        assert!(analysis.ai_comment.starts_with("정답률 50.0%"));
    }

    #[tokio::test]
    async fn test_placeholder_unit_ids_and_reason_floor() {
        let answers: Vec<_> = (0..12)
            .map(|i| json!({ "problemId": format!("2.{}-x", i), "isCorrect": i != 0 }))
            .collect();
        let analysis = service().analyze(&request(json!(answers))).await.unwrap();
        let first = &analysis.recommended_path[0];
        assert_eq!(first.unit_title, "2. 문자와 식");
        assert_eq!(first.unit_id, "unit_001");
        assert_eq!(first.reason, "오답률 10%로 취약한 단원");
    }

    #[tokio::test]
    async fn test_comment_writer_and_fallback() {
        let answers = json!([{ "problemId": "a1", "isCorrect": true }]);

        let analysis = service()
            .with_comment_writer(Arc::new(FixedComment(Some("잘했어요"))))
            .analyze(&request(answers.clone()))
            .await
            .unwrap();
        assert_eq!(analysis.ai_comment, "잘했어요");

        let analysis = service()
            .with_comment_writer(Arc::new(FixedComment(None)))
            .analyze(&request(answers))
            .await
            .unwrap();
        assert!(analysis.ai_comment.starts_with("정답률 100.0%"));
        assert!(analysis.weak_units.is_empty());
        assert!(analysis.recommended_path.is_empty());
    }

    #[tokio::test]
    async fn test_empty_answers_and_missing_test_id() {
        let analysis = service().analyze(&request(json!([]))).await.unwrap();
        assert_eq!(analysis.accuracy_rate, 0.0);
        assert_eq!(analysis.class, LearnerClass::Beginning);

        let mut bad = request(json!([]));
        bad.test_id = " ".to_string();
        assert!(matches!(
            service().analyze(&bad).await,
            Err(LearningError::InvalidRequest(_))
        ));
    }
}
