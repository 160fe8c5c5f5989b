use nerdmath_database::Catalog;
use std::sync::Arc;

/// Unit a problem belongs to, as far as it could be determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUnit {
    pub unit_id: Option<String>,
    pub title: String,
}

impl ResolvedUnit {
    fn titled(title: impl Into<String>) -> Self {
        Self {
            unit_id: None,
            title: title.into(),
        }
    }
}

/// Chapter title guessed from the leading digit of a problem id.
pub fn chapter_for_problem(problem_id: &str) -> &'static str {
    match problem_id.trim().split('.').next() {
        Some("2") => "2. 문자와 식",
        Some("3") => "3. 함수",
        Some("4") => "4. 기하",
        Some("5") => "5. 확률과 통계",
        _ => "1. 수와 연산",
    }
}

/// `"1.3 정수와 유리수"`: a numbered prefix followed by a title.
fn looks_like_unit_label(id: &str) -> bool {
    let id = id.trim();
    match id.split_once(char::is_whitespace) {
        Some((prefix, rest)) => {
            !rest.trim().is_empty()
                && prefix.starts_with(|c: char| c.is_ascii_digit())
                && prefix.chars().all(|c| c.is_ascii_digit() || c == '.')
        }
        None => false,
    }
}

/// Maps answered problem ids to units through the catalog.
pub struct UnitResolver {
    catalog: Arc<dyn Catalog>,
}

impl UnitResolver {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    /// Problem, then its unit document, then the problem's own unit label,
    /// then the id itself when it is a label, then the chapter guess.
    ///
    /// Lookup failures are logged and fall through to the next step.
    pub async fn resolve(&self, problem_id: &str) -> ResolvedUnit {
        let problem = match self.catalog.find_problem(problem_id).await {
            Ok(problem) => problem,
            Err(e) => {
                tracing::warn!(problem_id, error = %e, "Problem lookup failed");
                None
            }
        };

        if let Some(problem) = problem {
            let unit_id = problem.unit_id();
            if let Some(id) = unit_id.as_deref() {
                match self.catalog.find_unit(id).await {
                    Ok(Some(unit)) => {
                        return ResolvedUnit {
                            unit_id: Some(unit.unit_id.clone()),
                            title: unit.display_name().to_string(),
                        }
                    }
                    Ok(None) => tracing::debug!(problem_id, unit_id = id, "Unit not found"),
                    Err(e) => tracing::warn!(problem_id, unit_id = id, error = %e, "Unit lookup failed"),
                }
            }
            if let Some(label) = problem.unit_label() {
                return ResolvedUnit { unit_id, title: label };
            }
            if let Some(id) = unit_id {
                return ResolvedUnit {
                    title: id.clone(),
                    unit_id: Some(id),
                };
            }
        }

        if looks_like_unit_label(problem_id) {
            return ResolvedUnit::titled(problem_id.trim());
        }
        ResolvedUnit::titled(chapter_for_problem(problem_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nerdmath_database::InMemoryCatalog;
    use nerdmath_models::ProblemDocument;
    use serde_json::json;

    fn catalog() -> Arc<InMemoryCatalog> {
        let catalog = InMemoryCatalog::new();
        catalog.insert_problem(ProblemDocument::new(json!({ "problemId": "p-1", "unitId": "unit_01_03" })));
        catalog.insert_problem(ProblemDocument::new(json!({ "problemId": "p-2", "unitId": "unit_09_09", "unit": "9.9 미지의 단원" })));
        catalog.insert_problem(ProblemDocument::new(json!({ "problemId": "p-3", "unitId": "unit_08_01" })));
        catalog.insert_unit(
            serde_json::from_value(json!({ "unitId": "unit_01_03", "title": { "ko": "정수와 유리수" } })).unwrap(),
        );
        Arc::new(catalog)
    }

    #[test]
    fn test_chapter_heuristic() {
        assert_eq!(chapter_for_problem("3.2-05"), "3. 함수");
        assert_eq!(chapter_for_problem("5.1"), "5. 확률과 통계");
        assert_eq!(chapter_for_problem("9.1"), "1. 수와 연산");
        assert_eq!(chapter_for_problem("abc"), "1. 수와 연산");
    }

    #[test]
    fn test_unit_label_detection() {
        assert!(looks_like_unit_label("1.3 정수와 유리수"));
        assert!(!looks_like_unit_label("1.3"));
        assert!(!looks_like_unit_label("p 1"));
    }

    #[tokio::test]
    async fn test_resolution_chain() {
        let resolver = UnitResolver::new(catalog());

        let unit = resolver.resolve("p-1").await;
        assert_eq!(unit.unit_id.as_deref(), Some("unit_01_03"));
        assert_eq!(unit.title, "정수와 유리수");

        let unit = resolver.resolve("p-2").await;
        assert_eq!(unit.unit_id.as_deref(), Some("unit_09_09"));
        assert_eq!(unit.title, "9.9 미지의 단원");

        let unit = resolver.resolve("p-3").await;
        assert_eq!(unit.title, "unit_08_01");

        assert_eq!(resolver.resolve("2.1 문자의 사용").await.title, "2.1 문자의 사용");
        assert_eq!(resolver.resolve("4.2-11").await, ResolvedUnit::titled("4. 기하"));
    }
}
