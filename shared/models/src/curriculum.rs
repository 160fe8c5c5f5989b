use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Text stored either as a plain string or as `{ "ko": .., "en": .. }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "LocalizedRepr")]
pub struct LocalizedText {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ko: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LocalizedRepr {
    Plain(String),
    Map {
        #[serde(default)]
        ko: Option<String>,
        #[serde(default)]
        en: Option<String>,
    },
}

impl From<LocalizedRepr> for LocalizedText {
    fn from(repr: LocalizedRepr) -> Self {
        match repr {
            LocalizedRepr::Plain(ko) => Self { ko: Some(ko), en: None },
            LocalizedRepr::Map { ko, en } => Self { ko, en },
        }
    }
}

impl LocalizedText {
    pub fn korean(text: impl Into<String>) -> Self {
        Self {
            ko: Some(text.into()),
            en: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ko.as_deref().map_or(true, str::is_empty) && self.en.as_deref().map_or(true, str::is_empty)
    }
}

/// Curriculum section document from the `unit` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub unit_id: String,
    #[serde(default = "default_subject")]
    pub subject: String,
    #[serde(default)]
    pub title: LocalizedText,
    #[serde(default = "one")]
    pub grade: i32,
    #[serde(default = "one")]
    pub chapter: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_title: Option<String>,
    #[serde(default = "one")]
    pub order_in_grade: i32,
    #[serde(default)]
    pub description: LocalizedText,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_subject() -> String {
    "math".to_string()
}

fn default_status() -> String {
    "active".to_string()
}

fn one() -> i32 {
    1
}

impl Unit {
    /// Korean title, then the chapter title, then the raw identifier.
    pub fn display_name(&self) -> &str {
        self.title
            .ko
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(self.chapter_title.as_deref().filter(|t| !t.is_empty()))
            .unwrap_or(&self.unit_id)
    }
}

/// Keys every document in the `problem` collection must carry.
pub const PROBLEM_REQUIRED_FIELDS: [&str; 15] = [
    "problemId",
    "unitId",
    "grade",
    "chapter",
    "context",
    "cognitiveType",
    "level",
    "diagnosticTest",
    "type",
    "tags",
    "content",
    "correctAnswer",
    "explanation",
    "createdAt",
    "updatedAt",
];

/// A problem document as stored, with identifiers rendered as strings.
///
/// Problems are passed through to clients untouched, so the document is kept
/// as JSON and only the handful of fields the service reads get accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProblemDocument(pub Value);

impl ProblemDocument {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    fn str_field(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn id(&self) -> Option<String> {
        self.str_field("problemId")
            .or_else(|| self.str_field("problem_id"))
            .or_else(|| self.str_field("_id"))
    }

    pub fn unit_id(&self) -> Option<String> {
        self.str_field("unitId")
    }

    /// Human readable unit label some exports embed directly in the problem.
    pub fn unit_label(&self) -> Option<String> {
        self.str_field("unit").or_else(|| self.str_field("unitName"))
    }

    /// Question text: `content.question`, then `content.text`, then the
    /// content rendered verbatim.
    pub fn question(&self) -> String {
        let content = self.0.get("content");
        content
            .and_then(|c| c.get("question"))
            .and_then(Value::as_str)
            .or_else(|| content.and_then(|c| c.get("text")).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| match content {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            })
    }

    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        PROBLEM_REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|key| self.0.get(*key).map_or(true, Value::is_null))
            .collect()
    }
}

/// Concept explanation document from the `concept` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptDocument {
    pub concept_id: String,
    pub unit_id: String,
    #[serde(default)]
    pub blocks: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ConceptDocument {
    pub fn block_types(&self) -> impl Iterator<Item = &str> {
        self.blocks
            .iter()
            .map(|b| b.get("type").and_then(Value::as_str).unwrap_or("unknown"))
    }

    pub fn practice_problem_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| b.get("type").and_then(Value::as_str) == Some("practiceProblems"))
            .map(|b| {
                b.get("problems")
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len)
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_localized_text_accepts_plain_string() {
        let unit: Unit = serde_json::from_value(json!({
            "unitId": "unit_01_03",
            "title": "정수와 유리수"
        }))
        .unwrap();
        assert_eq!(unit.title.ko.as_deref(), Some("정수와 유리수"));
        assert_eq!(unit.subject, "math");
        assert_eq!(unit.grade, 1);
        assert_eq!(unit.status, "active");
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut unit: Unit = serde_json::from_value(json!({
            "unitId": "unit_02_01",
            "title": { "ko": "", "en": "Expressions" },
            "chapterTitle": "2. 문자와 식"
        }))
        .unwrap();
        assert_eq!(unit.display_name(), "2. 문자와 식");
        unit.chapter_title = None;
        assert_eq!(unit.display_name(), "unit_02_01");
    }

    #[test]
    fn test_problem_accessors() {
        let problem = ProblemDocument::new(json!({
            "problemId": 101,
            "unitId": "unit_03_01",
            "content": { "text": "y = 2x + 1의 기울기는?" }
        }));
        assert_eq!(problem.id().as_deref(), Some("101"));
        assert_eq!(problem.unit_id().as_deref(), Some("unit_03_01"));
        assert_eq!(problem.question(), "y = 2x + 1의 기울기는?");
        assert!(problem.missing_required_fields().contains(&"grade"));
    }

    #[test]
    fn test_practice_problem_count() {
        let doc: ConceptDocument = serde_json::from_value(json!({
            "conceptId": "c1",
            "unitId": "unit_01_01",
            "blocks": [
                { "type": "text" },
                { "type": "practiceProblems", "problems": [{}, {}] },
                { "type": "practiceProblems" }
            ]
        }))
        .unwrap();
        assert_eq!(doc.practice_problem_count(), 2);
        assert_eq!(doc.block_types().collect::<Vec<_>>(), vec!["text", "practiceProblems", "practiceProblems"]);
    }
}
