//! Collection definitions for the NerdMath document store.
//!
//! Every collection gets a `$jsonSchema` validator and a fixed set of
//! single-field indexes. Setup is repeatable: collections that already exist
//! are left alone and duplicate indexes are reported as skipped.

use bson::{doc, Bson, Document};
use mongodb::error::ErrorKind;
use mongodb::options::{CreateCollectionOptions, IndexOptions};
use mongodb::IndexModel;
use serde::Serialize;

use crate::errors::DatabaseResult;
use crate::store::MongoStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Ascending,
    Descending,
    Text,
}

#[derive(Debug, Clone, Copy)]
pub struct IndexSpec {
    pub field: &'static str,
    pub kind: IndexKind,
    pub unique: bool,
}

impl IndexSpec {
    pub fn name(&self) -> String {
        format!("{}_idx", self.field)
    }

    pub fn keys(&self) -> Document {
        let direction = match self.kind {
            IndexKind::Ascending => Bson::Int32(1),
            IndexKind::Descending => Bson::Int32(-1),
            IndexKind::Text => Bson::String("text".to_string()),
        };
        let mut keys = Document::new();
        keys.insert(self.field, direction);
        keys
    }

    pub fn options(&self) -> IndexOptions {
        let mut options = IndexOptions::default();
        options.name = Some(self.name());
        if self.unique {
            options.unique = Some(true);
        }
        options
    }

    pub fn model(&self) -> IndexModel {
        IndexModel::builder().keys(self.keys()).options(self.options()).build()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CollectionSpec {
    pub name: &'static str,
    pub required: &'static [&'static str],
    /// `(field, bsonType)`
    pub properties: &'static [(&'static str, &'static str)],
    pub indexes: &'static [IndexSpec],
}

impl CollectionSpec {
    pub fn validator(&self) -> Document {
        let mut properties = Document::new();
        for (field, bson_type) in self.properties {
            properties.insert(*field, doc! { "bsonType": *bson_type });
        }
        doc! {
            "$jsonSchema": {
                "bsonType": "object",
                "required": self.required.to_vec(),
                "properties": properties,
            }
        }
    }
}

const fn asc(field: &'static str) -> IndexSpec {
    IndexSpec { field, kind: IndexKind::Ascending, unique: false }
}

const fn unique(field: &'static str) -> IndexSpec {
    IndexSpec { field, kind: IndexKind::Ascending, unique: true }
}

const fn desc(field: &'static str) -> IndexSpec {
    IndexSpec { field, kind: IndexKind::Descending, unique: false }
}

const fn text(field: &'static str) -> IndexSpec {
    IndexSpec { field, kind: IndexKind::Text, unique: false }
}

pub const COLLECTIONS: &[CollectionSpec] = &[
    CollectionSpec {
        name: "diagnostic_test",
        required: &[
            "testId", "userId", "gradeRange", "restartCount", "timeoutMinutes",
            "startedAt", "endedAt", "durationSec", "completed",
        ],
        properties: &[
            ("testId", "objectId"),
            ("userId", "number"),
            ("gradeRange", "object"),
            ("selectedRuleSnapshot", "object"),
            ("restartCount", "number"),
            ("shuffleSeed", "number"),
            ("timeoutMinutes", "number"),
            ("startedAt", "date"),
            ("endedAt", "date"),
            ("durationSec", "number"),
            ("completed", "bool"),
        ],
        indexes: &[asc("testId"), asc("userId"), desc("startedAt"), asc("completed")],
    },
    CollectionSpec {
        name: "answer_attempt",
        required: &[
            "answerId", "userId", "problemId", "mode", "unitId", "userAnswer", "isCorrect", "scoredAt",
        ],
        properties: &[
            ("answerId", "objectId"),
            ("userId", "number"),
            ("problemId", "objectId"),
            ("mode", "string"),
            ("setId", "objectId"),
            ("unitId", "objectId"),
            ("userAnswer", "object"),
            ("isCorrect", "bool"),
            ("vocaId", "objectId"),
            ("scoredAt", "date"),
            ("explanationShown", "bool"),
            ("problemOrderIndex", "number"),
            ("idempotencyKey", "string"),
        ],
        indexes: &[
            asc("answerId"), asc("userId"), asc("problemId"), asc("unitId"), desc("scoredAt"), asc("mode"),
        ],
    },
    CollectionSpec {
        name: "diagnostic_analysis",
        required: &[
            "analysisId", "testId", "userId", "analysisType", "aiComment", "recommendedPath", "class",
            "generatedAt",
        ],
        properties: &[
            ("analysisId", "objectId"),
            ("testId", "objectId"),
            ("userId", "number"),
            ("analysisType", "string"),
            ("aiComment", "string"),
            ("recommendedPath", "array"),
            ("class", "string"),
            ("generatedAt", "date"),
        ],
        indexes: &[
            asc("analysisId"), asc("testId"), asc("userId"), desc("generatedAt"), asc("analysisType"),
        ],
    },
    CollectionSpec {
        name: "unit",
        required: &[
            "unitId", "subject", "title", "grade", "chapter", "chapterTitle", "orderInGrade", "status",
            "createdAt",
        ],
        properties: &[
            ("unitId", "string"),
            ("subject", "string"),
            ("title", "object"),
            ("grade", "number"),
            ("chapter", "number"),
            ("chapterTitle", "string"),
            ("orderInGrade", "number"),
            ("description", "object"),
            ("status", "string"),
            ("createdAt", "date"),
        ],
        indexes: &[
            asc("unitId"), asc("subject"), asc("grade"), asc("chapter"), asc("orderInGrade"), asc("status"),
        ],
    },
    CollectionSpec {
        name: "problem",
        required: &nerdmath_models::PROBLEM_REQUIRED_FIELDS,
        properties: &[
            ("problemId", "string"),
            ("unitId", "string"),
            ("grade", "number"),
            ("chapter", "number"),
            ("context", "object"),
            ("cognitiveType", "string"),
            ("level", "string"),
            ("diagnosticTest", "bool"),
            ("type", "string"),
            ("tags", "array"),
            ("content", "object"),
            ("correctAnswer", "string"),
            ("explanation", "object"),
            ("imageUrl", "string"),
            ("createdAt", "date"),
            ("updatedAt", "date"),
        ],
        indexes: &[
            unique("problemId"),
            asc("unitId"),
            asc("grade"),
            asc("chapter"),
            asc("cognitiveType"),
            asc("level"),
            asc("diagnosticTest"),
            asc("type"),
            asc("tags"),
            text("content.text"),
        ],
    },
    CollectionSpec {
        name: "problem_set",
        required: &["setId", "userId", "problemIds", "createdAt"],
        properties: &[
            ("setId", "objectId"),
            ("userId", "number"),
            ("unitId", "objectId"),
            ("problemIds", "array"),
            ("ruleSnapshot", "object"),
            ("mode", "string"),
            ("title", "string"),
            ("createdAt", "date"),
        ],
        indexes: &[asc("setId"), asc("userId"), asc("unitId"), asc("mode"), desc("createdAt")],
    },
    CollectionSpec {
        name: "concept",
        required: &["conceptId", "unitId", "blocks", "createdAt"],
        properties: &[
            ("conceptId", "string"),
            ("unitId", "string"),
            ("blocks", "array"),
            ("createdAt", "date"),
        ],
        indexes: &[asc("conceptId"), asc("unitId")],
    },
    CollectionSpec {
        name: "vocabulary",
        required: &["vocaId", "type", "category", "word", "meaning", "createdAt"],
        properties: &[
            ("vocaId", "objectId"),
            ("type", "string"),
            ("category", "string"),
            ("unitId", "objectId"),
            ("word", "string"),
            ("meaning", "string"),
            ("etymology", "string"),
            ("imageUrl", "string"),
            ("createdAt", "date"),
        ],
        indexes: &[asc("vocaId"), asc("type"), asc("category"), asc("unitId"), text("word")],
    },
    CollectionSpec {
        name: "progress",
        required: &[
            "progressId", "userId", "unitId", "conceptProgress", "problemProgress", "vocabProgress",
            "updatedAt",
        ],
        properties: &[
            ("progressId", "objectId"),
            ("userId", "number"),
            ("unitId", "objectId"),
            ("conceptProgress", "number"),
            ("problemProgress", "number"),
            ("vocabProgress", "number"),
            ("updatedAt", "date"),
        ],
        indexes: &[asc("progressId"), asc("userId"), asc("unitId"), desc("updatedAt")],
    },
    CollectionSpec {
        name: "activity_log",
        required: &[
            "logId", "userId", "date", "todaySolved", "studyDurationMin", "totalProblems",
            "totalStudyMinutes", "attendanceCount",
        ],
        properties: &[
            ("logId", "objectId"),
            ("userId", "number"),
            ("date", "string"),
            ("todaySolved", "number"),
            ("studyDurationMin", "number"),
            ("totalProblems", "number"),
            ("totalStudyMinutes", "number"),
            ("attendanceCount", "number"),
        ],
        indexes: &[asc("logId"), asc("userId"), asc("date"), desc("todaySolved")],
    },
    CollectionSpec {
        name: "gamification_state",
        required: &[
            "gamifiId", "userId", "level", "xp", "totalXp", "nextLevelXp", "equippedCharacterId",
            "equippedSkinId", "unlockedSkinIds", "createdAt", "updatedAt",
        ],
        properties: &[
            ("gamifiId", "objectId"),
            ("userId", "number"),
            ("level", "number"),
            ("xp", "number"),
            ("totalXp", "number"),
            ("nextLevelXp", "number"),
            ("equippedCharacterId", "string"),
            ("equippedSkinId", "string"),
            ("unlockedSkinIds", "array"),
            ("lastLeveledUpAt", "date"),
            ("createdAt", "date"),
            ("updatedAt", "date"),
        ],
        indexes: &[asc("gamifiId"), asc("userId"), desc("level"), desc("totalXp")],
    },
    CollectionSpec {
        name: "xp_transactions",
        required: &["transactionId", "userId", "amount", "reason", "idempotencyKey", "at"],
        properties: &[
            ("transactionId", "objectId"),
            ("userId", "number"),
            ("amount", "number"),
            ("reason", "string"),
            ("reasonRef", "string"),
            ("idempotencyKey", "string"),
            ("at", "date"),
        ],
        indexes: &[asc("transactionId"), asc("userId"), asc("reason"), desc("at")],
    },
    CollectionSpec {
        name: "learning_time_log",
        required: &[
            "learningTimeId", "userId", "activityType", "contentId", "startedAt", "endedAt",
            "durationSeconds", "createdAt",
        ],
        properties: &[
            ("learningTimeId", "objectId"),
            ("userId", "number"),
            ("activityType", "string"),
            ("contentId", "objectId"),
            ("sessionId", "objectId"),
            ("startedAt", "date"),
            ("endedAt", "date"),
            ("durationSeconds", "number"),
            ("createdAt", "date"),
        ],
        indexes: &[
            asc("learningTimeId"), asc("userId"), asc("activityType"), asc("contentId"), desc("startedAt"),
        ],
    },
    CollectionSpec {
        name: "bookmark",
        required: &["bookmarkId", "userId", "problemId", "bookmarkedAt", "createdAt", "updatedAt"],
        properties: &[
            ("bookmarkId", "objectId"),
            ("userId", "number"),
            ("problemId", "objectId"),
            ("unitId", "objectId"),
            ("bookmarkedAt", "date"),
            ("createdAt", "date"),
            ("updatedAt", "date"),
        ],
        indexes: &[asc("bookmarkId"), asc("userId"), asc("problemId"), asc("unitId"), desc("bookmarkedAt")],
    },
];

pub fn collection_spec(name: &str) -> Option<&'static CollectionSpec> {
    COLLECTIONS.iter().find(|spec| spec.name == name)
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct SetupReport {
    pub created_collections: Vec<String>,
    pub existing_collections: Vec<String>,
    pub created_indexes: usize,
    pub skipped_indexes: usize,
    pub failures: Vec<String>,
}

impl SetupReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// `IndexOptionsConflict` (85) and `IndexKeySpecsConflict` (86).
pub(crate) fn is_index_conflict(error: &mongodb::error::Error) -> bool {
    matches!(*error.kind, ErrorKind::Command(ref cmd) if cmd.code == 85 || cmd.code == 86)
}

/// Create every collection in [`COLLECTIONS`] with its validator and indexes.
///
/// Failures on individual collections or indexes are recorded in the report
/// and do not stop the run; only listing the existing collections can fail
/// the whole setup.
pub async fn setup_collections(store: &MongoStore) -> DatabaseResult<SetupReport> {
    let existing = store.list_collections().await?;
    let mut report = SetupReport::default();

    for spec in COLLECTIONS {
        if existing.iter().any(|name| name == spec.name) {
            tracing::info!(collection = spec.name, "Collection already exists");
            report.existing_collections.push(spec.name.to_string());
        } else {
            let options = CreateCollectionOptions::builder()
                .validator(spec.validator())
                .build();
            match store.database().create_collection(spec.name, options).await {
                Ok(()) => {
                    tracing::info!(collection = spec.name, "Created collection");
                    report.created_collections.push(spec.name.to_string());
                }
                Err(e) => {
                    tracing::error!(collection = spec.name, error = %e, "Failed to create collection");
                    report.failures.push(format!("{}: {}", spec.name, e));
                    continue;
                }
            }
        }

        let collection = store.collection(spec.name);
        for index in spec.indexes {
            let name = index.name();
            match collection.create_index(index.model(), None).await {
                Ok(_) => report.created_indexes += 1,
                Err(e) if is_index_conflict(&e) => {
                    tracing::debug!(collection = spec.name, index = %name, "Index already exists");
                    report.skipped_indexes += 1;
                }
                Err(e) => {
                    tracing::warn!(collection = spec.name, index = %name, error = %e, "Failed to create index");
                    report.failures.push(format!("{}.{}: {}", spec.name, name, e));
                }
            }
        }
    }

    tracing::info!(
        created = report.created_collections.len(),
        existing = report.existing_collections.len(),
        indexes = report.created_indexes,
        failures = report.failures.len(),
        "Collection setup finished"
    );
    Ok(report)
}
