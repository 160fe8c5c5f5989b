//! Conversions between stored BSON and the JSON the API returns.

use bson::{Bson, Document};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::errors::{DatabaseError, DatabaseResult};

/// Render a stored document as plain JSON: ObjectIds become hex strings and
/// dates become RFC 3339 strings, at any depth.
pub fn document_to_json(doc: Document) -> Value {
    Value::Object(
        doc.into_iter()
            .map(|(k, v)| (k, bson_to_json(v)))
            .collect::<Map<String, Value>>(),
    )
}

pub fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => Value::String(dt.to_chrono().to_rfc3339_opts(SecondsFormat::Secs, true)),
        Bson::Document(doc) => document_to_json(doc),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

pub fn json_to_document(value: &Value) -> DatabaseResult<Document> {
    match value {
        Value::Object(_) => Ok(bson::to_document(value)?),
        other => Err(DatabaseError::InvalidData(format!(
            "expected a JSON object, got {}",
            json_type(other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parse ISO-8601 timestamps as written by the exports (`Z` suffix, explicit
/// offset, or no zone at all, which is read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

pub fn bson_date(dt: DateTime<Utc>) -> Bson {
    Bson::DateTime(bson::DateTime::from_chrono(dt))
}

/// Replace string timestamps under `keys` with BSON dates.
///
/// Values that do not parse are left untouched.
pub fn convert_dates(doc: &mut Document, keys: &[&str]) {
    for key in keys {
        let parsed = match doc.get(*key) {
            Some(Bson::String(raw)) => parse_timestamp(raw),
            _ => None,
        };
        if let Some(dt) = parsed {
            doc.insert(*key, bson_date(dt));
        }
    }
}

/// Set `key` to the parsed string value or, when absent, to `default`.
pub fn date_or_default(doc: &mut Document, key: &str, default: &str) {
    if !matches!(doc.get(key), Some(Bson::String(_)) | Some(Bson::DateTime(_))) {
        doc.insert(key, default);
    }
    convert_dates(doc, &[key]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, oid::ObjectId};
    use serde_json::json;

    #[test]
    fn test_document_to_json_stringifies_ids_and_dates() {
        let oid = ObjectId::parse_str("64f1a2b3c4d5e6f708091a2b").unwrap();
        let created = parse_timestamp("2025-08-28T10:26:51Z").unwrap();
        let doc = doc! {
            "_id": oid,
            "createdAt": bson_date(created),
            "nested": { "ref": oid, "items": [oid, 3_i32] },
            "grade": 2_i32,
        };

        let value = document_to_json(doc);
        assert_eq!(value["_id"], json!("64f1a2b3c4d5e6f708091a2b"));
        assert_eq!(value["createdAt"], json!("2025-08-28T10:26:51Z"));
        assert_eq!(value["nested"]["ref"], json!("64f1a2b3c4d5e6f708091a2b"));
        assert_eq!(value["nested"]["items"][1], json!(3));
        assert_eq!(value["grade"], json!(2));
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert!(parse_timestamp("2025-08-28T06:14:18Z").is_some());
        assert!(parse_timestamp("2025-08-28T06:14:18+09:00").is_some());
        assert_eq!(
            parse_timestamp("2025-08-28T06:14:18"),
            parse_timestamp("2025-08-28T06:14:18Z")
        );
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_convert_dates() {
        let mut doc = doc! { "createdAt": "2025-08-28T10:26:51Z", "updatedAt": "soon" };
        convert_dates(&mut doc, &["createdAt", "updatedAt", "missing"]);
        assert!(matches!(doc.get("createdAt"), Some(Bson::DateTime(_))));
        assert_eq!(doc.get_str("updatedAt").unwrap(), "soon");

        let mut doc = doc! {};
        date_or_default(&mut doc, "createdAt", "2025-08-28T06:14:18Z");
        assert!(matches!(doc.get("createdAt"), Some(Bson::DateTime(_))));
    }

    #[test]
    fn test_json_to_document_requires_object() {
        assert!(json_to_document(&json!({ "a": 1 })).is_ok());
        assert!(matches!(
            json_to_document(&json!([1, 2])),
            Err(DatabaseError::InvalidData(_))
        ));
    }
}
