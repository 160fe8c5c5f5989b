//! CSV exports of the concept graph (`neo4j_nodes.csv`, `neo4j_edges.csv`).

use nerdmath_models::{ConceptNode, PrecedesEdge};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::errors::{GraphError, GraphResult};

pub const NODES_FILE: &str = "neo4j_nodes.csv";
pub const EDGES_FILE: &str = "neo4j_edges.csv";

#[derive(Debug, Deserialize)]
struct NodeRow {
    concept: String,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    grade: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EdgeRow {
    source: String,
    target: String,
    #[serde(rename = "type", default = "precedes")]
    kind: String,
}

fn precedes() -> String {
    "precedes".to_string()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Nodes and `PRECEDES` edges parsed from the CSV exports.
#[derive(Debug, Clone, Default)]
pub struct GraphImport {
    pub nodes: Vec<ConceptNode>,
    pub edges: Vec<PrecedesEdge>,
    /// Edge rows whose type is not `precedes`.
    pub ignored_edges: usize,
}

impl GraphImport {
    pub fn from_dir(dir: impl AsRef<Path>) -> GraphResult<Self> {
        let dir = dir.as_ref();
        Self::from_csv_files(dir.join(NODES_FILE), dir.join(EDGES_FILE))
    }

    pub fn from_csv_files(nodes: impl AsRef<Path>, edges: impl AsRef<Path>) -> GraphResult<Self> {
        let nodes_path = nodes.as_ref();
        let edges_path = edges.as_ref();
        let nodes_text = read_text(nodes_path)?;
        let edges_text = read_text(edges_path)?;
        Self::from_csv_str(&nodes_text, &edges_text).map_err(|e| match e {
            GraphError::Csv { path, message } => GraphError::Csv {
                path: if path == "nodes" {
                    nodes_path.display().to_string()
                } else {
                    edges_path.display().to_string()
                },
                message,
            },
            other => other,
        })
    }

    pub fn from_csv_str(nodes_csv: &str, edges_csv: &str) -> GraphResult<Self> {
        let mut import = GraphImport::default();
        let mut seen = HashSet::new();

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(nodes_csv.as_bytes());
        for row in reader.deserialize::<NodeRow>() {
            let row = row.map_err(|e| GraphError::Csv {
                path: "nodes".to_string(),
                message: e.to_string(),
            })?;
            let concept = row.concept.trim().to_string();
            if concept.is_empty() || !seen.insert(concept.clone()) {
                continue;
            }
            import.nodes.push(ConceptNode {
                concept,
                unit: non_empty(row.unit),
                grade: non_empty(row.grade),
            });
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(edges_csv.as_bytes());
        for row in reader.deserialize::<EdgeRow>() {
            let row = row.map_err(|e| GraphError::Csv {
                path: "edges".to_string(),
                message: e.to_string(),
            })?;
            if !row.kind.eq_ignore_ascii_case("precedes") {
                import.ignored_edges += 1;
                continue;
            }
            import.edges.push(PrecedesEdge {
                source: row.source,
                target: row.target,
            });
        }

        tracing::debug!(
            nodes = import.nodes.len(),
            edges = import.edges.len(),
            ignored = import.ignored_edges,
            "Parsed concept graph CSV"
        );
        Ok(import)
    }
}

/// Read a text file written either as UTF-8 or in the Korean legacy code page.
pub fn read_text(path: &Path) -> GraphResult<String> {
    let bytes = std::fs::read(path).map_err(|source| GraphError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(decode_korean(&bytes))
}

pub fn decode_korean(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            // EUC-KR in encoding_rs is the WHATWG superset, which covers CP949.
            let (text, _, had_errors) = encoding_rs::EUC_KR.decode(bytes);
            if had_errors {
                tracing::warn!("Input is neither UTF-8 nor EUC-KR; invalid bytes were replaced");
            }
            text.into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODES: &str = "concept,unit,grade\n\
        1.3 정수와 유리수,정수와 유리수,1\n\
        1.4 절댓값,정수와 유리수,\n\
        1.5 정수와 유리수의 덧셈 뺄셈,정수와 유리수,1\n\
        1.4 절댓값,duplicate,1\n";

    const EDGES: &str = "source,target,type\n\
        1.3 정수와 유리수,1.5 정수와 유리수의 덧셈 뺄셈,precedes\n\
        1.4 절댓값,1.5 정수와 유리수의 덧셈 뺄셈,PRECEDES\n\
        1.3 정수와 유리수,1.4 절댓값,related\n";

    #[test]
    fn test_parse_nodes_and_edges() {
        let import = GraphImport::from_csv_str(NODES, EDGES).unwrap();
        assert_eq!(import.nodes.len(), 3);
        assert_eq!(import.nodes[1].grade, None);
        assert_eq!(import.nodes[1].unit.as_deref(), Some("정수와 유리수"));
        assert_eq!(import.edges.len(), 2);
        assert_eq!(import.ignored_edges, 1);
    }

    #[test]
    fn test_decode_euc_kr() {
        let (encoded, _, _) = encoding_rs::EUC_KR.encode("개념,단원");
        assert_eq!(decode_korean(&encoded), "개념,단원");
        assert_eq!(decode_korean("\u{feff}concept".as_bytes()), "concept");
    }

    #[test]
    fn test_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(NODES_FILE), NODES).unwrap();
        let (edges, _, _) = encoding_rs::EUC_KR.encode(EDGES);
        std::fs::write(dir.path().join(EDGES_FILE), &edges).unwrap();

        let import = GraphImport::from_dir(dir.path()).unwrap();
        assert_eq!(import.edges[0].source, "1.3 정수와 유리수");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(GraphImport::from_dir(dir.path()), Err(GraphError::Io { .. })));
    }
}
