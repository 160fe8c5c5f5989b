use async_trait::async_trait;
use nerdmath_config::Neo4jConfig;
use nerdmath_models::{ConceptNode, Prerequisite};
use neo4rs::{query, ConfigBuilder, Graph, Query, Row};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::concept_graph::{
    clamp_depth, ConceptGraph, ConnectionReport, DegreeEntry, GraphStatistics,
};
use crate::errors::{GraphError, GraphResult};

/// Concept graph stored in Neo4j (local server or AuraDB).
pub struct Neo4jConceptGraph {
    pub(super) graph: Arc<Graph>,
    uri: String,
}

impl Neo4jConceptGraph {
    /// Connect and verify the connection with a trivial query.
    ///
    /// Supports `bolt://localhost:7687` as well as AuraDB URIs such as
    /// `neo4j+s://xxxxx.databases.neo4j.io`.
    pub async fn connect(config: &Neo4jConfig) -> GraphResult<Self> {
        let uri = config
            .uri
            .as_deref()
            .ok_or_else(|| GraphError::NotConfigured("AURA_URI is not set".to_string()))?;
        let password = config
            .password
            .as_deref()
            .ok_or_else(|| GraphError::NotConfigured("AURA_PASS is not set".to_string()))?;

        tracing::info!("Connecting to Neo4j at: {}", uri);

        let neo_config = ConfigBuilder::default()
            .uri(uri)
            .user(config.user.as_str())
            .password(password)
            .db("neo4j")
            .fetch_size(500)
            .max_connections(10)
            .build()
            .map_err(|e| GraphError::Neo4j(format!("Failed to build Neo4j config: {}", e)))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Neo4j(format!("Failed to connect to Neo4j: {}", e)))?;

        let client = Self {
            graph: Arc::new(graph),
            uri: uri.to_string(),
        };
        client.health().await?;
        tracing::info!("Neo4j connection established");
        Ok(client)
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn is_aura(&self) -> bool {
        self.uri.contains("neo4j.io") || self.uri.starts_with("neo4j+s://") || self.uri.starts_with("neo4j+ssc://")
    }

    pub(super) async fn fetch_all(&self, q: Query) -> GraphResult<Vec<Row>> {
        let mut result = self.graph.execute(q).await?;
        let mut rows = Vec::new();
        while let Some(row) = result.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    pub(super) async fn fetch_count(&self, cypher: &str) -> GraphResult<usize> {
        let rows = self.fetch_all(query(cypher)).await?;
        match rows.first() {
            Some(row) => Ok(get::<i64>(row, "count")?.max(0) as usize),
            None => Ok(0),
        }
    }

    async fn degree_ranking(&self, cypher: &str, top: usize) -> GraphResult<Vec<DegreeEntry>> {
        let rows = self.fetch_all(query(cypher).param("top", top as i64)).await?;
        rows.iter()
            .map(|row| {
                Ok(DegreeEntry {
                    concept: get(row, "concept")?,
                    count: get::<i64>(row, "count")?.max(0) as usize,
                })
            })
            .collect()
    }
}

pub(super) fn get<T: serde::de::DeserializeOwned>(row: &Row, key: &str) -> GraphResult<T> {
    row.get::<T>(key).map_err(|e| GraphError::Neo4j(e.to_string()))
}

const NODE_COLUMNS: &str = "c.concept AS concept, toString(c.unit) AS unit, toString(c.grade) AS grade";

fn concept_from_row(row: &Row) -> GraphResult<ConceptNode> {
    Ok(ConceptNode {
        concept: get(row, "concept")?,
        unit: get::<Option<String>>(row, "unit")?.filter(|s| !s.is_empty()),
        grade: get::<Option<String>>(row, "grade")?.filter(|s| !s.is_empty()),
    })
}

#[async_trait]
impl ConceptGraph for Neo4jConceptGraph {
    fn backend(&self) -> &'static str {
        "neo4j"
    }

    async fn health(&self) -> GraphResult<()> {
        let mut result = self
            .graph
            .execute(query("RETURN 1 AS test"))
            .await
            .map_err(|e| GraphError::Neo4j(format!("Connection test failed: {}", e)))?;
        result.next().await?;
        Ok(())
    }

    async fn find_concept(&self, name: &str) -> GraphResult<Option<ConceptNode>> {
        let cypher = format!("MATCH (c:Concept {{concept: $name}}) RETURN {NODE_COLUMNS} LIMIT 1");
        let rows = self.fetch_all(query(&cypher).param("name", name)).await?;
        rows.first().map(concept_from_row).transpose()
    }

    async fn find_similar_concept(&self, name: &str) -> GraphResult<Option<ConceptNode>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        let cypher = format!(
            "MATCH (c:Concept) \
             WHERE c.concept CONTAINS $name OR $name CONTAINS c.concept \
             RETURN {NODE_COLUMNS} ORDER BY c.concept LIMIT 1"
        );
        let rows = self.fetch_all(query(&cypher).param("name", name)).await?;
        rows.first().map(concept_from_row).transpose()
    }

    async fn prerequisites(&self, name: &str, max_depth: u32) -> GraphResult<Vec<Prerequisite>> {
        // Variable-length bounds cannot be parameters; the depth is clamped first.
        let depth = clamp_depth(max_depth);
        let cypher = format!(
            "MATCH p = (c:Concept)-[:PRECEDES*1..{depth}]->(target:Concept {{concept: $name}}) \
             WHERE c <> target \
             WITH c, min(length(p)) AS depth \
             RETURN {NODE_COLUMNS}, depth \
             ORDER BY depth, concept"
        );
        let rows = self.fetch_all(query(&cypher).param("name", name)).await?;
        rows.iter()
            .map(|row| {
                Ok(Prerequisite {
                    node: concept_from_row(row)?,
                    depth: get::<i64>(row, "depth")?.max(1) as u32,
                })
            })
            .collect()
    }

    async fn successors(&self, name: &str, limit: usize) -> GraphResult<Vec<ConceptNode>> {
        let cypher = format!(
            "MATCH (:Concept {{concept: $name}})-[:PRECEDES]->(c:Concept) \
             RETURN {NODE_COLUMNS} ORDER BY concept LIMIT $limit"
        );
        let rows = self
            .fetch_all(query(&cypher).param("name", name).param("limit", limit as i64))
            .await?;
        rows.iter().map(concept_from_row).collect()
    }

    async fn statistics(&self) -> GraphResult<GraphStatistics> {
        let concept_count = self.fetch_count("MATCH (c:Concept) RETURN count(c) AS count").await?;
        let precedes_count = self
            .fetch_count("MATCH ()-[r:PRECEDES]->() RETURN count(r) AS count")
            .await?;

        let mut concepts_by_grade = BTreeMap::new();
        let rows = self
            .fetch_all(query(
                "MATCH (c:Concept) WHERE c.grade IS NOT NULL \
                 RETURN toString(c.grade) AS grade, count(c) AS count ORDER BY grade",
            ))
            .await?;
        for row in &rows {
            concepts_by_grade.insert(get::<String>(row, "grade")?, get::<i64>(row, "count")?.max(0) as usize);
        }

        let rows = self
            .fetch_all(query(
                "MATCH (c:Concept) WHERE c.unit IS NOT NULL AND c.unit <> '' \
                 RETURN c.unit AS unit, count(c) AS count ORDER BY count DESC, unit LIMIT 10",
            ))
            .await?;
        let top_units = rows
            .iter()
            .map(|row| Ok((get::<String>(row, "unit")?, get::<i64>(row, "count")?.max(0) as usize)))
            .collect::<GraphResult<Vec<_>>>()?;

        Ok(GraphStatistics {
            concept_count,
            precedes_count,
            average_connections: if concept_count == 0 {
                0.0
            } else {
                precedes_count as f64 / concept_count as f64
            },
            concepts_by_grade,
            top_units,
        })
    }

    async fn connection_report(&self, top: usize) -> GraphResult<ConnectionReport> {
        let most_prerequisites = self
            .degree_ranking(
                "MATCH (c:Concept)<-[:PRECEDES]-(pre:Concept) \
                 RETURN c.concept AS concept, count(pre) AS count \
                 ORDER BY count DESC, concept LIMIT $top",
                top,
            )
            .await?;
        let most_successors = self
            .degree_ranking(
                "MATCH (c:Concept)-[:PRECEDES]->(post:Concept) \
                 RETURN c.concept AS concept, count(post) AS count \
                 ORDER BY count DESC, concept LIMIT $top",
                top,
            )
            .await?;

        let rows = self
            .fetch_all(query(
                "MATCH (c:Concept) \
                 WHERE NOT (c)-[:PRECEDES]->() AND NOT ()-[:PRECEDES]->(c) \
                 RETURN c.concept AS concept ORDER BY concept",
            ))
            .await?;
        let isolated = rows
            .iter()
            .map(|row| get::<String>(row, "concept"))
            .collect::<GraphResult<Vec<_>>>()?;

        let rows = self
            .fetch_all(query(
                "MATCH (c:Concept) \
                 OPTIONAL MATCH (c)-[r:PRECEDES]-() \
                 WITH c, count(r) AS degree \
                 RETURN degree, count(c) AS count ORDER BY degree",
            ))
            .await?;
        let mut degree_distribution = BTreeMap::new();
        for row in &rows {
            degree_distribution.insert(
                get::<i64>(row, "degree")?.max(0) as usize,
                get::<i64>(row, "count")?.max(0) as usize,
            );
        }

        Ok(ConnectionReport {
            most_prerequisites,
            most_successors,
            isolated,
            degree_distribution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live_config() -> Option<Neo4jConfig> {
        let config = Neo4jConfig {
            uri: std::env::var("AURA_URI").ok(),
            user: std::env::var("AURA_USER").unwrap_or_else(|_| "neo4j".to_string()),
            password: std::env::var("AURA_PASS").ok(),
        };
        config.is_configured().then_some(config)
    }

    #[tokio::test]
    async fn test_connect_requires_configuration() {
        let config = Neo4jConfig {
            uri: None,
            user: "neo4j".to_string(),
            password: None,
        };
        let err = Neo4jConceptGraph::connect(&config).await.err().unwrap();
        assert!(matches!(err, GraphError::NotConfigured(_)));
    }

    #[tokio::test]
    #[ignore] // Requires a running Neo4j instance
    async fn test_live_prerequisites() {
        let Some(config) = live_config() else {
            return;
        };
        let graph = Neo4jConceptGraph::connect(&config).await.unwrap();
        let stats = graph.statistics().await.unwrap();
        println!("concepts: {}, precedes: {}", stats.concept_count, stats.precedes_count);

        let prereqs = graph
            .prerequisites("1.5 정수와 유리수의 덧셈, 뺄셈", 5)
            .await
            .unwrap();
        assert!(prereqs.windows(2).all(|w| w[0].depth <= w[1].depth));
    }
}
