//! Destructive maintenance of the Neo4j concept graph: wipe, constrain, reload.

use neo4rs::query;
use serde::Serialize;

use super::neo4j_client::Neo4jConceptGraph;
use crate::errors::GraphResult;
use crate::import::GraphImport;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub nodes_created: usize,
    pub edges_created: usize,
    /// Edges whose endpoints were not found in the graph.
    pub edges_skipped: usize,
    /// Edge rows with a relationship type other than `precedes`.
    pub edges_ignored: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RebuildReport {
    pub import: ImportSummary,
    pub concept_count: usize,
    pub precedes_count: usize,
}

fn grade_param(grade: &str) -> neo4rs::BoltType {
    match grade.parse::<i64>() {
        Ok(n) => n.into(),
        Err(_) => grade.into(),
    }
}

impl Neo4jConceptGraph {
    /// Remove every node and relationship.
    pub async fn clear(&self) -> GraphResult<()> {
        self.graph.run(query("MATCH (n) DETACH DELETE n")).await?;
        tracing::info!("Cleared Neo4j database");
        Ok(())
    }

    pub async fn create_constraints(&self) -> GraphResult<()> {
        self.graph
            .run(query(
                "CREATE CONSTRAINT concept_concept_unique IF NOT EXISTS \
                 FOR (c:Concept) REQUIRE c.concept IS UNIQUE",
            ))
            .await?;
        Ok(())
    }

    /// MERGE nodes and `PRECEDES` edges from a parsed CSV export.
    pub async fn import(&self, import: &GraphImport) -> GraphResult<ImportSummary> {
        let mut summary = ImportSummary {
            edges_ignored: import.ignored_edges,
            ..Default::default()
        };

        for (i, node) in import.nodes.iter().enumerate() {
            let mut sets = Vec::new();
            if node.unit.is_some() {
                sets.push("c.unit = $unit");
            }
            if node.grade.is_some() {
                sets.push("c.grade = $grade");
            }
            let cypher = if sets.is_empty() {
                "MERGE (c:Concept {concept: $concept})".to_string()
            } else {
                format!("MERGE (c:Concept {{concept: $concept}}) SET {}", sets.join(", "))
            };

            let mut q = query(&cypher).param("concept", node.concept.as_str());
            if let Some(unit) = &node.unit {
                q = q.param("unit", unit.as_str());
            }
            if let Some(grade) = &node.grade {
                q = q.param("grade", grade_param(grade));
            }
            self.graph.run(q).await?;
            summary.nodes_created += 1;

            if (i + 1) % 50 == 0 {
                tracing::info!(progress = i + 1, total = import.nodes.len(), "Importing concepts");
            }
        }

        for (i, edge) in import.edges.iter().enumerate() {
            let rows = self
                .fetch_all(
                    query(
                        "MATCH (source:Concept {concept: $source}) \
                         MATCH (target:Concept {concept: $target}) \
                         MERGE (source)-[:PRECEDES]->(target) \
                         RETURN 1 AS created",
                    )
                    .param("source", edge.source.as_str())
                    .param("target", edge.target.as_str()),
                )
                .await?;
            if rows.is_empty() {
                tracing::warn!(source = %edge.source, target = %edge.target, "Edge endpoint not found");
                summary.edges_skipped += 1;
            } else {
                summary.edges_created += 1;
            }

            if (i + 1) % 100 == 0 {
                tracing::info!(progress = i + 1, total = import.edges.len(), "Importing PRECEDES edges");
            }
        }

        tracing::info!(
            nodes = summary.nodes_created,
            edges = summary.edges_created,
            skipped = summary.edges_skipped,
            "Concept graph import finished"
        );
        Ok(summary)
    }

    /// Wipe the database and load it again from `import`.
    pub async fn rebuild(&self, import: &GraphImport) -> GraphResult<RebuildReport> {
        self.clear().await?;
        self.create_constraints().await?;
        let summary = self.import(import).await?;

        let concept_count = self.fetch_count("MATCH (c:Concept) RETURN count(c) AS count").await?;
        let precedes_count = self
            .fetch_count("MATCH ()-[r:PRECEDES]->() RETURN count(r) AS count")
            .await?;

        Ok(RebuildReport {
            import: summary,
            concept_count,
            precedes_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_param_prefers_integers() {
        assert!(matches!(grade_param("2"), neo4rs::BoltType::Integer(_)));
        assert!(matches!(grade_param("중1"), neo4rs::BoltType::String(_)));
    }
}
