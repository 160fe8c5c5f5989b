use anyhow::{Context as _, Result};
use nerdmath_graph::{clamp_depth, ConceptGraph, GraphImport, InMemoryConceptGraph, Neo4jConceptGraph};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use super::Context;

async fn open_graph(ctx: &Context, csv: bool) -> Result<Arc<dyn ConceptGraph>> {
    if csv {
        let dir = &ctx.config.data.data_dir;
        let import = GraphImport::from_dir(dir)
            .with_context(|| format!("Failed to read concept CSV exports from {}", dir.display()))?;
        return Ok(Arc::new(InMemoryConceptGraph::from_import(&import)));
    }
    let graph = Neo4jConceptGraph::connect(&ctx.config.neo4j)
        .await
        .context("Failed to connect to Neo4j (use --csv to read the exports instead)")?;
    Ok(Arc::new(graph))
}

pub async fn rebuild(ctx: &Context, dir: Option<PathBuf>, yes: bool) -> Result<()> {
    if !yes {
        anyhow::bail!("rebuild-graph deletes every node in Neo4j; pass --yes to continue");
    }
    let dir = dir.unwrap_or_else(|| ctx.config.data.data_dir.clone());
    let import = GraphImport::from_dir(&dir)
        .with_context(|| format!("Failed to read concept CSV exports from {}", dir.display()))?;
    tracing::info!(nodes = import.nodes.len(), edges = import.edges.len(), "Parsed concept exports");

    let graph = Neo4jConceptGraph::connect(&ctx.config.neo4j)
        .await
        .context("Failed to connect to Neo4j")?;
    let report = graph.rebuild(&import).await.context("Graph rebuild failed")?;

    ctx.emit(&report, |r| {
        println!("✅ Concept graph rebuilt");
        println!("   Nodes created: {}", r.import.nodes_created);
        println!(
            "   PRECEDES created: {} (missing endpoints: {}, other types: {})",
            r.import.edges_created, r.import.edges_skipped, r.import.edges_ignored
        );
        println!("   Concepts in graph: {}, PRECEDES: {}", r.concept_count, r.precedes_count);
    })
}

pub async fn check_connections(ctx: &Context) -> Result<()> {
    let mongodb = match ctx.store().await {
        Ok(store) => {
            let collections = store.list_collections().await.unwrap_or_default();
            json!({ "status": "connected", "database": store.name(), "collections": collections })
        }
        Err(e) => json!({ "status": "error", "error": format!("{:#}", e) }),
    };

    let neo4j = if ctx.config.neo4j.is_configured() {
        match Neo4jConceptGraph::connect(&ctx.config.neo4j).await {
            Ok(graph) => match graph.statistics().await {
                Ok(stats) => json!({
                    "status": "connected",
                    "uri": graph.uri(),
                    "aura": graph.is_aura(),
                    "concepts": stats.concept_count,
                    "precedes": stats.precedes_count,
                }),
                Err(e) => json!({ "status": "error", "error": e.to_string() }),
            },
            Err(e) => json!({ "status": "error", "error": e.to_string() }),
        }
    } else {
        json!({ "status": "not_configured" })
    };

    let openai = json!({
        "status": if ctx.config.openai.api_key.is_some() { "configured" } else { "not_configured" },
        "chat_model": ctx.config.openai.chat_model,
    });

    let output = json!({ "mongodb": mongodb, "neo4j": neo4j, "openai": openai });
    ctx.emit(&output, |o| {
        for (name, status) in [("MongoDB", &o["mongodb"]), ("Neo4j", &o["neo4j"]), ("OpenAI", &o["openai"])] {
            let state = status["status"].as_str().unwrap_or("unknown");
            let marker = match state {
                "connected" | "configured" => "✅",
                "not_configured" => "⚪",
                _ => "❌",
            };
            match status.get("error").and_then(|e| e.as_str()) {
                Some(error) => println!("{} {}: {} ({})", marker, name, state, error),
                None => println!("{} {}: {}", marker, name, state),
            }
        }
    })
}

pub async fn report(ctx: &Context, top: usize, csv: bool) -> Result<()> {
    let graph = open_graph(ctx, csv).await?;
    let stats = graph.statistics().await.context("Failed to read graph statistics")?;
    let connections = graph
        .connection_report(top)
        .await
        .context("Failed to read connection report")?;

    ctx.emit(&json!({ "statistics": stats, "connections": connections }), |_| {
        println!("📊 Concepts: {}, PRECEDES: {}", stats.concept_count, stats.precedes_count);
        println!("   Average connections: {:.2}", stats.average_connections);
        for (grade, count) in &stats.concepts_by_grade {
            println!("   grade {}: {}", grade, count);
        }
        println!("🔝 Most prerequisites:");
        for entry in &connections.most_prerequisites {
            println!("   {} ({})", entry.concept, entry.count);
        }
        println!("🔝 Most successors:");
        for entry in &connections.most_successors {
            println!("   {} ({})", entry.concept, entry.count);
        }
        if !connections.isolated.is_empty() {
            println!("⚠️  Isolated concepts: {}", connections.isolated.join(", "));
        }
    })
}

pub async fn prerequisites(ctx: &Context, concept: &str, depth: Option<u32>, csv: bool) -> Result<()> {
    let graph = open_graph(ctx, csv).await?;
    let depth = clamp_depth(depth.unwrap_or(ctx.config.learning.max_depth));

    let Some((node, kind)) = graph.resolve_concept(concept).await? else {
        anyhow::bail!("Concept not found: {}", concept);
    };
    let prerequisites = graph
        .prerequisites(&node.concept, depth)
        .await
        .with_context(|| format!("Failed to traverse prerequisites of {}", node.concept))?;
    let successors = graph.successors(&node.concept, 10).await?;

    let output = json!({
        "concept": node,
        "match": kind,
        "depth": depth,
        "prerequisites": prerequisites,
        "successors": successors,
    });
    ctx.emit(&output, |_| {
        println!("🎯 {} (depth {})", node.concept, depth);
        if prerequisites.is_empty() {
            println!("   No prerequisites");
        }
        for p in &prerequisites {
            println!("   {}└ {}", "  ".repeat(p.depth.saturating_sub(1) as usize), p.node.concept);
        }
        if !successors.is_empty() {
            let names: Vec<&str> = successors.iter().map(|s| s.concept.as_str()).collect();
            println!("➡️  Leads to: {}", names.join(", "));
        }
    })
}
