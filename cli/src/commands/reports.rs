use anyhow::{Context as _, Result};
use nerdmath_database::loaders::{ConceptReport, UnitRelationship};
use nerdmath_database::reports;
use serde_json::json;
use std::path::Path;

use super::Context;

pub async fn unit_summary(ctx: &Context) -> Result<()> {
    let store = ctx.store().await?;
    let grades = reports::unit_summary_by_grade(&store)
        .await
        .context("Failed to summarize units by grade")?;
    let concepts = ConceptReport::collect(&store).await.context("Failed to summarize concepts")?;
    let relationship = UnitRelationship::collect(&store)
        .await
        .context("Failed to compare concept and unit ids")?;

    let output = json!({ "grades": grades, "concepts": concepts, "unitRelationship": relationship });
    ctx.emit(&output, |_| {
        for grade in &grades {
            println!("📘 {}학년: {}개 단원", grade.grade, grade.count);
            for unit in &grade.units {
                println!("   {}", unit.label());
            }
        }
        println!("🧩 Concepts: {} across {} units", concepts.total, concepts.by_unit.len());
        println!("🔗 Unit match rate: {:.1}%", relationship.match_rate);
        if !relationship.concept_only.is_empty() {
            let ids: Vec<&str> = relationship.concept_only.iter().map(String::as_str).collect();
            println!("⚠️  Unit ids only in concepts: {}", ids.join(", "));
        }
    })
}

pub async fn stats(ctx: &Context) -> Result<()> {
    let store = ctx.store().await?;
    let counts = reports::collection_counts(&store)
        .await
        .context("Failed to count collections")?;

    ctx.emit(&counts, |c| {
        println!("📊 {} ({} collections)", store.name(), c.len());
        for (name, count) in c {
            println!("   {:<32} {}", name, count);
        }
    })
}

pub async fn export(ctx: &Context, out: &Path, limit: i64) -> Result<()> {
    let store = ctx.store().await?;
    let export = reports::export_recent(&store, limit)
        .await
        .context("Failed to read recent results")?;

    let body = serde_json::to_string_pretty(&export).context("Failed to serialize export")?;
    std::fs::write(out, body).with_context(|| format!("Failed to write {}", out.display()))?;

    let summary = json!({
        "file": out.display().to_string(),
        "diagnostic_results": export.diagnostic_results.len(),
        "learning_paths": export.learning_paths.len(),
    });
    ctx.emit(&summary, |_| {
        println!(
            "💾 Exported {} diagnostic results and {} learning paths to {}",
            export.diagnostic_results.len(),
            export.learning_paths.len(),
            out.display()
        );
    })
}

pub async fn cleanup(ctx: &Context, test_ids: &[String], path_ids: &[String]) -> Result<()> {
    if test_ids.is_empty() && path_ids.is_empty() {
        anyhow::bail!("Nothing to clean up: pass --test-id and/or --path-id");
    }
    let store = ctx.store().await?;
    let report = reports::cleanup_test_data(&store, test_ids, path_ids)
        .await
        .context("Cleanup failed")?;

    ctx.emit(&report, |r| {
        println!("🧹 Deleted {} diagnostic results", r.diagnostic_results_deleted);
        println!("🧹 Deleted {} learning paths", r.learning_paths_deleted);
    })
}
