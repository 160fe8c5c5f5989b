use anyhow::{Context as _, Result};
use nerdmath_database::loaders::{
    self, ConceptReport, UnitRelationship, CONCEPT_FILE, DIAGNOSTIC_TESTS_FILE, UNIT_FILE, UNIT_TESTS_FILE,
};
use nerdmath_database::schema;
use serde_json::json;
use std::path::PathBuf;

use super::Context;

pub async fn setup_collections(ctx: &Context) -> Result<()> {
    let store = ctx.store().await?;
    let report = schema::setup_collections(&store)
        .await
        .context("Failed to set up collections")?;

    ctx.emit(&report, |r| {
        println!("✅ Created collections: {}", r.created_collections.len());
        for name in &r.created_collections {
            println!("   + {}", name);
        }
        println!("ℹ️  Already present: {}", r.existing_collections.len());
        println!("📇 Indexes created: {}, skipped: {}", r.created_indexes, r.skipped_indexes);
        for failure in &r.failures {
            println!("❌ {}", failure);
        }
    })?;

    if !report.is_clean() {
        anyhow::bail!("{} collection setup step(s) failed", report.failures.len());
    }
    Ok(())
}

pub async fn load_problems(ctx: &Context, unit_tests: Option<PathBuf>, diagnostics: Option<PathBuf>) -> Result<()> {
    let data_dir = &ctx.config.data.data_dir;
    let unit_tests = unit_tests.unwrap_or_else(|| data_dir.join(UNIT_TESTS_FILE));
    let diagnostics = diagnostics.unwrap_or_else(|| data_dir.join(DIAGNOSTIC_TESTS_FILE));

    let store = ctx.store().await?;
    let report = loaders::load_problems(&store, &unit_tests, &diagnostics)
        .await
        .context("Failed to load problems")?;

    ctx.emit(&report, |r| {
        println!("📚 Problems read: {}", r.read);
        println!("✅ Saved: {}", r.saved);
        println!("⏭️  Skipped (incomplete or duplicate): {}", r.skipped);
    })
}

pub async fn load_units(ctx: &Context, file: Option<PathBuf>) -> Result<()> {
    let path = file.unwrap_or_else(|| ctx.config.data.data_dir.join(UNIT_FILE));
    let store = ctx.store().await?;
    let report = loaders::load_units(&store, &path)
        .await
        .with_context(|| format!("Failed to load units from {}", path.display()))?;
    let summary = loaders::UnitReport::collect(&store)
        .await
        .context("Failed to summarize units")?;

    ctx.emit(&json!({ "load": report, "units": summary }), |_| {
        println!("✅ Units saved: {} (malformed lines: {})", report.saved, report.skipped);
        for (grade, count) in &summary.by_grade {
            println!("   {}학년: {}개 단원", grade, count);
        }
        for chapter in &summary.by_chapter {
            println!("     {}학년 {}단원: {}", chapter.grade, chapter.chapter, chapter.count);
        }
    })
}

pub async fn load_concepts(ctx: &Context, file: Option<PathBuf>) -> Result<()> {
    let path = file.unwrap_or_else(|| ctx.config.data.data_dir.join(CONCEPT_FILE));
    let store = ctx.store().await?;
    let report = loaders::load_concept_documents(&store, &path)
        .await
        .with_context(|| format!("Failed to load concepts from {}", path.display()))?;
    let concepts = ConceptReport::collect(&store)
        .await
        .context("Failed to summarize concepts")?;
    let relationship = UnitRelationship::collect(&store)
        .await
        .context("Failed to compare concept and unit ids")?;

    let output = json!({ "load": report, "concepts": concepts, "unitRelationship": relationship });
    ctx.emit(&output, |_| {
        println!("✅ Concepts saved: {} (malformed lines: {})", report.saved, report.skipped);
        println!("📦 Block types:");
        for (kind, count) in &concepts.block_types {
            println!("   {}: {}", kind, count);
        }
        println!(
            "📝 Practice blocks: {}, practice problems: {}",
            concepts.practice_blocks, concepts.practice_problems
        );
        println!(
            "🔗 Unit match rate: {:.1}% ({} common, {} only in concepts, {} only in units)",
            relationship.match_rate,
            relationship.common.len(),
            relationship.concept_only.len(),
            relationship.unit_only.len()
        );
    })
}

pub async fn load_datasets(ctx: &Context, dir: Option<PathBuf>) -> Result<()> {
    let dir = dir.unwrap_or_else(|| ctx.config.data.data_dir.clone());
    let store = ctx.store().await?;
    let result = loaders::load_all(&store, &dir)
        .await
        .with_context(|| format!("Failed to load datasets from {}", dir.display()))?;

    ctx.emit(&result, |r| {
        let marker = if r.success { "✅" } else { "⚠️ " };
        println!("{} {} ({} documents)", marker, r.message, r.count);
    })?;

    if !result.success {
        anyhow::bail!("{}", result.message);
    }
    Ok(())
}
