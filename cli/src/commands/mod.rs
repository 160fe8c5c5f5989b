mod data;
mod graph;
mod reports;

use anyhow::{Context as _, Result};
use nerdmath_config::AppConfig;
use nerdmath_database::MongoStore;
use serde::Serialize;

use crate::cli::Command;

/// Configuration plus output mode shared by every command.
pub struct Context {
    pub config: AppConfig,
    pub json: bool,
}

impl Context {
    pub async fn store(&self) -> Result<MongoStore> {
        MongoStore::connect(&self.config.mongo)
            .await
            .with_context(|| format!("Failed to connect to MongoDB database '{}'", self.config.mongo.database))
    }

    /// Print `value` as JSON in `--json` mode, otherwise run `text`.
    pub fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value).context("Failed to render JSON output")?);
        } else {
            text(value);
        }
        Ok(())
    }
}

pub async fn run(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::SetupCollections => data::setup_collections(ctx).await,
        Command::LoadProblems { unit_tests, diagnostics } => data::load_problems(ctx, unit_tests, diagnostics).await,
        Command::LoadUnits { file } => data::load_units(ctx, file).await,
        Command::LoadConcepts { file } => data::load_concepts(ctx, file).await,
        Command::LoadDatasets { dir } => data::load_datasets(ctx, dir).await,
        Command::RebuildGraph { dir, yes } => graph::rebuild(ctx, dir, yes).await,
        Command::CheckConnections => graph::check_connections(ctx).await,
        Command::GraphReport { top, csv } => graph::report(ctx, top, csv).await,
        Command::Prerequisites { concept, depth, csv } => graph::prerequisites(ctx, &concept, depth, csv).await,
        Command::UnitSummary => reports::unit_summary(ctx).await,
        Command::Stats => reports::stats(ctx).await,
        Command::Export { out, limit } => reports::export(ctx, &out, limit).await,
        Command::Cleanup { test_ids, path_ids } => reports::cleanup(ctx, &test_ids, &path_ids).await,
    }
}
