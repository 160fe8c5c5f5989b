use chrono::{DateTime, Utc};
use nerdmath_ai::{LlmClient, LlmCommentWriter, OpenAiClient, PromptLibrary, TutorService};
use nerdmath_config::AppConfig;
use nerdmath_database::{Catalog, MongoCatalog, MongoStore};
use nerdmath_graph::{ConceptGraph, GraphImport, InMemoryConceptGraph, Neo4jConceptGraph};
use nerdmath_learning::{CommentWriter, ExpressDiagnosticFlow};
use std::sync::Arc;

use crate::errors::{ApiError, ApiResult};

/// Shared services handed to every handler.
///
/// Each external dependency is optional so the API starts without it and
/// the endpoints that need it answer 503.
pub struct AppState {
    pub config: AppConfig,
    pub store: Option<MongoStore>,
    pub catalog: Option<Arc<dyn Catalog>>,
    pub graph: Arc<dyn ConceptGraph>,
    pub tutor: Option<Arc<TutorService>>,
    pub express: Option<Arc<ExpressDiagnosticFlow>>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wire services from already-connected parts.
    pub fn new(
        config: AppConfig,
        store: Option<MongoStore>,
        catalog: Option<Arc<dyn Catalog>>,
        graph: Arc<dyn ConceptGraph>,
        llm: Option<Arc<dyn LlmClient>>,
    ) -> Self {
        let prompts = Arc::new(PromptLibrary::new(config.data.prompt_dir.clone()));

        let tutor = llm.as_ref().map(|llm| {
            Arc::new(TutorService::new(
                llm.clone(),
                prompts.clone(),
                config.openai.chat_model.clone(),
            ))
        });

        let comments: Option<Arc<dyn CommentWriter>> = llm.as_ref().map(|llm| {
            Arc::new(LlmCommentWriter::new(
                llm.clone(),
                prompts.clone(),
                config.openai.comment_model.clone(),
            )) as Arc<dyn CommentWriter>
        });

        let express = catalog.as_ref().map(|catalog| {
            Arc::new(ExpressDiagnosticFlow::new(
                catalog.clone(),
                graph.clone(),
                comments,
                config.learning.clone(),
            ))
        });

        Self {
            config,
            store,
            catalog,
            graph,
            tutor,
            express,
            started_at: Utc::now(),
        }
    }

    /// Connect to every configured backend, degrading instead of failing.
    pub async fn initialize(config: AppConfig) -> Self {
        let store = match MongoStore::connect(&config.mongo).await {
            Ok(store) => {
                tracing::info!("✅ [NerdMath] MongoDB connected: {}", store.name());
                Some(store)
            }
            Err(e) => {
                tracing::warn!("⚠️  [NerdMath] MongoDB unavailable: {}", e);
                tracing::warn!("⚠️  [NerdMath] Problem and dataset endpoints will answer 503");
                None
            }
        };
        let catalog = store
            .clone()
            .map(|store| Arc::new(MongoCatalog::new(store)) as Arc<dyn Catalog>);

        let graph = load_graph(&config).await;

        let llm = match OpenAiClient::new(&config.openai) {
            Ok(client) => Some(Arc::new(client) as Arc<dyn LlmClient>),
            Err(e) => {
                tracing::warn!("⚠️  [NerdMath] {}; tutor endpoints disabled", e);
                None
            }
        };

        Self::new(config, store, catalog, graph, llm)
    }

    pub fn store(&self) -> ApiResult<&MongoStore> {
        self.store
            .as_ref()
            .ok_or_else(|| ApiError::Unavailable("MongoDB is not connected".to_string()))
    }

    pub fn catalog(&self) -> ApiResult<&Arc<dyn Catalog>> {
        self.catalog
            .as_ref()
            .ok_or_else(|| ApiError::Unavailable("MongoDB is not connected".to_string()))
    }

    pub fn tutor(&self) -> ApiResult<&TutorService> {
        self.tutor
            .as_deref()
            .ok_or_else(|| ApiError::Unavailable("OPENAI_API_KEY is not configured".to_string()))
    }

    pub fn express(&self) -> ApiResult<&ExpressDiagnosticFlow> {
        self.express
            .as_deref()
            .ok_or_else(|| ApiError::Unavailable("MongoDB is not connected".to_string()))
    }
}

/// Neo4j when reachable, else the CSV export in `DATA_DIR`, else an empty graph.
pub async fn load_graph(config: &AppConfig) -> Arc<dyn ConceptGraph> {
    if config.neo4j.is_configured() {
        match Neo4jConceptGraph::connect(&config.neo4j).await {
            Ok(graph) => {
                tracing::info!("✅ [NerdMath] Neo4j connected: {}", graph.uri());
                return Arc::new(graph);
            }
            Err(e) => tracing::warn!("⚠️  [NerdMath] Neo4j unavailable: {}", e),
        }
    }

    match GraphImport::from_dir(&config.data.data_dir) {
        Ok(import) => {
            let graph = InMemoryConceptGraph::from_import(&import);
            tracing::info!(
                concepts = graph.node_count(),
                precedes = graph.edge_count(),
                "🔷 [NerdMath] Serving concept graph from CSV export"
            );
            Arc::new(graph)
        }
        Err(e) => {
            tracing::warn!("⚠️  [NerdMath] No concept graph available ({}); using an empty graph", e);
            Arc::new(InMemoryConceptGraph::new())
        }
    }
}
