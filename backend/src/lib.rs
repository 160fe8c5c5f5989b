//! NerdMath REST API: tutoring, diagnostics, the concept graph and data loading.

pub mod errors;
pub mod handlers;
pub mod routes;
pub mod state;

pub use errors::{ApiError, ApiResult};
pub use routes::configure_routes;
pub use state::{load_graph, AppState};

#[cfg(test)]
pub(crate) mod test_support {
    use nerdmath_ai::{LlmClient, StaticLlm};
    use nerdmath_config::AppConfig;
    use nerdmath_database::{Catalog, InMemoryCatalog};
    use nerdmath_graph::{ConceptGraph, InMemoryConceptGraph};
    use std::sync::Arc;

    use crate::state::AppState;

    #[derive(Default)]
    pub struct TestParts {
        pub env: Vec<(&'static str, &'static str)>,
        pub catalog: Option<Arc<InMemoryCatalog>>,
        pub graph: Option<Arc<dyn ConceptGraph>>,
        pub llm: Option<Arc<StaticLlm>>,
    }

    /// State over in-memory backends; prompts always come from the built-ins.
    pub fn test_app_state(parts: TestParts) -> AppState {
        let env = parts.env;
        let config = AppConfig::from_lookup(|key| {
            if key == "PROMPT_DIR" {
                return Some("/nonexistent/prompts".to_string());
            }
            env.iter().find(|(k, _)| *k == key).map(|(_, v)| v.to_string())
        })
        .unwrap();

        AppState::new(
            config,
            None,
            parts.catalog.map(|c| c as Arc<dyn Catalog>),
            parts.graph.unwrap_or_else(|| Arc::new(InMemoryConceptGraph::new())),
            parts.llm.map(|l| l as Arc<dyn LlmClient>),
        )
    }
}
