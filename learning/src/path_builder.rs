use chrono::Utc;
use nerdmath_config::LearningConfig;
use nerdmath_graph::{clamp_depth, ConceptGraph, MatchKind};
use nerdmath_models::{ConceptNode, DiagnosticAnalysis, LearningPath, LearningPathNode, NodeStatus};
use std::sync::Arc;

use crate::errors::LearningResult;

pub const WEAK_CONCEPT_MINUTES: u32 = 20;
pub const PREREQUISITE_MINUTES: u32 = 15;

/// A node before positions and durations are assigned.
#[derive(Debug, Clone)]
struct Candidate {
    node: ConceptNode,
    is_weak: bool,
    prerequisite_level: Option<u32>,
}

/// Expands weak concepts into an ordered study path over the prerequisite graph.
pub struct LearningPathBuilder {
    graph: Arc<dyn ConceptGraph>,
    config: LearningConfig,
}

impl LearningPathBuilder {
    pub fn new(graph: Arc<dyn ConceptGraph>, config: LearningConfig) -> Self {
        Self { graph, config }
    }

    /// Prerequisites deepest first, then the weak concept, for every weak
    /// concept in the analysis.
    async fn candidates(&self, weak_concepts: &[String]) -> LearningResult<Vec<Candidate>> {
        let depth = clamp_depth(self.config.max_depth);
        let mut candidates = Vec::new();

        for name in weak_concepts {
            let Some((node, kind)) = self.graph.resolve_concept(name).await? else {
                tracing::debug!(concept = %name, "Weak concept not in graph");
                candidates.push(Candidate {
                    node: ConceptNode::named(name.trim()),
                    is_weak: true,
                    prerequisite_level: None,
                });
                continue;
            };
            if kind == MatchKind::Similar {
                tracing::debug!(concept = %name, matched = %node.concept, "Using similar concept");
            }

            let mut prerequisites = self.graph.prerequisites(&node.concept, depth).await?;
            prerequisites.sort_by(|a, b| b.depth.cmp(&a.depth).then_with(|| a.node.concept.cmp(&b.node.concept)));
            candidates.extend(prerequisites.into_iter().map(|p| Candidate {
                node: p.node,
                is_weak: false,
                prerequisite_level: Some(p.depth),
            }));
            candidates.push(Candidate {
                node,
                is_weak: true,
                prerequisite_level: None,
            });
        }
        Ok(candidates)
    }

    /// Build the path from the graph. Graph failures are returned to the caller.
    pub async fn build(&self, analysis: &DiagnosticAnalysis) -> LearningResult<LearningPath> {
        let candidates = self.candidates(&analysis.weak_concepts).await?;
        Ok(self.assemble(analysis, candidates))
    }

    /// Path made of the weak concepts alone, for when the graph is unusable.
    pub fn build_without_prerequisites(&self, analysis: &DiagnosticAnalysis) -> LearningPath {
        let candidates = analysis
            .weak_concepts
            .iter()
            .map(|name| Candidate {
                node: ConceptNode::named(name.trim()),
                is_weak: true,
                prerequisite_level: None,
            })
            .collect();
        self.assemble(analysis, candidates)
    }

    fn assemble(&self, analysis: &DiagnosticAnalysis, candidates: Vec<Candidate>) -> LearningPath {
        let mut unique: Vec<Candidate> = Vec::new();
        for candidate in candidates {
            if candidate.node.concept.is_empty() {
                continue;
            }
            match unique.iter_mut().find(|c| c.node.concept == candidate.node.concept) {
                Some(existing) => existing.is_weak |= candidate.is_weak,
                None => unique.push(candidate),
            }
        }
        unique.truncate(self.config.max_nodes);

        let nodes: Vec<LearningPathNode> = unique
            .into_iter()
            .enumerate()
            .map(|(i, c)| LearningPathNode {
                concept: c.node.concept,
                unit: c.node.unit,
                grade: c.node.grade,
                priority: i as u32 + 1,
                is_weak_concept: c.is_weak,
                is_prerequisite: c.prerequisite_level.is_some(),
                prerequisite_level: c.prerequisite_level,
                estimated_minutes: if c.is_weak { WEAK_CONCEPT_MINUTES } else { PREREQUISITE_MINUTES },
                status: NodeStatus::NotStarted,
            })
            .collect();

        let weak_count = nodes.iter().filter(|n| n.is_weak_concept).count();
        let (path_name, description) = match analysis.weak_concepts.first() {
            Some(first) => (
                format!("{} 중심 맞춤 학습 경로", first.trim()),
                format!(
                    "취약 개념 {}개와 선수 개념 {}개로 구성된 학습 경로입니다.",
                    weak_count,
                    nodes.len() - weak_count
                ),
            ),
            None => (
                "맞춤 학습 경로".to_string(),
                "취약한 개념이 없어 심화 학습을 권장합니다.".to_string(),
            ),
        };

        LearningPath {
            path_id: uuid::Uuid::new_v4().to_string(),
            user_id: analysis.user_id.clone(),
            analysis_id: analysis.analysis_id.clone(),
            path_name,
            description,
            total_concepts: nodes.len(),
            estimated_duration: nodes.iter().map(|n| n.estimated_minutes).sum(),
            start_concept: nodes.first().map(|n| n.concept.clone()),
            nodes,
            status: "active".to_string(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nerdmath_graph::{GraphImport, InMemoryConceptGraph};
    use nerdmath_models::{ExternalId, LearnerClass, OverallLevel};

    const NODES: &str = "concept,unit,grade\n\
        1.1 소인수분해,수와 연산,1\n\
        1.2 정수와 유리수,수와 연산,1\n\
        1.3 정수와 유리수의 계산,수와 연산,1\n\
        2.1 문자의 사용과 식의 계산,문자와 식,1\n\
        2.2 일차방정식,문자와 식,1\n\
        3.1 좌표평면과 그래프,함수,1\n";

    const EDGES: &str = "source,target,type\n\
        1.1 소인수분해,1.2 정수와 유리수,PRECEDES\n\
        1.2 정수와 유리수,1.3 정수와 유리수의 계산,PRECEDES\n\
        1.3 정수와 유리수의 계산,2.1 문자의 사용과 식의 계산,PRECEDES\n\
        2.1 문자의 사용과 식의 계산,2.2 일차방정식,PRECEDES\n";

    fn builder(config: LearningConfig) -> LearningPathBuilder {
        let import = GraphImport::from_csv_str(NODES, EDGES).unwrap();
        LearningPathBuilder::new(Arc::new(InMemoryConceptGraph::from_import(&import)), config)
    }

    fn analysis(weak: &[&str]) -> DiagnosticAnalysis {
        DiagnosticAnalysis {
            analysis_id: "analysis-1".to_string(),
            test_id: "test-1".to_string(),
            user_id: ExternalId::Number(7),
            accuracy_rate: 40.0,
            average_seconds: 30.0,
            weak_units: weak.iter().map(|s| s.to_string()).collect(),
            weak_concepts: weak.iter().map(|s| s.to_string()).collect(),
            unit_stats: Vec::new(),
            overall_level: OverallLevel::Low,
            class: LearnerClass::Developing,
            ai_comment: String::new(),
            recommended_path: Vec::new(),
            recommended_start_unit: None,
            recommended_start_concept: None,
            grade_range: None,
            generated_at: Utc::now(),
        }
    }

    fn concepts(path: &LearningPath) -> Vec<&str> {
        path.nodes.iter().map(|n| n.concept.as_str()).collect()
    }

    #[tokio::test]
    async fn test_prerequisites_come_first_deepest_first() {
        let path = builder(LearningConfig::default())
            .build(&analysis(&["2.1 문자의 사용과 식의 계산"]))
            .await
            .unwrap();

        assert_eq!(
            concepts(&path),
            vec![
                "1.1 소인수분해",
                "1.2 정수와 유리수",
                "1.3 정수와 유리수의 계산",
                "2.1 문자의 사용과 식의 계산"
            ]
        );
        assert_eq!(path.nodes[0].prerequisite_level, Some(3));
        assert!(path.nodes[3].is_weak_concept);
        assert!(!path.nodes[3].is_prerequisite);
        assert_eq!(path.estimated_duration, 15 * 3 + 20);
        assert_eq!(path.start_concept.as_deref(), Some("1.1 소인수분해"));
        assert_eq!(path.total_concepts, 4);
        assert_eq!(path.nodes.iter().map(|n| n.priority).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_duplicates_keep_first_position_and_weak_flag() {
        let path = builder(LearningConfig::default())
            .build(&analysis(&["2.2 일차방정식", "1.2 정수와 유리수"]))
            .await
            .unwrap();

        assert_eq!(path.total_concepts, 5);
        let repeated = path.nodes.iter().find(|n| n.concept == "1.2 정수와 유리수").unwrap();
        assert_eq!(repeated.priority, 2);
        assert!(repeated.is_weak_concept);
        assert!(repeated.is_prerequisite);
        assert_eq!(repeated.estimated_minutes, 20);
        assert_eq!(path.weak_concepts().count(), 2);
    }

    #[tokio::test]
    async fn test_depth_limit_similar_match_and_unmatched() {
        let config = LearningConfig {
            max_depth: 1,
            ..LearningConfig::default()
        };
        let path = builder(config)
            .build(&analysis(&["일차방정식", "삼각비"]))
            .await
            .unwrap();

        assert_eq!(
            concepts(&path),
            vec!["2.1 문자의 사용과 식의 계산", "2.2 일차방정식", "삼각비"]
        );
        assert_eq!(path.path_name, "일차방정식 중심 맞춤 학습 경로");
        assert!(path.nodes[2].unit.is_none());
    }

    #[tokio::test]
    async fn test_max_nodes_cap() {
        let config = LearningConfig {
            max_nodes: 2,
            ..LearningConfig::default()
        };
        let path = builder(config)
            .build(&analysis(&["2.2 일차방정식"]))
            .await
            .unwrap();
        assert_eq!(concepts(&path), vec!["1.1 소인수분해", "1.2 정수와 유리수"]);
        assert_eq!(path.estimated_duration, 30);
    }

    #[test]
    fn test_without_prerequisites_and_empty() {
        let builder = builder(LearningConfig::default());
        let path = builder.build_without_prerequisites(&analysis(&["정수", "정수", "함수"]));
        assert_eq!(concepts(&path), vec!["정수", "함수"]);
        assert_eq!(path.estimated_duration, 40);

        let empty = builder.build_without_prerequisites(&analysis(&[]));
        assert!(empty.nodes.is_empty());
        assert_eq!(empty.start_concept, None);
        assert_eq!(empty.path_name, "맞춤 학습 경로");
    }
}
