use std::sync::Arc;

use catalog::CatalogCache;
use futures::stream::{self, StreamExt};
use providers::{CompletionAdapter, CompletionParams, EmbeddingAdapter, FALLBACK_RATIONALE};
use resilience::{call_guarded, CircuitBreakerManager, ResilienceError, RetryConfig};
use scoring::{rank, score_candidate, Assignment, Candidate, Match, MatchResponse, ScoringWarnings, ScoringWeights};
use vector_index::VectorIndex;

use crate::config::OrchestratorConfig;
use crate::error::MatchEngineError;
use crate::health::HealthAggregator;
use crate::persistence::PersistencePort;

/// Composition root for a single match call (§4.7). Every external
/// collaborator is reached only through its adapter trait, wrapped by
/// [`resilience::call_guarded`] and a per-call deadline.
pub struct MatchOrchestrator {
    embedding: Arc<dyn EmbeddingAdapter>,
    vector_index: Arc<dyn VectorIndex>,
    completion: Arc<dyn CompletionAdapter>,
    persistence: Arc<dyn PersistencePort>,
    catalog: Arc<CatalogCache>,
    breakers: Arc<CircuitBreakerManager>,
    health: Arc<HealthAggregator>,
    retry_config: RetryConfig,
    config: OrchestratorConfig,
    weights: ScoringWeights,
    warnings: ScoringWarnings,
}

impl MatchOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        embedding: Arc<dyn EmbeddingAdapter>,
        vector_index: Arc<dyn VectorIndex>,
        completion: Arc<dyn CompletionAdapter>,
        persistence: Arc<dyn PersistencePort>,
        catalog: Arc<CatalogCache>,
        breakers: Arc<CircuitBreakerManager>,
        health: Arc<HealthAggregator>,
        retry_config: RetryConfig,
        config: OrchestratorConfig,
    ) -> Self {
        let weights = config.weights;
        Self {
            embedding,
            vector_index,
            completion,
            persistence,
            catalog,
            breakers,
            health,
            retry_config,
            config,
            weights,
            warnings: ScoringWarnings::default(),
        }
    }

    pub fn warnings(&self) -> &ScoringWarnings {
        &self.warnings
    }

    fn validate(assignment: &Assignment) -> Result<(), MatchEngineError> {
        if assignment.brief_text().trim().is_empty() {
            return Err(MatchEngineError::Validation(
                "assignment brief text (topic + keyTakeaway + additionalContext) must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Run the full matching algorithm for one assignment (§4.7 steps 1-10).
    pub async fn match_assignment(
        &self,
        assignment: Assignment,
        assignment_id: Option<String>,
    ) -> Result<MatchResponse, MatchEngineError> {
        Self::validate(&assignment)?;

        let request_deadline = self.config.deadlines.request;
        match tokio::time::timeout(request_deadline, self.run(assignment, assignment_id)).await {
            Ok(result) => result,
            Err(_) => Err(MatchEngineError::DeadlineExceeded),
        }
    }

    async fn run(&self, assignment: Assignment, assignment_id: Option<String>) -> Result<MatchResponse, MatchEngineError> {
        let brief_text = assignment.brief_text();
        let mut is_fallback = false;

        // Step 1: embed the brief.
        let embed_result = self.call_embedding(&brief_text).await;
        let embedding_vector = match embed_result {
            Ok(vector) => {
                self.health.record_outcome("embedding", true, None);
                Some(vector)
            }
            Err(err) => {
                tracing::warn!(error = %err, "embedding call failed, falling back to unfiltered catalog scan");
                self.health.record_outcome("embedding", false, Some(err.to_string()));
                is_fallback = true;
                None
            }
        };

        // Step 2: query the vector index, unless embedding already failed.
        let scored_ids = if let Some(vector) = &embedding_vector {
            match self.call_vector_query(vector).await {
                Ok(scored) => {
                    self.health.record_outcome("vector-index", true, None);
                    Some(scored)
                }
                Err(err) => {
                    tracing::warn!(error = %err, "vector query failed, falling back to unfiltered catalog scan");
                    self.health.record_outcome("vector-index", false, Some(err.to_string()));
                    is_fallback = true;
                    None
                }
            }
        } else {
            None
        };

        if is_fallback {
            self.health.record_fallback_exercised();
        }

        // Step 3: build the candidate pool.
        let snapshot = self.catalog.current();
        let candidates: Vec<(String, f64)> = if let Some(scored_ids) = scored_ids {
            scored_ids
                .into_iter()
                .filter(|s| snapshot.get(&s.id).is_some())
                .map(|s| (s.id, s.score))
                .collect()
        } else {
            if !self.catalog.is_loaded() {
                return Err(MatchEngineError::DependencyUnavailable(
                    "catalog has never loaded and the primary candidate path failed".into(),
                ));
            }
            snapshot.all().map(|c| (c.id.clone(), 0.0)).collect()
        };

        if candidates.is_empty() {
            return Ok(MatchResponse {
                assignment,
                matches: vec![],
                reasoning: Some("no suitable creators found".into()),
                is_fallback,
                timestamp: chrono::Utc::now(),
            });
        }

        // Step 4: score candidates with bounded parallelism, preserving the
        // candidate-pool order for ranking's deterministic tie-breaking.
        let parallelism = self.config.max_scoring_parallelism.min(candidates.len()).max(1);
        let work: Vec<(usize, Candidate<'_>)> = candidates
            .iter()
            .enumerate()
            .map(|(idx, (id, score))| (idx, Candidate { creator_id: id.as_str(), semantic_score: *score }))
            .collect();

        let mut scored: Vec<(usize, Match)> = stream::iter(work.into_iter().map(|(idx, candidate)| {
            let creator = snapshot.get(candidate.creator_id).cloned();
            let assignment = &assignment;
            let weights = &self.weights;
            let warnings = &self.warnings;
            async move {
                let creator = creator.expect("candidate id was filtered against the live snapshot above");
                (idx, score_candidate(assignment, &creator, candidate.semantic_score, weights, warnings))
            }
        }))
        .buffer_unordered(parallelism)
        .collect()
        .await;
        scored.sort_by_key(|(idx, _)| *idx);
        let ordered: Vec<Match> = scored.into_iter().map(|(_, m)| m).collect();

        // Step 5: rank and truncate to the response size.
        let mut top = rank(ordered);
        top.truncate(self.config.match_top_k);

        // Step 6: one completion call for the aggregate rationale, never
        // failing the request on a completion failure (§4.4, §4.7 step 8).
        let reasoning = if top.is_empty() {
            None
        } else {
            let names: Vec<&str> = top.iter().map(|m| m.creator.nickname.as_str()).collect();
            let prompt = format!(
                "Explain in one or two sentences why these creators are a good fit for a content brief about \"{}\": {}.",
                assignment.topic,
                names.join(", ")
            );
            Some(self.call_completion(&prompt).await)
        };

        let response = MatchResponse {
            assignment,
            matches: top,
            reasoning,
            is_fallback,
            timestamp: chrono::Utc::now(),
        };

        // Step 7: best-effort persistence, gated on the caller supplying an id.
        if let Some(assignment_id) = assignment_id {
            self.persist(&assignment_id, &response).await;
        }

        Ok(response)
    }

    async fn call_embedding(&self, brief_text: &str) -> Result<Vec<f32>, ResilienceError> {
        let breaker = self.breakers.get_or_create("embedding");
        let embedding = self.embedding.clone();
        let brief = brief_text.to_string();
        let guarded = call_guarded(&breaker, &self.retry_config, move || {
            let embedding = embedding.clone();
            let brief = brief.clone();
            async move { embedding.embed(&brief).await }
        });
        match tokio::time::timeout(self.config.deadlines.embed, guarded).await {
            Ok(result) => result,
            Err(_) => Err(ResilienceError::DeadlineExceeded),
        }
    }

    async fn call_vector_query(&self, vector: &[f32]) -> Result<Vec<vector_index::ScoredId>, ResilienceError> {
        let breaker = self.breakers.get_or_create("vector-index");
        let index = self.vector_index.clone();
        let vector = vector.to_vec();
        let top_k = vector_index::clamp_top_k(self.config.vector_query_top_k);
        let guarded = call_guarded(&breaker, &self.retry_config, move || {
            let index = index.clone();
            let vector = vector.clone();
            async move { index.query(&vector, top_k).await }
        });
        match tokio::time::timeout(self.config.deadlines.vector_query, guarded).await {
            Ok(result) => result,
            Err(_) => Err(ResilienceError::DeadlineExceeded),
        }
    }

    /// Generate a rationale, substituting the canned fallback on any failure
    /// rather than propagating an error — a completion outage never fails a
    /// match response.
    async fn call_completion(&self, prompt: &str) -> String {
        let breaker = self.breakers.get_or_create("completion");
        let completion = self.completion.clone();
        let prompt = prompt.to_string();
        let guarded = call_guarded(&breaker, &self.retry_config, move || {
            let completion = completion.clone();
            let prompt = prompt.clone();
            async move { completion.complete(&prompt, CompletionParams::default()).await }
        });
        match tokio::time::timeout(self.config.deadlines.completion, guarded).await {
            Ok(Ok(text)) => {
                self.health.record_outcome("completion", true, None);
                text
            }
            Ok(Err(err)) => {
                self.health.record_outcome("completion", false, Some(err.to_string()));
                FALLBACK_RATIONALE.to_string()
            }
            Err(_) => {
                self.health.record_outcome("completion", false, Some("deadline exceeded".into()));
                FALLBACK_RATIONALE.to_string()
            }
        }
    }

    async fn persist(&self, assignment_id: &str, response: &MatchResponse) {
        let deadline = self.config.deadlines.persistence;
        let outcome = tokio::time::timeout(
            deadline,
            self.persistence.persist_matches(assignment_id, &response.matches, response.reasoning.as_deref()),
        )
        .await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(error = %err, assignment_id, "failed to persist matches"),
            Err(_) => tracing::warn!(assignment_id, "persisting matches exceeded deadline"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{CatalogError, CatalogSource};
    use providers::{StubCompletionAdapter, StubEmbeddingAdapter};
    use resilience::{CircuitBreakerConfig, CircuitBreakerManager};
    use scoring::{CreatorAnalysis, TargetAudience};
    use std::collections::BTreeSet;
    use std::time::Duration;
    use vector_index::memory::InMemoryVectorIndex;
    use vector_index::VectorRecord;

    struct StaticSource(Vec<scoring::Creator>);

    #[async_trait::async_trait]
    impl CatalogSource for StaticSource {
        async fn list_all(&self) -> Result<Vec<scoring::Creator>, CatalogError> {
            Ok(self.0.clone())
        }
    }

    struct AlwaysFailsSource;

    #[async_trait::async_trait]
    impl CatalogSource for AlwaysFailsSource {
        async fn list_all(&self) -> Result<Vec<scoring::Creator>, CatalogError> {
            Err(CatalogError::SourceUnavailable("unreachable".into()))
        }
    }

    fn creator(id: &str) -> scoring::Creator {
        scoring::Creator {
            id: id.into(),
            nickname: id.into(),
            bio: "".into(),
            follower_count: 1000,
            heart_count: Some(50),
            region: "us".into(),
            analysis: CreatorAnalysis {
                primary_niches: BTreeSet::from(["finance".to_string()]),
                ..Default::default()
            },
        }
    }

    fn assignment() -> Assignment {
        Assignment {
            topic: "Budgeting basics".into(),
            key_takeaway: "Save 20 percent".into(),
            additional_context: "For young professionals".into(),
            target_audience: TargetAudience::default(),
            creator_niches: BTreeSet::from(["finance".to_string()]),
            creator_values: BTreeSet::new(),
            tone_style: None,
        }
    }

    async fn build_orchestrator(source: Arc<dyn CatalogSource>, creators: &[scoring::Creator]) -> MatchOrchestrator {
        let catalog = Arc::new(CatalogCache::new(source, Duration::from_secs(300)));
        let _ = catalog.load().await;

        let index = Arc::new(InMemoryVectorIndex::default());
        index.ensure_index("catalog", 8).await.unwrap();
        let records: Vec<VectorRecord> = creators
            .iter()
            .map(|c| VectorRecord { id: c.id.clone(), vector: vec![0.1; 8], metadata: None })
            .collect();
        if !records.is_empty() {
            index.upsert(records).await.unwrap();
        }

        let breakers = Arc::new(CircuitBreakerManager::new(CircuitBreakerConfig::default()));
        let health = Arc::new(HealthAggregator::new(breakers.clone()));

        MatchOrchestrator::new(
            Arc::new(StubEmbeddingAdapter { dimension: 8 }),
            index,
            Arc::new(StubCompletionAdapter::default()),
            Arc::new(crate::persistence::NoopPersistence),
            catalog,
            breakers,
            health,
            RetryConfig::default(),
            OrchestratorConfig::default(),
        )
    }

    #[tokio::test]
    async fn happy_path_returns_ranked_matches_with_rationale() {
        let creators = vec![creator("a"), creator("b")];
        let orchestrator = build_orchestrator(Arc::new(StaticSource(creators)), &[creator("a"), creator("b")]).await;
        let response = orchestrator.match_assignment(assignment(), None).await.unwrap();
        assert!(!response.is_fallback);
        assert!(!response.matches.is_empty());
        assert!(response.reasoning.is_some());
    }

    #[tokio::test]
    async fn empty_catalog_is_a_success_with_no_matches() {
        let orchestrator = build_orchestrator(Arc::new(StaticSource(vec![])), &[]).await;
        let response = orchestrator.match_assignment(assignment(), None).await.unwrap();
        assert!(response.matches.is_empty());
        assert_eq!(response.reasoning.as_deref(), Some("no suitable creators found"));
    }

    #[tokio::test]
    async fn unloaded_catalog_with_failed_primary_path_is_dependency_unavailable() {
        let catalog = Arc::new(CatalogCache::new(Arc::new(AlwaysFailsSource), Duration::from_secs(300)));
        assert!(!catalog.is_loaded());

        let index = Arc::new(InMemoryVectorIndex::default());
        let breakers = Arc::new(CircuitBreakerManager::new(CircuitBreakerConfig::default()));
        let health = Arc::new(HealthAggregator::new(breakers.clone()));

        struct FailingEmbedding;
        #[async_trait::async_trait]
        impl EmbeddingAdapter for FailingEmbedding {
            async fn embed(&self, _text: &str) -> Result<Vec<f32>, ResilienceError> {
                Err(ResilienceError::DependencyUnavailable("down".into()))
            }
        }

        let orchestrator = MatchOrchestrator::new(
            Arc::new(FailingEmbedding),
            index,
            Arc::new(StubCompletionAdapter::default()),
            Arc::new(crate::persistence::NoopPersistence),
            catalog,
            breakers,
            health,
            RetryConfig { max_attempts: 1, base_delay: Duration::from_millis(1), max_delay: Duration::from_millis(1) },
            OrchestratorConfig::default(),
        );

        let result = orchestrator.match_assignment(assignment(), None).await;
        assert!(matches!(result, Err(MatchEngineError::DependencyUnavailable(_))));
    }

    #[tokio::test]
    async fn blank_brief_text_is_rejected_before_any_adapter_call() {
        let orchestrator = build_orchestrator(Arc::new(StaticSource(vec![])), &[]).await;
        let mut bad = assignment();
        bad.topic = "   ".into();
        bad.key_takeaway = "".into();
        bad.additional_context = "".into();
        let result = orchestrator.match_assignment(bad, None).await;
        assert!(matches!(result, Err(MatchEngineError::Validation(_))));
    }
}
