//! LLM platform evaluator
//!
//! Asks the configured provider for a structured assessment of a platform
//! against the ontology, validates the reply and wraps it as a
//! [`PlatformAssessment`]. Failures surface to the caller; there is no
//! silent local fallback.

pub mod cache;
pub mod prompt;
pub mod schema;

pub use cache::{AssessmentCache, CacheKey};
pub use prompt::build_prompt;
pub use schema::{assessment_schema, parse_assessment, RawAssessment, ValidatedAssessment};

use crate::assessment::{AssessmentSource, PlatformAssessment};
use crate::config::{AppConfig, OrganizationContext};
use crate::error::{EvalError, Result};
use crate::llm::LlmProvider;
use crate::metrics::METRICS;
use crate::ontology::Ontology;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Retry policy applied by the evaluator around each provider call
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first failure
    pub attempts: usize,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 0,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff before retry `attempt` (1-based)
    pub fn backoff_for(&self, attempt: usize) -> Duration {
        let multiplier = 2_u32.saturating_pow(attempt.saturating_sub(1) as u32);
        self.backoff.saturating_mul(multiplier)
    }
}

/// Evaluates platforms through an [`LlmProvider`]
pub struct PlatformEvaluator {
    provider: Arc<dyn LlmProvider>,
    ontology: Arc<Ontology>,
    organization: OrganizationContext,
    schema: serde_json::Value,
    ontology_hash: String,
    cache: Option<AssessmentCache>,
    retry: RetryPolicy,
    max_concurrent: usize,
}

impl PlatformEvaluator {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        ontology: Arc<Ontology>,
        organization: OrganizationContext,
    ) -> Self {
        let schema = assessment_schema(&ontology);
        let ontology_hash = ontology.content_hash();
        Self {
            provider,
            ontology,
            organization,
            schema,
            ontology_hash,
            cache: None,
            retry: RetryPolicy::default(),
            max_concurrent: 1,
        }
    }

    /// Evaluator with cache, retry and concurrency taken from `config`
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn LlmProvider>,
        ontology: Arc<Ontology>,
    ) -> Self {
        let mut evaluator = Self::new(provider, ontology, config.organization.clone())
            .with_retry(RetryPolicy {
                attempts: config.llm.retry_attempts,
                backoff: config.llm.retry_backoff(),
            })
            .with_concurrency(config.llm.max_concurrent_evaluations);
        evaluator.cache = AssessmentCache::from_config(&config.cache);
        evaluator
    }

    pub fn with_cache(mut self, cache: AssessmentCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_concurrency(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn provider(&self) -> &dyn LlmProvider {
        self.provider.as_ref()
    }

    pub fn schema(&self) -> &serde_json::Value {
        &self.schema
    }

    /// Assess one platform, optionally grounding the model in vendor material
    pub async fn evaluate(
        &self,
        platform: &str,
        vendor_context: Option<&str>,
    ) -> Result<PlatformAssessment> {
        let platform = platform.trim();
        if platform.is_empty() {
            return Err(EvalError::invalid("platform name is empty"));
        }

        let key = CacheKey::new(platform, &self.ontology_hash, vendor_context);
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key).await {
                debug!("Cache hit for {}", platform);
                METRICS.record_cache(true);
                return Ok(hit);
            }
            METRICS.record_cache(false);
        }

        let prompt = build_prompt(platform, &self.ontology, &self.organization, vendor_context);
        let provider_label = self.provider.kind().to_string();

        let mut attempt = 0;
        let assessment = loop {
            let start = Instant::now();
            let result = self.request(platform, &prompt).await;
            METRICS.record_evaluation(
                &provider_label,
                status_label(&result),
                start.elapsed().as_secs_f64(),
            );

            match result {
                Ok(assessment) => break assessment,
                Err(e) if e.is_retryable() && attempt < self.retry.attempts => {
                    attempt += 1;
                    let backoff = self.retry.backoff_for(attempt);
                    warn!(
                        "Evaluation of {} failed: {}, retrying in {:?} ({}/{})",
                        platform, e, backoff, attempt, self.retry.attempts
                    );
                    METRICS.record_retry(&provider_label);
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    warn!("Evaluation of {} failed: {}", platform, e);
                    return Err(e);
                }
            }
        };

        if let Some(cache) = &self.cache {
            cache.insert(key, assessment.clone()).await;
        }

        info!(
            "Evaluated {} via {}: overall fit {:.2}",
            platform,
            self.provider.name(),
            assessment.overall_fit_score
        );
        Ok(assessment)
    }

    /// Assess several platforms with bounded concurrency.
    ///
    /// Results come back in input order, each paired with its platform name;
    /// one failure does not abort the rest.
    pub async fn evaluate_many(
        &self,
        platforms: &[String],
        vendor_context: Option<&str>,
    ) -> Vec<(String, Result<PlatformAssessment>)> {
        let mut results: Vec<(usize, String, Result<PlatformAssessment>)> =
            stream::iter(platforms.iter().enumerate())
                .map(|(index, name)| async move {
                    let result = self.evaluate(name, vendor_context).await;
                    (index, name.clone(), result)
                })
                .buffer_unordered(self.max_concurrent)
                .collect()
                .await;

        results.sort_by_key(|(index, _, _)| *index);
        results
            .into_iter()
            .map(|(_, name, result)| (name, result))
            .collect()
    }

    async fn request(&self, platform: &str, prompt: &str) -> Result<PlatformAssessment> {
        let response = self.provider.chat(prompt, &self.schema).await?;
        let validated = parse_assessment(platform, &response.raw_text, &self.ontology)?;

        Ok(PlatformAssessment {
            platform: platform.to_string(),
            capability_scores: validated.capability_scores,
            strengths: validated.strengths,
            weaknesses: validated.weaknesses,
            best_for_use_case: validated.best_for_use_case,
            overall_fit_score: validated.overall_fit_score,
            source: AssessmentSource::Llm {
                provider: response.provider.to_string(),
                model: response.model.clone(),
            },
            notes: Some(format!("Generated via {} ({})", response.provider, response.model)),
        })
    }
}

fn status_label(result: &Result<PlatformAssessment>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(EvalError::RateLimit { .. }) => "rate_limited",
        Err(EvalError::Timeout { .. }) => "timeout",
        Err(EvalError::SchemaViolation { .. }) => "schema_violation",
        Err(_) => "error",
    }
}
