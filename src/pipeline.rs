//! normalize → extract → parse → assign, with the recommendation fallback tiers.

use serde_json::Value;

use crate::clients::traits::ChatBackend;
use crate::condenser::SummaryCondenser;
use crate::error::Result;
use crate::extractor::RecommendationExtractor;
use crate::normalizer::ResponseNormalizer;
use crate::parser::ParsedRecommendation;
use crate::priority::PriorityAssigner;
use crate::schemas::{
    AgentResultSet, CanonicalResult, RecommendationItem, RecommendationSource, SummaryBullet,
};
use crate::services::ServiceId;

/// Per-invocation inputs that would otherwise be ambient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationContext {
    pub timestamp_ms: i64,
}

impl InvocationContext {
    pub fn now() -> Self {
        Self {
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn at(timestamp_ms: i64) -> Self {
        Self { timestamp_ms }
    }
}

#[derive(Debug, Clone)]
pub struct ResultPipeline {
    normalizer: ResponseNormalizer,
    primary: RecommendationExtractor,
    secondary: RecommendationExtractor,
    assigner: PriorityAssigner,
}

impl Default for ResultPipeline {
    fn default() -> Self {
        Self::new(PriorityAssigner::default())
    }
}

impl ResultPipeline {
    pub fn new(assigner: PriorityAssigner) -> Self {
        Self::with_extractors(
            RecommendationExtractor::primary(),
            RecommendationExtractor::reduced(),
            assigner,
        )
    }

    pub fn with_extractors(
        primary: RecommendationExtractor,
        secondary: RecommendationExtractor,
        assigner: PriorityAssigner,
    ) -> Self {
        Self {
            normalizer: ResponseNormalizer::new(),
            primary,
            secondary,
            assigner,
        }
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(PriorityAssigner::new(config.limits.max_recommendations))
    }

    pub fn run(
        &self,
        ctx: &InvocationContext,
        service: ServiceId,
        raw: &Value,
        expected: &[impl AsRef<str>],
        executive_summary: Vec<SummaryBullet>,
    ) -> CanonicalResult {
        let set = self.normalizer.normalize(service, raw, expected, ctx);
        self.finish(service, set, executive_summary)
    }

    /// Like [`run`](Self::run), but generates the executive summary first.
    /// The condenser runs after normalization and cannot fail the result.
    pub async fn run_with_condenser(
        &self,
        ctx: &InvocationContext,
        service: ServiceId,
        raw: &Value,
        expected: &[impl AsRef<str>],
        condenser: &SummaryCondenser,
        backend: &dyn ChatBackend,
    ) -> CanonicalResult {
        let set = self.normalizer.normalize(service, raw, expected, ctx);
        let bullets = if set.summary.trim().is_empty() {
            Vec::new()
        } else {
            condenser.condense(backend, &set.summary).await
        };
        self.finish(service, set, bullets)
    }

    fn finish(
        &self,
        service: ServiceId,
        set: AgentResultSet,
        executive_summary: Vec<SummaryBullet>,
    ) -> CanonicalResult {
        let (recommendations, recommendation_source) =
            match self.recommendations(&set.summary, &executive_summary) {
                Some((items, source)) => (Some(items), Some(source)),
                None => (None, None),
            };
        CanonicalResult {
            success: true,
            service_name: service.info().name.to_string(),
            summary: set.summary,
            agents: set.agents,
            metadata: set.metadata,
            executive_summary,
            recommendations,
            recommendation_source,
        }
    }

    /// Walk the fallback tiers; `None` means nothing structured was found
    pub fn recommendations(
        &self,
        summary: &str,
        executive_summary: &[SummaryBullet],
    ) -> Option<(Vec<RecommendationItem>, RecommendationSource)> {
        if let Some(block) = self.primary.extract(summary) {
            let source = RecommendationSource::Extracted {
                heading: block.heading.to_string(),
            };
            return Some((self.assigner.assign(block.items), source));
        }

        if !executive_summary.is_empty() {
            tracing::debug!("using executive summary as recommendations");
            let items = executive_summary
                .iter()
                .enumerate()
                .map(|(idx, bullet)| ParsedRecommendation {
                    ordinal: (idx + 1).to_string(),
                    title: bullet.clone(),
                    details: Vec::new(),
                })
                .collect();
            return Some((
                self.assigner.assign(items),
                RecommendationSource::ExecutiveSummary,
            ));
        }

        if let Some(block) = self.secondary.extract(summary) {
            let source = RecommendationSource::SecondaryPass {
                heading: block.heading.to_string(),
            };
            return Some((self.assigner.assign(block.items), source));
        }

        tracing::debug!("no structured recommendations found");
        None
    }
}

/// Single entry point: raw backend response in, canonical result out
pub fn normalize_and_extract(
    service_id: &str,
    raw: &Value,
    expected: &[impl AsRef<str>],
    executive_summary: Option<Vec<SummaryBullet>>,
    ctx: &InvocationContext,
) -> Result<CanonicalResult> {
    let service: ServiceId = service_id.parse()?;
    Ok(ResultPipeline::default().run(
        ctx,
        service,
        raw,
        expected,
        executive_summary.unwrap_or_default(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::Priority;
    use serde_json::json;

    const CTX: InvocationContext = InvocationContext { timestamp_ms: 1 };

    #[test]
    fn primary_tier_wins_over_bullets() {
        let raw = json!({"final_output": "## Recommendations\n1. Go\n2. Stop"});
        let result = ResultPipeline::default().run(
            &CTX,
            ServiceId::CompAnalysis,
            &raw,
            &["Web Recon Agent"],
            vec!["Bullet one here".into()],
        );
        let recs = result.recommendations.unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(
            result.recommendation_source,
            Some(RecommendationSource::Extracted {
                heading: "recommendations".into()
            })
        );
    }

    #[test]
    fn bullets_become_recommendations_without_details() {
        let raw = json!({"final_output": "No headings at all."});
        let result = ResultPipeline::default().run(
            &CTX,
            ServiceId::CompAnalysis,
            &raw,
            &["Web Recon Agent"],
            vec!["Expand APAC presence".into(), "Cut churn fast".into()],
        );
        let recs = result.recommendations.unwrap();
        assert_eq!(recs[1].title, "Cut churn fast");
        assert!(recs[1].details.is_empty());
        assert_eq!(recs[1].priority, Priority::High);
        assert_eq!(
            result.recommendation_source,
            Some(RecommendationSource::ExecutiveSummary)
        );
    }

    #[test]
    fn secondary_pass_runs_when_bullets_are_empty() {
        let no_headings = RecommendationExtractor::new(
            vec![],
            crate::parser::RecommendationParser::default(),
            crate::extractor::Cascade::FirstParseable,
        );
        let pipeline = ResultPipeline::with_extractors(
            no_headings,
            RecommendationExtractor::reduced(),
            PriorityAssigner::default(),
        );
        let summary = "## Key Takeaways\n1: Partner with OEMs\n2024 was a strong year";
        let (items, source) = pipeline.recommendations(summary, &[]).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Partner with OEMs");
        assert_eq!(items[0].details, vec!["2024 was a strong year".to_string()]);
        assert_eq!(
            source,
            RecommendationSource::SecondaryPass {
                heading: "key_takeaways".into()
            }
        );
    }

    #[test]
    fn nothing_found_is_null_not_error() {
        let result = normalize_and_extract(
            "digital_twin",
            &json!({"results": {}}),
            &["Behavior Modeler"],
            None,
            &CTX,
        )
        .unwrap();
        assert!(result.recommendations.is_none());
        assert!(result.recommendation_source.is_none());
        assert!(result.success);
        assert_eq!(result.service_name, "Digital Twin Crew");
    }
}
