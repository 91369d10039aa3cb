use std::sync::Mutex;

use async_trait::async_trait;
use crew_digest::clients::{ChatBackend, ChatCompletion, ChatError, ChatRequest};
use crew_digest::condenser::SummaryCondenser;
use crew_digest::config::SummarizerConfig;
use crew_digest::schemas::RecommendationSource;
use crew_digest::{InvocationContext, ResultPipeline, ServiceId};
use serde_json::json;

/// Records every request and answers with a canned reply
struct RecordingBackend {
    reply: Result<String, u16>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl RecordingBackend {
    fn answering(content: &str) -> Self {
        Self {
            reply: Ok(content.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for RecordingBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, ChatError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Ok(content) => Ok(ChatCompletion {
                content: content.clone(),
                usage: None,
            }),
            Err(401) => Err(ChatError::Unauthorized),
            Err(status) => Err(ChatError::Unavailable { status: *status }),
        }
    }
}

#[tokio::test]
async fn long_input_is_truncated_in_the_request_payload() {
    let backend = RecordingBackend::answering("1. Expand into tier-2 cities now");
    let condenser = SummaryCondenser::new(SummarizerConfig::default());
    let text = "a".repeat(5000);

    let bullets = condenser.condense(&backend, &text).await;
    assert_eq!(bullets, vec!["Expand into tier-2 cities now".to_string()]);

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    let prompt = requests[0].user_prompt().unwrap();
    let report = format!("Report:\n{}...\n\n", "a".repeat(4000));
    assert!(prompt.contains(&report));
    assert!(!prompt.contains(&"a".repeat(4001)));

    let body = serde_json::to_value(&requests[0]).unwrap();
    assert_eq!(body["max_tokens"], json!(500));
    assert_eq!(body["model"], json!("llama-3.3-70b-versatile"));
    assert!(body.get("stop").is_none());
}

#[tokio::test]
async fn backend_failure_yields_no_bullets() {
    let backend = RecordingBackend::failing(503);
    let condenser = SummaryCondenser::default();
    let bullets = condenser.condense(&backend, &"report ".repeat(40)).await;
    assert!(bullets.is_empty());
    assert_eq!(backend.requests().len(), 1);
}

#[tokio::test]
async fn short_text_never_reaches_the_backend() {
    let backend = RecordingBackend::answering("1. unused bullet text");
    let bullets = SummaryCondenser::default()
        .condense(&backend, "Too short.")
        .await;
    assert!(bullets.is_empty());
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn condenser_failure_does_not_abort_the_result() {
    let summary = format!("{} No headings here.", "Market overview. ".repeat(10));
    let raw = json!({"final_output": summary});
    let backend = RecordingBackend::failing(401);
    let result = ResultPipeline::default()
        .run_with_condenser(
            &InvocationContext::at(5),
            ServiceId::CompAnalysis,
            &raw,
            ServiceId::CompAnalysis.info().agents,
            &SummaryCondenser::default(),
            &backend,
        )
        .await;
    assert!(result.success);
    assert!(result.executive_summary.is_empty());
    assert!(result.recommendations.is_none());
    assert_eq!(result.agents.len(), 5);
}

#[tokio::test]
async fn condensed_bullets_feed_the_recommendation_tier() {
    let summary = format!("{} Nothing structured.", "Competitor activity rose. ".repeat(8));
    let raw = json!({"final_output": summary});
    let backend = RecordingBackend::answering(
        "1. **Match rival delivery fees**\n2. Launch loyalty tiers quickly\n3. ok",
    );
    let result = ResultPipeline::default()
        .run_with_condenser(
            &InvocationContext::at(5),
            ServiceId::WarSimulation,
            &raw,
            ServiceId::WarSimulation.info().agents,
            &SummaryCondenser::default(),
            &backend,
        )
        .await;
    assert_eq!(
        result.executive_summary,
        vec!["Match rival delivery fees", "Launch loyalty tiers quickly"]
    );
    assert_eq!(
        result.recommendation_source,
        Some(RecommendationSource::ExecutiveSummary)
    );
    assert_eq!(result.recommendations.unwrap().len(), 2);
}
