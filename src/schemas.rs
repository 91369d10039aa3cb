//! Canonical data model shared by the normalizer, the recommendation pipeline
//! and the rendering surface.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::reconciler::{self, AgentLookup};

/// Output text used when a service returned nothing for an expected agent
pub const PLACEHOLDER_OUTPUT: &str = "Agent output not available in API response";
/// Output text used when an agent entry exists but carries no text
pub const EMPTY_OUTPUT: &str = "No output";

pub type SummaryBullet = String;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Completed,
}

/// One agent's normalized output. `output` is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutput {
    pub key: String,
    pub output: String,
    pub status: AgentStatus,
    /// True when the text was fabricated because the service sent nothing
    pub placeholder: bool,
}

impl AgentOutput {
    pub fn new(key: impl Into<String>, output: impl Into<String>) -> Self {
        let output = output.into();
        let output = if output.trim().is_empty() {
            EMPTY_OUTPUT.to_string()
        } else {
            output
        };
        Self {
            key: key.into(),
            output,
            status: AgentStatus::Completed,
            placeholder: false,
        }
    }

    pub fn placeholder(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            output: PLACEHOLDER_OUTPUT.to_string(),
            status: AgentStatus::Completed,
            placeholder: true,
        }
    }
}

/// Wire form of one agent; the key lives in the surrounding map
#[derive(Clone, Serialize, Deserialize)]
struct AgentEntry {
    output: String,
    #[serde(default)]
    status: AgentStatus,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    placeholder: bool,
}

/// Agent outputs keyed by name, kept in the order the service produced them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "IndexMap<String, AgentEntry>",
    into = "IndexMap<String, AgentEntry>"
)]
pub struct AgentMap {
    entries: IndexMap<String, AgentOutput>,
}

impl AgentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert, replacing an entry with the same key in place
    pub fn insert(&mut self, agent: AgentOutput) {
        self.entries.insert(agent.key.clone(), agent);
    }

    pub fn get(&self, key: &str) -> Option<&AgentOutput> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentOutput> {
        self.entries.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<AgentOutput> for AgentMap {
    fn from_iter<I: IntoIterator<Item = AgentOutput>>(iter: I) -> Self {
        let mut map = AgentMap::new();
        for agent in iter {
            map.insert(agent);
        }
        map
    }
}

impl From<IndexMap<String, AgentEntry>> for AgentMap {
    fn from(wire: IndexMap<String, AgentEntry>) -> Self {
        wire.into_iter()
            .map(|(key, entry)| AgentOutput {
                status: entry.status,
                placeholder: entry.placeholder,
                ..AgentOutput::new(key, entry.output)
            })
            .collect()
    }
}

impl From<AgentMap> for IndexMap<String, AgentEntry> {
    fn from(map: AgentMap) -> Self {
        map.entries
            .into_iter()
            .map(|(key, agent)| {
                let entry = AgentEntry {
                    output: agent.output,
                    status: agent.status,
                    placeholder: agent.placeholder,
                };
                (key, entry)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    pub timestamp_ms: i64,
    pub duration_label: String,
}

/// Output of the normalizer: one service's answer in canonical form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResultSet {
    pub summary: String,
    pub agents: AgentMap,
    pub metadata: ResultMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn impact_label(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    pub fn timeline_label(&self) -> &'static str {
        match self {
            Priority::High => "Short-term",
            Priority::Medium => "Medium-term",
            Priority::Low => "Long-term",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationItem {
    /// 1-based position in the final list
    pub rank: usize,
    pub title: String,
    pub details: Vec<String>,
    pub priority: Priority,
    pub impact_label: String,
    pub timeline_label: String,
}

/// Which fallback tier produced the recommendation list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum RecommendationSource {
    Extracted { heading: String },
    ExecutiveSummary,
    SecondaryPass { heading: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalResult {
    pub success: bool,
    pub service_name: String,
    pub summary: String,
    pub agents: AgentMap,
    pub metadata: ResultMetadata,
    pub executive_summary: Vec<SummaryBullet>,
    pub recommendations: Option<Vec<RecommendationItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_source: Option<RecommendationSource>,
}

impl CanonicalResult {
    /// Look up an agent by the name the renderer displays
    pub fn agent(&self, display_name: &str) -> AgentLookup<'_> {
        reconciler::resolve(display_name, &self.agents)
    }
}

/// Downloadable snapshot of one result
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument<'a> {
    pub service: &'a str,
    pub service_name: &'a str,
    pub timestamp: String,
    pub summary: &'a str,
    pub executive_summary: &'a [SummaryBullet],
    pub recommendations: &'a [RecommendationItem],
    pub agents: &'a AgentMap,
    pub metadata: &'a ResultMetadata,
}

impl<'a> ExportDocument<'a> {
    pub fn from_result(service: &'a str, result: &'a CanonicalResult, exported_at_ms: i64) -> Self {
        let timestamp = chrono::DateTime::from_timestamp_millis(exported_at_ms)
            .map(|t| t.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
            .unwrap_or_default();
        Self {
            service,
            service_name: &result.service_name,
            timestamp,
            summary: &result.summary,
            executive_summary: &result.executive_summary,
            recommendations: result.recommendations.as_deref().unwrap_or(&[]),
            agents: &result.agents,
            metadata: &result.metadata,
        }
    }

    /// File name the export is saved under
    pub fn file_name(&self, exported_at_ms: i64) -> String {
        format!("{}_results_{}.json", self.service, exported_at_ms)
    }
}
