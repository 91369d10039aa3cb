//! Converts the three backend response envelopes into one [`AgentResultSet`].
//!
//! Agent payload shapes are classified once into [`AgentCollection`] /
//! [`AgentPayload`] and rendered to text from there. `serde_json` is built with
//! `preserve_order`, so "first entity" and agent order follow the document.

use serde_json::{Map, Value};

use crate::error::Result;
use crate::pipeline::InvocationContext;
use crate::schemas::{AgentMap, AgentOutput, AgentResultSet, ResultMetadata};
use crate::services::{Envelope, NO_RESULTS_SUMMARY, ServiceId, ServiceInfo};

/// Object fields consulted for agent text, highest priority first
const OUTPUT_FIELDS: [&str; 4] = ["output", "raw", "result", "text"];

const NO_DURATION: &str = "N/A";

/// One agent's payload, decided once
#[derive(Debug, Clone, PartialEq)]
pub enum AgentPayload<'a> {
    Text(&'a str),
    /// Object carrying one of the known output fields
    Fielded(&'a str),
    /// Anything else; rendered as pretty JSON
    Opaque(&'a Value),
}

impl<'a> AgentPayload<'a> {
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::String(s) => AgentPayload::Text(s),
            Value::Object(obj) => match fielded_text(obj) {
                Some(text) => AgentPayload::Fielded(text),
                None => AgentPayload::Opaque(value),
            },
            other => AgentPayload::Opaque(other),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            AgentPayload::Text(s) | AgentPayload::Fielded(s) => s.to_string(),
            AgentPayload::Opaque(Value::Null) => String::new(),
            AgentPayload::Opaque(v) => {
                serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
            }
        }
    }
}

fn fielded_text(obj: &Map<String, Value>) -> Option<&str> {
    OUTPUT_FIELDS
        .iter()
        .filter_map(|f| obj.get(*f).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
}

/// The agent container a response carries
#[derive(Debug, Clone, PartialEq)]
pub enum AgentCollection<'a> {
    Keyed(&'a Map<String, Value>),
    Indexed(&'a [Value]),
    Absent,
}

impl<'a> AgentCollection<'a> {
    pub fn classify(value: Option<&'a Value>) -> Self {
        match value {
            Some(Value::Object(map)) => AgentCollection::Keyed(map),
            Some(Value::Array(items)) => AgentCollection::Indexed(items),
            Some(Value::Null) | None => AgentCollection::Absent,
            Some(other) => {
                tracing::warn!("ignoring non-collection agent payload: {}", other);
                AgentCollection::Absent
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            AgentCollection::Keyed(map) => map.is_empty(),
            AgentCollection::Indexed(items) => items.is_empty(),
            AgentCollection::Absent => true,
        }
    }

    /// Absent data yields one placeholder per expected name. Indexed entries
    /// are named by position, falling back to "Agent N".
    pub fn into_agents(self, expected: &[impl AsRef<str>]) -> AgentMap {
        match self {
            AgentCollection::Keyed(map) => map
                .iter()
                .map(|(key, value)| AgentOutput::new(key, AgentPayload::classify(value).into_text()))
                .collect(),
            AgentCollection::Indexed(items) => items
                .iter()
                .enumerate()
                .map(|(idx, value)| {
                    let name = expected
                        .get(idx)
                        .map(|n| n.as_ref().to_string())
                        .unwrap_or_else(|| format!("Agent {}", idx + 1));
                    AgentOutput::new(name, AgentPayload::classify(value).into_text())
                })
                .collect(),
            AgentCollection::Absent => placeholders(expected),
        }
    }
}

fn placeholders(expected: &[impl AsRef<str>]) -> AgentMap {
    expected
        .iter()
        .map(|name| AgentOutput::placeholder(name.as_ref()))
        .collect()
}

/// First non-blank string among `fields`
fn text_field<'a>(raw: &'a Value, fields: &[&str]) -> Option<&'a str> {
    fields
        .iter()
        .filter_map(|f| raw.get(*f).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
}

fn duration_label(raw: &Value) -> String {
    match raw.get("execution_time") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => NO_DURATION.to_string(),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseNormalizer;

impl ResponseNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Pure transform of one service response
    pub fn normalize(
        &self,
        service: ServiceId,
        raw: &Value,
        expected: &[impl AsRef<str>],
        ctx: &InvocationContext,
    ) -> AgentResultSet {
        let info = service.info();
        let (summary, agents) = match info.envelope {
            Envelope::Direct => direct(info, raw, expected),
            Envelope::NestedByEntity => nested(info, raw, expected),
            Envelope::DirectWithPlaceholder => direct_with_placeholder(info, raw, expected),
        };
        tracing::debug!(
            service = %service,
            agents = agents.len(),
            "normalized backend response"
        );
        AgentResultSet {
            summary,
            agents,
            metadata: ResultMetadata {
                timestamp_ms: ctx.timestamp_ms,
                duration_label: duration_label(raw),
            },
        }
    }
}

fn direct(info: &ServiceInfo, raw: &Value, expected: &[impl AsRef<str>]) -> (String, AgentMap) {
    let summary = text_field(raw, &["final_output"]).unwrap_or(info.summary_fallback);
    let agents = AgentCollection::classify(raw.get("agent_outputs")).into_agents(expected);
    (summary.to_string(), agents)
}

fn direct_with_placeholder(
    info: &ServiceInfo,
    raw: &Value,
    expected: &[impl AsRef<str>],
) -> (String, AgentMap) {
    let summary = text_field(raw, &["final_output", "result"]).unwrap_or(info.summary_fallback);
    let collection = AgentCollection::classify(raw.get("agent_outputs"));
    let agents = if collection.is_empty() {
        placeholders(expected)
    } else {
        collection.into_agents(expected)
    };
    (summary.to_string(), agents)
}

fn nested(info: &ServiceInfo, raw: &Value, expected: &[impl AsRef<str>]) -> (String, AgentMap) {
    let Some(results) = raw.get("results").and_then(Value::as_object) else {
        return (NO_RESULTS_SUMMARY.to_string(), AgentMap::new());
    };
    let Some((entity, entry)) = results.iter().next() else {
        return (NO_RESULTS_SUMMARY.to_string(), AgentMap::new());
    };
    if results.len() > 1 {
        tracing::warn!(
            "{} entities returned; showing only \"{}\"",
            results.len(),
            entity
        );
    }
    let summary = text_field(entry, &["final_decision"]).unwrap_or(info.summary_fallback);
    let agents = AgentCollection::classify(entry.get("agents")).into_agents(expected);
    (summary.to_string(), agents)
}

/// Normalize by service id string; unknown ids are a configuration error
pub fn normalize(
    service_id: &str,
    raw: &Value,
    expected: &[impl AsRef<str>],
    ctx: &InvocationContext,
) -> Result<AgentResultSet> {
    let service: ServiceId = service_id.parse()?;
    Ok(ResponseNormalizer::new().normalize(service, raw, expected, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CrewDigestError;
    use crate::schemas::{EMPTY_OUTPUT, PLACEHOLDER_OUTPUT};
    use serde_json::json;

    fn ctx() -> InvocationContext {
        InvocationContext { timestamp_ms: 42 }
    }

    #[test]
    fn payload_field_priority() {
        let v = json!({"text": "t", "result": "r", "raw": "  ", "output": ""});
        assert_eq!(AgentPayload::classify(&v), AgentPayload::Fielded("r"));

        let v = json!({"score": 3});
        assert_eq!(
            AgentPayload::classify(&v).into_text(),
            "{\n  \"score\": 3\n}"
        );
        assert_eq!(AgentPayload::classify(&json!(7)).into_text(), "7");
    }

    #[test]
    fn direct_envelope_keeps_backend_keys_in_order() {
        let raw = json!({
            "final_output": "Report body",
            "agent_outputs": {
                "web_recon_agent": "site changes",
                "social_spy_agent": {"raw": "tweets"},
                "pricing_tracker_agent": null
            },
            "execution_time": 12.5
        });
        let set = ResponseNormalizer::new().normalize(
            ServiceId::CompAnalysis,
            &raw,
            &["Web Recon Agent"],
            &ctx(),
        );
        assert_eq!(set.summary, "Report body");
        assert_eq!(
            set.agents.keys().collect::<Vec<_>>(),
            vec!["web_recon_agent", "social_spy_agent", "pricing_tracker_agent"]
        );
        assert_eq!(set.agents.get("social_spy_agent").unwrap().output, "tweets");
        assert_eq!(
            set.agents.get("pricing_tracker_agent").unwrap().output,
            EMPTY_OUTPUT
        );
        assert_eq!(set.metadata.duration_label, "12.5");
        assert_eq!(set.metadata.timestamp_ms, 42);
    }

    #[test]
    fn direct_envelope_with_empty_map_has_no_agents() {
        let raw = json!({"final_output": "", "agent_outputs": {}});
        let set = ResponseNormalizer::new().normalize(
            ServiceId::CompAnalysis,
            &raw,
            ServiceId::CompAnalysis.info().agents,
            &ctx(),
        );
        assert_eq!(set.summary, "Analysis completed");
        assert!(set.agents.is_empty());
        assert_eq!(set.metadata.duration_label, "N/A");
    }

    #[test]
    fn indexed_agents_use_expected_names_then_ordinals() {
        let raw = json!({"agent_outputs": [{"output": "a"}, {"result": "b"}, "c"]});
        let set = ResponseNormalizer::new().normalize(
            ServiceId::CompAnalysis,
            &raw,
            &["First", "Second"],
            &ctx(),
        );
        assert_eq!(
            set.agents.keys().collect::<Vec<_>>(),
            vec!["First", "Second", "Agent 3"]
        );
        assert_eq!(set.agents.get("Agent 3").unwrap().output, "c");
    }

    #[test]
    fn nested_uses_first_entity() {
        let raw = json!({
            "results": {
                "Acme": {"final_decision": "Acme will launch", "agents": {"behavior_modeler": "x"}},
                "Globex": {"final_decision": "ignored"}
            },
            "execution_time": "3.2s"
        });
        let set = ResponseNormalizer::new().normalize(
            ServiceId::DigitalTwin,
            &raw,
            ServiceId::DigitalTwin.info().agents,
            &ctx(),
        );
        assert_eq!(set.summary, "Acme will launch");
        assert_eq!(set.agents.keys().collect::<Vec<_>>(), vec!["behavior_modeler"]);
        assert_eq!(set.metadata.duration_label, "3.2s");
    }

    #[test]
    fn nested_empty_results() {
        let set = ResponseNormalizer::new().normalize(
            ServiceId::DigitalTwin,
            &json!({"results": {}}),
            ServiceId::DigitalTwin.info().agents,
            &ctx(),
        );
        assert_eq!(set.summary, NO_RESULTS_SUMMARY);
        assert!(set.agents.is_empty());
    }

    #[test]
    fn placeholder_envelope_falls_back_to_result_field() {
        let raw = json!({"result": "War game outcome", "agent_outputs": {}});
        let expected = ServiceId::WarSimulation.info().agents;
        let set =
            ResponseNormalizer::new().normalize(ServiceId::WarSimulation, &raw, expected, &ctx());
        assert_eq!(set.summary, "War game outcome");
        assert_eq!(set.agents.len(), expected.len());
        assert!(set.agents.iter().all(|a| a.placeholder && a.output == PLACEHOLDER_OUTPUT));
    }

    #[test]
    fn unknown_service_id_is_config_error() {
        let err = normalize("feed_back_crew", &json!({}), &["x"], &ctx()).unwrap_err();
        assert!(matches!(err, CrewDigestError::Config { .. }));
    }
}
