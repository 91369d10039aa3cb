//! Agent-name reconciliation between the names a caller displays and the keys
//! a backend happened to use ("Hiring & Talent Agent" vs "hiring_talent_agent").

use strsim::jaro_winkler;

use crate::schemas::{AgentMap, AgentOutput};

/// Score above which a key is offered as a suggestion on a miss
const SUGGESTION_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub enum AgentLookup<'a> {
    Found {
        key: &'a str,
        output: &'a AgentOutput,
        exact: bool,
    },
    NotFound {
        requested: String,
        suggestions: Vec<String>,
    },
}

impl<'a> AgentLookup<'a> {
    pub fn output(&self) -> Option<&'a AgentOutput> {
        match self {
            AgentLookup::Found { output, .. } => Some(output),
            AgentLookup::NotFound { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, AgentLookup::Found { .. })
    }
}

/// Lowercase and drop everything that is not an ASCII letter or digit
pub fn normalize_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Resolve `requested` against the agent map.
///
/// Exact key first; otherwise the first key (in map order) whose normalized
/// form equals the normalized request or contains / is contained by it.
pub fn resolve<'a>(requested: &str, agents: &'a AgentMap) -> AgentLookup<'a> {
    if let Some(output) = agents.get(requested) {
        return AgentLookup::Found {
            key: &output.key,
            output,
            exact: true,
        };
    }

    let wanted = normalize_key(requested);
    if !wanted.is_empty() {
        for agent in agents.iter() {
            let candidate = normalize_key(&agent.key);
            if candidate.is_empty() {
                continue;
            }
            if candidate == wanted || candidate.contains(&wanted) || wanted.contains(&candidate) {
                tracing::warn!(
                    "Agent name mismatch: requested \"{}\", using \"{}\" instead",
                    requested,
                    agent.key
                );
                return AgentLookup::Found {
                    key: &agent.key,
                    output: agent,
                    exact: false,
                };
            }
        }
    }

    AgentLookup::NotFound {
        requested: requested.to_string(),
        suggestions: suggestions(&wanted, agents),
    }
}

fn suggestions(wanted: &str, agents: &AgentMap) -> Vec<String> {
    let mut scored: Vec<(f64, &str)> = agents
        .keys()
        .map(|k| (jaro_winkler(&normalize_key(k), wanted), k))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_, k)| k.to_string()).collect()
}
