use std::collections::BTreeSet;

use crew_digest::normalizer::normalize;
use crew_digest::reconciler::{AgentLookup, resolve};
use crew_digest::schemas::AgentOutput;
use crew_digest::{InvocationContext, ServiceId};
use serde_json::json;

const CTX: InvocationContext = InvocationContext { timestamp_ms: 1_700_000_000_000 };

fn expected(service: ServiceId) -> Vec<String> {
    service.info().agent_names()
}

#[test]
fn absent_agent_data_is_fully_covered_for_every_service() {
    let fixtures = [
        (ServiceId::CompAnalysis, json!({"final_output": "report"})),
        (
            ServiceId::DigitalTwin,
            json!({"results": {"Acme": {"final_decision": "launch"}}}),
        ),
        (ServiceId::WarSimulation, json!({"final_output": "sim"})),
    ];

    for (service, raw) in fixtures {
        let names = expected(service);
        let set = normalize(service.as_str(), &raw, &names, &CTX).unwrap();
        let keys: BTreeSet<&str> = set.agents.keys().collect();
        let wanted: BTreeSet<&str> = names.iter().map(String::as_str).collect();
        assert_eq!(keys, wanted, "coverage gap for {}", service);
        assert!(
            set.agents.iter().all(|a| a.placeholder && !a.output.is_empty()),
            "{} should use placeholders",
            service
        );
    }
}

#[test]
fn display_names_resolve_against_snake_case_keys() {
    let raw = json!({
        "final_output": "done",
        "agent_outputs": {
            "web_recon_agent": "Site redesign spotted",
            "hiring_talent_agent": {"output": "12 ML roles open"},
            "patent_rd_agent": {"text": "3 filings"}
        }
    });
    let names = expected(ServiceId::CompAnalysis);
    let set = normalize("comp_analysis", &raw, &names, &CTX).unwrap();

    let hiring = resolve("Hiring & Talent Agent", &set.agents);
    assert_eq!(hiring.output().map(|o| o.output.as_str()), Some("12 ML roles open"));

    let patents = resolve("Patent & R&D Agent", &set.agents);
    assert_eq!(patents.output().map(|o| o.output.as_str()), Some("3 filings"));

    match resolve("Pricing Tracker Agent", &set.agents) {
        AgentLookup::NotFound { requested, .. } => assert_eq!(requested, "Pricing Tracker Agent"),
        other => panic!("expected a miss, got {:?}", other),
    }
}

#[test]
fn placeholder_and_missing_are_distinct() {
    let agents = vec![AgentOutput::placeholder("Risk Analyzer")]
        .into_iter()
        .collect();
    let found = resolve("Risk Analyzer", &agents);
    assert!(found.is_found());
    assert!(found.output().unwrap().placeholder);
    assert!(!resolve("Ad Spy", &agents).is_found());
}
