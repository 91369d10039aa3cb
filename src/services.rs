//! Static catalog of the backend analysis services ("crews").
//!
//! Each service answers with its own JSON envelope; the catalog records which
//! envelope to expect, the literals used when a summary is missing, and the
//! agent names the rendering surface asks for.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CrewDigestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceId {
    #[serde(rename = "comp_analysis")]
    CompAnalysis,
    #[serde(rename = "digital_twin")]
    DigitalTwin,
    #[serde(rename = "one_last_time")]
    WarSimulation,
}

impl ServiceId {
    pub const ALL: [ServiceId; 3] = [
        ServiceId::CompAnalysis,
        ServiceId::DigitalTwin,
        ServiceId::WarSimulation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceId::CompAnalysis => "comp_analysis",
            ServiceId::DigitalTwin => "digital_twin",
            ServiceId::WarSimulation => "one_last_time",
        }
    }

    pub fn info(&self) -> &'static ServiceInfo {
        match self {
            ServiceId::CompAnalysis => &COMP_ANALYSIS,
            ServiceId::DigitalTwin => &DIGITAL_TWIN,
            ServiceId::WarSimulation => &WAR_SIMULATION,
        }
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceId {
    type Err = CrewDigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| CrewDigestError::Config {
                message: format!(
                    "Unknown service '{}'. Known services: comp_analysis, digital_twin, one_last_time",
                    s
                ),
            })
    }
}

/// Response envelope a service answers with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// `{final_output, agent_outputs}`
    Direct,
    /// `{results: {entity: {final_decision, agents}}}`
    NestedByEntity,
    /// Direct, but missing agent data is filled with placeholders
    DirectWithPlaceholder,
}

#[derive(Debug)]
pub struct ServiceInfo {
    pub id: ServiceId,
    pub name: &'static str,
    pub port: u16,
    pub endpoint: &'static str,
    pub envelope: Envelope,
    pub needs_focal_company: bool,
    pub has_recommendations: bool,
    /// Used when the envelope carries no summary text
    pub summary_fallback: &'static str,
    pub agents: &'static [&'static str],
}

impl ServiceInfo {
    pub fn url(&self, host: &str) -> String {
        format!("{}:{}{}", host.trim_end_matches('/'), self.port, self.endpoint)
    }

    pub fn agent_names(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.to_string()).collect()
    }
}

/// Summary literal for a nested envelope whose entity map is empty
pub const NO_RESULTS_SUMMARY: &str = "No results returned";

static COMP_ANALYSIS: ServiceInfo = ServiceInfo {
    id: ServiceId::CompAnalysis,
    name: "Competitor Intelligence Crew",
    port: 8000,
    endpoint: "/analyze",
    envelope: Envelope::Direct,
    needs_focal_company: true,
    has_recommendations: true,
    summary_fallback: "Analysis completed",
    agents: &[
        "Web Recon Agent",
        "Social Spy Agent",
        "Hiring & Talent Agent",
        "Patent & R&D Agent",
        "Pricing Tracker Agent",
    ],
};

static DIGITAL_TWIN: ServiceInfo = ServiceInfo {
    id: ServiceId::DigitalTwin,
    name: "Digital Twin Crew",
    port: 8001,
    endpoint: "/run",
    envelope: Envelope::NestedByEntity,
    needs_focal_company: false,
    has_recommendations: false,
    summary_fallback: "Twin analysis completed",
    agents: &[
        "Behavior Modeler",
        "Roadmap Predictor",
        "Pricing Predictor",
        "Launch Probability Engine",
    ],
};

static WAR_SIMULATION: ServiceInfo = ServiceInfo {
    id: ServiceId::WarSimulation,
    name: "War Simulation Crew",
    port: 8003,
    endpoint: "/simulate",
    envelope: Envelope::DirectWithPlaceholder,
    needs_focal_company: true,
    has_recommendations: true,
    summary_fallback: "Simulation completed",
    agents: &[
        "Game Theory Agent",
        "Market Impact Agent",
        "Risk Analyzer",
        "Ad Spy",
        "Landing Page Scanner",
        "Funnel Optimizer",
    ],
};
