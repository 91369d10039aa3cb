//! Caller-owned input state: which source feeds the competitor list, and the
//! request each crew expects. Threaded explicitly through every run.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::BackendConfig;
use crate::error::{CrewDigestError, Result};
use crate::services::ServiceId;

/// Manual competitor slots offered in structured entry
pub const MANUAL_SLOTS: usize = 3;

/// War simulation is tuned for this many competitors
const WAR_SIM_EXPECTED_COMPETITORS: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Competitors come from LLM discovery suggestions
    #[default]
    GuidedDiscovery,
    /// Competitors are typed into the manual slots
    StructuredEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: String,
    pub selected: bool,
}

/// What to POST to a crew and where
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendRequest {
    pub service: ServiceId,
    pub url: String,
    pub payload: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub mode: InputMode,
    pub focal_company: String,
    pub category: String,
    pub manual_competitors: [String; MANUAL_SLOTS],
    pub suggestions: Vec<Suggestion>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switching keeps both sources intact; only the active one is read
    pub fn set_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    /// Replace suggestions with a fresh discovery result, all selected
    pub fn apply_suggestions(&mut self, names: Vec<String>) {
        self.suggestions = names
            .into_iter()
            .map(|name| Suggestion {
                name,
                selected: true,
            })
            .collect();
    }

    pub fn set_selected(&mut self, index: usize, selected: bool) -> Result<()> {
        let count = self.suggestions.len();
        let suggestion = self
            .suggestions
            .get_mut(index)
            .ok_or_else(|| CrewDigestError::Validation {
                message: format!("Suggestion {} out of range ({} available)", index, count),
            })?;
        suggestion.selected = selected;
        Ok(())
    }

    pub fn set_manual_competitor(&mut self, slot: usize, name: impl Into<String>) -> Result<()> {
        let entry = self
            .manual_competitors
            .get_mut(slot)
            .ok_or_else(|| CrewDigestError::Validation {
                message: format!("Competitor slot {} out of range", slot + 1),
            })?;
        *entry = name.into();
        Ok(())
    }

    /// Competitors from the active source; never empty on success
    pub fn competitors(&self) -> Result<Vec<String>> {
        match self.mode {
            InputMode::GuidedDiscovery => {
                let selected: Vec<String> = self
                    .suggestions
                    .iter()
                    .filter(|s| s.selected)
                    .map(|s| s.name.clone())
                    .collect();
                if selected.is_empty() {
                    return Err(CrewDigestError::Validation {
                        message: "Please find and select competitors first, or switch to Manual Entry mode".to_string(),
                    });
                }
                Ok(selected)
            }
            InputMode::StructuredEntry => {
                let typed: Vec<String> = self
                    .manual_competitors
                    .iter()
                    .map(|c| c.trim())
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect();
                if typed.is_empty() {
                    return Err(CrewDigestError::Validation {
                        message: "Please enter at least one competitor company".to_string(),
                    });
                }
                Ok(typed)
            }
        }
    }

    /// Build the request body for `service`
    pub fn backend_request(
        &self,
        service: ServiceId,
        backend: &BackendConfig,
    ) -> Result<BackendRequest> {
        let info = service.info();
        let competitors = self.competitors()?;
        let focal = self.focal_company.trim();
        if info.needs_focal_company && focal.is_empty() {
            return Err(CrewDigestError::Validation {
                message: format!("Focal company is required for {}", info.name),
            });
        }

        let payload = match service {
            ServiceId::CompAnalysis => json!({
                "our_company": focal,
                "competitors": competitors,
            }),
            ServiceId::DigitalTwin => json!({ "companies": competitors }),
            ServiceId::WarSimulation => {
                if competitors.len() < WAR_SIM_EXPECTED_COMPETITORS {
                    tracing::warn!(
                        "War Simulation usually expects {} competitors; proceeding with {}",
                        WAR_SIM_EXPECTED_COMPETITORS,
                        competitors.len()
                    );
                }
                json!({
                    "our_company": focal,
                    "competitors": competitors,
                    "market_segment": backend.market_segment,
                })
            }
        };

        Ok(BackendRequest {
            service,
            url: info.url(&backend.host),
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guided(names: &[&str]) -> Session {
        let mut session = Session::new();
        session.focal_company = "Zomato".into();
        session.apply_suggestions(names.iter().map(|n| n.to_string()).collect());
        session
    }

    #[test]
    fn guided_mode_reads_selected_suggestions() {
        let mut session = guided(&["Swiggy", "Zepto", "Blinkit"]);
        session.set_selected(1, false).unwrap();
        assert_eq!(session.competitors().unwrap(), vec!["Swiggy", "Blinkit"]);
        assert!(session.set_selected(7, true).is_err());
    }

    #[test]
    fn structured_mode_skips_blank_slots() {
        let mut session = guided(&["Swiggy"]);
        session.set_mode(InputMode::StructuredEntry);
        session.set_manual_competitor(0, "  ").unwrap();
        session.set_manual_competitor(2, " Dunzo ").unwrap();
        assert_eq!(session.competitors().unwrap(), vec!["Dunzo"]);

        session.set_manual_competitor(2, "").unwrap();
        let err = session.competitors().unwrap_err();
        assert!(err.to_string().contains("at least one competitor"));

        // Suggestions survive the toggle
        session.set_mode(InputMode::GuidedDiscovery);
        assert_eq!(session.competitors().unwrap(), vec!["Swiggy"]);
    }

    #[test]
    fn payloads_per_service() {
        let session = guided(&["Swiggy", "Zepto"]);
        let backend = BackendConfig::default();

        let comp = session
            .backend_request(ServiceId::CompAnalysis, &backend)
            .unwrap();
        assert_eq!(comp.url, "http://localhost:8000/analyze");
        assert_eq!(
            comp.payload,
            json!({"our_company": "Zomato", "competitors": ["Swiggy", "Zepto"]})
        );

        let twin = session
            .backend_request(ServiceId::DigitalTwin, &backend)
            .unwrap();
        assert_eq!(twin.payload, json!({"companies": ["Swiggy", "Zepto"]}));

        let war = session
            .backend_request(ServiceId::WarSimulation, &backend)
            .unwrap();
        assert_eq!(war.payload["market_segment"], json!("India"));
        assert_eq!(war.url, "http://localhost:8003/simulate");
    }

    #[test]
    fn focal_company_required_where_catalog_says_so() {
        let mut session = guided(&["Swiggy"]);
        session.focal_company = "   ".into();
        let backend = BackendConfig::default();
        assert!(matches!(
            session.backend_request(ServiceId::CompAnalysis, &backend),
            Err(CrewDigestError::Validation { .. })
        ));
        assert!(
            session
                .backend_request(ServiceId::DigitalTwin, &backend)
                .is_ok()
        );
    }

    #[test]
    fn session_round_trips_through_json() {
        let session = guided(&["Swiggy"]);
        let text = serde_json::to_string(&session).unwrap();
        assert!(text.contains("\"mode\":\"guided_discovery\""));
        let back: Session = serde_json::from_str(&text).unwrap();
        assert_eq!(back, session);
    }
}
