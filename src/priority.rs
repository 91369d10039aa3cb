//! Positional priority tiers: ranks 1-2 high, 3-4 medium, 5-6 low.

use crate::parser::ParsedRecommendation;
use crate::schemas::{Priority, RecommendationItem};

/// Longest list the tier table covers
pub const MAX_RECOMMENDATIONS: usize = 6;

pub fn tier_for(rank: usize) -> Priority {
    match rank {
        0..=2 => Priority::High,
        3 | 4 => Priority::Medium,
        _ => Priority::Low,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PriorityAssigner {
    max_items: usize,
}

impl Default for PriorityAssigner {
    fn default() -> Self {
        Self::new(MAX_RECOMMENDATIONS)
    }
}

impl PriorityAssigner {
    /// `max_items` is clamped to the tier table
    pub fn new(max_items: usize) -> Self {
        Self {
            max_items: max_items.clamp(1, MAX_RECOMMENDATIONS),
        }
    }

    /// Rank by position, attach tier labels, drop everything past the cap
    pub fn assign(&self, items: Vec<ParsedRecommendation>) -> Vec<RecommendationItem> {
        if items.len() > self.max_items {
            tracing::debug!(
                dropped = items.len() - self.max_items,
                "truncating recommendations"
            );
        }
        items
            .into_iter()
            .take(self.max_items)
            .enumerate()
            .map(|(idx, item)| {
                let rank = idx + 1;
                let priority = tier_for(rank);
                RecommendationItem {
                    rank,
                    title: item.title,
                    details: item.details,
                    priority,
                    impact_label: priority.impact_label().to_string(),
                    timeline_label: priority.timeline_label().to_string(),
                }
            })
            .collect()
    }
}
