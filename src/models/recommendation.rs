use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// Symbolic icon tag; the front end maps it to an actual glyph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum CategoryIcon {
    Sun,
    Battery,
    CloudRain,
    Zap,
    Target,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Unique within its batch.
    pub id: u32,
    pub title: String,
    pub description: String,
    pub impact_label: String,
    pub priority: Priority,
    pub category_icon: CategoryIcon,
}

impl Recommendation {
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty()
            && !self.description.trim().is_empty()
            && !self.impact_label.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PriorityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// One atomically delivered set of recommendations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationBatch {
    pub batch_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub items: Vec<Recommendation>,
}

impl RecommendationBatch {
    pub fn new(items: Vec<Recommendation>) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count_by_priority(&self) -> PriorityCounts {
        self.items
            .iter()
            .fold(PriorityCounts::default(), |mut counts, item| {
                match item.priority {
                    Priority::High => counts.high += 1,
                    Priority::Medium => counts.medium += 1,
                    Priority::Low => counts.low += 1,
                }
                counts
            })
    }
}
