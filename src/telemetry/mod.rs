//! Ingestion boundary for source data: generation curve, carbon savings and
//! the aggregate stats snapshot. Everything handed out from here has already
//! passed the non-negativity check.

mod fixtures;

pub use fixtures::StaticTelemetry;

use serde::{Deserialize, Serialize};

use crate::error::DashboardResult;
use crate::models::{energy, GenerationSample, SavingsSample, StatCard, UserStats};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    pub stats: UserStats,
    pub generation: Vec<GenerationSample>,
    pub savings: Vec<SavingsSample>,
}

impl TelemetrySnapshot {
    /// Samples are already checked by their own constructors; the stats
    /// snapshot is checked here.
    pub fn new(
        stats: UserStats,
        generation: Vec<GenerationSample>,
        savings: Vec<SavingsSample>,
    ) -> DashboardResult<Self> {
        stats.validate()?;
        Ok(Self {
            stats,
            generation,
            savings,
        })
    }

    pub fn headline_cards(&self) -> Vec<StatCard> {
        self.stats.headline_cards()
    }

    pub fn summary(&self) -> TelemetrySummary {
        TelemetrySummary {
            total_generation_kwh: energy::total_kwh(&self.generation),
            peak_generation: energy::peak(&self.generation).copied(),
            latest_savings: energy::latest(&self.savings).cloned(),
            savings_growth_pct: energy::month_over_month_growth(&self.savings),
        }
    }
}

/// Figures derived from the series, ready for chart captions.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySummary {
    pub total_generation_kwh: f64,
    pub peak_generation: Option<GenerationSample>,
    pub latest_savings: Option<SavingsSample>,
    /// Growth of the latest month over the one before, in percent.
    pub savings_growth_pct: Option<f64>,
}

/// External collaborator that owns the raw measurements.
pub trait TelemetrySource: Send + Sync {
    fn snapshot(&self) -> TelemetrySnapshot;
}
