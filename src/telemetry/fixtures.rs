use crate::error::DashboardResult;
use crate::models::{GenerationSample, SavingsSample, TimeSlot, UserStats};

use super::{TelemetrySnapshot, TelemetrySource};

const DAILY_KWH: [f64; 8] = [0.0, 0.0, 0.5, 2.8, 4.5, 3.9, 1.2, 0.0];

const MONTHLY_SAVINGS_KG: [(&str, f64); 6] = [
    ("Jan", 120.0),
    ("Feb", 145.0),
    ("Mar", 168.0),
    ("Apr", 192.0),
    ("May", 215.0),
    ("Jun", 234.0),
];

/// Fixed demo household used until a real telemetry feed is wired in.
#[derive(Debug, Clone)]
pub struct StaticTelemetry {
    snapshot: TelemetrySnapshot,
}

impl StaticTelemetry {
    pub fn demo() -> DashboardResult<Self> {
        let generation = TimeSlot::DAY
            .into_iter()
            .zip(DAILY_KWH)
            .map(|(slot, kwh)| GenerationSample::new(slot, kwh))
            .collect::<DashboardResult<Vec<_>>>()?;

        let savings = MONTHLY_SAVINGS_KG
            .into_iter()
            .map(|(month, kg)| SavingsSample::new(month, kg))
            .collect::<DashboardResult<Vec<_>>>()?;

        let stats = UserStats {
            today_generation_kwh: 18.5,
            month_generation_kwh: 487.0,
            carbon_saved_kg: 234.0,
            trees_equivalent: 11,
            rank_label: "Top 15%".into(),
            streak_days: 47,
            today_change_pct: Some(12.0),
            month_change_pct: Some(8.0),
        };

        Ok(Self {
            snapshot: TelemetrySnapshot::new(stats, generation, savings)?,
        })
    }
}

impl TelemetrySource for StaticTelemetry {
    fn snapshot(&self) -> TelemetrySnapshot {
        self.snapshot.clone()
    }
}
