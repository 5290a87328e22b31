use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, DashboardResult};

/// Aggregate snapshot computed by the telemetry source. The dashboard only
/// displays it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub today_generation_kwh: f64,
    pub month_generation_kwh: f64,
    pub carbon_saved_kg: f64,
    pub trees_equivalent: u32,
    /// Free-form percentile band, e.g. "Top 15%".
    pub rank_label: String,
    pub streak_days: u32,
    /// Change against yesterday, in percent.
    #[serde(default)]
    pub today_change_pct: Option<f64>,
    /// Change against last month, in percent.
    #[serde(default)]
    pub month_change_pct: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatCard {
    pub label: String,
    pub value: String,
    pub change: String,
}

impl UserStats {
    pub fn validate(&self) -> DashboardResult<()> {
        ensure_non_negative("stats", "todayGenerationKwh", self.today_generation_kwh)?;
        ensure_non_negative("stats", "monthGenerationKwh", self.month_generation_kwh)?;
        ensure_non_negative("stats", "carbonSavedKg", self.carbon_saved_kg)?;
        Ok(())
    }

    /// The four headline cards of the overview tab.
    pub fn headline_cards(&self) -> Vec<StatCard> {
        vec![
            StatCard {
                label: "Today's Generation".into(),
                value: format!("{} kWh", self.today_generation_kwh),
                change: format_change(self.today_change_pct),
            },
            StatCard {
                label: "This Month".into(),
                value: format!("{} kWh", self.month_generation_kwh),
                change: format_change(self.month_change_pct),
            },
            StatCard {
                label: "Carbon Saved".into(),
                value: format!("{} kg CO₂", self.carbon_saved_kg),
                change: "MTD".into(),
            },
            StatCard {
                label: "Trees Equivalent".into(),
                value: self.trees_equivalent.to_string(),
                change: format!("{} day streak", self.streak_days),
            },
        ]
    }
}

fn format_change(pct: Option<f64>) -> String {
    match pct {
        Some(pct) if pct >= 0.0 => format!("+{}%", pct),
        Some(pct) => format!("{}%", pct),
        None => String::new(),
    }
}
