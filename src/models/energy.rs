use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ensure_non_negative, DashboardResult};

/// Three-hour slots of the daily generation curve, in chronological order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeSlot {
    #[serde(rename = "00:00")]
    Midnight,
    #[serde(rename = "03:00")]
    Three,
    #[serde(rename = "06:00")]
    Six,
    #[serde(rename = "09:00")]
    Nine,
    #[serde(rename = "12:00")]
    Noon,
    #[serde(rename = "15:00")]
    Fifteen,
    #[serde(rename = "18:00")]
    Eighteen,
    #[serde(rename = "21:00")]
    TwentyOne,
}

impl TimeSlot {
    pub const DAY: [TimeSlot; 8] = [
        TimeSlot::Midnight,
        TimeSlot::Three,
        TimeSlot::Six,
        TimeSlot::Nine,
        TimeSlot::Noon,
        TimeSlot::Fifteen,
        TimeSlot::Eighteen,
        TimeSlot::TwentyOne,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TimeSlot::Midnight => "00:00",
            TimeSlot::Three => "03:00",
            TimeSlot::Six => "06:00",
            TimeSlot::Nine => "09:00",
            TimeSlot::Noon => "12:00",
            TimeSlot::Fifteen => "15:00",
            TimeSlot::Eighteen => "18:00",
            TimeSlot::TwentyOne => "21:00",
        }
    }
}

/// Energy produced during one slot of the day.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSample {
    time_of_day: TimeSlot,
    kilowatt_hours: f64,
}

impl GenerationSample {
    pub fn new(time_of_day: TimeSlot, kilowatt_hours: f64) -> DashboardResult<Self> {
        let kilowatt_hours = ensure_non_negative("generation", time_of_day.label(), kilowatt_hours)?;
        Ok(Self {
            time_of_day,
            kilowatt_hours,
        })
    }

    pub fn time_of_day(&self) -> TimeSlot {
        self.time_of_day
    }

    pub fn kilowatt_hours(&self) -> f64 {
        self.kilowatt_hours
    }
}

impl<'de> Deserialize<'de> for GenerationSample {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Raw {
            time_of_day: TimeSlot,
            kilowatt_hours: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.time_of_day, raw.kilowatt_hours).map_err(serde::de::Error::custom)
    }
}

/// Carbon avoided in one month.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavingsSample {
    period: String,
    carbon_saved_kg: f64,
}

impl SavingsSample {
    pub fn new(period: impl Into<String>, carbon_saved_kg: f64) -> DashboardResult<Self> {
        let period = period.into();
        let carbon_saved_kg = ensure_non_negative("savings", &period, carbon_saved_kg)?;
        Ok(Self {
            period,
            carbon_saved_kg,
        })
    }

    pub fn period(&self) -> &str {
        &self.period
    }

    pub fn carbon_saved_kg(&self) -> f64 {
        self.carbon_saved_kg
    }
}

impl<'de> Deserialize<'de> for SavingsSample {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Raw {
            period: String,
            carbon_saved_kg: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.period, raw.carbon_saved_kg).map_err(serde::de::Error::custom)
    }
}

/// Total energy across the day.
pub fn total_kwh(samples: &[GenerationSample]) -> f64 {
    samples.iter().map(GenerationSample::kilowatt_hours).sum()
}

/// Earliest sample with the highest output.
pub fn peak(samples: &[GenerationSample]) -> Option<&GenerationSample> {
    samples.iter().fold(None, |best: Option<&GenerationSample>, sample| match best {
        Some(current) if current.kilowatt_hours >= sample.kilowatt_hours => Some(current),
        _ => Some(sample),
    })
}

pub fn latest(samples: &[SavingsSample]) -> Option<&SavingsSample> {
    samples.last()
}

/// Percentage growth between the last two periods. `None` with fewer than two
/// periods or a zero base.
pub fn month_over_month_growth(samples: &[SavingsSample]) -> Option<f64> {
    let [.., previous, current] = samples else {
        return None;
    };
    if previous.carbon_saved_kg == 0.0 {
        return None;
    }
    Some((current.carbon_saved_kg - previous.carbon_saved_kg) / previous.carbon_saved_kg * 100.0)
}
