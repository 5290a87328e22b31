use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

const LATENCY_ENV: &str = "ENERX_AI_LATENCY_MS";
const TIMEOUT_ENV: &str = "ENERX_AI_TIMEOUT_MS";
const DEBUG_ENV: &str = "ENERX_DEBUG";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardSettings {
    /// Simulated analysis time before recommendations appear.
    pub recommendation_latency_ms: u64,
    /// Upper bound of the random delay added on top of the latency.
    pub latency_jitter_ms: u64,
    /// Generations running longer than this are reported as failed.
    pub generation_timeout_ms: u64,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            recommendation_latency_ms: 1500,
            latency_jitter_ms: 0,
            generation_timeout_ms: 10_000,
        }
    }
}

impl DashboardSettings {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.recommendation_latency_ms)
    }

    pub fn jitter(&self) -> Duration {
        Duration::from_millis(self.latency_jitter_ms)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_millis(self.generation_timeout_ms)
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(ms) = lookup(LATENCY_ENV).and_then(|v| v.trim().parse().ok()) {
            self.recommendation_latency_ms = ms;
        }
        if let Some(ms) = lookup(TIMEOUT_ENV).and_then(|v| v.trim().parse().ok()) {
            self.generation_timeout_ms = ms;
        }
        let debug_mode = lookup(DEBUG_ENV)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if debug_mode {
            self.recommendation_latency_ms = 0;
            self.latency_jitter_ms = 0;
        }
        self
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<DashboardSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("Ignoring malformed settings at {}: {err}", path.display());
                DashboardSettings::default()
            })
        } else {
            DashboardSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    /// Stored settings with environment overrides applied.
    pub fn dashboard(&self) -> DashboardSettings {
        self.read().with_env_overrides()
    }

    pub fn stored(&self) -> DashboardSettings {
        *self.read()
    }

    pub fn update_dashboard(&self, settings: DashboardSettings) -> Result<()> {
        let mut guard = self.write();
        *guard = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &DashboardSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, DashboardSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, DashboardSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
