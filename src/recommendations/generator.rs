use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::error::DashboardResult;
use crate::models::{CategoryIcon, Priority, Recommendation, RecommendationBatch};

/// Anything able to produce a fresh batch of recommendations.
///
/// Implementations hold no mutable shared state, and callers may drop the
/// future at any point.
#[async_trait]
pub trait RecommendationSource: Send + Sync {
    async fn generate(&self) -> DashboardResult<RecommendationBatch>;
}

/// The fixed candidate pool, in display order.
pub fn candidate_pool() -> Vec<Recommendation> {
    vec![
        Recommendation {
            id: 1,
            title: "Peak Generation Window Optimization".into(),
            description: "Your solar panels generate maximum power between 11 AM - 2 PM. Schedule \
                          high-energy tasks like washing machines, dishwashers, and EV charging \
                          during this window to maximize self-consumption."
                .into(),
            impact_label: "Save ₹450/month".into(),
            priority: Priority::High,
            category_icon: CategoryIcon::Sun,
        },
        Recommendation {
            id: 2,
            title: "Battery Storage Opportunity".into(),
            description: "You're currently exporting 35% of generated power to the grid. \
                          Installing a 5kWh battery system could increase your self-consumption \
                          from 65% to 92%, improving ROI by 23%."
                .into(),
            impact_label: "₹850/month additional savings".into(),
            priority: Priority::Medium,
            category_icon: CategoryIcon::Battery,
        },
        Recommendation {
            id: 3,
            title: "Weather-Adaptive Energy Planning".into(),
            description: "Forecast shows cloudy conditions next Tuesday-Thursday. Pre-charge \
                          devices and complete energy-intensive tasks on Monday to maintain \
                          efficiency during low-generation days."
                .into(),
            impact_label: "Maintain 90%+ efficiency".into(),
            priority: Priority::Medium,
            category_icon: CategoryIcon::CloudRain,
        },
        Recommendation {
            id: 4,
            title: "Grid-Export Timing Strategy".into(),
            description: "Your area has peak grid demand from 6-9 PM. If you add battery storage, \
                          exporting during these hours could earn 40% higher feed-in tariffs \
                          compared to midday export."
                .into(),
            impact_label: "Potential ₹320/month extra revenue".into(),
            priority: Priority::Low,
            category_icon: CategoryIcon::Zap,
        },
        Recommendation {
            id: 5,
            title: "Panel Cleaning Recommendation".into(),
            description: "Generation efficiency has dropped 8% over the last 3 weeks, likely due \
                          to dust accumulation. A panel cleaning could restore full capacity, \
                          typically showing improvement within 24 hours."
                .into(),
            impact_label: "Restore 8% generation capacity".into(),
            priority: Priority::High,
            category_icon: CategoryIcon::Target,
        },
    ]
}

/// Serves the candidate pool after a simulated analysis delay.
#[derive(Debug, Clone)]
pub struct ScriptedGenerator {
    latency: Duration,
    jitter: Duration,
}

impl ScriptedGenerator {
    pub fn new(latency: Duration, jitter: Duration) -> Self {
        Self { latency, jitter }
    }

    fn delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.latency;
        }
        self.latency + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500), Duration::ZERO)
    }
}

#[async_trait]
impl RecommendationSource for ScriptedGenerator {
    async fn generate(&self) -> DashboardResult<RecommendationBatch> {
        let delay = self.delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(RecommendationBatch::new(candidate_pool()))
    }
}
