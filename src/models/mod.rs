pub mod energy;
pub mod recommendation;
pub mod stats;

pub use energy::{GenerationSample, SavingsSample, TimeSlot};
pub use recommendation::{
    CategoryIcon, Priority, PriorityCounts, Recommendation, RecommendationBatch,
};
pub use stats::{StatCard, UserStats};
