pub mod generator;

pub use generator::{candidate_pool, RecommendationSource, ScriptedGenerator};
