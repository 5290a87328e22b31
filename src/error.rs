use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DashboardError {
    /// A telemetry sample violating the non-negativity invariant. Rejected at
    /// ingestion and never handed to the view layer.
    #[error("invalid {series} sample '{label}': {value} is not a non-negative quantity")]
    InvalidSample {
        series: &'static str,
        label: String,
        value: f64,
    },

    #[error("recommendation generation failed: {0}")]
    GenerationFailure(String),
}

pub type DashboardResult<T> = std::result::Result<T, DashboardError>;

pub(crate) fn ensure_non_negative(series: &'static str, label: &str, value: f64) -> DashboardResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(DashboardError::InvalidSample {
            series,
            label: label.to_string(),
            value,
        })
    }
}
