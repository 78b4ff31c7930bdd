use thiserror::Error;

/// Errors raised at API boundaries: bad configuration or caller misuse.
///
/// Sample-level rejection (e.g. a non-integral value offered to a `Count`
/// metric) is never represented here — `Metric::collect` signals that with
/// a `bool` return, per the propagation policy in the aggregation design.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// An aggregation period length, buffer capacity, or pool capacity was
    /// out of the accepted range.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A `Metric` was attached to a manager it does not belong to, or a
    /// kind factory otherwise violated an API contract.
    #[error("Misuse error: {0}")]
    Misuse(String),
}

impl From<String> for MetricsError {
    fn from(value: String) -> Self {
        Self::Misuse(value)
    }
}

impl From<&str> for MetricsError {
    fn from(value: &str) -> Self {
        Self::Misuse(value.to_string())
    }
}
