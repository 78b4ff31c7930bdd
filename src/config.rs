//! Aggregation cycle configuration (spec §4.9, §6).

use crate::error::MetricsError;

/// Configuration recognized by the collection manager and cycle driver.
#[derive(Debug, Clone, Copy)]
pub struct AggregationConfig {
    /// One of `{5, 10, 15, 20, 30}`, or any whole multiple of 60 up to
    /// 86400. Anything else fails [`AggregationConfig::validate`].
    pub aggregation_period_length_seconds: u32,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            aggregation_period_length_seconds: 10,
        }
    }
}

impl AggregationConfig {
    /// # Errors
    /// Returns [`MetricsError::Configuration`] if the period length is not
    /// one of the accepted values (spec §4.9, §6).
    pub fn validate(&self) -> Result<(), MetricsError> {
        let p = self.aggregation_period_length_seconds;
        let short_period_ok = matches!(p, 5 | 10 | 15 | 20 | 30);
        let long_period_ok = p >= 60 && p <= 86400 && p % 60 == 0;
        if short_period_ok || long_period_ok {
            Ok(())
        } else {
            Err(MetricsError::Configuration(format!(
                "aggregation_period_length_seconds {p} must be one of {{5,10,15,20,30}} or a whole multiple of 60 up to 86400"
            )))
        }
    }
}
