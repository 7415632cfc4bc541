use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AssertionError;
use crate::transport::ApiResponse;

/// Coarse speed bucket for a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResponseTimeCategory {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ResponseTimeCategory {
    pub fn from_millis(millis: u64) -> Self {
        match millis {
            0..=100 => ResponseTimeCategory::Excellent,
            101..=500 => ResponseTimeCategory::Good,
            501..=1000 => ResponseTimeCategory::Fair,
            _ => ResponseTimeCategory::Poor,
        }
    }
}

impl fmt::Display for ResponseTimeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseTimeCategory::Excellent => write!(f, "Excellent"),
            ResponseTimeCategory::Good => write!(f, "Good"),
            ResponseTimeCategory::Fair => write!(f, "Fair"),
            ResponseTimeCategory::Poor => write!(f, "Poor"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseTimeValidator;

impl ResponseTimeValidator {
    pub fn validate(response: &ApiResponse, threshold_ms: u64) -> bool {
        let elapsed = response.duration_ms();
        let valid = elapsed <= threshold_ms;

        if valid {
            log::info!("Response time validation passed: {} ms (threshold: {} ms)", elapsed, threshold_ms);
        } else {
            log::warn!("Response time validation failed: {} ms exceeds threshold of {} ms", elapsed, threshold_ms);
        }
        valid
    }

    pub fn assert_within(response: &ApiResponse, threshold_ms: u64) -> Result<(), AssertionError> {
        let elapsed = response.duration_ms();
        if elapsed > threshold_ms {
            let message = format!("Response time ({} ms) exceeds the threshold of {} ms", elapsed, threshold_ms);
            log::error!("{}", message);
            return Err(AssertionError::Failed { message });
        }
        Ok(())
    }

    pub fn categorize(response: &ApiResponse) -> ResponseTimeCategory {
        let category = ResponseTimeCategory::from_millis(response.duration_ms());
        log::info!("Response time category: {} ({} ms)", category, response.duration_ms());
        category
    }

    /// Milliseconds over (positive) or under (negative) the threshold
    pub fn difference(response: &ApiResponse, threshold_ms: u64) -> i64 {
        let elapsed = i64::try_from(response.duration_ms()).unwrap_or(i64::MAX);
        let threshold = i64::try_from(threshold_ms).unwrap_or(i64::MAX);
        elapsed.saturating_sub(threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn response_taking(ms: u64) -> ApiResponse {
        ApiResponse::new(200, "").with_duration(Duration::from_millis(ms))
    }

    #[test]
    fn test_category_boundaries() {
        assert_eq!(ResponseTimeCategory::from_millis(100), ResponseTimeCategory::Excellent);
        assert_eq!(ResponseTimeCategory::from_millis(101), ResponseTimeCategory::Good);
        assert_eq!(ResponseTimeCategory::from_millis(500), ResponseTimeCategory::Good);
        assert_eq!(ResponseTimeCategory::from_millis(1000), ResponseTimeCategory::Fair);
        assert_eq!(ResponseTimeCategory::from_millis(1001), ResponseTimeCategory::Poor);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let response = response_taking(250);

        assert!(ResponseTimeValidator::validate(&response, 250));
        assert!(!ResponseTimeValidator::validate(&response, 249));
        assert!(ResponseTimeValidator::assert_within(&response, 300).is_ok());
        assert!(ResponseTimeValidator::assert_within(&response, 200).is_err());
    }

    #[test]
    fn test_difference_sign() {
        let response = response_taking(750);
        assert_eq!(ResponseTimeValidator::difference(&response, 500), 250);
        assert_eq!(ResponseTimeValidator::difference(&response, 1000), -250);
        assert_eq!(ResponseTimeValidator::categorize(&response), ResponseTimeCategory::Fair);
    }
}
