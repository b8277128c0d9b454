//! Regressor configuration

use crate::error::{DatatypesError, Result};
use serde::{Deserialize, Serialize};

/// Configuration shared by every panel regressor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressorConfig {
    /// Minimum number of instances X must have at fit time
    pub enforce_min_instances: usize,

    /// Number of jobs for multithreading-capable estimators.
    /// Negative values count back from the number of CPUs (-1 = all).
    pub n_jobs: Option<i32>,

    /// Reject predict calls whose X has a different feature count than fit
    pub check_feature_consistency: bool,
}

impl Default for RegressorConfig {
    fn default() -> Self {
        Self {
            enforce_min_instances: 1,
            n_jobs: None,
            check_feature_consistency: true,
        }
    }
}

impl RegressorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the minimum instance count
    pub fn with_min_instances(mut self, min_instances: usize) -> Self {
        self.enforce_min_instances = min_instances;
        self
    }

    /// Builder method to set number of jobs
    pub fn with_n_jobs(mut self, n_jobs: i32) -> Self {
        self.n_jobs = Some(n_jobs);
        self
    }

    pub fn with_feature_consistency(mut self, check: bool) -> Self {
        self.check_feature_consistency = check;
        self
    }
}

/// Resolve `n_jobs` into a thread count
pub fn check_n_jobs(n_jobs: Option<i32>) -> Result<usize> {
    let available = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    match n_jobs {
        None => Ok(1),
        Some(0) => Err(DatatypesError::Config("n_jobs must not be 0".to_string())),
        Some(n) if n < 0 => {
            let threads = available as i64 + 1 + n as i64;
            Ok(threads.max(1) as usize)
        }
        Some(n) => Ok(n as usize),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegressorConfig::default();
        assert_eq!(config.enforce_min_instances, 1);
        assert!(config.n_jobs.is_none());
        assert!(config.check_feature_consistency);
    }

    #[test]
    fn test_builder_pattern() {
        let config = RegressorConfig::new().with_min_instances(6).with_n_jobs(-1);
        assert_eq!(config.enforce_min_instances, 6);
        assert_eq!(config.n_jobs, Some(-1));
    }

    #[test]
    fn test_check_n_jobs() {
        assert_eq!(check_n_jobs(None).unwrap(), 1);
        assert_eq!(check_n_jobs(Some(3)).unwrap(), 3);
        assert!(check_n_jobs(Some(-1)).unwrap() >= 1);
        assert_eq!(check_n_jobs(Some(-10_000)).unwrap(), 1);
        assert!(check_n_jobs(Some(0)).is_err());
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = RegressorConfig::new().with_n_jobs(2);
        let json = serde_json::to_string(&config).unwrap();
        let back: RegressorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
