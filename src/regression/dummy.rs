//! Baseline regressor that ignores X

use super::base::PanelRegressor;
use super::tags::EstimatorTags;
use crate::datatypes::{Container, Representation};
use crate::error::{DatatypesError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Prediction rule of the dummy regressor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DummyStrategy {
    /// Mean of the training targets
    Mean,
    /// Median of the training targets
    Median,
    /// Always the given value
    Constant(f64),
}

impl Default for DummyStrategy {
    fn default() -> Self {
        Self::Mean
    }
}

/// Predicts one constant per instance; handles any panel input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DummyRegressor {
    strategy: DummyStrategy,
    constant: Option<f64>,
}

impl DummyRegressor {
    pub fn new(strategy: DummyStrategy) -> Self {
        Self {
            strategy,
            constant: None,
        }
    }

    pub fn strategy(&self) -> DummyStrategy {
        self.strategy
    }

    /// The value predicted for every instance, once fitted
    pub fn constant(&self) -> Option<f64> {
        self.constant
    }
}

impl Default for DummyRegressor {
    fn default() -> Self {
        Self::new(DummyStrategy::default())
    }
}

fn median(values: &Array1<f64>) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

impl PanelRegressor for DummyRegressor {
    fn name(&self) -> &str {
        "DummyRegressor"
    }

    fn tags(&self) -> EstimatorTags {
        EstimatorTags::all_capabilities().with_inner_mtype(Representation::DfList)
    }

    fn fit_inner(&mut self, _x: &Container, y: &Array1<f64>) -> Result<()> {
        if y.is_empty() {
            return Err(DatatypesError::InvalidLabels(
                "cannot fit on empty targets".to_string(),
            ));
        }
        let value = match self.strategy {
            DummyStrategy::Mean => y.mean().unwrap_or(f64::NAN),
            DummyStrategy::Median => median(y),
            DummyStrategy::Constant(c) => c,
        };
        self.constant = Some(value);
        Ok(())
    }

    fn predict_inner(&self, x: &Container) -> Result<Array1<f64>> {
        let value = self.constant.ok_or(DatatypesError::ModelNotFitted)?;
        Ok(Array1::from_elem(x.n_instances()?, value))
    }

    fn clone_box(&self) -> Box<dyn PanelRegressor> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_strategies() {
        let y = array![1.0, 2.0, 10.0, 3.0];
        let x = Container::DfList(Default::default());

        let mut mean = DummyRegressor::new(DummyStrategy::Mean);
        mean.fit_inner(&x, &y).unwrap();
        assert_eq!(mean.constant(), Some(4.0));

        let mut median = DummyRegressor::new(DummyStrategy::Median);
        median.fit_inner(&x, &y).unwrap();
        assert_eq!(median.constant(), Some(2.5));

        let mut constant = DummyRegressor::new(DummyStrategy::Constant(7.0));
        constant.fit_inner(&x, &y).unwrap();
        assert_eq!(constant.constant(), Some(7.0));
    }

    #[test]
    fn test_predict_before_fit() {
        let regressor = DummyRegressor::default();
        let err = regressor.predict_inner(&Container::DfList(Default::default())).unwrap_err();
        assert!(matches!(err, DatatypesError::ModelNotFitted));
    }

    #[test]
    fn test_rejects_empty_targets() {
        let mut regressor = DummyRegressor::default();
        let y = Array1::<f64>::zeros(0);
        assert!(regressor.fit_inner(&Container::DfList(Default::default()), &y).is_err());
    }
}
