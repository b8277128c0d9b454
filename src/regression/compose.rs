//! Composite regressor averaging inner regressors

use super::base::{fit_pipeline, predict_pipeline, FitRecord, Labels, PanelRegressor};
use super::config::RegressorConfig;
use super::tags::EstimatorTags;
use crate::datatypes::{Container, Representation};
use crate::error::{DatatypesError, Result};
use ndarray::Array1;

/// Weighted mean of the predictions of its members.
///
/// Each member goes through its own fit/predict negotiation, so a member that
/// cannot handle the data still fails even where the ensemble only warned.
#[derive(Debug, Clone)]
pub struct MeanEnsembleRegressor {
    members: Vec<Box<dyn PanelRegressor>>,
    weights: Option<Vec<f64>>,
    member_config: RegressorConfig,
    records: Vec<FitRecord>,
}

impl MeanEnsembleRegressor {
    pub fn new(members: Vec<Box<dyn PanelRegressor>>) -> Self {
        Self {
            members,
            weights: None,
            member_config: RegressorConfig::default(),
            records: Vec::new(),
        }
    }

    /// Set member weights
    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Configuration used when fitting and predicting each member
    pub fn with_member_config(mut self, config: RegressorConfig) -> Self {
        self.member_config = config;
        self
    }

    pub fn members(&self) -> &[Box<dyn PanelRegressor>] {
        &self.members
    }

    /// Fit records of the members, in member order
    pub fn member_records(&self) -> &[FitRecord] {
        &self.records
    }

    fn normalized_weights(&self) -> Result<Vec<f64>> {
        let n_members = self.members.len();
        let weights = self
            .weights
            .clone()
            .unwrap_or_else(|| vec![1.0; n_members]);
        if weights.len() != n_members {
            return Err(DatatypesError::Config(format!(
                "got {} weights for {} members",
                weights.len(),
                n_members
            )));
        }
        let weight_sum: f64 = weights.iter().sum();
        if weight_sum <= 0.0 || weights.iter().any(|w| *w < 0.0) {
            return Err(DatatypesError::Config(
                "member weights must be non-negative with a positive sum".to_string(),
            ));
        }
        Ok(weights.iter().map(|w| w / weight_sum).collect())
    }
}

impl PanelRegressor for MeanEnsembleRegressor {
    fn name(&self) -> &str {
        "MeanEnsembleRegressor"
    }

    /// Capabilities shared by every member
    fn tags(&self) -> EstimatorTags {
        let member_tags: Vec<EstimatorTags> = self.members.iter().map(|m| m.tags()).collect();
        let all = |f: fn(&EstimatorTags) -> bool| {
            !member_tags.is_empty() && member_tags.iter().all(f)
        };
        EstimatorTags {
            multivariate: all(|t| t.multivariate),
            unequal_length: all(|t| t.unequal_length),
            missing_values: all(|t| t.missing_values),
            categorical_in_x: all(|t| t.categorical_in_x),
            multithreading: false,
            is_composite: true,
            x_inner_mtype: Representation::DfList,
        }
    }

    fn fit_inner(&mut self, x: &Container, y: &Array1<f64>) -> Result<()> {
        if self.members.is_empty() {
            return Err(DatatypesError::Config(
                "ensemble needs at least one member".to_string(),
            ));
        }
        self.normalized_weights()?;
        let labels = Labels::from(y.clone());
        let records = self
            .members
            .iter_mut()
            .map(|member| fit_pipeline(member.as_mut(), x, &labels, &self.member_config))
            .collect::<Result<Vec<_>>>()?;
        self.records = records;
        Ok(())
    }

    fn predict_inner(&self, x: &Container) -> Result<Array1<f64>> {
        if self.records.len() != self.members.len() || self.records.is_empty() {
            return Err(DatatypesError::ModelNotFitted);
        }
        let weights = self.normalized_weights()?;
        let mut combined = Array1::<f64>::zeros(x.n_instances()?);
        for ((member, record), weight) in self.members.iter().zip(&self.records).zip(weights) {
            let predictions = predict_pipeline(member.as_ref(), record, x, &self.member_config)?;
            combined.scaled_add(weight, &predictions);
        }
        Ok(combined)
    }

    fn clone_box(&self) -> Box<dyn PanelRegressor> {
        Box::new(self.clone())
    }
}
