//! Estimator capability tags

use crate::datatypes::Representation;
use crate::error::{DatatypesError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MULTIVARIATE: &str = "capability:multivariate";
pub const UNEQUAL_LENGTH: &str = "capability:unequal_length";
pub const MISSING_VALUES: &str = "capability:missing_values";
pub const CATEGORICAL_IN_X: &str = "capability:categorical_in_X";
pub const MULTITHREADING: &str = "capability:multithreading";
pub const IS_COMPOSITE: &str = "is_composite";

/// Capabilities an estimator declares; fixed once the estimator is built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatorTags {
    #[serde(rename = "capability:multivariate")]
    pub multivariate: bool,
    #[serde(rename = "capability:unequal_length")]
    pub unequal_length: bool,
    #[serde(rename = "capability:missing_values")]
    pub missing_values: bool,
    #[serde(rename = "capability:categorical_in_X")]
    pub categorical_in_x: bool,
    #[serde(rename = "capability:multithreading")]
    pub multithreading: bool,
    /// Wraps other estimators; capability problems downgrade to warnings
    pub is_composite: bool,
    /// Representation the estimator's own fit/predict logic operates on
    #[serde(rename = "X_inner_mtype")]
    pub x_inner_mtype: Representation,
}

impl Default for EstimatorTags {
    fn default() -> Self {
        Self {
            multivariate: false,
            unequal_length: false,
            missing_values: false,
            categorical_in_x: false,
            multithreading: false,
            is_composite: false,
            x_inner_mtype: Representation::Numpy3D,
        }
    }
}

impl EstimatorTags {
    /// Default tags overridden by `(name, value)` pairs
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        pairs
            .into_iter()
            .try_fold(Self::default(), |tags, (name, value)| tags.with(name, value))
    }

    /// Set one boolean tag by name
    pub fn with(mut self, name: &str, value: bool) -> Result<Self> {
        let slot = match name {
            MULTIVARIATE => &mut self.multivariate,
            UNEQUAL_LENGTH => &mut self.unequal_length,
            MISSING_VALUES => &mut self.missing_values,
            CATEGORICAL_IN_X => &mut self.categorical_in_x,
            MULTITHREADING => &mut self.multithreading,
            IS_COMPOSITE => &mut self.is_composite,
            other => {
                return Err(DatatypesError::Config(format!("unknown estimator tag: {}", other)))
            }
        };
        *slot = value;
        Ok(self)
    }

    pub fn with_inner_mtype(mut self, mtype: Representation) -> Self {
        self.x_inner_mtype = mtype;
        self
    }

    /// Tags declaring every data capability
    pub fn all_capabilities() -> Self {
        Self {
            multivariate: true,
            unequal_length: true,
            missing_values: true,
            categorical_in_x: true,
            ..Self::default()
        }
    }

    /// Look up a boolean tag by name
    pub fn get(&self, name: &str) -> Option<bool> {
        match name {
            MULTIVARIATE => Some(self.multivariate),
            UNEQUAL_LENGTH => Some(self.unequal_length),
            MISSING_VALUES => Some(self.missing_values),
            CATEGORICAL_IN_X => Some(self.categorical_in_x),
            MULTITHREADING => Some(self.multithreading),
            IS_COMPOSITE => Some(self.is_composite),
            _ => None,
        }
    }
}

/// A mismatch between X and what an estimator can handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapabilityProblem {
    MissingValues,
    Multivariate,
    UnequalLength,
    CategoricalFeatures,
}

impl fmt::Display for CapabilityProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CapabilityProblem::MissingValues => "missing values",
            CapabilityProblem::Multivariate => "multivariate series",
            CapabilityProblem::UnequalLength => "unequal length series",
            CapabilityProblem::CategoricalFeatures => "categorical features",
        };
        f.write_str(text)
    }
}
