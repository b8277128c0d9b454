//! Error types for kolosal-datatypes

use thiserror::Error;

/// Result type alias for datatype and estimator operations
pub type Result<T> = std::result::Result<T, DatatypesError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum DatatypesError {
    /// Input is not in one of the accepted representations
    #[error("{0} must be in a compatible format")]
    UnsupportedRepresentation(String),

    /// A classifier or checker was asked about a representation outside its scitype
    #[error("mtype {mtype} is not supported for scitype {scitype}")]
    UnsupportedMtype { mtype: String, scitype: String },

    /// A leaf estimator cannot handle the data it was given
    #[error(
        "Data seen by {estimator} instance has {}, but this {estimator} instance cannot handle {}. \
         Calls with {} may result in error or unreliable results.",
        join_problems(.problems, " and "),
        join_problems(.problems, " or "),
        join_problems(.problems, " or ")
    )]
    CapabilityViolation {
        estimator: String,
        problems: Vec<crate::regression::CapabilityProblem>,
    },

    #[error("Mismatch in number of cases. Number in X = {x_instances} nos in y = {y_instances}")]
    CaseMismatch { x_instances: usize, y_instances: usize },

    #[error("Minimum number of cases required is {required} but X has {actual}")]
    TooFewInstances { required: usize, actual: usize },

    /// Storage dtype matches none of the classification predicates
    #[error("Cannot classify column '{column}' with storage dtype {dtype}")]
    UnclassifiableDtype { column: String, dtype: String },

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("No converter registered from {from} to {to}")]
    MissingConverter { from: String, to: String },

    #[error("Invalid container: {0}")]
    InvalidContainer(String),

    #[error("Invalid labels: {0}")]
    InvalidLabels(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("X has {actual} features, but the estimator was fitted with {expected}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error("Data error: {0}")]
    Data(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

fn join_problems(problems: &[crate::regression::CapabilityProblem], sep: &str) -> String {
    problems
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

impl From<polars::error::PolarsError> for DatatypesError {
    fn from(err: polars::error::PolarsError) -> Self {
        DatatypesError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for DatatypesError {
    fn from(err: serde_json::Error) -> Self {
        DatatypesError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for DatatypesError {
    fn from(err: ndarray::ShapeError) -> Self {
        DatatypesError::Shape {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regression::CapabilityProblem;

    #[test]
    fn test_error_display() {
        let err = DatatypesError::Data("test error".to_string());
        assert_eq!(err.to_string(), "Data error: test error");
    }

    #[test]
    fn test_capability_message_joins_problems() {
        let err = DatatypesError::CapabilityViolation {
            estimator: "DummyRegressor".to_string(),
            problems: vec![CapabilityProblem::MissingValues, CapabilityProblem::Multivariate],
        };
        let msg = err.to_string();
        assert!(msg.contains("has missing values and multivariate series"));
        assert!(msg.contains("cannot handle missing values or multivariate series"));
    }

    #[test]
    fn test_dimension_messages_are_distinct() {
        let mismatch = DatatypesError::CaseMismatch { x_instances: 3, y_instances: 5 };
        let too_few = DatatypesError::TooFewInstances { required: 6, actual: 2 };
        assert!(mismatch.to_string().contains("Mismatch in number of cases"));
        assert!(too_few.to_string().contains("Minimum number of cases required"));
    }

    #[test]
    fn test_error_from_shape() {
        let shape_err = ndarray::Array2::<f64>::from_shape_vec((2, 2), vec![1.0]).unwrap_err();
        let err: DatatypesError = shape_err.into();
        assert!(matches!(err, DatatypesError::Shape { .. }));
    }
}
