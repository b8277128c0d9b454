//! Panel regressors and the input negotiation they share
//!
//! Provides:
//! - Capability tags and the leaf/composite capability policy
//! - Fit/predict pipelines converting X to each estimator's inner representation
//! - A typestate wrapper separating unfitted and fitted regressors
//! - Dummy, k-nearest-neighbour and mean-ensemble regressors

mod base;
mod compose;
mod config;
mod dummy;
mod knn;
mod tags;

pub use base::{
    check_capabilities, check_input, fit_pipeline, labels_to_array, predict_pipeline,
    resolve_threads, CheckedInput, FitRecord, FittedRegressor, Labels, PanelRegressor,
    TimeSeriesRegressor,
};
pub use compose::MeanEnsembleRegressor;
pub use config::{check_n_jobs, RegressorConfig};
pub use dummy::{DummyRegressor, DummyStrategy};
pub use knn::{KNeighborsTimeSeriesRegressor, KnnConfig, WeightScheme};
pub use tags::{
    CapabilityProblem, EstimatorTags, CATEGORICAL_IN_X, IS_COMPOSITE, MISSING_VALUES,
    MULTITHREADING, MULTIVARIATE, UNEQUAL_LENGTH,
};
