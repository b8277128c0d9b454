//! Input negotiation shared by every panel regressor
//!
//! A fit or predict call runs the same steps regardless of the estimator:
//! check that X is panel data, extract metadata without converting, compare it
//! with the estimator's capability tags, convert X to the estimator's inner
//! representation and only then hand it to the estimator's own logic.

use super::config::{check_n_jobs, RegressorConfig};
use super::tags::{CapabilityProblem, EstimatorTags};
use crate::datatypes::{
    convert, series_to_f64, x_metadata, Container, FeatureKind, Scitype, XMetadata,
};
use crate::error::{DatatypesError, Result};
use ndarray::{Array1, ArrayD, Ix1};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Estimator-specific logic behind the negotiator.
///
/// `fit_inner` and `predict_inner` only ever see X in the representation
/// named by `tags().x_inner_mtype`, already checked against the tags.
pub trait PanelRegressor: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn tags(&self) -> EstimatorTags;

    fn fit_inner(&mut self, x: &Container, y: &Array1<f64>) -> Result<()>;

    fn predict_inner(&self, x: &Container) -> Result<Array1<f64>>;

    /// Receives the resolved thread count of multithreading-capable estimators
    fn set_threads(&mut self, _threads: usize) {}

    fn clone_box(&self) -> Box<dyn PanelRegressor>;
}

impl Clone for Box<dyn PanelRegressor> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Regression targets as handed to `fit`
#[derive(Debug, Clone)]
pub enum Labels {
    Array(ArrayD<f64>),
    Series(Series),
    Frame(DataFrame),
    /// A plain sequence; never accepted as y
    List(Vec<f64>),
}

impl From<Array1<f64>> for Labels {
    fn from(a: Array1<f64>) -> Self {
        Labels::Array(a.into_dyn())
    }
}

impl From<Array1<i64>> for Labels {
    fn from(a: Array1<i64>) -> Self {
        Labels::Array(a.mapv(|v| v as f64).into_dyn())
    }
}

impl From<ArrayD<f64>> for Labels {
    fn from(a: ArrayD<f64>) -> Self {
        Labels::Array(a)
    }
}

impl From<Series> for Labels {
    fn from(s: Series) -> Self {
        Labels::Series(s)
    }
}

impl From<DataFrame> for Labels {
    fn from(df: DataFrame) -> Self {
        Labels::Frame(df)
    }
}

impl From<Vec<f64>> for Labels {
    fn from(v: Vec<f64>) -> Self {
        Labels::List(v)
    }
}

/// Flatten labels into one value per instance
pub fn labels_to_array(y: &Labels) -> Result<Array1<f64>> {
    match y {
        Labels::Array(a) => match a.ndim() {
            1 => Ok(a.clone().into_dimensionality::<Ix1>()?),
            2 if a.shape()[1] == 1 => Ok(a.iter().copied().collect()),
            _ => Err(DatatypesError::InvalidLabels(format!(
                "y must be one-dimensional, got shape {:?}",
                a.shape()
            ))),
        },
        Labels::Series(s) => Ok(Array1::from_vec(series_to_f64(s)?)),
        Labels::Frame(df) if df.width() == 1 => {
            let col = &df.get_columns()[0];
            Ok(Array1::from_vec(series_to_f64(col.as_materialized_series())?))
        }
        Labels::Frame(df) => Err(DatatypesError::InvalidLabels(format!(
            "y must have a single column, got {}",
            df.width()
        ))),
        Labels::List(_) => Err(DatatypesError::UnsupportedRepresentation(
            "y given as a plain list".to_string(),
        )),
    }
}

/// X metadata together with y flattened to one value per instance
#[derive(Debug, Clone)]
pub struct CheckedInput {
    pub metadata: XMetadata,
    pub labels: Option<Array1<f64>>,
}

/// Check X, and y when given, before anything is converted.
///
/// The X/y case mismatch and the minimum instance count are separate errors;
/// the mismatch is checked first.
pub fn check_input(
    x: &Container,
    y: Option<&Labels>,
    enforce_min_instances: usize,
) -> Result<CheckedInput> {
    if x.scitype() != Scitype::Panel {
        return Err(DatatypesError::UnsupportedRepresentation(format!(
            "X given as {} ({} scitype)",
            x.representation(),
            x.scitype()
        )));
    }
    x.validate()?;
    let metadata = x_metadata(x)?;

    let labels = y.map(labels_to_array).transpose()?;
    if let Some(labels) = &labels {
        if labels.len() != metadata.n_instances {
            return Err(DatatypesError::CaseMismatch {
                x_instances: metadata.n_instances,
                y_instances: labels.len(),
            });
        }
    }
    if metadata.n_instances < enforce_min_instances {
        return Err(DatatypesError::TooFewInstances {
            required: enforce_min_instances,
            actual: metadata.n_instances,
        });
    }
    Ok(CheckedInput { metadata, labels })
}

/// Compare X metadata with the capability tags.
///
/// Leaf estimators fail on the first call with any problem. Composite
/// estimators log a warning and get the problems back.
pub fn check_capabilities(
    tags: &EstimatorTags,
    estimator: &str,
    metadata: &XMetadata,
) -> Result<Vec<CapabilityProblem>> {
    let mut problems = Vec::new();
    if metadata.has_nans && !tags.missing_values {
        problems.push(CapabilityProblem::MissingValues);
    }
    if !metadata.is_univariate && !tags.multivariate {
        problems.push(CapabilityProblem::Multivariate);
    }
    if !metadata.is_equal_length && !tags.unequal_length {
        problems.push(CapabilityProblem::UnequalLength);
    }
    if metadata.has_categorical() && !tags.categorical_in_x {
        problems.push(CapabilityProblem::CategoricalFeatures);
    }
    if problems.is_empty() {
        return Ok(problems);
    }

    let violation = DatatypesError::CapabilityViolation {
        estimator: estimator.to_string(),
        problems: problems.clone(),
    };
    if !tags.is_composite {
        return Err(violation);
    }
    warn!(estimator, "{}", violation);
    Ok(problems)
}

/// Thread count handed to the estimator
pub fn resolve_threads(
    tags: &EstimatorTags,
    estimator: &str,
    config: &RegressorConfig,
) -> Result<usize> {
    if !tags.multithreading {
        return Ok(1);
    }
    match config.n_jobs {
        Some(_) => check_n_jobs(config.n_jobs),
        None => Err(DatatypesError::Config(format!(
            "{} is multithreading-capable, n_jobs must be set",
            estimator
        ))),
    }
}

/// Facts recorded by a successful fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitRecord {
    pub fit_time_ms: u64,
    pub n_instances: usize,
    pub n_features: usize,
    pub feature_kind: Vec<FeatureKind>,
    pub threads_to_use: usize,
    /// Problems downgraded to warnings for composite estimators
    pub capability_warnings: Vec<CapabilityProblem>,
}

/// Run the fit negotiation on an estimator in place
pub fn fit_pipeline(
    estimator: &mut dyn PanelRegressor,
    x: &Container,
    y: &Labels,
    config: &RegressorConfig,
) -> Result<FitRecord> {
    let start = Instant::now();
    let tags = estimator.tags();

    let checked = check_input(x, Some(y), config.enforce_min_instances)?;
    let labels = checked
        .labels
        .ok_or_else(|| DatatypesError::InvalidLabels("fit requires y".to_string()))?;
    let metadata = checked.metadata;

    let capability_warnings = check_capabilities(&tags, estimator.name(), &metadata)?;
    let threads_to_use = resolve_threads(&tags, estimator.name(), config)?;
    estimator.set_threads(threads_to_use);

    let inner_x = convert(x, tags.x_inner_mtype)?;
    debug!(
        estimator = estimator.name(),
        from = %x.representation(),
        to = %tags.x_inner_mtype,
        "Converted X for fit"
    );
    estimator.fit_inner(&inner_x, &labels)?;

    let fit_time_ms = start.elapsed().as_millis() as u64;
    info!(
        estimator = estimator.name(),
        n_instances = metadata.n_instances,
        n_features = metadata.n_features,
        fit_time_ms,
        "Fitted regressor"
    );
    Ok(FitRecord {
        fit_time_ms,
        n_instances: metadata.n_instances,
        n_features: metadata.n_features,
        feature_kind: metadata.feature_kind,
        threads_to_use,
        capability_warnings,
    })
}

/// Run the predict negotiation against a fitted estimator
pub fn predict_pipeline(
    estimator: &dyn PanelRegressor,
    record: &FitRecord,
    x: &Container,
    config: &RegressorConfig,
) -> Result<Array1<f64>> {
    let tags = estimator.tags();
    let metadata = check_input(x, None, 0)?.metadata;
    check_capabilities(&tags, estimator.name(), &metadata)?;

    if config.check_feature_consistency && metadata.n_features != record.n_features {
        return Err(DatatypesError::FeatureMismatch {
            expected: record.n_features,
            actual: metadata.n_features,
        });
    }

    let inner_x = convert(x, tags.x_inner_mtype)?;
    let predictions = estimator.predict_inner(&inner_x)?;
    if predictions.len() != metadata.n_instances {
        return Err(DatatypesError::Shape {
            expected: format!("{} predictions", metadata.n_instances),
            actual: format!("{} predictions", predictions.len()),
        });
    }
    Ok(predictions)
}

/// Unfitted regressor: an estimator blueprint plus its configuration
#[derive(Debug, Clone)]
pub struct TimeSeriesRegressor<E> {
    estimator: E,
    config: RegressorConfig,
}

impl<E: PanelRegressor + Clone> TimeSeriesRegressor<E> {
    pub fn new(estimator: E) -> Self {
        Self {
            estimator,
            config: RegressorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RegressorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    pub fn config(&self) -> &RegressorConfig {
        &self.config
    }

    pub fn tags(&self) -> EstimatorTags {
        self.estimator.tags()
    }

    /// Fit a copy of the estimator; the blueprint stays untouched
    pub fn fit(&self, x: &Container, y: impl Into<Labels>) -> Result<FittedRegressor<E>> {
        let mut fitted = self.estimator.clone();
        let record = fit_pipeline(&mut fitted, x, &y.into(), &self.config)?;
        Ok(FittedRegressor {
            blueprint: self.estimator.clone(),
            fitted,
            config: self.config.clone(),
            record,
        })
    }
}

/// Regressor after a successful fit
#[derive(Debug, Clone)]
pub struct FittedRegressor<E> {
    blueprint: E,
    fitted: E,
    config: RegressorConfig,
    record: FitRecord,
}

impl<E: PanelRegressor + Clone> FittedRegressor<E> {
    pub fn predict(&self, x: &Container) -> Result<Array1<f64>> {
        predict_pipeline(&self.fitted, &self.record, x, &self.config)
    }

    pub fn fit_time_ms(&self) -> u64 {
        self.record.fit_time_ms
    }

    pub fn n_instances_fit(&self) -> usize {
        self.record.n_instances
    }

    pub fn n_features_fit(&self) -> usize {
        self.record.n_features
    }

    pub fn feature_kind(&self) -> &[FeatureKind] {
        &self.record.feature_kind
    }

    pub fn threads_to_use(&self) -> usize {
        self.record.threads_to_use
    }

    pub fn capability_warnings(&self) -> &[CapabilityProblem] {
        &self.record.capability_warnings
    }

    pub fn record(&self) -> &FitRecord {
        &self.record
    }

    pub fn inner(&self) -> &E {
        &self.fitted
    }

    /// Drop the fitted state
    pub fn reset(self) -> TimeSeriesRegressor<E> {
        TimeSeriesRegressor {
            estimator: self.blueprint,
            config: self.config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::Representation;
    use ndarray::{array, Array2, Array3};

    #[derive(Debug, Clone)]
    struct LastValue {
        tags: EstimatorTags,
        fitted: bool,
    }

    impl LastValue {
        fn new(tags: EstimatorTags) -> Self {
            Self { tags, fitted: false }
        }
    }

    impl PanelRegressor for LastValue {
        fn name(&self) -> &str {
            "LastValue"
        }

        fn tags(&self) -> EstimatorTags {
            self.tags.clone()
        }

        fn fit_inner(&mut self, x: &Container, _y: &Array1<f64>) -> Result<()> {
            assert_eq!(x.representation(), self.tags.x_inner_mtype);
            self.fitted = true;
            Ok(())
        }

        fn predict_inner(&self, x: &Container) -> Result<Array1<f64>> {
            match x {
                Container::Numpy3D(a) => {
                    let m = a.dim().2;
                    Ok(a.index_axis(ndarray::Axis(2), m - 1).column(0).to_owned())
                }
                _ => Err(DatatypesError::ModelNotFitted),
            }
        }

        fn clone_box(&self) -> Box<dyn PanelRegressor> {
            Box::new(self.clone())
        }
    }

    fn metadata(has_nans: bool, multivariate: bool, unequal: bool) -> XMetadata {
        XMetadata {
            is_univariate: !multivariate,
            is_equal_length: !unequal,
            has_nans,
            n_instances: 3,
            n_features: if multivariate { 2 } else { 1 },
            n_timepoints: if unequal { None } else { Some(4) },
            feature_kind: vec![FeatureKind::Float; if multivariate { 2 } else { 1 }],
        }
    }

    #[test]
    fn test_problem_order() {
        let meta = metadata(true, true, true);
        let composite = EstimatorTags::default().with("is_composite", true).unwrap();
        let problems = check_capabilities(&composite, "Composite", &meta).unwrap();
        assert_eq!(
            problems,
            vec![
                CapabilityProblem::MissingValues,
                CapabilityProblem::Multivariate,
                CapabilityProblem::UnequalLength,
            ]
        );
    }

    #[test]
    fn test_leaf_rejects() {
        let err = check_capabilities(&EstimatorTags::default(), "Leaf", &metadata(false, true, false))
            .unwrap_err();
        assert!(err.to_string().contains("cannot handle multivariate series"));
    }

    #[test]
    fn test_labels_list_is_type_error() {
        let err = labels_to_array(&Labels::from(vec![1.0, 2.0])).unwrap_err();
        assert!(matches!(err, DatatypesError::UnsupportedRepresentation(_)));
        assert!(err.to_string().contains("must be in a compatible format"));
    }

    #[test]
    fn test_labels_column_vector_accepted() {
        let column = Array2::from_shape_vec((3, 1), vec![1.0, 2.0, 3.0]).unwrap();
        let y = labels_to_array(&Labels::from(column.into_dyn())).unwrap();
        assert_eq!(y, array![1.0, 2.0, 3.0]);

        let wide = Array2::<f64>::zeros((3, 2));
        assert!(labels_to_array(&Labels::from(wide.into_dyn())).is_err());
    }

    #[test]
    fn test_series_input_rejected() {
        let x = Container::NpArray(ArrayD::zeros(vec![10]));
        let err = check_input(&x, None, 1).unwrap_err();
        assert!(matches!(err, DatatypesError::UnsupportedRepresentation(_)));
    }

    #[test]
    fn test_multithreading_needs_n_jobs() {
        let tags = EstimatorTags::default().with("capability:multithreading", true).unwrap();
        assert!(resolve_threads(&tags, "Parallel", &RegressorConfig::default()).is_err());
        let config = RegressorConfig::default().with_n_jobs(2);
        assert_eq!(resolve_threads(&tags, "Parallel", &config).unwrap(), 2);
        assert_eq!(
            resolve_threads(&EstimatorTags::default(), "Serial", &RegressorConfig::default())
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_fit_predict_and_reset() {
        let x = Container::from(Array3::from_shape_fn((4, 1, 5), |(i, _, t)| (i * 10 + t) as f64));
        let regressor = TimeSeriesRegressor::new(LastValue::new(EstimatorTags::default()));
        let fitted = regressor.fit(&x, array![1i64, 2, 3, 4]).unwrap();
        assert!(fitted.inner().fitted);
        assert_eq!(fitted.n_instances_fit(), 4);
        assert_eq!(fitted.threads_to_use(), 1);
        assert!(fitted.capability_warnings().is_empty());

        let preds = fitted.predict(&x).unwrap();
        assert_eq!(preds, array![4.0, 14.0, 24.0, 34.0]);

        let unfitted = fitted.reset();
        assert!(!unfitted.estimator().fitted);
    }

    #[test]
    fn test_predict_feature_mismatch() {
        let tags = EstimatorTags::default()
            .with("capability:multivariate", true)
            .unwrap();
        let regressor = TimeSeriesRegressor::new(LastValue::new(tags));
        let x_fit = Container::from(Array3::<f64>::zeros((3, 2, 4)));
        let fitted = regressor.fit(&x_fit, array![1.0, 2.0, 3.0]).unwrap();

        let x_pred = Container::from(Array3::<f64>::zeros((3, 1, 4)));
        let err = fitted.predict(&x_pred).unwrap_err();
        assert!(matches!(err, DatatypesError::FeatureMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn test_inner_mtype_conversion() {
        let tags = EstimatorTags::default().with_inner_mtype(Representation::Numpy3D);
        let regressor = TimeSeriesRegressor::new(LastValue::new(tags));
        let x = Container::from(Array2::from_shape_fn((3, 4), |(i, t)| (i + t) as f64));
        let preds = regressor.fit(&x, array![0.0, 0.0, 0.0]).unwrap().predict(&x).unwrap();
        assert_eq!(preds, array![3.0, 4.0, 5.0]);
    }
}
