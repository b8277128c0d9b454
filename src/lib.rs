//! Kolosal Datatypes - series data representations and panel regressors
//!
//! This crate provides:
//! - Representation tags (mtypes) for series, panel and hierarchical data
//! - Dtype kind classification and feature kind reduction per representation
//! - A pairwise conversion registry between representations
//! - Input negotiation for panel regressors with capability checks
//!
//! # Modules
//!
//! - [`datatypes`] - Containers, dtype kinds, metadata and conversion
//! - [`regression`] - Capability tags, the fit/predict pipeline and regressors
//! - [`testing`] - Random panel fixtures

// Core error handling
pub mod error;

pub mod datatypes;
pub mod regression;
pub mod testing;

pub use error::{DatatypesError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{DatatypesError, Result};

    // Data representations
    pub use crate::datatypes::{
        convert, dtype_kinds, feature_kinds, x_metadata, Container, DtypeKind, FeatureKind,
        Indexed, KeyedFrames, MultiIndexFrame, PanelIndex, Representation, Scitype, XMetadata,
    };

    // Regression
    pub use crate::regression::{
        CapabilityProblem, DummyRegressor, EstimatorTags, FittedRegressor,
        KNeighborsTimeSeriesRegressor, Labels, MeanEnsembleRegressor, PanelRegressor,
        RegressorConfig, TimeSeriesRegressor,
    };
}
