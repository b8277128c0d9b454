//! Shape and content metadata computed directly on each representation

use super::container::{frame_has_missing, series_has_missing, Container};
use super::dtypekind::{dtype_kinds, feature_kinds, FeatureKind};
use crate::error::Result;
use ndarray::{ArrayBase, Data, Dimension};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Per-call facts about X used for capability checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XMetadata {
    pub is_univariate: bool,
    pub is_equal_length: bool,
    pub has_nans: bool,
    pub n_instances: usize,
    pub n_features: usize,
    /// Common series length, if all instances share one
    pub n_timepoints: Option<usize>,
    pub feature_kind: Vec<FeatureKind>,
}

impl XMetadata {
    pub fn has_categorical(&self) -> bool {
        self.feature_kind.iter().any(|k| k.is_categorical())
    }
}

fn any_nan<S, D>(a: &ArrayBase<S, D>) -> bool
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    a.iter().any(|v| v.is_nan())
}

fn common_length(lengths: &[usize]) -> Option<usize> {
    match lengths.first() {
        Some(&first) if lengths.iter().all(|&l| l == first) => Some(first),
        Some(_) => None,
        None => Some(0),
    }
}

fn frames_summary<'a, I>(frames: I) -> Result<(Vec<usize>, bool)>
where
    I: IntoIterator<Item = &'a DataFrame>,
{
    let mut lengths = Vec::new();
    let mut has_nans = false;
    for df in frames {
        lengths.push(df.height());
        has_nans = has_nans || frame_has_missing(df)?;
    }
    Ok((lengths, has_nans))
}

/// Compute X metadata without converting the container
pub fn x_metadata(x: &Container) -> Result<XMetadata> {
    x.validate()?;
    let feature_kind = feature_kinds(&dtype_kinds(x)?);
    let n_features = feature_kind.len();

    let (n_instances, lengths, has_nans) = match x {
        Container::NpArray(a) => (1, vec![a.shape()[0]], any_nan(a)),
        Container::PdSeries(s) => (1, vec![s.len()], series_has_missing(s)?),
        Container::PdDataFrame(df) => (1, vec![df.height()], frame_has_missing(df)?),
        Container::Numpy3D(a) => {
            let (n, _, m) = a.dim();
            (n, vec![m; n], any_nan(a))
        }
        Container::Numpy2D(a) | Container::NumpyFlat(a) => {
            let (n, m) = a.dim();
            (n, vec![m; n], any_nan(a))
        }
        Container::DfList(frames) => {
            let (lengths, has_nans) = frames_summary(frames.iter())?;
            (frames.len(), lengths, has_nans)
        }
        Container::KeyedDfList(keyed) => {
            let (lengths, has_nans) = frames_summary(keyed.frames().iter().map(|(_, df)| df))?;
            (keyed.len(), lengths, has_nans)
        }
        Container::PdMultiIndex(frame) | Container::PdMultiIndexHier(frame) => {
            let runs = frame.instance_runs()?;
            let lengths: Vec<usize> = runs.iter().map(|(_, _, len)| *len).collect();
            (runs.len(), lengths, frame_has_missing(&frame.values()?)?)
        }
        Container::NestedUniv(df) => {
            let mut lengths = Vec::with_capacity(df.height());
            let mut has_nans = false;
            for col in df.get_columns() {
                let cells = col.as_materialized_series().list()?;
                for row in 0..df.height() {
                    // A null cell is a missing sequence
                    match cells.get_as_series(row) {
                        Some(cell) => {
                            lengths.push(cell.len());
                            has_nans = has_nans || series_has_missing(&cell)?;
                        }
                        None => has_nans = true,
                    }
                }
            }
            (df.height(), lengths, has_nans)
        }
    };

    let n_timepoints = common_length(&lengths);
    let metadata = XMetadata {
        is_univariate: n_features <= 1,
        is_equal_length: n_timepoints.is_some(),
        has_nans,
        n_instances,
        n_features,
        n_timepoints,
        feature_kind,
    };
    debug!(
        mtype = %x.representation(),
        n_instances = metadata.n_instances,
        n_features = metadata.n_features,
        is_equal_length = metadata.is_equal_length,
        has_nans = metadata.has_nans,
        "Extracted X metadata"
    );
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatatypesError;
    use ndarray::{Array2, Array3, ArrayD};

    #[test]
    fn test_numpy3d_metadata() {
        let mut cube = Array3::<f64>::zeros((5, 2, 10));
        let meta = x_metadata(&Container::Numpy3D(cube.clone())).unwrap();
        assert_eq!(meta.n_instances, 5);
        assert_eq!(meta.n_features, 2);
        assert!(!meta.is_univariate);
        assert!(meta.is_equal_length);
        assert!(!meta.has_nans);
        assert_eq!(meta.n_timepoints, Some(10));

        cube[[0, 1, 3]] = f64::NAN;
        assert!(x_metadata(&Container::Numpy3D(cube)).unwrap().has_nans);
    }

    #[test]
    fn test_numpy2d_is_univariate() {
        let meta = x_metadata(&Container::Numpy2D(Array2::zeros((5, 10)))).unwrap();
        assert!(meta.is_univariate);
        assert_eq!(meta.n_instances, 5);
        assert_eq!(meta.feature_kind, vec![FeatureKind::Float]);
    }

    #[test]
    fn test_df_list_unequal_length() {
        let a = df!("var_0" => &[1.0, 2.0, 3.0]).unwrap();
        let b = df!("var_0" => &[1.0, 2.0]).unwrap();
        let meta = x_metadata(&Container::from(vec![a, b])).unwrap();
        assert_eq!(meta.n_instances, 2);
        assert!(!meta.is_equal_length);
        assert_eq!(meta.n_timepoints, None);
    }

    #[test]
    fn test_nested_missing_inside_cell() {
        let cells = vec![
            Series::new("".into(), &[1.0, 2.0]),
            Series::new("".into(), &[f64::NAN, 2.0]),
        ];
        let col = Series::new("var_0".into(), cells);
        let df = DataFrame::new(vec![col.into()]).unwrap();
        let meta = x_metadata(&Container::NestedUniv(df.into())).unwrap();
        assert!(meta.has_nans);
        assert!(meta.is_equal_length);
        assert_eq!(meta.n_instances, 2);
    }

    #[test]
    fn test_null_nested_cell_is_missing() {
        let cells = vec![Some(Series::new("".into(), &[1.0, 2.0])), None];
        let col: Series = cells.into_iter().collect::<ListChunked>().into_series();
        let df = DataFrame::new(vec![col.with_name("var_0".into()).into()]).unwrap();
        let meta = x_metadata(&Container::NestedUniv(df.into())).unwrap();
        assert!(meta.has_nans);
        assert_eq!(meta.n_instances, 2);
    }

    #[test]
    fn test_invalid_np_array_rejected() {
        let scalar = ArrayD::<f64>::zeros(vec![]);
        assert!(matches!(
            x_metadata(&Container::NpArray(scalar)),
            Err(DatatypesError::InvalidContainer(_))
        ));
        let cube = ArrayD::<f64>::zeros(vec![2, 3, 4]);
        assert!(matches!(
            x_metadata(&Container::NpArray(cube)),
            Err(DatatypesError::InvalidContainer(_))
        ));
    }

    #[test]
    fn test_categorical_feature_detected() {
        let a = df!("var_0" => &[1.0, 2.0], "var_1" => &["a", "b"]).unwrap();
        let meta = x_metadata(&Container::from(vec![a])).unwrap();
        assert!(meta.has_categorical());
        assert!(!meta.is_univariate);
    }
}
