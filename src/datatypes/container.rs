//! Containers holding series data in one of the supported representations

use super::dtypekind::{classify_dtype, DtypeKind};
use super::mtype::{Representation, Scitype};
use crate::error::{DatatypesError, Result};
use ndarray::{Array2, Array3, ArrayD};
use polars::prelude::*;
use std::collections::HashSet;
use std::ops::Deref;

/// Long-format table indexed by instance level(s) and a time level.
///
/// The index levels are ordinary columns of `data`; every other column is a
/// value column. Rows of one instance must be contiguous.
#[derive(Debug, Clone)]
pub struct MultiIndexFrame {
    data: DataFrame,
    instance_levels: Vec<String>,
    time_level: String,
}

impl MultiIndexFrame {
    /// Wrap a table, naming the instance levels (outermost first) and the time level
    pub fn new(
        data: DataFrame,
        instance_levels: Vec<String>,
        time_level: impl Into<String>,
    ) -> Result<Self> {
        let time_level = time_level.into();
        if instance_levels.is_empty() {
            return Err(DatatypesError::InvalidContainer(
                "multi-index frame needs at least one instance level".to_string(),
            ));
        }
        for level in instance_levels.iter().chain(std::iter::once(&time_level)) {
            if data.column(level).is_err() {
                return Err(DatatypesError::InvalidContainer(format!(
                    "index level '{}' is not a column of the frame",
                    level
                )));
            }
        }
        Ok(Self {
            data,
            instance_levels,
            time_level,
        })
    }

    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    pub fn instance_levels(&self) -> &[String] {
        &self.instance_levels
    }

    pub fn time_level(&self) -> &str {
        &self.time_level
    }

    fn is_index_column(&self, name: &str) -> bool {
        name == self.time_level || self.instance_levels.iter().any(|l| l == name)
    }

    /// Names of the non-index columns, in frame order
    pub fn value_columns(&self) -> Vec<String> {
        self.data
            .get_column_names()
            .into_iter()
            .map(|n| n.to_string())
            .filter(|n| !self.is_index_column(n))
            .collect()
    }

    /// The value columns only
    pub fn values(&self) -> Result<DataFrame> {
        let cols = self.value_columns();
        Ok(self.data.select(cols.iter().map(|c| c.as_str()))?)
    }

    /// Contiguous row runs per instance: (instance key, offset, length)
    pub fn instance_runs(&self) -> Result<Vec<(Vec<String>, usize, usize)>> {
        let keys: Vec<Vec<String>> = self
            .instance_levels
            .iter()
            .map(|level| column_as_strings(self.data.column(level)?))
            .collect::<Result<_>>()?;

        let mut runs: Vec<(Vec<String>, usize, usize)> = Vec::new();
        let mut seen: HashSet<Vec<String>> = HashSet::new();
        for row in 0..self.data.height() {
            let key: Vec<String> = keys.iter().map(|k| k[row].clone()).collect();
            match runs.last_mut() {
                Some((last, _, len)) if *last == key => *len += 1,
                _ => {
                    if !seen.insert(key.clone()) {
                        return Err(DatatypesError::InvalidContainer(format!(
                            "rows of instance {:?} are not contiguous",
                            key
                        )));
                    }
                    runs.push((key, row, 1));
                }
            }
        }
        Ok(runs)
    }
}

/// Index values of a panel or hierarchy cut out of a multi-index table.
///
/// `keys` holds one series per instance level with one row per instance, in
/// the dtype of the source level. `times` holds each instance's time values.
#[derive(Debug, Clone)]
pub struct PanelIndex {
    keys: Vec<Series>,
    time_level: String,
    times: Vec<Series>,
}

impl PanelIndex {
    pub fn new(keys: Vec<Series>, time_level: impl Into<String>, times: Vec<Series>) -> Result<Self> {
        let time_level = time_level.into();
        if keys.is_empty() {
            return Err(DatatypesError::InvalidContainer(
                "panel index needs at least one instance level".to_string(),
            ));
        }
        if let Some(level) = keys.iter().find(|k| k.len() != times.len()) {
            return Err(DatatypesError::InvalidContainer(format!(
                "instance level '{}' has {} keys for {} instances",
                level.name(),
                level.len(),
                times.len()
            )));
        }
        let times = times
            .into_iter()
            .map(|mut t| {
                t.rename(time_level.as_str().into());
                t
            })
            .collect();
        Ok(Self {
            keys,
            time_level,
            times,
        })
    }

    pub fn keys(&self) -> &[Series] {
        &self.keys
    }

    pub fn instance_levels(&self) -> Vec<String> {
        self.keys.iter().map(|k| k.name().to_string()).collect()
    }

    pub fn time_level(&self) -> &str {
        &self.time_level
    }

    pub fn times(&self) -> &[Series] {
        &self.times
    }

    pub fn n_instances(&self) -> usize {
        self.times.len()
    }

    /// Index level columns for `len` rows of instance `i`, time level last
    pub(crate) fn level_columns(&self, i: usize, len: usize) -> Result<Vec<Column>> {
        let time = self.times.get(i).ok_or_else(|| {
            DatatypesError::InvalidContainer(format!("panel index has no instance {}", i))
        })?;
        if time.len() != len {
            return Err(DatatypesError::InvalidContainer(format!(
                "instance {} has {} rows but {} time values",
                i,
                len,
                time.len()
            )));
        }
        let mut columns: Vec<Column> = self
            .keys
            .iter()
            .map(|k| k.new_from_index(i, len).into())
            .collect();
        columns.push(time.clone().into());
        Ok(columns)
    }

    /// Zero-row index level columns
    pub(crate) fn empty_columns(&self) -> Vec<Column> {
        let mut columns: Vec<Column> = self.keys.iter().map(|k| k.clear().into()).collect();
        let time = match self.times.first() {
            Some(t) => t.clear(),
            None => Series::new_empty(self.time_level.as_str().into(), &DataType::Int64),
        };
        columns.push(time.into());
        columns
    }

    fn check_single_level(&self) -> Result<()> {
        if self.keys.len() != 1 {
            return Err(DatatypesError::InvalidContainer(format!(
                "panel index needs exactly one instance level, got {}",
                self.keys.len()
            )));
        }
        Ok(())
    }

    fn check_heights<I>(&self, heights: I) -> Result<()>
    where
        I: ExactSizeIterator<Item = usize>,
    {
        if heights.len() != self.n_instances() {
            return Err(DatatypesError::InvalidContainer(format!(
                "panel index covers {} instances, data has {}",
                self.n_instances(),
                heights.len()
            )));
        }
        for (i, (height, time)) in heights.zip(&self.times).enumerate() {
            if height != time.len() {
                return Err(DatatypesError::InvalidContainer(format!(
                    "instance {} has {} rows but {} time values",
                    i,
                    height,
                    time.len()
                )));
            }
        }
        Ok(())
    }
}

/// Panel payload together with the index it was cut from, if any.
///
/// Dereferences to the payload, so an unindexed `Indexed<Vec<DataFrame>>`
/// reads like a plain list of tables.
#[derive(Debug, Clone, Default)]
pub struct Indexed<T> {
    data: T,
    index: Option<PanelIndex>,
}

impl<T> Indexed<T> {
    pub fn new(data: T) -> Self {
        Self { data, index: None }
    }

    pub fn index(&self) -> Option<&PanelIndex> {
        self.index.as_ref()
    }

    pub fn into_inner(self) -> T {
        self.data
    }
}

impl<T> From<T> for Indexed<T> {
    fn from(data: T) -> Self {
        Self::new(data)
    }
}

impl<T> Deref for Indexed<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl Indexed<Vec<DataFrame>> {
    /// Attach an index with one key and one time series per table
    pub fn with_index(mut self, index: PanelIndex) -> Result<Self> {
        index.check_single_level()?;
        index.check_heights(self.data.iter().map(|df| df.height()))?;
        self.index = Some(index);
        Ok(self)
    }
}

impl Indexed<DataFrame> {
    /// Attach an index with one key per row and one time series per row's sequences
    pub fn with_index(mut self, index: PanelIndex) -> Result<Self> {
        index.check_single_level()?;
        let lengths = match self.data.get_columns().first() {
            Some(col) => (0..self.data.height())
                .map(|row| nested_cell(col, row).map(|cell| cell.len()))
                .collect::<Result<Vec<_>>>()?,
            None => vec![0; self.data.height()],
        };
        index.check_heights(lengths.into_iter())?;
        self.index = Some(index);
        Ok(self)
    }
}

/// Per-instance tables keyed by their path through the hierarchy
#[derive(Debug, Clone)]
pub struct KeyedFrames {
    levels: Vec<String>,
    frames: Vec<(Vec<String>, DataFrame)>,
    index: Option<PanelIndex>,
}

impl KeyedFrames {
    pub fn new(levels: Vec<String>, frames: Vec<(Vec<String>, DataFrame)>) -> Result<Self> {
        if let Some((key, _)) = frames.iter().find(|(key, _)| key.len() != levels.len()) {
            return Err(DatatypesError::InvalidContainer(format!(
                "key {:?} does not have one entry per hierarchy level {:?}",
                key, levels
            )));
        }
        Ok(Self {
            levels,
            frames,
            index: None,
        })
    }

    /// Attach the typed key and time values the tables were cut from
    pub fn with_index(mut self, index: PanelIndex) -> Result<Self> {
        if index.instance_levels() != self.levels {
            return Err(DatatypesError::InvalidContainer(format!(
                "index levels {:?} do not match hierarchy levels {:?}",
                index.instance_levels(),
                self.levels
            )));
        }
        index.check_heights(self.frames.iter().map(|(_, df)| df.height()))?;
        self.index = Some(index);
        Ok(self)
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn frames(&self) -> &[(Vec<String>, DataFrame)] {
        &self.frames
    }

    pub fn index(&self) -> Option<&PanelIndex> {
        self.index.as_ref()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Series, panel or hierarchical data in one concrete representation
#[derive(Debug, Clone)]
pub enum Container {
    NpArray(ArrayD<f64>),
    PdSeries(Series),
    PdDataFrame(DataFrame),
    Numpy3D(Array3<f64>),
    Numpy2D(Array2<f64>),
    NumpyFlat(Array2<f64>),
    DfList(Indexed<Vec<DataFrame>>),
    PdMultiIndex(MultiIndexFrame),
    NestedUniv(Indexed<DataFrame>),
    PdMultiIndexHier(MultiIndexFrame),
    KeyedDfList(KeyedFrames),
}

impl Container {
    /// Wrap a multi-index frame, choosing the panel or hierarchical tag by level count
    pub fn multiindex(frame: MultiIndexFrame) -> Self {
        if frame.instance_levels().len() == 1 {
            Container::PdMultiIndex(frame)
        } else {
            Container::PdMultiIndexHier(frame)
        }
    }

    pub fn representation(&self) -> Representation {
        match self {
            Container::NpArray(_) => Representation::NpArray,
            Container::PdSeries(_) => Representation::PdSeries,
            Container::PdDataFrame(_) => Representation::PdDataFrame,
            Container::Numpy3D(_) => Representation::Numpy3D,
            Container::Numpy2D(_) => Representation::Numpy2D,
            Container::NumpyFlat(_) => Representation::NumpyFlat,
            Container::DfList(_) => Representation::DfList,
            Container::PdMultiIndex(_) => Representation::PdMultiIndex,
            Container::NestedUniv(_) => Representation::NestedUniv,
            Container::PdMultiIndexHier(_) => Representation::PdMultiIndexHier,
            Container::KeyedDfList(_) => Representation::KeyedDfList,
        }
    }

    pub fn scitype(&self) -> Scitype {
        self.representation().scitype()
    }

    /// Number of instances; a single series counts as one
    pub fn n_instances(&self) -> Result<usize> {
        Ok(match self {
            Container::NpArray(_) | Container::PdSeries(_) | Container::PdDataFrame(_) => 1,
            Container::Numpy3D(a) => a.dim().0,
            Container::Numpy2D(a) | Container::NumpyFlat(a) => a.nrows(),
            Container::DfList(frames) => frames.len(),
            Container::NestedUniv(df) => df.height(),
            Container::KeyedDfList(keyed) => keyed.len(),
            Container::PdMultiIndex(f) | Container::PdMultiIndexHier(f) => {
                f.instance_runs()?.len()
            }
        })
    }

    /// Check the structural invariants of the representation
    pub fn validate(&self) -> Result<()> {
        match self {
            Container::NpArray(a) if a.ndim() != 1 && a.ndim() != 2 => {
                Err(DatatypesError::InvalidContainer(format!(
                    "np.ndarray series must be 1D or 2D, got {}D",
                    a.ndim()
                )))
            }
            Container::PdMultiIndex(f) if f.instance_levels().len() != 1 => {
                Err(DatatypesError::InvalidContainer(format!(
                    "pd-multiindex needs exactly one instance level, got {}",
                    f.instance_levels().len()
                )))
            }
            Container::PdMultiIndexHier(f) if f.instance_levels().len() < 2 => {
                Err(DatatypesError::InvalidContainer(
                    "pd_multiindex_hier needs at least two instance levels".to_string(),
                ))
            }
            Container::KeyedDfList(k) if k.levels().len() < 2 => {
                Err(DatatypesError::InvalidContainer(
                    "df-list-hier needs at least two hierarchy levels".to_string(),
                ))
            }
            Container::NestedUniv(df) => {
                for col in df.get_columns() {
                    if !matches!(col.dtype(), DataType::List(_)) {
                        return Err(DatatypesError::InvalidContainer(format!(
                            "nested_univ column '{}' holds {} instead of sequences",
                            col.name(),
                            col.dtype()
                        )));
                    }
                }
                Ok(())
            }
            Container::PdMultiIndex(f) | Container::PdMultiIndexHier(f) => {
                f.instance_runs().map(|_| ())
            }
            _ => Ok(()),
        }
    }
}

impl From<Array3<f64>> for Container {
    fn from(a: Array3<f64>) -> Self {
        Container::Numpy3D(a)
    }
}

/// A 2D array given as X to a panel estimator is instances x time
impl From<Array2<f64>> for Container {
    fn from(a: Array2<f64>) -> Self {
        Container::Numpy2D(a)
    }
}

impl From<Vec<DataFrame>> for Container {
    fn from(frames: Vec<DataFrame>) -> Self {
        Container::DfList(Indexed::new(frames))
    }
}

/// Render an index column as strings, one per row
pub(crate) fn column_as_strings(col: &Column) -> Result<Vec<String>> {
    let casted = col.cast(&DataType::String)?;
    let ca = casted.as_materialized_series().str()?;
    ca.into_iter()
        .map(|v| {
            v.map(|s| s.to_string()).ok_or_else(|| {
                DatatypesError::InvalidContainer(format!("index level '{}' has nulls", col.name()))
            })
        })
        .collect()
}

/// Float values of a numeric series; nulls become NaN
pub(crate) fn series_to_f64(series: &Series) -> Result<Vec<f64>> {
    let kind = classify_dtype(series.name(), series.dtype())?;
    if !matches!(kind, DtypeKind::Float | DtypeKind::Int | DtypeKind::UInt) {
        return Err(DatatypesError::Conversion(format!(
            "column '{}' of dtype {} cannot be stored in a float array",
            series.name(),
            series.dtype()
        )));
    }
    let casted = series.cast(&DataType::Float64)?;
    let ca = casted.f64()?;
    Ok(ca.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

/// Whether a series holds nulls or, for float storage, NaNs
pub(crate) fn series_has_missing(series: &Series) -> Result<bool> {
    if series.null_count() > 0 {
        return Ok(true);
    }
    if matches!(series.dtype(), DataType::Float32 | DataType::Float64) {
        let casted = series.cast(&DataType::Float64)?;
        let ca = casted.f64()?;
        return Ok(ca.into_iter().any(|v| v.is_some_and(f64::is_nan)));
    }
    Ok(false)
}

/// Whether any column of a table holds missing values
pub(crate) fn frame_has_missing(df: &DataFrame) -> Result<bool> {
    for col in df.get_columns() {
        if series_has_missing(col.as_materialized_series())? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Sequence held by one cell of a nested frame
pub(crate) fn nested_cell(col: &Column, row: usize) -> Result<Series> {
    let ca = col.as_materialized_series().list()?;
    ca.get_as_series(row).ok_or_else(|| {
        DatatypesError::InvalidContainer(format!(
            "nested_univ column '{}' has no sequence in row {}",
            col.name(),
            row
        ))
    })
}
