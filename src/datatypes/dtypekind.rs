//! Dtype kind inference for series, panel and hierarchical containers
//!
//! Every column is classified into a [`DtypeKind`] by inspecting its storage
//! dtype, and the classification can be collapsed into a binary
//! [`FeatureKind`] (categorical-like vs numeric-like) for modeling decisions.

use super::container::Container;
use super::mtype::Scitype;
use crate::error::{DatatypesError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed classification of column storage.
///
/// The integer codes are stable and used for ordering and serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum DtypeKind {
    /// Signed integer
    Int = 0,
    /// Unsigned integer
    UInt = 1,
    /// Floating point
    Float = 2,
    /// Boolean
    Bool = 20,
    /// UTF-8 string
    String = 21,
    /// Datetime
    Datetime = 22,
    /// Categorical
    Categorical = 23,
}

impl DtypeKind {
    pub const ALL: [DtypeKind; 7] = [
        DtypeKind::Int,
        DtypeKind::UInt,
        DtypeKind::Float,
        DtypeKind::Bool,
        DtypeKind::String,
        DtypeKind::Datetime,
        DtypeKind::Categorical,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Coarse kind used for encoding and validation decisions
    pub fn feature_kind(self) -> FeatureKind {
        match self {
            DtypeKind::Categorical | DtypeKind::String | DtypeKind::Bool | DtypeKind::Datetime => {
                FeatureKind::Categorical
            }
            DtypeKind::Float | DtypeKind::Int | DtypeKind::UInt => FeatureKind::Float,
        }
    }
}

impl From<DtypeKind> for u8 {
    fn from(kind: DtypeKind) -> u8 {
        kind.code()
    }
}

impl TryFrom<u8> for DtypeKind {
    type Error = DatatypesError;

    fn try_from(code: u8) -> Result<Self> {
        DtypeKind::ALL
            .into_iter()
            .find(|k| k.code() == code)
            .ok_or_else(|| DatatypesError::Config(format!("unknown dtype kind code: {}", code)))
    }
}

impl fmt::Display for DtypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DtypeKind::Int => "INT",
            DtypeKind::UInt => "UINT",
            DtypeKind::Float => "FLOAT",
            DtypeKind::Bool => "BOOL",
            DtypeKind::String => "STRING",
            DtypeKind::Datetime => "DATETIME",
            DtypeKind::Categorical => "CATEGORICAL",
        };
        f.write_str(name)
    }
}

/// Binary projection of [`DtypeKind`]; `Float` reads as "numeric".
///
/// Codes match the corresponding [`DtypeKind`] members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FeatureKind {
    Float = 2,
    Categorical = 23,
}

impl FeatureKind {
    pub fn is_categorical(&self) -> bool {
        matches!(self, FeatureKind::Categorical)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FeatureKind::Float)
    }
}

impl PartialEq<DtypeKind> for FeatureKind {
    fn eq(&self, other: &DtypeKind) -> bool {
        *self as u8 == other.code()
    }
}

/// Classify one storage dtype.
///
/// Precedence matters: the first matching predicate wins.
pub fn classify_dtype(column: &str, dtype: &DataType) -> Result<DtypeKind> {
    let kind = match dtype {
        DataType::Float32 | DataType::Float64 => DtypeKind::Float,
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => DtypeKind::Int,
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            DtypeKind::UInt
        }
        DataType::Object(..) | DataType::Categorical(..) | DataType::Enum(..) => {
            DtypeKind::Categorical
        }
        DataType::Boolean => DtypeKind::Bool,
        DataType::Datetime(..) | DataType::Date => DtypeKind::Datetime,
        DataType::String => DtypeKind::String,
        other => {
            return Err(DatatypesError::UnclassifiableDtype {
                column: column.to_string(),
                dtype: other.to_string(),
            })
        }
    };
    Ok(kind)
}

/// Classify every column of a table, in column order
pub fn frame_dtype_kinds(df: &DataFrame) -> Result<Vec<DtypeKind>> {
    df.get_columns()
        .iter()
        .map(|col| classify_dtype(col.name(), col.dtype()))
        .collect()
}

/// Dtype kinds of a Series-scitype container
pub fn series_dtype_kinds(x: &Container) -> Result<Vec<DtypeKind>> {
    match x {
        Container::NpArray(a) => match a.ndim() {
            2 => Ok(vec![DtypeKind::Float; a.shape()[1]]),
            _ => Ok(vec![DtypeKind::Float]),
        },
        Container::PdSeries(s) => Ok(vec![classify_dtype(s.name(), s.dtype())?]),
        Container::PdDataFrame(df) => frame_dtype_kinds(df),
        other => Err(unsupported(other, Scitype::Series)),
    }
}

/// Dtype kinds of a Panel or Hierarchical container
pub fn panel_dtype_kinds(x: &Container) -> Result<Vec<DtypeKind>> {
    match x {
        Container::Numpy3D(a) => Ok(vec![DtypeKind::Float; a.shape()[1]]),
        Container::NumpyFlat(_) | Container::Numpy2D(_) => Ok(vec![DtypeKind::Float]),
        // Homogeneity across instances is assumed; only the first table is inspected.
        Container::DfList(frames) => match frames.first() {
            Some(first) => frame_dtype_kinds(first),
            None => Ok(Vec::new()),
        },
        Container::KeyedDfList(keyed) => match keyed.frames().first() {
            Some((_, first)) => frame_dtype_kinds(first),
            None => Ok(Vec::new()),
        },
        Container::PdMultiIndex(frame) | Container::PdMultiIndexHier(frame) => {
            frame_dtype_kinds(&frame.values()?)
        }
        // A list column carries one inner dtype for every row.
        Container::NestedUniv(df) => df
            .get_columns()
            .iter()
            .map(|col| match col.dtype() {
                DataType::List(inner) => classify_dtype(col.name(), inner),
                other => Err(DatatypesError::InvalidContainer(format!(
                    "nested_univ column '{}' holds {} instead of sequences",
                    col.name(),
                    other
                ))),
            })
            .collect(),
        other => Err(unsupported(other, Scitype::Panel)),
    }
}

/// Dtype kinds of any container, dispatching on its scitype
pub fn dtype_kinds(x: &Container) -> Result<Vec<DtypeKind>> {
    match x.scitype() {
        Scitype::Series => series_dtype_kinds(x),
        Scitype::Panel | Scitype::Hierarchical => panel_dtype_kinds(x),
    }
}

/// Collapse dtype kinds into feature kinds, element-wise
pub fn feature_kinds(kinds: &[DtypeKind]) -> Vec<FeatureKind> {
    kinds.iter().map(|k| k.feature_kind()).collect()
}

fn unsupported(x: &Container, scitype: Scitype) -> DatatypesError {
    DatatypesError::UnsupportedMtype {
        mtype: x.representation().to_string(),
        scitype: scitype.to_string(),
    }
}
