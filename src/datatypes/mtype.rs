//! Representation tags (mtypes) and their shape classes

use crate::error::{DatatypesError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shape class of a series collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scitype {
    /// A single series
    Series,
    /// A flat collection of series instances
    Panel,
    /// Instances grouped under one or more hierarchy levels
    Hierarchical,
}

impl fmt::Display for Scitype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scitype::Series => "Series",
            Scitype::Panel => "Panel",
            Scitype::Hierarchical => "Hierarchical",
        };
        f.write_str(name)
    }
}

/// Concrete in-memory representation of series data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Representation {
    /// 1D (time) or 2D (time x variables) float array
    NpArray,
    /// Single named column
    PdSeries,
    /// Table with time rows and variable columns
    PdDataFrame,
    /// instances x variables x time
    Numpy3D,
    /// instances x time, univariate
    Numpy2D,
    /// instances x (variables * time), variables concatenated along the row
    NumpyFlat,
    /// One table per instance
    DfList,
    /// Long table with one instance level and one time level
    PdMultiIndex,
    /// One row per instance, each cell an embedded sequence
    NestedUniv,
    /// Long table with two or more instance levels and one time level
    PdMultiIndexHier,
    /// One table per instance, keyed by its hierarchy path
    KeyedDfList,
}

impl Representation {
    pub const ALL: [Representation; 11] = [
        Representation::NpArray,
        Representation::PdSeries,
        Representation::PdDataFrame,
        Representation::Numpy3D,
        Representation::Numpy2D,
        Representation::NumpyFlat,
        Representation::DfList,
        Representation::PdMultiIndex,
        Representation::NestedUniv,
        Representation::PdMultiIndexHier,
        Representation::KeyedDfList,
    ];

    /// Shape class this representation encodes
    pub fn scitype(&self) -> Scitype {
        match self {
            Representation::NpArray | Representation::PdSeries | Representation::PdDataFrame => {
                Scitype::Series
            }
            Representation::Numpy3D
            | Representation::Numpy2D
            | Representation::NumpyFlat
            | Representation::DfList
            | Representation::PdMultiIndex
            | Representation::NestedUniv => Scitype::Panel,
            Representation::PdMultiIndexHier | Representation::KeyedDfList => {
                Scitype::Hierarchical
            }
        }
    }

    /// Stable string tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Representation::NpArray => "np.ndarray",
            Representation::PdSeries => "pd.Series",
            Representation::PdDataFrame => "pd.DataFrame",
            Representation::Numpy3D => "numpy3D",
            Representation::Numpy2D => "numpy2D",
            Representation::NumpyFlat => "numpyflat",
            Representation::DfList => "df-list",
            Representation::PdMultiIndex => "pd-multiindex",
            Representation::NestedUniv => "nested_univ",
            Representation::PdMultiIndexHier => "pd_multiindex_hier",
            Representation::KeyedDfList => "df-list-hier",
        }
    }

    /// Whether the payload is a plain float array
    pub fn is_numeric_array(&self) -> bool {
        matches!(
            self,
            Representation::NpArray
                | Representation::Numpy3D
                | Representation::Numpy2D
                | Representation::NumpyFlat
        )
    }

    /// All representations of one shape class
    pub fn of_scitype(scitype: Scitype) -> impl Iterator<Item = Representation> {
        Self::ALL.into_iter().filter(move |r| r.scitype() == scitype)
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Representation {
    type Err = DatatypesError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| DatatypesError::Config(format!("unknown mtype: {}", s)))
    }
}

impl From<Representation> for String {
    fn from(repr: Representation) -> String {
        repr.as_str().to_string()
    }
}

impl TryFrom<String> for Representation {
    type Error = DatatypesError;

    fn try_from(tag: String) -> Result<Self> {
        tag.parse()
    }
}
