//! Pairwise conversion between representations of the same scitype
//!
//! Converters are looked up by `(source, target)` representation pair. The
//! default registry holds a set of direct converters; every other pair within a
//! scitype is filled by chaining registered converters along the shortest path,
//! and the registry is validated for completeness when it is built.

use super::container::{
    nested_cell, series_to_f64, Container, Indexed, KeyedFrames, MultiIndexFrame, PanelIndex,
};
use super::mtype::Representation;
use crate::error::{DatatypesError, Result};
use ndarray::{s, Array1, Array2, Array3, Axis, Ix2};
use polars::prelude::*;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Instance level name used when building a multi-index frame
pub const INSTANCE_LEVEL: &str = "instances";
/// Time level name used when building a multi-index frame
pub const TIME_LEVEL: &str = "timepoints";

/// A conversion from one representation into another
pub type ConvertFn = Arc<dyn Fn(&Container) -> Result<Container> + Send + Sync>;

macro_rules! payload {
    ($x:expr, $variant:path) => {
        match $x {
            $variant(inner) => inner,
            other => {
                return Err(DatatypesError::Conversion(format!(
                    "converter for {} received {}",
                    stringify!($variant),
                    other.representation()
                )))
            }
        }
    };
}

/// Lookup table of converters keyed by representation pair
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    converters: HashMap<(Representation, Representation), ConvertFn>,
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("pairs", &self.pairs())
            .finish()
    }
}

impl ConverterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in converters, chained to cover every pair
    pub fn with_default_converters() -> Result<Self> {
        let mut registry = Self::new();

        // Series
        registry.register(Representation::NpArray, Representation::PdDataFrame, np_array_to_frame);
        registry.register(Representation::PdDataFrame, Representation::NpArray, frame_to_np_array);
        registry.register(Representation::PdSeries, Representation::PdDataFrame, series_to_frame);
        registry.register(Representation::PdDataFrame, Representation::PdSeries, frame_to_series);

        // Panel
        registry.register(Representation::Numpy3D, Representation::DfList, numpy3d_to_df_list);
        registry.register(Representation::DfList, Representation::Numpy3D, df_list_to_numpy3d);
        registry.register(Representation::Numpy3D, Representation::Numpy2D, numpy3d_to_numpy2d);
        registry.register(Representation::Numpy2D, Representation::Numpy3D, numpy2d_to_numpy3d);
        registry.register(Representation::Numpy3D, Representation::NumpyFlat, numpy3d_to_flat);
        registry.register(Representation::NumpyFlat, Representation::Numpy3D, flat_to_numpy3d);
        registry.register(Representation::DfList, Representation::PdMultiIndex, df_list_to_multiindex);
        registry.register(Representation::PdMultiIndex, Representation::DfList, multiindex_to_df_list);
        registry.register(Representation::DfList, Representation::NestedUniv, df_list_to_nested);
        registry.register(Representation::NestedUniv, Representation::DfList, nested_to_df_list);

        // Hierarchical
        registry.register(Representation::PdMultiIndexHier, Representation::KeyedDfList, hier_to_keyed);
        registry.register(Representation::KeyedDfList, Representation::PdMultiIndexHier, keyed_to_hier);

        registry.fill_chains();
        registry.validate()?;
        Ok(registry)
    }

    /// Register (or replace) the converter for one pair
    pub fn register<F>(&mut self, from: Representation, to: Representation, converter: F)
    where
        F: Fn(&Container) -> Result<Container> + Send + Sync + 'static,
    {
        self.converters.insert((from, to), Arc::new(converter));
    }

    pub fn get(&self, from: Representation, to: Representation) -> Option<&ConvertFn> {
        self.converters.get(&(from, to))
    }

    /// Registered pairs, sorted
    pub fn pairs(&self) -> Vec<(Representation, Representation)> {
        let mut pairs: Vec<_> = self.converters.keys().copied().collect();
        pairs.sort();
        pairs
    }

    /// Check that every ordered pair within each scitype has a converter
    pub fn validate(&self) -> Result<()> {
        for from in Representation::ALL {
            for to in Representation::of_scitype(from.scitype()) {
                if from != to && self.get(from, to).is_none() {
                    return Err(DatatypesError::MissingConverter {
                        from: from.to_string(),
                        to: to.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Fill missing same-scitype pairs by chaining registered converters
    fn fill_chains(&mut self) {
        let direct = self.converters.clone();
        for from in Representation::ALL {
            for to in Representation::of_scitype(from.scitype()) {
                if from == to || self.converters.contains_key(&(from, to)) {
                    continue;
                }
                if let Some(path) = shortest_path(&direct, from, to) {
                    let steps: Vec<ConvertFn> = path
                        .windows(2)
                        .filter_map(|w| direct.get(&(w[0], w[1])).cloned())
                        .collect();
                    self.converters.insert(
                        (from, to),
                        Arc::new(move |x: &Container| {
                            let mut current = x.clone();
                            for step in &steps {
                                current = step(&current)?;
                            }
                            Ok(current)
                        }),
                    );
                }
            }
        }
    }

    /// Convert `x` into `to`
    pub fn convert(&self, x: &Container, to: Representation) -> Result<Container> {
        let from = x.representation();
        if from == to {
            return Ok(x.clone());
        }
        let converter = self
            .get(from, to)
            .ok_or_else(|| DatatypesError::MissingConverter {
                from: from.to_string(),
                to: to.to_string(),
            })?;
        debug!(from = %from, to = %to, "Converting container");
        let converted = converter(x)?;
        if converted.representation() != to {
            return Err(DatatypesError::Conversion(format!(
                "converter {} -> {} produced {}",
                from,
                to,
                converted.representation()
            )));
        }
        Ok(converted)
    }
}

fn shortest_path(
    edges: &HashMap<(Representation, Representation), ConvertFn>,
    from: Representation,
    to: Representation,
) -> Option<Vec<Representation>> {
    let mut previous: HashMap<Representation, Representation> = HashMap::new();
    let mut queue = VecDeque::from([from]);
    while let Some(node) = queue.pop_front() {
        if node == to {
            let mut path = vec![to];
            let mut cursor = to;
            while let Some(&prev) = previous.get(&cursor) {
                path.push(prev);
                cursor = prev;
            }
            path.reverse();
            return Some(path);
        }
        for next in Representation::ALL {
            if next != from && !previous.contains_key(&next) && edges.contains_key(&(node, next)) {
                previous.insert(next, node);
                queue.push_back(next);
            }
        }
    }
    None
}

static DEFAULT_REGISTRY: OnceLock<std::result::Result<ConverterRegistry, String>> = OnceLock::new();

/// Shared registry with the built-in converters
pub fn default_registry() -> Result<&'static ConverterRegistry> {
    DEFAULT_REGISTRY
        .get_or_init(|| ConverterRegistry::with_default_converters().map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| DatatypesError::Config(e.clone()))
}

/// Convert with the default registry
pub fn convert(x: &Container, to: Representation) -> Result<Container> {
    default_registry()?.convert(x, to)
}

/// Convert with a caller-supplied registry
pub fn convert_with(
    registry: &ConverterRegistry,
    x: &Container,
    to: Representation,
) -> Result<Container> {
    registry.convert(x, to)
}

fn var_name(j: usize) -> String {
    format!("var_{}", j)
}

fn frame_to_matrix(df: &DataFrame) -> Result<Array2<f64>> {
    let mut out = Array2::<f64>::zeros((df.height(), df.width()));
    for (j, col) in df.get_columns().iter().enumerate() {
        let values = series_to_f64(col.as_materialized_series())?;
        out.column_mut(j).assign(&Array1::from(values));
    }
    Ok(out)
}

fn matrix_to_frame(matrix: &Array2<f64>) -> Result<DataFrame> {
    let columns: Vec<Column> = matrix
        .columns()
        .into_iter()
        .enumerate()
        .map(|(j, values)| Series::new(var_name(j).into(), values.to_vec()).into())
        .collect();
    Ok(DataFrame::new(columns)?)
}

fn np_array_to_frame(x: &Container) -> Result<Container> {
    let a = payload!(x, Container::NpArray);
    let matrix = match a.ndim() {
        1 => a.clone().into_shape_with_order((a.len(), 1))?,
        2 => a.clone().into_dimensionality::<Ix2>()?,
        d => {
            return Err(DatatypesError::InvalidContainer(format!(
                "np.ndarray series must be 1D or 2D, got {}D",
                d
            )))
        }
    };
    Ok(Container::PdDataFrame(matrix_to_frame(&matrix)?))
}

fn frame_to_np_array(x: &Container) -> Result<Container> {
    let df = payload!(x, Container::PdDataFrame);
    Ok(Container::NpArray(frame_to_matrix(df)?.into_dyn()))
}

fn series_to_frame(x: &Container) -> Result<Container> {
    let s = payload!(x, Container::PdSeries);
    Ok(Container::PdDataFrame(DataFrame::new(vec![s.clone().into()])?))
}

fn frame_to_series(x: &Container) -> Result<Container> {
    let df = payload!(x, Container::PdDataFrame);
    match df.get_columns() {
        [only] => Ok(Container::PdSeries(only.as_materialized_series().clone())),
        cols => Err(DatatypesError::Conversion(format!(
            "pd.Series holds a single column, frame has {}",
            cols.len()
        ))),
    }
}

fn numpy3d_to_df_list(x: &Container) -> Result<Container> {
    let cube = payload!(x, Container::Numpy3D);
    let (n, v, _) = cube.dim();
    let frames = (0..n)
        .map(|i| {
            let columns: Vec<Column> = (0..v)
                .map(|j| Series::new(var_name(j).into(), cube.slice(s![i, j, ..]).to_vec()).into())
                .collect();
            Ok(DataFrame::new(columns)?)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Container::DfList(Indexed::new(frames)))
}

fn df_list_to_numpy3d(x: &Container) -> Result<Container> {
    let frames = payload!(x, Container::DfList);
    let (n_vars, n_time) = frames
        .first()
        .map(|df| (df.width(), df.height()))
        .unwrap_or((0, 0));
    let mut cube = Array3::<f64>::zeros((frames.len(), n_vars, n_time));
    for (i, df) in frames.iter().enumerate() {
        if df.width() != n_vars || df.height() != n_time {
            return Err(DatatypesError::Conversion(format!(
                "numpy3D requires equal length instances with equal variables; instance {} is {}x{}, expected {}x{}",
                i,
                df.height(),
                df.width(),
                n_time,
                n_vars
            )));
        }
        let matrix = frame_to_matrix(df)?;
        cube.index_axis_mut(Axis(0), i).assign(&matrix.t());
    }
    Ok(Container::Numpy3D(cube))
}

fn numpy3d_to_numpy2d(x: &Container) -> Result<Container> {
    let cube = payload!(x, Container::Numpy3D);
    if cube.dim().1 != 1 {
        return Err(DatatypesError::Conversion(format!(
            "numpy2D holds univariate panels only, got {} variables",
            cube.dim().1
        )));
    }
    Ok(Container::Numpy2D(cube.index_axis(Axis(1), 0).to_owned()))
}

fn numpy2d_to_numpy3d(x: &Container) -> Result<Container> {
    let a = payload!(x, Container::Numpy2D);
    Ok(Container::Numpy3D(a.clone().insert_axis(Axis(1))))
}

fn numpy3d_to_flat(x: &Container) -> Result<Container> {
    let cube = payload!(x, Container::Numpy3D);
    let (n, v, m) = cube.dim();
    let flat = Array2::from_shape_vec((n, v * m), cube.iter().copied().collect())?;
    Ok(Container::NumpyFlat(flat))
}

fn flat_to_numpy3d(x: &Container) -> Result<Container> {
    let a = payload!(x, Container::NumpyFlat);
    Ok(Container::Numpy3D(a.clone().insert_axis(Axis(1))))
}

fn default_time(len: usize) -> Series {
    Series::new(TIME_LEVEL.into(), (0..len as i64).collect::<Vec<_>>())
}

fn long_part(levels: Vec<Column>, df: &DataFrame) -> Result<DataFrame> {
    let mut columns = levels;
    columns.extend(df.get_columns().iter().cloned());
    Ok(DataFrame::new(columns)?)
}

fn stack(parts: Vec<DataFrame>, empty: impl FnOnce() -> Result<DataFrame>) -> Result<DataFrame> {
    let mut parts = parts.into_iter();
    match parts.next() {
        Some(first) => {
            let mut acc = first;
            for part in parts {
                acc.vstack_mut(&part)?;
            }
            Ok(acc)
        }
        None => empty(),
    }
}

/// Typed key and time values of each instance run of a multi-index frame
fn run_index(frame: &MultiIndexFrame, runs: &[(Vec<String>, usize, usize)]) -> Result<PanelIndex> {
    let data = frame.data();
    let keys = frame
        .instance_levels()
        .iter()
        .map(|level| {
            let col = data.column(level)?.as_materialized_series();
            let mut keys = col.clear();
            for (_, offset, _) in runs {
                keys.append(&col.slice(*offset as i64, 1))?;
            }
            Ok(keys)
        })
        .collect::<Result<Vec<_>>>()?;
    let time = data.column(frame.time_level())?.as_materialized_series();
    let times = runs
        .iter()
        .map(|(_, offset, len)| time.slice(*offset as i64, *len))
        .collect();
    PanelIndex::new(keys, frame.time_level(), times)
}

fn df_list_to_multiindex(x: &Container) -> Result<Container> {
    let frames = payload!(x, Container::DfList);
    let parts = frames
        .iter()
        .enumerate()
        .map(|(i, df)| {
            let levels = match frames.index() {
                Some(index) => index.level_columns(i, df.height())?,
                None => vec![
                    Series::new(INSTANCE_LEVEL.into(), vec![i as i64; df.height()]).into(),
                    default_time(df.height()).into(),
                ],
            };
            long_part(levels, df)
        })
        .collect::<Result<Vec<_>>>()?;
    let data = stack(parts, || {
        let columns = match frames.index() {
            Some(index) => index.empty_columns(),
            None => vec![
                Series::new(INSTANCE_LEVEL.into(), Vec::<i64>::new()).into(),
                default_time(0).into(),
            ],
        };
        Ok(DataFrame::new(columns)?)
    })?;
    let frame = match frames.index() {
        Some(index) => MultiIndexFrame::new(data, index.instance_levels(), index.time_level())?,
        None => MultiIndexFrame::new(data, vec![INSTANCE_LEVEL.to_string()], TIME_LEVEL)?,
    };
    Ok(Container::PdMultiIndex(frame))
}

fn multiindex_to_df_list(x: &Container) -> Result<Container> {
    let frame = payload!(x, Container::PdMultiIndex);
    let values = frame.values()?;
    let runs = frame.instance_runs()?;
    let frames: Vec<DataFrame> = runs
        .iter()
        .map(|(_, offset, len)| values.slice(*offset as i64, *len))
        .collect();
    let index = run_index(frame, &runs)?;
    Ok(Container::DfList(Indexed::new(frames).with_index(index)?))
}

fn df_list_to_nested(x: &Container) -> Result<Container> {
    let frames = payload!(x, Container::DfList);
    let names: Vec<String> = match frames.first() {
        Some(first) => first
            .get_column_names()
            .into_iter()
            .map(|n| n.to_string())
            .collect(),
        None => Vec::new(),
    };
    for (i, df) in frames.iter().enumerate().skip(1) {
        if df.width() != names.len() || names.iter().any(|n| df.column(n).is_err()) {
            return Err(DatatypesError::Conversion(format!(
                "instance {} has columns {:?}, expected {:?}",
                i,
                df.get_column_names(),
                names
            )));
        }
    }
    let columns = names
        .iter()
        .map(|name| {
            let cells = frames
                .iter()
                .map(|df| Ok(df.column(name)?.as_materialized_series().clone()))
                .collect::<Result<Vec<Series>>>()?;
            if let Some(cell) = cells.iter().find(|c| c.dtype() != cells[0].dtype()) {
                return Err(DatatypesError::Conversion(format!(
                    "column '{}' mixes dtypes {} and {} across instances",
                    name,
                    cells[0].dtype(),
                    cell.dtype()
                )));
            }
            Ok(Series::new(name.as_str().into(), cells).into())
        })
        .collect::<Result<Vec<Column>>>()?;
    let nested = Indexed::new(if columns.is_empty() {
        DataFrame::empty()
    } else {
        DataFrame::new(columns)?
    });
    let nested = match frames.index() {
        Some(index) => nested.with_index(index.clone())?,
        None => nested,
    };
    Ok(Container::NestedUniv(nested))
}

fn nested_to_df_list(x: &Container) -> Result<Container> {
    let df = payload!(x, Container::NestedUniv);
    let frames = (0..df.height())
        .map(|row| {
            let columns = df
                .get_columns()
                .iter()
                .map(|col| {
                    let mut cell = nested_cell(col, row)?;
                    cell.rename(col.name().clone());
                    Ok(cell.into())
                })
                .collect::<Result<Vec<Column>>>()?;
            DataFrame::new(columns).map_err(|e| {
                DatatypesError::Conversion(format!("instance {} of nested_univ: {}", row, e))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let frames = Indexed::new(frames);
    let frames = match df.index() {
        Some(index) => frames.with_index(index.clone())?,
        None => frames,
    };
    Ok(Container::DfList(frames))
}

fn hier_to_keyed(x: &Container) -> Result<Container> {
    let frame = payload!(x, Container::PdMultiIndexHier);
    let values = frame.values()?;
    let runs = frame.instance_runs()?;
    let frames = runs
        .iter()
        .map(|(key, offset, len)| (key.clone(), values.slice(*offset as i64, *len)))
        .collect();
    let keyed = KeyedFrames::new(frame.instance_levels().to_vec(), frames)?
        .with_index(run_index(frame, &runs)?)?;
    Ok(Container::KeyedDfList(keyed))
}

fn keyed_to_hier(x: &Container) -> Result<Container> {
    let keyed = payload!(x, Container::KeyedDfList);
    let levels = keyed.levels();
    let parts = keyed
        .frames()
        .iter()
        .enumerate()
        .map(|(i, (key, df))| {
            let level_columns = match keyed.index() {
                Some(index) => index.level_columns(i, df.height())?,
                None => {
                    let mut columns: Vec<Column> = levels
                        .iter()
                        .zip(key)
                        .map(|(level, value)| {
                            Series::new(level.as_str().into(), vec![value.as_str(); df.height()])
                                .into()
                        })
                        .collect();
                    columns.push(default_time(df.height()).into());
                    columns
                }
            };
            long_part(level_columns, df)
        })
        .collect::<Result<Vec<_>>>()?;
    let data = stack(parts, || {
        let columns = match keyed.index() {
            Some(index) => index.empty_columns(),
            None => {
                let mut columns: Vec<Column> = levels
                    .iter()
                    .map(|level| Series::new(level.as_str().into(), Vec::<String>::new()).into())
                    .collect();
                columns.push(default_time(0).into());
                columns
            }
        };
        Ok(DataFrame::new(columns)?)
    })?;
    let time_level = keyed.index().map_or(TIME_LEVEL, |index| index.time_level());
    let frame = MultiIndexFrame::new(data, levels.to_vec(), time_level)?;
    Ok(Container::PdMultiIndexHier(frame))
}
