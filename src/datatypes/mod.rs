//! Series data representations and dtype inference
//!
//! Provides:
//! - Representation tags (mtypes) grouped by scitype (Series, Panel, Hierarchical)
//! - [`Container`], holding data in any supported representation
//! - Dtype kind classification and its feature kind reduction
//! - X metadata extraction without conversion
//! - A pairwise conversion registry between representations

mod container;
pub mod convert;
pub mod dtypekind;
mod metadata;
mod mtype;

pub use container::{Container, Indexed, KeyedFrames, MultiIndexFrame, PanelIndex};
pub(crate) use container::series_to_f64;
pub use convert::{convert, convert_with, default_registry, ConvertFn, ConverterRegistry};
pub use dtypekind::{
    classify_dtype, dtype_kinds, feature_kinds, frame_dtype_kinds, panel_dtype_kinds,
    series_dtype_kinds, DtypeKind, FeatureKind,
};
pub use metadata::{x_metadata, XMetadata};
pub use mtype::{Representation, Scitype};
