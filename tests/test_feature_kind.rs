//! Integration test: dtype kind and feature kind inference across representations

use kolosal_datatypes::datatypes::{
    convert, dtype_kinds, feature_kinds, panel_dtype_kinds, series_dtype_kinds, x_metadata,
    Container, DtypeKind, FeatureKind, KeyedFrames, MultiIndexFrame, Representation,
};
use kolosal_datatypes::DatatypesError;
use polars::prelude::*;

fn instance(text: &[&str], numbers: &[f64]) -> DataFrame {
    df!(
        "var_0" => text,
        "var_1" => numbers,
    )
    .unwrap()
}

fn as_df_list() -> Container {
    Container::from(vec![
        instance(&["a", "b", "c"], &[1.0, 2.0, 3.0]),
        instance(&["d", "e", "f"], &[4.0, 5.0, 6.0]),
    ])
}

fn as_multiindex() -> Container {
    let data = df!(
        "instances" => &[0i64, 0, 0, 1, 1, 1],
        "timepoints" => &[0i64, 1, 2, 0, 1, 2],
        "var_0" => &["a", "b", "c", "d", "e", "f"],
        "var_1" => &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
    )
    .unwrap();
    let frame = MultiIndexFrame::new(data, vec!["instances".to_string()], "timepoints").unwrap();
    Container::multiindex(frame)
}

fn as_nested() -> Container {
    let text = Series::new(
        "var_0".into(),
        vec![
            Series::new("".into(), &["a", "b", "c"]),
            Series::new("".into(), &["d", "e", "f"]),
        ],
    );
    let numbers = Series::new(
        "var_1".into(),
        vec![
            Series::new("".into(), &[1.0, 2.0, 3.0]),
            Series::new("".into(), &[4.0, 5.0, 6.0]),
        ],
    );
    Container::NestedUniv(DataFrame::new(vec![text.into(), numbers.into()]).unwrap().into())
}

#[test]
fn test_feature_kind_is_representation_invariant() {
    let expected = vec![FeatureKind::Categorical, FeatureKind::Float];
    for x in [as_df_list(), as_multiindex(), as_nested()] {
        let kinds = panel_dtype_kinds(&x).unwrap();
        assert_eq!(kinds, vec![DtypeKind::String, DtypeKind::Float], "{}", x.representation());
        assert_eq!(feature_kinds(&kinds), expected, "{}", x.representation());
    }
}

#[test]
fn test_feature_kind_survives_conversion() {
    let x = as_df_list();
    for target in [Representation::PdMultiIndex, Representation::NestedUniv] {
        let converted = convert(&x, target).unwrap();
        assert_eq!(converted.representation(), target);
        assert_eq!(
            feature_kinds(&dtype_kinds(&converted).unwrap()),
            vec![FeatureKind::Categorical, FeatureKind::Float]
        );
    }
}

#[test]
fn test_series_frame_kinds() {
    let stamps = Series::new("stamp".into(), &[0i64, 86_400_000])
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .unwrap();
    let mut df = df!(
        "signed" => &[1i64, -2],
        "unsigned" => &[1u32, 2],
        "flag" => &[true, false],
    )
    .unwrap();
    df.with_column(stamps).unwrap();

    let kinds = series_dtype_kinds(&Container::PdDataFrame(df)).unwrap();
    assert_eq!(
        kinds,
        vec![DtypeKind::Int, DtypeKind::UInt, DtypeKind::Bool, DtypeKind::Datetime]
    );
    let codes: Vec<u8> = kinds.iter().map(|k| k.code()).collect();
    assert_eq!(codes, vec![0, 1, 20, 22]);
    assert_eq!(
        feature_kinds(&kinds),
        vec![
            FeatureKind::Float,
            FeatureKind::Float,
            FeatureKind::Categorical,
            FeatureKind::Categorical,
        ]
    );
}

#[test]
fn test_categorical_dtype_column() {
    let colour = Series::new("colour".into(), &["red", "blue", "red"])
        .cast(&DataType::Categorical(None, Default::default()))
        .unwrap();
    let kinds = series_dtype_kinds(&Container::PdSeries(colour)).unwrap();
    assert_eq!(kinds, vec![DtypeKind::Categorical]);
}

#[test]
fn test_hierarchical_kinds() {
    let frames = vec![
        (
            vec!["store_a".to_string(), "apples".to_string()],
            df!("sales" => &[3i64, 4], "promo" => &[true, false]).unwrap(),
        ),
        (
            vec!["store_b".to_string(), "pears".to_string()],
            df!("sales" => &[1i64, 0], "promo" => &[false, false]).unwrap(),
        ),
    ];
    let keyed =
        KeyedFrames::new(vec!["store".to_string(), "product".to_string()], frames).unwrap();
    let x = Container::KeyedDfList(keyed);
    assert_eq!(
        feature_kinds(&dtype_kinds(&x).unwrap()),
        vec![FeatureKind::Float, FeatureKind::Categorical]
    );

    let hier = convert(&x, Representation::PdMultiIndexHier).unwrap();
    assert_eq!(dtype_kinds(&hier).unwrap(), vec![DtypeKind::Int, DtypeKind::Bool]);
}

#[test]
fn test_metadata_reports_categorical_features() {
    let meta = x_metadata(&as_multiindex()).unwrap();
    assert_eq!(meta.n_instances, 2);
    assert_eq!(meta.n_features, 2);
    assert!(meta.has_categorical());
    assert_eq!(meta.n_timepoints, Some(3));
}

#[test]
fn test_wrong_scitype_for_classifier() {
    let err = series_dtype_kinds(&as_df_list()).unwrap_err();
    assert!(matches!(err, DatatypesError::UnsupportedMtype { .. }));
}

#[test]
fn test_empty_inputs_give_empty_kinds() {
    assert!(panel_dtype_kinds(&Container::DfList(Default::default())).unwrap().is_empty());
    assert!(feature_kinds(&[]).is_empty());
}
