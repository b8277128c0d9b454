//! Random panel data for tests and benchmarks

use crate::datatypes::{convert, Container, Representation, Scitype};
use crate::error::{DatatypesError, Result};
use ndarray::{Array1, Array3};
use rand::prelude::*;

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn random_cube(
    n_instances: usize,
    n_columns: usize,
    n_timepoints: usize,
    rng: &mut StdRng,
) -> Array3<f64> {
    Array3::from_shape_simple_fn((n_instances, n_columns, n_timepoints), || {
        rng.gen_range(-1.0..1.0)
    })
}

fn panel_in(cube: Array3<f64>, representation: Representation) -> Result<Container> {
    if representation.scitype() != Scitype::Panel {
        return Err(DatatypesError::UnsupportedMtype {
            mtype: representation.to_string(),
            scitype: Scitype::Panel.to_string(),
        });
    }
    convert(&Container::Numpy3D(cube), representation)
}

/// Equal-length panel of uniform noise in the requested representation
pub fn make_panel(
    n_instances: usize,
    n_columns: usize,
    n_timepoints: usize,
    representation: Representation,
    seed: Option<u64>,
) -> Result<Container> {
    let mut rng = rng_from(seed);
    panel_in(
        random_cube(n_instances, n_columns, n_timepoints, &mut rng),
        representation,
    )
}

/// Random regression targets
pub fn make_regression_y(n_instances: usize, seed: Option<u64>) -> Array1<f64> {
    let mut rng = rng_from(seed);
    Array1::from_shape_simple_fn(n_instances, || rng.gen_range(0.0..10.0))
}

/// Panel X with targets equal to each instance's mean value
pub fn make_regression_problem(
    n_instances: usize,
    n_columns: usize,
    n_timepoints: usize,
    representation: Representation,
    seed: Option<u64>,
) -> Result<(Container, Array1<f64>)> {
    let mut rng = rng_from(seed);
    let cube = random_cube(n_instances, n_columns, n_timepoints, &mut rng);
    let y = cube
        .outer_iter()
        .map(|instance| instance.mean().unwrap_or(0.0))
        .collect::<Array1<f64>>();
    Ok((panel_in(cube, representation)?, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::x_metadata;
    use ndarray::Axis;

    #[test]
    fn test_make_panel_shapes() {
        for repr in Representation::of_scitype(Scitype::Panel) {
            let n_columns = if repr.is_numeric_array() && repr != Representation::Numpy3D {
                1
            } else {
                2
            };
            let x = make_panel(4, n_columns, 6, repr, Some(1)).unwrap();
            assert_eq!(x.representation(), repr);
            let meta = x_metadata(&x).unwrap();
            assert_eq!(meta.n_instances, 4);
            assert_eq!(meta.n_timepoints, Some(6));
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        assert_eq!(make_regression_y(5, Some(3)), make_regression_y(5, Some(3)));
    }

    #[test]
    fn test_series_representation_rejected() {
        assert!(make_panel(2, 1, 3, Representation::PdSeries, None).is_err());
    }

    #[test]
    fn test_regression_problem_targets() {
        let (x, y) = make_regression_problem(3, 1, 4, Representation::Numpy3D, Some(0)).unwrap();
        match x {
            Container::Numpy3D(cube) => {
                let first = cube.index_axis(Axis(0), 0).mean().unwrap();
                assert!((y[0] - first).abs() < 1e-12);
            }
            other => panic!("unexpected {:?}", other.representation()),
        }
    }
}
