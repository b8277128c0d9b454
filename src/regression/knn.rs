//! K-nearest neighbours regression on equal-length panels
//!
//! Each instance is flattened to one vector of `n_columns * n_timepoints`
//! values and compared with Euclidean distance.

use super::base::PanelRegressor;
use super::tags::EstimatorTags;
use crate::datatypes::{Container, Representation};
use crate::error::{DatatypesError, Result};
use ndarray::{Array1, Array2, Array3, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Weighting scheme for neighbours
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WeightScheme {
    /// All neighbours have equal weight
    Uniform,
    /// Closer neighbours have more weight (inverse distance)
    Distance,
}

impl Default for WeightScheme {
    fn default() -> Self {
        Self::Uniform
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnConfig {
    pub n_neighbors: usize,
    pub weights: WeightScheme,
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self {
            n_neighbors: 1,
            weights: WeightScheme::Uniform,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNeighborsTimeSeriesRegressor {
    config: KnnConfig,
    x_train: Option<Array2<f64>>,
    y_train: Option<Array1<f64>>,
    instance_shape: Option<(usize, usize)>,
    threads: usize,
}

impl KNeighborsTimeSeriesRegressor {
    pub fn new(config: KnnConfig) -> Self {
        Self {
            config,
            x_train: None,
            y_train: None,
            instance_shape: None,
            threads: 1,
        }
    }

    /// Create with default config and specified k
    pub fn with_k(k: usize) -> Self {
        Self::new(KnnConfig {
            n_neighbors: k,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &KnnConfig {
        &self.config
    }

    pub fn threads(&self) -> usize {
        self.threads
    }
}

impl Default for KNeighborsTimeSeriesRegressor {
    fn default() -> Self {
        Self::new(KnnConfig::default())
    }
}

fn as_cube(x: &Container) -> Result<&Array3<f64>> {
    match x {
        Container::Numpy3D(a) => Ok(a),
        other => Err(DatatypesError::InvalidContainer(format!(
            "expected numpy3D, got {}",
            other.representation()
        ))),
    }
}

/// One row per instance, columns then timepoints
fn flatten(cube: &Array3<f64>) -> Result<Array2<f64>> {
    let (n, v, m) = cube.dim();
    Ok(Array2::from_shape_vec((n, v * m), cube.iter().copied().collect())?)
}

/// Max-heap entry keeping the k smallest distances
#[derive(PartialEq)]
struct DistLabel(f64, f64);

impl Eq for DistLabel {}
impl PartialOrd for DistLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for DistLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

fn euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(ai, bi)| {
            let d = ai - bi;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// (distance, target) of the k training instances nearest to `point`
fn find_k_nearest(
    point: ArrayView1<f64>,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    k: usize,
) -> Vec<(f64, f64)> {
    let mut heap = BinaryHeap::with_capacity(k + 1);
    for (row, &target) in x_train.rows().into_iter().zip(y_train.iter()) {
        let dist = euclidean(point, row);
        if heap.len() < k {
            heap.push(DistLabel(dist, target));
        } else if let Some(top) = heap.peek() {
            if dist < top.0 {
                heap.pop();
                heap.push(DistLabel(dist, target));
            }
        }
    }
    heap.into_iter().map(|dl| (dl.0, dl.1)).collect()
}

fn weighted_mean_from(neighbors: &[(f64, f64)], weights: WeightScheme) -> f64 {
    let (sum, total) = neighbors
        .iter()
        .fold((0.0, 0.0), |(sum, total), &(dist, target)| {
            let weight = match weights {
                WeightScheme::Uniform => 1.0,
                WeightScheme::Distance => 1.0 / (dist + 1e-10),
            };
            (sum + weight * target, total + weight)
        });
    if total > 0.0 {
        sum / total
    } else {
        f64::NAN
    }
}

impl PanelRegressor for KNeighborsTimeSeriesRegressor {
    fn name(&self) -> &str {
        "KNeighborsTimeSeriesRegressor"
    }

    fn tags(&self) -> EstimatorTags {
        EstimatorTags {
            multivariate: true,
            multithreading: true,
            x_inner_mtype: Representation::Numpy3D,
            ..EstimatorTags::default()
        }
    }

    fn fit_inner(&mut self, x: &Container, y: &Array1<f64>) -> Result<()> {
        if self.config.n_neighbors == 0 {
            return Err(DatatypesError::Config(
                "n_neighbors must be at least 1".to_string(),
            ));
        }
        let cube = as_cube(x)?;
        let (_, v, m) = cube.dim();
        self.x_train = Some(flatten(cube)?);
        self.y_train = Some(y.clone());
        self.instance_shape = Some((v, m));
        Ok(())
    }

    /// Predict targets (parallelized over test instances)
    fn predict_inner(&self, x: &Container) -> Result<Array1<f64>> {
        let (x_train, y_train) = match (&self.x_train, &self.y_train) {
            (Some(x), Some(y)) => (x, y),
            _ => return Err(DatatypesError::ModelNotFitted),
        };
        let cube = as_cube(x)?;
        let (_, v, m) = cube.dim();
        if self.instance_shape != Some((v, m)) {
            return Err(DatatypesError::Shape {
                expected: format!("{:?} per instance", self.instance_shape),
                actual: format!("{:?} per instance", (v, m)),
            });
        }
        let queries = flatten(cube)?;
        let k = self.config.n_neighbors;
        let weights = self.config.weights;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()
            .map_err(|e| DatatypesError::Config(e.to_string()))?;
        let predictions: Vec<f64> = pool.install(|| {
            (0..queries.nrows())
                .into_par_iter()
                .map(|i| {
                    let neighbors = find_k_nearest(queries.row(i), x_train, y_train, k);
                    weighted_mean_from(&neighbors, weights)
                })
                .collect()
        });
        Ok(Array1::from_vec(predictions))
    }

    fn set_threads(&mut self, threads: usize) {
        self.threads = threads.max(1);
    }

    fn clone_box(&self) -> Box<dyn PanelRegressor> {
        Box::new(self.clone())
    }
}
