// Cluster games with k-means over the feature matrix.
use std::collections::HashSet;

use linfa::prelude::*;
use linfa::DatasetBase;
use linfa_clustering::KMeans;
use ndarray::{Array1, Array2};
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use tracing::{debug, info};

use crate::config::RecommenderConfig;
use crate::error::{RecommenderError, Result};
use crate::preprocess::FeatureMatrix;

/// Cluster id per game, valid only for the matrix and k it was trained on.
#[derive(Debug, Clone)]
pub struct ClusterAssignment {
    labels: Vec<usize>,
    k: usize,
    centroids: Array2<f64>,
    inertia: f64,
}

impl ClusterAssignment {
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn cluster_of(&self, row: usize) -> Option<usize> {
        self.labels.get(row).copied()
    }

    /// Row indices in `cluster`, in dataset order.
    pub fn members(&self, cluster: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == cluster)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k];
        for &c in &self.labels {
            sizes[c] += 1;
        }
        sizes
    }

    pub fn centroids(&self) -> &Array2<f64> {
        &self.centroids
    }

    /// Within-cluster sum of squared distances.
    pub fn inertia(&self) -> f64 {
        self.inertia
    }
}

/// k-means settings shared by every training run.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterModel {
    pub seed: u64,
    pub n_runs: usize,
    pub max_iterations: u64,
    pub tolerance: f64,
}

impl Default for ClusterModel {
    fn default() -> Self {
        Self::from_config(&RecommenderConfig::default())
    }
}

impl ClusterModel {
    pub fn from_config(cfg: &RecommenderConfig) -> Self {
        ClusterModel {
            seed: cfg.seed,
            n_runs: cfg.n_runs,
            max_iterations: cfg.max_iterations,
            tolerance: cfg.tolerance,
        }
    }

    /// Partition the matrix into `k` clusters. Runs `n_runs` seeded initializations and keeps
    /// the lowest-inertia one, so the same seed, k and matrix always give the same labels.
    pub fn train(&self, matrix: &FeatureMatrix, k: usize) -> Result<ClusterAssignment> {
        if k == 0 {
            return Err(RecommenderError::Config(
                "number of clusters must be positive".into(),
            ));
        }
        let distinct = distinct_rows(matrix.values());
        if k > distinct {
            return Err(RecommenderError::Config(format!(
                "cannot form {} clusters from {} distinct games",
                k, distinct
            )));
        }

        let dataset = DatasetBase::from(matrix.values().clone());
        let rng = Xoshiro256Plus::seed_from_u64(self.seed);
        let model = KMeans::params_with_rng(k, rng)
            .n_runs(self.n_runs)
            .max_n_iterations(self.max_iterations)
            .tolerance(self.tolerance)
            .fit(&dataset)
            .map_err(|e| RecommenderError::Clustering(e.to_string()))?;

        let predicted: Array1<usize> = model.predict(matrix.values());
        let labels = predicted.to_vec();
        let centroids = model.centroids().clone();
        let inertia = within_cluster_ss(matrix.values(), &centroids, &labels);

        let assignment = ClusterAssignment {
            labels,
            k,
            centroids,
            inertia,
        };
        debug!("Cluster sizes: {:?}", assignment.sizes());
        info!(
            "Trained k-means: k={}, seed={}, runs={}, inertia={:.4}",
            k, self.seed, self.n_runs, inertia
        );
        Ok(assignment)
    }
}

fn distinct_rows(values: &Array2<f64>) -> usize {
    values
        .rows()
        .into_iter()
        // +0.0 folds -0.0 into 0.0
        .map(|row| row.iter().map(|v| (v + 0.0).to_bits()).collect::<Vec<u64>>())
        .collect::<HashSet<_>>()
        .len()
}

fn within_cluster_ss(values: &Array2<f64>, centroids: &Array2<f64>, labels: &[usize]) -> f64 {
    labels
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            values
                .row(i)
                .iter()
                .zip(centroids.row(c).iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
        })
        .sum()
}
