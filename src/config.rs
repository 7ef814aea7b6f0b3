use serde::Deserialize;

use crate::error::{RecommenderError, Result};

/// Runtime configuration, loaded from `GAMEREC_*` environment variables.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RecommenderConfig {
    /// Path of the scraped games CSV
    #[serde(default = "default_data_path")]
    pub data_path: String,

    /// Number of k-means clusters
    #[serde(default = "default_clusters")]
    pub clusters: usize,

    /// Seed for k-means initialization
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of k-means initializations; the lowest-inertia run wins
    #[serde(default = "default_n_runs")]
    pub n_runs: usize,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,

    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Recommendations returned per query
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Decimal places kept on similarity percentages
    #[serde(default = "default_score_precision")]
    pub score_precision: u32,
}

fn default_data_path() -> String {
    "output.csv".to_string()
}

fn default_clusters() -> usize {
    8
}

fn default_seed() -> u64 {
    42
}

fn default_n_runs() -> usize {
    10
}

fn default_max_iterations() -> u64 {
    300
}

fn default_tolerance() -> f64 {
    1e-4
}

fn default_top_n() -> usize {
    5
}

/// Past this many decimals an f64 percentage carries no more digits.
pub const MAX_SCORE_PRECISION: u32 = 15;

fn default_score_precision() -> u32 {
    2
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            clusters: default_clusters(),
            seed: default_seed(),
            n_runs: default_n_runs(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            top_n: default_top_n(),
            score_precision: default_score_precision(),
        }
    }
}

impl RecommenderConfig {
    /// Load configuration from environment variables (and an optional `.env`)
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::prefixed("GAMEREC_")
            .from_env::<RecommenderConfig>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn validate(&self) -> Result<()> {
        if self.clusters == 0 {
            return Err(RecommenderError::Config(
                "number of clusters must be positive".into(),
            ));
        }
        if self.n_runs == 0 {
            return Err(RecommenderError::Config("n_runs must be positive".into()));
        }
        if self.max_iterations == 0 {
            return Err(RecommenderError::Config(
                "max_iterations must be positive".into(),
            ));
        }
        if !(self.tolerance > 0.0) {
            return Err(RecommenderError::Config(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.score_precision > MAX_SCORE_PRECISION {
            return Err(RecommenderError::Config(format!(
                "score_precision must be at most {}, got {}",
                MAX_SCORE_PRECISION, self.score_precision
            )));
        }
        Ok(())
    }
}
