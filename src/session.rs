// The loaded dataset and its trained model, owned by whoever drives the recommender.
use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;

use crate::analyze::{self, ClusterStats};
use crate::config::RecommenderConfig;
use crate::error::{RecommenderError, Result};
use crate::io::{self, GameRecord};
use crate::model::{ClusterAssignment, ClusterModel};
use crate::preprocess::{self, FeatureMatrix};
use crate::recommend::{self, Recommendation};

/// One loaded dataset. The feature matrix is built on load; the cluster
/// assignment exists only after [`Session::train`].
#[derive(Debug, Clone)]
pub struct Session {
    config: RecommenderConfig,
    records: Vec<GameRecord>,
    matrix: FeatureMatrix,
    assignment: Option<ClusterAssignment>,
}

impl Session {
    /// Load a CSV and build its feature matrix.
    pub fn load<P: AsRef<Path>>(path: P, config: RecommenderConfig) -> Result<Self> {
        let records = io::load_csv(path)?;
        Self::from_records(records, config)
    }

    pub fn from_records(records: Vec<GameRecord>, config: RecommenderConfig) -> Result<Self> {
        config.validate()?;
        let matrix = preprocess::build(&records)?;
        Ok(Session {
            config,
            records,
            matrix,
            assignment: None,
        })
    }

    /// Cluster the dataset into `k` groups, replacing any previous model.
    pub fn train(&mut self, k: usize) -> Result<&ClusterAssignment> {
        let model = ClusterModel::from_config(&self.config);
        let assignment = model.train(&self.matrix, k)?;
        let assignment = self.assignment.insert(assignment);
        Ok(&*assignment)
    }

    pub fn recommend(&self, title: &str, top_n: usize) -> Result<Vec<Recommendation>> {
        let assignment = self.trained()?;
        let recs = recommend::recommend(
            title,
            &self.matrix,
            assignment,
            &self.records,
            top_n,
            self.config.score_precision,
        )?;
        info!("{} recommendation(s) for '{}'", recs.len(), title);
        Ok(recs)
    }

    pub fn analyze(&self) -> Result<BTreeMap<usize, ClusterStats>> {
        let assignment = self.trained()?;
        analyze::analyze(&self.records, assignment, assignment.k())
    }

    /// The game a query would anchor on.
    pub fn find_game(&self, title: &str) -> Result<&GameRecord> {
        let idx = recommend::find_anchor(&self.records, title)?;
        Ok(&self.records[idx])
    }

    /// Write the dataset with a `Cluster` column.
    pub fn export<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let assignment = self.trained()?;
        io::write_annotated_csv(&self.records, assignment.labels(), path)
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    pub fn records(&self) -> &[GameRecord] {
        &self.records
    }

    pub fn matrix(&self) -> &FeatureMatrix {
        &self.matrix
    }

    pub fn assignment(&self) -> Option<&ClusterAssignment> {
        self.assignment.as_ref()
    }

    fn trained(&self) -> Result<&ClusterAssignment> {
        self.assignment
            .as_ref()
            .ok_or(RecommenderError::ModelNotTrained)
    }
}
