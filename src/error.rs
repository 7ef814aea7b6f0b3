/// Error taxonomy for loading, training and querying.
#[derive(thiserror::Error, Debug)]
pub enum RecommenderError {
    /// Malformed input or missing required columns.
    #[error("Data error: {0}")]
    Data(String),

    /// Invalid hyperparameters.
    #[error("Config error: {0}")]
    Config(String),

    /// No game title matched the query.
    #[error("No game matching '{0}'")]
    NotFound(String),

    /// `recommend`/`analyze` called before `train`.
    #[error("Model has not been trained yet")]
    ModelNotTrained,

    #[error("Clustering failed: {0}")]
    Clustering(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, RecommenderError>;
