//! Game recommendations from scraped review data.
//!
//! A dataset is loaded into a [`Session`], which builds the feature matrix
//! (standardized scores and release year, multi-hot genres and platforms).
//! [`Session::train`] clusters it with k-means, after which
//! [`Session::recommend`] ranks the games in a title's cluster by cosine
//! similarity and [`Session::analyze`] summarizes each cluster.

pub mod analyze;
pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod preprocess;
pub mod recommend;
pub mod session;
pub mod source;

pub use config::RecommenderConfig;
pub use error::{RecommenderError, Result};
pub use session::Session;
