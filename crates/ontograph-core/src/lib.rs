pub mod classify;
pub mod config;
pub mod knowledge;

pub use classify::{Classification, ClassifyOutcome, FileClassifier};
pub use config::Config;
pub use knowledge::{Pipeline, RunError, RunReport};
