use std::path::PathBuf;

use crate::data::model::Column;

// ---------------------------------------------------------------------------
// Fatal errors: the dataset could not be produced at all
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("auction data not found; tried {}", display_paths(.candidates))]
    NotFound { candidates: Vec<PathBuf> },

    #[error("Unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Malformed source: {0}")]
    Malformed(String),

    #[error("Config error in {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Non-fatal signals surfaced to the presentation layer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    #[error("No data after filters. Adjust filters to see results.")]
    EmptyResult,

    #[error("'{column}' column not found")]
    Unavailable { column: Column },
}

pub type Result<T> = std::result::Result<T, LoadError>;
