//! Error types shared across the merge pipeline.

use std::io;
use thiserror::Error;

/// Errors surfaced by the merge pipeline and its collaborators.
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid locus record: {0}")]
    InvalidRecord(String),

    #[error("Input not sorted: {0}")]
    UnsortedInput(String),

    #[error("Classifier failure at pos {pos}: {message}")]
    Classifier { pos: u64, message: String },

    #[error("Sink failure: {0}")]
    Sink(String),
}

pub type Result<T> = std::result::Result<T, MergeError>;
