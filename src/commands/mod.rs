//! Command implementations for varmerge.

pub mod check;
pub mod generate;
pub mod merge;

pub use check::{CheckCommand, CheckStats};
pub use generate::{GenerateCommand, GenerateStats};
pub use merge::{MergeCommand, MergeStats};
