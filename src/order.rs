//! Submission-order validation for the merge stage.
//!
//! The merge stage assumes positions arrive in non-decreasing order within
//! each record kind (sites and indels are tracked independently). This module
//! provides an inline validator for use within streaming loops, so a stream
//! does not need to be read twice.

use crate::error::{MergeError, Result};
use crate::locus::Pos;

/// Inline per-kind order validator.
#[derive(Debug, Default)]
pub struct SubmitOrderValidator {
    prev_site_pos: Option<Pos>,
    prev_indel_pos: Option<Pos>,
    record_count: usize,
}

impl SubmitOrderValidator {
    /// Create a new validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the next site submission.
    #[inline]
    pub fn validate_site(&mut self, pos: Pos) -> Result<()> {
        self.record_count += 1;
        if let Some(prev) = self.prev_site_pos {
            if pos < prev {
                return Err(MergeError::UnsortedInput(format!(
                    "site at pos {} (record {}) comes after site at pos {}",
                    pos, self.record_count, prev
                )));
            }
        }
        self.prev_site_pos = Some(pos);
        Ok(())
    }

    /// Validate the next indel submission (variant or homref).
    #[inline]
    pub fn validate_indel(&mut self, pos: Pos) -> Result<()> {
        self.record_count += 1;
        if let Some(prev) = self.prev_indel_pos {
            if pos < prev {
                return Err(MergeError::UnsortedInput(format!(
                    "indel at pos {} (record {}) comes after indel at pos {}",
                    pos, self.record_count, prev
                )));
            }
        }
        self.prev_indel_pos = Some(pos);
        Ok(())
    }

    /// Number of records validated so far.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Reset validator state (for a new region or stream).
    pub fn reset(&mut self) {
        self.prev_site_pos = None;
        self.prev_indel_pos = None;
        self.record_count = 0;
    }
}
