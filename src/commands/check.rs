//! Locus stream validation command.
//!
//! Parses a stream without emitting output, verifying the submission-order
//! contract the merge stage depends on: non-decreasing positions within each
//! record kind.

use crate::error::Result;
use crate::order::SubmitOrderValidator;
use crate::stream::{LocusReader, LocusRecord};
use std::io::{self, Read};
use std::path::Path;

/// Stream validation command.
#[derive(Debug, Clone, Default)]
pub struct CheckCommand;

impl CheckCommand {
    pub fn new() -> Self {
        Self
    }

    /// Validate a locus stream file.
    pub fn run<P: AsRef<Path>>(&self, input: P) -> Result<CheckStats> {
        let reader = LocusReader::from_path(input)?;
        self.run_streaming(reader)
    }

    /// Validate a stream from stdin.
    pub fn run_stdin(&self) -> Result<CheckStats> {
        let stdin = io::stdin();
        let reader = LocusReader::new(stdin.lock());
        self.run_streaming(reader)
    }

    /// Core validation loop.
    pub fn run_streaming<R: Read>(&self, reader: LocusReader<R>) -> Result<CheckStats> {
        let mut stats = CheckStats::default();
        let mut validator = SubmitOrderValidator::new();

        for result in reader.records() {
            match result? {
                LocusRecord::Site(site) => {
                    validator.validate_site(site.pos)?;
                    stats.sites += 1;
                }
                LocusRecord::Indel(indel) => {
                    validator.validate_indel(indel.pos)?;
                    if indel.is_variant() {
                        stats.indels += 1;
                    } else {
                        stats.homref += 1;
                    }
                }
            }
        }
        Ok(stats)
    }
}

/// Statistics from a stream validation run.
#[derive(Debug, Default, Clone)]
pub struct CheckStats {
    pub sites: usize,
    pub indels: usize,
    pub homref: usize,
}

impl CheckStats {
    /// Total records validated.
    pub fn total(&self) -> usize {
        self.sites + self.indels + self.homref
    }
}

impl std::fmt::Display for CheckStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "OK: {} records ({} sites, {} indels, {} homref)",
            self.total(),
            self.sites,
            self.indels,
            self.homref
        )
    }
}
