//! Streaming merge pipeline command.
//!
//! Reads a locus stream, validates per-kind submission order, drives the
//! overlap-resolution stage with a threshold classifier, and writes finalized
//! records back out.
//!
//! # Memory Complexity
//!
//! O(k) where k = number of records inside one overlap region; the rest of
//! the stream is never buffered.
//!
//! # Requirements
//!
//! Input positions MUST be non-decreasing within each record kind.

use crate::classify::ThresholdClassifier;
use crate::error::Result;
use crate::order::SubmitOrderValidator;
use crate::overlapper::Overlapper;
use crate::stream::{LocusReader, LocusRecord, LocusWriter};
use std::io::{self, Read, Write};
use std::path::Path;

/// Streaming merge command configuration.
#[derive(Debug, Clone)]
pub struct MergeCommand {
    /// Minimum passing GQX for site classification.
    pub min_gqx: i32,
    /// Minimum passing locus quality for site classification.
    pub min_qual: i32,
    /// Validate per-kind submission order while streaming.
    pub validate: bool,
}

impl Default for MergeCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl MergeCommand {
    pub fn new() -> Self {
        Self {
            min_gqx: 15,
            min_qual: 20,
            validate: true,
        }
    }

    /// Set the minimum passing GQX.
    pub fn with_min_gqx(mut self, min_gqx: i32) -> Self {
        self.min_gqx = min_gqx;
        self
    }

    /// Set the minimum passing locus quality.
    pub fn with_min_qual(mut self, min_qual: i32) -> Self {
        self.min_qual = min_qual;
        self
    }

    /// Enable or disable inline order validation.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Execute the merge over a locus stream file.
    pub fn run<P: AsRef<Path>, W: Write>(&self, input: P, output: &mut W) -> Result<MergeStats> {
        let reader = LocusReader::from_path(input)?;
        self.run_streaming(reader, output)
    }

    /// Execute the merge over stdin.
    pub fn run_stdin<W: Write>(&self, output: &mut W) -> Result<MergeStats> {
        let stdin = io::stdin();
        let reader = LocusReader::new(stdin.lock());
        self.run_streaming(reader, output)
    }

    /// Core streaming merge pipeline.
    pub fn run_streaming<R: Read, W: Write>(
        &self,
        reader: LocusReader<R>,
        output: &mut W,
    ) -> Result<MergeStats> {
        let mut stats = MergeStats::default();
        let mut writer = LocusWriter::new(output);
        let classifier = ThresholdClassifier::new()
            .with_min_gqx(self.min_gqx)
            .with_min_qual(self.min_qual);
        let mut validator = SubmitOrderValidator::new();
        let mut overlapper = Overlapper::new(classifier, &mut writer);

        for result in reader.records() {
            match result? {
                LocusRecord::Site(site) => {
                    stats.sites_read += 1;
                    if self.validate {
                        validator.validate_site(site.pos)?;
                    }
                    overlapper.submit_site(site)?;
                }
                LocusRecord::Indel(indel) => {
                    if indel.is_variant() {
                        stats.indels_read += 1;
                    } else {
                        stats.homref_read += 1;
                        if !indel.is_forced_output() {
                            stats.homref_discarded += 1;
                        }
                    }
                    if self.validate {
                        validator.validate_indel(indel.pos)?;
                    }
                    overlapper.submit_indel(indel)?;
                }
            }
        }

        overlapper.flush()?;
        drop(overlapper);

        stats.records_written = writer.records_written();
        writer.flush()?;
        Ok(stats)
    }
}

/// Statistics from a streaming merge run.
#[derive(Debug, Default, Clone)]
pub struct MergeStats {
    /// Number of site records read.
    pub sites_read: usize,
    /// Number of variant indel records read.
    pub indels_read: usize,
    /// Number of homozygous-reference indel records read.
    pub homref_read: usize,
    /// Homozygous-reference records discarded for lack of forced output.
    pub homref_discarded: usize,
    /// Number of finalized records written.
    pub records_written: usize,
}

impl std::fmt::Display for MergeStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Sites: {}, Indels: {}, Homref: {} ({} discarded), Written: {}",
            self.sites_read,
            self.indels_read,
            self.homref_read,
            self.homref_discarded,
            self.records_written
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_merge(content: &str) -> (MergeStats, String) {
        let cmd = MergeCommand::new().with_min_gqx(0).with_min_qual(0);
        let reader = LocusReader::new(content.as_bytes());
        let mut output = Vec::new();
        let stats = cmd.run_streaming(reader, &mut output).unwrap();
        (stats, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_passthrough_stream() {
        let (stats, output) = run_merge("SITE\t5\t.\t50\t.\t40\t.\nSITE\t9\t.\t50\t.\t40\t.\n");
        assert_eq!(stats.sites_read, 2);
        assert_eq!(stats.records_written, 2);
        assert_eq!(output.lines().count(), 2);
    }

    #[test]
    fn test_overlap_merge_stream() {
        let content = "\
INDEL\t10\t15\t30\tLowGQX\t22\t.
SITE\t12\t.\t50\t.\t40\t.
SITE\t20\t.\t50\t.\t40\t.
";
        let (stats, output) = run_merge(content);
        assert_eq!(stats.sites_read, 2);
        assert_eq!(stats.indels_read, 1);
        assert_eq!(stats.records_written, 3);

        let lines: Vec<&str> = output.lines().collect();
        assert!(lines[0].starts_with("INDEL\t10\t15"));
        // merged site: SiteConflict, quality clamped to the indel's
        assert!(lines[1].starts_with("SITE\t12\t13\t30"));
        assert!(lines[1].contains("SiteConflict"));
        assert!(lines[2].starts_with("SITE\t20\t21\t50"));
    }

    #[test]
    fn test_nonforced_homref_discarded() {
        let (stats, output) = run_merge("HOMREF\t10\t16\t0\t.\t10\t0\n");
        assert_eq!(stats.homref_read, 1);
        assert_eq!(stats.homref_discarded, 1);
        assert_eq!(stats.records_written, 0);
        assert!(output.is_empty());
    }

    #[test]
    fn test_unsorted_input_rejected() {
        let cmd = MergeCommand::new();
        let content = "SITE\t20\t.\t50\t.\t40\t.\nSITE\t10\t.\t50\t.\t40\t.\n";
        let reader = LocusReader::new(content.as_bytes());
        let mut output = Vec::new();
        let err = cmd.run_streaming(reader, &mut output).unwrap_err();
        assert!(err.to_string().contains("not sorted"));
    }

    #[test]
    fn test_validation_can_be_disabled() {
        let cmd = MergeCommand::new().with_validation(false);
        let content = "SITE\t20\t.\t50\t.\t40\t.\nSITE\t10\t.\t50\t.\t40\t.\n";
        let reader = LocusReader::new(content.as_bytes());
        let mut output = Vec::new();
        assert!(cmd.run_streaming(reader, &mut output).is_ok());
    }
}
