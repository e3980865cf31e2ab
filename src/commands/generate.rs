//! Generate synthetic locus streams for testing and benchmarking.
//!
//! Walks a position cursor forward with random gaps, emitting a weighted mix
//! of site, variant-indel, and homozygous-reference records. A single global
//! cursor keeps every kind non-decreasing by construction, so generated
//! streams always satisfy the merge stage's ordering contract.
//! Deterministic for a fixed seed.

use crate::error::Result;
use crate::locus::{IndelLocus, SampleInfo, SiteLocus, VariantFilter};
use crate::stream::LocusWriter;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::io::Write;

/// Synthetic stream generator configuration.
#[derive(Debug, Clone)]
pub struct GenerateCommand {
    /// Number of records to generate.
    pub count: usize,
    /// RNG seed for reproducibility.
    pub seed: u64,
    /// Samples per locus.
    pub samples: usize,
    /// Maximum gap between consecutive record positions.
    pub max_gap: u64,
    /// Maximum indel span length.
    pub max_span: u64,
}

impl Default for GenerateCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerateCommand {
    pub fn new() -> Self {
        Self {
            count: 1000,
            seed: 42,
            samples: 1,
            max_gap: 8,
            max_span: 12,
        }
    }

    /// Set the record count.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of samples per locus.
    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples.max(1);
        self
    }

    /// Generate a stream into the given writer.
    pub fn run<W: Write>(&self, output: &mut W) -> Result<GenerateStats> {
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut writer = LocusWriter::new(output);
        let mut stats = GenerateStats::default();
        let mut pos: u64 = 0;

        for _ in 0..self.count {
            pos += rng.gen_range(1..=self.max_gap.max(1));
            let samples: Vec<SampleInfo> = (0..self.samples)
                .map(|_| SampleInfo::new(rng.gen_range(0..=60)))
                .collect();
            let quality = rng.gen_range(0..=60);

            match rng.gen_range(0..100u32) {
                0..=69 => {
                    let site = SiteLocus::new(pos, quality, samples);
                    writer.write_site(&site)?;
                    stats.sites += 1;
                }
                70..=89 => {
                    let end = pos + rng.gen_range(2..=self.max_span.max(2));
                    let mut indel = IndelLocus::variant(pos, end, quality, samples);
                    // some filtered indels, so merges exercise conflict tagging
                    if rng.gen_bool(0.15) {
                        indel.filters.set(VariantFilter::LowGqx);
                    }
                    writer.write_indel(&indel)?;
                    stats.indels += 1;
                }
                _ => {
                    let end = pos + rng.gen_range(2..=self.max_span.max(2));
                    let forced = rng.gen_bool(0.8);
                    let indel = IndelLocus::homref(pos, end, quality, samples, forced);
                    writer.write_indel(&indel)?;
                    stats.homref += 1;
                }
            }
        }

        writer.flush()?;
        Ok(stats)
    }
}

/// Statistics from a generation run.
#[derive(Debug, Default, Clone)]
pub struct GenerateStats {
    pub sites: usize,
    pub indels: usize,
    pub homref: usize,
}

impl std::fmt::Display for GenerateStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Generated {} sites, {} indels, {} homref",
            self.sites, self.indels, self.homref
        )
    }
}
