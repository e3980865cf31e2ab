//! Core locus types for merged variant-call records.
//!
//! A locus is a single- or range-position genomic record carrying filter and
//! quality annotations. Three kinds flow through the merge stage: single-position
//! site calls, variant indel calls spanning `[pos, end)`, and forced-output
//! homozygous-reference indel calls.

use std::fmt;

/// Genomic position (0-based).
pub type Pos = u64;

/// Named VCF-style filter flags applied to loci and samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantFilter {
    /// Genotype quality (GQX) below threshold.
    LowGqx,
    /// Locus quality below threshold.
    LowQual,
    /// Supporting read depth below threshold.
    LowDepth,
    /// Locus overlaps a cluster of mutually conflicting indel calls.
    IndelConflict,
    /// Site overlaps a filtered indel call.
    SiteConflict,
    /// Called ploidy conflicts with an overlapping call.
    PloidyConflict,
}

/// All filter flags, in canonical output order.
pub const ALL_FILTERS: [VariantFilter; 6] = [
    VariantFilter::LowGqx,
    VariantFilter::LowQual,
    VariantFilter::LowDepth,
    VariantFilter::IndelConflict,
    VariantFilter::SiteConflict,
    VariantFilter::PloidyConflict,
];

impl VariantFilter {
    /// Canonical text label used in the locus stream format.
    pub fn label(&self) -> &'static str {
        match self {
            VariantFilter::LowGqx => "LowGQX",
            VariantFilter::LowQual => "LowQual",
            VariantFilter::LowDepth => "LowDepth",
            VariantFilter::IndelConflict => "IndelConflict",
            VariantFilter::SiteConflict => "SiteConflict",
            VariantFilter::PloidyConflict => "PloidyConflict",
        }
    }

    /// Parse a filter from its canonical label.
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "LowGQX" => Some(VariantFilter::LowGqx),
            "LowQual" => Some(VariantFilter::LowQual),
            "LowDepth" => Some(VariantFilter::LowDepth),
            "IndelConflict" => Some(VariantFilter::IndelConflict),
            "SiteConflict" => Some(VariantFilter::SiteConflict),
            "PloidyConflict" => Some(VariantFilter::PloidyConflict),
            _ => None,
        }
    }

    #[inline]
    fn bit(&self) -> u8 {
        match self {
            VariantFilter::LowGqx => 1 << 0,
            VariantFilter::LowQual => 1 << 1,
            VariantFilter::LowDepth => 1 << 2,
            VariantFilter::IndelConflict => 1 << 3,
            VariantFilter::SiteConflict => 1 << 4,
            VariantFilter::PloidyConflict => 1 << 5,
        }
    }
}

impl fmt::Display for VariantFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Compact set of filter flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSet(u8);

impl FilterSet {
    /// Create an empty filter set.
    #[inline]
    pub fn new() -> Self {
        Self(0)
    }

    /// Add a filter flag.
    #[inline]
    pub fn set(&mut self, filter: VariantFilter) {
        self.0 |= filter.bit();
    }

    /// Remove a filter flag.
    #[inline]
    pub fn clear(&mut self, filter: VariantFilter) {
        self.0 &= !filter.bit();
    }

    /// Check whether a filter flag is present.
    #[inline]
    pub fn test(&self, filter: VariantFilter) -> bool {
        self.0 & filter.bit() != 0
    }

    /// Returns true if no filter flags are set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate over the set flags in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = VariantFilter> + '_ {
        ALL_FILTERS.iter().copied().filter(|f| self.test(*f))
    }
}

impl fmt::Display for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str(".");
        }
        let mut first = true;
        for filter in self.iter() {
            if !first {
                f.write_str(";")?;
            }
            write!(f, "{}", filter)?;
            first = false;
        }
        Ok(())
    }
}

/// Per-sample call annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleInfo {
    /// Genotype quality, subject to min-clamping during overlap merge.
    pub gqx: i32,
    /// Sample-level filter flags.
    pub filters: FilterSet,
}

impl SampleInfo {
    pub fn new(gqx: i32) -> Self {
        Self {
            gqx,
            filters: FilterSet::new(),
        }
    }
}

/// A single-position site call.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteLocus {
    pub pos: Pos,
    /// Any-variant-allele quality for the locus.
    pub quality: i32,
    /// Locus-level filter flags.
    pub filters: FilterSet,
    /// Per-sample annotations.
    pub samples: Vec<SampleInfo>,
    /// Cached scoring features; invalidated when annotations change.
    scoring_features: Vec<f64>,
}

impl SiteLocus {
    pub fn new(pos: Pos, quality: i32, samples: Vec<SampleInfo>) -> Self {
        Self {
            pos,
            quality,
            filters: FilterSet::new(),
            samples,
            scoring_features: Vec::new(),
        }
    }

    /// Number of samples at this locus.
    #[inline]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Replace the cached scoring features.
    pub fn set_scoring_features(&mut self, features: Vec<f64>) {
        self.scoring_features = features;
    }

    /// Access the cached scoring features.
    pub fn scoring_features(&self) -> &[f64] {
        &self.scoring_features
    }

    /// Drop cached scoring features.
    ///
    /// Must be called before reclassification whenever quality or filter
    /// annotations have been mutated, so stale features are never scored.
    pub fn clear_scoring_features(&mut self) {
        self.scoring_features.clear();
    }
}

impl fmt::Display for SiteLocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "site pos: {} qual: {} filters: {} gqx:",
            self.pos, self.quality, self.filters
        )?;
        for sample in &self.samples {
            write!(f, " {}({})", sample.gqx, sample.filters)?;
        }
        Ok(())
    }
}

/// An indel call spanning `[pos, end)`.
///
/// Covers both actually-called variants and forced-output
/// homozygous-reference calls; `is_variant` distinguishes them.
#[derive(Debug, Clone, PartialEq)]
pub struct IndelLocus {
    pub pos: Pos,
    /// Exclusive end of the indel span; always greater than `pos`.
    pub end: Pos,
    /// Any-variant-allele quality for the locus.
    pub quality: i32,
    /// Locus-level filter flags.
    pub filters: FilterSet,
    /// Per-sample annotations.
    pub samples: Vec<SampleInfo>,
    variant: bool,
    forced_output: bool,
}

impl IndelLocus {
    /// Create a variant indel call.
    pub fn variant(pos: Pos, end: Pos, quality: i32, samples: Vec<SampleInfo>) -> Self {
        debug_assert!(end > pos);
        Self {
            pos,
            end,
            quality,
            filters: FilterSet::new(),
            samples,
            variant: true,
            forced_output: false,
        }
    }

    /// Create a homozygous-reference indel call.
    pub fn homref(pos: Pos, end: Pos, quality: i32, samples: Vec<SampleInfo>, forced: bool) -> Self {
        debug_assert!(end > pos);
        Self {
            pos,
            end,
            quality,
            filters: FilterSet::new(),
            samples,
            variant: false,
            forced_output: forced,
        }
    }

    /// True for actually-called variant loci.
    #[inline]
    pub fn is_variant(&self) -> bool {
        self.variant
    }

    /// True when this call must be emitted even without a variant.
    #[inline]
    pub fn is_forced_output(&self) -> bool {
        self.forced_output
    }

    /// Number of samples at this locus.
    #[inline]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Check whether the span overlaps the given position.
    #[inline]
    pub fn spans(&self, pos: Pos) -> bool {
        self.pos <= pos && pos < self.end
    }
}

impl fmt::Display for IndelLocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.variant {
            "indel"
        } else if self.forced_output {
            "homref(forced)"
        } else {
            "homref"
        };
        write!(
            f,
            "{} pos: {} end: {} qual: {} filters: {} gqx:",
            kind, self.pos, self.end, self.quality, self.filters
        )?;
        for sample in &self.samples {
            write!(f, " {}({})", sample.gqx, sample.filters)?;
        }
        Ok(())
    }
}
