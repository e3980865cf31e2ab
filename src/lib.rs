//! varmerge: streaming overlap merge for ordered genomic variant loci.
//!
//! This library implements the merge-and-annotate stage of a variant-calling
//! pipeline: positionally-ordered site, variant-indel, and forced-output
//! homozygous-reference records flow through an overlap resolver that tags
//! conflicts, clamps quality annotations on overlapped sites, reclassifies
//! mutated records, and emits everything exactly once in non-decreasing
//! position order.
//!
//! # Example
//!
//! ```rust
//! use varmerge::classify::ThresholdClassifier;
//! use varmerge::locus::{IndelLocus, SampleInfo, SiteLocus};
//! use varmerge::overlapper::Overlapper;
//! use varmerge::sink::CollectSink;
//!
//! let classifier = ThresholdClassifier::new();
//! let mut stage = Overlapper::new(classifier, CollectSink::new());
//!
//! let indel = IndelLocus::variant(10, 15, 30, vec![SampleInfo::new(22)]);
//! let site = SiteLocus::new(12, 50, vec![SampleInfo::new(40)]);
//!
//! stage.submit_indel(indel).unwrap();
//! stage.submit_site(site).unwrap();
//! stage.flush().unwrap();
//!
//! assert_eq!(stage.sink().len(), 2);
//! ```

pub mod classify;
pub mod commands;
pub mod error;
pub mod locus;
pub mod order;
pub mod overlapper;
pub mod sink;
pub mod stream;

// Re-export commonly used types
pub use error::{MergeError, Result};
pub use locus::{FilterSet, IndelLocus, Pos, SampleInfo, SiteLocus, VariantFilter};
pub use overlapper::{next_variant_kind, Overlapper, QueueKind};
pub use sink::{CollectSink, MergedLocus, VariantSink};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::classify::{SiteClassifier, ThresholdClassifier};
    pub use crate::commands::{CheckCommand, GenerateCommand, MergeCommand};
    pub use crate::error::{MergeError, Result};
    pub use crate::locus::{FilterSet, IndelLocus, Pos, SampleInfo, SiteLocus, VariantFilter};
    pub use crate::overlapper::Overlapper;
    pub use crate::sink::{CollectSink, MergedLocus, VariantSink};
    pub use crate::stream::{LocusReader, LocusRecord, LocusWriter};
}
