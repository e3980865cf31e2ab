//! Downstream sink contract for finalized loci.
//!
//! The merge stage transfers ownership of every record exactly once, in
//! non-decreasing position order. Sinks must not reorder, drop, or duplicate
//! records.

use crate::error::Result;
use crate::locus::{IndelLocus, Pos, SiteLocus};

/// Consumer of finalized loci in emission order.
pub trait VariantSink {
    fn process_site(&mut self, site: SiteLocus) -> Result<()>;
    fn process_indel(&mut self, indel: IndelLocus) -> Result<()>;
}

impl<S: VariantSink + ?Sized> VariantSink for &mut S {
    fn process_site(&mut self, site: SiteLocus) -> Result<()> {
        (**self).process_site(site)
    }

    fn process_indel(&mut self, indel: IndelLocus) -> Result<()> {
        (**self).process_indel(indel)
    }
}

/// A finalized locus of either kind, as received by a sink.
#[derive(Debug, Clone, PartialEq)]
pub enum MergedLocus {
    Site(SiteLocus),
    Indel(IndelLocus),
}

impl MergedLocus {
    /// Genomic position of the record.
    #[inline]
    pub fn pos(&self) -> Pos {
        match self {
            MergedLocus::Site(site) => site.pos,
            MergedLocus::Indel(indel) => indel.pos,
        }
    }
}

/// Sink that collects finalized records in emission order.
#[derive(Debug, Default)]
pub struct CollectSink {
    pub records: Vec<MergedLocus>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of collected records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if nothing has been emitted yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl VariantSink for CollectSink {
    fn process_site(&mut self, site: SiteLocus) -> Result<()> {
        self.records.push(MergedLocus::Site(site));
        Ok(())
    }

    fn process_indel(&mut self, indel: IndelLocus) -> Result<()> {
        self.records.push(MergedLocus::Indel(indel));
        Ok(())
    }
}
