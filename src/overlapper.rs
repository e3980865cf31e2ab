//! Streaming overlap resolution between site and indel calls.
//!
//! The [`Overlapper`] is the merge-and-annotate stage of the variant pipeline:
//! it receives positionally-ordered site calls, variant indel calls, and
//! forced-output homozygous-reference indel calls, detects mutual overlap,
//! rewrites annotations on the overlapped records, and hands every record to
//! the downstream sink exactly once, in non-decreasing position order.
//!
//! # Algorithm
//!
//! Variant indels open an overlap region `[pos, indel_end_pos)`. While the
//! region is open, sites inside it and further indels extending it are
//! buffered. The first record that starts at or past the region's end proves
//! enough lookahead exists: the buffered records are resolved (conflict
//! marking, site merge, reclassification) and drained in ascending position
//! order with a deterministic tie-break among simultaneous kinds.
//!
//! # Memory Complexity
//!
//! O(k) where k = number of records inside one overlap region; buffers are
//! fully drained after every resolution cycle.

use std::io::{self, Write};

use crate::classify::SiteClassifier;
use crate::error::Result;
use crate::locus::{IndelLocus, Pos, SiteLocus, VariantFilter};
use crate::sink::VariantSink;

/// Which buffer head is emitted next during the ordered drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    /// All buffers exhausted.
    None,
    Indel,
    NonvariantIndel,
    Site,
}

/// Decide the next record kind to emit from the three buffer heads.
///
/// Pure function over the peeked head positions; an exhausted buffer peeks as
/// `None` and loses every comparison. Ties are resolved lexicographically:
/// an indel wins a tie with either competitor, a non-variant indel wins a tie
/// with a site.
pub fn next_variant_kind(
    indel: Option<Pos>,
    nonvariant_indel: Option<Pos>,
    site: Option<Pos>,
) -> QueueKind {
    // "head a sorts at or before head b", with an empty buffer losing
    fn le(a: Option<Pos>, b: Option<Pos>) -> bool {
        match (a, b) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(a), Some(b)) => a <= b,
        }
    }

    if indel.is_none() && nonvariant_indel.is_none() && site.is_none() {
        return QueueKind::None;
    }

    if le(indel, nonvariant_indel) {
        if le(indel, site) {
            QueueKind::Indel
        } else {
            QueueKind::Site
        }
    } else if le(nonvariant_indel, site) {
        QueueKind::NonvariantIndel
    } else {
        QueueKind::Site
    }
}

/// Streaming merge stage between the caller and the downstream sink.
///
/// Buffer slots are `Option`s: emission moves the record out and leaves an
/// explicit released marker, so [`Overlapper::dump`] can render a buffer that
/// is only partially drained when a failure interrupts resolution.
#[derive(Debug)]
pub struct Overlapper<C, S> {
    classifier: C,
    sink: S,
    site_buffer: Vec<Option<SiteLocus>>,
    indel_buffer: Vec<Option<IndelLocus>>,
    nonvariant_indel_buffer: Vec<Option<IndelLocus>>,
    /// Maximum `end` among buffered variant indels; 0 when none are buffered.
    indel_end_pos: Pos,
}

impl<C: SiteClassifier, S: VariantSink> Overlapper<C, S> {
    /// Create a merge stage over the given classifier and sink.
    pub fn new(classifier: C, sink: S) -> Self {
        Self {
            classifier,
            sink,
            site_buffer: Vec::new(),
            indel_buffer: Vec::new(),
            nonvariant_indel_buffer: Vec::new(),
            indel_end_pos: 0,
        }
    }

    /// End of the currently open overlap region; 0 when no indel is buffered.
    pub fn indel_end_pos(&self) -> Pos {
        self.indel_end_pos
    }

    /// True when no record is awaiting resolution.
    pub fn is_buffer_empty(&self) -> bool {
        self.site_buffer.is_empty()
            && self.indel_buffer.is_empty()
            && self.nonvariant_indel_buffer.is_empty()
    }

    /// Access the downstream sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the stage, returning the sink.
    ///
    /// Callers should [`flush`](Self::flush) first; any still-buffered
    /// records are dropped.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Submit the next site call.
    ///
    /// A site at or past the open region's end first forces resolution of
    /// everything buffered and is then emitted directly; a site inside the
    /// region is buffered until the region resolves.
    pub fn submit_site(&mut self, site: SiteLocus) -> Result<()> {
        if site.pos < self.indel_end_pos {
            self.site_buffer.push(Some(site));
            return Ok(());
        }

        self.process_overlaps()?;

        debug_assert!(site.pos >= self.indel_end_pos);
        debug_assert!(self.nonvariant_indel_buffer.is_empty());

        self.sink.process_site(site)
    }

    /// Submit the next indel call (variant or homozygous-reference).
    ///
    /// Homozygous-reference calls without forced output are discarded.
    /// An indel starting past the open region's end first forces resolution
    /// of everything buffered; the new indel is then buffered, variant calls
    /// extending the region to `max(indel_end_pos, end)`.
    pub fn submit_indel(&mut self, indel: IndelLocus) -> Result<()> {
        if !indel.is_variant() && !indel.is_forced_output() {
            return Ok(());
        }

        if indel.pos > self.indel_end_pos {
            self.process_overlaps()?;
        }

        if !indel.is_variant() {
            self.nonvariant_indel_buffer.push(Some(indel));
        } else {
            self.indel_end_pos = self.indel_end_pos.max(indel.end);
            self.indel_buffer.push(Some(indel));
        }
        Ok(())
    }

    /// Resolve and emit everything still buffered at end of input.
    pub fn flush(&mut self) -> Result<()> {
        self.process_overlaps()
    }

    /// Resolution failure boundary.
    ///
    /// On any error escaping resolution the current buffer contents are
    /// dumped for diagnosis and all buffers are cleared before the error is
    /// returned. Clearing is mandatory: a later submission or drop of a
    /// half-processed buffer must observe a valid, empty state.
    pub fn process_overlaps(&mut self) -> Result<()> {
        let result = self.process_overlaps_impl();
        if let Err(ref err) = result {
            eprintln!("ERROR: exception during overlap resolution: {}", err);
            let stderr = io::stderr();
            let _ = self.dump(&mut stderr.lock());
            self.clear_buffers();
        }
        result
    }

    fn process_overlaps_impl(&mut self) -> Result<()> {
        if self.indel_buffer.is_empty() && self.nonvariant_indel_buffer.is_empty() {
            return Ok(());
        }

        // more than one buffered variant indel means the whole region is a
        // conflict cluster (rare)
        let is_conflict = self.indel_buffer.len() > 1;
        if is_conflict {
            for slot in &mut self.indel_buffer {
                if let Some(indel) = slot.as_mut() {
                    indel.filters.set(VariantFilter::IndelConflict);
                }
            }
        }

        // rewrite buffered sites to be consistent with the overlapping indel
        if let Some(anchor) = self.indel_buffer.first().and_then(Option::as_ref) {
            for slot in &mut self.site_buffer {
                if let Some(site) = slot.as_mut() {
                    modify_overlapping_site(&self.classifier, anchor, site)?;
                }
            }
        } else {
            assert!(
                self.site_buffer.is_empty(),
                "site buffered without an overlapping variant indel"
            );
        }

        let mut indel_index = 0;
        let mut nonvariant_indel_index = 0;
        let mut site_index = 0;

        // drain all three buffers in ascending position order
        loop {
            let next = next_variant_kind(
                peek_pos(&self.indel_buffer, indel_index, |locus| locus.pos),
                peek_pos(&self.nonvariant_indel_buffer, nonvariant_indel_index, |locus| {
                    locus.pos
                }),
                peek_pos(&self.site_buffer, site_index, |locus| locus.pos),
            );

            match next {
                QueueKind::None => break,
                QueueKind::Indel => {
                    let indel = take_slot(&mut self.indel_buffer, indel_index);
                    self.sink.process_indel(indel)?;
                    if is_conflict {
                        // every member of the conflict cluster is emitted
                        indel_index += 1;
                    } else {
                        // a non-conflicting region holds exactly one indel
                        indel_index = self.indel_buffer.len();
                    }
                }
                QueueKind::NonvariantIndel => {
                    let indel = take_slot(&mut self.nonvariant_indel_buffer, nonvariant_indel_index);
                    self.sink.process_indel(indel)?;
                    nonvariant_indel_index += 1;
                }
                QueueKind::Site => {
                    let site = take_slot(&mut self.site_buffer, site_index);
                    self.sink.process_site(site)?;
                    site_index += 1;
                }
            }
        }

        self.clear_buffers();
        Ok(())
    }

    fn clear_buffers(&mut self) {
        self.site_buffer.clear();
        self.indel_buffer.clear();
        self.nonvariant_indel_buffer.clear();
        self.indel_end_pos = 0;
    }

    /// Write a human-readable snapshot of the buffer state.
    ///
    /// Safe to call while some slots have already had their record moved out,
    /// which is exactly the state a mid-resolution failure leaves behind.
    pub fn dump<W: Write>(&self, os: &mut W) -> io::Result<()> {
        writeln!(os, "overlapper: indel_end_pos: {}", self.indel_end_pos)?;
        dump_locus_buffer("Site", &self.site_buffer, os)?;
        dump_locus_buffer("VariantIndel", &self.indel_buffer, os)?;
        dump_locus_buffer("NonvariantIndel", &self.nonvariant_indel_buffer, os)
    }
}

/// Merge an overlapped site with the region's anchoring variant indel.
///
/// Against a conflicting cluster the site is only tagged `IndelConflict`;
/// the cluster's own annotations are not trustworthy to merge numerically.
/// Against a single clean indel the site inherits a conflict tag whenever the
/// indel is filtered, quality and per-sample GQX are clamped to the indel's
/// values, and the site is reclassified from its mutated fields.
fn modify_overlapping_site<C: SiteClassifier>(
    classifier: &C,
    indel: &IndelLocus,
    site: &mut SiteLocus,
) -> Result<()> {
    debug_assert!(site.pos >= indel.pos);

    if indel.filters.test(VariantFilter::IndelConflict) {
        site.filters.set(VariantFilter::IndelConflict);
        return Ok(());
    }

    // a filtered overlapping indel marks the site as conflicted, at locus
    // level and per sample (the site does not inherit the indel's filters;
    // that interacts poorly with empirical scoring)
    if !indel.filters.is_empty() {
        site.filters.set(VariantFilter::SiteConflict);
    }
    for (site_sample, indel_sample) in site.samples.iter_mut().zip(&indel.samples) {
        if !indel_sample.filters.is_empty() {
            site_sample.filters.set(VariantFilter::SiteConflict);
        }
    }

    // limit qual and gqx values to those of the indel
    site.quality = site.quality.min(indel.quality);
    for (site_sample, indel_sample) in site.samples.iter_mut().zip(&indel.samples) {
        site_sample.gqx = site_sample.gqx.min(indel_sample.gqx);
    }

    // the merge invalidates previously derived features, rerun classification
    site.clear_scoring_features();
    classifier.classify_site(site)
}

/// Peek the position of the buffer head at `index`, `None` once exhausted.
#[inline]
fn peek_pos<T>(buffer: &[Option<T>], index: usize, pos: impl Fn(&T) -> Pos) -> Option<Pos> {
    buffer.get(index).and_then(Option::as_ref).map(pos)
}

/// Move the record out of a buffer slot, leaving the released marker.
#[inline]
fn take_slot<T>(buffer: &mut [Option<T>], index: usize) -> T {
    buffer[index]
        .take()
        .expect("ordered drain visited an already-released buffer slot")
}

fn dump_locus_buffer<T: std::fmt::Display, W: Write>(
    label: &str,
    buffer: &[Option<T>],
    os: &mut W,
) -> io::Result<()> {
    writeln!(os, "{} count: ({})", label, buffer.len())?;
    for (index, slot) in buffer.iter().enumerate() {
        match slot {
            Some(locus) => writeln!(os, "{}{} {}", label, index, locus)?,
            None => writeln!(os, "{}{} ALREADY RELEASED", label, index)?,
        }
    }
    Ok(())
}
