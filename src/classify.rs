//! Site reclassification after overlap-driven annotation changes.
//!
//! Merging a site with an overlapping indel mutates quality and GQX values,
//! which invalidates any previously derived classification. The merge stage
//! clears the site's cached scoring features and hands it back to a
//! [`SiteClassifier`] to recompute filter annotations from current fields.

use crate::error::Result;
use crate::locus::{SiteLocus, VariantFilter};

/// Recomputes a site's classification from its current annotations.
///
/// Implementations must be deterministic over the site's fields. The
/// classification step is external to the merge core and may fail; a failure
/// aborts resolution through the merge stage's failure boundary.
pub trait SiteClassifier {
    fn classify_site(&self, site: &mut SiteLocus) -> Result<()>;
}

/// Threshold-based site classification model.
///
/// Assigns `LowGQX` when any sample GQX falls below `min_gqx` (also at sample
/// level for the failing samples) and `LowQual` when the locus quality falls
/// below `min_qual`. Previously assigned threshold filters are cleared first
/// so reclassification never accretes stale flags.
#[derive(Debug, Clone)]
pub struct ThresholdClassifier {
    pub min_gqx: i32,
    pub min_qual: i32,
}

impl Default for ThresholdClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ThresholdClassifier {
    pub fn new() -> Self {
        Self {
            min_gqx: 15,
            min_qual: 20,
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
}

impl SiteClassifier for ThresholdClassifier {
    fn classify_site(&self, site: &mut SiteLocus) -> Result<()> {
        site.filters.clear(VariantFilter::LowGqx);
        site.filters.clear(VariantFilter::LowQual);

        if site.quality < self.min_qual {
            site.filters.set(VariantFilter::LowQual);
        }

        let mut any_low_gqx = false;
        for sample in &mut site.samples {
            sample.filters.clear(VariantFilter::LowGqx);
            if sample.gqx < self.min_gqx {
                sample.filters.set(VariantFilter::LowGqx);
                any_low_gqx = true;
            }
        }
        if any_low_gqx {
            site.filters.set(VariantFilter::LowGqx);
        }

        let min_sample_gqx = site.samples.iter().map(|s| s.gqx).min().unwrap_or(0);
        site.set_scoring_features(vec![site.quality as f64, min_sample_gqx as f64]);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locus::SampleInfo;

    #[test]
    fn test_passing_site() {
        let classifier = ThresholdClassifier::new();
        let mut site = SiteLocus::new(100, 50, vec![SampleInfo::new(40)]);

        classifier.classify_site(&mut site).unwrap();
        assert!(site.filters.is_empty());
        assert_eq!(site.scoring_features(), &[50.0, 40.0]);
    }

    #[test]
    fn test_low_gqx_site() {
        let classifier = ThresholdClassifier::new().with_min_gqx(30);
        let mut site = SiteLocus::new(100, 50, vec![SampleInfo::new(40), SampleInfo::new(10)]);

        classifier.classify_site(&mut site).unwrap();
        assert!(site.filters.test(VariantFilter::LowGqx));
        assert!(!site.samples[0].filters.test(VariantFilter::LowGqx));
        assert!(site.samples[1].filters.test(VariantFilter::LowGqx));
    }

    #[test]
    fn test_low_qual_site() {
        let classifier = ThresholdClassifier::new().with_min_qual(20);
        let mut site = SiteLocus::new(100, 5, vec![SampleInfo::new(40)]);

        classifier.classify_site(&mut site).unwrap();
        assert!(site.filters.test(VariantFilter::LowQual));
        assert!(!site.filters.test(VariantFilter::LowGqx));
    }

    #[test]
    fn test_reclassification_clears_stale_flags() {
        let classifier = ThresholdClassifier::new().with_min_gqx(30).with_min_qual(20);
        let mut site = SiteLocus::new(100, 10, vec![SampleInfo::new(10)]);

        classifier.classify_site(&mut site).unwrap();
        assert!(site.filters.test(VariantFilter::LowQual));
        assert!(site.filters.test(VariantFilter::LowGqx));

        // annotations improve, reclassification must drop the old flags
        site.quality = 60;
        site.samples[0].gqx = 50;
        classifier.classify_site(&mut site).unwrap();
        assert!(site.filters.is_empty());
        assert!(site.samples[0].filters.is_empty());
    }
}
