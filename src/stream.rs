//! Locus stream text format reader and writer.
//!
//! The merge core itself owns no file format; this module is the pipeline
//! collaborator that feeds it and drains it. One locus per line, seven
//! tab-separated columns:
//!
//! ```text
//! KIND  pos  end  qual  filters  gqx[,gqx...]  forced
//! ```
//!
//! `KIND` is `SITE`, `INDEL`, or `HOMREF`. Sites may carry `.` for `end`.
//! `filters` is `.` or `;`-joined filter labels. `forced` is `.` or `1` and
//! is meaningful only for `HOMREF`. `#`-comments and blank lines are skipped.

use crate::error::{MergeError, Result};
use crate::locus::{FilterSet, IndelLocus, SampleInfo, SiteLocus, VariantFilter};
use crate::sink::VariantSink;
use memchr::memchr;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Number of columns in a locus stream line.
const FIELD_COUNT: usize = 7;

/// A parsed locus stream record.
#[derive(Debug, Clone, PartialEq)]
pub enum LocusRecord {
    Site(SiteLocus),
    Indel(IndelLocus),
}

/// Fast u64 parsing - no allocation, no error formatting.
///
/// Returns None if the input is empty or contains non-digit characters.
#[inline(always)]
pub fn parse_u64_fast(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.wrapping_mul(10).wrapping_add(d as u64);
    }
    Some(n)
}

/// Fast i32 parsing with optional leading minus.
#[inline(always)]
pub fn parse_i32_fast(bytes: &[u8]) -> Option<i32> {
    let (negative, digits) = match bytes.first() {
        Some(b'-') => (true, &bytes[1..]),
        _ => (false, bytes),
    };
    let n = parse_u64_fast(digits)?;
    if n > i32::MAX as u64 {
        return None;
    }
    Some(if negative { -(n as i32) } else { n as i32 })
}

/// Split a line into its tab-separated columns using memchr.
///
/// Returns None unless exactly [`FIELD_COUNT`] columns are present.
#[inline]
fn split_fields(line: &[u8]) -> Option<[&[u8]; FIELD_COUNT]> {
    let mut fields: [&[u8]; FIELD_COUNT] = [&[]; FIELD_COUNT];
    let mut rest = line;
    for (i, slot) in fields.iter_mut().enumerate() {
        if i + 1 == FIELD_COUNT {
            if memchr(b'\t', rest).is_some() {
                return None;
            }
            *slot = rest;
        } else {
            let tab = memchr(b'\t', rest)?;
            *slot = &rest[..tab];
            rest = &rest[tab + 1..];
        }
    }
    Some(fields)
}

fn parse_filters(bytes: &[u8]) -> Option<FilterSet> {
    let mut filters = FilterSet::new();
    if bytes == b"." || bytes == b"PASS" {
        return Some(filters);
    }
    for label in bytes.split(|&b| b == b';') {
        let label = std::str::from_utf8(label).ok()?;
        filters.set(VariantFilter::from_label(label)?);
    }
    Some(filters)
}

fn parse_samples(bytes: &[u8]) -> Option<Vec<SampleInfo>> {
    let mut samples = Vec::new();
    for field in bytes.split(|&b| b == b',') {
        samples.push(SampleInfo::new(parse_i32_fast(field)?));
    }
    Some(samples)
}

/// A streaming locus record reader.
pub struct LocusReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    buffer: String,
    sample_count: Option<usize>,
}

impl LocusReader<File> {
    /// Open a locus stream from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> LocusReader<R> {
    /// Create a new reader from any readable source.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buffer: String::with_capacity(256),
            sample_count: None,
        }
    }

    /// Read the next locus record.
    pub fn read_record(&mut self) -> Result<Option<LocusRecord>> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_line(&mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = self.buffer.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let record = self.parse_line(line)?;
            let samples = match &record {
                LocusRecord::Site(site) => site.sample_count(),
                LocusRecord::Indel(indel) => indel.sample_count(),
            };
            match self.sample_count {
                None => self.sample_count = Some(samples),
                Some(count) if count != samples => {
                    return Err(self.parse_error(format!(
                        "sample count {} does not match stream sample count {}",
                        samples, count
                    )));
                }
                Some(_) => {}
            }
            return Ok(Some(record));
        }
    }

    /// Iterate over all records.
    pub fn records(self) -> Records<R> {
        Records { reader: self }
    }

    fn parse_error(&self, message: impl Into<String>) -> MergeError {
        MergeError::Parse {
            line: self.line_number,
            message: message.into(),
        }
    }

    fn parse_line(&self, line: &str) -> Result<LocusRecord> {
        let fields = split_fields(line.as_bytes())
            .ok_or_else(|| self.parse_error(format!("expected {} tab-separated columns", FIELD_COUNT)))?;
        let [kind, pos, end, qual, filters, gqx, forced] = fields;

        let pos = parse_u64_fast(pos)
            .ok_or_else(|| self.parse_error("invalid position"))?;
        let qual = parse_i32_fast(qual)
            .ok_or_else(|| self.parse_error("invalid quality"))?;
        let filters = parse_filters(filters)
            .ok_or_else(|| self.parse_error("unknown filter label"))?;
        let samples = parse_samples(gqx)
            .ok_or_else(|| self.parse_error("invalid gqx list"))?;

        let forced = match forced {
            b"." | b"0" => false,
            b"1" => true,
            _ => return Err(self.parse_error("forced column must be '.', '0', or '1'")),
        };

        let parse_end = |reader: &Self| -> Result<u64> {
            let end = parse_u64_fast(end)
                .ok_or_else(|| reader.parse_error("invalid end position"))?;
            if end <= pos {
                return Err(reader.parse_error(format!(
                    "end {} must be greater than pos {}",
                    end, pos
                )));
            }
            Ok(end)
        };

        let record = match kind {
            b"SITE" => {
                if end != b"." {
                    parse_end(self)?;
                }
                let mut site = SiteLocus::new(pos, qual, samples);
                site.filters = filters;
                LocusRecord::Site(site)
            }
            b"INDEL" => {
                let end = parse_end(self)?;
                let mut indel = IndelLocus::variant(pos, end, qual, samples);
                indel.filters = filters;
                LocusRecord::Indel(indel)
            }
            b"HOMREF" => {
                let end = parse_end(self)?;
                let mut indel = IndelLocus::homref(pos, end, qual, samples, forced);
                indel.filters = filters;
                LocusRecord::Indel(indel)
            }
            other => {
                return Err(self.parse_error(format!(
                    "unknown record kind '{}'",
                    String::from_utf8_lossy(other)
                )));
            }
        };
        Ok(record)
    }
}

/// Iterator over locus records.
pub struct Records<R: Read> {
    reader: LocusReader<R>,
}

impl<R: Read> Iterator for Records<R> {
    type Item = Result<LocusRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_record().transpose()
    }
}

/// Buffer size for LocusWriter (64KB).
const WRITER_BUFFER_SIZE: usize = 64 * 1024;

/// Buffered locus stream writer.
///
/// Uses itoa for integer formatting to avoid allocation in the hot path.
/// Implements [`VariantSink`], so it can terminate the merge pipeline
/// directly.
pub struct LocusWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    records_written: usize,
}

impl<W: Write> LocusWriter<W> {
    /// Create a new writer with the default buffer size.
    pub fn new(output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(WRITER_BUFFER_SIZE, output),
            itoa_buf: itoa::Buffer::new(),
            records_written: 0,
        }
    }

    /// Number of records written so far.
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Flush buffered output.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    #[inline]
    fn write_int<I: itoa::Integer>(&mut self, n: I) -> Result<()> {
        self.writer.write_all(self.itoa_buf.format(n).as_bytes())?;
        Ok(())
    }

    fn write_common_tail(
        &mut self,
        qual: i32,
        filters: &FilterSet,
        samples: &[SampleInfo],
        forced: bool,
    ) -> Result<()> {
        self.write_int(qual)?;
        write!(self.writer, "\t{}\t", filters)?;
        for (index, sample) in samples.iter().enumerate() {
            if index > 0 {
                self.writer.write_all(b",")?;
            }
            self.write_int(sample.gqx)?;
        }
        self.writer
            .write_all(if forced { b"\t1\n" } else { b"\t.\n" })?;
        self.records_written += 1;
        Ok(())
    }

    /// Write a site record.
    pub fn write_site(&mut self, site: &SiteLocus) -> Result<()> {
        self.writer.write_all(b"SITE\t")?;
        self.write_int(site.pos)?;
        self.writer.write_all(b"\t")?;
        self.write_int(site.pos + 1)?;
        self.writer.write_all(b"\t")?;
        self.write_common_tail(site.quality, &site.filters, &site.samples, false)
    }

    /// Write an indel record (variant or homozygous-reference).
    pub fn write_indel(&mut self, indel: &IndelLocus) -> Result<()> {
        self.writer
            .write_all(if indel.is_variant() { b"INDEL\t" } else { b"HOMREF\t" })?;
        self.write_int(indel.pos)?;
        self.writer.write_all(b"\t")?;
        self.write_int(indel.end)?;
        self.writer.write_all(b"\t")?;
        self.write_common_tail(
            indel.quality,
            &indel.filters,
            &indel.samples,
            indel.is_forced_output(),
        )
    }
}

impl<W: Write> VariantSink for LocusWriter<W> {
    fn process_site(&mut self, site: SiteLocus) -> Result<()> {
        self.write_site(&site)
    }

    fn process_indel(&mut self, indel: IndelLocus) -> Result<()> {
        self.write_indel(&indel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(content: &str) -> Result<Vec<LocusRecord>> {
        LocusReader::new(content.as_bytes()).records().collect()
    }

    #[test]
    fn test_parse_u64_fast() {
        assert_eq!(parse_u64_fast(b"0"), Some(0));
        assert_eq!(parse_u64_fast(b"1234"), Some(1234));
        assert_eq!(parse_u64_fast(b""), None);
        assert_eq!(parse_u64_fast(b"12a"), None);
    }

    #[test]
    fn test_parse_i32_fast() {
        assert_eq!(parse_i32_fast(b"42"), Some(42));
        assert_eq!(parse_i32_fast(b"-7"), Some(-7));
        assert_eq!(parse_i32_fast(b"-"), None);
        assert_eq!(parse_i32_fast(b"x"), None);
    }

    #[test]
    fn test_parse_site_line() {
        let records = read_all("SITE\t12\t.\t50\t.\t40\t.\n").unwrap();
        assert_eq!(records.len(), 1);
        let LocusRecord::Site(site) = &records[0] else {
            panic!("expected site");
        };
        assert_eq!(site.pos, 12);
        assert_eq!(site.quality, 50);
        assert!(site.filters.is_empty());
        assert_eq!(site.samples[0].gqx, 40);
    }

    #[test]
    fn test_parse_indel_with_filters() {
        let records = read_all("INDEL\t10\t15\t30\tLowGQX;LowQual\t22,25\t.\n").unwrap();
        let LocusRecord::Indel(indel) = &records[0] else {
            panic!("expected indel");
        };
        assert_eq!((indel.pos, indel.end), (10, 15));
        assert!(indel.is_variant());
        assert!(indel.filters.test(VariantFilter::LowGqx));
        assert!(indel.filters.test(VariantFilter::LowQual));
        assert_eq!(indel.sample_count(), 2);
    }

    #[test]
    fn test_parse_forced_homref() {
        let records = read_all("HOMREF\t20\t26\t0\t.\t10\t1\n").unwrap();
        let LocusRecord::Indel(indel) = &records[0] else {
            panic!("expected indel");
        };
        assert!(!indel.is_variant());
        assert!(indel.is_forced_output());
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let records = read_all("# header\n\nSITE\t12\t.\t50\t.\t40\t.\n").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_bad_kind_rejected() {
        let err = read_all("SNV\t12\t.\t50\t.\t40\t.\n").unwrap_err();
        assert!(err.to_string().contains("unknown record kind"));
    }

    #[test]
    fn test_bad_span_rejected() {
        let err = read_all("INDEL\t15\t15\t30\t.\t22\t.\n").unwrap_err();
        assert!(err.to_string().contains("greater than pos"));
    }

    #[test]
    fn test_unknown_filter_rejected() {
        let err = read_all("SITE\t12\t.\t50\tBogus\t40\t.\n").unwrap_err();
        assert!(err.to_string().contains("unknown filter label"));
    }

    #[test]
    fn test_sample_count_mismatch_rejected() {
        let err = read_all("SITE\t12\t.\t50\t.\t40,40\t.\nSITE\t13\t.\t50\t.\t40\t.\n").unwrap_err();
        assert!(err.to_string().contains("sample count"));
    }

    #[test]
    fn test_writer_roundtrip() {
        let mut site = SiteLocus::new(12, 50, vec![SampleInfo::new(40)]);
        site.filters.set(VariantFilter::SiteConflict);
        let indel = IndelLocus::homref(20, 26, 0, vec![SampleInfo::new(10)], true);

        let mut out = Vec::new();
        {
            let mut writer = LocusWriter::new(&mut out);
            writer.write_site(&site).unwrap();
            writer.write_indel(&indel).unwrap();
            assert_eq!(writer.records_written(), 2);
            writer.flush().unwrap();
        }

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "SITE\t12\t13\t50\tSiteConflict\t40\t.\nHOMREF\t20\t26\t0\t.\t10\t1\n"
        );

        let records = read_all(&text).unwrap();
        assert_eq!(records.len(), 2);
        let LocusRecord::Site(parsed) = &records[0] else {
            panic!("expected site");
        };
        assert_eq!(parsed.pos, site.pos);
        assert_eq!(parsed.filters, site.filters);
    }
}
