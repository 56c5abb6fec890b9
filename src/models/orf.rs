use std::fmt;

use crate::models::Strand;
use crate::utils::errors::TranscriptError;
use crate::utils::{total_length, Span};

/// Tags one stretch of an internal ORF layout
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SegmentKind {
    Cds,
    Utr,
    Exon,
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SegmentKind::Cds => "CDS",
                SegmentKind::Utr => "UTR",
                SegmentKind::Exon => "exon",
            }
        )
    }
}

/// One tagged stretch of an internal ORF layout
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub start: u32,
    pub end: u32,
}

impl Segment {
    pub fn new(kind: SegmentKind, start: u32, end: u32) -> Self {
        Self { kind, start, end }
    }

    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    /// Only implemented to satisfy clippy. Segments cannot be empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn span(&self) -> Span {
        (self.start, self.end)
    }
}

/// One open reading frame laid out over the exons of a transcript
///
/// The exon segments describe the full cDNA; the CDS and UTR segments
/// partition the very same bases for this reading frame.
#[derive(Clone, Debug, PartialEq)]
pub struct InternalOrf {
    segments: Vec<Segment>,
}

impl InternalOrf {
    pub fn new(mut segments: Vec<Segment>) -> Self {
        segments.sort_unstable_by_key(|s| (s.start, s.end, s.kind));
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn cds(&self) -> Vec<Span> {
        self.spans_of(SegmentKind::Cds)
    }

    pub fn utr(&self) -> Vec<Span> {
        self.spans_of(SegmentKind::Utr)
    }

    pub fn exons(&self) -> Vec<Span> {
        self.spans_of(SegmentKind::Exon)
    }

    pub fn cds_len(&self) -> u64 {
        total_length(&self.cds())
    }

    pub fn utr_len(&self) -> u64 {
        total_length(&self.utr())
    }

    pub fn exonic_len(&self) -> u64 {
        total_length(&self.exons())
    }

    pub fn is_coding(&self) -> bool {
        self.segments.iter().any(|s| s.kind == SegmentKind::Cds)
    }

    fn spans_of(&self, kind: SegmentKind) -> Vec<Span> {
        self.segments
            .iter()
            .filter(|s| s.kind == kind)
            .map(Segment::span)
            .collect()
    }
}

/// An externally called ORF, expressed in cDNA coordinates
///
/// `cds_start` and `cds_end` are 1-based offsets into the spliced cDNA,
/// the way ORF callers report them.
#[derive(Clone, Debug, PartialEq)]
pub struct OrfRecord {
    pub cds_start: u32,
    pub cds_end: u32,
    pub strand: Strand,
    pub has_start_codon: bool,
    pub has_stop_codon: bool,
    pub cds_len: u32,
}

impl OrfRecord {
    pub fn is_complete(&self) -> bool {
        self.has_start_codon && self.has_stop_codon
    }

    /// Checks the cDNA offsets against the length of the target transcript
    pub fn validate(&self, cdna_length: u64) -> Result<(), TranscriptError> {
        if self.cds_start < 1 || self.cds_start >= self.cds_end {
            return Err(TranscriptError::invalid_cds(format!(
                "ORF coordinates {}-{} are not a valid cDNA range",
                self.cds_start, self.cds_end
            )));
        }
        if u64::from(self.cds_end) > cdna_length {
            return Err(TranscriptError::invalid_cds(format!(
                "ORF end {} lies outside the cDNA (length {})",
                self.cds_end, cdna_length
            )));
        }
        Ok(())
    }
}
