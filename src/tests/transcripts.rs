//! This module contains some standard transcripts to use for testing
//!
//! This simplifies writing unit- and integration tests. The geometries are
//! small and hand-checkable on purpose; the multi-exon fixtures carry the
//! edge cases (shared junctions, retained introns, CDS/UTR splits) that
//! the clustering predicates care about.

use crate::models::{Strand, Transcript, TranscriptBuilder};
use crate::utils::Span;

/// A finalized, non-coding transcript on `chr1` with the given exons
pub fn transcript(id: &str, strand: Strand, exons: &[Span]) -> Transcript {
    let mut builder = TranscriptBuilder::new();
    builder.id(id).chrom("chr1").strand(strand);
    for &(start, end) in exons {
        builder.exon(start, end);
    }
    // the fixture geometries are valid by construction
    builder.finalize().unwrap()
}

/// A finalized, coding transcript on `chr1`
pub fn coding_transcript(
    id: &str,
    strand: Strand,
    exons: &[Span],
    cds: &[Span],
) -> Transcript {
    let mut builder = TranscriptBuilder::new();
    builder.id(id).chrom("chr1").strand(strand);
    for &(start, end) in exons {
        builder.exon(start, end);
    }
    for &(start, end) in cds {
        builder.cds_segment(start, end);
    }
    builder.finalize().unwrap()
}

/// A monoexonic transcript carrying an assembler score
pub fn scored_transcript(id: &str, strand: Strand, exons: &[Span], score: f64) -> Transcript {
    let mut builder = TranscriptBuilder::new();
    builder.id(id).chrom("chr1").strand(strand).score(score);
    for &(start, end) in exons {
        builder.exon(start, end);
    }
    builder.finalize().unwrap()
}

/// A five-exon coding transcript with UTRs on both sides
///
/// ```text
/// exons:  100-200   400-500   700-800   1000-1100   1300-1400
/// CDS:        150-200   400-500   700-800   1000-1050
/// ```
pub fn standard_transcript() -> Transcript {
    let mut builder = TranscriptBuilder::new();
    builder
        .id("standard")
        .chrom("chr1")
        .strand(Strand::Plus)
        .parent("standard-gene")
        .exon(100, 200)
        .exon(400, 500)
        .exon(700, 800)
        .exon(1000, 1100)
        .exon(1300, 1400)
        .cds_segment(150, 200)
        .cds_segment(400, 500)
        .cds_segment(700, 800)
        .cds_segment(1000, 1050);
    builder.finalize().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_transcript() {
        let t = standard_transcript();
        assert_eq!(t.exon_num(), 5);
        assert!(t.is_coding());
        assert_eq!(t.cdna_length(), 505);
        assert_eq!(t.combined_cds_length(), 51 + 101 + 101 + 51);
        assert_eq!(
            t.cdna_length(),
            t.combined_cds_length() + t.combined_utr_length()
        );
        assert_eq!(t.five_utr(), vec![(100, 149)]);
        assert_eq!(t.three_utr(), vec![(1051, 1100), (1300, 1400)]);
    }
}
