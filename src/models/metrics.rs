//! The static metric registry
//!
//! Every scoring or requirement rule addresses a transcript property by
//! name. The registry maps those names to extractor functions over a
//! [`Transcript`] value; it is a compile-time table, populated once and
//! frozen. Boolean properties are reported as `0.0` / `1.0` so that all
//! rule arithmetic stays uniform.

use crate::models::Transcript;

/// Extractor signature of an intrinsic metric
pub type MetricFn = fn(&Transcript) -> f64;

/// Metrics computable from the transcript alone
pub const INTRINSIC_METRICS: &[(&str, MetricFn)] = &[
    ("blast_score", |t| t.blast_score()),
    ("cdna_length", |t| t.cdna_length() as f64),
    ("combined_cds_fraction", |t| {
        fraction(t.combined_cds_length(), t.cdna_length())
    }),
    ("combined_cds_length", |t| t.combined_cds_length() as f64),
    ("combined_cds_num", |t| t.combined_cds_num() as f64),
    ("combined_utr_fraction", |t| {
        fraction(t.combined_utr_length(), t.cdna_length())
    }),
    ("combined_utr_length", |t| t.combined_utr_length() as f64),
    ("combined_utr_num", |t| t.combined_utr_num() as f64),
    ("end_distance_from_tes", |t| t.end_distance_from_tes() as f64),
    ("exon_num", |t| t.exon_num() as f64),
    ("five_utr_length", |t| t.five_utr_length() as f64),
    ("five_utr_num", |t| t.five_utr().len() as f64),
    ("has_start_codon", |t| flag(t.has_start_codon())),
    ("has_stop_codon", |t| flag(t.has_stop_codon())),
    ("is_coding", |t| flag(t.is_coding())),
    ("is_complete", |t| flag(t.is_complete())),
    ("max_intron_length", |t| t.max_intron_length() as f64),
    ("min_intron_length", |t| t.min_intron_length() as f64),
    ("monoexonic", |t| flag(t.monoexonic())),
    ("number_internal_orfs", |t| t.number_internal_orfs() as f64),
    ("selected_cds_fraction", |t| {
        fraction(t.selected_cds_length(), t.cdna_length())
    }),
    ("selected_cds_length", |t| t.selected_cds_length() as f64),
    ("selected_cds_num", |t| t.selected_cds_num() as f64),
    ("source_score", |t| t.source_score().unwrap_or(0.0)),
    ("start_distance_from_tss", |t| {
        t.start_distance_from_tss() as f64
    }),
    ("three_utr_length", |t| t.three_utr_length() as f64),
    ("three_utr_num", |t| t.three_utr().len() as f64),
    ("utr_fraction", |t| {
        fraction(t.combined_utr_length(), t.cdna_length())
    }),
    ("utr_length", |t| t.utr_length() as f64),
    ("utr_num", |t| (t.five_utr().len() + t.three_utr().len()) as f64),
];

/// Metrics that only make sense relative to the containing locus; they are
/// filled into the per-transcript metric rows by the locus itself
pub const LOCUS_METRICS: &[&str] = &[
    "exon_fraction",
    "intron_fraction",
    "proportion_verified_introns",
    "retained_fraction",
    "retained_intron_num",
    "verified_introns_num",
];

/// Looks up an intrinsic metric by name
pub fn intrinsic_metric(transcript: &Transcript, name: &str) -> Option<f64> {
    INTRINSIC_METRICS
        .iter()
        .find(|(metric, _)| *metric == name)
        .map(|(_, extract)| extract(transcript))
}

/// Returns true if `name` is addressable in a rule
pub fn is_metric(name: &str) -> bool {
    INTRINSIC_METRICS.iter().any(|(metric, _)| *metric == name)
        || LOCUS_METRICS.contains(&name)
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn fraction(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Strand, TranscriptBuilder};

    fn transcript() -> Transcript {
        let mut builder = TranscriptBuilder::new();
        builder
            .id("tx-1")
            .chrom("chr1")
            .strand(Strand::Plus)
            .exon(100, 200)
            .exon(400, 500)
            .cds_segment(150, 200)
            .cds_segment(400, 450);
        builder.finalize().unwrap()
    }

    #[test]
    fn test_registry_lookup() {
        let t = transcript();
        assert_eq!(intrinsic_metric(&t, "cdna_length"), Some(202.0));
        assert_eq!(intrinsic_metric(&t, "exon_num"), Some(2.0));
        assert_eq!(intrinsic_metric(&t, "combined_cds_length"), Some(102.0));
        assert_eq!(intrinsic_metric(&t, "is_coding"), Some(1.0));
        assert_eq!(intrinsic_metric(&t, "monoexonic"), Some(0.0));
        assert_eq!(intrinsic_metric(&t, "no_such_metric"), None);
    }

    #[test]
    fn test_registry_is_sorted_and_unique() {
        for pair in INTRINSIC_METRICS.windows(2) {
            assert!(pair[0].0 < pair[1].0, "{} >= {}", pair[0].0, pair[1].0);
        }
    }

    #[test]
    fn test_locus_metrics_are_addressable() {
        assert!(is_metric("exon_fraction"));
        assert!(is_metric("verified_introns_num"));
        assert!(is_metric("cdna_length"));
        assert!(!is_metric("score"));
    }
}
