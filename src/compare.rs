//! Pairwise comparison of transcript geometry
//!
//! [`compare`] relates a prediction to a reference transcript and reports
//! per-base and per-junction recall/precision/F1 plus a class code from a
//! closed vocabulary. The class code summarizes the structural relationship
//! and drives the laxer intersection predicates of the locus hierarchy.

use std::collections::BTreeSet;
use std::fmt;

use itertools::iproduct;

use crate::models::Transcript;
use crate::utils::{contains, distance, set_overlap, Span};

/// The closed class-code vocabulary
///
/// Lowercase/uppercase pairs distinguish monoexonic from multi-exonic
/// configurations of the same relationship.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassCode {
    /// `=` — the intron chains are identical
    Match,
    /// `_` — monoexonic pair with near-complete overlap
    MonoexonicMatch,
    /// `n` — the prediction extends the reference intron chain beyond its span
    Extension,
    /// `J` — the prediction extends the reference intron chain internally
    InternalExtension,
    /// `j` — junctions are shared but the chains disagree
    AlternativeSplicing,
    /// `C` — the prediction intron chain is a subset of the reference's
    Contained,
    /// `c` — the prediction is fully contained within the reference exons
    ExonicContained,
    /// `g` — monoexonic prediction overlapping a multi-exonic reference
    MonoOverlap,
    /// `G` — multi-exonic prediction overlapping a monoexonic reference
    ReverseMonoOverlap,
    /// `o` — generic exonic overlap without junction agreement
    Overlap,
    /// `h` — no junction agreement, but an intron of one model lies fully
    /// inside an exon of the other
    RetainedIntron,
    /// `x` — exonic overlap on the opposite strand
    Antisense,
    /// `i` — monoexonic prediction inside a reference intron
    WithinIntron,
    /// `I` — multi-exonic prediction inside a reference intron
    MultiWithinIntron,
    /// `ri` — monoexonic reference inside a prediction intron
    ReverseWithinIntron,
    /// `rI` — multi-exonic reference inside a prediction intron
    ReverseMultiWithinIntron,
    /// `p` — proximal, non-overlapping, same strand
    RunOn,
    /// `P` — proximal, non-overlapping, different strand
    RunOnOpposite,
    /// `f` — fusion across several references; never produced by a pairwise
    /// comparison, only by one-vs-many tooling
    Fusion,
    /// `NA` — unrelated
    Unrelated,
}

impl ClassCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassCode::Match => "=",
            ClassCode::MonoexonicMatch => "_",
            ClassCode::Extension => "n",
            ClassCode::InternalExtension => "J",
            ClassCode::AlternativeSplicing => "j",
            ClassCode::Contained => "C",
            ClassCode::ExonicContained => "c",
            ClassCode::MonoOverlap => "g",
            ClassCode::ReverseMonoOverlap => "G",
            ClassCode::Overlap => "o",
            ClassCode::RetainedIntron => "h",
            ClassCode::Antisense => "x",
            ClassCode::WithinIntron => "i",
            ClassCode::MultiWithinIntron => "I",
            ClassCode::ReverseWithinIntron => "ri",
            ClassCode::ReverseMultiWithinIntron => "rI",
            ClassCode::RunOn => "p",
            ClassCode::RunOnOpposite => "P",
            ClassCode::Fusion => "f",
            ClassCode::Unrelated => "NA",
        }
    }
}

impl fmt::Display for ClassCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The structured result of a pairwise comparison
///
/// Recall and precision are percentages in `[0, 100]`. The base-level
/// values (`n_*`) are computed over exonic positions, the junction-level
/// values (`j_*`) over introns as `(donor, acceptor)` pairs.
#[derive(Clone, Debug, PartialEq)]
pub struct Comparison {
    pub ccode: ClassCode,
    pub n_recall: f64,
    pub n_precision: f64,
    pub n_f1: f64,
    pub j_recall: f64,
    pub j_precision: f64,
    pub j_f1: f64,
}

impl Comparison {
    fn unrelated() -> Self {
        Self {
            ccode: ClassCode::Unrelated,
            n_recall: 0.0,
            n_precision: 0.0,
            n_f1: 0.0,
            j_recall: 0.0,
            j_precision: 0.0,
            j_f1: 0.0,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} (n: {:.1}/{:.1}, j: {:.1}/{:.1})",
            self.ccode, self.n_recall, self.n_precision, self.j_recall, self.j_precision
        )
    }
}

/// Relates `prediction` to `reference`
///
/// Equivalent to [`compare_with_flank`] with a flank of 0, which means the
/// proximity codes `p`/`P` only fire for book-ended or interleaved models.
pub fn compare(reference: &Transcript, prediction: &Transcript) -> Comparison {
    compare_with_flank(reference, prediction, 0)
}

/// Relates `prediction` to `reference`, treating non-overlapping models
/// within `flank` bases as neighbours
pub fn compare_with_flank(
    reference: &Transcript,
    prediction: &Transcript,
    flank: u32,
) -> Comparison {
    if reference.chrom() != prediction.chrom() {
        return Comparison::unrelated();
    }

    let overlap = set_overlap(reference.exons(), prediction.exons());
    let n_recall = percent(overlap, reference.cdna_length());
    let n_precision = percent(overlap, prediction.cdna_length());
    let n_f1 = f1(n_recall, n_precision);

    let ref_introns: BTreeSet<Span> = reference.introns().iter().cloned().collect();
    let pred_introns: BTreeSet<Span> = prediction.introns().iter().cloned().collect();
    let shared = ref_introns.intersection(&pred_introns).count();
    let j_recall = percent(shared as u64, ref_introns.len() as u64);
    let j_precision = percent(shared as u64, pred_introns.len() as u64);
    let j_f1 = f1(j_recall, j_precision);

    let ccode = if overlap == 0 {
        no_overlap_code(reference, prediction, flank)
    } else {
        overlap_code(
            reference,
            prediction,
            &ref_introns,
            &pred_introns,
            shared,
            n_recall,
            n_precision,
        )
    };

    Comparison {
        ccode,
        n_recall,
        n_precision,
        n_f1,
        j_recall,
        j_precision,
        j_f1,
    }
}

fn no_overlap_code(reference: &Transcript, prediction: &Transcript, flank: u32) -> ClassCode {
    if reference
        .introns()
        .iter()
        .any(|intron| contains(*intron, prediction.span()))
    {
        return if prediction.monoexonic() {
            ClassCode::WithinIntron
        } else {
            ClassCode::MultiWithinIntron
        };
    }
    if prediction
        .introns()
        .iter()
        .any(|intron| contains(*intron, reference.span()))
    {
        return if reference.monoexonic() {
            ClassCode::ReverseWithinIntron
        } else {
            ClassCode::ReverseMultiWithinIntron
        };
    }
    if distance(reference.span(), prediction.span()) <= flank {
        return if reference.strand() == prediction.strand() {
            ClassCode::RunOn
        } else {
            ClassCode::RunOnOpposite
        };
    }
    ClassCode::Unrelated
}

fn overlap_code(
    reference: &Transcript,
    prediction: &Transcript,
    ref_introns: &BTreeSet<Span>,
    pred_introns: &BTreeSet<Span>,
    shared: usize,
    n_recall: f64,
    n_precision: f64,
) -> ClassCode {
    if reference.strand().is_opposite(prediction.strand()) {
        return ClassCode::Antisense;
    }

    match (prediction.monoexonic(), reference.monoexonic()) {
        (false, false) => {
            if ref_introns == pred_introns {
                return ClassCode::Match;
            }
            if shared > 0 {
                if pred_introns.is_superset(ref_introns) {
                    return if prediction.start() < reference.start()
                        || prediction.end() > reference.end()
                    {
                        ClassCode::Extension
                    } else {
                        ClassCode::InternalExtension
                    };
                }
                if pred_introns.is_subset(ref_introns) {
                    return ClassCode::Contained;
                }
                return ClassCode::AlternativeSplicing;
            }
            if intron_in_exon(prediction, reference) || intron_in_exon(reference, prediction) {
                return ClassCode::RetainedIntron;
            }
            ClassCode::Overlap
        }
        (true, true) => {
            if n_recall.max(n_precision) >= 80.0 {
                return ClassCode::MonoexonicMatch;
            }
            if is_full(n_precision) {
                return ClassCode::ExonicContained;
            }
            ClassCode::Overlap
        }
        (false, true) => {
            if intron_in_exon(prediction, reference) {
                return ClassCode::RetainedIntron;
            }
            ClassCode::ReverseMonoOverlap
        }
        (true, false) => {
            if intron_in_exon(reference, prediction) {
                return ClassCode::RetainedIntron;
            }
            if is_full(n_precision) {
                return ClassCode::ExonicContained;
            }
            ClassCode::MonoOverlap
        }
    }
}

/// Returns true if any intron of `of` lies fully inside an exon of `within`
pub(crate) fn intron_in_exon(of: &Transcript, within: &Transcript) -> bool {
    iproduct!(of.introns(), within.exons()).any(|(intron, exon)| contains(*exon, *intron))
}

fn percent(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}

fn f1(recall: f64, precision: f64) -> f64 {
    if recall + precision == 0.0 {
        0.0
    } else {
        2.0 * recall * precision / (recall + precision)
    }
}

fn is_full(percentage: f64) -> bool {
    percentage >= 100.0 - 1e-9
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Strand;
    use crate::tests::transcripts::transcript;

    #[test]
    fn test_identical_intron_chains() {
        let a = transcript("A", Strand::Plus, &[(100, 200), (400, 500)]);
        let b = transcript("B", Strand::Plus, &[(150, 200), (400, 550)]);
        let result = compare(&a, &b);
        assert_eq!(result.ccode, ClassCode::Match);
        assert!(result.j_f1 > 0.0);
        assert_eq!(result.j_recall, 100.0);
        assert_eq!(result.j_precision, 100.0);
    }

    #[test]
    fn test_base_level_statistics() {
        let a = transcript("A", Strand::Plus, &[(100, 200), (400, 500)]);
        let b = transcript("B", Strand::Plus, &[(150, 200), (400, 550)]);
        let result = compare(&a, &b);
        // 51 + 101 shared bases, reference 202, prediction 202
        assert!((result.n_recall - 152.0 / 202.0 * 100.0).abs() < 1e-9);
        assert!((result.n_precision - 152.0 / 202.0 * 100.0).abs() < 1e-9);
        assert!(result.n_f1 > 0.0);
    }

    #[test]
    fn test_shared_junction_without_chain_agreement() {
        let a = transcript("A", Strand::Plus, &[(100, 200), (400, 500), (700, 800)]);
        let b = transcript("B", Strand::Plus, &[(150, 200), (400, 500), (650, 690)]);
        let result = compare(&a, &b);
        assert_eq!(result.ccode, ClassCode::AlternativeSplicing);
        assert!(result.j_f1 > 0.0);
        assert!(result.j_recall < 100.0);
    }

    #[test]
    fn test_extension_codes() {
        let reference = transcript("ref", Strand::Plus, &[(100, 200), (400, 500)]);
        // same chain plus one novel intron beyond the reference span
        let beyond = transcript(
            "beyond",
            Strand::Plus,
            &[(100, 200), (400, 500), (700, 800)],
        );
        assert_eq!(compare(&reference, &beyond).ccode, ClassCode::Extension);

        // novel intron carved out of a reference exon
        let inside = transcript(
            "inside",
            Strand::Plus,
            &[(100, 200), (400, 430), (460, 500)],
        );
        assert_eq!(
            compare(&reference, &inside).ccode,
            ClassCode::InternalExtension
        );

        // reversed direction: the prediction's chain is a subset
        assert_eq!(compare(&beyond, &reference).ccode, ClassCode::Contained);
    }

    #[test]
    fn test_intron_retention() {
        let retained = transcript("A", Strand::Plus, &[(100, 500)]);
        let spliced = transcript("B", Strand::Plus, &[(100, 200), (300, 500)]);
        assert_eq!(compare(&spliced, &retained).ccode, ClassCode::RetainedIntron);
        assert_eq!(compare(&retained, &spliced).ccode, ClassCode::RetainedIntron);
    }

    #[test]
    fn test_monoexonic_match_requires_80_percent() {
        let a = transcript("A", Strand::Plus, &[(100, 200)]);
        let b = transcript("B", Strand::Plus, &[(110, 200)]);
        assert_eq!(compare(&a, &b).ccode, ClassCode::MonoexonicMatch);

        let c = transcript("C", Strand::Plus, &[(180, 500)]);
        let lax = compare(&a, &c);
        assert_ne!(lax.ccode, ClassCode::MonoexonicMatch);
        assert_eq!(lax.ccode, ClassCode::Overlap);
    }

    #[test]
    fn test_contained_monoexonic() {
        let reference = transcript("ref", Strand::Plus, &[(100, 200), (400, 500)]);
        let contained = transcript("pred", Strand::Plus, &[(420, 480)]);
        assert_eq!(
            compare(&reference, &contained).ccode,
            ClassCode::ExonicContained
        );
    }

    #[test]
    fn test_generic_mono_multi_overlaps() {
        let reference = transcript("ref", Strand::Plus, &[(100, 200), (400, 500)]);
        // overlaps the last exon and pokes beyond it, retains nothing
        let mono = transcript("mono", Strand::Plus, &[(450, 600)]);
        assert_eq!(compare(&reference, &mono).ccode, ClassCode::MonoOverlap);
        assert_eq!(
            compare(&mono, &reference).ccode,
            ClassCode::ReverseMonoOverlap
        );
    }

    #[test]
    fn test_opposite_strand_overlap() {
        let a = transcript("A", Strand::Plus, &[(100, 200), (400, 500)]);
        let b = transcript("B", Strand::Minus, &[(100, 200), (400, 500)]);
        assert_eq!(compare(&a, &b).ccode, ClassCode::Antisense);
    }

    #[test]
    fn test_within_intron() {
        let reference = transcript("ref", Strand::Plus, &[(100, 200), (900, 1000)]);
        let mono = transcript("mono", Strand::Plus, &[(300, 400)]);
        let multi = transcript("multi", Strand::Plus, &[(300, 400), (500, 600)]);
        assert_eq!(compare(&reference, &mono).ccode, ClassCode::WithinIntron);
        assert_eq!(
            compare(&reference, &multi).ccode,
            ClassCode::MultiWithinIntron
        );
        assert_eq!(
            compare(&mono, &reference).ccode,
            ClassCode::ReverseWithinIntron
        );
        assert_eq!(
            compare(&multi, &reference).ccode,
            ClassCode::ReverseMultiWithinIntron
        );
    }

    #[test]
    fn test_proximity_codes() {
        let a = transcript("A", Strand::Plus, &[(100, 200)]);
        let b = transcript("B", Strand::Plus, &[(400, 500)]);
        let c = transcript("C", Strand::Minus, &[(400, 500)]);

        assert_eq!(compare_with_flank(&a, &b, 1000).ccode, ClassCode::RunOn);
        assert_eq!(
            compare_with_flank(&a, &c, 1000).ccode,
            ClassCode::RunOnOpposite
        );
        assert_eq!(compare_with_flank(&a, &b, 100).ccode, ClassCode::Unrelated);
        assert_eq!(compare(&a, &b).ccode, ClassCode::Unrelated);
    }

    #[test]
    fn test_different_chromosomes_are_unrelated() {
        let a = transcript("A", Strand::Plus, &[(100, 200)]);
        let mut builder = crate::models::TranscriptBuilder::new();
        builder.id("B").chrom("chr9").strand(Strand::Plus).exon(100, 200);
        let b = builder.finalize().unwrap();
        let result = compare(&a, &b);
        assert_eq!(result.ccode, ClassCode::Unrelated);
        assert_eq!(result.n_f1, 0.0);
    }

    #[test]
    fn test_zero_overlap_has_zero_f1() {
        let a = transcript("A", Strand::Plus, &[(100, 200)]);
        let b = transcript("B", Strand::Plus, &[(400, 500)]);
        let result = compare(&a, &b);
        assert_eq!(result.n_f1, 0.0);
        assert_eq!(result.n_recall, 0.0);
        assert_eq!(result.n_precision, 0.0);
    }
}
