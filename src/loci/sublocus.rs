use std::collections::BTreeMap;
use std::fmt;

use itertools::iproduct;

use crate::config::ScoringConfiguration;
use crate::loci::{Monosublocus, TranscriptGroup};
use crate::models::Transcript;
use crate::scoring::{score_transcripts, MetricRow};
use crate::utils::errors::PickError;
use crate::utils::{contains, set_overlap};

/// A strict, geometry-defined subgroup of a superlocus
///
/// Subloci are the first stage that looks at fine structure: two
/// transcripts belong together only if they share a splice junction or one
/// spans an intron of the other within an exon. Each sublocus scores its
/// members and elects a single winner.
#[derive(Clone, Debug)]
pub struct Sublocus {
    group: TranscriptGroup,
    rows: Option<BTreeMap<String, MetricRow>>,
    scores: Option<BTreeMap<String, f64>>,
}

impl Sublocus {
    pub fn new(transcript: Transcript, stranded: bool) -> Self {
        Self {
            group: TranscriptGroup::new(transcript, stranded),
            rows: None,
            scores: None,
        }
    }

    pub fn group(&self) -> &TranscriptGroup {
        &self.group
    }

    pub fn add(&mut self, transcript: Transcript) -> Result<(), PickError> {
        // scores are stale once the membership changes
        self.rows = None;
        self.scores = None;
        self.group.add(transcript)
    }

    /// The strict intersection predicate of the sublocus stage
    ///
    /// Multi-exonic pairs must share a splice site, or one transcript must
    /// hold an intron of the other completely within an exon. With
    /// `cds_only` both checks run on the coding component of coding pairs.
    /// Pairs with a monoexonic member intersect on plain exonic overlap
    /// when `simple_overlap_for_monoexonic` is set; otherwise a coding
    /// pair must overlap on its CDS as well.
    pub fn is_intersecting(
        one: &Transcript,
        other: &Transcript,
        cds_only: bool,
        simple_overlap_for_monoexonic: bool,
    ) -> bool {
        if one.id() == other.id() || one.strand().is_opposite(other.strand()) {
            return false;
        }

        let coding_pair = one.is_coding() && other.is_coding();

        if !one.monoexonic() && !other.monoexonic() {
            let (one_introns, other_introns, one_exons, other_exons) =
                if cds_only && coding_pair {
                    (
                        one.selected_cds_introns(),
                        other.selected_cds_introns(),
                        one.coding_exons(),
                        other.coding_exons(),
                    )
                } else {
                    (
                        one.introns().to_vec(),
                        other.introns().to_vec(),
                        one.exons().to_vec(),
                        other.exons().to_vec(),
                    )
                };

            if iproduct!(&one_introns, &other_introns)
                .any(|(a, b)| a.0 == b.0 || a.1 == b.1)
            {
                return true;
            }
            if iproduct!(&one_introns, &other_exons).any(|(intron, exon)| contains(*exon, *intron))
            {
                return true;
            }
            if iproduct!(&other_introns, &one_exons).any(|(intron, exon)| contains(*exon, *intron))
            {
                return true;
            }
            return false;
        }

        if set_overlap(one.exons(), other.exons()) == 0 {
            return false;
        }
        if cds_only && coding_pair {
            return set_overlap(one.combined_cds(), other.combined_cds()) > 0;
        }
        if simple_overlap_for_monoexonic {
            return true;
        }
        if coding_pair {
            return set_overlap(one.combined_cds(), other.combined_cds()) > 0;
        }
        true
    }

    /// Computes metric rows and composite scores for all members
    ///
    /// The results are cached until the membership changes.
    pub fn calculate_scores(&mut self, scoring: &ScoringConfiguration) {
        if self.scores.is_some() {
            return;
        }
        let rows = self.group.metric_rows();
        let scores = score_transcripts(&rows, &scoring.requirements, &scoring.scoring);
        self.rows = Some(rows);
        self.scores = Some(scores);
    }

    pub fn scores(&self) -> Option<&BTreeMap<String, f64>> {
        self.scores.as_ref()
    }

    /// The metric rows backing the scores, available after scoring ran
    pub fn metric_rows(&self) -> Option<&BTreeMap<String, MetricRow>> {
        self.rows.as_ref()
    }

    /// Returns the best-scored transcript id; ties break lexicographically
    pub fn choose_best(&self) -> Option<(&str, f64)> {
        let scores = self.scores.as_ref()?;
        let mut best: Option<(&str, f64)> = None;
        for (id, &score) in scores {
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((id.as_str(), score)),
            }
        }
        best
    }

    /// Elects the winner and wraps it into a [`Monosublocus`]
    pub fn define_monosublocus(&mut self, scoring: &ScoringConfiguration) -> Option<Monosublocus> {
        self.calculate_scores(scoring);
        let (winner, score) = match self.choose_best() {
            Some(best) => best,
            None => return None,
        };
        self.group
            .get(winner)
            .cloned()
            .map(|transcript| Monosublocus::new(transcript, score))
    }
}

impl fmt::Display for Sublocus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "sublocus:{}:{}-{}({}) [{} transcripts]",
            self.group.chrom(),
            self.group.start(),
            self.group.end(),
            self.group.strand(),
            self.group.len()
        )?;
        for (id, transcript) in self.group.transcripts() {
            let score = self
                .scores
                .as_ref()
                .and_then(|scores| scores.get(id).copied());
            match score {
                Some(score) => writeln!(
                    f,
                    "\t{}\t{}\t{}\t{:.2}",
                    id,
                    transcript.start(),
                    transcript.end(),
                    score
                )?,
                None => writeln!(f, "\t{}\t{}\t{}\t.", id, transcript.start(), transcript.end())?,
            }
        }
        Ok(())
    }
}
