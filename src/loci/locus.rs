use std::collections::BTreeMap;
use std::fmt;

use log::debug;

use crate::compare::{compare_with_flank, ClassCode};
use crate::config::Configuration;
use crate::loci::{MonosublocusHolder, TranscriptGroup};
use crate::models::Transcript;
use crate::scoring::{passes_requirements, MetricRow};
use crate::utils::{contains, set_overlap};

/// A terminal locus: one primary transcript plus admitted isoforms
///
/// Loci are the output of the pipeline. The primary transcript is the
/// winner of the final selection; alternative isoforms may be admitted
/// afterwards if they pass the configured checks. A locus can additionally
/// be flagged as a probable fragment of a better neighbouring locus.
#[derive(Clone, Debug)]
pub struct Locus {
    group: TranscriptGroup,
    primary_id: String,
    scores: BTreeMap<String, f64>,
    is_fragment: bool,
}

impl Locus {
    pub fn new(primary: Transcript, score: f64) -> Self {
        let primary_id = primary.id().to_string();
        let mut scores = BTreeMap::new();
        scores.insert(primary_id.clone(), score);
        Self {
            group: TranscriptGroup::new(primary, true),
            primary_id,
            scores,
            is_fragment: false,
        }
    }

    pub fn chrom(&self) -> &str {
        self.group.chrom()
    }

    pub fn start(&self) -> u32 {
        self.group.start()
    }

    pub fn end(&self) -> u32 {
        self.group.end()
    }

    /// A region-derived name, e.g. `locus:chr1:100-5000(+)`
    pub fn name(&self) -> String {
        format!(
            "locus:{}:{}-{}({})",
            self.group.chrom(),
            self.group.start(),
            self.group.end(),
            self.group.strand()
        )
    }

    /// The winning transcript of the final selection
    pub fn primary(&self) -> &Transcript {
        // the primary is inserted at construction and never removed
        self.group.get(&self.primary_id).unwrap()
    }

    /// The composite score of the primary transcript
    pub fn score(&self) -> f64 {
        self.scores[&self.primary_id]
    }

    pub fn score_of(&self, id: &str) -> Option<f64> {
        self.scores.get(id).copied()
    }

    pub fn transcript_ids(&self) -> impl Iterator<Item = &str> {
        self.group.ids()
    }

    pub fn transcripts(&self) -> &BTreeMap<String, Transcript> {
        self.group.transcripts()
    }

    /// The admitted alternative isoforms, without the primary
    pub fn isoforms(&self) -> impl Iterator<Item = &Transcript> {
        let primary_id = &self.primary_id;
        self.group
            .transcripts()
            .values()
            .filter(move |t| t.id() != primary_id.as_str())
    }

    pub fn isoform_count(&self) -> usize {
        self.group.len() - 1
    }

    pub fn is_fragment(&self) -> bool {
        self.is_fragment
    }

    pub fn set_fragment(&mut self, flag: bool) {
        self.is_fragment = flag;
    }

    /// Tries to admit `candidate` as an alternative isoform
    ///
    /// The candidate must intersect the primary under the final-stage
    /// predicate, share its coding status and (for coding pairs) enough of
    /// its CDS, share a splice site when both are multi-exonic, not retain
    /// an intron of the primary (unless configured otherwise), score above
    /// zero and pass the isoform requirements. Returns whether the
    /// candidate was admitted.
    pub fn try_add_alternative(
        &mut self,
        candidate: &Transcript,
        score: f64,
        config: &Configuration,
        row: Option<&MetricRow>,
    ) -> bool {
        let as_config = &config.pick.alternative_splicing;
        if !as_config.report
            || self.isoform_count() >= as_config.max_isoforms
            || candidate.id() == self.primary_id
            || score <= 0.0
        {
            return false;
        }
        if candidate.chrom() != self.group.chrom() || !self.group.strand_compatible(candidate) {
            return false;
        }

        let primary = self.primary();
        if !MonosublocusHolder::is_intersecting(
            primary,
            candidate,
            false,
            config.pick.clustering.min_cdna_overlap,
            config.pick.clustering.min_cds_overlap,
        ) {
            return false;
        }

        if primary.is_coding() != candidate.is_coding() {
            return false;
        }
        if primary.is_coding() {
            let shared = set_overlap(primary.combined_cds(), candidate.combined_cds());
            let fraction = shared as f64 / candidate.combined_cds_length() as f64;
            if fraction < as_config.min_cds_overlap {
                debug!(
                    "rejecting {}: CDS overlap {:.2} below threshold",
                    candidate.id(),
                    fraction
                );
                return false;
            }
        }

        if !primary.monoexonic()
            && !candidate.monoexonic()
            && primary
                .splices()
                .intersection(candidate.splices())
                .next()
                .is_none()
        {
            return false;
        }

        if !as_config.keep_retained_introns {
            let retains = primary.introns().iter().any(|intron| {
                candidate
                    .exons()
                    .iter()
                    .any(|exon| contains(*exon, *intron))
            });
            if retains {
                debug!("rejecting {}: retains an intron of the primary", candidate.id());
                return false;
            }
        }

        if let Some(row) = row {
            if !passes_requirements(row, &config.scoring.as_requirements) {
                return false;
            }
        }

        if self.group.add(candidate.clone()).is_err() {
            return false;
        }
        self.scores.insert(candidate.id().to_string(), score);
        true
    }

    /// Returns true if `other` looks like a fragment of this locus:
    /// nearby or antisense, not better scored, with a fragment-typical
    /// class code against this primary
    pub fn other_is_fragment(&self, other: &Locus, flank: u32) -> bool {
        if self.score() <= other.score() {
            return false;
        }
        let comparison = compare_with_flank(self.primary(), other.primary(), flank);
        matches!(
            comparison.ccode,
            ClassCode::RunOn
                | ClassCode::RunOnOpposite
                | ClassCode::Antisense
                | ClassCode::WithinIntron
                | ClassCode::MultiWithinIntron
                | ClassCode::ReverseWithinIntron
                | ClassCode::ReverseMultiWithinIntron
        )
    }
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "{}\t{}\t{}\t{:.2}\t{}\t{}",
            self.group.chrom(),
            self.group.start(),
            self.group.end(),
            self.score(),
            self.name(),
            self.group.strand()
        )?;
        for (id, transcript) in self.group.transcripts() {
            let role = if *id == self.primary_id {
                "primary"
            } else {
                "isoform"
            };
            writeln!(
                f,
                "\t{}\t{}\t{}\t{}\t{}",
                transcript.id(),
                transcript.start(),
                transcript.end(),
                role,
                self.scores.get(id).copied().unwrap_or(0.0)
            )?;
        }
        Ok(())
    }
}
