use std::collections::{BTreeMap, BTreeSet};

use crate::graph::IntersectionGraph;
use crate::models::metrics::{intrinsic_metric, INTRINSIC_METRICS};
use crate::models::{Strand, Transcript};
use crate::scoring::MetricRow;
use crate::store::Junction;
use crate::utils::errors::PickError;
use crate::utils::{contains, overlaps_with_flank, total_length, Span};

/// The container contract shared by every tier of the locus hierarchy
///
/// A group lives on one chromosome and (when stranded) one strand, both
/// fixed by the first admitted transcript. Its interval only ever grows.
/// Transcripts are keyed by id in a sorted map, so iteration — and with it
/// scoring and tie-breaking — is deterministic.
#[derive(Clone, Debug, PartialEq)]
pub struct TranscriptGroup {
    chrom: String,
    strand: Strand,
    stranded: bool,
    start: u32,
    end: u32,
    transcripts: BTreeMap<String, Transcript>,
    verified_introns: BTreeSet<Span>,
}

impl TranscriptGroup {
    pub fn new(transcript: Transcript, stranded: bool) -> Self {
        let mut group = Self {
            chrom: transcript.chrom().to_string(),
            strand: transcript.strand(),
            stranded,
            start: transcript.start(),
            end: transcript.end(),
            transcripts: BTreeMap::new(),
            verified_introns: BTreeSet::new(),
        };
        group
            .transcripts
            .insert(transcript.id().to_string(), transcript);
        group
    }

    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    pub fn strand(&self) -> Strand {
        self.strand
    }

    pub fn stranded(&self) -> bool {
        self.stranded
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn span(&self) -> Span {
        (self.start, self.end)
    }

    pub fn len(&self) -> usize {
        self.transcripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcripts.is_empty()
    }

    pub fn transcripts(&self) -> &BTreeMap<String, Transcript> {
        &self.transcripts
    }

    pub fn get(&self, id: &str) -> Option<&Transcript> {
        self.transcripts.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.transcripts.keys().map(|id| id.as_str())
    }

    pub fn into_transcripts(self) -> BTreeMap<String, Transcript> {
        self.transcripts
    }

    /// Returns true if the transcript overlaps the group interval, padded
    /// by `flank`, and is compatible with the group's strand
    pub fn in_interval(&self, transcript: &Transcript, flank: u32) -> bool {
        transcript.chrom() == self.chrom
            && self.strand_compatible(transcript)
            && overlaps_with_flank(self.span(), transcript.span(), flank)
    }

    pub fn strand_compatible(&self, transcript: &Transcript) -> bool {
        !self.stranded || transcript.strand() == self.strand
    }

    /// Admits a transcript, expanding the group interval
    ///
    /// Callers are expected to have checked compatibility beforehand; a
    /// chromosome or strand mismatch here breaches an internal invariant.
    pub fn add(&mut self, transcript: Transcript) -> Result<(), PickError> {
        if transcript.chrom() != self.chrom {
            return Err(PickError::Assertion(format!(
                "cannot add {} ({}) to a group on {}",
                transcript.id(),
                transcript.chrom(),
                self.chrom
            )));
        }
        if !self.strand_compatible(&transcript) {
            return Err(PickError::Assertion(format!(
                "cannot add {} ({}) to a group on strand {}",
                transcript.id(),
                transcript.strand(),
                self.strand
            )));
        }
        self.start = self.start.min(transcript.start());
        self.end = self.end.max(transcript.end());
        self.transcripts
            .insert(transcript.id().to_string(), transcript);
        Ok(())
    }

    /// Swaps a transcript for a re-finalized version of itself
    pub fn replace(&mut self, transcript: Transcript) {
        self.start = self.start.min(transcript.start());
        self.end = self.end.max(transcript.end());
        self.transcripts
            .insert(transcript.id().to_string(), transcript);
    }

    pub fn remove(&mut self, id: &str) -> Option<Transcript> {
        self.transcripts.remove(id)
    }

    /// Records externally supported junctions that fall into the group
    pub fn add_verified_junctions(&mut self, junctions: &[Junction]) {
        for junction in junctions {
            if junction.verified {
                self.verified_introns.insert((junction.start, junction.end));
            }
        }
    }

    pub fn verified_introns(&self) -> &BTreeSet<Span> {
        &self.verified_introns
    }

    /// Builds the undirected intersection graph under the given predicate
    ///
    /// Every transcript becomes a node, so isolated transcripts stay
    /// visible to the clique and community machinery.
    pub fn define_graph<'a, F>(&'a self, intersecting: F) -> IntersectionGraph<'a>
    where
        F: Fn(&Transcript, &Transcript) -> bool,
    {
        let mut graph = IntersectionGraph::new();
        let ids: Vec<&str> = self.ids().collect();
        for &id in &ids {
            graph.add_node(id);
        }
        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                if intersecting(&self.transcripts[a], &self.transcripts[b]) {
                    graph.add_edge(a, b, ());
                }
            }
        }
        graph
    }

    /// Introns of other group members that a transcript spans entirely
    /// within its exons without splicing them out itself
    pub fn retained_introns_of(&self, transcript: &Transcript) -> Vec<Span> {
        let own: BTreeSet<Span> = transcript.introns().iter().cloned().collect();
        let mut pool: BTreeSet<Span> = BTreeSet::new();
        for other in self.transcripts.values() {
            if other.id() != transcript.id() {
                pool.extend(other.introns().iter().cloned());
            }
        }
        pool.into_iter()
            .filter(|intron| {
                !own.contains(intron)
                    && transcript
                        .exons()
                        .iter()
                        .any(|exon| contains(*exon, *intron))
            })
            .collect()
    }

    /// Computes one metric row per transcript: the full intrinsic registry
    /// plus the locus-relative metrics
    pub fn metric_rows(&self) -> BTreeMap<String, MetricRow> {
        let mut locus_exons: BTreeSet<Span> = BTreeSet::new();
        let mut locus_introns: BTreeSet<Span> = BTreeSet::new();
        for transcript in self.transcripts.values() {
            locus_exons.extend(transcript.exons().iter().cloned());
            locus_introns.extend(transcript.introns().iter().cloned());
        }

        let mut rows = BTreeMap::new();
        for (id, transcript) in &self.transcripts {
            let mut row: MetricRow = INTRINSIC_METRICS
                .iter()
                .map(|(name, _)| {
                    // the registry lookup cannot fail for its own names
                    (name.to_string(), intrinsic_metric(transcript, name).unwrap())
                })
                .collect();

            row.insert(
                "exon_fraction".to_string(),
                transcript.exon_num() as f64 / locus_exons.len() as f64,
            );
            row.insert(
                "intron_fraction".to_string(),
                if locus_introns.is_empty() {
                    1.0
                } else {
                    transcript.introns().len() as f64 / locus_introns.len() as f64
                },
            );

            let retained = self.retained_introns_of(transcript);
            row.insert("retained_intron_num".to_string(), retained.len() as f64);
            row.insert(
                "retained_fraction".to_string(),
                total_length(&retained) as f64 / transcript.cdna_length() as f64,
            );

            let verified = transcript
                .introns()
                .iter()
                .filter(|intron| self.verified_introns.contains(intron))
                .count();
            row.insert("verified_introns_num".to_string(), verified as f64);
            row.insert(
                "proportion_verified_introns".to_string(),
                if transcript.introns().is_empty() {
                    0.0
                } else {
                    verified as f64 / transcript.introns().len() as f64
                },
            );

            rows.insert(id.clone(), row);
        }
        rows
    }
}
