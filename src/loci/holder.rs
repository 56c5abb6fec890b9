use std::cmp::Ordering;
use std::collections::BTreeSet;

use log::debug;

use crate::compare::{compare, intron_in_exon, ClassCode};
use crate::config::Configuration;
use crate::graph::{find_cliques, find_communities};
use crate::loci::{Locus, Monosublocus, TranscriptGroup};
use crate::models::Transcript;
use crate::scoring::score_transcripts;
use crate::utils::errors::PickError;

/// The container that re-aggregates sublocus winners for final selection
///
/// The holder's intersection predicate is deliberately laxer than the
/// sublocus one: transcripts rejected at the stricter stage may rejoin
/// here before the clique-based selector carves out the definitive loci.
#[derive(Clone, Debug)]
pub struct MonosublocusHolder {
    group: TranscriptGroup,
    scores: Vec<(String, f64)>,
    loci: Vec<Locus>,
    splitted: bool,
}

impl MonosublocusHolder {
    pub fn new(monosublocus: Monosublocus, stranded: bool) -> Self {
        Self {
            group: TranscriptGroup::new(monosublocus.into_transcript(), stranded),
            scores: vec![],
            loci: vec![],
            splitted: false,
        }
    }

    pub fn group(&self) -> &TranscriptGroup {
        &self.group
    }

    pub fn add_monosublocus(&mut self, monosublocus: Monosublocus) -> Result<(), PickError> {
        self.splitted = false;
        self.loci.clear();
        self.group.add(monosublocus.into_transcript())
    }

    /// Returns true if the transcript belongs with this holder: it must
    /// fall within the (flanked) interval and intersect at least one member
    pub fn in_locus(
        &self,
        transcript: &Transcript,
        flank: u32,
        cds_only: bool,
        min_cdna_overlap: f64,
        min_cds_overlap: f64,
    ) -> bool {
        if !self.group.in_interval(transcript, flank) {
            return false;
        }
        self.group.transcripts().values().any(|member| {
            Self::is_intersecting(
                member,
                transcript,
                cds_only,
                min_cdna_overlap,
                min_cds_overlap,
            )
        })
    }

    /// The lax intersection predicate driving the final selection
    ///
    /// The decision ladder, first match wins:
    ///
    /// 1. same id or opposite strand: no
    /// 2. with `cds_only`, coding pairs are reduced to their CDS-only
    ///    projections for everything below
    /// 3. zero exonic overlap: no
    /// 4. at least one side monoexonic: yes
    /// 5. any junction agreement, or intron retention (`h`): yes
    /// 6. generic overlap (`o`) with an intron of one model contained in an
    ///    exon of the other: yes
    /// 7. otherwise, fractional overlap thresholds decide: in CDS-only mode
    ///    the cDNA overlap must reach `max(min_cdna_overlap,
    ///    min_cds_overlap)`; otherwise the cDNA and the CDS overlap (over
    ///    the UTR-stripped projections) must each reach their threshold.
    pub fn is_intersecting(
        one: &Transcript,
        other: &Transcript,
        cds_only: bool,
        min_cdna_overlap: f64,
        min_cds_overlap: f64,
    ) -> bool {
        if one.id() == other.id() || one.strand().is_opposite(other.strand()) {
            return false;
        }

        let cds_mode = cds_only && one.is_coding() && other.is_coding();
        let one_projected;
        let other_projected;
        let (one_view, other_view) = if cds_mode {
            one_projected = one.strip_utrs();
            other_projected = other.strip_utrs();
            (&one_projected, &other_projected)
        } else {
            (one, other)
        };

        let comparison = compare(other_view, one_view);
        if comparison.n_f1 == 0.0 {
            return false;
        }
        if one_view.exon_num().min(other_view.exon_num()) == 1 {
            return true;
        }
        if comparison.j_f1 > 0.0 || comparison.ccode == ClassCode::RetainedIntron {
            return true;
        }
        if comparison.ccode == ClassCode::Overlap
            && (intron_in_exon(one_view, other_view) || intron_in_exon(other_view, one_view))
        {
            return true;
        }

        let cdna_overlap = comparison.n_recall.max(comparison.n_precision) / 100.0;
        if cds_mode {
            return cdna_overlap >= min_cdna_overlap.max(min_cds_overlap);
        }

        let one_stripped = one_view.strip_utrs();
        let other_stripped = other_view.strip_utrs();
        let cds_comparison = compare(&other_stripped, &one_stripped);
        let cds_overlap = cds_comparison.n_recall.max(cds_comparison.n_precision) / 100.0;
        cdna_overlap >= min_cdna_overlap && cds_overlap >= min_cds_overlap
    }

    /// The final selection: iteratively pick the best transcript of every
    /// community and remove its cliques from the graph
    pub fn define_loci(&mut self, config: &Configuration) -> Result<(), PickError> {
        if self.splitted {
            return Ok(());
        }

        let run = &config.pick.run_options;
        let clustering = &config.pick.clustering;

        let rows = self.group.metric_rows();
        let scores = score_transcripts(
            &rows,
            &config.scoring.requirements,
            &config.scoring.scoring,
        );
        self.scores = scores
            .iter()
            .map(|(id, &score)| (id.clone(), score))
            .collect();

        let mut graph = self.group.define_graph(|one, other| {
            Self::is_intersecting(
                one,
                other,
                run.subloci_from_cds_only,
                clustering.min_cdna_overlap,
                clustering.min_cds_overlap,
            )
        });

        let mut winners: Vec<(String, f64)> = vec![];
        while graph.node_count() > 0 {
            let cliques = find_cliques(&graph);
            let communities = find_communities(&graph);
            let mut to_remove: BTreeSet<&str> = BTreeSet::new();
            for community in &communities {
                let mut best: Option<(&str, f64)> = None;
                for &id in community {
                    let score = scores[id];
                    match best {
                        Some((_, top)) if score <= top => {}
                        _ => best = Some((id, score)),
                    }
                }
                // communities are never empty
                let (winner, score) = best.unwrap();
                to_remove.insert(winner);
                for clique in &cliques {
                    if clique.contains(&winner) {
                        to_remove.extend(clique.iter().cloned());
                    }
                }
                if !run.purge || score > 0.0 {
                    winners.push((winner.to_string(), score));
                } else {
                    debug!("purging zero-scored {}", winner);
                }
            }
            for id in &to_remove {
                graph.remove_node(*id);
            }
        }
        drop(graph);

        let mut loci: Vec<Locus> = winners
            .into_iter()
            .map(|(id, score)| {
                // winners come from the graph over this very group
                Locus::new(self.group.get(&id).unwrap().clone(), score)
            })
            .collect();
        loci.sort_by(|a, b| {
            (a.start(), a.end(), a.primary().id()).cmp(&(b.start(), b.end(), b.primary().id()))
        });

        if config.pick.alternative_splicing.report {
            let primaries: BTreeSet<String> = loci
                .iter()
                .map(|locus| locus.primary().id().to_string())
                .collect();
            let mut candidates: Vec<(&String, f64)> = scores
                .iter()
                .filter(|(id, _)| !primaries.contains(*id))
                .map(|(id, &score)| (id, score))
                .collect();
            candidates.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.0.cmp(b.0))
            });

            let mut admitted: BTreeSet<String> = BTreeSet::new();
            for locus in loci.iter_mut() {
                for (id, score) in &candidates {
                    if admitted.contains(*id) {
                        continue;
                    }
                    let transcript = self.group.get(id).unwrap();
                    if locus.try_add_alternative(transcript, *score, config, rows.get(*id)) {
                        admitted.insert((*id).clone());
                    }
                }
            }
        }

        self.loci = loci;
        self.splitted = true;
        Ok(())
    }

    /// The composite scores of the last selection run, by transcript id
    pub fn scores(&self) -> &[(String, f64)] {
        &self.scores
    }

    pub fn loci(&self) -> &[Locus] {
        &self.loci
    }

    pub fn into_loci(self) -> Vec<Locus> {
        self.loci
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Strand;
    use crate::scoring::{Rescaling, ScoringRule};
    use crate::tests::transcripts::{coding_transcript, scored_transcript, transcript};

    fn predicate(one: &Transcript, other: &Transcript) -> bool {
        MonosublocusHolder::is_intersecting(one, other, false, 0.2, 0.2)
    }

    #[test]
    fn test_not_intersecting_itself() {
        let t = transcript("t1", Strand::Plus, &[(100, 200), (400, 500)]);
        assert!(!predicate(&t, &t));
    }

    #[test]
    fn test_symmetry() {
        let a = transcript("a", Strand::Plus, &[(100, 200), (400, 500)]);
        let b = transcript("b", Strand::Plus, &[(150, 200), (400, 550)]);
        assert_eq!(predicate(&a, &b), predicate(&b, &a));
        assert!(predicate(&a, &b));
    }

    #[test]
    fn test_shared_junction_intersects() {
        let a = transcript("a", Strand::Plus, &[(100, 200), (400, 500)]);
        let b = transcript("b", Strand::Plus, &[(150, 200), (400, 550)]);
        let comparison = compare(&b, &a);
        assert!(comparison.j_f1 > 0.0);
        assert!(predicate(&a, &b));
    }

    #[test]
    fn test_intron_retention_intersects() {
        let retained = transcript("a", Strand::Plus, &[(100, 500)]);
        let spliced = transcript("b", Strand::Plus, &[(100, 200), (300, 500)]);
        let comparison = compare(&spliced, &retained);
        assert_eq!(comparison.ccode, ClassCode::RetainedIntron);
        assert!(predicate(&retained, &spliced));
    }

    #[test]
    fn test_opposite_strands_never_intersect() {
        let a = transcript("a", Strand::Plus, &[(100, 200), (400, 500)]);
        let b = transcript("b", Strand::Minus, &[(100, 200), (400, 500)]);
        assert!(!predicate(&a, &b));
    }

    #[test]
    fn test_zero_overlap_never_intersects() {
        let a = transcript("a", Strand::Plus, &[(100, 200)]);
        let b = transcript("b", Strand::Plus, &[(1000, 1200)]);
        assert!(!predicate(&a, &b));
    }

    #[test]
    fn test_monoexonic_shortcut() {
        let mono = transcript("mono", Strand::Unknown, &[(450, 520)]);
        let multi = transcript("multi", Strand::Plus, &[(100, 200), (400, 500)]);
        let minus = transcript("minus", Strand::Minus, &[(100, 200), (400, 500)]);
        assert!(predicate(&mono, &multi));
        assert!(predicate(&multi, &mono));
        // an unstranded single-exon model matches either strand
        assert!(predicate(&mono, &minus));
    }

    #[test]
    fn test_mixed_coding_pair_fails_on_cds_threshold() {
        // exons overlap well, but the candidate's CDS misses the other model
        let coding = coding_transcript(
            "coding",
            Strand::Plus,
            &[(100, 200), (400, 500), (700, 800)],
            &[(100, 200)],
        );
        let noncoding = transcript("noncoding", Strand::Plus, &[(390, 510), (690, 820)]);
        // cds_only with a non-coding side falls back to the dual check
        let result = MonosublocusHolder::is_intersecting(&coding, &noncoding, true, 0.2, 0.2);
        assert!(!result);
    }

    #[test]
    fn test_fractional_thresholds() {
        // no shared junctions, no containment: decision falls to overlaps
        let a = transcript("a", Strand::Plus, &[(100, 300), (500, 700)]);
        let b = transcript("b", Strand::Plus, &[(250, 320), (480, 700)]);
        assert!(predicate(&a, &b));
        assert!(!MonosublocusHolder::is_intersecting(&a, &b, false, 0.99, 0.2));
    }

    fn scoring_by_length() -> Configuration {
        let mut config = Configuration::default();
        config.scoring.scoring.insert(
            "cdna_length".to_string(),
            ScoringRule {
                rescaling: Rescaling::Max,
                value: None,
                multiplier: 10.0,
                filter: None,
            },
        );
        config.pick.alternative_splicing.report = false;
        config
    }

    #[test]
    fn test_define_loci_selects_per_community() {
        let config = scoring_by_length();
        let mut holder = MonosublocusHolder::new(
            Monosublocus::new(
                transcript("t1", Strand::Plus, &[(100, 200), (400, 500)]),
                0.0,
            ),
            true,
        );
        holder
            .add_monosublocus(Monosublocus::new(
                transcript("t2", Strand::Plus, &[(150, 200), (400, 600)]),
                0.0,
            ))
            .unwrap();
        holder
            .add_monosublocus(Monosublocus::new(
                transcript("t3", Strand::Plus, &[(5000, 5400)]),
                0.0,
            ))
            .unwrap();

        holder.define_loci(&config).unwrap();
        let loci = holder.loci();
        assert_eq!(loci.len(), 2);
        // t2 is longer and wins its community; t3 is alone
        assert_eq!(loci[0].primary().id(), "t2");
        assert_eq!(loci[1].primary().id(), "t3");
    }

    /// Builds a holder over a monoexonic chain t1–t2–t3–t4 where only
    /// adjacent transcripts overlap, scored through `source_score`
    fn chain_holder(scores: [f64; 4]) -> (MonosublocusHolder, Configuration) {
        let mut config = Configuration::default();
        config.scoring.scoring.insert(
            "source_score".to_string(),
            ScoringRule {
                rescaling: Rescaling::Max,
                value: None,
                multiplier: 5.0,
                filter: None,
            },
        );
        config.pick.alternative_splicing.report = false;

        let spans = [(100, 300), (250, 450), (400, 600), (550, 750)];
        let mut holder = MonosublocusHolder::new(
            Monosublocus::new(
                scored_transcript("t1", Strand::Plus, &[spans[0]], scores[0]),
                0.0,
            ),
            true,
        );
        for i in 1..4 {
            holder
                .add_monosublocus(Monosublocus::new(
                    scored_transcript(
                        &format!("t{}", i + 1),
                        Strand::Plus,
                        &[spans[i]],
                        scores[i],
                    ),
                    0.0,
                ))
                .unwrap();
        }
        (holder, config)
    }

    #[test]
    fn test_selector_determinism_on_a_chain() {
        // t1 and t2 tie at the top; the tie breaks lexicographically,
        // the winning clique {t1, t2} is removed, then t3 wins the rest
        let (mut holder, config) = chain_holder([1.0, 1.0, 0.6, 0.2]);
        holder.define_loci(&config).unwrap();
        let ids: Vec<&str> = holder
            .loci()
            .iter()
            .map(|locus| locus.primary().id())
            .collect();
        assert_eq!(ids, vec!["t1", "t3"]);
    }

    #[test]
    fn test_purge_silently_drops_zero_scored_winners() {
        let (mut holder, mut config) = chain_holder([1.0, 1.0, 0.2, 0.2]);
        config.pick.run_options.purge = true;
        holder.define_loci(&config).unwrap();
        let ids: Vec<&str> = holder
            .loci()
            .iter()
            .map(|locus| locus.primary().id())
            .collect();
        // t3 and t4 rescale to zero and vanish without a trace
        assert_eq!(ids, vec!["t1"]);
    }

    #[test]
    fn test_no_transcript_in_two_loci() {
        let config = scoring_by_length();
        let mut holder = MonosublocusHolder::new(
            Monosublocus::new(
                transcript("t1", Strand::Plus, &[(100, 200), (400, 500)]),
                0.0,
            ),
            true,
        );
        for t in [
            transcript("t2", Strand::Plus, &[(150, 200), (400, 550)]),
            transcript("t3", Strand::Plus, &[(400, 550), (800, 900)]),
            transcript("t4", Strand::Plus, &[(820, 900), (950, 1000)]),
        ]
        .iter()
        {
            holder
                .add_monosublocus(Monosublocus::new(t.clone(), 0.0))
                .unwrap();
        }
        holder.define_loci(&config).unwrap();
        let mut seen = BTreeSet::new();
        for locus in holder.loci() {
            for id in locus.transcript_ids() {
                assert!(seen.insert(id.to_string()), "{} appears twice", id);
            }
        }
    }
}
