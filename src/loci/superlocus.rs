use std::fmt;

use log::{debug, warn};

use crate::config::Configuration;
use crate::graph::find_communities;
use crate::loci::{Locus, Monosublocus, MonosublocusHolder, Sublocus, TranscriptGroup};
use crate::models::Transcript;
use crate::store::{query_with_retry, ExternalStore};
use crate::utils::errors::{PickError, StoreError};

/// The coarsest grouping: transcripts whose intervals overlap
///
/// Superloci are built from a position-sorted transcript stream with a
/// configurable flank and are the unit of parallel work. All finer
/// clustering — subloci, their winners, the final re-aggregation and
/// selection — happens inside one superlocus, single-threadedly.
#[derive(Clone, Debug)]
pub struct Superlocus {
    group: TranscriptGroup,
    flank: u32,
    subloci: Vec<Sublocus>,
    splitted: bool,
}

impl Superlocus {
    pub fn new(transcript: Transcript, stranded: bool, flank: u32) -> Self {
        Self {
            group: TranscriptGroup::new(transcript, stranded),
            flank,
            subloci: vec![],
            splitted: false,
        }
    }

    pub fn group(&self) -> &TranscriptGroup {
        &self.group
    }

    pub fn flank(&self) -> u32 {
        self.flank
    }

    pub fn id(&self) -> String {
        format!(
            "superlocus:{}:{}-{}({})",
            self.group.chrom(),
            self.group.start(),
            self.group.end(),
            self.group.strand()
        )
    }

    /// Returns true if the transcript belongs into this superlocus:
    /// interval overlap within the flank, on a compatible strand
    pub fn in_locus(&self, transcript: &Transcript) -> bool {
        self.group.in_interval(transcript, self.flank)
    }

    pub fn add_transcript(&mut self, transcript: Transcript) -> Result<(), PickError> {
        self.splitted = false;
        self.subloci.clear();
        self.group.add(transcript)
    }

    /// Pulls ORFs, homology scores and verified junctions from the
    /// external store into this superlocus
    ///
    /// ORF records reopen and re-finalize their transcript; a transcript
    /// whose ORFs do not fit keeps its original annotation. Store failures
    /// (after retries) abort the whole superlocus.
    pub fn load_external_data<S>(&mut self, store: &S) -> Result<(), StoreError>
    where
        S: ExternalStore + ?Sized,
    {
        let ids: Vec<String> = self.group.ids().map(String::from).collect();
        for tid in ids {
            let orfs = query_with_retry(|| store.orfs_for(&tid))?;
            if !orfs.is_empty() {
                // the id was taken from the group a moment ago
                let current = self.group.get(&tid).unwrap().clone();
                match current.load_orfs(&orfs) {
                    Ok(updated) => self.group.replace(updated),
                    Err(err) => warn!("keeping original CDS of {}: {}", tid, err),
                }
            }

            let hits = query_with_retry(|| store.blast_hits_for(&tid))?;
            let best = hits
                .iter()
                .map(|hit| hit.bitscore)
                .fold(f64::NEG_INFINITY, f64::max);
            if best.is_finite() && best > 0.0 {
                let updated = self.group.get(&tid).unwrap().clone().with_blast_score(best);
                self.group.replace(updated);
            }
        }

        let junctions = query_with_retry(|| {
            store.junctions_for(self.group.chrom(), self.group.start(), self.group.end())
        })?;
        self.group.add_verified_junctions(&junctions);
        Ok(())
    }

    /// Splits the superlocus into subloci: the connected components of the
    /// strict intersection graph
    pub fn define_subloci(&mut self, config: &Configuration) {
        if self.splitted {
            return;
        }
        let cds_only = config.pick.run_options.subloci_from_cds_only;
        let simple_overlap = config.pick.clustering.simple_overlap_for_monoexonic;

        let members: Vec<Vec<String>> = {
            let graph = self.group.define_graph(|one, other| {
                Sublocus::is_intersecting(one, other, cds_only, simple_overlap)
            });
            find_communities(&graph)
                .into_iter()
                .map(|community| community.into_iter().map(String::from).collect())
                .collect()
        };
        debug!("{} splits into {} subloci", self.id(), members.len());

        let stranded = self.group.stranded();
        let mut subloci = vec![];
        for community in members {
            let mut ids = community.into_iter();
            // communities are never empty
            let first = ids.next().unwrap();
            let mut sublocus =
                Sublocus::new(self.group.get(&first).unwrap().clone(), stranded);
            for id in ids {
                // community members share chromosome and strand by construction,
                // the add cannot fail
                if let Err(err) = sublocus.add(self.group.get(&id).unwrap().clone()) {
                    warn!("dropping {} from a sublocus: {}", id, err);
                }
            }
            subloci.push(sublocus);
        }
        subloci.sort_by_key(|sublocus| (sublocus.group().start(), sublocus.group().end()));
        self.subloci = subloci;
        self.splitted = true;
    }

    pub fn subloci(&self) -> &[Sublocus] {
        &self.subloci
    }

    /// Scores each sublocus and elects its winner
    pub fn define_monosubloci(&mut self, config: &Configuration) -> Vec<Monosublocus> {
        self.define_subloci(config);
        let mut monosubloci: Vec<Monosublocus> = self
            .subloci
            .iter_mut()
            .filter_map(|sublocus| sublocus.define_monosublocus(&config.scoring))
            .collect();
        monosubloci.sort_by(|a, b| {
            (a.start(), a.end(), a.transcript().id())
                .cmp(&(b.start(), b.end(), b.transcript().id()))
        });
        monosubloci
    }

    /// Runs the complete pipeline of this superlocus: subloci, winners,
    /// holder re-aggregation, final selection and fragment tagging
    pub fn define_loci(&mut self, config: &Configuration) -> Result<Vec<Locus>, PickError> {
        let cds_only = config.pick.run_options.subloci_from_cds_only;
        let clustering = &config.pick.clustering;
        let stranded = self.group.stranded();

        let monosubloci = self.define_monosubloci(config);
        let mut holders: Vec<MonosublocusHolder> = vec![];
        for monosublocus in monosubloci {
            let position = holders.iter().position(|holder| {
                holder.in_locus(
                    monosublocus.transcript(),
                    self.flank,
                    cds_only,
                    clustering.min_cdna_overlap,
                    clustering.min_cds_overlap,
                )
            });
            match position {
                Some(index) => holders[index].add_monosublocus(monosublocus)?,
                None => holders.push(MonosublocusHolder::new(monosublocus, stranded)),
            }
        }

        let mut loci: Vec<Locus> = vec![];
        for holder in holders.iter_mut() {
            holder.define_loci(config)?;
            loci.extend(holder.loci().iter().cloned());
        }

        let mut fragments = vec![false; loci.len()];
        for (i, locus) in loci.iter().enumerate() {
            for (j, other) in loci.iter().enumerate() {
                if i != j && other.other_is_fragment(locus, self.flank) {
                    fragments[i] = true;
                }
            }
        }
        for (locus, flag) in loci.iter_mut().zip(fragments) {
            locus.set_fragment(flag);
        }

        loci.sort_by(|a, b| {
            (a.start(), a.end(), a.primary().id()).cmp(&(b.start(), b.end(), b.primary().id()))
        });
        Ok(loci)
    }
}

impl fmt::Display for Superlocus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} [{} transcripts]", self.id(), self.group.len())
    }
}
