//! The driver: superlocus assembly, the worker pool and output ordering
//!
//! Parallelism is coarse-grained over superloci, which are independent by
//! construction. Workers may finish out of order; the driver restores the
//! input genomic order through an index-keyed reorder buffer. A failing
//! superlocus is recorded and skipped, it never poisons the pool; fatal
//! errors (configuration, breached invariants) abort the run.

use log::{debug, warn};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::config::Configuration;
use crate::loci::{Locus, Superlocus};
use crate::models::Transcript;
use crate::store::ExternalStore;
use crate::utils::errors::{ConfigurationError, PickError};

/// The outcome of a pick run
#[derive(Debug)]
pub struct PickResult {
    /// All defined loci, in input genomic order
    pub loci: Vec<Locus>,
    /// Superloci that had to be skipped, with the error that sank them
    pub failed: Vec<(String, PickError)>,
}

/// Runs the locus-resolution pipeline over a transcript collection
pub struct Picker<'a, S: ExternalStore + Sync> {
    config: &'a Configuration,
    store: &'a S,
}

impl<'a, S: ExternalStore + Sync> Picker<'a, S> {
    /// Validates the configuration and sets up the picker
    ///
    /// Configuration problems surface here, before any transcript is
    /// touched.
    pub fn new(config: &'a Configuration, store: &'a S) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self { config, store })
    }

    /// Processes all transcripts and returns the defined loci
    pub fn pick(&self, mut transcripts: Vec<Transcript>) -> Result<PickResult, PickError> {
        transcripts.sort_by(|a, b| {
            (a.chrom(), a.start(), a.end(), a.id()).cmp(&(b.chrom(), b.start(), b.end(), b.id()))
        });
        let superloci = self.assemble_superloci(transcripts);
        debug!("assembled {} superloci", superloci.len());

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.threads())
            .build()
            .map_err(|err| PickError::Configuration(ConfigurationError::new(err)))?;

        let mut results: Vec<(usize, String, Result<Vec<Locus>, PickError>)> = pool.install(|| {
            superloci
                .into_par_iter()
                .enumerate()
                .map(|(index, mut superlocus)| {
                    let region = superlocus.id();
                    let outcome = Self::process(&mut superlocus, self.config, self.store);
                    (index, region, outcome)
                })
                .collect()
        });
        // reorder buffer: workers may finish out of order, the output
        // must follow the input genomic order
        results.sort_by_key(|(index, _, _)| *index);

        let mut loci = vec![];
        let mut failed = vec![];
        for (_, region, outcome) in results {
            match outcome {
                Ok(batch) => loci.extend(batch),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!("skipping {}: {}", region, err);
                    failed.push((region, err));
                }
            }
        }
        Ok(PickResult { loci, failed })
    }

    /// Groups the sorted stream into superloci
    ///
    /// With stranded clustering several superloci can be open at the same
    /// position, one per strand; a superlocus is sealed once the stream has
    /// moved past its flanked end and can never grow again.
    fn assemble_superloci(&self, transcripts: Vec<Transcript>) -> Vec<Superlocus> {
        let stranded = self.config.pick.clustering.stranded;
        let flank = self.config.pick.run_options.flank;

        let mut sealed: Vec<Superlocus> = vec![];
        let mut open: Vec<Superlocus> = vec![];
        for transcript in transcripts {
            let mut still_open = vec![];
            for superlocus in open {
                let passed = superlocus.group().chrom() != transcript.chrom()
                    || superlocus.group().end().saturating_add(flank) < transcript.start();
                if passed {
                    sealed.push(superlocus);
                } else {
                    still_open.push(superlocus);
                }
            }
            open = still_open;

            match open
                .iter_mut()
                .find(|superlocus| superlocus.in_locus(&transcript))
            {
                Some(superlocus) => {
                    // transcripts of one superlocus share chrom and strand,
                    // the add cannot fail here
                    if let Err(err) = superlocus.add_transcript(transcript) {
                        warn!("dropping transcript: {}", err);
                    }
                }
                None => open.push(Superlocus::new(transcript, stranded, flank)),
            }
        }
        sealed.extend(open);
        sealed
    }

    fn process(
        superlocus: &mut Superlocus,
        config: &Configuration,
        store: &S,
    ) -> Result<Vec<Locus>, PickError> {
        superlocus.load_external_data(store)?;
        superlocus.define_loci(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrfRecord, Strand};
    use crate::scoring::{Rescaling, ScoringRule};
    use crate::store::{EmptyStore, Hit, Junction};
    use crate::tests::transcripts::transcript;
    use crate::utils::errors::StoreError;

    fn config() -> Configuration {
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
        config
    }

    #[test]
    fn test_pick_returns_loci_in_genomic_order() {
        let cfg = config();
        let picker = Picker::new(&cfg, &EmptyStore).unwrap();
        let transcripts = vec![
            transcript("late", Strand::Plus, &[(10000, 10500)]),
            transcript("early-a", Strand::Plus, &[(100, 200), (400, 500)]),
            transcript("early-b", Strand::Plus, &[(150, 200), (400, 600)]),
        ];
        let result = picker.pick(transcripts).unwrap();
        assert!(result.failed.is_empty());
        assert_eq!(result.loci.len(), 2);
        assert_eq!(result.loci[0].primary().id(), "early-b");
        assert_eq!(result.loci[1].primary().id(), "late");
    }

    #[test]
    fn test_opposite_strands_form_separate_superloci() {
        let cfg = config();
        let picker = Picker::new(&cfg, &EmptyStore).unwrap();
        let transcripts = vec![
            transcript("plus", Strand::Plus, &[(100, 200), (400, 500)]),
            transcript("minus", Strand::Minus, &[(100, 200), (400, 500)]),
        ];
        let result = picker.pick(transcripts).unwrap();
        assert_eq!(result.loci.len(), 2);
    }

    #[test]
    fn test_unstranded_clustering_merges_strands() {
        let mut cfg = config();
        cfg.pick.clustering.stranded = false;
        let picker = Picker::new(&cfg, &EmptyStore).unwrap();
        let transcripts = vec![
            transcript("plus", Strand::Plus, &[(100, 200), (400, 500)]),
            transcript("minus", Strand::Minus, &[(100, 200), (400, 500)]),
        ];
        let result = picker.pick(transcripts).unwrap();
        // one superlocus, but the opposite strands still cannot merge
        // into one locus
        assert_eq!(result.loci.len(), 2);
    }

    #[test]
    fn test_purge_discards_zero_scored() {
        let mut cfg = Configuration::default();
        cfg.pick.run_options.purge = true;
        // no scoring rules: everything scores zero
        let picker = Picker::new(&cfg, &EmptyStore).unwrap();
        let transcripts = vec![transcript("t1", Strand::Plus, &[(100, 200), (400, 500)])];
        let result = picker.pick(transcripts).unwrap();
        assert!(result.loci.is_empty());
        assert!(result.failed.is_empty());
    }

    #[test]
    fn test_invalid_configuration_is_rejected_up_front() {
        let mut cfg = config();
        cfg.pick.clustering.min_cdna_overlap = 7.0;
        assert!(Picker::new(&cfg, &EmptyStore).is_err());
    }

    struct FailingStore;

    impl ExternalStore for FailingStore {
        fn orfs_for(&self, tid: &str) -> Result<Vec<OrfRecord>, StoreError> {
            if tid.starts_with("bad") {
                Err(StoreError::new("corrupt record"))
            } else {
                Ok(vec![])
            }
        }

        fn blast_hits_for(&self, _tid: &str) -> Result<Vec<Hit>, StoreError> {
            Ok(vec![])
        }

        fn junctions_for(
            &self,
            _chrom: &str,
            _start: u32,
            _end: u32,
        ) -> Result<Vec<Junction>, StoreError> {
            Ok(vec![])
        }
    }

    #[test]
    fn test_failed_superlocus_is_skipped_not_fatal() {
        let cfg = config();
        let picker = Picker::new(&cfg, &FailingStore).unwrap();
        let transcripts = vec![
            transcript("bad-1", Strand::Plus, &[(100, 200), (400, 500)]),
            transcript("good-1", Strand::Plus, &[(10000, 10500)]),
        ];
        let result = picker.pick(transcripts).unwrap();
        assert_eq!(result.loci.len(), 1);
        assert_eq!(result.loci[0].primary().id(), "good-1");
        assert_eq!(result.failed.len(), 1);
        assert!(result.failed[0].0.contains("100-500"));
    }

    #[test]
    fn test_multithreaded_run_keeps_order() {
        let mut cfg = config();
        cfg.pick.run_options.threads = 4;
        let picker = Picker::new(&cfg, &EmptyStore).unwrap();
        let transcripts: Vec<_> = (0..20)
            .map(|i| {
                transcript(
                    &format!("t{:02}", i),
                    Strand::Plus,
                    &[(10_000 * (i + 1), 10_000 * (i + 1) + 500)],
                )
            })
            .collect();
        let result = picker.pick(transcripts).unwrap();
        assert_eq!(result.loci.len(), 20);
        for (i, locus) in result.loci.iter().enumerate() {
            assert_eq!(locus.primary().id(), format!("t{:02}", i));
        }
    }
}
