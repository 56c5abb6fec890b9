//! The resolved configuration value consumed by the core
//!
//! The core never loads configuration files itself; it receives one
//! immutable [`Configuration`] value, already merged and resolved by the
//! caller. [`Configuration::validate`] must run before any processing:
//! configuration errors are fatal at startup.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::is_metric;
use crate::scoring::{Requirement, ScoringRule};
use crate::utils::errors::ConfigurationError;

#[derive(Clone, Debug, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Configuration {
    pub pick: PickConfiguration,
    pub scoring: ScoringConfiguration,
}

#[derive(Clone, Debug, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PickConfiguration {
    pub run_options: RunOptions,
    pub clustering: Clustering,
    pub alternative_splicing: AlternativeSplicing,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RunOptions {
    /// Discard loci whose best transcript scores 0
    pub purge: bool,
    /// Compare only the coding portion of coding transcripts when
    /// clustering
    pub subloci_from_cds_only: bool,
    /// Padding applied to superlocus boundaries while grouping
    pub flank: u32,
    /// Size of the superlocus worker pool
    pub threads: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            purge: false,
            subloci_from_cds_only: false,
            flank: 200,
            threads: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Clustering {
    /// Minimum cDNA overlap fraction for the final re-aggregation stage
    pub min_cdna_overlap: f64,
    /// Minimum CDS overlap fraction for the final re-aggregation stage
    pub min_cds_overlap: f64,
    /// Let monoexonic transcripts join a sublocus on plain exonic overlap
    pub simple_overlap_for_monoexonic: bool,
    /// Keep superloci strand-specific
    pub stranded: bool,
}

impl Default for Clustering {
    fn default() -> Self {
        Self {
            min_cdna_overlap: 0.2,
            min_cds_overlap: 0.2,
            simple_overlap_for_monoexonic: false,
            stranded: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AlternativeSplicing {
    /// Report alternative isoforms at all
    pub report: bool,
    /// Minimum CDS overlap fraction between an isoform candidate and the
    /// locus primary
    pub min_cds_overlap: f64,
    /// Maximum number of isoforms admitted next to the primary
    pub max_isoforms: usize,
    /// Admit isoforms that retain an intron of the primary
    pub keep_retained_introns: bool,
}

impl Default for AlternativeSplicing {
    fn default() -> Self {
        Self {
            report: true,
            min_cds_overlap: 0.6,
            max_isoforms: 5,
            keep_retained_introns: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringConfiguration {
    /// Hard requirements for a transcript to be scored at all
    pub requirements: BTreeMap<String, Requirement>,
    /// Hard requirements for a transcript to be admitted as an alternative
    /// isoform
    pub as_requirements: BTreeMap<String, Requirement>,
    /// The composite-score contributions
    pub scoring: BTreeMap<String, ScoringRule>,
}

impl Configuration {
    /// Checks the configuration for unknown metrics and contradictory
    /// values. Must be called before processing starts; every error
    /// reported here is fatal.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for fraction in &[
            ("pick.clustering.min_cdna_overlap", self.pick.clustering.min_cdna_overlap),
            ("pick.clustering.min_cds_overlap", self.pick.clustering.min_cds_overlap),
            (
                "pick.alternative_splicing.min_cds_overlap",
                self.pick.alternative_splicing.min_cds_overlap,
            ),
        ] {
            if !(0.0..=1.0).contains(&fraction.1) {
                return Err(ConfigurationError::new(format!(
                    "{} must lie in [0, 1], got {}",
                    fraction.0, fraction.1
                )));
            }
        }

        for name in self
            .scoring
            .requirements
            .keys()
            .chain(self.scoring.as_requirements.keys())
            .chain(self.scoring.scoring.keys())
        {
            if !is_metric(name) {
                return Err(ConfigurationError::new(format!(
                    "unknown metric {} referenced in the scoring configuration",
                    name
                )));
            }
        }

        for (metric, rule) in &self.scoring.scoring {
            rule.validate(metric)?;
        }

        Ok(())
    }

    /// The worker-pool size, never zero
    pub fn threads(&self) -> usize {
        self.pick.run_options.threads.max(1)
    }
}
