use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::warn;

use crate::models::{Strand, Transcript, TranscriptBuilder};
use crate::utils::errors::TranscriptError;

/// The feature kinds the locus-resolution core understands
///
/// Every `*RNA` feature (mRNA, ncRNA, tRNA, ...) is treated as a transcript
/// row; the actual geometry comes from the exon and CDS rows below it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feature {
    Gene,
    Transcript,
    Exon,
    Cds,
    FivePrimeUtr,
    ThreePrimeUtr,
    StartCodon,
    StopCodon,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Feature::Gene => "gene",
                Feature::Transcript => "transcript",
                Feature::Exon => "exon",
                Feature::Cds => "CDS",
                Feature::FivePrimeUtr => "five_prime_UTR",
                Feature::ThreePrimeUtr => "three_prime_UTR",
                Feature::StartCodon => "start_codon",
                Feature::StopCodon => "stop_codon",
            }
        )
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gene" => Ok(Feature::Gene),
            "transcript" | "mRNA" => Ok(Feature::Transcript),
            "exon" => Ok(Feature::Exon),
            "CDS" | "cds" => Ok(Feature::Cds),
            "five_prime_UTR" | "five_prime_utr" | "5UTR" | "UTR5" => Ok(Feature::FivePrimeUtr),
            "three_prime_UTR" | "three_prime_utr" | "3UTR" | "UTR3" => Ok(Feature::ThreePrimeUtr),
            "start_codon" => Ok(Feature::StartCodon),
            "stop_codon" => Ok(Feature::StopCodon),
            other if other.ends_with("RNA") => Ok(Feature::Transcript),
            other => Err(format!("unknown feature type {}", other)),
        }
    }
}

/// One annotation row of the input stream
///
/// This is the ingestion interface of the core: upstream parsers produce
/// `FeatureRecord` values, the core groups them into [`Transcript`]s.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureRecord {
    pub chrom: String,
    pub source: String,
    pub feature: Feature,
    pub start: u32,
    pub end: u32,
    pub score: Option<f64>,
    pub strand: Strand,
    pub phase: Option<u8>,
    pub attributes: BTreeMap<String, String>,
}

impl FeatureRecord {
    pub fn new(chrom: &str, source: &str, feature: Feature, start: u32, end: u32) -> Self {
        // swapped coordinates do occur in the wild, normalize right away
        let (start, end) = if start <= end {
            (start, end)
        } else {
            (end, start)
        };
        Self {
            chrom: chrom.to_string(),
            source: source.to_string(),
            feature,
            start,
            end,
            score: None,
            strand: Strand::Unknown,
            phase: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_strand(mut self, strand: Strand) -> Self {
        self.strand = strand;
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    /// The id of the transcript this record describes or belongs to
    ///
    /// Transcript rows carry their own id (`ID` or `transcript_id`),
    /// geometry rows point at it through `Parent` or `transcript_id`.
    pub fn transcript_id(&self) -> Option<&str> {
        match self.feature {
            Feature::Transcript => self
                .attributes
                .get("ID")
                .or_else(|| self.attributes.get("transcript_id"))
                .map(|s| s.as_str()),
            _ => self
                .attributes
                .get("Parent")
                .or_else(|| self.attributes.get("transcript_id"))
                .map(|s| s.as_str()),
        }
    }

    /// The gene this record's transcript belongs to, if annotated
    pub fn gene_id(&self) -> Option<&str> {
        match self.feature {
            Feature::Transcript => self
                .attributes
                .get("Parent")
                .or_else(|| self.attributes.get("gene_id"))
                .map(|s| s.as_str()),
            _ => self.attributes.get("gene_id").map(|s| s.as_str()),
        }
    }
}

/// Groups a stream of feature records into finalized [`Transcript`]s
///
/// Records are grouped by their transcript id; a transcript is finalized
/// once the whole stream is exhausted. Structurally broken transcripts are
/// dropped with a warning, transcripts with an inconsistent CDS annotation
/// are retained as non-coding.
pub fn group_into_transcripts<I>(records: I) -> Vec<Transcript>
where
    I: IntoIterator<Item = FeatureRecord>,
{
    let mut builders: BTreeMap<String, TranscriptBuilder> = BTreeMap::new();
    let mut order: Vec<String> = vec![];

    for record in records {
        if record.feature == Feature::Gene {
            continue;
        }
        let tid = match record.transcript_id() {
            Some(tid) => tid.to_string(),
            None => {
                warn!(
                    "skipping {} record {}:{}-{} without a transcript id",
                    record.feature, record.chrom, record.start, record.end
                );
                continue;
            }
        };
        let builder = builders.entry(tid.clone()).or_insert_with(|| {
            order.push(tid.clone());
            let mut builder = TranscriptBuilder::new();
            builder.id(&tid);
            builder
        });
        builder.add_feature(&record);
    }

    let mut transcripts = Vec::with_capacity(order.len());
    for tid in order {
        // grouped above, the id is guaranteed to be present
        let mut builder = builders.remove(&tid).unwrap();
        match builder.finalize() {
            Ok(transcript) => transcripts.push(transcript),
            Err(TranscriptError::InvalidCds(msg)) => {
                warn!("stripping CDS of {}: {}", tid, msg);
                builder.clear_cds();
                match builder.finalize() {
                    Ok(transcript) => transcripts.push(transcript),
                    Err(err) => warn!("dropping transcript {}: {}", tid, err),
                }
            }
            Err(err) => warn!("dropping transcript {}: {}", tid, err),
        }
    }
    transcripts
}
