use std::collections::BTreeSet;
use std::fmt;

use log::warn;

use crate::models::orf::{InternalOrf, OrfRecord, Segment, SegmentKind};
use crate::models::{Feature, FeatureRecord, Strand};
use crate::utils::errors::TranscriptError;
use crate::utils::{contains, merge_spans, overlap_amount, total_length, Span};

/// Transcript is the central data structure of `txpick`
///
/// It holds the genomic representation of one RNA isoform. The coordinates
/// are 1-based and both start and end coordinate are included.
///
/// A `Transcript` is always finalized: its exons are sorted and
/// non-overlapping, introns and splice sites are derived, and the CDS/UTR
/// decomposition has been validated. The mutable counterpart is
/// [`TranscriptBuilder`]; use it to accumulate features and call
/// [`TranscriptBuilder::finalize`] to obtain a `Transcript`.
#[derive(Debug, Clone)]
pub struct Transcript {
    id: String,
    parents: Vec<String>,
    source: String,
    chrom: String,
    strand: Strand,
    start: u32,
    end: u32,
    exons: Vec<Span>,
    introns: Vec<Span>,
    splices: BTreeSet<u32>,
    combined_cds: Vec<Span>,
    combined_utr: Vec<Span>,
    internal_orfs: Vec<InternalOrf>,
    selected_orf_index: Option<usize>,
    cdna_length: u64,
    has_start_codon: bool,
    has_stop_codon: bool,
    source_score: Option<f64>,
    blast_score: f64,
}

impl Transcript {
    /// Returns the id of the transcript, e.g. `class_Stringtie_1.1`
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the ids of the parent gene(s)
    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    /// Returns the source (second column) of the input annotation
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the reference sequence chromosome
    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    /// Returns the strand / Direction of transcription
    pub fn strand(&self) -> Strand {
        self.strand
    }

    /// Returns the leftmost genomic location of the transcript
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Returns the rightmost genomic location of the transcript
    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn span(&self) -> Span {
        (self.start, self.end)
    }

    /// Returns all exons, sorted and non-overlapping
    pub fn exons(&self) -> &[Span] {
        &self.exons
    }

    /// Returns the gaps between adjacent exons
    pub fn introns(&self) -> &[Span] {
        &self.introns
    }

    /// Returns all splice positions (the first and last base of each intron)
    pub fn splices(&self) -> &BTreeSet<u32> {
        &self.splices
    }

    /// Returns the union of the CDS segments across all internal ORFs
    pub fn combined_cds(&self) -> &[Span] {
        &self.combined_cds
    }

    /// Returns the exonic complement of the combined CDS
    pub fn combined_utr(&self) -> &[Span] {
        &self.combined_utr
    }

    pub fn internal_orfs(&self) -> &[InternalOrf] {
        &self.internal_orfs
    }

    pub fn selected_orf_index(&self) -> Option<usize> {
        self.selected_orf_index
    }

    /// Returns the designated best ORF of the transcript
    pub fn selected_orf(&self) -> Option<&InternalOrf> {
        self.selected_orf_index.map(|idx| &self.internal_orfs[idx])
    }

    /// Returns the CDS segments of the selected ORF
    pub fn selected_cds(&self) -> Vec<Span> {
        match self.selected_orf() {
            Some(orf) => orf.cds(),
            None => vec![],
        }
    }

    pub fn exon_num(&self) -> usize {
        self.exons.len()
    }

    pub fn monoexonic(&self) -> bool {
        self.exons.len() == 1
    }

    /// Returns the number of bases of the processed transcript
    pub fn cdna_length(&self) -> u64 {
        self.cdna_length
    }

    pub fn combined_cds_length(&self) -> u64 {
        total_length(&self.combined_cds)
    }

    pub fn combined_cds_num(&self) -> usize {
        self.combined_cds.len()
    }

    pub fn combined_utr_length(&self) -> u64 {
        total_length(&self.combined_utr)
    }

    pub fn combined_utr_num(&self) -> usize {
        self.combined_utr.len()
    }

    pub fn selected_cds_length(&self) -> u64 {
        match self.selected_orf() {
            Some(orf) => orf.cds_len(),
            None => 0,
        }
    }

    pub fn selected_cds_num(&self) -> usize {
        self.selected_cds().len()
    }

    pub fn number_internal_orfs(&self) -> usize {
        self.internal_orfs.len()
    }

    /// Returns `true` if the transcript carries a coding region
    pub fn is_coding(&self) -> bool {
        self.selected_cds_length() > 0
    }

    pub fn has_start_codon(&self) -> bool {
        self.has_start_codon
    }

    pub fn has_stop_codon(&self) -> bool {
        self.has_stop_codon
    }

    /// Returns `true` if the selected ORF has both a start and a stop codon
    pub fn is_complete(&self) -> bool {
        self.has_start_codon && self.has_stop_codon
    }

    /// Returns the score assigned by the upstream assembler, if any
    pub fn source_score(&self) -> Option<f64> {
        self.source_score
    }

    /// Returns the best homology-search score attached to the transcript
    pub fn blast_score(&self) -> f64 {
        self.blast_score
    }

    /// Attaches a homology-search score without touching the geometry
    pub fn with_blast_score(mut self, score: f64) -> Transcript {
        self.blast_score = score;
        self
    }

    pub fn max_intron_length(&self) -> u64 {
        self.introns
            .iter()
            .map(|intron| u64::from(intron.1 - intron.0 + 1))
            .max()
            .unwrap_or(0)
    }

    pub fn min_intron_length(&self) -> u64 {
        self.introns
            .iter()
            .map(|intron| u64::from(intron.1 - intron.0 + 1))
            .min()
            .unwrap_or(0)
    }

    /// Returns the introns of the transcript that separate segments of the
    /// combined CDS
    pub fn combined_cds_introns(&self) -> Vec<Span> {
        self.cds_introns(&self.combined_cds)
    }

    /// Returns the introns of the transcript that separate segments of the
    /// selected ORF's CDS
    pub fn selected_cds_introns(&self) -> Vec<Span> {
        self.cds_introns(&self.selected_cds())
    }

    fn cds_introns(&self, cds: &[Span]) -> Vec<Span> {
        if cds.len() < 2 {
            return vec![];
        }
        let first = cds[0].0;
        let last = cds[cds.len() - 1].1;
        self.introns
            .iter()
            .filter(|intron| intron.0 > first && intron.1 < last)
            .cloned()
            .collect()
    }

    /// Returns all exons that contain part of the combined CDS
    pub fn coding_exons(&self) -> Vec<Span> {
        self.exons
            .iter()
            .filter(|exon| {
                self.combined_cds
                    .iter()
                    .any(|cds| overlap_amount(**exon, *cds) > 0)
            })
            .cloned()
            .collect()
    }

    /// Returns the 5' UTR segments of the selected ORF
    pub fn five_utr(&self) -> Vec<Span> {
        self.utr_side(true)
    }

    /// Returns the 3' UTR segments of the selected ORF
    pub fn three_utr(&self) -> Vec<Span> {
        self.utr_side(false)
    }

    fn utr_side(&self, five_prime: bool) -> Vec<Span> {
        let orf = match self.selected_orf() {
            Some(orf) if orf.is_coding() => orf,
            _ => return vec![],
        };
        let cds = orf.cds();
        let first = cds[0].0;
        let last = cds[cds.len() - 1].1;
        let upstream = match self.strand {
            Strand::Minus => !five_prime,
            _ => five_prime,
        };
        orf.utr()
            .into_iter()
            .filter(|utr| {
                if upstream {
                    utr.1 < first
                } else {
                    utr.0 > last
                }
            })
            .collect()
    }

    pub fn five_utr_length(&self) -> u64 {
        total_length(&self.five_utr())
    }

    pub fn three_utr_length(&self) -> u64 {
        total_length(&self.three_utr())
    }

    pub fn utr_length(&self) -> u64 {
        total_length(&self.combined_utr)
    }

    /// Returns the cDNA distance between the transcription start site and
    /// the first base of the selected CDS
    pub fn start_distance_from_tss(&self) -> u64 {
        let cds = self.selected_cds();
        if cds.is_empty() {
            return 0;
        }
        match self.strand {
            Strand::Minus => {
                let cds_start = cds[cds.len() - 1].1;
                let mut distance = 0;
                for &(estart, eend) in self.exons.iter().rev() {
                    if cds_start >= estart {
                        distance += u64::from(eend - cds_start);
                        break;
                    }
                    distance += u64::from(eend - estart + 1);
                }
                distance
            }
            _ => {
                let cds_start = cds[0].0;
                let mut distance = 0;
                for &(estart, eend) in &self.exons {
                    if cds_start <= eend {
                        distance += u64::from(cds_start - estart);
                        break;
                    }
                    distance += u64::from(eend - estart + 1);
                }
                distance
            }
        }
    }

    /// Returns the cDNA distance between the last base of the selected CDS
    /// and the transcription end site
    pub fn end_distance_from_tes(&self) -> u64 {
        let cds = self.selected_cds();
        if cds.is_empty() {
            return 0;
        }
        match self.strand {
            Strand::Minus => {
                let cds_end = cds[0].0;
                let mut distance = 0;
                for &(estart, eend) in &self.exons {
                    if cds_end <= eend {
                        distance += u64::from(cds_end - estart);
                        break;
                    }
                    distance += u64::from(eend - estart + 1);
                }
                distance
            }
            _ => {
                let cds_end = cds[cds.len() - 1].1;
                let mut distance = 0;
                for &(estart, eend) in self.exons.iter().rev() {
                    if cds_end >= estart {
                        distance += u64::from(eend - cds_end);
                        break;
                    }
                    distance += u64::from(eend - estart + 1);
                }
                distance
            }
        }
    }

    /// Returns the CDS-only projection of the transcript
    ///
    /// The UTRs are stripped and the CDS segments become the exons.
    /// Non-coding transcripts are returned unchanged.
    pub fn strip_utrs(&self) -> Transcript {
        if !self.is_coding() {
            return self.clone();
        }
        let exons = merge_spans(&self.combined_cds);
        let introns = introns_between(&exons);
        let splices = splice_sites(&introns);
        let cdna_length = total_length(&exons);
        let mut segments: Vec<Segment> = exons
            .iter()
            .map(|&(start, end)| Segment::new(SegmentKind::Exon, start, end))
            .collect();
        segments.extend(
            exons
                .iter()
                .map(|&(start, end)| Segment::new(SegmentKind::Cds, start, end)),
        );
        Transcript {
            id: self.id.clone(),
            parents: self.parents.clone(),
            source: self.source.clone(),
            chrom: self.chrom.clone(),
            strand: self.strand,
            start: exons[0].0,
            end: exons[exons.len() - 1].1,
            combined_cds: exons.clone(),
            combined_utr: vec![],
            exons,
            introns,
            splices,
            internal_orfs: vec![InternalOrf::new(segments)],
            selected_orf_index: Some(0),
            cdna_length,
            has_start_codon: self.has_start_codon,
            has_stop_codon: self.has_stop_codon,
            source_score: self.source_score,
            blast_score: self.blast_score,
        }
    }

    /// Replaces the CDS/UTR annotation with externally called ORFs
    ///
    /// The records carry cDNA-relative coordinates and are mapped back onto
    /// the genome by walking the exons in transcription order. A monoexonic
    /// transcript may be re-oriented by its best ORF; for multi-exonic
    /// transcripts antisense ORFs are skipped. Records that do not fit the
    /// cDNA are ignored. Loading the same records twice yields identical
    /// coordinates.
    pub fn load_orfs(&self, records: &[OrfRecord]) -> Result<Transcript, TranscriptError> {
        let mut valid: Vec<&OrfRecord> = vec![];
        for record in records {
            match record.validate(self.cdna_length) {
                Ok(()) => valid.push(record),
                Err(err) => warn!("ignoring ORF for {}: {}", self.id, err),
            }
        }
        if valid.is_empty() {
            return Ok(self.clone());
        }

        // best ORF first: completeness, then CDS length
        valid.sort_by(|a, b| {
            b.is_complete()
                .cmp(&a.is_complete())
                .then(b.cds_len.cmp(&a.cds_len))
                .then(a.cds_start.cmp(&b.cds_start))
                .then(a.cds_end.cmp(&b.cds_end))
        });

        let strand;
        if self.monoexonic() {
            // the best ORF decides the orientation of a monoexonic model
            strand = match valid[0].strand {
                Strand::Unknown => self.strand,
                orf_strand => orf_strand,
            };
            valid.retain(|record| {
                record.strand == valid_strand_for_mono(strand) || record.strand == Strand::Unknown
            });
        } else {
            strand = self.strand;
            valid.retain(|record| {
                if record.strand == Strand::Minus {
                    warn!(
                        "skipping antisense ORF ({}-{}) on multi-exonic {}",
                        record.cds_start, record.cds_end, self.id
                    );
                    false
                } else {
                    true
                }
            });
        }
        if valid.is_empty() {
            return Ok(self.clone());
        }

        let reverse = strand == Strand::Minus;
        let internal_orfs: Vec<InternalOrf> = valid
            .iter()
            .map(|record| {
                InternalOrf::new(map_orf(
                    &self.exons,
                    reverse,
                    record.cds_start,
                    record.cds_end,
                ))
            })
            .collect();

        let mut all_cds: Vec<Span> = vec![];
        for orf in &internal_orfs {
            all_cds.extend(orf.cds());
        }
        let combined_cds = merge_spans(&all_cds);
        let combined_utr = exonic_complement(&self.exons, &combined_cds);

        Ok(Transcript {
            id: self.id.clone(),
            parents: self.parents.clone(),
            source: self.source.clone(),
            chrom: self.chrom.clone(),
            strand,
            start: self.start,
            end: self.end,
            exons: self.exons.clone(),
            introns: self.introns.clone(),
            splices: self.splices.clone(),
            combined_cds,
            combined_utr,
            internal_orfs,
            selected_orf_index: Some(0),
            cdna_length: self.cdna_length,
            has_start_codon: valid[0].has_start_codon,
            has_stop_codon: valid[0].has_stop_codon,
            source_score: self.source_score,
            blast_score: self.blast_score,
        })
    }
}

/// A minus-strand monoexonic model keeps only antisense ORF records,
/// a plus-strand one only sense records
fn valid_strand_for_mono(strand: Strand) -> Strand {
    match strand {
        Strand::Minus => Strand::Minus,
        _ => Strand::Plus,
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} ({}:{}-{}{})",
            self.id, self.chrom, self.start, self.end, self.strand
        )
    }
}

impl PartialEq for Transcript {
    /// Returns `true` if both `Transcript`s describe the same model
    ///
    /// Scores are **not** taken into consideration for equality.
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.chrom == other.chrom
            && self.strand == other.strand
            && self.exons == other.exons
            && self.combined_cds == other.combined_cds
            && self.combined_utr == other.combined_utr
    }
}

/// Builds a [`Transcript`]
///
/// The builder is the mutable, draft state of a transcript: features are
/// accumulated in any order and nothing is validated until
/// [`TranscriptBuilder::finalize`] runs.
///
/// # Examples
///
/// ```rust
/// use txpick::models::{Strand, TranscriptBuilder};
/// let transcript = TranscriptBuilder::new()
///     .id("tx-1")
///     .chrom("chr7")
///     .strand(Strand::Minus)
///     .exon(100, 200)
///     .exon(400, 500)
///     .finalize()
///     .unwrap();
/// assert_eq!(transcript.id(), "tx-1");
/// assert_eq!(transcript.introns(), &[(201, 399)]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TranscriptBuilder {
    id: Option<String>,
    parents: Vec<String>,
    source: Option<String>,
    chrom: Option<String>,
    strand: Option<Strand>,
    declared: Option<Span>,
    exons: Vec<Span>,
    cds: Vec<Span>,
    utr: Vec<Span>,
    has_start_codon: bool,
    has_stop_codon: bool,
    source_score: Option<f64>,
    blast_score: f64,
}

impl TranscriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// specify the id of the transcript
    pub fn id(&mut self, id: &str) -> &mut Self {
        self.id = Some(id.to_string());
        self
    }

    /// add a parent gene id
    pub fn parent(&mut self, gene: &str) -> &mut Self {
        if !self.parents.iter().any(|p| p == gene) {
            self.parents.push(gene.to_string());
        }
        self
    }

    /// specify the annotation source
    pub fn source(&mut self, source: &str) -> &mut Self {
        self.source = Some(source.to_string());
        self
    }

    /// specify the chromosome of the transcript
    pub fn chrom(&mut self, chrom: &str) -> &mut Self {
        self.chrom = Some(chrom.to_string());
        self
    }

    /// specify the `Strand` of the transcript
    ///
    /// The first known strand wins; multi-exonic transcripts cannot change
    /// their strand afterwards.
    pub fn strand(&mut self, strand: Strand) -> &mut Self {
        if self.strand.is_none() && strand != Strand::Unknown {
            self.strand = Some(strand);
        }
        self
    }

    /// specify the genomic span declared by the transcript row
    pub fn declared_region(&mut self, start: u32, end: u32) -> &mut Self {
        self.declared = Some(sorted_span(start, end));
        self
    }

    /// specify the score assigned by the upstream assembler
    pub fn score(&mut self, score: f64) -> &mut Self {
        self.source_score = Some(score);
        self
    }

    /// specify the best homology-search score
    pub fn blast_score(&mut self, score: f64) -> &mut Self {
        self.blast_score = score;
        self
    }

    /// add an exon
    pub fn exon(&mut self, start: u32, end: u32) -> &mut Self {
        self.exons.push(sorted_span(start, end));
        self
    }

    /// add a CDS segment
    pub fn cds_segment(&mut self, start: u32, end: u32) -> &mut Self {
        self.cds.push(sorted_span(start, end));
        self
    }

    /// add a UTR segment
    pub fn utr_segment(&mut self, start: u32, end: u32) -> &mut Self {
        self.utr.push(sorted_span(start, end));
        self
    }

    pub fn start_codon_seen(&mut self) -> &mut Self {
        self.has_start_codon = true;
        self
    }

    pub fn stop_codon_seen(&mut self) -> &mut Self {
        self.has_stop_codon = true;
        self
    }

    /// Drops all CDS and UTR segments, keeping the exon structure
    pub fn clear_cds(&mut self) -> &mut Self {
        self.cds.clear();
        self.utr.clear();
        self.has_start_codon = false;
        self.has_stop_codon = false;
        self
    }

    /// Routes one feature record into the builder
    pub fn add_feature(&mut self, record: &FeatureRecord) -> &mut Self {
        if self.chrom.is_none() {
            self.chrom(&record.chrom);
        }
        self.strand(record.strand);
        match record.feature {
            Feature::Gene => {}
            Feature::Transcript => {
                self.declared_region(record.start, record.end);
                self.source(&record.source);
                if let Some(score) = record.score {
                    self.score(score);
                }
                if let Some(gene) = record.gene_id() {
                    self.parent(gene);
                }
            }
            Feature::Exon => {
                self.exon(record.start, record.end);
            }
            Feature::Cds => {
                self.cds_segment(record.start, record.end);
            }
            Feature::FivePrimeUtr | Feature::ThreePrimeUtr => {
                self.utr_segment(record.start, record.end);
            }
            Feature::StartCodon => {
                self.start_codon_seen();
            }
            Feature::StopCodon => {
                self.stop_codon_seen();
            }
        }
        if record.feature != Feature::Transcript {
            if let Some(gene) = record.gene_id() {
                self.parent(gene);
            }
        }
        self
    }

    /// Validates the accumulated features and builds the final `Transcript`
    ///
    /// Sorts the exons, derives introns and splice sites, checks the CDS/UTR
    /// decomposition against the exon structure and lays out the default
    /// internal ORF.
    pub fn finalize(&self) -> Result<Transcript, TranscriptError> {
        let id = match &self.id {
            Some(id) => id.clone(),
            None => return Err(TranscriptError::invalid("no id specified")),
        };
        let chrom = match &self.chrom {
            Some(chrom) => chrom.clone(),
            None => {
                return Err(TranscriptError::invalid(format!(
                    "no chromosome specified for {}",
                    id
                )))
            }
        };
        if self.exons.is_empty() {
            return Err(TranscriptError::invalid(format!(
                "no exon defined for {}",
                id
            )));
        }

        let mut exons = self.exons.clone();
        exons.sort_unstable();
        for pair in exons.windows(2) {
            if pair[0].1 >= pair[1].0 {
                return Err(TranscriptError::invalid(format!(
                    "overlapping exons {}-{} and {}-{} in {}",
                    pair[0].0, pair[0].1, pair[1].0, pair[1].1, id
                )));
            }
        }

        let strand = match self.strand {
            Some(strand) => strand,
            None if exons.len() > 1 => {
                return Err(TranscriptError::invalid(format!(
                    "multi-exonic transcript {} has no strand",
                    id
                )))
            }
            None => Strand::Unknown,
        };

        let start = exons[0].0;
        let end = exons[exons.len() - 1].1;
        if let Some((dstart, dend)) = self.declared {
            if start < dstart || end > dend {
                return Err(TranscriptError::invalid(format!(
                    "{} declares {}-{} but its exons span {}-{}",
                    id, dstart, dend, start, end
                )));
            }
        }

        let cdna_length = total_length(&exons);
        let mut cds = self.cds.clone();
        cds.sort_unstable();
        let mut utr = self.utr.clone();
        utr.sort_unstable();

        if cds.is_empty() && !utr.is_empty() {
            return Err(TranscriptError::invalid_cds(format!(
                "{} has UTRs defined but no CDS",
                id
            )));
        }

        for segment in cds.iter().chain(utr.iter()) {
            if !exons.iter().any(|exon| contains(*exon, *segment)) {
                return Err(TranscriptError::invalid_cds(format!(
                    "segment {}-{} of {} lies outside of its exons",
                    segment.0, segment.1, id
                )));
            }
        }
        for pair in cds.windows(2) {
            if pair[0].1 >= pair[1].0 {
                return Err(TranscriptError::invalid_cds(format!(
                    "overlapping CDS segments in {}",
                    id
                )));
            }
        }

        if !cds.is_empty() {
            if utr.is_empty() {
                utr = exonic_complement(&exons, &cds);
            } else {
                let coding = total_length(&cds);
                let noncoding = total_length(&utr);
                if coding + noncoding != cdna_length {
                    return Err(TranscriptError::invalid_cds(format!(
                        "{}: CDS ({}) + UTR ({}) do not cover the cDNA ({})",
                        id, coding, noncoding, cdna_length
                    )));
                }
            }
        }

        let mut has_start_codon = self.has_start_codon;
        let mut has_stop_codon = self.has_stop_codon;
        if !cds.is_empty() && !utr.is_empty() {
            // a UTR beyond the CDS boundary implies the matching codon
            if utr[0].0 < cds[0].0 {
                match strand {
                    Strand::Minus => has_stop_codon = true,
                    _ => has_start_codon = true,
                }
            }
            if utr[utr.len() - 1].1 > cds[cds.len() - 1].1 {
                match strand {
                    Strand::Minus => has_start_codon = true,
                    _ => has_stop_codon = true,
                }
            }
        }

        let introns = introns_between(&exons);
        let splices = splice_sites(&introns);

        let (internal_orfs, selected_orf_index) = if cds.is_empty() {
            (vec![], None)
        } else {
            let mut segments: Vec<Segment> = exons
                .iter()
                .map(|&(s, e)| Segment::new(SegmentKind::Exon, s, e))
                .collect();
            segments.extend(cds.iter().map(|&(s, e)| Segment::new(SegmentKind::Cds, s, e)));
            segments.extend(utr.iter().map(|&(s, e)| Segment::new(SegmentKind::Utr, s, e)));
            (vec![InternalOrf::new(segments)], Some(0))
        };

        Ok(Transcript {
            id,
            parents: self.parents.clone(),
            source: self.source.clone().unwrap_or_else(|| String::from(".")),
            chrom,
            strand,
            start,
            end,
            exons,
            introns,
            splices,
            combined_cds: cds,
            combined_utr: utr,
            internal_orfs,
            selected_orf_index,
            cdna_length,
            has_start_codon,
            has_stop_codon,
            source_score: self.source_score,
            blast_score: self.blast_score,
        })
    }
}

fn sorted_span(start: u32, end: u32) -> Span {
    if start <= end {
        (start, end)
    } else {
        (end, start)
    }
}

/// Returns the gaps between adjacent segments
fn introns_between(exons: &[Span]) -> Vec<Span> {
    exons
        .windows(2)
        .map(|pair| (pair[0].1 + 1, pair[1].0 - 1))
        .collect()
}

fn splice_sites(introns: &[Span]) -> BTreeSet<u32> {
    let mut splices = BTreeSet::new();
    for intron in introns {
        splices.insert(intron.0);
        splices.insert(intron.1);
    }
    splices
}

/// Returns the parts of `exons` not covered by the sorted,
/// non-overlapping `cover` segments
fn exonic_complement(exons: &[Span], cover: &[Span]) -> Vec<Span> {
    let mut result = vec![];
    let mut j = 0;
    for &(estart, eend) in exons {
        let mut cursor = estart;
        let mut tail_covered = false;
        while j < cover.len() && cover[j].1 < estart {
            j += 1;
        }
        while j < cover.len() && cover[j].0 <= eend {
            let (cstart, cend) = cover[j];
            if cstart > cursor {
                result.push((cursor, cstart - 1));
            }
            if cend >= eend {
                tail_covered = true;
                break;
            }
            cursor = cend + 1;
            j += 1;
        }
        if !tail_covered && cursor <= eend {
            result.push((cursor, eend));
        }
    }
    result
}

/// Maps a cDNA-relative ORF onto the genome by walking the exons in
/// transcription order
fn map_orf(exons: &[Span], reverse: bool, cds_start: u32, cds_end: u32) -> Vec<Segment> {
    let cds_start = u64::from(cds_start);
    let cds_end = u64::from(cds_end);
    let mut segments = vec![];
    let mut consumed = 0u64;
    let walk: Vec<Span> = if reverse {
        exons.iter().rev().cloned().collect()
    } else {
        exons.to_vec()
    };
    for (estart, eend) in walk {
        let len = u64::from(eend - estart + 1);
        let first = consumed + 1;
        let last = consumed + len;
        segments.push(Segment::new(SegmentKind::Exon, estart, eend));
        if cds_end < first || cds_start > last {
            segments.push(Segment::new(SegmentKind::Utr, estart, eend));
        } else if reverse {
            let c_end = eend - cds_start.saturating_sub(first) as u32;
            let c_start = estart + last.saturating_sub(cds_end) as u32;
            if c_end < eend {
                segments.push(Segment::new(SegmentKind::Utr, c_end + 1, eend));
            }
            segments.push(Segment::new(SegmentKind::Cds, c_start, c_end));
            if c_start > estart {
                segments.push(Segment::new(SegmentKind::Utr, estart, c_start - 1));
            }
        } else {
            let c_start = estart + cds_start.saturating_sub(first) as u32;
            let c_end = eend - last.saturating_sub(cds_end) as u32;
            if c_start > estart {
                segments.push(Segment::new(SegmentKind::Utr, estart, c_start - 1));
            }
            segments.push(Segment::new(SegmentKind::Cds, c_start, c_end));
            if c_end < eend {
                segments.push(Segment::new(SegmentKind::Utr, c_end + 1, eend));
            }
        }
        consumed = last;
    }
    segments
}
