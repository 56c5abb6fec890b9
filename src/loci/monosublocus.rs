use std::fmt;

use crate::models::Transcript;

/// The winner of a sublocus: a container around exactly one transcript
///
/// Monosubloci only exist between the sublocus election and the final
/// re-aggregation; they carry the score their transcript achieved in its
/// sublocus.
#[derive(Clone, Debug, PartialEq)]
pub struct Monosublocus {
    transcript: Transcript,
    score: f64,
}

impl Monosublocus {
    pub fn new(transcript: Transcript, score: f64) -> Self {
        Self { transcript, score }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn chrom(&self) -> &str {
        self.transcript.chrom()
    }

    pub fn start(&self) -> u32 {
        self.transcript.start()
    }

    pub fn end(&self) -> u32 {
        self.transcript.end()
    }
}

impl fmt::Display for Monosublocus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Monosublocus[{}] ({}:{}-{}, score {:.2})",
            self.transcript.id(),
            self.transcript.chrom(),
            self.transcript.start(),
            self.transcript.end(),
            self.score
        )
    }
}
