use std::error::Error;
use std::fmt;

/// Errors raised while building or re-finalizing a transcript model
///
/// The two kinds drive different recovery policies: a structurally broken
/// transcript is dropped from its locus, while a transcript with an
/// inconsistent CDS can be stripped of its coding annotation and kept.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptError {
    /// Structural violation: no exons, overlapping exons, an exon outside
    /// the transcript bounds or a missing strand on a multi-exonic model
    InvalidTranscript(String),
    /// The CDS/UTR annotation does not add up against the exon structure
    InvalidCds(String),
}

impl TranscriptError {
    pub fn invalid<S: fmt::Display>(s: S) -> Self {
        TranscriptError::InvalidTranscript(s.to_string())
    }

    pub fn invalid_cds<S: fmt::Display>(s: S) -> Self {
        TranscriptError::InvalidCds(s.to_string())
    }
}

impl Error for TranscriptError {}

impl fmt::Display for TranscriptError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TranscriptError::InvalidTranscript(msg) => {
                write!(f, "Invalid transcript model: {}", msg)
            }
            TranscriptError::InvalidCds(msg) => write!(f, "Invalid CDS definition: {}", msg),
        }
    }
}

/// A malformed or contradictory configuration value
///
/// These errors are fatal and must be reported before any processing starts.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationError {
    message: String,
}

impl ConfigurationError {
    pub fn new<S: fmt::Display>(s: S) -> Self {
        Self {
            message: s.to_string(),
        }
    }
}

impl Error for ConfigurationError {}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Invalid configuration: {}", self.message)
    }
}

/// A failed query against the external data store
///
/// Transient failures are retried with bounded backoff; everything else
/// fails the affected superlocus immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreError {
    message: String,
    transient: bool,
}

impl StoreError {
    pub fn new<S: fmt::Display>(s: S) -> Self {
        Self {
            message: s.to_string(),
            transient: false,
        }
    }

    pub fn transient<S: fmt::Display>(s: S) -> Self {
        Self {
            message: s.to_string(),
            transient: true,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }
}

impl Error for StoreError {}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "External store query failed: {}", self.message)
    }
}

/// Umbrella error for the locus-resolution pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum PickError {
    Transcript(TranscriptError),
    Configuration(ConfigurationError),
    Store(StoreError),
    /// An internal invariant was breached. Always fatal.
    Assertion(String),
}

impl PickError {
    /// Per-superlocus errors are recorded and skipped, everything else
    /// terminates the run
    pub fn is_fatal(&self) -> bool {
        matches!(self, PickError::Configuration(_) | PickError::Assertion(_))
    }
}

impl Error for PickError {}

impl fmt::Display for PickError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PickError::Transcript(err) => write!(f, "{}", err),
            PickError::Configuration(err) => write!(f, "{}", err),
            PickError::Store(err) => write!(f, "{}", err),
            PickError::Assertion(msg) => write!(f, "Internal invariant breached: {}", msg),
        }
    }
}

impl From<TranscriptError> for PickError {
    fn from(err: TranscriptError) -> PickError {
        PickError::Transcript(err)
    }
}

impl From<ConfigurationError> for PickError {
    fn from(err: ConfigurationError) -> PickError {
        PickError::Configuration(err)
    }
}

impl From<StoreError> for PickError {
    fn from(err: StoreError) -> PickError {
        PickError::Store(err)
    }
}
