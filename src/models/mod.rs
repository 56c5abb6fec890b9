//! Holds the main data models and structs that are used in `txpick`
//!

mod feature;
pub mod metrics;
mod orf;
mod transcript;
mod utils;

pub use crate::models::feature::{group_into_transcripts, Feature, FeatureRecord};
pub use crate::models::metrics::{intrinsic_metric, is_metric, MetricFn};
pub use crate::models::orf::{InternalOrf, OrfRecord, Segment, SegmentKind};
pub use crate::models::transcript::{Transcript, TranscriptBuilder};
pub use crate::models::utils::Strand;
