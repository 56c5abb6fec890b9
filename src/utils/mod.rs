//! Contains interval helpers and Errors that are used all across `txpick`
pub mod errors;
mod intervals;

pub use crate::utils::intervals::{
    contains, distance, intersect, merge_spans, overlap_amount, overlaps_with_flank, set_overlap,
    total_length, Span,
};
