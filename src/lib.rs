#![doc = include_str!("../README.md")]

pub mod compare;
pub mod config;
pub mod graph;
pub mod loci;
pub mod models;
pub mod picker;
pub mod scoring;
pub mod store;
pub mod tests;
pub mod utils;

use crate::config::Configuration;
use crate::models::Transcript;
use crate::picker::{PickResult, Picker};
use crate::store::ExternalStore;
use crate::utils::errors::PickError;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convenience entry point: validate the configuration and resolve all
/// loci in one call
pub fn pick_loci<S: ExternalStore + Sync>(
    transcripts: Vec<Transcript>,
    config: &Configuration,
    store: &S,
) -> Result<PickResult, PickError> {
    let picker = Picker::new(config, store)?;
    picker.pick(transcripts)
}
