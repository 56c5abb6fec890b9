//! The read-only query surface of the external data store
//!
//! ORFs, homology hits and verified junctions live in an external store
//! (typically a serialisation database built by an earlier pipeline step).
//! The core only ever reads from it, concurrently from several workers.
//! Transient failures are retried with bounded backoff; once the retry
//! budget is exhausted the affected superlocus fails and is skipped.

use std::thread;
use std::time::Duration;

use log::warn;

use crate::models::OrfRecord;
use crate::utils::errors::StoreError;

/// One high-scoring pair of a homology hit
#[derive(Clone, Debug, PartialEq)]
pub struct Hsp {
    pub query_start: u32,
    pub query_end: u32,
    pub target_start: u32,
    pub target_end: u32,
    pub evalue: f64,
}

/// One homology hit of a transcript
#[derive(Clone, Debug, PartialEq)]
pub struct Hit {
    pub evalue: f64,
    pub bitscore: f64,
    pub hsps: Vec<Hsp>,
}

/// One splice junction with external support
#[derive(Clone, Debug, PartialEq)]
pub struct Junction {
    pub start: u32,
    pub end: u32,
    pub verified: bool,
}

/// The queries the core issues against the external store
///
/// Implementations must be safe for concurrent reads; no query mutates
/// any state.
pub trait ExternalStore {
    fn orfs_for(&self, tid: &str) -> Result<Vec<OrfRecord>, StoreError>;

    fn blast_hits_for(&self, tid: &str) -> Result<Vec<Hit>, StoreError>;

    fn junctions_for(&self, chrom: &str, start: u32, end: u32)
        -> Result<Vec<Junction>, StoreError>;
}

/// A store without any content
///
/// Useful for runs without a serialisation database and for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyStore;

impl ExternalStore for EmptyStore {
    fn orfs_for(&self, _tid: &str) -> Result<Vec<OrfRecord>, StoreError> {
        Ok(vec![])
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

/// Retry budget for transient store failures
pub const MAX_QUERY_ATTEMPTS: u32 = 3;

const BACKOFF_BASE: Duration = Duration::from_millis(25);

/// Runs a store query, retrying transient failures with bounded backoff
pub fn query_with_retry<T, F>(mut query: F) -> Result<T, StoreError>
where
    F: FnMut() -> Result<T, StoreError>,
{
    let mut attempt = 1;
    loop {
        match query() {
            Ok(result) => return Ok(result),
            Err(err) if err.is_transient() && attempt < MAX_QUERY_ATTEMPTS => {
                let pause = BACKOFF_BASE * 2u32.pow(attempt - 1);
                warn!(
                    "transient store failure (attempt {}/{}), retrying in {:?}: {}",
                    attempt, MAX_QUERY_ATTEMPTS, pause, err
                );
                thread::sleep(pause);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_empty_store() {
        let store = EmptyStore;
        assert!(store.orfs_for("tx-1").unwrap().is_empty());
        assert!(store.blast_hits_for("tx-1").unwrap().is_empty());
        assert!(store.junctions_for("chr1", 1, 1000).unwrap().is_empty());
    }

    #[test]
    fn test_transient_errors_are_retried() {
        let calls = Cell::new(0);
        let result = query_with_retry(|| {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(StoreError::transient("connection reset"))
            } else {
                Ok(42)
            }
        });
        assert_eq!(result, Ok(42));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_retry_budget_is_bounded() {
        let calls = Cell::new(0);
        let result: Result<(), StoreError> = query_with_retry(|| {
            calls.set(calls.get() + 1);
            Err(StoreError::transient("connection reset"))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), MAX_QUERY_ATTEMPTS);
    }

    #[test]
    fn test_permanent_errors_fail_fast() {
        let calls = Cell::new(0);
        let result: Result<(), StoreError> = query_with_retry(|| {
            calls.set(calls.get() + 1);
            Err(StoreError::new("no such table"))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }
}
