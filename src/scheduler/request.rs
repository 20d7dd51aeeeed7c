// Alignment requests and the shared sequence storage they point into.

use super::delegate::AlignmentDelegate;
use crate::core::alignment::{AlignmentResult, ScoringScheme};
use crate::error::{AlignError, panic_message};
use std::fmt;
use std::ops::Deref;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Caller-visible identity of a request, passed back to its delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub usize);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable batch of sequences shared by every request built from it.
pub type SequenceBatch = Arc<[Vec<u8>]>;

/// Borrow-free reference to one sequence of a [`SequenceBatch`].
#[derive(Clone)]
pub struct SequenceRef {
    batch: SequenceBatch,
    index: usize,
}

impl SequenceRef {
    /// Returns `None` if `index` is out of range.
    pub fn new(batch: &SequenceBatch, index: usize) -> Option<Self> {
        (index < batch.len()).then(|| Self {
            batch: Arc::clone(batch),
            index,
        })
    }

    /// Caller guarantees `index < batch.len()`.
    pub(crate) fn at(batch: &SequenceBatch, index: usize) -> Self {
        debug_assert!(index < batch.len());
        Self {
            batch: Arc::clone(batch),
            index,
        }
    }

    /// Wrap a standalone sequence in a one-element batch.
    pub fn from_vec(seq: Vec<u8>) -> Self {
        Self {
            batch: Arc::from(vec![seq]),
            index: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl Deref for SequenceRef {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.batch[self.index]
    }
}

impl fmt::Debug for SequenceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceRef")
            .field("index", &self.index)
            .field("len", &self.len())
            .finish()
    }
}

/// One pairwise alignment to perform, plus where to send its result.
///
/// Immutable once built. Consumed by [`AlignmentRequest::complete`], so the
/// delegate is invoked exactly once per request.
pub struct AlignmentRequest {
    pub id: RequestId,
    pub seq_h: SequenceRef,
    pub seq_v: SequenceRef,
    pub scoring: Arc<ScoringScheme>,
    pub delegate: Arc<dyn AlignmentDelegate>,
}

impl AlignmentRequest {
    pub fn new(
        id: RequestId,
        seq_h: SequenceRef,
        seq_v: SequenceRef,
        scoring: Arc<ScoringScheme>,
        delegate: Arc<dyn AlignmentDelegate>,
    ) -> Self {
        Self {
            id,
            seq_h,
            seq_v,
            scoring,
            delegate,
        }
    }

    /// Hand the final result to the delegate. A panicking delegate is logged
    /// and swallowed so sibling requests in the same group still complete.
    pub fn complete(self, result: Result<AlignmentResult, AlignError>) {
        let id = self.id;
        let delegate = self.delegate;
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| delegate.on_complete(id, result))) {
            log::error!(
                "Delegate for request {} panicked: {}",
                id,
                panic_message(&*payload)
            );
        }
    }
}

impl fmt::Debug for AlignmentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignmentRequest")
            .field("id", &self.id)
            .field("seq_h", &self.seq_h)
            .field("seq_v", &self.seq_v)
            .field("scoring", &self.scoring)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_sequence_ref_derefs_into_batch() {
        let batch: SequenceBatch = Arc::from(vec![b"ACGT".to_vec(), b"GG".to_vec()]);
        let seq = SequenceRef::new(&batch, 1).unwrap();
        assert_eq!(&*seq, b"GG");
        assert!(SequenceRef::new(&batch, 2).is_none());
        assert_eq!(Arc::strong_count(&batch), 2);
    }

    #[test]
    fn test_complete_survives_panicking_delegate() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let ok_request = AlignmentRequest::new(
            RequestId(1),
            SequenceRef::from_vec(b"A".to_vec()),
            SequenceRef::from_vec(b"A".to_vec()),
            Arc::new(ScoringScheme::default()),
            {
                let seen = Arc::clone(&seen);
                Arc::new(move |id: RequestId, _r: Result<AlignmentResult, AlignError>| {
                    seen.lock().push(id)
                })
            },
        );
        let bad_request = AlignmentRequest::new(
            RequestId(2),
            SequenceRef::from_vec(b"A".to_vec()),
            SequenceRef::from_vec(b"A".to_vec()),
            Arc::new(ScoringScheme::default()),
            Arc::new(|_id: RequestId, _r: Result<AlignmentResult, AlignError>| {
                panic!("delegate failure")
            }),
        );

        bad_request.complete(Ok(AlignmentResult::default()));
        ok_request.complete(Ok(AlignmentResult::default()));
        assert_eq!(*seen.lock(), vec![RequestId(1)]);
    }
}
