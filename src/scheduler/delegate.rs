//! Result delivery.
//!
//! A delegate is called exactly once per scheduled request, from whichever
//! worker thread executed it. Implementations that aggregate across requests
//! must synchronize internally.

use super::request::RequestId;
use crate::core::alignment::AlignmentResult;
use crate::error::AlignError;
use crossbeam_channel::{Receiver, Sender, unbounded};

pub trait AlignmentDelegate: Send + Sync {
    fn on_complete(&self, id: RequestId, result: Result<AlignmentResult, AlignError>);
}

impl<F> AlignmentDelegate for F
where
    F: Fn(RequestId, Result<AlignmentResult, AlignError>) + Send + Sync,
{
    fn on_complete(&self, id: RequestId, result: Result<AlignmentResult, AlignError>) {
        self(id, result)
    }
}

/// A finished request as delivered through a [`ChannelDelegate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub id: RequestId,
    pub result: Result<AlignmentResult, AlignError>,
}

/// Forwards every completion into a crossbeam channel.
///
/// The receiving side sees completions in execution order, not request order.
#[derive(Clone)]
pub struct ChannelDelegate {
    tx: Sender<Completion>,
}

impl AlignmentDelegate for ChannelDelegate {
    fn on_complete(&self, id: RequestId, result: Result<AlignmentResult, AlignError>) {
        // Receiver dropped: nobody wants the result any more
        if self.tx.send(Completion { id, result }).is_err() {
            log::debug!("Completion for request {} dropped, receiver gone", id);
        }
    }
}

pub fn channel_delegate() -> (ChannelDelegate, Receiver<Completion>) {
    let (tx, rx) = unbounded();
    (ChannelDelegate { tx }, rx)
}
