use std::collections::VecDeque;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::types::{OperationKind, RequestId};
use crate::utils::errors::{BridgeError, BridgeResult};

pub type Responder<T> = oneshot::Sender<BridgeResult<T>>;

struct PendingEntry<T> {
    id: RequestId,
    respond_to: Responder<T>,
}

/// Outstanding callers of one operation kind, oldest first.
///
/// A reply carrying a request id settles only that entry. A reply without
/// one settles everything queued at that moment: the queue is emptied
/// before any responder runs, so nothing queued afterwards is touched.
pub struct PendingQueue<T> {
    operation: OperationKind,
    entries: VecDeque<PendingEntry<T>>,
}

impl<T: Clone> PendingQueue<T> {
    pub fn new(operation: OperationKind) -> Self {
        Self {
            operation,
            entries: VecDeque::new(),
        }
    }

    /// Callers still waiting; entries whose caller gave up are not counted
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| !entry.respond_to.is_closed())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queue a responder. Returns how many live entries were already waiting.
    pub fn push(&mut self, id: RequestId, respond_to: Responder<T>) -> usize {
        // Drop callers that gave up (timed out or dropped their future)
        self.entries.retain(|entry| !entry.respond_to.is_closed());
        let waiting = self.entries.len();
        self.entries.push_back(PendingEntry { id, respond_to });
        waiting
    }

    /// Take back a single responder, e.g. when its command never left
    pub fn remove(&mut self, id: RequestId) -> Option<Responder<T>> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        self.entries.remove(index).map(|entry| entry.respond_to)
    }

    /// Settle with a reply. Returns the number of entries settled.
    pub fn resolve(&mut self, id: Option<RequestId>, value: T) -> usize {
        let settled = match id {
            Some(id) => match self.remove(id) {
                Some(respond_to) => {
                    let _ = respond_to.send(Ok(value));
                    1
                }
                None => 0,
            },
            None => self.resolve_all(value),
        };
        self.log_settled(id, settled);
        settled
    }

    pub fn resolve_all(&mut self, value: T) -> usize {
        let waiting = std::mem::take(&mut self.entries);
        let settled = waiting.len();
        for entry in waiting {
            let _ = entry.respond_to.send(Ok(value.clone()));
        }
        settled
    }

    /// Fail with an error built per entry. Returns the number of entries settled.
    pub fn reject(&mut self, id: Option<RequestId>, error: impl Fn() -> BridgeError) -> usize {
        let settled = match id {
            Some(id) => match self.remove(id) {
                Some(respond_to) => {
                    let _ = respond_to.send(Err(error()));
                    1
                }
                None => 0,
            },
            None => self.reject_all(error),
        };
        self.log_settled(id, settled);
        settled
    }

    pub fn reject_all(&mut self, error: impl Fn() -> BridgeError) -> usize {
        let waiting = std::mem::take(&mut self.entries);
        let settled = waiting.len();
        for entry in waiting {
            let _ = entry.respond_to.send(Err(error()));
        }
        settled
    }

    fn log_settled(&self, id: Option<RequestId>, settled: usize) {
        match (id, settled) {
            (Some(id), 0) => warn!("Dropping {} reply for unknown {}", self.operation, id),
            (None, 0) => debug!("{} reply arrived with nobody waiting", self.operation),
            _ => {}
        }
    }
}
