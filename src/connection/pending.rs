//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Pending-request table.
//!
//! The only mutable state shared between callers and the reader loop: a
//! map from sync id to the single-assignment slot its caller awaits. The
//! oneshot slot guarantees exactly-once delivery; a caller that abandoned
//! interest (timeout, drop) simply has a dead receiver, and the entry
//! stays registered so the sync id remains reserved until the matching
//! response is actually read and discarded.

use crate::error::{Error, Result};
use crate::value::Value;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::oneshot;

/// Outcome delivered to a waiting caller: the response body on success,
/// or a decoded/local error.
pub(crate) type Outcome = Result<Value>;

/// Tracks in-flight requests by sync id.
#[derive(Debug, Default)]
pub(crate) struct PendingTable {
    slots: Mutex<HashMap<u64, oneshot::Sender<Outcome>>>,
}

impl PendingTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a slot for `sync` and returns the receiver to await.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SyncIdCollision`] if the id is still pending —
    /// an internal invariant violation that must fail instead of
    /// misattributing a response.
    pub(crate) fn register(&self, sync: u64) -> Result<oneshot::Receiver<Outcome>> {
        let mut slots = self.slots.lock();
        if slots.contains_key(&sync) {
            return Err(Error::SyncIdCollision(sync));
        }
        let (tx, rx) = oneshot::channel();
        slots.insert(sync, tx);
        Ok(rx)
    }

    /// Resolves the slot for `sync`, removing it from the table.
    ///
    /// Returns `false` when no such id is pending (a protocol violation
    /// by the peer; the caller logs and discards the frame). Delivery to
    /// an abandoned caller is a silent discard, exactly as required.
    pub(crate) fn complete(&self, sync: u64, outcome: Outcome) -> bool {
        match self.slots.lock().remove(&sync) {
            Some(tx) => {
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }

    /// Releases an id whose request never reached the wire (local encode
    /// failure). Distinct from abandonment: nothing was sent, so nothing
    /// will ever arrive for this id.
    pub(crate) fn discard(&self, sync: u64) {
        self.slots.lock().remove(&sync);
    }

    /// Fails every pending request with [`Error::ConnectionClosed`].
    ///
    /// Draining the table makes this idempotent: each slot is resolved
    /// at most once, no matter how many teardown paths race.
    pub(crate) fn fail_all(&self) {
        let slots: Vec<_> = {
            let mut guard = self.slots.lock();
            guard.drain().collect()
        };
        for (_, tx) in slots {
            let _ = tx.send(Err(Error::ConnectionClosed));
        }
    }

    /// Number of requests currently in flight.
    pub(crate) fn len(&self) -> usize {
        self.slots.lock().len()
    }
}
