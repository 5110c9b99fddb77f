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

//! Sync-id allocation.
//!
//! Sync ids correlate responses with requests on a multiplexed
//! connection. The allocator is owned by its connection instance: two
//! independent connections never coordinate, and each starts its own
//! sequence at 1.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic, lock-free allocator of sync ids.
///
/// Ids increment from 1 and wrap only at the u64 width limit. Reuse of an
/// id that is still pending is impossible in practice at that width; the
/// pending table still checks for it at registration and reports a
/// collision rather than corrupting correlation.
#[derive(Debug)]
pub(crate) struct SyncAllocator {
    next: AtomicU64,
}

impl SyncAllocator {
    pub(crate) fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Allocates the next sync id.
    pub(crate) fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn ids_start_at_one_and_increment() {
        let alloc = SyncAllocator::new();
        assert_eq!(alloc.next(), 1);
        assert_eq!(alloc.next(), 2);
        assert_eq!(alloc.next(), 3);
    }

    #[tokio::test]
    async fn concurrent_allocation_never_duplicates() {
        let alloc = Arc::new(SyncAllocator::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let alloc = Arc::clone(&alloc);
            handles.push(tokio::spawn(async move {
                (0..250).map(|_| alloc.next()).collect::<Vec<_>>()
            }));
        }
        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.await.unwrap() {
                assert!(seen.insert(id), "duplicate sync id {id}");
            }
        }
        assert_eq!(seen.len(), 2000);
    }
}
