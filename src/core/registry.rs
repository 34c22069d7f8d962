//! # Dog registry: id allocation and lookup.
//!
//! Owns the table of live dogs and the id allocator. Ids are handed out by
//! a rolling cursor: allocation starts at the slot after the previously
//! issued id and scans forward (wrapping) until a free slot is found, so
//! released ids are eventually reused but never immediately, which keeps
//! recently-dead ids out of fresh logs.
//!
//! ## Rules
//! - Capacity is enforced **before** allocation; a full table can never
//!   make the cursor scan spin.
//! - The registry lock is held only for table work. Callers snapshot the
//!   dogs they want and operate on them after the lock is gone.
//! - Removal is idempotent: unregistering an id twice returns `None` the
//!   second time and the caller skips its bookkeeping.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::core::dog::{DogId, DogRef};
use crate::error::WdtError;

struct Table {
    dogs: HashMap<DogId, DogRef>,
    /// Next id the cursor will try.
    next_id: DogId,
}

/// Bounded table of live dogs.
pub(crate) struct Registry {
    table: RwLock<Table>,
    capacity: usize,
}

impl Registry {
    /// Creates a registry with at most `capacity` concurrent dogs.
    pub(crate) fn new(capacity: usize) -> Self {
        // Ids are u32; the id space caps the usable capacity.
        let capacity = capacity.clamp(1, u32::MAX as usize);
        Self {
            table: RwLock::new(Table {
                dogs: HashMap::new(),
                next_id: 0,
            }),
            capacity,
        }
    }

    /// Allocates an id and registers the dog produced by `build`.
    ///
    /// `build` runs under the registry write lock and must not block.
    pub(crate) async fn register<F>(&self, build: F) -> Result<DogRef, WdtError>
    where
        F: FnOnce(DogId) -> DogRef,
    {
        let mut table = self.table.write().await;
        if table.dogs.len() >= self.capacity {
            return Err(WdtError::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        let id = Self::allocate_id(&table, self.capacity);
        let dog = build(id);
        let prev = table.dogs.insert(id, dog.clone());
        debug_assert!(prev.is_none(), "allocator handed out a live id");
        table.next_id = Self::wrap(id + 1, self.capacity);
        Ok(dog)
    }

    /// Removes a dog, returning it if it was still registered.
    pub(crate) async fn unregister(&self, id: DogId) -> Option<DogRef> {
        self.table.write().await.dogs.remove(&id)
    }

    /// Looks up a dog by id.
    pub(crate) async fn find(&self, id: DogId) -> Option<DogRef> {
        self.table.read().await.dogs.get(&id).cloned()
    }

    /// Clones out every registered dog.
    pub(crate) async fn snapshot(&self) -> Vec<DogRef> {
        self.table.read().await.dogs.values().cloned().collect()
    }

    /// Empties the table, returning the dogs that were registered.
    pub(crate) async fn drain(&self) -> Vec<DogRef> {
        let mut table = self.table.write().await;
        table.dogs.drain().map(|(_, dog)| dog).collect()
    }

    /// Number of registered dogs.
    pub(crate) async fn len(&self) -> usize {
        self.table.read().await.dogs.len()
    }

    /// Configured capacity.
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    fn wrap(id: DogId, capacity: usize) -> DogId {
        if (id as usize) >= capacity { 0 } else { id }
    }

    /// First free id at or after the cursor. The caller has verified the
    /// table is not full, so the scan terminates.
    fn allocate_id(table: &Table, capacity: usize) -> DogId {
        let mut candidate = Self::wrap(table.next_id, capacity);
        while table.dogs.contains_key(&candidate) {
            candidate = Self::wrap(candidate + 1, capacity);
        }
        candidate
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;
    use crate::core::dog::{Dog, ExpectClose};
    use crate::platform::OwnerRef;

    fn build_dog(id: DogId) -> DogRef {
        Dog::new(
            id,
            OwnerRef::new(1),
            5,
            ExpectClose::Unarmed,
            Instant::now() + Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_ids_are_sequential_from_zero() {
        let reg = Registry::new(8);
        for expected in 0..4_u32 {
            let dog = reg.register(build_dog).await.expect("register");
            assert_eq!(dog.id(), expected);
        }
        assert_eq!(reg.len().await, 4);
    }

    #[tokio::test]
    async fn test_capacity_is_enforced() {
        let reg = Registry::new(2);
        reg.register(build_dog).await.expect("first");
        reg.register(build_dog).await.expect("second");

        let err = reg.register(build_dog).await.expect_err("table is full");
        match err {
            WdtError::CapacityExceeded { capacity } => assert_eq!(capacity, 2),
            other => panic!("expected CapacityExceeded, got {other}"),
        }

        // Freeing one slot makes registration work again.
        assert!(reg.unregister(0).await.is_some());
        let dog = reg.register(build_dog).await.expect("after release");
        assert_eq!(dog.id(), 0, "cursor wraps onto the freed slot");
    }

    #[tokio::test]
    async fn test_cursor_does_not_immediately_reuse_released_id() {
        let reg = Registry::new(4);
        let first = reg.register(build_dog).await.expect("id 0");
        assert_eq!(first.id(), 0);
        assert!(reg.unregister(0).await.is_some());

        // Slot 0 is free, but the cursor moved past it.
        let second = reg.register(build_dog).await.expect("id 1");
        assert_eq!(second.id(), 1);
    }

    #[tokio::test]
    async fn test_cursor_skips_live_ids_when_wrapping() {
        let reg = Registry::new(3);
        for _ in 0..3 {
            reg.register(build_dog).await.expect("fill");
        }
        assert!(reg.unregister(1).await.is_some());

        // Cursor sits at 0 (wrapped), which is taken; 1 is the free slot.
        let dog = reg.register(build_dog).await.expect("reuse");
        assert_eq!(dog.id(), 1);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let reg = Registry::new(2);
        let dog = reg.register(build_dog).await.expect("register");
        assert!(reg.unregister(dog.id()).await.is_some());
        assert!(reg.unregister(dog.id()).await.is_none());
    }

    #[tokio::test]
    async fn test_find_and_snapshot_see_registered_dogs() {
        let reg = Registry::new(4);
        let dog = reg.register(build_dog).await.expect("register");
        assert!(reg.find(dog.id()).await.is_some());
        assert!(reg.find(99).await.is_none());
        assert_eq!(reg.snapshot().await.len(), 1);

        let drained = reg.drain().await;
        assert_eq!(drained.len(), 1);
        assert_eq!(reg.len().await, 0);
    }

    #[tokio::test]
    async fn test_zero_capacity_is_clamped_to_one() {
        let reg = Registry::new(0);
        assert_eq!(reg.capacity(), 1);
        reg.register(build_dog).await.expect("one dog fits");
        assert!(reg.register(build_dog).await.is_err());
    }
}
