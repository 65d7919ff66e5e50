/// A key into a [`Slab`].
///
/// Keys pair a slot index with the generation the slot had when the value
/// was inserted, so a key kept after [`Slab::remove`] never aliases a value
/// inserted later into the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Key {
    index: usize,
    generation: u32,
}

impl Key {
    /// Returns the slot index of the key.
    pub(crate) fn index(self) -> usize {
        self.index
    }
}

/// A single storage slot.
struct Slot<T> {
    /// Incremented every time the slot is vacated.
    generation: u32,
    value: Option<T>,
}

/// A simple slab allocator.
///
/// A `Slab` stores values of type `T` in a contiguous array and returns
/// stable keys. Freed slots are recycled through a free list.
///
/// This structure is used as the scheduler's thread table: thread records
/// keep a stable identity while the run queue only moves keys around.
pub(crate) struct Slab<T> {
    /// Storage for items (vacant slots hold `None`).
    slots: Vec<Slot<T>>,
    /// Stack of free indices that can be reused.
    free: Vec<usize>,
    /// Number of occupied slots.
    len: usize,
}

impl<T> Slab<T> {
    /// Creates a new `Slab` with room for `capacity` items before growing.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Inserts a value into the slab and returns its key.
    ///
    /// If a free slot is available, it is reused. Otherwise the storage
    /// grows by one slot.
    pub(crate) fn insert(&mut self, item: T) -> Key {
        self.len += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.value = Some(item);

            return Key {
                index,
                generation: slot.generation,
            };
        }

        self.slots.push(Slot {
            generation: 0,
            value: Some(item),
        });

        Key {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    /// Removes and returns the value stored under `key`.
    ///
    /// Returns `None` if the key is stale or was never issued by this slab.
    pub(crate) fn remove(&mut self, key: Key) -> Option<T> {
        let slot = self.slots.get_mut(key.index)?;

        if slot.generation != key.generation {
            return None;
        }

        let item = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);

        self.free.push(key.index);
        self.len -= 1;

        Some(item)
    }

    /// Returns a reference to the value stored under `key`.
    pub(crate) fn get(&self, key: Key) -> Option<&T> {
        self.slots
            .get(key.index)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub(crate) fn get_mut(&mut self, key: Key) -> Option<&mut T> {
        self.slots
            .get_mut(key.index)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    /// Returns the number of occupied slots.
    pub(crate) fn len(&self) -> usize {
        self.len
    }
}
