//! Handle-indexed task store.
//!
//! Tasks live in a slot vector while they wait in the queue; the queue itself
//! only carries small `Copy` handles. A slot is freed when a worker takes its
//! task out, and the generation counter makes a stale handle fail instead of
//! aliasing whatever task reuses the slot later.

use parking_lot::Mutex;

/// Opaque reference to a task waiting in a [`TaskArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    index: usize,
    generation: u64,
}

impl TaskHandle {
    pub fn index(&self) -> usize {
        self.index
    }
}

struct Slot<T> {
    generation: u64,
    task: Option<T>,
}

struct ArenaInner<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    live: usize,
}

pub struct TaskArena<T> {
    inner: Mutex<ArenaInner<T>>,
}

impl<T> Default for TaskArena<T> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<T> TaskArena<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(ArenaInner {
                slots: Vec::with_capacity(capacity),
                free: Vec::new(),
                live: 0,
            }),
        }
    }

    /// Store a task and return its handle.
    pub fn insert(&self, task: T) -> TaskHandle {
        let mut inner = self.inner.lock();
        inner.live += 1;
        if let Some(index) = inner.free.pop() {
            let slot = &mut inner.slots[index];
            debug_assert!(slot.task.is_none());
            slot.task = Some(task);
            return TaskHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = inner.slots.len();
        inner.slots.push(Slot {
            generation: 0,
            task: Some(task),
        });
        TaskHandle {
            index,
            generation: 0,
        }
    }

    /// Move the task out of its slot. Returns `None` for a stale or unknown handle.
    pub fn take(&self, handle: TaskHandle) -> Option<T> {
        let mut inner = self.inner.lock();
        let slot = inner.slots.get_mut(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        let task = slot.task.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        inner.free.push(handle.index);
        inner.live -= 1;
        Some(task)
    }

    /// Take every handle in `handles` into `out`, preserving order.
    /// Returns how many handles were stale.
    pub fn take_all(&self, handles: &[TaskHandle], out: &mut Vec<T>) -> usize {
        let mut inner = self.inner.lock();
        let mut stale = 0;
        for handle in handles {
            let Some(slot) = inner.slots.get_mut(handle.index) else {
                stale += 1;
                continue;
            };
            match slot.task.take() {
                Some(task) if slot.generation == handle.generation => {
                    slot.generation = slot.generation.wrapping_add(1);
                    inner.free.push(handle.index);
                    inner.live -= 1;
                    out.push(task);
                }
                Some(task) => {
                    slot.task = Some(task);
                    stale += 1;
                }
                None => stale += 1,
            }
        }
        stale
    }

    /// Tasks stored and not yet taken.
    pub fn len(&self) -> usize {
        self.inner.lock().live
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots allocated so far, live or free.
    pub fn slot_count(&self) -> usize {
        self.inner.lock().slots.len()
    }
}
