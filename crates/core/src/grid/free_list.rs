//! Free-list backed cell store
//!
//! A dense slot array whose indices stay stable for the lifetime of a value.
//! Freed indices are queued and handed out again oldest first; freeing the
//! last used slot shrinks the used length instead. Every slot carries a
//! generation so a [`CellHandle`] kept past its value's removal is rejected.

use std::collections::VecDeque;

const INITIAL_CAPACITY: usize = 16;

/// Generation-checked reference into a [`FreeList`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellHandle {
    index: u32,
    generation: u32,
}

impl CellHandle {
    /// Slot index inside the store
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    value: Option<T>,
    generation: u32,
}

impl<T> Slot<T> {
    fn empty() -> Self {
        Self {
            value: None,
            generation: 0,
        }
    }
}

/// Stable-index arena with FIFO slot reuse
#[derive(Debug, Clone)]
pub struct FreeList<T> {
    slots: Vec<Slot<T>>,
    used_len: usize,
    free: VecDeque<usize>,
}

impl<T> Default for FreeList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FreeList<T> {
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(INITIAL_CAPACITY);
        slots.resize_with(INITIAL_CAPACITY, Slot::empty);
        Self {
            slots,
            used_len: 0,
            free: VecDeque::new(),
        }
    }

    /// Store `value`, reusing the oldest freed slot before growing
    pub fn allocate_with(&mut self, value: T) -> CellHandle {
        let index = match self.free.pop_front() {
            Some(index) => index,
            None => {
                if self.used_len == self.slots.len() {
                    let capacity = (self.slots.len() * 2).max(INITIAL_CAPACITY);
                    self.slots.resize_with(capacity, Slot::empty);
                }
                self.used_len += 1;
                self.used_len - 1
            }
        };

        let slot = &mut self.slots[index];
        slot.value = Some(value);
        CellHandle {
            index: index as u32,
            generation: slot.generation,
        }
    }

    /// Allocate a default-initialized slot
    pub fn allocate(&mut self) -> CellHandle
    where
        T: Default,
    {
        self.allocate_with(T::default())
    }

    /// Release the slot behind `handle`, returning its value
    ///
    /// Stale or foreign handles are ignored and yield `None`.
    pub fn free(&mut self, handle: CellHandle) -> Option<T> {
        let index = handle.index();
        if !self.is_valid(handle) {
            return None;
        }

        let slot = &mut self.slots[index];
        let value = slot.value.take();
        slot.generation = slot.generation.wrapping_add(1);

        if index + 1 == self.used_len {
            self.used_len -= 1;
        } else {
            self.free.push_back(index);
        }
        value
    }

    /// True while the slot is allocated and the generation matches
    pub fn is_valid(&self, handle: CellHandle) -> bool {
        let index = handle.index();
        index < self.used_len
            && self
                .slots
                .get(index)
                .is_some_and(|slot| slot.generation == handle.generation && slot.value.is_some())
    }

    pub fn get(&self, handle: CellHandle) -> Option<&T> {
        if !self.is_valid(handle) {
            return None;
        }
        self.slots[handle.index()].value.as_ref()
    }

    pub fn get_mut(&mut self, handle: CellHandle) -> Option<&mut T> {
        if !self.is_valid(handle) {
            return None;
        }
        self.slots[handle.index()].value.as_mut()
    }

    /// Replace the value behind a live handle, returning the previous one
    pub fn set(&mut self, handle: CellHandle, value: T) -> Option<T> {
        self.get_mut(handle).map(|slot| std::mem::replace(slot, value))
    }

    /// Handle of the live value at a raw index, if any
    pub fn handle_at(&self, index: usize) -> Option<CellHandle> {
        if index >= self.used_len {
            return None;
        }
        let slot = &self.slots[index];
        slot.value.as_ref().map(|_| CellHandle {
            index: index as u32,
            generation: slot.generation,
        })
    }

    /// Live value at a raw index
    pub fn get_index(&self, index: usize) -> Option<&T> {
        if index >= self.used_len {
            return None;
        }
        self.slots[index].value.as_ref()
    }

    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.used_len {
            return None;
        }
        self.slots[index].value.as_mut()
    }

    /// Live values in index order
    pub fn iter(&self) -> impl Iterator<Item = (CellHandle, &T)> {
        self.slots[..self.used_len]
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.value.as_ref().map(|value| {
                    (
                        CellHandle {
                            index: index as u32,
                            generation: slot.generation,
                        },
                        value,
                    )
                })
            })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (CellHandle, &mut T)> {
        self.slots[..self.used_len]
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| {
                let generation = slot.generation;
                slot.value.as_mut().map(|value| {
                    (
                        CellHandle {
                            index: index as u32,
                            generation,
                        },
                        value,
                    )
                })
            })
    }

    /// Number of live values
    #[inline]
    pub fn count(&self) -> usize {
        self.used_len - self.free.len()
    }

    /// One past the highest index ever handed out and not shrunk away
    #[inline]
    pub fn used_len(&self) -> usize {
        self.used_len
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Indices waiting for reuse, oldest first
    pub fn free_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.free.iter().copied()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Drop every value; outstanding handles become stale
    pub fn clear(&mut self) {
        for slot in &mut self.slots[..self.used_len] {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        self.used_len = 0;
        self.free.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_grows_by_doubling() {
        let mut list = FreeList::new();
        assert_eq!(list.capacity(), 16);
        for i in 0..17 {
            list.allocate_with(i);
        }
        assert_eq!(list.capacity(), 32);
        assert_eq!(list.count(), 17);
        assert_eq!(list.used_len(), 17);
    }

    #[test]
    fn test_freeing_last_index_shrinks_used_len() {
        let mut list = FreeList::new();
        let _a = list.allocate_with('a');
        let b = list.allocate_with('b');
        assert_eq!(list.used_len(), 2);

        assert_eq!(list.free(b), Some('b'));
        assert_eq!(list.used_len(), 1);
        assert_eq!(list.free_indices().count(), 0);
    }

    #[test]
    fn test_freed_lower_index_is_reused_first() {
        let mut list = FreeList::new();
        let a = list.allocate_with(1);
        let b = list.allocate_with(2);
        let _c = list.allocate_with(3);

        list.free(a);
        list.free(b);
        assert_eq!(list.count(), 1);
        assert_eq!(list.used_len(), 3);

        let d = list.allocate_with(4);
        assert_eq!(d.index(), a.index());
        let e = list.allocate_with(5);
        assert_eq!(e.index(), b.index());
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let mut list = FreeList::new();
        let a = list.allocate_with("first");
        let _b = list.allocate_with("second");
        list.free(a);
        let reused = list.allocate_with("third");

        assert_eq!(reused.index(), a.index());
        assert_ne!(reused.generation(), a.generation());
        assert!(list.get(a).is_none());
        assert!(list.free(a).is_none());
        assert_eq!(list.get(reused), Some(&"third"));
    }

    #[test]
    fn test_handle_past_shrunk_end_is_stale() {
        let mut list = FreeList::new();
        let a = list.allocate_with(10);
        list.free(a);
        assert!(list.get(a).is_none());

        let again = list.allocate_with(11);
        assert_eq!(again.index(), 0);
        assert!(list.get(a).is_none());
        assert_eq!(list.get(again), Some(&11));
    }

    #[test]
    fn test_iter_skips_free_slots() {
        let mut list = FreeList::new();
        let handles: Vec<_> = (0..5).map(|i| list.allocate_with(i)).collect();
        list.free(handles[1]);
        list.free(handles[3]);

        let values: Vec<_> = list.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![0, 2, 4]);
        assert_eq!(list.handle_at(2), Some(handles[2]));
        assert_eq!(list.handle_at(1), None);
    }
}
