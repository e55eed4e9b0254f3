//! # 句柄表
//!
//! Two fixed-capacity arenas of process-local cursors. A slot is
//! either free or bound to a mount and an inode; file slots also
//! carry the byte offset. Handles are transient views: deleting an
//! inode or unmounting a volume frees every slot that referenced it.

use derive_more::{From, Into};

use emu_disk::{InodeNo, MountId};

/// Index into the directory-handle arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From, Into)]
pub struct DirFd(pub(crate) usize);

/// Index into the file-handle arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From, Into)]
pub struct FileFd(pub(crate) usize);

#[derive(Debug, Clone, Copy)]
pub(crate) struct DirState {
    pub mount: MountId,
    pub inode: InodeNo,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FileState {
    pub mount: MountId,
    pub inode: InodeNo,
    /// Byte cursor; always within `0..=size`.
    pub offset: usize,
}

/// Index-addressed slot arena, eagerly sized at construction.
#[derive(Debug)]
pub(crate) struct HandleTable<T> {
    slots: Vec<Option<T>>,
}

impl<T> HandleTable<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    /// Binds `state` to the first free slot.
    pub fn insert(&mut self, state: T) -> Option<usize> {
        let slot = self.slots.iter().position(Option::is_none)?;
        self.slots[slot] = Some(state);
        Some(slot)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)?.as_ref()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index)?.as_mut()
    }

    /// Frees one slot; `None` when it was not bound.
    pub fn release(&mut self, index: usize) -> Option<T> {
        self.slots.get_mut(index)?.take()
    }

    /// Frees every slot whose state matches `pred`.
    pub fn invalidate(&mut self, pred: impl Fn(&T) -> bool) {
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(&pred) {
                *slot = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HandleTable;

    #[test]
    fn insert_reuses_lowest_free_slot() {
        let mut table = HandleTable::new(3);
        assert_eq!(table.insert('a'), Some(0));
        assert_eq!(table.insert('b'), Some(1));
        assert_eq!(table.insert('c'), Some(2));
        assert_eq!(table.insert('d'), None);

        table.release(1).unwrap();
        assert_eq!(table.insert('e'), Some(1));
    }

    #[test]
    fn release_of_free_slot_is_none() {
        let mut table = HandleTable::<u8>::new(2);
        assert!(table.release(0).is_none());
        assert!(table.release(9).is_none());
    }

    #[test]
    fn invalidate_frees_matching_slots() {
        let mut table = HandleTable::new(4);
        table.insert(1);
        table.insert(2);
        table.insert(3);

        table.invalidate(|&v| v % 2 == 1);
        assert!(table.get(0).is_none());
        assert_eq!(table.get(1), Some(&2));
        assert!(table.get(2).is_none());
    }
}
