//! # 设备层
//!
//! [`BlockDevice`] 是引擎消费的设备接口：按编号读写超级块、
//! inode记录与数据块，并提供位图分配原语。[`MemDisk`] 是其
//! 进程内实现，持有一张固定容量的挂载表。

use core::fmt;

use derive_more::{From, Into};

use crate::layout::{BlockNo, InodeNo, InodeRecord, Superblock};
use crate::{Block, BLOCK_SIZE, MAX_BLOCKS, MAX_INODES, MAX_MOUNT_POINTS, RESERVED_BLOCKS};

/// Identifies one open volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From, Into)]
pub struct MountId(usize);

impl MountId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskError {
    /// Mount id out of range or not bound to a volume.
    BadMount,
    /// Record index outside the volume's fixed arrays.
    BadIndex,
    /// Requested capacity outside `RESERVED_BLOCKS+1..=MAX_BLOCKS`.
    BadCapacity,
    /// Bitmap exhausted.
    NoSpace,
    /// No free slot in the mount table.
    TableFull,
}

impl fmt::Display for DiskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::BadMount => "unknown mount id",
            Self::BadIndex => "record index out of range",
            Self::BadCapacity => "bad volume capacity",
            Self::NoSpace => "out of space",
            Self::TableFull => "mount table full",
        };
        f.write_str(reason)
    }
}

pub type DiskResult<T> = Result<T, DiskError>;

/// 块设备接口
///
/// All access is synchronous; every call either completes or fails
/// with no partial effect. Allocation is scan-and-mark over the
/// volume's bitmaps, the caller only decides *when* to allocate.
pub trait BlockDevice {
    fn mount(&mut self, label: &str, blocks: u32) -> DiskResult<MountId>;
    fn unmount(&mut self, id: MountId) -> DiskResult<()>;

    fn read_superblock(&self, id: MountId) -> DiskResult<Superblock>;
    fn write_superblock(&mut self, id: MountId, sb: &Superblock) -> DiskResult<()>;

    fn read_inode(&self, id: MountId, inode: InodeNo) -> DiskResult<InodeRecord>;
    fn write_inode(&mut self, id: MountId, inode: InodeNo, record: &InodeRecord) -> DiskResult<()>;

    fn read_block(&self, id: MountId, block: BlockNo) -> DiskResult<Block>;
    fn write_block(&mut self, id: MountId, block: BlockNo, data: &Block) -> DiskResult<()>;

    fn alloc_inode(&mut self, id: MountId) -> DiskResult<InodeNo>;
    fn free_inode(&mut self, id: MountId, inode: InodeNo) -> DiskResult<()>;
    fn alloc_block(&mut self, id: MountId) -> DiskResult<BlockNo>;
    fn free_block(&mut self, id: MountId, block: BlockNo) -> DiskResult<()>;
}

/// One emulated volume: fixed record arrays addressed by index.
struct Volume {
    superblock: Superblock,
    inodes: Vec<InodeRecord>,
    blocks: Vec<Block>,
}

impl Volume {
    fn new(label: &str, blocks: u32) -> Self {
        Self {
            superblock: Superblock::new(label, blocks),
            inodes: vec![InodeRecord::default(); MAX_INODES],
            blocks: vec![[0; BLOCK_SIZE]; blocks as usize],
        }
    }
}

/// In-process emulated block device.
pub struct MemDisk {
    volumes: Vec<Option<Volume>>,
}

impl MemDisk {
    pub fn new() -> Self {
        Self {
            volumes: (0..MAX_MOUNT_POINTS).map(|_| None).collect(),
        }
    }

    fn volume(&self, id: MountId) -> DiskResult<&Volume> {
        self.volumes
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(DiskError::BadMount)
    }

    fn volume_mut(&mut self, id: MountId) -> DiskResult<&mut Volume> {
        self.volumes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(DiskError::BadMount)
    }
}

impl Default for MemDisk {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockDevice for MemDisk {
    fn mount(&mut self, label: &str, blocks: u32) -> DiskResult<MountId> {
        if !(RESERVED_BLOCKS as u32 + 1..=MAX_BLOCKS as u32).contains(&blocks) {
            return Err(DiskError::BadCapacity);
        }

        let slot = self
            .volumes
            .iter()
            .position(Option::is_none)
            .ok_or(DiskError::TableFull)?;

        log::trace!("mount {label:?} ({blocks} blocks) -> {slot}");
        self.volumes[slot] = Some(Volume::new(label, blocks));
        Ok(MountId(slot))
    }

    fn unmount(&mut self, id: MountId) -> DiskResult<()> {
        let slot = self
            .volumes
            .get_mut(id.index())
            .ok_or(DiskError::BadMount)?;
        if slot.take().is_none() {
            return Err(DiskError::BadMount);
        }

        log::trace!("unmount {}", id.index());
        Ok(())
    }

    fn read_superblock(&self, id: MountId) -> DiskResult<Superblock> {
        Ok(self.volume(id)?.superblock.clone())
    }

    fn write_superblock(&mut self, id: MountId, sb: &Superblock) -> DiskResult<()> {
        self.volume_mut(id)?.superblock = sb.clone();
        Ok(())
    }

    fn read_inode(&self, id: MountId, inode: InodeNo) -> DiskResult<InodeRecord> {
        self.volume(id)?
            .inodes
            .get(inode.index())
            .copied()
            .ok_or(DiskError::BadIndex)
    }

    fn write_inode(&mut self, id: MountId, inode: InodeNo, record: &InodeRecord) -> DiskResult<()> {
        let slot = self
            .volume_mut(id)?
            .inodes
            .get_mut(inode.index())
            .ok_or(DiskError::BadIndex)?;
        *slot = *record;
        Ok(())
    }

    fn read_block(&self, id: MountId, block: BlockNo) -> DiskResult<Block> {
        self.volume(id)?
            .blocks
            .get(block.index())
            .copied()
            .ok_or(DiskError::BadIndex)
    }

    fn write_block(&mut self, id: MountId, block: BlockNo, data: &Block) -> DiskResult<()> {
        let slot = self
            .volume_mut(id)?
            .blocks
            .get_mut(block.index())
            .ok_or(DiskError::BadIndex)?;
        *slot = *data;
        Ok(())
    }

    fn alloc_inode(&mut self, id: MountId) -> DiskResult<InodeNo> {
        self.volume_mut(id)?
            .superblock
            .alloc_inode()
            .ok_or(DiskError::NoSpace)
    }

    fn free_inode(&mut self, id: MountId, inode: InodeNo) -> DiskResult<()> {
        let volume = self.volume_mut(id)?;
        if inode.index() >= MAX_INODES {
            return Err(DiskError::BadIndex);
        }

        volume.superblock.free_inode(inode);
        volume.inodes[inode.index()] = InodeRecord::default();
        Ok(())
    }

    fn alloc_block(&mut self, id: MountId) -> DiskResult<BlockNo> {
        self.volume_mut(id)?
            .superblock
            .alloc_block()
            .ok_or(DiskError::NoSpace)
    }

    fn free_block(&mut self, id: MountId, block: BlockNo) -> DiskResult<()> {
        let volume = self.volume_mut(id)?;
        if block.index() >= volume.blocks.len() {
            return Err(DiskError::BadIndex);
        }

        volume.superblock.free_block(block);
        volume.blocks[block.index()].fill(0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_table_has_fixed_capacity() {
        let mut disk = MemDisk::new();
        let ids: Vec<_> = (0..MAX_MOUNT_POINTS)
            .map(|i| disk.mount(&format!("disk{i}"), 16).unwrap())
            .collect();
        assert_eq!(disk.mount("extra", 16), Err(DiskError::TableFull));

        // releasing a slot makes it reusable
        disk.unmount(ids[3]).unwrap();
        assert_eq!(disk.mount("again", 16), Ok(ids[3]));
    }

    #[test]
    fn unmount_of_unbound_slot_fails() {
        let mut disk = MemDisk::new();
        assert_eq!(disk.unmount(MountId(0)), Err(DiskError::BadMount));
        assert_eq!(disk.unmount(MountId(99)), Err(DiskError::BadMount));
    }

    #[test]
    fn capacity_bounds_are_checked() {
        let mut disk = MemDisk::new();
        assert_eq!(disk.mount("tiny", 3), Err(DiskError::BadCapacity));
        assert_eq!(
            disk.mount("huge", MAX_BLOCKS as u32 + 1),
            Err(DiskError::BadCapacity)
        );
    }

    #[test]
    fn records_round_trip_by_index() {
        let mut disk = MemDisk::new();
        let id = disk.mount("disk0", 16).unwrap();

        let mut sb = disk.read_superblock(id).unwrap();
        sb.format(1);
        disk.write_superblock(id, &sb).unwrap();

        disk.write_inode(id, InodeNo::ROOT, &InodeRecord::root())
            .unwrap();
        assert!(disk.read_inode(id, InodeNo::ROOT).unwrap().is_dir());

        let block = disk.alloc_block(id).unwrap();
        let mut data = [0u8; BLOCK_SIZE];
        data[..5].copy_from_slice(b"hello");
        disk.write_block(id, block, &data).unwrap();
        assert_eq!(disk.read_block(id, block).unwrap(), data);
    }

    #[test]
    fn freed_blocks_are_zeroed() {
        let mut disk = MemDisk::new();
        let id = disk.mount("disk0", 16).unwrap();
        let mut sb = disk.read_superblock(id).unwrap();
        sb.format(0);
        disk.write_superblock(id, &sb).unwrap();

        let block = disk.alloc_block(id).unwrap();
        disk.write_block(id, block, &[0xAA; BLOCK_SIZE]).unwrap();
        disk.free_block(id, block).unwrap();

        let again = disk.alloc_block(id).unwrap();
        assert_eq!(again, block);
        assert_eq!(disk.read_block(id, again).unwrap(), [0; BLOCK_SIZE]);
    }
}
