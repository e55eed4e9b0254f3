use crate::layout::{Bitmap, BlockNo, InodeNo};
use crate::{MAX_INODES, RESERVED_BLOCKS};

/// 超级块：
/// - 每卷一个，保存分配位图与占用计数；
/// - 由设备层代为读写。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Superblock {
    /// Filesystem tag stamped by `format`.
    pub fs_tag: u32,
    label: String,
    /// Volume capacity in blocks.
    disk_size: u32,
    used_blocks: u32,
    used_inodes: u32,
    block_bitmap: Bitmap,
    inode_bitmap: Bitmap,
}

impl Superblock {
    /// A blank superblock for a freshly mounted volume. Nothing is
    /// allocatable until `format` runs.
    pub fn new(label: &str, disk_size: u32) -> Self {
        Self {
            fs_tag: 0,
            label: label.to_owned(),
            disk_size,
            used_blocks: 0,
            used_inodes: 0,
            block_bitmap: Bitmap::new(disk_size as usize),
            inode_bitmap: Bitmap::new(MAX_INODES),
        }
    }

    /// Destructive mkfs: resets both bitmaps, pinning the metadata
    /// blocks and the root inode slot.
    pub fn format(&mut self, fs_tag: u32) {
        self.fs_tag = fs_tag;

        self.block_bitmap.clear_all();
        for block in 0..RESERVED_BLOCKS {
            self.block_bitmap.mark(block);
        }
        self.used_blocks = RESERVED_BLOCKS as u32;

        self.inode_bitmap.clear_all();
        self.inode_bitmap.mark(InodeNo::ROOT.index());
        self.used_inodes = 1;
    }

    pub fn alloc_block(&mut self) -> Option<BlockNo> {
        let index = self.block_bitmap.alloc()?;
        self.used_blocks += 1;
        Some(BlockNo::from(index as u32))
    }

    pub fn free_block(&mut self, block: BlockNo) {
        self.block_bitmap.dealloc(block.index());
        self.used_blocks -= 1;
    }

    pub fn alloc_inode(&mut self) -> Option<InodeNo> {
        let index = self.inode_bitmap.alloc()?;
        self.used_inodes += 1;
        Some(InodeNo::from(index as u32))
    }

    pub fn free_inode(&mut self, inode: InodeNo) {
        self.inode_bitmap.dealloc(inode.index());
        self.used_inodes -= 1;
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn disk_size(&self) -> u32 {
        self.disk_size
    }

    #[inline]
    pub fn used_blocks(&self) -> u32 {
        self.used_blocks
    }

    #[inline]
    pub fn used_inodes(&self) -> u32 {
        self.used_inodes
    }

    /// Blocks still allocatable on this volume.
    #[inline]
    pub fn free_blocks(&self) -> u32 {
        self.disk_size - self.used_blocks
    }
}

#[cfg(test)]
mod tests {
    use super::Superblock;
    use crate::RESERVED_BLOCKS;

    #[test]
    fn format_reserves_metadata() {
        let mut sb = Superblock::new("disk0", 16);
        sb.format(7);

        assert_eq!(sb.fs_tag, 7);
        assert_eq!(sb.used_blocks(), RESERVED_BLOCKS as u32);
        assert_eq!(sb.used_inodes(), 1);

        // first allocatable block sits right after the reserved ones
        assert_eq!(sb.alloc_block().unwrap().index(), RESERVED_BLOCKS);
        // inode 0 is pinned for the root
        assert_eq!(sb.alloc_inode().unwrap().index(), 1);
    }

    #[test]
    fn counters_follow_alloc_and_free() {
        let mut sb = Superblock::new("disk0", 16);
        sb.format(0);

        let block = sb.alloc_block().unwrap();
        let inode = sb.alloc_inode().unwrap();
        assert_eq!(sb.used_blocks(), RESERVED_BLOCKS as u32 + 1);
        assert_eq!(sb.used_inodes(), 2);

        sb.free_block(block);
        sb.free_inode(inode);
        assert_eq!(sb.used_blocks(), RESERVED_BLOCKS as u32);
        assert_eq!(sb.used_inodes(), 1);
        assert_eq!(sb.free_blocks(), 16 - RESERVED_BLOCKS as u32);
    }

    #[test]
    fn block_exhaustion_is_reported() {
        let mut sb = Superblock::new("tiny", 4);
        sb.format(0);
        assert!(sb.alloc_block().is_some());
        assert!(sb.alloc_block().is_none());
    }
}
