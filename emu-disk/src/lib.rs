//! # Virtual block device
//!
//! An emulated, in-process block device for `emu-fs`. Each mounted
//! volume is a fixed array of records addressed by integer index:
//! one superblock, `MAX_INODES` inode records and `disk_size` data
//! blocks. No real OS filesystem is touched.

// 磁盘数据结构层：表示磁盘文件系统的数据结构
mod layout;

// 设备层：挂载表、记录读写与位图分配
mod device;

pub use self::{
    device::{BlockDevice, DiskError, DiskResult, MemDisk, MountId},
    layout::{
        Bitmap, BlockNo, DirBody, EntityKind, EntityName, FileBody, InodeBody, InodeNo,
        InodeRecord, Superblock,
    },
};

/// Bytes per data block.
pub const BLOCK_SIZE: usize = 64;
/// Data blocks a single file may map.
pub const MAX_FILE_BLOCKS: usize = 4;
/// Largest representable file, in bytes.
pub const MAX_FILE_SIZE: usize = BLOCK_SIZE * MAX_FILE_BLOCKS;
/// Entries a single directory may hold.
pub const MAX_CHILDREN: usize = 4;
/// Fixed width of an entity name field.
pub const MAX_ENTITY_NAME: usize = 8;
/// Inode records per volume.
pub const MAX_INODES: usize = 64;
/// Upper bound on the block capacity of a volume.
pub const MAX_BLOCKS: usize = 1024;
/// Blocks 0..3 of every volume are metadata, never handed out.
pub const RESERVED_BLOCKS: usize = 3;
/// Volumes that may be open at once.
pub const MAX_MOUNT_POINTS: usize = 8;

/// One data block.
pub type Block = [u8; BLOCK_SIZE];
