//! # 磁盘数据结构层
//!
//! 每个卷的布局:
//! 超级块 | inode记录区 | 数据块区

mod bitmap;
pub use bitmap::Bitmap;

mod inode;
pub use inode::{BlockNo, DirBody, EntityKind, EntityName, FileBody, InodeBody, InodeNo, InodeRecord};

mod super_block;
pub use super_block::Superblock;
