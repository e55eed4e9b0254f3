//! # emu-fs
//!
//! An inode-addressed hierarchical namespace on top of the emulated
//! block device from `emu-disk`: path resolution, entity lifecycle,
//! handle tables and block-level I/O translation.
//!
//! The engine keeps no locks of its own; a caller running concurrent
//! operations on one mount wraps them in a [`gate::RwGate`].

/* emu-fs 的整体架构，自上而下 */

// 会话层：持有设备与句柄表，实现挂载、格式化与实体生命周期
mod fs;

// I/O翻译层：文件的按偏移读写与seek
mod io;

// 路径解析层
mod resolve;

// 句柄表
mod handles;

// 目录树渲染
mod dump;

mod error;

// 读写门闩：调用方注入的并发策略
pub mod gate;

pub use self::{
    error::{FsError, FsResult},
    fs::EmuFileSystem,
    handles::{DirFd, FileFd},
};

pub use emu_disk::{
    BlockDevice, EntityKind, InodeNo, MemDisk, MountId, BLOCK_SIZE, MAX_CHILDREN,
    MAX_ENTITY_NAME, MAX_FILE_BLOCKS, MAX_FILE_SIZE,
};

/// Directory handles a session holds at most.
pub const MAX_DIR_HANDLES: usize = 16;
/// File handles a session holds at most.
pub const MAX_FILE_HANDLES: usize = 16;

/// Path separator.
pub const SEPARATOR: char = '/';
