//! # 会话层
//!
//! [`EmuFileSystem`] owns the block device and both handle arenas.
//! It is deliberately lock-free: concurrent callers layer a
//! [`crate::gate::RwGate`] (or any other policy) around these calls.

use emu_disk::{
    BlockDevice, EntityKind, EntityName, InodeBody, InodeNo, InodeRecord, MemDisk, MountId,
};

use crate::error::{FsError, FsResult};
use crate::handles::{DirFd, DirState, FileFd, FileState, HandleTable};
use crate::resolve::resolve;
use crate::{MAX_DIR_HANDLES, MAX_FILE_HANDLES};

/// One filesystem session: the engine's entire mutable state.
///
/// Every mutation is persisted to the device synchronously, so
/// closing a handle never has anything to flush.
pub struct EmuFileSystem<D: BlockDevice = MemDisk> {
    pub(crate) disk: D,
    pub(crate) dirs: HandleTable<DirState>,
    pub(crate) files: HandleTable<FileState>,
}

impl<D: BlockDevice> EmuFileSystem<D> {
    pub fn new(disk: D) -> Self {
        Self {
            disk,
            dirs: HandleTable::new(MAX_DIR_HANDLES),
            files: HandleTable::new(MAX_FILE_HANDLES),
        }
    }

    /// Opens a fresh volume on the device. The volume is blank; run
    /// [`format`](Self::format) before anything else.
    pub fn mount(&mut self, label: &str, blocks: u32) -> FsResult<MountId> {
        Ok(self.disk.mount(label, blocks)?)
    }

    /// Invalidates every handle bound to `id`, then closes the volume.
    pub fn unmount(&mut self, id: MountId) -> FsResult<()> {
        self.dirs.invalidate(|dir| dir.mount == id);
        self.files.invalidate(|file| file.mount == id);
        Ok(self.disk.unmount(id)?)
    }

    /// Destructive mkfs: a fresh empty tree with only the root
    /// directory. Previously live data is not reclaimed gracefully.
    pub fn format(&mut self, id: MountId, fs_tag: u32) -> FsResult<()> {
        let mut sb = self.disk.read_superblock(id)?;
        sb.format(fs_tag);
        self.disk.write_superblock(id, &sb)?;
        self.disk.write_inode(id, InodeNo::ROOT, &InodeRecord::root())?;

        log::debug!("formatted {:?} (tag {fs_tag})", sb.label());
        Ok(())
    }

    /// Binds a directory handle to the root of `id`.
    pub fn open_root(&mut self, id: MountId) -> FsResult<DirFd> {
        // reject unknown mounts before burning a slot
        self.disk.read_superblock(id)?;

        self.dirs
            .insert(DirState {
                mount: id,
                inode: InodeNo::ROOT,
            })
            .map(DirFd)
            .ok_or(FsError::NoSpace)
    }

    /// Rebinds `fd` to the directory `path` names. On failure the
    /// handle is left unchanged.
    pub fn change_dir(&mut self, fd: DirFd, path: &str) -> FsResult<()> {
        let &DirState { mount, inode } = self.dir_state(fd)?;

        let target = resolve(&self.disk, mount, inode, path)?;
        if !self.disk.read_inode(mount, target)?.is_dir() {
            return Err(FsError::NotFound);
        }

        self.dirs
            .get_mut(fd.0)
            .ok_or(FsError::InvalidHandle)?
            .inode = target;
        Ok(())
    }

    pub fn close_dir(&mut self, fd: DirFd) -> FsResult<()> {
        self.dirs.release(fd.0).ok_or(FsError::InvalidHandle)?;
        Ok(())
    }

    pub fn close_file(&mut self, fd: FileFd) -> FsResult<()> {
        self.files.release(fd.0).ok_or(FsError::InvalidHandle)?;
        Ok(())
    }

    /// Creates a file or directory named `name` under `fd`.
    ///
    /// Entries with the same name may coexist iff their types differ.
    pub fn create(&mut self, fd: DirFd, name: &str, kind: EntityKind) -> FsResult<InodeNo> {
        let &DirState {
            mount,
            inode: dir_no,
        } = self.dir_state(fd)?;

        let name = EntityName::new(name).ok_or(FsError::NotFound)?;
        let mut parent = self.disk.read_inode(mount, dir_no)?;
        let Some(dir) = parent.body.as_dir() else {
            return Err(FsError::NotFound);
        };

        for &child in dir.children() {
            let entry = self.disk.read_inode(mount, child)?;
            if entry.name == name && entry.body.kind() == kind {
                return Err(FsError::AlreadyExists);
            }
        }
        if dir.is_full() {
            return Err(FsError::DirectoryFull);
        }

        let inode = self.disk.alloc_inode(mount)?;
        self.disk
            .write_inode(mount, inode, &InodeRecord::new(name, dir_no, kind))?;

        let InodeBody::Directory(dir) = &mut parent.body else {
            unreachable!("checked above");
        };
        dir.push(inode);
        self.disk.write_inode(mount, dir_no, &parent)?;

        log::debug!("create {name} ({kind:?}) under inode {}", dir_no.index());
        Ok(inode)
    }

    /// Deletes the entity `path` names, reclaiming its whole subtree.
    ///
    /// The entry is detached from its parent first, making the
    /// subtree unreachable before any inode or block is freed.
    pub fn delete(&mut self, fd: DirFd, path: &str) -> FsResult<()> {
        let &DirState {
            mount,
            inode: start,
        } = self.dir_state(fd)?;

        let target = resolve(&self.disk, mount, start, path)?;
        let record = self.disk.read_inode(mount, target)?;
        // the root is never deleted
        let parent_no = record.parent.ok_or(FsError::NotFound)?;

        let mut parent = self.disk.read_inode(mount, parent_no)?;
        let InodeBody::Directory(dir) = &mut parent.body else {
            return Err(FsError::NotFound);
        };
        if !dir.remove(target) {
            return Err(FsError::NotFound);
        }
        self.disk.write_inode(mount, parent_no, &parent)?;

        self.reclaim(mount, target)
    }

    /// Renders the directory tree plus the usage counters.
    pub fn dump(&self, id: MountId) -> FsResult<String> {
        self.render_dump(id)
    }

    pub(crate) fn dir_state(&self, fd: DirFd) -> FsResult<&DirState> {
        self.dirs.get(fd.0).ok_or(FsError::InvalidHandle)
    }

    pub(crate) fn file_state(&self, fd: FileFd) -> FsResult<&FileState> {
        self.files.get(fd.0).ok_or(FsError::InvalidHandle)
    }

    /// Frees the inode, its blocks and its descendants, closing every
    /// handle that referenced them. The subtree is already detached,
    /// so a failure here is not recoverable; errors still propagate.
    fn reclaim(&mut self, mount: MountId, inode: InodeNo) -> FsResult<()> {
        let record = self.disk.read_inode(mount, inode)?;
        match record.body {
            InodeBody::File(file) => {
                self.files
                    .invalidate(|f| f.mount == mount && f.inode == inode);
                for &block in file.blocks() {
                    self.disk.free_block(mount, block)?;
                }
            }
            InodeBody::Directory(dir) => {
                self.dirs
                    .invalidate(|d| d.mount == mount && d.inode == inode);
                for &child in dir.children() {
                    self.reclaim(mount, child)?;
                }
            }
        }
        self.disk.free_inode(mount, inode)?;

        log::trace!("reclaimed inode {}", inode.index());
        Ok(())
    }
}
