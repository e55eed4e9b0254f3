//! # I/O翻译层
//!
//! 将`(inode, 偏移, 长度)`请求翻译为整块设备访问：不完整的块
//! 走读改写，增长只会把映射扩展到当前末尾的下一块。

use emu_disk::{Block, BlockDevice, InodeBody, BLOCK_SIZE, MAX_FILE_SIZE};

use crate::error::{FsError, FsResult};
use crate::fs::EmuFileSystem;
use crate::handles::{DirFd, DirState, FileFd, FileState};
use crate::resolve::resolve;

impl<D: BlockDevice> EmuFileSystem<D> {
    /// 打开`path`所指文件的句柄，游标置于0。
    pub fn open_file(&mut self, fd: DirFd, path: &str) -> FsResult<FileFd> {
        let &DirState { mount, inode } = self.dir_state(fd)?;

        let target = resolve(&self.disk, mount, inode, path)?;
        if self.disk.read_inode(mount, target)?.is_dir() {
            return Err(FsError::NotFound);
        }

        self.files
            .insert(FileState {
                mount,
                inode: target,
                offset: 0,
            })
            .map(FileFd)
            .ok_or(FsError::NoSpace)
    }

    /// 自游标处读取至多`len`字节。越过文件末尾的部分静默截断，
    /// 游标按实际读出的字节数前移。
    pub fn read(&mut self, fd: FileFd, len: usize) -> FsResult<Vec<u8>> {
        let &FileState {
            mount,
            inode,
            offset,
        } = self.file_state(fd)?;

        let record = self.disk.read_inode(mount, inode)?;
        let InodeBody::File(file) = record.body else {
            return Err(FsError::InvalidHandle);
        };

        let len = len.min(file.size().saturating_sub(offset));
        let mut out = Vec::with_capacity(len);
        let mut pos = offset;

        while out.len() < len {
            let block_index = pos / BLOCK_SIZE;
            let block_offset = pos % BLOCK_SIZE;
            let take = (BLOCK_SIZE - block_offset).min(len - out.len());

            let data = self.disk.read_block(mount, file.block(block_index))?;
            out.extend_from_slice(&data[block_offset..block_offset + take]);
            pos += take;
        }

        self.files
            .get_mut(fd.0)
            .ok_or(FsError::InvalidHandle)?
            .offset = pos;
        Ok(out)
    }

    /// 自游标处写入`buf`。
    ///
    /// 容量在动笔前检查：既查文件大小上限，也查卷内空闲块，
    /// 因此一次写入要么完整成功，要么什么都不改。游标前移
    /// 整个写入长度。
    pub fn write(&mut self, fd: FileFd, buf: &[u8]) -> FsResult<()> {
        let &FileState {
            mount,
            inode,
            offset,
        } = self.file_state(fd)?;

        let end = offset + buf.len();
        if end > MAX_FILE_SIZE {
            return Err(FsError::OutOfRange);
        }

        let mut record = self.disk.read_inode(mount, inode)?;
        let InodeBody::File(file) = &mut record.body else {
            return Err(FsError::InvalidHandle);
        };

        let mut mapped = file.block_count();
        let wanted = end.div_ceil(BLOCK_SIZE);
        if wanted > mapped {
            let sb = self.disk.read_superblock(mount)?;
            if (sb.free_blocks() as usize) < wanted - mapped {
                return Err(FsError::NoSpace);
            }
        }

        if !buf.is_empty() {
            // 逐块覆盖 [offset, end)
            for block_index in offset / BLOCK_SIZE..=(end - 1) / BLOCK_SIZE {
                let lo = (block_index * BLOCK_SIZE).max(offset);
                let hi = ((block_index + 1) * BLOCK_SIZE).min(end);
                let span = (lo % BLOCK_SIZE)..(lo % BLOCK_SIZE + hi - lo);

                if block_index == mapped {
                    // the cursor never passes the size, so growth is
                    // always exactly one past the mapped end
                    let block = self.disk.alloc_block(mount)?;
                    file.push_block(block_index, block);
                    mapped += 1;

                    let mut data: Block = [0; BLOCK_SIZE];
                    data[span].copy_from_slice(&buf[lo - offset..hi - offset]);
                    self.disk.write_block(mount, block, &data)?;
                } else {
                    let block = file.block(block_index);
                    let mut data = self.disk.read_block(mount, block)?;
                    data[span].copy_from_slice(&buf[lo - offset..hi - offset]);
                    self.disk.write_block(mount, block, &data)?;
                }
            }
        }

        file.set_size(file.size().max(end));
        self.disk.write_inode(mount, inode, &record)?;

        self.files
            .get_mut(fd.0)
            .ok_or(FsError::InvalidHandle)?
            .offset = end;
        Ok(())
    }

    /// 按相对量`delta`移动游标。前越文件末尾或后越零位
    /// 均被拒绝。
    pub fn seek(&mut self, fd: FileFd, delta: i64) -> FsResult<()> {
        let &FileState {
            mount,
            inode,
            offset,
        } = self.file_state(fd)?;

        let target = (offset as i64)
            .checked_add(delta)
            .ok_or(FsError::OutOfRange)?;
        if target < 0 {
            return Err(FsError::OutOfRange);
        }
        if delta > 0 {
            let record = self.disk.read_inode(mount, inode)?;
            let InodeBody::File(file) = record.body else {
                return Err(FsError::InvalidHandle);
            };
            if target as usize > file.size() {
                return Err(FsError::OutOfRange);
            }
        }

        self.files
            .get_mut(fd.0)
            .ok_or(FsError::InvalidHandle)?
            .offset = target as usize;
        Ok(())
    }
}
