//! # 目录树渲染
//!
//! Read-only traversal producing the indented tree listing plus the
//! volume's usage counters. Printing is the caller's business.

use core::fmt::Write;

use emu_disk::{BlockDevice, InodeBody, InodeNo, MountId};

use crate::error::FsResult;
use crate::fs::EmuFileSystem;

impl<D: BlockDevice> EmuFileSystem<D> {
    pub(crate) fn render_dump(&self, id: MountId) -> FsResult<String> {
        let sb = self.disk.read_superblock(id)?;

        let mut out = String::new();
        let _ = writeln!(out, "[{}] fsdump", sb.label());
        self.render_tree(id, InodeNo::ROOT, 0, &mut out)?;
        let _ = writeln!(
            out,
            "Inodes in use: {}, Blocks in use: {}",
            sb.used_inodes(),
            sb.used_blocks()
        );

        Ok(out)
    }

    fn render_tree(
        &self,
        id: MountId,
        inode: InodeNo,
        depth: usize,
        out: &mut String,
    ) -> FsResult<()> {
        let record = self.disk.read_inode(id, inode)?;

        for _ in 1..depth {
            out.push_str("|  ");
        }
        if depth > 0 {
            out.push_str("|--");
        }
        out.push_str(record.name.as_str());

        match record.body {
            InodeBody::File(file) => {
                let _ = writeln!(out, " ({} bytes)", file.size());
            }
            InodeBody::Directory(dir) => {
                out.push('\n');
                for &child in dir.children() {
                    self.render_tree(id, child, depth + 1, out)?;
                }
            }
        }

        Ok(())
    }
}
