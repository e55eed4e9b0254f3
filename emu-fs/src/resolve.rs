//! # 路径解析层
//!
//! Walks the directory tree from a starting inode down to the inode
//! a path names. Strictly string-in, number-out; no handle state is
//! touched here.

use emu_disk::{BlockDevice, EntityName, InodeNo, MountId};

use crate::error::{FsError, FsResult};
use crate::SEPARATOR;

/// Resolves `path` against `start`.
///
/// - a leading separator restarts at the volume root;
/// - empty tokens and `.` are skipped;
/// - `..` ascends; at the root it fails rather than staying put;
/// - name tokens are padded to field width and compared whole-field
///   against the children in insertion order, first match wins;
/// - a file matched mid-path cannot be descended through.
pub(crate) fn resolve<D: BlockDevice>(
    disk: &D,
    mount: MountId,
    start: InodeNo,
    path: &str,
) -> FsResult<InodeNo> {
    let mut cur = if path.starts_with(SEPARATOR) {
        InodeNo::ROOT
    } else {
        start
    };
    let mut record = disk.read_inode(mount, cur)?;
    if !record.is_dir() {
        return Err(FsError::NotFound);
    }

    let mut tokens = path
        .split(SEPARATOR)
        .filter(|token| !token.is_empty() && *token != ".")
        .peekable();

    while let Some(token) = tokens.next() {
        if token == ".." {
            // 根目录没有上级，严格报错而非原地踏步
            let Some(parent) = record.parent else {
                return Err(FsError::NotFound);
            };
            cur = parent;
            record = disk.read_inode(mount, cur)?;
            continue;
        }

        let name = EntityName::new(token).ok_or(FsError::NotFound)?;
        let dir = record.body.as_dir().ok_or(FsError::NotFound)?;

        let mut next = None;
        for &child in dir.children() {
            let candidate = disk.read_inode(mount, child)?;
            if candidate.name == name {
                next = Some((child, candidate));
                break;
            }
        }
        let Some((child, child_record)) = next else {
            return Err(FsError::NotFound);
        };

        if tokens.peek().is_some() && !child_record.is_dir() {
            return Err(FsError::NotFound);
        }

        cur = child;
        record = child_record;
    }

    Ok(cur)
}
