//! Inode记录
//!
//! 固定大小的元信息记录，按编号存放于卷内。目录用子项编号填充
//! 映射表，文件用数据块编号填充映射表，二者以标签变体区分。

use core::fmt;
use core::str;

use derive_more::{From, Into};

use crate::{BLOCK_SIZE, MAX_CHILDREN, MAX_ENTITY_NAME, MAX_FILE_BLOCKS};

/// 卷内inode编号
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, From, Into)]
pub struct InodeNo(u32);

impl InodeNo {
    /// 根目录恒为0号inode
    pub const ROOT: Self = Self(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// 卷内数据块编号
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, From, Into)]
pub struct BlockNo(u32);

impl BlockNo {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// 定宽零填充的实体名
///
/// 相等性是整个字段的逐字节比较；查找时须先把目标名补齐到
/// 字段宽度，绝不做前缀比较。
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct EntityName([u8; MAX_ENTITY_NAME]);

impl EntityName {
    pub const ROOT: Self = {
        let mut field = [0; MAX_ENTITY_NAME];
        field[0] = b'/';
        Self(field)
    };

    /// 将`name`补齐到字段宽度。空名、超长名与含分隔符的名字
    /// 一律拒绝。
    pub fn new(name: &str) -> Option<Self> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > MAX_ENTITY_NAME || bytes.contains(&b'/') {
            return None;
        }

        let mut field = [0; MAX_ENTITY_NAME];
        field[..bytes.len()].copy_from_slice(bytes);
        Some(Self(field))
    }

    pub fn as_str(&self) -> &str {
        let len = self
            .0
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(MAX_ENTITY_NAME);
        str::from_utf8(&self.0[..len]).unwrap_or("?")
    }
}

impl fmt::Debug for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityName({:?})", self.as_str())
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for EntityName {
    fn default() -> Self {
        Self([0; MAX_ENTITY_NAME])
    }
}

/// 文件系统项的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    File,
    Directory,
}

/// 目录inode的有序子项表
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DirBody {
    children: [InodeNo; MAX_CHILDREN],
    len: usize,
}

impl DirBody {
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == MAX_CHILDREN
    }

    /// 已占用的子项，按插入顺序排列
    #[inline]
    pub fn children(&self) -> &[InodeNo] {
        &self.children[..self.len]
    }

    /// 追加一个子项，调用方须先确认未满
    pub fn push(&mut self, child: InodeNo) {
        assert!(!self.is_full());
        self.children[self.len] = child;
        self.len += 1;
    }

    /// 移除`child`，其后的条目整体左移一位以保持相对顺序；
    /// 不存在时返回false。
    pub fn remove(&mut self, child: InodeNo) -> bool {
        let Some(at) = self.children().iter().position(|&c| c == child) else {
            return false;
        };

        self.children.copy_within(at + 1..self.len, at);
        self.len -= 1;
        true
    }
}

/// 文件inode的逻辑块到物理块的连续映射
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FileBody {
    size: u32,
    blocks: [BlockNo; MAX_FILE_BLOCKS],
}

impl FileBody {
    #[inline]
    pub fn size(&self) -> usize {
        self.size as usize
    }

    pub fn set_size(&mut self, size: usize) {
        assert!(size <= BLOCK_SIZE * MAX_FILE_BLOCKS);
        self.size = size as u32;
    }

    /// 覆盖`0..size`所需的块数
    #[inline]
    pub fn block_count(&self) -> usize {
        self.size().div_ceil(BLOCK_SIZE)
    }

    #[inline]
    pub fn blocks(&self) -> &[BlockNo] {
        &self.blocks[..self.block_count()]
    }

    /// 映射下一个逻辑块。增长只会紧跟当前末尾，不产生空洞。
    pub fn push_block(&mut self, index: usize, block: BlockNo) {
        assert!(index < MAX_FILE_BLOCKS);
        self.blocks[index] = block;
    }

    #[inline]
    pub fn block(&self, index: usize) -> BlockNo {
        self.blocks[index]
    }
}

/// 标签变体：目录存子项，文件存数据块映射
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeBody {
    Directory(DirBody),
    File(FileBody),
}

impl InodeBody {
    #[inline]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Directory(_) => EntityKind::Directory,
            Self::File(_) => EntityKind::File,
        }
    }

    #[inline]
    pub fn as_dir(&self) -> Option<&DirBody> {
        match self {
            Self::Directory(dir) => Some(dir),
            Self::File(_) => None,
        }
    }
}

impl Default for InodeBody {
    fn default() -> Self {
        Self::File(FileBody::default())
    }
}

/// 单条定长inode记录
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InodeRecord {
    pub name: EntityName,
    /// 所在目录；仅根inode为`None`
    pub parent: Option<InodeNo>,
    pub body: InodeBody,
}

impl InodeRecord {
    pub fn new(name: EntityName, parent: InodeNo, kind: EntityKind) -> Self {
        let body = match kind {
            EntityKind::Directory => InodeBody::Directory(DirBody::default()),
            EntityKind::File => InodeBody::File(FileBody::default()),
        };

        Self {
            name,
            parent: Some(parent),
            body,
        }
    }

    pub fn root() -> Self {
        Self {
            name: EntityName::ROOT,
            parent: None,
            body: InodeBody::Directory(DirBody::default()),
        }
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        matches!(self.body, InodeBody::Directory(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_whole_field_equality() {
        let a = EntityName::new("file").unwrap();
        let b = EntityName::new("file1").unwrap();
        assert_ne!(a, b);
        assert_eq!(a, EntityName::new("file").unwrap());
    }

    #[test]
    fn name_rejects_malformed() {
        assert!(EntityName::new("").is_none());
        assert!(EntityName::new("a/b").is_none());
        assert!(EntityName::new("overlong1").is_none());
        assert!(EntityName::new("exactly8").is_some());
    }

    #[test]
    fn dir_remove_shifts_left() {
        let mut dir = DirBody::default();
        for raw in 1..=4u32 {
            dir.push(InodeNo::from(raw));
        }
        assert!(dir.is_full());

        assert!(dir.remove(InodeNo::from(2)));
        assert_eq!(
            dir.children(),
            &[InodeNo::from(1), InodeNo::from(3), InodeNo::from(4)]
        );
        assert!(!dir.remove(InodeNo::from(2)));
    }

    #[test]
    fn file_block_count_rounds_up() {
        let mut file = FileBody::default();
        assert_eq!(file.block_count(), 0);
        file.set_size(70);
        assert_eq!(file.block_count(), 2);
        file.set_size(BLOCK_SIZE * MAX_FILE_BLOCKS);
        assert_eq!(file.block_count(), MAX_FILE_BLOCKS);
    }
}
