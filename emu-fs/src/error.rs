use core::fmt;

use emu_disk::DiskError;

/// Failure taxonomy of every engine operation.
///
/// Errors surface to the immediate caller; nothing is retried and no
/// partial mutation is left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /// Handle index out of range, unbound, or an unknown mount id.
    InvalidHandle,
    /// Path resolution failure.
    NotFound,
    /// Duplicate name and type within one directory.
    AlreadyExists,
    /// The directory already holds `MAX_CHILDREN` entries.
    DirectoryFull,
    /// Inode, block or table exhaustion.
    NoSpace,
    /// Seek or size bound violation.
    OutOfRange,
}

pub type FsResult<T> = Result<T, FsError>;

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::InvalidHandle => "invalid handle",
            Self::NotFound => "not found",
            Self::AlreadyExists => "already exists",
            Self::DirectoryFull => "directory full",
            Self::NoSpace => "no space",
            Self::OutOfRange => "out of range",
        };
        f.write_str(reason)
    }
}

impl From<DiskError> for FsError {
    fn from(err: DiskError) -> Self {
        match err {
            DiskError::BadMount | DiskError::BadIndex => Self::InvalidHandle,
            DiskError::BadCapacity => Self::OutOfRange,
            DiskError::NoSpace | DiskError::TableFull => Self::NoSpace,
        }
    }
}
