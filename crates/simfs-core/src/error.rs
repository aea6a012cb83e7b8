use crate::types::InodeId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FsError {
    #[error("no such file or directory: {0}")]
    NotFound(String),

    #[error("not a file: {0}")]
    NotAFile(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("name already exists: {0}")]
    NameConflict(String),

    #[error("no free inodes")]
    InodesExhausted,

    #[error("no free data blocks")]
    NoSpace,

    #[error("directory is full: {0}")]
    DirectoryFull(String),

    #[error("file too large: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge { size: usize, limit: usize },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("cannot remove root directory")]
    RootProtected,

    #[error("inode {0} is not allocated")]
    InodeNotFound(InodeId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = core::result::Result<T, FsError>;
