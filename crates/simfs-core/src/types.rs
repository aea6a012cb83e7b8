use core::fmt;
use serde::Serialize;

/// Inode number: index of a slot in the inode table.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct InodeId(u32);

impl InodeId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for InodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Data block number: index of a buffer in the block pool.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct BlockId(u32);

impl BlockId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileType {
    File,
    Directory,
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::File => f.write_str("File"),
            FileType::Directory => f.write_str("Directory"),
        }
    }
}

/// A named, non-owning reference from a directory to an inode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    pub name: String,
    pub inode: InodeId,
}

impl DirEntry {
    pub fn new(name: &str, inode: InodeId) -> Self {
        Self {
            name: name.to_string(),
            inode,
        }
    }

    /// `.` and `..`
    pub fn is_reserved(&self) -> bool {
        self.name == "." || self.name == ".."
    }
}
