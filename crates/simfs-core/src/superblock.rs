use crate::config::FsConfig;
use crate::types::InodeId;
use serde::Serialize;

/// Aggregate resource counters for the whole filesystem.
///
/// The free counters are adjusted by the block pool and inode table on every
/// allocation and free; they are never recomputed from the tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperBlock {
    pub total_blocks: u32,
    pub block_size: u32,
    pub total_inodes: u32,
    pub free_blocks: u32,
    pub free_inodes: u32,
    pub root_inode: InodeId,
}

impl SuperBlock {
    /// Everything free; the root inode is filled in once allocated.
    pub fn new(config: &FsConfig) -> Self {
        Self {
            total_blocks: config.total_blocks as u32,
            block_size: config.block_size as u32,
            total_inodes: config.total_inodes as u32,
            free_blocks: config.total_blocks as u32,
            free_inodes: config.total_inodes as u32,
            root_inode: InodeId::new(0),
        }
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            block_size: self.block_size,
            total_blocks: self.total_blocks,
            free_blocks: self.free_blocks,
            total_inodes: self.total_inodes,
            free_inodes: self.free_inodes,
            root_inode: self.root_inode,
        }
    }
}

/// Snapshot of the superblock counters handed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub block_size: u32,
    pub total_blocks: u32,
    pub free_blocks: u32,
    pub total_inodes: u32,
    pub free_inodes: u32,
    pub root_inode: InodeId,
}

impl PoolStatus {
    pub fn used_blocks(&self) -> u32 {
        self.total_blocks - self.free_blocks
    }

    pub fn used_inodes(&self) -> u32 {
        self.total_inodes - self.free_inodes
    }
}
