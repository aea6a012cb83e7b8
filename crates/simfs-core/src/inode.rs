use crate::error::{FsError, Result};
use crate::superblock::SuperBlock;
use crate::types::{BlockId, FileType, InodeId};
use log::{debug, warn};
use serde::Serialize;

/// Metadata record for one file or directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inode {
    pub id: InodeId,
    pub file_type: FileType,
    /// Bytes of content; always 0 for directories.
    pub size: usize,
    pub created: u64,
    pub modified: u64,
    /// Owned data blocks, in content order. Empty for directories.
    pub blocks: Vec<BlockId>,
}

impl Inode {
    pub fn new(id: InodeId, file_type: FileType, now: u64) -> Self {
        Self {
            id,
            file_type,
            size: 0,
            created: now,
            modified: now,
            blocks: Vec::new(),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }

    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn metadata(&self) -> InodeMetadata {
        InodeMetadata {
            inode: self.id,
            kind: self.file_type,
            size: self.size,
            created: self.created,
            modified: self.modified,
            blocks: self.blocks.clone(),
        }
    }
}

/// Read-only copy of an inode's attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InodeMetadata {
    pub inode: InodeId,
    pub kind: FileType,
    pub size: usize,
    pub created: u64,
    pub modified: u64,
    pub blocks: Vec<BlockId>,
}

impl InodeMetadata {
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

/// Fixed array of inode slots. `None` marks a free slot.
pub struct InodeTable {
    slots: Vec<Option<Inode>>,
}

impl InodeTable {
    pub fn new(total_inodes: usize) -> Self {
        Self {
            slots: vec![None; total_inodes],
        }
    }

    pub fn count_free(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_none()).count()
    }

    /// Initialises the lowest free slot as an empty inode of `file_type`.
    pub fn allocate(
        &mut self,
        superblock: &mut SuperBlock,
        file_type: FileType,
        now: u64,
    ) -> Result<InodeId> {
        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(FsError::InodesExhausted)?;
        let id = InodeId::new(index as u32);
        self.slots[index] = Some(Inode::new(id, file_type, now));
        superblock.free_inodes -= 1;
        debug!(
            "Allocated inode {} ({:?}, {} free)",
            id, file_type, superblock.free_inodes
        );
        Ok(id)
    }

    /// Returns the slot to the free state. Owned blocks and directory entries
    /// must already be gone.
    pub fn free(&mut self, superblock: &mut SuperBlock, id: InodeId) {
        match self.slots.get_mut(id.index()) {
            Some(slot @ Some(_)) => {
                *slot = None;
                superblock.free_inodes += 1;
                debug!("Freed inode {} ({} free)", id, superblock.free_inodes);
            }
            _ => warn!("Ignoring free of unallocated inode {}", id),
        }
    }

    pub fn get(&self, id: InodeId) -> Result<&Inode> {
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(FsError::InodeNotFound(id))
    }

    pub fn get_mut(&mut self, id: InodeId) -> Result<&mut Inode> {
        self.slots
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(FsError::InodeNotFound(id))
    }

    /// All live inodes in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Inode> {
        self.slots.iter().flatten()
    }
}
