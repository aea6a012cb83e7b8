//! Offline consistency audit, in the spirit of `fsck`.
//!
//! Recomputes what the superblock counters cache and cross-checks block
//! ownership, the `.`/`..` entries and reachability from the root.

use crate::fs::FileSystem;
use crate::types::{BlockId, InodeId};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Inconsistency {
    #[error("superblock records {recorded} free blocks, pool has {actual}")]
    FreeBlockCount { recorded: u32, actual: usize },

    #[error("superblock records {recorded} free inodes, table has {actual}")]
    FreeInodeCount { recorded: u32, actual: usize },

    /// Marked used but listed by no file.
    #[error("block {0} is used but unowned")]
    LeakedBlock(BlockId),

    /// Listed by a file but marked free.
    #[error("block {block} is free but owned by inode {inode}")]
    FreeBlockInUse { block: BlockId, inode: InodeId },

    #[error("block {block} is owned by both inode {first} and inode {second}")]
    SharedBlock {
        block: BlockId,
        first: InodeId,
        second: InodeId,
    },

    #[error("inode {inode} has size {size} but {blocks} blocks")]
    SizeMismatch {
        inode: InodeId,
        size: usize,
        blocks: usize,
    },

    /// A directory inode without an entry list, or the reverse.
    #[error("inode {0} kind disagrees with the directory tree")]
    DirectoryMismatch(InodeId),

    #[error("directory {0} has a bad '.' entry")]
    BadSelfEntry(InodeId),

    #[error("directory {0} has a bad '..' entry")]
    BadParentEntry(InodeId),

    #[error("directory {dir} entry '{name}' points at a free inode")]
    DanglingEntry { dir: InodeId, name: String },

    /// Live but not named by any directory.
    #[error("inode {0} is unreachable")]
    Orphan(InodeId),

    /// Named by more than one directory entry.
    #[error("inode {0} is linked more than once")]
    MultiplyLinked(InodeId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub problems: Vec<Inconsistency>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

impl FileSystem {
    pub fn check(&self) -> CheckReport {
        let mut problems = Vec::new();
        self.check_counters(&mut problems);
        self.check_blocks(&mut problems);
        self.check_directories(&mut problems);
        CheckReport { problems }
    }

    fn check_counters(&self, problems: &mut Vec<Inconsistency>) {
        let actual = self.blocks.count_free();
        if actual != self.superblock.free_blocks as usize {
            problems.push(Inconsistency::FreeBlockCount {
                recorded: self.superblock.free_blocks,
                actual,
            });
        }
        let actual = self.inodes.count_free();
        if actual != self.superblock.free_inodes as usize {
            problems.push(Inconsistency::FreeInodeCount {
                recorded: self.superblock.free_inodes,
                actual,
            });
        }
    }

    fn check_blocks(&self, problems: &mut Vec<Inconsistency>) {
        let mut owners: HashMap<BlockId, InodeId> = HashMap::new();

        for inode in self.inodes.iter() {
            if inode.block_count() != self.config.blocks_for(inode.size) {
                problems.push(Inconsistency::SizeMismatch {
                    inode: inode.id,
                    size: inode.size,
                    blocks: inode.block_count(),
                });
            }
            for &block in &inode.blocks {
                if !self.blocks.is_used(block) {
                    problems.push(Inconsistency::FreeBlockInUse {
                        block,
                        inode: inode.id,
                    });
                }
                if let Some(&first) = owners.get(&block) {
                    problems.push(Inconsistency::SharedBlock {
                        block,
                        first,
                        second: inode.id,
                    });
                } else {
                    owners.insert(block, inode.id);
                }
            }
        }

        for index in 0..self.blocks.total_blocks() {
            let block = BlockId::new(index as u32);
            if self.blocks.is_used(block) && !owners.contains_key(&block) {
                problems.push(Inconsistency::LeakedBlock(block));
            }
        }
    }

    fn check_directories(&self, problems: &mut Vec<Inconsistency>) {
        let root = self.root();
        let mut links: HashMap<InodeId, usize> = HashMap::new();

        for inode in self.inodes.iter() {
            if inode.is_dir() != self.tree.is_dir(inode.id) {
                problems.push(Inconsistency::DirectoryMismatch(inode.id));
            }
        }

        for (dir, directory) in self.tree.iter() {
            if self.inodes.get(dir).is_err() {
                problems.push(Inconsistency::DirectoryMismatch(dir));
                continue;
            }
            let entries = directory.entries();
            let self_ok = entries.iter().filter(|e| e.name == ".").count() == 1
                && entries
                    .first()
                    .is_some_and(|e| e.name == "." && e.inode == dir);
            if !self_ok {
                problems.push(Inconsistency::BadSelfEntry(dir));
            }
            let parent_ok = entries.iter().filter(|e| e.name == "..").count() == 1
                && entries.get(1).is_some_and(|e| {
                    e.name == ".."
                        && if dir == root {
                            e.inode == root
                        } else {
                            self.tree.name_of(e.inode, dir).is_some()
                        }
                });
            if !parent_ok {
                problems.push(Inconsistency::BadParentEntry(dir));
            }

            for entry in directory.children() {
                if self.inodes.get(entry.inode).is_err() {
                    problems.push(Inconsistency::DanglingEntry {
                        dir,
                        name: entry.name.clone(),
                    });
                }
                *links.entry(entry.inode).or_default() += 1;
            }
        }

        let reachable = self.reachable_from_root();
        for inode in self.inodes.iter() {
            if !reachable.contains(&inode.id) {
                problems.push(Inconsistency::Orphan(inode.id));
            }
            let expected = if inode.id == root { 0 } else { 1 };
            if links.get(&inode.id).copied().unwrap_or(0) > expected {
                problems.push(Inconsistency::MultiplyLinked(inode.id));
            }
        }
    }

    fn reachable_from_root(&self) -> HashSet<InodeId> {
        let mut seen = HashSet::new();
        let mut pending = vec![self.root()];
        while let Some(dir) = pending.pop() {
            if !seen.insert(dir) {
                continue;
            }
            if let Some(directory) = self.tree.get(dir) {
                pending.extend(directory.children().iter().map(|e| e.inode));
            }
        }
        seen
    }
}
