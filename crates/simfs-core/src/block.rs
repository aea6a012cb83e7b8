use crate::bitmap::Bitmap;
use crate::error::{FsError, Result};
use crate::superblock::SuperBlock;
use crate::types::BlockId;
use log::{debug, warn};

/// Fixed array of fixed-size data blocks.
pub struct BlockPool {
    block_size: usize,
    data: Vec<u8>,
    map: Bitmap,
}

impl BlockPool {
    pub fn new(total_blocks: usize, block_size: usize) -> Self {
        Self {
            block_size,
            data: vec![0; total_blocks * block_size],
            map: Bitmap::new(total_blocks),
        }
    }

    pub fn total_blocks(&self) -> usize {
        self.map.len()
    }

    pub fn is_used(&self, block: BlockId) -> bool {
        self.map.is_used(block.index())
    }

    pub fn count_free(&self) -> usize {
        self.map.count_free()
    }

    /// Claims the lowest-numbered free block.
    pub fn allocate(&mut self, superblock: &mut SuperBlock) -> Result<BlockId> {
        let index = self.map.allocate().ok_or(FsError::NoSpace)?;
        superblock.free_blocks -= 1;
        debug!("Allocated block {} ({} free)", index, superblock.free_blocks);
        Ok(BlockId::new(index as u32))
    }

    pub fn free(&mut self, superblock: &mut SuperBlock, block: BlockId) {
        if !self.map.mark_free(block.index()) {
            warn!("Ignoring free of unallocated block {}", block);
            return;
        }
        self.buffer_mut(block).fill(0);
        superblock.free_blocks += 1;
        debug!("Freed block {} ({} free)", block, superblock.free_blocks);
    }

    /// Copies `chunk` to the start of `block`. `chunk` must fit in one block.
    pub fn write(&mut self, block: BlockId, chunk: &[u8]) {
        debug_assert!(chunk.len() <= self.block_size);
        self.buffer_mut(block)[..chunk.len()].copy_from_slice(chunk);
    }

    /// The first `len` bytes of `block`, clamped to the block size.
    pub fn read(&self, block: BlockId, len: usize) -> &[u8] {
        let start = block.index() * self.block_size;
        &self.data[start..start + len.min(self.block_size)]
    }

    fn buffer_mut(&mut self, block: BlockId) -> &mut [u8] {
        let start = block.index() * self.block_size;
        &mut self.data[start..start + self.block_size]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FsConfig;

    fn pool(total: usize) -> (BlockPool, SuperBlock) {
        let config = FsConfig {
            total_blocks: total,
            block_size: 4,
            ..FsConfig::default()
        };
        (BlockPool::new(total, 4), SuperBlock::new(&config))
    }

    #[test]
    fn allocate_is_first_fit_and_counts() {
        let (mut blocks, mut sb) = pool(3);
        assert_eq!(blocks.allocate(&mut sb).unwrap(), BlockId::new(0));
        assert_eq!(blocks.allocate(&mut sb).unwrap(), BlockId::new(1));
        assert_eq!(sb.free_blocks, 1);

        blocks.free(&mut sb, BlockId::new(0));
        assert_eq!(sb.free_blocks, 2);
        assert_eq!(blocks.allocate(&mut sb).unwrap(), BlockId::new(0));
    }

    #[test]
    fn exhausted_pool_leaves_counter_alone() {
        let (mut blocks, mut sb) = pool(1);
        blocks.allocate(&mut sb).unwrap();
        assert_eq!(blocks.allocate(&mut sb), Err(FsError::NoSpace));
        assert_eq!(sb.free_blocks, 0);
    }

    #[test]
    fn double_free_does_not_inflate_counter() {
        let (mut blocks, mut sb) = pool(2);
        let b = blocks.allocate(&mut sb).unwrap();
        blocks.free(&mut sb, b);
        blocks.free(&mut sb, b);
        assert_eq!(sb.free_blocks, 2);
    }

    #[test]
    fn read_clamps_to_block_size_and_free_scrubs() {
        let (mut blocks, mut sb) = pool(2);
        let b = blocks.allocate(&mut sb).unwrap();
        blocks.write(b, b"abcd");
        assert_eq!(blocks.read(b, 2), b"ab");
        assert_eq!(blocks.read(b, 100), b"abcd");

        blocks.free(&mut sb, b);
        assert_eq!(blocks.read(b, 4), &[0, 0, 0, 0]);
    }
}
