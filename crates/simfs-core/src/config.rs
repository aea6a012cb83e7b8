use crate::error::{FsError, Result};

pub const DEFAULT_BLOCK_SIZE: usize = 256;
pub const DEFAULT_TOTAL_BLOCKS: usize = 64;
pub const DEFAULT_TOTAL_INODES: usize = 32;
pub const DEFAULT_MAX_BLOCKS_PER_FILE: usize = 8;
pub const DEFAULT_MAX_ENTRIES_PER_DIR: usize = 32;
pub const DEFAULT_MAX_NAME_LEN: usize = 32;

/// Sizes of the fixed tables. Nothing grows past these limits at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsConfig {
    pub block_size: usize,
    pub total_blocks: usize,
    pub total_inodes: usize,
    pub max_blocks_per_file: usize,
    /// Includes the `.` and `..` entries.
    pub max_entries_per_dir: usize,
    pub max_name_len: usize,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            total_blocks: DEFAULT_TOTAL_BLOCKS,
            total_inodes: DEFAULT_TOTAL_INODES,
            max_blocks_per_file: DEFAULT_MAX_BLOCKS_PER_FILE,
            max_entries_per_dir: DEFAULT_MAX_ENTRIES_PER_DIR,
            max_name_len: DEFAULT_MAX_NAME_LEN,
        }
    }
}

impl FsConfig {
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.block_size, 1, "block size"),
            (self.total_blocks, 1, "total blocks"),
            (self.total_inodes, 1, "total inodes"),
            (self.max_blocks_per_file, 1, "blocks per file"),
            (self.max_entries_per_dir, 2, "entries per directory"),
            (self.max_name_len, 1, "name length"),
        ];
        for (value, min, what) in checks {
            if value < min {
                return Err(FsError::InvalidConfig(format!(
                    "{} must be at least {}, got {}",
                    what, min, value
                )));
            }
        }
        let limit = u32::MAX as usize;
        if self.block_size > limit || self.total_blocks > limit || self.total_inodes > limit {
            return Err(FsError::InvalidConfig(
                "block size and table sizes must fit in 32 bits".into(),
            ));
        }
        if self.total_blocks.checked_mul(self.block_size).is_none() {
            return Err(FsError::InvalidConfig(format!(
                "{} blocks of {} bytes overflow the address space",
                self.total_blocks, self.block_size
            )));
        }
        if self.max_blocks_per_file.checked_mul(self.block_size).is_none() {
            return Err(FsError::InvalidConfig(format!(
                "{} blocks per file of {} bytes overflow the address space",
                self.max_blocks_per_file, self.block_size
            )));
        }
        Ok(())
    }

    /// Saturates for configs that `validate` would reject.
    pub fn max_file_size(&self) -> usize {
        self.block_size.saturating_mul(self.max_blocks_per_file)
    }

    /// Number of blocks needed to hold `len` bytes.
    pub fn blocks_for(&self, len: usize) -> usize {
        len.div_ceil(self.block_size)
    }
}
