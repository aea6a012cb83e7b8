//! Core of the simfs simulator: a fixed pool of inodes and data blocks
//! arranged into a directory tree, driven through path-based operations.

pub mod bitmap;
pub mod block;
pub mod check;
pub mod clock;
pub mod config;
pub mod directory;
pub mod error;
pub mod fs;
pub mod inode;
pub mod path;
pub mod superblock;
pub mod types;

pub use check::{CheckReport, Inconsistency};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::FsConfig;
pub use error::{FsError, Result};
pub use fs::{FileSystem, TreeEntry};
pub use inode::InodeMetadata;
pub use superblock::PoolStatus;
pub use types::{BlockId, DirEntry, FileType, InodeId};
