use crate::block::BlockPool;
use crate::clock::{Clock, SystemClock};
use crate::config::FsConfig;
use crate::directory::{Directory, DirectoryTree};
use crate::error::{FsError, Result};
use crate::inode::{Inode, InodeMetadata, InodeTable};
use crate::path::{split_parent_and_leaf, PathResolver};
use crate::superblock::{PoolStatus, SuperBlock};
use crate::types::{DirEntry, FileType, InodeId};
use log::{debug, info, warn};

/// Implicit base for relative paths.
struct WorkingDirectory {
    inode: InodeId,
    path: String,
}

/// One node of a [`FileSystem::tree`] walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// 0 for direct children of the walked directory.
    pub depth: usize,
    pub name: String,
    pub inode: InodeId,
    pub kind: FileType,
}

/// The whole simulated filesystem.
///
/// Holds the superblock, the inode table, the block pool, the directory tree
/// and the working directory. Every operation runs to completion against
/// `&mut self`; a failed operation leaves all of them as they were.
pub struct FileSystem {
    pub(crate) config: FsConfig,
    pub(crate) superblock: SuperBlock,
    pub(crate) inodes: InodeTable,
    pub(crate) blocks: BlockPool,
    pub(crate) tree: DirectoryTree,
    cwd: WorkingDirectory,
    clock: Box<dyn Clock>,
}

impl FileSystem {
    pub fn new(config: FsConfig) -> Result<Self> {
        Self::with_clock(config, Box::new(SystemClock))
    }

    /// Formats an empty filesystem whose only inode is the root directory.
    pub fn with_clock(config: FsConfig, clock: Box<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let mut superblock = SuperBlock::new(&config);
        let mut inodes = InodeTable::new(config.total_inodes);
        let blocks = BlockPool::new(config.total_blocks, config.block_size);
        let mut tree = DirectoryTree::new(config.total_inodes, config.max_entries_per_dir);

        let root = inodes.allocate(&mut superblock, FileType::Directory, clock.now())?;
        tree.create(root, root);
        superblock.root_inode = root;

        info!(
            "Initialised filesystem: {} blocks of {} bytes, {} inodes, root inode {}",
            config.total_blocks, config.block_size, config.total_inodes, root
        );

        Ok(Self {
            config,
            superblock,
            inodes,
            blocks,
            tree,
            cwd: WorkingDirectory {
                inode: root,
                path: "/".to_string(),
            },
            clock,
        })
    }

    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    pub fn root(&self) -> InodeId {
        self.superblock.root_inode
    }

    pub fn pool_status(&self) -> PoolStatus {
        self.superblock.status()
    }

    pub fn current_path(&self) -> &str {
        &self.cwd.path
    }

    pub fn current_dir(&self) -> InodeId {
        self.cwd.inode
    }

    /// Creates a file at `path` holding `content`.
    ///
    /// All capacity checks happen before anything is allocated; if a later
    /// step still fails, the inode and every block claimed for it are
    /// released again.
    pub fn create_file(&mut self, path: &str, content: &[u8]) -> Result<InodeId> {
        let (parent, leaf) = self.prepare_link(path)?;

        let limit = self.config.max_file_size();
        if content.len() > limit {
            return Err(FsError::FileTooLarge {
                size: content.len(),
                limit,
            });
        }
        if self.superblock.free_inodes == 0 {
            return Err(FsError::InodesExhausted);
        }
        let needed = self.config.blocks_for(content.len());
        if needed > self.superblock.free_blocks as usize {
            warn!(
                "Refusing to create {}: needs {} blocks, {} free",
                path, needed, self.superblock.free_blocks
            );
            return Err(FsError::NoSpace);
        }

        let id = self
            .inodes
            .allocate(&mut self.superblock, FileType::File, self.clock.now())?;

        let linked = self
            .write_content(id, content)
            .and_then(|()| self.tree.add_entry(parent, leaf, id));
        if let Err(e) = linked {
            warn!("Rolling back creation of {}: {}", path, e);
            self.release_file(id);
            return Err(e);
        }

        info!("Created file {} (inode {}, {} bytes)", path, id, content.len());
        Ok(id)
    }

    pub fn create_directory(&mut self, path: &str) -> Result<InodeId> {
        let (parent, leaf) = self.prepare_link(path)?;

        let id = self
            .inodes
            .allocate(&mut self.superblock, FileType::Directory, self.clock.now())?;
        // `.` and `..` exist before the directory becomes reachable.
        self.tree.create(id, parent);

        if let Err(e) = self.tree.add_entry(parent, leaf, id) {
            warn!("Rolling back creation of {}: {}", path, e);
            self.tree.remove(id);
            self.inodes.free(&mut self.superblock, id);
            return Err(e);
        }

        info!("Created directory {} (inode {})", path, id);
        Ok(id)
    }

    pub fn remove_file(&mut self, path: &str) -> Result<()> {
        let id = self.resolve(path)?;
        if !self.inodes.get(id)?.is_file() {
            return Err(FsError::NotAFile(path.to_string()));
        }
        let split = split_parent_and_leaf(path);
        let parent = self
            .resolver()
            .resolve(split.parent, self.cwd.inode)
            .ok_or_else(|| FsError::InvalidPath(path.to_string()))?;

        self.release_file(id);
        self.tree.remove_entry(parent, id)?;

        info!("Removed file {} (inode {})", path, id);
        Ok(())
    }

    /// Removes the directory at `path` together with everything below it.
    pub fn remove_directory(&mut self, path: &str) -> Result<()> {
        let target = self.resolve_dir(path)?;
        if target == self.root() {
            return Err(FsError::RootProtected);
        }
        let cwd_inside = self.is_within(self.cwd.inode, target);

        // Depth-first over an explicit stack: a directory is torn down once
        // its last child is gone. Children are taken in stored order.
        let mut stack = vec![target];
        while let Some(&dir) = stack.last() {
            let next = self
                .tree
                .get(dir)
                .and_then(|d| d.children().first())
                .map(|e| e.inode);
            match next {
                Some(child) => {
                    if self.inodes.get(child)?.is_dir() {
                        stack.push(child);
                    } else {
                        self.release_file(child);
                        self.tree.remove_entry(dir, child)?;
                    }
                }
                None => {
                    stack.pop();
                    let directory = self
                        .tree
                        .remove(dir)
                        .ok_or_else(|| FsError::NotADirectory(dir.to_string()))?;
                    self.inodes.free(&mut self.superblock, dir);
                    self.tree.remove_entry(directory.parent(), dir)?;
                    debug!("Removed directory inode {}", dir);
                }
            }
        }

        if cwd_inside {
            warn!("Working directory was inside {}; moving to /", path);
            self.cwd = WorkingDirectory {
                inode: self.root(),
                path: "/".to_string(),
            };
        }

        info!("Removed directory {} (inode {})", path, target);
        Ok(())
    }

    pub fn read(&self, path: &str) -> Result<Vec<u8>> {
        let inode = self.file_inode(path)?;
        let block_size = self.config.block_size;

        let mut content = Vec::with_capacity(inode.size);
        for (i, &block) in inode.blocks.iter().enumerate() {
            let valid = inode.size.saturating_sub(i * block_size);
            content.extend_from_slice(self.blocks.read(block, valid));
        }
        Ok(content)
    }

    /// Entries of the directory at `path` in stored order, `.` and `..` first.
    pub fn list(&self, path: &str) -> Result<Vec<DirEntry>> {
        let dir = self.resolve_dir(path)?;
        self.tree
            .list_entries(dir)
            .map(<[DirEntry]>::to_vec)
            .ok_or_else(|| FsError::NotADirectory(path.to_string()))
    }

    /// Pre-order walk of everything below the directory at `path`.
    pub fn tree(&self, path: &str) -> Result<Vec<TreeEntry>> {
        let dir = self.resolve_dir(path)?;

        let mut walk = Vec::new();
        let mut stack: Vec<(DirEntry, usize)> = Vec::new();
        self.push_children(&mut stack, dir, 0);
        while let Some((entry, depth)) = stack.pop() {
            let kind = self.inodes.get(entry.inode)?.file_type;
            if kind == FileType::Directory {
                self.push_children(&mut stack, entry.inode, depth + 1);
            }
            walk.push(TreeEntry {
                depth,
                name: entry.name,
                inode: entry.inode,
                kind,
            });
        }
        Ok(walk)
    }

    pub fn change_directory(&mut self, path: &str) -> Result<()> {
        let dir = self.resolve_dir(path)?;
        let canonical = self.path_of(dir)?;
        debug!("cd {} -> {} (inode {})", path, canonical, dir);
        self.cwd = WorkingDirectory {
            inode: dir,
            path: canonical,
        };
        Ok(())
    }

    pub fn describe(&self, path: &str) -> Result<InodeMetadata> {
        let id = self.resolve(path)?;
        Ok(self.inodes.get(id)?.metadata())
    }

    /// Absolute path of a directory, rebuilt by following `..` up to the root.
    pub fn path_of(&self, dir: InodeId) -> Result<String> {
        let root = self.root();
        let mut names = Vec::new();
        let mut current = dir;
        while current != root {
            // A well-formed tree reaches the root in fewer hops than inodes.
            if names.len() >= self.config.total_inodes {
                return Err(FsError::InodeNotFound(dir));
            }
            let parent = self
                .tree
                .get(current)
                .map(Directory::parent)
                .ok_or(FsError::InodeNotFound(current))?;
            let name = self
                .tree
                .name_of(parent, current)
                .ok_or(FsError::InodeNotFound(current))?;
            names.push(name);
            current = parent;
        }

        if names.is_empty() {
            return Ok("/".to_string());
        }
        Ok(names.iter().rev().fold(String::new(), |mut path, name| {
            path.push('/');
            path.push_str(name);
            path
        }))
    }

    fn resolver(&self) -> PathResolver<'_> {
        PathResolver::new(&self.tree, self.root())
    }

    fn resolve(&self, path: &str) -> Result<InodeId> {
        self.resolver()
            .resolve(path, self.cwd.inode)
            .ok_or_else(|| FsError::NotFound(path.to_string()))
    }

    fn resolve_dir(&self, path: &str) -> Result<InodeId> {
        let id = self.resolve(path)?;
        if !self.inodes.get(id)?.is_dir() {
            return Err(FsError::NotADirectory(path.to_string()));
        }
        Ok(id)
    }

    fn file_inode(&self, path: &str) -> Result<&Inode> {
        let inode = self.inodes.get(self.resolve(path)?)?;
        if !inode.is_file() {
            return Err(FsError::NotAFile(path.to_string()));
        }
        Ok(inode)
    }

    /// Finds the directory a new entry for `path` goes into and checks that
    /// the leaf name is acceptable there.
    fn prepare_link<'p>(&self, path: &'p str) -> Result<(InodeId, &'p str)> {
        let split = split_parent_and_leaf(path);
        let leaf = split.leaf;
        if leaf.is_empty() || leaf == "." || leaf == ".." || leaf.len() > self.config.max_name_len
        {
            return Err(FsError::InvalidPath(path.to_string()));
        }

        let parent = self
            .resolver()
            .resolve(split.parent, self.cwd.inode)
            .filter(|&id| self.tree.is_dir(id))
            .ok_or_else(|| FsError::InvalidPath(path.to_string()))?;

        self.tree.check_insert(parent, leaf).map_err(|e| match e {
            FsError::DirectoryFull(_) if split.parent.is_empty() => {
                FsError::DirectoryFull(self.cwd.path.clone())
            }
            FsError::DirectoryFull(_) => FsError::DirectoryFull(split.parent.to_string()),
            other => other,
        })?;
        Ok((parent, leaf))
    }

    fn write_content(&mut self, id: InodeId, content: &[u8]) -> Result<()> {
        for chunk in content.chunks(self.config.block_size) {
            let block = self.blocks.allocate(&mut self.superblock)?;
            self.blocks.write(block, chunk);
            let inode = self.inodes.get_mut(id)?;
            inode.blocks.push(block);
            inode.size += chunk.len();
        }
        let now = self.clock.now();
        self.inodes.get_mut(id)?.modified = now;
        Ok(())
    }

    /// Frees a file inode and every block it owns, blocks first.
    fn release_file(&mut self, id: InodeId) {
        let blocks = match self.inodes.get_mut(id) {
            Ok(inode) => std::mem::take(&mut inode.blocks),
            Err(_) => return,
        };
        for block in blocks {
            self.blocks.free(&mut self.superblock, block);
        }
        self.inodes.free(&mut self.superblock, id);
    }

    fn push_children(&self, stack: &mut Vec<(DirEntry, usize)>, dir: InodeId, depth: usize) {
        if let Some(directory) = self.tree.get(dir) {
            // Reversed so the first child is popped first.
            stack.extend(directory.children().iter().rev().map(|e| (e.clone(), depth)));
        }
    }

    /// Whether `dir` is `ancestor` or lies somewhere below it.
    fn is_within(&self, dir: InodeId, ancestor: InodeId) -> bool {
        let root = self.root();
        let mut current = dir;
        for _ in 0..self.config.total_inodes {
            if current == ancestor {
                return true;
            }
            if current == root {
                return false;
            }
            match self.tree.get(current) {
                Some(d) => current = d.parent(),
                None => return false,
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn fs() -> FileSystem {
        FileSystem::new(FsConfig::default()).unwrap()
    }

    fn names(fs: &FileSystem, path: &str) -> Vec<String> {
        fs.list(path).unwrap().into_iter().map(|e| e.name).collect()
    }

    #[test]
    fn fresh_filesystem_has_only_root() {
        let fs = fs();
        let status = fs.pool_status();
        assert_eq!(status.free_inodes, 31);
        assert_eq!(status.free_blocks, 64);
        assert_eq!(status.root_inode, InodeId::new(0));
        assert_eq!(names(&fs, "/"), vec![".", ".."]);
        assert_eq!(fs.current_path(), "/");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = FsConfig {
            total_inodes: 0,
            ..FsConfig::default()
        };
        assert!(matches!(
            FileSystem::new(config),
            Err(FsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn oversized_geometry_is_rejected_before_allocating() {
        let config = FsConfig {
            block_size: usize::MAX / 2 + 1,
            total_blocks: 2,
            ..FsConfig::default()
        };
        assert!(matches!(
            FileSystem::new(config),
            Err(FsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn file_spanning_blocks_reads_back() {
        let mut fs = fs();
        let content: Vec<u8> = (0..600u32).map(|i| (i % 251) as u8).collect();
        fs.create_file("/big.bin", &content).unwrap();
        assert_eq!(fs.read("/big.bin").unwrap(), content);

        let meta = fs.describe("/big.bin").unwrap();
        assert_eq!(meta.size, 600);
        assert_eq!(meta.block_count(), 3);
        assert_eq!(fs.pool_status().free_blocks, 61);
    }

    #[test]
    fn empty_file_owns_no_blocks() {
        let mut fs = fs();
        fs.create_file("empty", b"").unwrap();
        assert_eq!(fs.read("empty").unwrap(), b"");
        assert_eq!(fs.describe("empty").unwrap().block_count(), 0);
        assert_eq!(fs.pool_status().free_blocks, 64);
    }

    #[test]
    fn timestamps_come_from_clock() {
        let clock = ManualClock::new(1_000);
        let mut fs = FileSystem::with_clock(FsConfig::default(), Box::new(clock.clone())).unwrap();
        clock.advance(10);
        fs.create_file("/t", b"x").unwrap();
        let meta = fs.describe("/t").unwrap();
        assert_eq!(meta.created, 1_010);
        assert_eq!(meta.modified, 1_010);
        assert_eq!(fs.describe("/").unwrap().created, 1_000);
    }

    #[test]
    fn oversized_file_is_rejected_untouched() {
        let mut fs = fs();
        let content = vec![1u8; fs.config().max_file_size() + 1];
        assert!(matches!(
            fs.create_file("/huge", &content),
            Err(FsError::FileTooLarge { .. })
        ));
        assert_eq!(fs.pool_status(), fs_status_fresh());
        assert_eq!(names(&fs, "/"), vec![".", ".."]);
    }

    fn fs_status_fresh() -> PoolStatus {
        fs().pool_status()
    }

    #[test]
    fn bad_leaf_names_are_invalid_paths() {
        let mut fs = fs();
        for path in ["/", "", ".", "..", "/a/..", "missing/x"] {
            assert_eq!(
                fs.create_directory(path),
                Err(FsError::InvalidPath(path.to_string())),
                "{path}"
            );
        }
        let long = "n".repeat(33);
        assert!(matches!(
            fs.create_file(&long, b""),
            Err(FsError::InvalidPath(_))
        ));
        fs.create_file(&"n".repeat(32), b"").unwrap();
    }

    #[test]
    fn parent_must_be_directory() {
        let mut fs = fs();
        fs.create_file("/f", b"data").unwrap();
        assert_eq!(
            fs.create_file("/f/g", b""),
            Err(FsError::InvalidPath("/f/g".into()))
        );
    }

    #[test]
    fn full_directory_reports_parent_path() {
        let config = FsConfig {
            max_entries_per_dir: 3,
            ..FsConfig::default()
        };
        let mut fs = FileSystem::new(config).unwrap();
        fs.create_directory("/d").unwrap();
        fs.create_file("/d/one", b"").unwrap();
        assert_eq!(
            fs.create_file("/d/two", b"1"),
            Err(FsError::DirectoryFull("/d".into()))
        );
        fs.change_directory("/d").unwrap();
        assert_eq!(
            fs.create_directory("three"),
            Err(FsError::DirectoryFull("/d".into()))
        );
        assert!(fs.check().is_clean());
    }

    #[test]
    fn remove_file_frees_everything() {
        let mut fs = fs();
        let before = fs.pool_status();
        fs.create_directory("/a").unwrap();
        fs.create_file("/a/f", &[7u8; 300]).unwrap();
        fs.remove_file("/a/f").unwrap();
        fs.remove_directory("/a").unwrap();
        assert_eq!(fs.pool_status(), before);
    }

    #[test]
    fn remove_checks_kind() {
        let mut fs = fs();
        fs.create_directory("/d").unwrap();
        fs.create_file("/f", b"x").unwrap();
        assert_eq!(fs.remove_file("/d"), Err(FsError::NotAFile("/d".into())));
        assert_eq!(
            fs.remove_directory("/f"),
            Err(FsError::NotADirectory("/f".into()))
        );
        assert_eq!(fs.remove_file("/nope"), Err(FsError::NotFound("/nope".into())));
        assert_eq!(fs.read("/d"), Err(FsError::NotAFile("/d".into())));
        assert_eq!(fs.list("/f"), Err(FsError::NotADirectory("/f".into())));
    }

    #[test]
    fn root_cannot_be_removed() {
        let mut fs = fs();
        fs.create_directory("/a").unwrap();
        assert_eq!(fs.remove_directory("/"), Err(FsError::RootProtected));
        assert_eq!(fs.remove_directory("/a/.."), Err(FsError::RootProtected));
        assert_eq!(fs.remove_directory("."), Err(FsError::RootProtected));
    }

    #[test]
    fn remove_directory_through_dot_uses_true_parent() {
        let mut fs = fs();
        fs.create_directory("/a").unwrap();
        fs.create_directory("/a/b").unwrap();
        fs.remove_directory("/a/b/.").unwrap();
        assert_eq!(names(&fs, "/a"), vec![".", ".."]);
        assert!(fs.check().is_clean());
    }

    #[test]
    fn remove_preserves_sibling_order() {
        let mut fs = fs();
        for name in ["a", "b", "c", "d"] {
            fs.create_file(name, name.as_bytes()).unwrap();
        }
        fs.remove_file("b").unwrap();
        assert_eq!(names(&fs, "."), vec![".", "..", "a", "c", "d"]);
        fs.create_file("e", b"").unwrap();
        assert_eq!(names(&fs, "."), vec![".", "..", "a", "c", "d", "e"]);
    }

    #[test]
    fn change_directory_canonicalises_path() {
        let mut fs = fs();
        fs.create_directory("/a").unwrap();
        fs.create_directory("/a/b").unwrap();

        fs.change_directory("a/../a/./b/").unwrap();
        assert_eq!(fs.current_path(), "/a/b");
        fs.change_directory("..").unwrap();
        assert_eq!(fs.current_path(), "/a");
        fs.change_directory("../..").unwrap();
        assert_eq!(fs.current_path(), "/");
        fs.change_directory("//a//b").unwrap();
        assert_eq!(fs.current_path(), "/a/b");
        fs.change_directory("/").unwrap();
        assert_eq!(fs.current_path(), "/");
    }

    #[test]
    fn change_directory_failures_keep_cwd() {
        let mut fs = fs();
        fs.create_directory("/a").unwrap();
        fs.create_file("/a/f", b"").unwrap();
        fs.change_directory("/a").unwrap();
        assert_eq!(fs.change_directory("f"), Err(FsError::NotADirectory("f".into())));
        assert_eq!(fs.change_directory("zz"), Err(FsError::NotFound("zz".into())));
        assert_eq!(fs.current_path(), "/a");
    }

    #[test]
    fn removing_cwd_ancestor_moves_to_root() {
        let mut fs = fs();
        fs.create_directory("/a").unwrap();
        fs.create_directory("/a/b").unwrap();
        fs.change_directory("/a/b").unwrap();
        fs.remove_directory("/a").unwrap();
        assert_eq!(fs.current_path(), "/");
        assert_eq!(fs.current_dir(), fs.root());
        assert_eq!(names(&fs, "."), vec![".", ".."]);
    }

    #[test]
    fn tree_walks_in_stored_order() {
        let mut fs = fs();
        fs.create_directory("/a").unwrap();
        fs.create_file("/a/x", b"1").unwrap();
        fs.create_directory("/a/b").unwrap();
        fs.create_file("/a/b/y", b"2").unwrap();
        fs.create_file("/z", b"3").unwrap();

        let walk: Vec<(usize, String)> = fs
            .tree("/")
            .unwrap()
            .into_iter()
            .map(|e| (e.depth, e.name))
            .collect();
        assert_eq!(
            walk,
            vec![
                (0, "a".to_string()),
                (1, "x".to_string()),
                (1, "b".to_string()),
                (2, "y".to_string()),
                (0, "z".to_string()),
            ]
        );
        assert_eq!(fs.tree("/z"), Err(FsError::NotADirectory("/z".into())));
    }

    #[test]
    fn describe_directory() {
        let mut fs = fs();
        let id = fs.create_directory("/d").unwrap();
        let meta = fs.describe("/d").unwrap();
        assert_eq!(meta.inode, id);
        assert_eq!(meta.kind, FileType::Directory);
        assert_eq!(meta.size, 0);
        assert!(meta.blocks.is_empty());
    }
}
