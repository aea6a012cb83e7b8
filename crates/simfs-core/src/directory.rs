use crate::error::{FsError, Result};
use crate::types::{DirEntry, InodeId};
use log::debug;

/// Number of reserved entries (`.` and `..`) at the head of every directory.
pub const RESERVED_ENTRIES: usize = 2;

/// Ordered entry list of one directory inode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    entries: Vec<DirEntry>,
}

impl Directory {
    fn new(owner: InodeId, parent: InodeId) -> Self {
        Self {
            entries: vec![DirEntry::new(".", owner), DirEntry::new("..", parent)],
        }
    }

    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    /// Entries after `.` and `..`.
    pub fn children(&self) -> &[DirEntry] {
        &self.entries[RESERVED_ENTRIES..]
    }

    pub fn parent(&self) -> InodeId {
        self.entries[1].inode
    }

    /// No entries besides `.` and `..`.
    pub fn is_empty(&self) -> bool {
        self.entries.len() == RESERVED_ENTRIES
    }
}

/// Naming layer: one entry list per directory inode, indexed by inode number.
pub struct DirectoryTree {
    dirs: Vec<Option<Directory>>,
    max_entries: usize,
}

impl DirectoryTree {
    pub fn new(total_inodes: usize, max_entries: usize) -> Self {
        Self {
            dirs: vec![None; total_inodes],
            max_entries,
        }
    }

    /// Installs the entry list of a freshly allocated directory inode.
    pub fn create(&mut self, owner: InodeId, parent: InodeId) {
        debug!("Seeding directory {} (parent {})", owner, parent);
        self.dirs[owner.index()] = Some(Directory::new(owner, parent));
    }

    /// Drops the whole entry list of `owner`, reserved entries included.
    pub fn remove(&mut self, owner: InodeId) -> Option<Directory> {
        self.dirs.get_mut(owner.index()).and_then(Option::take)
    }

    pub fn get(&self, dir: InodeId) -> Option<&Directory> {
        self.dirs.get(dir.index()).and_then(Option::as_ref)
    }

    pub fn is_dir(&self, dir: InodeId) -> bool {
        self.get(dir).is_some()
    }

    /// Whether `dir` can take another entry named `name`.
    pub fn check_insert(&self, dir: InodeId, name: &str) -> Result<()> {
        let directory = self
            .get(dir)
            .ok_or_else(|| FsError::NotADirectory(dir.to_string()))?;
        if directory.entries.iter().any(|e| e.name == name) {
            return Err(FsError::NameConflict(name.to_string()));
        }
        if directory.entries.len() >= self.max_entries {
            return Err(FsError::DirectoryFull(dir.to_string()));
        }
        Ok(())
    }

    pub fn add_entry(&mut self, dir: InodeId, name: &str, target: InodeId) -> Result<()> {
        self.check_insert(dir, name)?;
        if let Some(directory) = self.dirs[dir.index()].as_mut() {
            directory.entries.push(DirEntry::new(name, target));
            debug!("Linked '{}' -> inode {} in directory {}", name, target, dir);
        }
        Ok(())
    }

    /// Removes the first non-reserved entry pointing at `target`, keeping the
    /// order of the remaining entries.
    pub fn remove_entry(&mut self, dir: InodeId, target: InodeId) -> Result<DirEntry> {
        let directory = self
            .dirs
            .get_mut(dir.index())
            .and_then(Option::as_mut)
            .ok_or_else(|| FsError::NotADirectory(dir.to_string()))?;
        let position = directory.entries[RESERVED_ENTRIES..]
            .iter()
            .position(|e| e.inode == target)
            .ok_or_else(|| FsError::NotFound(target.to_string()))?;
        let entry = directory.entries.remove(RESERVED_ENTRIES + position);
        debug!("Unlinked '{}' from directory {}", entry.name, dir);
        Ok(entry)
    }

    pub fn lookup(&self, dir: InodeId, name: &str) -> Option<InodeId> {
        self.get(dir)?
            .entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.inode)
    }

    /// Name under which `dir` lists `target`, ignoring `.` and `..`.
    pub fn name_of(&self, dir: InodeId, target: InodeId) -> Option<&str> {
        self.get(dir)?
            .children()
            .iter()
            .find(|e| e.inode == target)
            .map(|e| e.name.as_str())
    }

    pub fn list_entries(&self, dir: InodeId) -> Option<&[DirEntry]> {
        self.get(dir).map(Directory::entries)
    }

    /// Every installed directory with its owning inode number.
    pub fn iter(&self) -> impl Iterator<Item = (InodeId, &Directory)> {
        self.dirs
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.as_ref().map(|d| (InodeId::new(i as u32), d)))
    }
}
