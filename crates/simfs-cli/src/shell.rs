use crate::parse::Command;
use crate::render;
use log::debug;
use simfs_core::{FileSystem, FsError};
use std::io::{self, Write};

pub const HELP: &str = "\
Available commands:
  touch <path> [content]  - Create a file (prompts for content if omitted)
  mkdir <path>            - Create a directory
  ls [path]               - List directory entries
  tree [path]             - Show the directory tree
  read <path>             - Print file contents
  detail <path> [--json]  - Show inode details
  rm <path>               - Remove a file
  rmdir <path>            - Remove a directory and everything below it
  cd [path]               - Change working directory
  pwd                     - Print working directory
  df [--json]             - Show superblock counters
  fsck                    - Check filesystem consistency
  help                    - Show this message
  exit                    - Quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Executes parsed commands against one filesystem, printing results.
pub struct Shell {
    fs: FileSystem,
}

impl Shell {
    pub fn new(fs: FileSystem) -> Self {
        Self { fs }
    }

    pub fn fs(&self) -> &FileSystem {
        &self.fs
    }

    /// Filesystem errors are reported on `out`; only I/O errors escape.
    pub fn execute(&mut self, command: Command, out: &mut dyn Write) -> io::Result<Flow> {
        debug!("Executing {:?}", command);
        match self.dispatch(command, out) {
            Ok(flow) => Ok(flow),
            Err(ShellError::Fs(e)) => {
                writeln!(out, "error: {}", e)?;
                Ok(Flow::Continue)
            }
            Err(ShellError::Io(e)) => Err(e),
        }
    }

    fn dispatch(&mut self, command: Command, out: &mut dyn Write) -> Result<Flow, ShellError> {
        match command {
            Command::Touch { path, content } => {
                let content = content.unwrap_or_default();
                self.fs.create_file(&path, content.as_bytes())?;
                writeln!(out, "Created file '{}'", path)?;
            }
            Command::Mkdir(path) => {
                self.fs.create_directory(&path)?;
                writeln!(out, "Created directory '{}'", path)?;
            }
            Command::Ls(path) => render::entries(out, &self.fs.list(&path)?)?,
            Command::Tree(path) => render::tree(out, &self.fs.tree(&path)?)?,
            Command::Read(path) => {
                let content = self.fs.read(&path)?;
                writeln!(out, "{}", String::from_utf8_lossy(&content))?;
            }
            Command::Detail { path, json } => {
                let meta = self.fs.describe(&path)?;
                if json {
                    writeln!(out, "{}", to_json(&meta)?)?;
                } else {
                    render::detail(out, &meta)?;
                }
            }
            Command::Rm(path) => {
                self.fs.remove_file(&path)?;
                writeln!(out, "Removed file '{}'", path)?;
            }
            Command::Rmdir(path) => {
                self.fs.remove_directory(&path)?;
                writeln!(out, "Removed directory '{}'", path)?;
            }
            Command::Cd(path) => self.fs.change_directory(&path)?,
            Command::Pwd => writeln!(out, "{}", self.fs.current_path())?,
            Command::Df { json } => {
                let status = self.fs.pool_status();
                if json {
                    writeln!(out, "{}", to_json(&status)?)?;
                } else {
                    render::status(out, &status)?;
                }
            }
            Command::Fsck => render::check(out, &self.fs.check())?,
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Exit => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }
}

#[derive(Debug, thiserror::Error)]
enum ShellError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

fn to_json<T: serde::Serialize>(value: &T) -> io::Result<String> {
    serde_json::to_string_pretty(value).map_err(io::Error::other)
}
