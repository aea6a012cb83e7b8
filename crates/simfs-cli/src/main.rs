mod parse;
mod render;
mod shell;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use parse::Command;
use shell::{Flow, Shell};
use simfs_core::{FileSystem, FsConfig};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    geometry: Geometry,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Sizes of the simulated tables
#[derive(Args)]
struct Geometry {
    /// Bytes per data block
    #[arg(long, default_value_t = simfs_core::config::DEFAULT_BLOCK_SIZE)]
    block_size: usize,

    /// Number of data blocks
    #[arg(long, default_value_t = simfs_core::config::DEFAULT_TOTAL_BLOCKS)]
    blocks: usize,

    /// Number of inodes
    #[arg(long, default_value_t = simfs_core::config::DEFAULT_TOTAL_INODES)]
    inodes: usize,

    /// Maximum data blocks per file
    #[arg(long, default_value_t = simfs_core::config::DEFAULT_MAX_BLOCKS_PER_FILE)]
    blocks_per_file: usize,

    /// Maximum entries per directory, `.` and `..` included
    #[arg(long, default_value_t = simfs_core::config::DEFAULT_MAX_ENTRIES_PER_DIR)]
    entries_per_dir: usize,

    /// Maximum length of a file or directory name
    #[arg(long, default_value_t = simfs_core::config::DEFAULT_MAX_NAME_LEN)]
    name_len: usize,
}

impl From<&Geometry> for FsConfig {
    fn from(g: &Geometry) -> Self {
        FsConfig {
            block_size: g.block_size,
            total_blocks: g.blocks,
            total_inodes: g.inodes,
            max_blocks_per_file: g.blocks_per_file,
            max_entries_per_dir: g.entries_per_dir,
            max_name_len: g.name_len,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session (the default)
    Shell,
    /// Execute the commands in a script file, one per line
    Run {
        /// Path to the script
        script: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let fs = FileSystem::new(FsConfig::from(&cli.geometry)).context("Failed to format filesystem")?;
    let mut shell = Shell::new(fs);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => {
            let stdin = io::stdin();
            interactive(&mut shell, &mut stdin.lock(), &mut out)?;
        }
        Commands::Run { script } => {
            let text = std::fs::read_to_string(&script)
                .with_context(|| format!("Failed to read script {}", script.display()))?;
            info!("Running script {}", script.display());
            batch(&mut shell, &text, &mut out)?;
        }
    }

    Ok(())
}

fn interactive(shell: &mut Shell, input: &mut dyn BufRead, out: &mut dyn Write) -> Result<()> {
    let mut line = String::new();
    loop {
        write!(out, "fs> ")?;
        out.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let command = match Command::parse(&line) {
            Ok(Some(Command::Touch {
                path,
                content: None,
            })) => Command::Touch {
                content: Some(read_content(input, out)?),
                path,
            },
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                writeln!(out, "{}", e)?;
                continue;
            }
        };
        if shell.execute(command, out)? == Flow::Exit {
            break;
        }
    }
    Ok(())
}

/// Reads lines up to the first empty one.
fn read_content(input: &mut dyn BufRead, out: &mut dyn Write) -> Result<String> {
    writeln!(out, "Enter content (end with empty line):")?;
    out.flush()?;
    let mut lines = Vec::new();
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let text = line.trim_end_matches(['\r', '\n']);
        if text.is_empty() {
            break;
        }
        lines.push(text.to_string());
    }
    Ok(lines.join("\n"))
}

fn batch(shell: &mut Shell, script: &str, out: &mut dyn Write) -> Result<()> {
    for (number, line) in script.lines().enumerate() {
        let command = match Command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                writeln!(out, "line {}: {}", number + 1, e)?;
                continue;
            }
        };
        writeln!(out, "fs> {}", line.trim())?;
        if shell.execute(command, out)? == Flow::Exit {
            break;
        }
    }
    Ok(())
}
