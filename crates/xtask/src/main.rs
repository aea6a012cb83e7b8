use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::Path;
use xshell::{cmd, Shell};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "simfs development tasks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the whole test suite
    Test,
    /// Check formatting and run clippy with warnings denied
    Lint,
    /// Run the demo script through the simfs shell
    Demo {
        /// Script to run instead of scripts/demo.simfs
        #[arg(long)]
        script: Option<String>,
    },
    /// Lint, then test
    Ci,
    /// Clean build artifacts
    Clean,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;

    // Ensure we are in the project root
    let project_root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .ok_or_else(|| anyhow::anyhow!("xtask must live in crates/xtask"))?;
    sh.change_dir(project_root);

    match cli.command {
        Commands::Test => test(&sh)?,
        Commands::Lint => lint(&sh)?,
        Commands::Demo { script } => {
            let script = script.unwrap_or_else(|| "scripts/demo.simfs".to_string());
            if !sh.path_exists(&script) {
                return Err(anyhow::anyhow!("script not found: {}", script));
            }
            cmd!(sh, "cargo run -p simfs-cli -- run {script}").run()?;
        }
        Commands::Ci => {
            lint(&sh)?;
            test(&sh)?;
        }
        Commands::Clean => {
            cmd!(sh, "cargo clean").run()?;
        }
    }

    Ok(())
}

fn test(sh: &Shell) -> Result<()> {
    cmd!(sh, "cargo test --workspace").run()?;
    Ok(())
}

fn lint(sh: &Shell) -> Result<()> {
    cmd!(sh, "cargo fmt --all -- --check").run()?;
    cmd!(sh, "cargo clippy --workspace --all-targets -- -D warnings").run()?;
    Ok(())
}
