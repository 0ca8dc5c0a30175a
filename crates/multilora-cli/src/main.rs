//! MultiLoRA CLI - Stacked LoRA collection and merging
//!
//! Lists adapter files, prints node schemas, and runs the descriptor and
//! merge entry points against safetensors files.

use clap::{Parser, Subcommand};
use multilora_lora::LoraRegistry;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;

use commands::SlotArgs;

/// MultiLoRA - apply up to four LoRA adapters with per-slot strength and block scope
#[derive(Parser)]
#[command(name = "multilora")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// LoRA search directory (repeatable, replaces the defaults)
    #[arg(long = "loras-dir", global = true, env = "MULTILORA_LORAS_DIR")]
    loras_dirs: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List search paths and available LoRA files
    List,

    /// Print the node input schemas as JSON
    Schema,

    /// Print the descriptor list for the configured slots as JSON
    Collect {
        #[command(flatten)]
        slots: SlotArgs,
    },

    /// Merge the configured slots into a safetensors model
    Apply {
        /// Base model weights (safetensors)
        #[arg(short, long)]
        model: PathBuf,

        /// Where to write the merged weights
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        slots: SlotArgs,
    },

    /// Print the re-execution fingerprint of the configured slots
    Fingerprint {
        #[command(flatten)]
        slots: SlotArgs,
    },

    /// Show the keys of a LoRA file per block scope
    Inspect {
        /// Registry name or path of the LoRA file
        file: String,

        /// Number of sample keys to show per scope
        #[arg(short, long, default_value = "5")]
        samples: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let registry = if cli.loras_dirs.is_empty() {
        LoraRegistry::new()
    } else {
        LoraRegistry::with_search_paths(cli.loras_dirs)
    };

    match cli.command {
        Commands::List => commands::list::run(&registry),
        Commands::Schema => commands::schema::run(&registry)?,
        Commands::Collect { slots } => commands::collect::run(&registry, &slots.load()?)?,
        Commands::Apply {
            model,
            output,
            slots,
        } => commands::apply::run(&registry, &model, &output, &slots.load()?)?,
        Commands::Fingerprint { slots } => commands::fingerprint::run(&slots.load()?),
        Commands::Inspect { file, samples } => commands::inspect::run(&registry, &file, samples)?,
    }

    Ok(())
}
