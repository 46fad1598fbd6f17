use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use simio_core::{IoConfig, IoState, LoggerConfig, SharedBuffer, SystemIo};

mod script;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a YAML list of guest syscalls against the console.
    Run {
        script: PathBuf,
        /// TOML file with I/O settings.
        #[clap(short, long)]
        config: Option<PathBuf>,
        /// Feed standard input from this file instead of the terminal.
        #[clap(long)]
        stdin_file: Option<PathBuf>,
    },
}

fn init_logger(config: &LoggerConfig) {
    env_logger::Builder::new()
        .filter_level(config.level_filter)
        .filter_module("simio", config.app_level_filter)
        .filter_module("simio_core", config.app_level_filter)
        .parse_default_env()
        .init();
}

fn run(script_path: PathBuf, config: Option<PathBuf>, stdin_file: Option<PathBuf>) -> Result<()> {
    let config = match config {
        Some(path) => IoConfig::from_toml_file(path)?,
        None => IoConfig::default(),
    };
    init_logger(&config.logger_config.clone().unwrap_or_default());

    let ops = script::load(&script_path)?;
    log::info!("replaying {} ops from {}", ops.len(), script_path.display());

    let (state, captured) = match stdin_file {
        Some(path) => {
            let input = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            let (out, err) = (SharedBuffer::new(), SharedBuffer::new());
            (IoState::with_memory_streams(input, out.clone(), err.clone()), Some((out, err)))
        }
        None => (IoState::new(), None),
    };
    let mut io = SystemIo::from_config(config).with_state(state);

    for (i, op) in ops.iter().enumerate() {
        let outcome = script::execute(&mut io, op);
        log::debug!("op {} finished: {}", i, outcome);
        eprintln!("[{}] {:?} => {}", i, op, outcome);
    }
    io.reset_files();

    if let Some((out, err)) = captured {
        std::io::stdout().write_all(&out.contents())?;
        std::io::stderr().write_all(&err.contents())?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    match args.command {
        Command::Run { script, config, stdin_file } => run(script, config, stdin_file),
    }
}
