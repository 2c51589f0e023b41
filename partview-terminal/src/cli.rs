use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

/// Browse STL parts as a tree and preview them in the terminal
#[derive(Parser, Debug, Clone)]
#[command(name = "partview", version, about)]
pub struct Cli {
    /// STL files to open as top-level parts
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    #[arg(
        short = 'c',
        long = "config",
        value_name = "PATH",
        help = "YAML config file. Default: partview.yaml in the working directory, if present."
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        help = "Log level written to stderr (off, error, warn, info, debug, trace). Overrides the config file."
    )]
    pub log_level: Option<LevelFilter>,

    #[arg(long = "snapshot", help = "Render one frame of the opened files to stdout and exit.")]
    pub snapshot: bool,

    #[arg(
        long = "width",
        value_name = "COLUMNS",
        default_value_t = 80,
        value_parser = clap::value_parser!(u16).range(1..),
        help = "Snapshot width in columns."
    )]
    pub width: u16,

    #[arg(
        long = "height",
        value_name = "ROWS",
        default_value_t = 24,
        value_parser = clap::value_parser!(u16).range(1..),
        help = "Snapshot height in rows."
    )]
    pub height: u16,
}
