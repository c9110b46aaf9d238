//! Command-line argument parsing for the berth console
//!
//! Uses clap for argument parsing with derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// berth - live shell, telemetry and file workspace for a container host
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Container host base URL (overrides `server.url` from config)
    ///
    /// Example: http://127.0.0.1:8000 or https://ops.example.com
    #[arg(long, env = "BERTH_URL", global = true)]
    pub url: Option<String>,

    /// Read configuration from this file instead of the default location
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Open an interactive shell in a container
    ///
    /// Press the detach key (Ctrl-] by default) to leave.
    Shell {
        /// Container id
        container: String,
    },

    /// Stream resource usage of a container
    Stats {
        /// Container id
        container: String,

        /// Stop after this many samples
        #[arg(long, short = 'n')]
        count: Option<usize>,
    },

    /// Browse and edit the files of a project
    Files {
        /// Project id
        project: u64,

        #[command(subcommand)]
        action: FilesAction,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum FilesAction {
    /// Print the project tree
    Tree {
        /// Only show this directory, fetched on its own
        #[arg(long)]
        dir: Option<String>,
    },

    /// Print a file
    Cat { path: String },

    /// Create a file
    Create {
        path: String,

        /// Initial content
        #[arg(long, default_value = "")]
        content: String,
    },

    /// Create a directory
    Mkdir { path: String },

    /// Rename an entry within its directory
    Rename { path: String, new_name: String },

    /// Delete a file or directory
    Rm {
        path: String,

        /// Don't ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Upload local files into a directory
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Destination directory (project root if omitted)
        #[arg(long, short = 't')]
        target: Option<String>,
    },

    /// Replace a file's content with a local file or stdin
    Save {
        path: String,

        /// Read the new content from this file instead of stdin
        #[arg(long)]
        from: Option<PathBuf>,
    },
}

impl Args {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Whether the command takes over the terminal
    pub fn is_interactive(&self) -> bool {
        matches!(self.command, Command::Shell { .. })
    }
}
