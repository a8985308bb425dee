//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Multi-page application engine CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name (default: mpa.toml)
    #[arg(short = 'C', long, default_value = "mpa.toml")]
    pub config: PathBuf,

    /// Pages directory (relative to project root)
    #[arg(long)]
    pub pages: Option<PathBuf>,

    /// Entry file name marking a page; repeat or comma-separate for several
    #[arg(short, long, value_delimiter = ',')]
    pub entry: Vec<String>,

    /// Default html template (relative to project root)
    #[arg(short, long)]
    pub template: Option<PathBuf>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve pages in development mode, rediscovering them on change
    Serve {
        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// The port you should provide
        #[arg(short, long)]
        port: Option<u16>,

        /// enable watch
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        watch: Option<bool>,

        /// Public base path pages are served under
        #[arg(short, long)]
        base: Option<String>,
    },

    /// Render every page into the output directory
    Build {
        /// Output directory (relative to project root)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Minify the html content
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        minify: Option<bool>,
    },

    /// List discovered pages with their entries and templates
    Pages,

    /// Print the configuration contributed to the host build tool as JSON
    Config {
        /// Print the development contribution instead of the production one
        #[arg(long)]
        dev: bool,
    },
}

#[allow(unused)]
impl Cli {
    pub const fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve { .. })
    }
    pub const fn is_build(&self) -> bool {
        matches!(self.command, Commands::Build { .. })
    }
}
