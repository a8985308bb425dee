//! mpa - page discovery and html synthesis for multi-page applications.

mod adapter;
mod build;
mod cli;
mod config;
mod logger;
mod page;
mod render;
mod resolve;
mod serve;
mod utils;
mod watch;

use adapter::{BuildAdapter, DevAdapter, Plugin};
use anyhow::Result;
use build::build_site;
use clap::Parser;
use cli::{Cli, Commands};
use config::MpaConfig;
use page::PageIndex;
use render::Mode;
use serve::serve_site;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config: &'static MpaConfig = Box::leak(Box::new(MpaConfig::load(&cli)?));

    match &cli.command {
        Commands::Serve { .. } => {
            serve_site(config, DevAdapter::new(config.page_options(), &config.serve.base))
        }
        Commands::Build { .. } => {
            build_site(config, &BuildAdapter::new(&config.page_options())).map(|_| ())
        }
        Commands::Pages => {
            let plugin = Plugin::new(Mode::Build, config.page_options(), &config.serve.base);
            print_pages(&plugin.index(), config);
            Ok(())
        }
        Commands::Config { dev } => {
            let mode = if *dev { Mode::Dev } else { Mode::Build };
            let plugin = Plugin::new(mode, config.page_options(), &config.serve.base);
            println!("{}", serde_json::to_string_pretty(&plugin.config())?);
            Ok(())
        }
    }
}

/// Print one line per page: name, entry path and template.
fn print_pages(index: &PageIndex, config: &MpaConfig) {
    if index.is_empty() {
        log!("pages"; "no pages under {}", config.pages_root().display());
        return;
    }

    let width = index.names().map(str::len).max().unwrap_or_default();
    for page in index.iter() {
        let template = page.template.path().map_or_else(
            || "(built-in)".to_owned(),
            |path| path.strip_prefix(&config.root).unwrap_or(path).display().to_string(),
        );
        println!("{:width$}  {}  {}", page.name, page.entry_path, template);
    }
}
