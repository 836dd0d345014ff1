use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use spdlog::{info, warn};

use notesmith::logger::configure_logger;
use notesmith::site_builder::build_site;

use crate::config::open_config;

mod config;

const CFG_FILE_NAME: &str = "notesmith.toml";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config path
    #[arg(short, long)]
    config: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = open_config(args.config.map(PathBuf::from))?;

    if let Err(err) = configure_logger(config.log.as_ref()) {
        warn!("Error creating logger sinks. Using console instead. Desc={}", err);
    }

    info!("Building {} into {}", config.paths.posts_dir.display(), config.paths.output_dir.display());
    let start = Instant::now();
    let report = build_site(&config)?;

    info!("Wrote {} posts, {} static pages, {} drafts and {} tag pages in {:?}",
        report.posts, report.static_pages, report.drafts, report.tags, start.elapsed());

    Ok(())
}
