use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "listing-harvest")]
#[command(about = "Crawls property listing pages and enriches each listing with its description")]
#[command(version)]
pub struct Args {
    /// Index page URLs to start from (defaults to the built-in category seeds)
    pub seeds: Vec<String>,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write listings as JSON lines to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of concurrent browser sessions
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Retries per request after the first failure
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,
}
