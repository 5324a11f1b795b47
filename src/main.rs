use clap::Parser;
use listing_harvest::{CompletedListing, CrawlConfig, CrawlError, Harvest};
use std::fs::File;
use std::io::{self, BufWriter, Write};

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        ::log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), CrawlError> {
    let mut config = match &args.config {
        Some(path) => CrawlConfig::from_file(path)?,
        None => CrawlConfig::default(),
    };
    config.apply_env();
    let mut harvest = Harvest::new(config);

    if !args.seeds.is_empty() {
        harvest = harvest.with_seeds(args.seeds.clone());
    }
    if let Some(concurrency) = args.concurrency {
        harvest = harvest.with_max_concurrency(concurrency);
    }
    if let Some(retries) = args.max_retries {
        harvest = harvest.with_max_retries(retries);
    }
    if args.headed {
        harvest = harvest.with_headless(false);
    }

    ::log::info!(
        "Crawling {} seed URLs via WebDriver at {}",
        harvest.config().seeds.len(),
        harvest.config().webdriver_url
    );

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let start_time = std::time::Instant::now();
    let mut handle = harvest.generate()?;
    while let Some(listing) = handle.next().await {
        if let Err(e) = write_listing(&mut out, &listing) {
            ::log::error!("Failed to write listing {}: {}", listing.listing().listing_url, e);
        }
    }
    if let Err(e) = out.flush() {
        ::log::error!("Failed to flush output: {}", e);
    }

    let report = handle.finish().await?;
    ::log::info!(
        "Harvested {} listings in {:.2} seconds ({} requests failed)",
        report.listings_emitted,
        start_time.elapsed().as_secs_f64(),
        report.failures.len()
    );
    Ok(())
}

fn write_listing(out: &mut dyn Write, listing: &CompletedListing) -> io::Result<()> {
    serde_json::to_writer(&mut *out, listing)?;
    out.write_all(b"\n")
}
