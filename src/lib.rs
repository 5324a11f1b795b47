pub mod classifier;
pub mod config;
pub mod crawlers;
pub mod error;
pub mod frontier;
pub mod parsers;
pub mod results;

// Re-export commonly used types for convenience
pub use config::CrawlConfig;
pub use crawlers::{CrawlHandle, Renderer, WebDriverRenderer};
pub use error::{ConfigError, CrawlError, RenderError};
pub use results::{CompletedListing, CrawlReport, PartialListing};

use std::sync::Arc;

/// Builder for a listing crawl
pub struct Harvest {
    config: CrawlConfig,
}

impl Default for Harvest {
    fn default() -> Self {
        Self::new(CrawlConfig::default())
    }
}

impl Harvest {
    pub fn new(config: CrawlConfig) -> Self {
        Self { config }
    }

    /// Replace the seed URLs
    pub fn with_seeds<I, S>(mut self, seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.seeds = seeds.into_iter().map(Into::into).collect();
        self
    }

    /// Set the number of concurrent workers
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.config.max_concurrency = max_concurrency;
        self
    }

    /// Set how many times a failed request is retried
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.config.max_request_retries = retries;
        self
    }

    pub fn with_webdriver_url(mut self, url: impl Into<String>) -> Self {
        self.config.webdriver_url = url.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.config.browser.headless = headless;
        self
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Start crawling through a WebDriver server
    pub fn generate(self) -> Result<CrawlHandle, CrawlError> {
        let renderer =
            WebDriverRenderer::new(self.config.webdriver_url.clone(), self.config.browser.clone());
        self.generate_with(Arc::new(renderer))
    }

    /// Start crawling with a custom renderer
    pub fn generate_with(self, renderer: Arc<dyn Renderer>) -> Result<CrawlHandle, CrawlError> {
        crawlers::start(self.config, renderer)
    }
}
