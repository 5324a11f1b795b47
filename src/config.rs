use crate::error::ConfigError;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Seed URLs: one per category filter on the broker's listing page
const DEFAULT_SEEDS: [&str; 4] = [
    "https://www.propertyfinder.ae/en/broker/golden-white-real-estate-management-10350?properties%5Bfilter%5Bcategory_id%5D%5D=1",
    "https://www.propertyfinder.ae/en/broker/golden-white-real-estate-management-10350?properties%5Bfilter%5Bcategory_id%5D%5D=2",
    "https://www.propertyfinder.ae/en/broker/golden-white-real-estate-management-10350?properties%5Bfilter%5Bcategory_id%5D%5D=3",
    "https://www.propertyfinder.ae/en/broker/golden-white-real-estate-management-10350?properties%5Bfilter%5Bcategory_id%5D%5D=4",
];

/// Configuration for a listing crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Index pages to start from
    #[serde(default = "default_seeds")]
    pub seeds: Vec<String>,

    /// Number of workers, each holding at most one rendering session
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Retries allowed after the first failed attempt of a request
    #[serde(default = "default_max_request_retries")]
    pub max_request_retries: u32,

    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,

    /// How long to wait for the description container on detail pages
    #[serde(default = "default_description_timeout_secs")]
    pub description_timeout_secs: u64,

    /// Pause after each page before the session is released
    #[serde(default = "default_page_pause_ms")]
    pub page_pause_ms: u64,

    #[serde(default)]
    pub scroll: ScrollConfig,

    /// Path fragment that marks a single-property page
    #[serde(default = "default_detail_path_marker")]
    pub detail_path_marker: String,

    #[serde(default)]
    pub selectors: SelectorConfig,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    #[serde(default)]
    pub browser: BrowserProfile,
}

/// Lazy-load scrolling used to settle index pages before extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub step_px: u32,
    pub interval_ms: u64,
    pub budget_secs: u64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            step_px: 300,
            interval_ms: 500,
            budget_secs: 60,
        }
    }
}

/// CSS selectors read by the extractors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub card: String,
    pub title: String,
    pub price: String,
    pub location: String,
    pub image: String,
    pub link: String,
    pub paragraph: String,
    pub next_page: String,
    pub category: String,
    pub description: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            card: "article".to_string(),
            title: "h2, .card__title".to_string(),
            price: r#"[class*="price"]"#.to_string(),
            location: r#"[class*="location"]"#.to_string(),
            image: "img".to_string(),
            link: r#"a[class*="property-card__link"]"#.to_string(),
            paragraph: "p".to_string(),
            next_page: r#"a[aria-label="Next"]"#.to_string(),
            category: r#"button[data-testid="filters-form-dropdown-category-type"] span"#
                .to_string(),
            description: r#"article[data-testid="dynamic-sanitize-html"]"#.to_string(),
        }
    }
}

/// Compiled form of [`SelectorConfig`]
#[derive(Debug)]
pub struct Selectors {
    pub card: Selector,
    pub title: Selector,
    pub price: Selector,
    pub location: Selector,
    pub image: Selector,
    pub link: Selector,
    pub paragraph: Selector,
    pub next_page: Selector,
    pub category: Selector,
    pub description: Selector,
    /// Raw description selector, handed to the renderer's wait primitive
    pub description_css: String,
}

impl SelectorConfig {
    /// Compile every selector, failing on the first invalid one
    pub fn compile(&self) -> Result<Selectors, ConfigError> {
        Ok(Selectors {
            card: compile(&self.card)?,
            title: compile(&self.title)?,
            price: compile(&self.price)?,
            location: compile(&self.location)?,
            image: compile(&self.image)?,
            link: compile(&self.link)?,
            paragraph: compile(&self.paragraph)?,
            next_page: compile(&self.next_page)?,
            category: compile(&self.category)?,
            description: compile(&self.description)?,
            description_css: self.description.clone(),
        })
    }
}

fn compile(css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| ConfigError::Selector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

/// Static browser setup handed to the renderer when a session is created
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserProfile {
    pub headless: bool,
    pub user_agent: String,
    pub window_width: u32,
    pub window_height: u32,
    /// Skip image downloads
    pub block_images: bool,
    /// Hide `navigator.webdriver` and the automation switches
    pub mask_webdriver: bool,
}

impl Default for BrowserProfile {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36".to_string(),
            window_width: 1280,
            window_height: 800,
            block_images: true,
            mask_webdriver: true,
        }
    }
}

fn default_seeds() -> Vec<String> {
    DEFAULT_SEEDS.iter().map(|s| s.to_string()).collect()
}

fn default_max_concurrency() -> usize {
    2
}

fn default_max_request_retries() -> u32 {
    3
}

fn default_navigation_timeout_secs() -> u64 {
    120
}

fn default_description_timeout_secs() -> u64 {
    15
}

fn default_page_pause_ms() -> u64 {
    2000
}

fn default_detail_path_marker() -> String {
    "/en/plp/".to_string()
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            seeds: default_seeds(),
            max_concurrency: default_max_concurrency(),
            max_request_retries: default_max_request_retries(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
            description_timeout_secs: default_description_timeout_secs(),
            page_pause_ms: default_page_pause_ms(),
            scroll: ScrollConfig::default(),
            detail_path_marker: default_detail_path_marker(),
            selectors: SelectorConfig::default(),
            webdriver_url: default_webdriver_url(),
            browser: BrowserProfile::default(),
        }
    }
}

impl CrawlConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Replace the WebDriver endpoint with `WEBDRIVER_URL` when it is set
    pub fn apply_env(&mut self) {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::Validation(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.seeds.is_empty() {
            return Err(ConfigError::Validation("no seed URLs given".to_string()));
        }
        if self.detail_path_marker.is_empty() {
            return Err(ConfigError::Validation(
                "detail_path_marker must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn description_timeout(&self) -> Duration {
        Duration::from_secs(self.description_timeout_secs)
    }

    pub fn page_pause(&self) -> Duration {
        Duration::from_millis(self.page_pause_ms)
    }
}
