use crate::config::BrowserProfile;
use crate::crawlers::renderer::{RenderSession, Renderer, SettlePolicy};
use crate::error::RenderError;
use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::wd::Capabilities;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Value, json};
use std::time::{Duration, Instant};

/// Endpoints tried when the configured WebDriver refuses a session
const FALLBACK_URLS: [&str; 2] = [
    "http://localhost:9515", // ChromeDriver default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

const SCROLL_SCRIPT: &str = r#"
window.scrollBy(0, arguments[0]);
return [window.scrollY + window.innerHeight, document.body.scrollHeight];
"#;

const MASK_WEBDRIVER_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => false });";

/// Renders pages in Chrome through a WebDriver server
#[derive(Debug, Clone)]
pub struct WebDriverRenderer {
    webdriver_url: String,
    profile: BrowserProfile,
    capabilities: Capabilities,
}

impl WebDriverRenderer {
    pub fn new(webdriver_url: impl Into<String>, profile: BrowserProfile) -> Self {
        let capabilities = capabilities(&profile);
        Self {
            webdriver_url: webdriver_url.into(),
            profile,
            capabilities,
        }
    }

    async fn connect(&self, url: &str) -> Result<Client, RenderError> {
        ClientBuilder::native()
            .capabilities(self.capabilities.clone())
            .connect(url)
            .await
            .map_err(|e| RenderError::Session(format!("{}: {}", url, e)))
    }
}

/// Chrome capabilities for a browser profile
pub fn capabilities(profile: &BrowserProfile) -> Capabilities {
    let mut args = vec![
        format!("--user-agent={}", profile.user_agent),
        format!(
            "--window-size={},{}",
            profile.window_width, profile.window_height
        ),
    ];
    if profile.headless {
        args.push("--headless=new".to_string());
    }
    if profile.mask_webdriver {
        args.push("--disable-blink-features=AutomationControlled".to_string());
    }

    let mut chrome = json!({ "args": args });
    if profile.mask_webdriver {
        chrome["excludeSwitches"] = json!(["enable-automation"]);
        chrome["useAutomationExtension"] = json!(false);
    }
    if profile.block_images {
        chrome["prefs"] = json!({ "profile.managed_default_content_settings.images": 2 });
    }

    let mut caps = Capabilities::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert("goog:chromeOptions".to_string(), chrome);
    caps
}

#[async_trait]
impl Renderer for WebDriverRenderer {
    async fn open(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        let primary_error = match self.connect(&self.webdriver_url).await {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", self.webdriver_url);
                return Ok(Box::new(WebDriverSession::new(client, &self.profile)));
            }
            Err(e) => e,
        };
        ::log::warn!("{}", primary_error);

        for url in FALLBACK_URLS {
            if url == self.webdriver_url {
                continue;
            }
            ::log::info!("Trying fallback WebDriver URL: {}", url);
            if let Ok(client) = self.connect(url).await {
                ::log::debug!("Connected to fallback WebDriver at {}", url);
                return Ok(Box::new(WebDriverSession::new(client, &self.profile)));
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
        );
        Err(primary_error)
    }
}

/// One Chrome session driven over WebDriver
pub struct WebDriverSession {
    client: Client,
    mask_webdriver: bool,
}

impl WebDriverSession {
    fn new(client: Client, profile: &BrowserProfile) -> Self {
        Self {
            client,
            mask_webdriver: profile.mask_webdriver,
        }
    }
}

#[async_trait]
impl RenderSession for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError> {
        self.client
            .goto(url)
            .await
            .map_err(|e| RenderError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if self.mask_webdriver {
            if let Err(e) = self.client.execute(MASK_WEBDRIVER_SCRIPT, vec![]).await {
                ::log::debug!("Could not mask webdriver flag on {}: {}", url, e);
            }
        }
        Ok(())
    }

    async fn wait_for(&mut self, css: &str, timeout: Duration) -> Result<bool, RenderError> {
        match self
            .client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(css))
            .await
        {
            Ok(_) => Ok(true),
            Err(CmdError::WaitTimeout) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn settle(&mut self, policy: SettlePolicy) -> Result<(), RenderError> {
        let started = Instant::now();
        loop {
            let position = self
                .client
                .execute(SCROLL_SCRIPT, vec![json!(policy.step_px)])
                .await?;
            let (scrolled, height) = scroll_position(&position);
            if scrolled >= height {
                ::log::trace!("Page settled at height {}", height);
                return Ok(());
            }
            if started.elapsed() >= policy.budget {
                ::log::debug!("Scroll budget spent at {}/{}px", scrolled, height);
                return Ok(());
            }
            tokio::time::sleep(policy.interval).await;
        }
    }

    async fn html(&mut self) -> Result<String, RenderError> {
        Ok(self.client.source().await?)
    }

    async fn close(self: Box<Self>) {
        if let Err(e) = self.client.close().await {
            ::log::warn!("Failed to close WebDriver session: {}", e);
        }
    }
}

/// Reads the `[scrolled, height]` pair returned by [`SCROLL_SCRIPT`]
fn scroll_position(value: &Value) -> (f64, f64) {
    let at = |i: usize| value.get(i).and_then(Value::as_f64).unwrap_or(0.0);
    (at(0), at(1))
}
