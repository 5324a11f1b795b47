use crate::error::RenderError;
use async_trait::async_trait;
use std::time::Duration;

/// Bounded scroll used to trigger lazy-loaded content
#[derive(Debug, Clone, Copy)]
pub struct SettlePolicy {
    pub step_px: u32,
    pub interval: Duration,
    pub budget: Duration,
}

/// Opens rendering sessions; one per request, owned by the worker using it
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn open(&self) -> Result<Box<dyn RenderSession>, RenderError>;
}

/// A live browser page
#[async_trait]
pub trait RenderSession: Send {
    /// Load `url` and wait for the document to be ready
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError>;

    /// Wait until `css` matches an element, or until `timeout` elapses.
    ///
    /// Returns false on timeout.
    async fn wait_for(&mut self, css: &str, timeout: Duration) -> Result<bool, RenderError>;

    /// Scroll down in steps until the page stops growing or the budget is spent
    async fn settle(&mut self, policy: SettlePolicy) -> Result<(), RenderError>;

    /// Serialized DOM of the current page
    async fn html(&mut self) -> Result<String, RenderError>;

    /// Release the session; called exactly once, after success or failure
    async fn close(self: Box<Self>);
}
