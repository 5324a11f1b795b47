pub mod orchestrator;
pub mod renderer;
pub mod webdriver;


pub use orchestrator::{CrawlHandle, start};
pub use renderer::{RenderSession, Renderer, SettlePolicy};
pub use webdriver::WebDriverRenderer;
