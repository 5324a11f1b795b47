use crate::classifier::{Classifier, PageKind};
use crate::config::{CrawlConfig, Selectors};
use crate::crawlers::renderer::{RenderSession, Renderer, SettlePolicy};
use crate::error::{CrawlError, RenderError};
use crate::frontier::{CrawlRequest, Frontier, QueuedRequest, SharedFrontier};
use crate::parsers::{self, IndexPage};
use crate::results::{CompletedListing, CrawlReport, PartialListing};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use url::Url;

/// Listings waiting in the sink channel before workers block on it
const SINK_CAPACITY: usize = 1000;

/// Upper bound on releasing a rendering session
const SESSION_CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// A running crawl: completed listings as they are produced, then a report
pub struct CrawlHandle {
    listings: mpsc::Receiver<CompletedListing>,
    report: JoinHandle<Result<CrawlReport, CrawlError>>,
}

impl CrawlHandle {
    /// Next completed listing; `None` once every worker has stopped
    pub async fn next(&mut self) -> Option<CompletedListing> {
        self.listings.recv().await
    }

    /// Wait for the run to end. Drain [`CrawlHandle::next`] first, otherwise
    /// listings still in the channel are discarded.
    pub async fn finish(self) -> Result<CrawlReport, CrawlError> {
        drop(self.listings);
        self.report
            .await
            .map_err(|e| CrawlError::Worker(e.to_string()))?
    }
}

/// Read-only state shared by all workers
struct Context {
    config: CrawlConfig,
    selectors: Selectors,
    classifier: Classifier,
    renderer: Arc<dyn Renderer>,
}

/// Starts a crawl over the configured seeds and returns a handle to it.
///
/// Must be called from within a Tokio runtime.
pub fn start(config: CrawlConfig, renderer: Arc<dyn Renderer>) -> Result<CrawlHandle, CrawlError> {
    config.validate()?;
    let selectors = config.selectors.compile()?;

    let mut frontier = Frontier::new();
    for seed in &config.seeds {
        Url::parse(seed).map_err(|source| CrawlError::InvalidSeed {
            url: seed.clone(),
            source,
        })?;
        frontier.enqueue(CrawlRequest::index(seed.clone()));
    }
    ::log::info!(
        "Starting crawl with {} seed URLs and {} workers",
        frontier.pending_len(),
        config.max_concurrency
    );

    let ctx = Arc::new(Context {
        classifier: Classifier::new(config.detail_path_marker.clone()),
        config,
        selectors,
        renderer,
    });
    let frontier = Arc::new(SharedFrontier::new(frontier));
    let (sink, listings) = mpsc::channel(SINK_CAPACITY);

    let workers: Vec<_> = (0..ctx.config.max_concurrency)
        .map(|id| {
            let worker = Worker {
                id,
                ctx: Arc::clone(&ctx),
                frontier: Arc::clone(&frontier),
                sink: sink.clone(),
            };
            tokio::spawn(worker.run())
        })
        .collect();

    // Workers hold the only senders from here on
    drop(sink);

    let report = tokio::spawn(async move {
        let mut report = CrawlReport::default();
        let mut lost = Vec::new();
        for worker in workers {
            match worker.await {
                Ok(worker_report) => report.merge(worker_report),
                Err(e) => {
                    ::log::error!("Worker task ended abnormally: {}", e);
                    lost.push(e.to_string());
                }
            }
        }
        if !lost.is_empty() {
            return Err(CrawlError::Worker(lost.join("; ")));
        }

        ::log::info!(
            "Crawl complete - {} index pages, {} detail pages, {} listings emitted, {} retries, {} failed",
            report.index_pages,
            report.detail_pages,
            report.listings_emitted,
            report.retries,
            report.failures.len()
        );
        for (url, error) in &report.failures {
            ::log::debug!("Failed request {}: {}", url, error);
        }

        if report.succeeded() == 0 {
            return Err(CrawlError::NothingProcessed {
                failures: report.failures.len(),
            });
        }
        Ok(report)
    });

    Ok(CrawlHandle { listings, report })
}

/// Result of one successful visit
enum Visit {
    Index,
    Detail(CompletedListing),
}

struct Worker {
    id: usize,
    ctx: Arc<Context>,
    frontier: Arc<SharedFrontier>,
    sink: mpsc::Sender<CompletedListing>,
}

impl Worker {
    async fn run(self) -> CrawlReport {
        ::log::debug!("Worker {} started", self.id);
        let mut report = CrawlReport::default();

        while let Some(queued) = self.frontier.next().await {
            self.handle(queued, &mut report).await;
        }

        ::log::debug!("Worker {} finished - no more requests", self.id);
        report
    }

    /// Drive one request to its next state: succeeded, retrying or failed
    async fn handle(&self, mut queued: QueuedRequest, report: &mut CrawlReport) {
        let url = queued.request.url().to_string();
        ::log::info!("Worker {} scraping: {}", self.id, url);

        let outcome = AssertUnwindSafe(self.attempt(&queued.request))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(Visit::Index)) => {
                report.index_pages += 1;
                self.frontier.complete().await;
            }
            Ok(Ok(Visit::Detail(done))) => {
                report.detail_pages += 1;
                self.emit(done, report).await;
                self.frontier.complete().await;
            }
            Ok(Err(error)) => {
                queued.retry_count += 1;
                if queued.retry_count <= self.ctx.config.max_request_retries {
                    ::log::warn!(
                        "Worker {} retrying {} (attempt {} of {}): {}",
                        self.id,
                        url,
                        queued.retry_count + 1,
                        self.ctx.config.max_request_retries + 1,
                        error
                    );
                    report.retries += 1;
                    self.frontier.requeue(queued).await;
                    return;
                }
                self.fail(queued.request, error.to_string(), report).await;
            }
            // A panicking page is not retried; the request still has to leave
            // the in-flight set or the other workers wait on it forever
            Err(panic) => {
                let reason = format!("panicked: {}", panic_message(&*panic));
                self.fail(queued.request, reason, report).await;
            }
        }
    }

    /// Terminal failure: record it, emit the sentinel for a listing, release the slot
    async fn fail(&self, request: CrawlRequest, reason: String, report: &mut CrawlReport) {
        let url = request.url().to_string();
        ::log::error!("Request {} failed: {}", url, reason);
        report.failures.push((url, reason));
        if let CrawlRequest::Detail { listing, .. } = request {
            self.emit(listing.fail(), report).await;
        }
        self.frontier.complete().await;
    }

    /// Open a session, visit, and release the session whatever the outcome
    async fn attempt(&self, request: &CrawlRequest) -> Result<Visit, RenderError> {
        let mut session = self.ctx.renderer.open().await?;
        let result = self.visit(session.as_mut(), request).await;
        if timeout(SESSION_CLOSE_TIMEOUT, session.close()).await.is_err() {
            ::log::warn!(
                "Worker {} gave up closing the session for {} after {:?}",
                self.id,
                request.url(),
                SESSION_CLOSE_TIMEOUT
            );
        }
        result
    }

    async fn visit(
        &self,
        session: &mut dyn RenderSession,
        request: &CrawlRequest,
    ) -> Result<Visit, RenderError> {
        let url = request.url();
        let config = &self.ctx.config;

        match timeout(config.navigation_timeout(), session.navigate(url)).await {
            Ok(navigated) => navigated?,
            Err(_) => {
                return Err(RenderError::NavigationTimeout {
                    url: url.to_string(),
                    secs: config.navigation_timeout_secs,
                });
            }
        }

        let visit = match (request, self.ctx.classifier.classify(url)) {
            (CrawlRequest::Detail { listing, .. }, _) => {
                Visit::Detail(self.visit_detail(session, listing.clone()).await)
            }
            (CrawlRequest::Index { .. }, PageKind::Index) => {
                self.visit_index(session, url).await?;
                Visit::Index
            }
            (CrawlRequest::Index { .. }, PageKind::Detail) => {
                ::log::warn!("Detail page {} reached without card data", url);
                let listing = PartialListing {
                    source_url: url.to_string(),
                    listing_url: url.to_string(),
                    ..PartialListing::default()
                };
                Visit::Detail(self.visit_detail(session, listing).await)
            }
        };

        pause(config.page_pause()).await;
        Ok(visit)
    }

    async fn visit_index(
        &self,
        session: &mut dyn RenderSession,
        url: &str,
    ) -> Result<(), RenderError> {
        let scroll = &self.ctx.config.scroll;
        session
            .settle(SettlePolicy {
                step_px: scroll.step_px,
                interval: Duration::from_millis(scroll.interval_ms),
                budget: Duration::from_secs(scroll.budget_secs),
            })
            .await?;
        let html = session.html().await?;

        let IndexPage {
            category,
            listings,
            next_page,
        } = parsers::parse_index_page(&html, url, &self.ctx.selectors);
        ::log::info!(
            "Found {} articles on {} (category {:?})",
            listings.len(),
            url,
            category.as_str()
        );

        let queued = self.frontier.enqueue_listings(listings).await;
        ::log::info!(
            "After deduplication, added {} listings to queue for description scraping",
            queued
        );

        if let Some(next) = next_page {
            if self.ctx.classifier.classify(&next) == PageKind::Detail {
                ::log::debug!("Ignoring next-page link to a detail page: {}", next);
            } else if self.frontier.enqueue(CrawlRequest::index(next.clone())).await {
                ::log::info!("Queued next page: {}", next);
            }
        }
        Ok(())
    }

    /// Read the description; never fails, an unreadable one becomes the sentinel
    async fn visit_detail(
        &self,
        session: &mut dyn RenderSession,
        listing: PartialListing,
    ) -> CompletedListing {
        ::log::info!("Scraping description for: {}", listing.title);
        let css = &self.ctx.selectors.description_css;

        let description = match session
            .wait_for(css, self.ctx.config.description_timeout())
            .await
        {
            Ok(true) => match session.html().await {
                Ok(html) => parsers::extract_description(&html, &self.ctx.selectors.description),
                Err(e) => {
                    ::log::error!("Failed to read description for {}: {}", listing.title, e);
                    String::new()
                }
            },
            Ok(false) => {
                ::log::error!(
                    "Description container did not render for {}",
                    listing.title
                );
                String::new()
            }
            Err(e) => {
                ::log::error!("Failed to scrape description for {}: {}", listing.title, e);
                String::new()
            }
        };

        listing.complete(&description)
    }

    async fn emit(&self, done: CompletedListing, report: &mut CrawlReport) {
        let preview: String = done.description().chars().take(100).collect();
        ::log::info!(
            "Extracted description for {}: {}...",
            done.listing().title,
            preview
        );
        match self.sink.send(done).await {
            Ok(()) => report.listings_emitted += 1,
            Err(e) => ::log::error!("Worker {} failed to send listing: {}", self.id, e),
        }
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
