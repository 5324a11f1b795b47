//! Request queue and listing dedup ledger
//!
//! Both live behind one lock so that the ledger check, the queue check and
//! the append happen as a single step.

use crate::classifier::{PageKind, normalize_url};
use crate::results::{ListingKey, PartialListing};
use std::collections::{HashSet, VecDeque};
use tokio::sync::{Mutex, Notify};

/// A unit of crawl work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlRequest {
    Index { url: String },
    /// A detail page, carrying the listing it will complete
    Detail { url: String, listing: PartialListing },
}

impl CrawlRequest {
    pub fn index(url: impl Into<String>) -> Self {
        CrawlRequest::Index { url: url.into() }
    }

    /// Detail request for a listing, addressed by its listing URL
    pub fn detail(listing: PartialListing) -> Self {
        CrawlRequest::Detail {
            url: listing.listing_url.clone(),
            listing,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            CrawlRequest::Index { url } => url,
            CrawlRequest::Detail { url, .. } => url,
        }
    }

    pub fn kind(&self) -> PageKind {
        match self {
            CrawlRequest::Index { .. } => PageKind::Index,
            CrawlRequest::Detail { .. } => PageKind::Detail,
        }
    }
}

/// A request together with how many times it has failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedRequest {
    pub request: CrawlRequest,
    pub retry_count: u32,
}

/// What a worker gets when it asks for work
#[derive(Debug)]
pub enum Next {
    Ready(QueuedRequest),
    /// Nothing pending, but requests in flight may still add more
    Wait,
    /// Nothing pending and nothing in flight
    Exhausted,
}

/// FIFO of pending requests plus the bookkeeping that makes adds idempotent
#[derive(Debug, Default)]
pub struct Frontier {
    pending: VecDeque<QueuedRequest>,
    /// Normalized URLs ever accepted, per page kind
    seen: HashSet<(PageKind, String)>,
    ledger: HashSet<ListingKey>,
    in_flight: usize,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request unless an equivalent one was already accepted.
    ///
    /// Returns true if the request was appended.
    pub fn enqueue(&mut self, request: CrawlRequest) -> bool {
        let key = (request.kind(), normalize_url(request.url()));
        if !self.seen.insert(key) {
            ::log::debug!("Skipping already queued {:?} request: {}", request.kind(), request.url());
            return false;
        }
        self.pending.push_back(QueuedRequest {
            request,
            retry_count: 0,
        });
        true
    }

    /// Record a listing in the ledger and queue its detail request.
    ///
    /// Listings without a URL, or whose identity is already in the ledger,
    /// are ignored. Returns true if a detail request was appended.
    pub fn enqueue_listing(&mut self, listing: PartialListing) -> bool {
        if listing.listing_url.is_empty() {
            return false;
        }
        if !self.ledger.insert(listing.key()) {
            ::log::debug!("Duplicate listing skipped: {}", listing.title);
            return false;
        }
        self.enqueue(CrawlRequest::detail(listing))
    }

    /// Take the head request and mark it in flight
    pub fn dequeue(&mut self) -> Next {
        match self.pending.pop_front() {
            Some(queued) => {
                self.in_flight += 1;
                Next::Ready(queued)
            }
            None if self.in_flight > 0 => Next::Wait,
            None => Next::Exhausted,
        }
    }

    /// Put an in-flight request back at the tail for another attempt
    pub fn requeue(&mut self, queued: QueuedRequest) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.pending.push_back(queued);
    }

    /// Mark an in-flight request as terminal (succeeded or failed)
    pub fn complete(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// True iff nothing is pending and nothing is in flight
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.in_flight == 0
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn ledger_len(&self) -> usize {
        self.ledger.len()
    }
}

/// [`Frontier`] shared between workers
#[derive(Debug, Default)]
pub struct SharedFrontier {
    inner: Mutex<Frontier>,
    changed: Notify,
}

impl SharedFrontier {
    pub fn new(frontier: Frontier) -> Self {
        Self {
            inner: Mutex::new(frontier),
            changed: Notify::new(),
        }
    }

    /// Wait for the next request; `None` once the crawl has run dry
    pub async fn next(&self) -> Option<QueuedRequest> {
        loop {
            // Registered before checking so a wakeup between the check and
            // the await is not lost.
            let changed = self.changed.notified();
            match self.inner.lock().await.dequeue() {
                Next::Ready(queued) => return Some(queued),
                Next::Exhausted => {
                    self.changed.notify_waiters();
                    return None;
                }
                Next::Wait => {}
            }
            changed.await;
        }
    }

    pub async fn enqueue(&self, request: CrawlRequest) -> bool {
        let added = self.inner.lock().await.enqueue(request);
        if added {
            self.changed.notify_waiters();
        }
        added
    }

    /// Queue detail requests for a page's listings under a single lock.
    ///
    /// Returns how many were appended.
    pub async fn enqueue_listings(&self, listings: Vec<PartialListing>) -> usize {
        let added = {
            let mut frontier = self.inner.lock().await;
            listings
                .into_iter()
                .map(|listing| frontier.enqueue_listing(listing))
                .filter(|added| *added)
                .count()
        };
        if added > 0 {
            self.changed.notify_waiters();
        }
        added
    }

    pub async fn requeue(&self, queued: QueuedRequest) {
        self.inner.lock().await.requeue(queued);
        self.changed.notify_waiters();
    }

    pub async fn complete(&self) {
        self.inner.lock().await.complete();
        self.changed.notify_waiters();
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn listing(title: &str, url: &str) -> PartialListing {
        PartialListing {
            title: title.to_string(),
            listing_url: url.to_string(),
            ..PartialListing::default()
        }
    }

    fn ready(next: Next) -> QueuedRequest {
        match next {
            Next::Ready(queued) => queued,
            other => panic!("expected a ready request, got {:?}", other),
        }
    }

    #[test]
    fn test_fifo_order() {
        let mut frontier = Frontier::new();
        assert!(frontier.enqueue(CrawlRequest::index("https://example.com/1")));
        assert!(frontier.enqueue(CrawlRequest::index("https://example.com/2")));

        assert_eq!(ready(frontier.dequeue()).request.url(), "https://example.com/1");
        assert_eq!(ready(frontier.dequeue()).request.url(), "https://example.com/2");
    }

    #[test]
    fn test_index_enqueue_is_idempotent_per_normalized_url() {
        let mut frontier = Frontier::new();
        assert!(frontier.enqueue(CrawlRequest::index("https://example.com/s?page=2")));
        assert!(!frontier.enqueue(CrawlRequest::index("https://example.com/s?page=2#cards")));
        assert_eq!(frontier.pending_len(), 1);

        // Still rejected while in flight and after completion
        ready(frontier.dequeue());
        assert!(!frontier.enqueue(CrawlRequest::index("https://example.com/s?page=2")));
        frontier.complete();
        assert!(!frontier.enqueue(CrawlRequest::index("https://example.com/s?page=2")));
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_ledger_rejects_duplicate_cards() {
        let mut frontier = Frontier::new();
        assert!(frontier.enqueue_listing(listing("Villa", "https://example.com/en/plp/1")));
        assert!(!frontier.enqueue_listing(listing("Villa", "https://example.com/en/plp/1")));
        assert_eq!(frontier.pending_len(), 1);
        assert_eq!(frontier.ledger_len(), 1);
    }

    #[test]
    fn test_listing_without_url_is_ignored() {
        let mut frontier = Frontier::new();
        assert!(!frontier.enqueue_listing(listing("Villa", "")));
        assert_eq!(frontier.ledger_len(), 0);
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_detail_dedup_by_listing_url() {
        let mut frontier = Frontier::new();
        assert!(frontier.enqueue_listing(listing("Villa", "https://example.com/en/plp/1")));
        // Different title, same page: ledger accepts, queue does not
        assert!(!frontier.enqueue_listing(listing("Villa (featured)", "https://example.com/en/plp/1")));
        assert_eq!(frontier.pending_len(), 1);
    }

    #[test]
    fn test_detail_payload_travels_with_request() {
        let mut frontier = Frontier::new();
        frontier.enqueue_listing(listing("Villa", "https://example.com/en/plp/1"));
        match ready(frontier.dequeue()).request {
            CrawlRequest::Detail { url, listing } => {
                assert_eq!(url, "https://example.com/en/plp/1");
                assert_eq!(listing.title, "Villa");
            }
            other => panic!("expected detail request, got {:?}", other),
        }
    }

    #[test]
    fn test_termination_accounts_for_in_flight() {
        let mut frontier = Frontier::new();
        frontier.enqueue(CrawlRequest::index("https://example.com/1"));
        let queued = ready(frontier.dequeue());
        assert!(!frontier.is_empty());
        assert!(matches!(frontier.dequeue(), Next::Wait));

        frontier.requeue(queued);
        assert_eq!(frontier.in_flight(), 0);
        ready(frontier.dequeue());
        frontier.complete();
        assert!(frontier.is_empty());
        assert!(matches!(frontier.dequeue(), Next::Exhausted));
    }

    #[tokio::test]
    async fn test_waiting_worker_wakes_on_enqueue() {
        let shared = Arc::new(SharedFrontier::new(Frontier::new()));
        shared.enqueue(CrawlRequest::index("https://example.com/1")).await;
        let first = shared.next().await.unwrap();

        let waiter = {
            let shared = Arc::clone(&shared);
            tokio::spawn(async move { shared.next().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        shared.enqueue(CrawlRequest::index("https://example.com/2")).await;

        let second = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(first.request.url(), "https://example.com/1");
        assert_eq!(second.request.url(), "https://example.com/2");
    }

    #[tokio::test]
    async fn test_waiting_worker_released_when_crawl_drains() {
        let shared = Arc::new(SharedFrontier::new(Frontier::new()));
        shared.enqueue(CrawlRequest::index("https://example.com/1")).await;
        shared.next().await.unwrap();

        let waiter = {
            let shared = Arc::clone(&shared);
            tokio::spawn(async move { shared.next().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        shared.complete().await;

        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_none());
        assert!(shared.is_empty().await);
    }
}
