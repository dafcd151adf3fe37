//! Pagination Module
//!
//! Wraps a [`Fetcher`] with page state. The producer receives the current
//! page number and page size, reports the total item count alongside each
//! page, and the navigation operations are no-ops outside the valid page
//! range.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::Mutex;

use crate::error::FetchError;
use crate::fetch::fetcher::{FetchOptions, FetchState, Fetcher, Producer};

// == Page ==
/// One page of results plus the total item count it was cut from.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: usize,
}

/// Producer of one page: receives (page, page_size), 1-based.
pub type PageProducer<T> =
    Arc<dyn Fn(usize, usize) -> BoxFuture<'static, anyhow::Result<Page<T>>> + Send + Sync>;

// == Page Window ==
#[derive(Debug, Clone, Copy)]
struct PageWindow {
    current_page: usize,
    page_size: usize,
    total_pages: usize,
}

// == Paged Fetcher ==
pub struct PagedFetcher<T> {
    inner: Fetcher<Page<T>>,
    window: Arc<Mutex<PageWindow>>,
}

impl<T> PagedFetcher<T>
where
    T: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Starts on page 1. `total_pages` is unknown (zero) until the first
    /// fetch reports a total item count.
    pub fn new(
        producer: PageProducer<T>,
        page_size: usize,
        options: FetchOptions<Page<T>>,
    ) -> Self {
        let window = Arc::new(Mutex::new(PageWindow {
            current_page: 1,
            page_size,
            total_pages: 0,
        }));

        let inner_producer: Producer<Page<T>> = {
            let window = Arc::clone(&window);
            Arc::new(move || {
                let producer = Arc::clone(&producer);
                let window = Arc::clone(&window);
                Box::pin(async move {
                    let (page, size) = {
                        let window = window.lock().await;
                        (window.current_page, window.page_size)
                    };
                    producer(page, size).await
                })
            })
        };

        Self {
            inner: Fetcher::new(inner_producer, options),
            window,
        }
    }

    // == Fetch ==
    /// Fetches the current page and recomputes the page count from the
    /// reported total.
    pub async fn fetch(&self) -> Result<Option<Page<T>>, FetchError> {
        let result = self.inner.fetch().await;

        if let Ok(Some(page)) = &result {
            let mut window = self.window.lock().await;
            window.total_pages = page_count(page.total_items, window.page_size);
        }

        result
    }

    // == Navigation ==
    /// Moves one page forward; a no-op on the last page.
    pub async fn next_page(&self) -> Result<Option<Page<T>>, FetchError> {
        let target = {
            let window = self.window.lock().await;
            if window.current_page >= window.total_pages {
                return Ok(None);
            }
            window.current_page + 1
        };
        self.go_to_page(target).await
    }

    /// Moves one page back; a no-op on page 1.
    pub async fn previous_page(&self) -> Result<Option<Page<T>>, FetchError> {
        let target = {
            let window = self.window.lock().await;
            if window.current_page <= 1 {
                return Ok(None);
            }
            window.current_page - 1
        };
        self.go_to_page(target).await
    }

    /// Jumps to a page; a no-op outside `[1, total_pages]`.
    pub async fn go_to_page(&self, page: usize) -> Result<Option<Page<T>>, FetchError> {
        {
            let mut window = self.window.lock().await;
            if page == 0 || page > window.total_pages {
                return Ok(None);
            }
            window.current_page = page;
        }
        self.fetch().await
    }

    /// Changes the page size and resets to page 1. Zero is ignored.
    pub async fn set_page_size(&self, page_size: usize) -> Result<Option<Page<T>>, FetchError> {
        {
            let mut window = self.window.lock().await;
            if page_size == 0 {
                return Ok(None);
            }
            window.page_size = page_size;
            window.current_page = 1;
        }
        self.fetch().await
    }

    // == Accessors ==
    pub async fn current_page(&self) -> usize {
        self.window.lock().await.current_page
    }

    pub async fn total_pages(&self) -> usize {
        self.window.lock().await.total_pages
    }

    pub async fn page_size(&self) -> usize {
        self.window.lock().await.page_size
    }

    pub async fn has_next_page(&self) -> bool {
        let window = self.window.lock().await;
        window.current_page < window.total_pages
    }

    pub async fn has_previous_page(&self) -> bool {
        self.window.lock().await.current_page > 1
    }

    pub async fn state(&self) -> FetchState<Page<T>> {
        self.inner.state().await
    }
}

fn page_count(total_items: usize, page_size: usize) -> usize {
    if page_size == 0 {
        0
    } else {
        total_items.div_ceil(page_size)
    }
}
