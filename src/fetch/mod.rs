//! Authorized, rate-limit aware request execution and pagination.
//!
//! [`PagedFetcher`] owns the current [`Credentials`] and runs every request
//! through the same bounded retry rules:
//!
//! - HTTP 401: invalidate the token, refresh once, retry the same request.
//!   A second 401 is [`Error::PersistentAuthFailure`].
//! - HTTP 429: wait (`Retry-After` or exponential schedule) and retry, at most
//!   [`BackoffPolicy::max_attempts`] times in a row, then
//!   [`Error::RateLimitExceeded`].
//! - Any other non-2xx status is [`Error::RequestFailed`].
//!
//! Pages are requested strictly one after another since each cursor depends on
//! the previous response. An optional page delay spaces them out further.

mod page;

pub use page::{Cursor, Cutoff, Page, PageSource};

use std::time::Duration;

use tracing::{debug, warn};

use crate::{
    clock::Clock,
    error::{Error, Result},
    http::{ApiRequest, ApiResponse, BackoffPolicy, Transport},
    management::{Credentials, TokenProvider},
};

/// Transient retry bookkeeping for one fetch. Reset after every successful response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    pub auth_retry_used: bool,
    pub rate_limit_backoffs: u32,
}

pub struct PagedFetcher<T, C> {
    provider: TokenProvider<T, C>,
    credentials: Credentials,
    backoff: BackoffPolicy,
    page_delay: Duration,
}

impl<T: Transport, C: Clock> PagedFetcher<T, C> {
    pub fn new(provider: TokenProvider<T, C>, credentials: Credentials) -> Self {
        Self {
            provider,
            credentials,
            backoff: BackoffPolicy::default(),
            page_delay: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Waits `delay` on the clock before every page after the first.
    #[must_use]
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Credentials as of the last request, including any refresh performed.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Sends one authorized request under the retry rules.
    ///
    /// The bearer token is attached here; `request` should not carry one.
    ///
    /// # Errors
    ///
    /// - [`Error::AuthenticationRequired`] / [`Error::RefreshRejected`] when no token can be obtained
    /// - [`Error::PersistentAuthFailure`] on a second 401
    /// - [`Error::RateLimitExceeded`] once the backoff budget is spent
    /// - [`Error::RequestFailed`] for any other non-2xx status
    pub async fn execute(&mut self, request: ApiRequest) -> Result<ApiResponse> {
        let mut retry = RetryState::default();
        self.execute_with(request, &mut retry).await
    }

    async fn execute_with(
        &mut self,
        request: ApiRequest,
        retry: &mut RetryState,
    ) -> Result<ApiResponse> {
        loop {
            let (token, credentials) = self
                .provider
                .get_valid_access_token(self.credentials.clone())
                .await?;
            self.credentials = credentials;

            let response = self
                .provider
                .transport()
                .send(request.clone().bearer(token))
                .await?;

            match response.status {
                401 => {
                    if retry.auth_retry_used {
                        return Err(Error::PersistentAuthFailure);
                    }
                    warn!(
                        "Unauthorized response from {}, refreshing {} token",
                        request.url,
                        self.provider.provider()
                    );
                    retry.auth_retry_used = true;
                    self.credentials = self.provider.invalidate(self.credentials.clone());
                }
                429 => {
                    if retry.rate_limit_backoffs >= self.backoff.max_attempts {
                        return Err(Error::RateLimitExceeded {
                            attempts: retry.rate_limit_backoffs,
                        });
                    }
                    let wait = self
                        .backoff
                        .wait_for(retry.rate_limit_backoffs, response.retry_after);
                    retry.rate_limit_backoffs += 1;
                    warn!(
                        "Rate limited, attempt {}/{}, waiting {:?}",
                        retry.rate_limit_backoffs, self.backoff.max_attempts, wait
                    );
                    self.provider.clock().sleep(wait).await;
                }
                _ if response.is_success() => {
                    *retry = RetryState::default();
                    return Ok(response);
                }
                status => {
                    return Err(Error::RequestFailed {
                        status,
                        body: response.body,
                    });
                }
            }
        }
    }

    /// Lazily walks `source`, one request per [`Pages::next_page`] call.
    ///
    /// # Arguments
    ///
    /// * `source` - The collection to walk; decides the endpoint and cursor style
    /// * `page_size` - Records requested per page; a page with fewer ends the walk
    /// * `cutoff` - Optional predicate; the first record failing it ends the walk
    ///   and is dropped along with everything after it
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mut pages = fetcher.pages(ActivitySource::new(api_url), 200, None);
    /// while let Some(activities) = pages.next_page().await? {
    ///     println!("page {}: {} activities", pages.pages_fetched(), activities.len());
    /// }
    /// ```
    pub fn pages<S: PageSource>(
        &mut self,
        source: S,
        page_size: u32,
        cutoff: Option<Cutoff<S::Record>>,
    ) -> Pages<'_, T, C, S> {
        let cursor = Some(source.first_cursor());
        Pages {
            fetcher: self,
            source,
            page_size: page_size.max(1),
            cutoff,
            cursor,
            retry: RetryState::default(),
            fetched: 0,
        }
    }

    /// Fetches every page of `source` and returns the records in order.
    pub async fn fetch_all<S: PageSource>(
        &mut self,
        source: S,
        page_size: u32,
        cutoff: Option<Cutoff<S::Record>>,
    ) -> Result<Vec<S::Record>> {
        self.pages(source, page_size, cutoff).collect_all().await
    }
}

/// A finite, non-restartable walk over a paginated collection.
pub struct Pages<'a, T, C, S: PageSource> {
    fetcher: &'a mut PagedFetcher<T, C>,
    source: S,
    page_size: u32,
    cutoff: Option<Cutoff<S::Record>>,
    cursor: Option<Cursor>,
    retry: RetryState,
    fetched: u32,
}

impl<T: Transport, C: Clock, S: PageSource> Pages<'_, T, C, S> {
    /// Number of pages received so far.
    pub fn pages_fetched(&self) -> u32 {
        self.fetched
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor.is_none()
    }

    /// Fetches the next page, or `None` once the collection is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<S::Record>>> {
        let Some(cursor) = self.cursor else {
            return Ok(None);
        };

        if self.fetched > 0 && !self.fetcher.page_delay.is_zero() {
            self.fetcher
                .provider
                .clock()
                .sleep(self.fetcher.page_delay)
                .await;
        }

        let request = self.source.request(&cursor, self.page_size);
        let response = self
            .fetcher
            .execute_with(request, &mut self.retry)
            .await?;
        let page = self.source.decode(&cursor, &response.body)?;
        self.fetched += 1;

        let mut records = page.records;
        let short = records.len() < self.page_size as usize;
        let cut_at = self
            .cutoff
            .as_ref()
            .and_then(|keep| records.iter().position(|record| !keep(record)));

        if let Some(index) = cut_at {
            debug!("Cutoff reached at record {} of page {}", index, self.fetched);
            records.truncate(index);
        }

        self.cursor = if cut_at.is_some() || short {
            None
        } else {
            page.next
        };

        Ok(Some(records))
    }

    /// Drains the remaining pages into one vector.
    pub async fn collect_all(mut self) -> Result<Vec<S::Record>> {
        let mut all = Vec::new();
        while let Some(records) = self.next_page().await? {
            all.extend(records);
        }
        Ok(all)
    }
}
