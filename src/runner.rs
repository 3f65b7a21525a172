use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::info;

use crate::filter::{FilterState, StatusFilter};
use crate::launch::Launch;
use crate::pagination::{PageOutcome, DEFAULT_PAGE_SIZE};
use crate::sentinel::FULL_VISIBILITY;
use crate::session::{LaunchList, ListEvent};
use crate::source::{RecordSource, SourceError, SpaceXSource, StaticSource, DEFAULT_API_URL};

#[derive(Clone, Debug)]
pub struct Options {
    pub api_url: String,
    pub page_size: u32,
    pub timeout_seconds: Option<usize>,
    pub proxy: Option<String>,
    pub fixture: Option<String>,
    pub search: String,
    pub status: StatusFilter,
    // None keeps loading until the source is exhausted
    pub max_pages: Option<u32>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout_seconds: None,
            proxy: None,
            fixture: None,
            search: String::new(),
            status: StatusFilter::All,
            max_pages: Some(1),
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("invalid page_size {value}, expected positive integer")]
    InvalidPageSize { value: u32 },

    #[error("invalid max_pages 0, expected positive integer")]
    InvalidMaxPages,

    #[error("invalid api_url: {url}")]
    InvalidApiUrl { url: String },

    #[error("failed to open launch source: {source}")]
    Source {
        #[source]
        source: SourceError,
    },
}

#[derive(Clone, Debug)]
pub struct ListingResult {
    pub started_at: Instant,
    pub elapsed: Duration,
    pub launches_loaded: usize,
    pub pages_loaded: u32,
    pub exhausted: bool,
    // a page failed to load and loading stopped there
    pub interrupted: bool,
    pub visible: Vec<Launch>,
}

#[derive(Clone, Debug)]
pub struct Runner {
    options: Options,
}

impl Runner {
    pub fn new(options: Options) -> Result<Self, RunnerError> {
        if options.page_size == 0 {
            return Err(RunnerError::InvalidPageSize {
                value: options.page_size,
            });
        }
        if options.max_pages == Some(0) {
            return Err(RunnerError::InvalidMaxPages);
        }
        if options.fixture.is_none() && reqwest::Url::parse(&options.api_url).is_err() {
            return Err(RunnerError::InvalidApiUrl {
                url: options.api_url.clone(),
            });
        }
        Ok(Self { options })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub async fn run(&self) -> Result<ListingResult, RunnerError> {
        let source = build_source(&self.options)
            .await
            .map_err(|source| RunnerError::Source { source })?;
        Ok(self.run_with(source.as_ref()).await)
    }

    /// Loads pages the way a reader scrolling to the bottom would: the first
    /// page, then one more each time the end of the list comes into view.
    pub async fn run_with(&self, source: &dyn RecordSource) -> ListingResult {
        let started_at = Instant::now();
        let filter = FilterState::new(self.options.search.clone(), self.options.status);
        let mut list = LaunchList::with_filter(self.options.page_size, filter);

        let mut pages_loaded = 0u32;
        let mut interrupted = false;
        let mut next = list.start();
        while let Some(ticket) = next.take() {
            match list.load(ticket, source).await {
                PageOutcome::Appended(_) => pages_loaded += 1,
                PageOutcome::Exhausted | PageOutcome::Stale => {}
                PageOutcome::Failed => {
                    interrupted = true;
                    break;
                }
            }
            if matches!(self.options.max_pages, Some(max) if pages_loaded >= max) {
                break;
            }
            next = list.handle(ListEvent::SentinelVisible(FULL_VISIBILITY));
        }

        let visible: Vec<Launch> = list.visible().into_iter().cloned().collect();
        let launches_loaded = list.pagination().launches().len();
        info!(
            pages_loaded,
            launches_loaded,
            visible = visible.len(),
            "listing finished"
        );
        ListingResult {
            started_at,
            elapsed: started_at.elapsed(),
            launches_loaded,
            pages_loaded,
            exhausted: list.pagination().is_last_page(),
            interrupted,
            visible,
        }
    }
}

pub async fn build_source(options: &Options) -> Result<Arc<dyn RecordSource>, SourceError> {
    if let Some(path) = options.fixture.as_deref() {
        let source = StaticSource::from_json_file(path).await?;
        info!(path, launches = source.len(), "serving launches from fixture");
        return Ok(Arc::new(source));
    }
    let source = SpaceXSource::new(
        &options.api_url,
        options.timeout_seconds,
        options.proxy.as_deref(),
    )?;
    Ok(Arc::new(source))
}
