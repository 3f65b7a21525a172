pub mod browse;

use tracing::debug;

use crate::filter::{FilterState, StatusFilter};
use crate::launch::Launch;
use crate::pagination::{PageOutcome, PageTicket, PaginationController};
use crate::sentinel::ScrollSentinel;
use crate::source::{RecordSource, SourceError};

#[derive(Debug)]
pub enum ListEvent {
    SearchChanged(String),
    StatusChanged(StatusFilter),
    SentinelVisible(f64),
    PageLoaded {
        ticket: PageTicket,
        result: Result<Vec<Launch>, SourceError>,
    },
}

// what the rendering surface receives
#[derive(Clone, Debug)]
pub struct ListView<'a> {
    pub launches: Vec<&'a Launch>,
    pub is_loading: bool,
    pub is_last_page: bool,
    pub query: &'a str,
    pub status: StatusFilter,
}

/// The incremental-loading launch list.
///
/// Events go in through [`LaunchList::handle`]; whenever an event needs a
/// page fetched the caller gets a [`PageTicket`] back, runs it against a
/// [`RecordSource`] and feeds the result in as [`ListEvent::PageLoaded`].
#[derive(Clone, Debug)]
pub struct LaunchList {
    pagination: PaginationController,
    filter: FilterState,
    sentinel: ScrollSentinel,
}

impl LaunchList {
    pub fn new(page_size: u32) -> Self {
        Self::with_filter(page_size, FilterState::default())
    }

    pub fn with_filter(page_size: u32, filter: FilterState) -> Self {
        Self {
            pagination: PaginationController::new(page_size),
            filter,
            sentinel: ScrollSentinel::new(),
        }
    }

    pub fn start(&mut self) -> Option<PageTicket> {
        self.pagination.begin_next_page()
    }

    pub fn handle(&mut self, event: ListEvent) -> Option<PageTicket> {
        match event {
            ListEvent::SearchChanged(query) => {
                if query == self.filter.query {
                    return None;
                }
                self.filter.query = query;
                Some(self.reset())
            }
            ListEvent::StatusChanged(status) => {
                if status == self.filter.status {
                    return None;
                }
                self.filter.status = status;
                Some(self.reset())
            }
            ListEvent::SentinelVisible(ratio) => {
                let fire = self.sentinel.on_visible(
                    ratio,
                    self.pagination.is_loading(),
                    self.pagination.is_last_page(),
                );
                if !fire {
                    return None;
                }
                debug!(page = self.pagination.page(), "sentinel reached");
                let ticket = self.pagination.begin_next_page();
                if ticket.is_none() {
                    self.sentinel.release();
                }
                ticket
            }
            ListEvent::PageLoaded { ticket, result } => {
                self.complete(ticket, result);
                None
            }
        }
    }

    pub fn complete(
        &mut self,
        ticket: PageTicket,
        result: Result<Vec<Launch>, SourceError>,
    ) -> PageOutcome {
        let outcome = self.pagination.complete(ticket, result);
        if outcome != PageOutcome::Stale {
            self.sentinel.release();
        }
        outcome
    }

    pub async fn load(&mut self, ticket: PageTicket, source: &dyn RecordSource) -> PageOutcome {
        let result = source.fetch_page(ticket.page, ticket.page_size).await;
        self.complete(ticket, result)
    }

    pub fn visible(&self) -> Vec<&Launch> {
        self.filter.apply(self.pagination.launches())
    }

    pub fn view(&self) -> ListView<'_> {
        ListView {
            launches: self.visible(),
            is_loading: self.pagination.is_loading(),
            is_last_page: self.pagination.is_last_page(),
            query: &self.filter.query,
            status: self.filter.status,
        }
    }

    pub fn pagination(&self) -> &PaginationController {
        &self.pagination
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn sentinel(&self) -> &ScrollSentinel {
        &self.sentinel
    }

    fn reset(&mut self) -> PageTicket {
        self.sentinel.release();
        self.pagination.reset()
    }
}
