use tracing::{debug, warn};

use crate::launch::Launch;
use crate::source::{RecordSource, SourceError};

pub const DEFAULT_PAGE_SIZE: u32 = 12;

// identifies one issued fetch. the generation ties it to the filter state
// that was current when it was issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageTicket {
    pub page: u32,
    pub page_size: u32,
    pub generation: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageOutcome {
    Appended(usize),
    Exhausted,
    Failed,
    Stale,
}

#[derive(Clone, Debug)]
pub struct PaginationController {
    launches: Vec<Launch>,
    page: u32,
    page_size: u32,
    is_last_page: bool,
    in_flight: bool,
    generation: u64,
}

impl Default for PaginationController {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PaginationController {
    pub fn new(page_size: u32) -> Self {
        Self {
            launches: Vec::new(),
            page: 1,
            page_size: page_size.max(1),
            is_last_page: false,
            in_flight: false,
            generation: 0,
        }
    }

    pub fn launches(&self) -> &[Launch] {
        &self.launches
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    pub fn is_last_page(&self) -> bool {
        self.is_last_page
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Marks a fetch for the current page as in flight and returns its ticket.
    ///
    /// Returns `None` when the end of the data has been reached or another
    /// fetch is still outstanding.
    pub fn begin_next_page(&mut self) -> Option<PageTicket> {
        if self.is_last_page || self.in_flight {
            return None;
        }
        Some(self.issue())
    }

    /// Applies the result of a fetch previously issued by this controller.
    ///
    /// Results from a generation older than the current one are dropped and
    /// leave the in-flight flag to the replacement fetch.
    pub fn complete(
        &mut self,
        ticket: PageTicket,
        result: Result<Vec<Launch>, SourceError>,
    ) -> PageOutcome {
        if ticket.generation != self.generation {
            debug!(
                page = ticket.page,
                generation = ticket.generation,
                current = self.generation,
                "dropping stale launch page"
            );
            return PageOutcome::Stale;
        }
        self.in_flight = false;
        match result {
            Ok(launches) if launches.is_empty() => {
                debug!(page = ticket.page, "launch source exhausted");
                self.is_last_page = true;
                PageOutcome::Exhausted
            }
            Ok(launches) => {
                // duplicates across pages are kept as delivered
                let count = launches.len();
                self.launches.extend(launches);
                self.page += 1;
                PageOutcome::Appended(count)
            }
            Err(e) => {
                warn!(page = ticket.page, error = %e, "error loading launches");
                PageOutcome::Failed
            }
        }
    }

    /// Discards everything loaded so far and issues the fetch for page 1.
    pub fn reset(&mut self) -> PageTicket {
        self.launches.clear();
        self.page = 1;
        self.is_last_page = false;
        self.in_flight = false;
        self.generation += 1;
        self.issue()
    }

    pub async fn request_next_page(&mut self, source: &dyn RecordSource) -> Option<PageOutcome> {
        let ticket = self.begin_next_page()?;
        let result = source.fetch_page(ticket.page, ticket.page_size).await;
        Some(self.complete(ticket, result))
    }

    pub async fn reset_and_load(&mut self, source: &dyn RecordSource) -> PageOutcome {
        let ticket = self.reset();
        let result = source.fetch_page(ticket.page, ticket.page_size).await;
        self.complete(ticket, result)
    }

    fn issue(&mut self) -> PageTicket {
        self.in_flight = true;
        PageTicket {
            page: self.page,
            page_size: self.page_size,
            generation: self.generation,
        }
    }
}
