use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use futures::future::BoxFuture;

use crate::filter::{FilterState, StatusFilter};
use crate::launch::{Launch, LaunchLinks};
use crate::pagination::PageOutcome;
use crate::runner::{Options, Runner};
use crate::sentinel::{SentinelSignal, Viewport, FULL_VISIBILITY};
use crate::session::browse::{self, Step};
use crate::session::{LaunchList, ListEvent};
use crate::source::{RecordSource, SourceError, StaticSource};
use crate::view::ViewCommand;

fn launch(n: usize, name: &str, details: Option<&str>, success: Option<bool>) -> Launch {
    Launch {
        id: format!("launch-{n}"),
        name: name.to_string(),
        details: details.map(str::to_string),
        date_utc: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
            + chrono::Duration::days(n as i64),
        success,
        links: LaunchLinks::default(),
    }
}

fn catalogue(count: usize) -> Vec<Launch> {
    (0..count)
        .map(|n| launch(n, &format!("Mission {n}"), None, Some(n % 3 != 0)))
        .collect()
}

// pages are served in order; every call is counted
struct ScriptedSource {
    pages: Vec<Result<Vec<Launch>, u16>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    fn new(pages: Vec<Result<Vec<Launch>, u16>>) -> Self {
        Self {
            pages,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RecordSource for ScriptedSource {
    fn fetch_page(
        &self,
        page: u32,
        _page_size: u32,
    ) -> BoxFuture<'_, Result<Vec<Launch>, SourceError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = match self.pages.get(page as usize - 1) {
            Some(Ok(launches)) => Ok(launches.clone()),
            Some(Err(status)) => Err(SourceError::Status { status: *status }),
            None => Ok(Vec::new()),
        };
        Box::pin(async move { result })
    }
}

#[tokio::test]
async fn scrolling_loads_pages_until_an_empty_page() {
    let all = catalogue(24);
    let source = ScriptedSource::new(vec![
        Ok(all[..12].to_vec()),
        Ok(all[12..].to_vec()),
        Ok(Vec::new()),
    ]);
    let mut list = LaunchList::new(12);

    let ticket = list.start().unwrap();
    assert_eq!(list.load(ticket, &source).await, PageOutcome::Appended(12));
    assert_eq!(list.pagination().page(), 2);

    let ticket = list
        .handle(ListEvent::SentinelVisible(FULL_VISIBILITY))
        .unwrap();
    assert_eq!(ticket.page, 2);
    assert_eq!(list.load(ticket, &source).await, PageOutcome::Appended(12));
    assert_eq!(list.pagination().launches().len(), 24);

    let ticket = list
        .handle(ListEvent::SentinelVisible(FULL_VISIBILITY))
        .unwrap();
    assert_eq!(list.load(ticket, &source).await, PageOutcome::Exhausted);
    assert_eq!(list.pagination().launches().len(), 24);
    assert!(list.pagination().is_last_page());

    assert!(list
        .handle(ListEvent::SentinelVisible(FULL_VISIBILITY))
        .is_none());
    assert_eq!(source.calls(), 3);
}

#[tokio::test]
async fn sentinel_does_not_double_fetch_while_loading() {
    let source = ScriptedSource::new(vec![Ok(catalogue(12))]);
    let mut list = LaunchList::new(12);

    let ticket = list.start().unwrap();
    assert!(list
        .handle(ListEvent::SentinelVisible(FULL_VISIBILITY))
        .is_none());
    assert!(list
        .handle(ListEvent::SentinelVisible(FULL_VISIBILITY))
        .is_none());

    list.load(ticket, &source).await;
    assert_eq!(source.calls(), 1);
    assert_eq!(list.pagination().launches().len(), 12);
}

#[test]
fn partially_visible_sentinel_is_ignored() {
    let mut list = LaunchList::new(12);
    let ticket = list.start().unwrap();
    list.complete(ticket, Ok(catalogue(12)));

    assert!(list.handle(ListEvent::SentinelVisible(0.5)).is_none());
    assert!(list.handle(ListEvent::SentinelVisible(0.99)).is_none());
    assert!(list
        .handle(ListEvent::SentinelVisible(FULL_VISIBILITY))
        .is_some());
}

#[test]
fn search_matches_name_or_details_case_insensitively() {
    let mut list = LaunchList::new(12);
    let ticket = list.start().unwrap();
    list.complete(
        ticket,
        Ok(vec![
            launch(0, "Falcon 9 Test", None, Some(true)),
            launch(1, "Starlink-1", Some("Rode a FALCON booster"), Some(true)),
            launch(2, "Starlink-2", Some("nominal"), Some(false)),
        ]),
    );

    let ticket = list.handle(ListEvent::SearchChanged("falcon".to_string()));
    assert!(ticket.is_some());
    // a new search clears the list until the replacement page arrives
    assert!(list.visible().is_empty());

    list.complete(
        ticket.unwrap(),
        Ok(vec![
            launch(0, "Falcon 9 Test", None, Some(true)),
            launch(1, "Starlink-1", Some("Rode a FALCON booster"), Some(true)),
            launch(2, "Starlink-2", Some("nominal"), Some(false)),
        ]),
    );
    let names: Vec<&str> = list.visible().iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["Falcon 9 Test", "Starlink-1"]);
}

#[test]
fn status_filter_combines_with_search() {
    let launches = vec![
        launch(0, "Falcon 1", None, Some(false)),
        launch(1, "Falcon 9", None, Some(true)),
        launch(2, "Upcoming Falcon", None, None),
    ];
    let filter = FilterState::new("falcon", StatusFilter::Failed);
    let names: Vec<&str> = filter
        .apply(&launches)
        .iter()
        .map(|l| l.name.as_str())
        .collect();
    assert_eq!(names, vec!["Falcon 1", "Upcoming Falcon"]);
}

#[test]
fn stale_page_after_filter_change_is_dropped() {
    let mut list = LaunchList::new(12);
    let first = list.start().unwrap();

    let replacement = list
        .handle(ListEvent::StatusChanged(StatusFilter::Successful))
        .unwrap();
    assert_ne!(first.generation, replacement.generation);
    assert_eq!(replacement.page, 1);

    assert_eq!(
        list.complete(first, Ok(catalogue(12))),
        PageOutcome::Stale
    );
    assert!(list.pagination().launches().is_empty());
    assert!(list.pagination().is_loading());

    assert_eq!(
        list.complete(replacement, Ok(catalogue(6))),
        PageOutcome::Appended(6)
    );
    assert!(!list.pagination().is_loading());
    assert!(list
        .visible()
        .iter()
        .all(|l| l.success == Some(true)));
}

#[test]
fn filter_change_resets_state_before_the_fetch_resolves() {
    let mut list = LaunchList::new(12);
    let ticket = list.start().unwrap();
    list.complete(ticket, Ok(catalogue(12)));
    let ticket = list
        .handle(ListEvent::SentinelVisible(FULL_VISIBILITY))
        .unwrap();
    list.complete(ticket, Ok(Vec::new()));
    assert!(list.pagination().is_last_page());

    let ticket = list
        .handle(ListEvent::SearchChanged("mission".to_string()))
        .unwrap();
    assert_eq!(ticket.page, 1);
    assert!(list.pagination().launches().is_empty());
    assert!(!list.pagination().is_last_page());
    assert!(list.pagination().is_loading());
}

#[test]
fn unchanged_search_does_not_reset() {
    let mut list = LaunchList::new(12);
    let ticket = list.start().unwrap();
    list.complete(ticket, Ok(catalogue(12)));

    assert!(list.handle(ListEvent::SearchChanged(String::new())).is_none());
    assert!(list
        .handle(ListEvent::StatusChanged(StatusFilter::All))
        .is_none());
    assert_eq!(list.pagination().launches().len(), 12);
}

#[tokio::test]
async fn failed_page_keeps_the_page_number_for_the_next_attempt() {
    let source = ScriptedSource::new(vec![Ok(catalogue(12)), Err(503)]);
    let mut list = LaunchList::new(12);

    let ticket = list.start().unwrap();
    list.load(ticket, &source).await;
    let ticket = list
        .handle(ListEvent::SentinelVisible(FULL_VISIBILITY))
        .unwrap();
    assert_eq!(list.load(ticket, &source).await, PageOutcome::Failed);
    assert_eq!(list.pagination().page(), 2);
    assert!(!list.pagination().is_loading());
    assert!(!list.pagination().is_last_page());

    let retry = list
        .handle(ListEvent::SentinelVisible(FULL_VISIBILITY))
        .unwrap();
    assert_eq!(retry.page, 2);
}

#[test]
fn viewport_reaching_the_end_requests_the_next_page() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut viewport = Viewport::new(4);
    let sink = Arc::clone(&events);
    viewport.on_sentinel_visible(Box::new(move |ratio| {
        sink.lock().unwrap().push(ListEvent::SentinelVisible(ratio));
    }));

    let mut list = LaunchList::new(12);
    let ticket = list.start().unwrap();
    list.complete(ticket, Ok(catalogue(12)));
    viewport.set_items(list.visible().len());
    events.lock().unwrap().clear();

    while viewport.offset() + viewport.height() < viewport.item_rows() + 1 {
        viewport.page_down();
    }

    let mut tickets = Vec::new();
    for event in events.lock().unwrap().drain(..) {
        if let Some(ticket) = list.handle(event) {
            tickets.push(ticket);
        }
    }
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].page, 2);
}

#[tokio::test]
async fn runner_stops_after_max_pages() {
    let runner = Runner::new(Options {
        page_size: 12,
        max_pages: Some(2),
        ..Options::default()
    })
    .unwrap();
    let result = runner.run_with(&StaticSource::new(catalogue(30))).await;
    assert_eq!(result.pages_loaded, 2);
    assert_eq!(result.launches_loaded, 24);
    assert!(!result.exhausted);
    assert!(!result.interrupted);
}

#[tokio::test]
async fn runner_loads_everything_without_a_limit() {
    let runner = Runner::new(Options {
        page_size: 12,
        max_pages: None,
        ..Options::default()
    })
    .unwrap();
    let result = runner.run_with(&StaticSource::new(catalogue(30))).await;
    assert_eq!(result.pages_loaded, 3);
    assert_eq!(result.launches_loaded, 30);
    assert_eq!(result.visible.len(), 30);
    assert!(result.exhausted);
}

#[tokio::test]
async fn runner_applies_the_filter_to_the_result() {
    let runner = Runner::new(Options {
        page_size: 12,
        max_pages: None,
        status: StatusFilter::Failed,
        ..Options::default()
    })
    .unwrap();
    let result = runner.run_with(&StaticSource::new(catalogue(30))).await;
    assert_eq!(result.launches_loaded, 30);
    assert_eq!(result.visible.len(), 10);
}

#[tokio::test]
async fn runner_reports_an_interrupted_listing() {
    let source = ScriptedSource::new(vec![Ok(catalogue(12)), Err(500)]);
    let runner = Runner::new(Options {
        page_size: 12,
        max_pages: None,
        ..Options::default()
    })
    .unwrap();
    let result = runner.run_with(&source).await;
    assert!(result.interrupted);
    assert_eq!(result.launches_loaded, 12);
    assert_eq!(source.calls(), 2);
}

type SentinelQueue = Arc<Mutex<Vec<ListEvent>>>;

fn watched_viewport(rows: usize) -> (Viewport, SentinelQueue) {
    let queue: SentinelQueue = Arc::new(Mutex::new(Vec::new()));
    let mut viewport = Viewport::new(rows);
    let sink = Arc::clone(&queue);
    viewport.on_sentinel_visible(Box::new(move |ratio| {
        sink.lock().unwrap().push(ListEvent::SentinelVisible(ratio));
    }));
    (viewport, queue)
}

// runs fetches and queued sentinel events until nothing is left, returning
// how many pages were requested
async fn settle(
    list: &mut LaunchList,
    viewport: &mut Viewport,
    queue: &SentinelQueue,
    source: &dyn RecordSource,
    mut step: Step,
) -> usize {
    let mut fetches = 0;
    loop {
        if let Some(ticket) = step.fetch.take() {
            fetches += 1;
            let result = source.fetch_page(ticket.page, ticket.page_size).await;
            step = browse::on_event(list, viewport, ListEvent::PageLoaded { ticket, result });
            continue;
        }
        let pending: Vec<ListEvent> = queue.lock().unwrap().drain(..).collect();
        if pending.is_empty() {
            return fetches;
        }
        for event in pending {
            let next = browse::on_event(list, viewport, event);
            if next.fetch.is_some() {
                step = next;
            }
        }
    }
}

fn first_fetch(list: &mut LaunchList) -> Step {
    Step {
        fetch: list.start(),
        ..Step::default()
    }
}

#[tokio::test]
async fn filter_hiding_every_launch_keeps_loading_until_the_end() {
    let successful: Vec<Launch> = (0..12)
        .map(|n| launch(n, &format!("Starlink {n}"), None, Some(true)))
        .collect();
    let source = ScriptedSource::new(vec![
        Ok(successful.clone()),
        Ok(successful.clone()),
        Ok(successful),
        Ok(Vec::new()),
    ]);
    let mut list = LaunchList::with_filter(12, FilterState::new("", StatusFilter::Failed));
    let (mut viewport, queue) = watched_viewport(4);

    let step = first_fetch(&mut list);
    let fetches = settle(&mut list, &mut viewport, &queue, &source, step).await;

    assert_eq!(fetches, 4);
    assert_eq!(source.calls(), 4);
    assert!(list.pagination().is_last_page());
    assert_eq!(list.pagination().launches().len(), 36);
    assert!(list.visible().is_empty());
}

#[tokio::test]
async fn failed_page_waits_for_a_scroll_at_the_bottom() {
    let source = ScriptedSource::new(vec![Ok(catalogue(12)), Err(503)]);
    let mut list = LaunchList::new(12);
    let (mut viewport, queue) = watched_viewport(4);

    let step = first_fetch(&mut list);
    assert_eq!(settle(&mut list, &mut viewport, &queue, &source, step).await, 1);
    assert!(!viewport.is_sentinel_visible());

    while !viewport.is_sentinel_visible() {
        let step = browse::on_command(&mut list, &mut viewport, ViewCommand::PageDown);
        settle(&mut list, &mut viewport, &queue, &source, step).await;
    }
    assert_eq!(source.calls(), 2);
    assert_eq!(list.pagination().page(), 2);
    assert!(!list.pagination().is_loading());

    // nothing retries on its own
    let idle = settle(&mut list, &mut viewport, &queue, &source, Step::default()).await;
    assert_eq!(idle, 0);
    assert_eq!(source.calls(), 2);

    let step = browse::on_command(&mut list, &mut viewport, ViewCommand::PageDown);
    assert_eq!(settle(&mut list, &mut viewport, &queue, &source, step).await, 1);
    assert_eq!(source.calls(), 3);
}

#[tokio::test]
async fn search_change_scrolls_back_to_the_top() {
    let source = ScriptedSource::new(vec![Ok(catalogue(12))]);
    let mut list = LaunchList::new(12);
    let (mut viewport, queue) = watched_viewport(4);

    let step = first_fetch(&mut list);
    settle(&mut list, &mut viewport, &queue, &source, step).await;
    browse::on_command(&mut list, &mut viewport, ViewCommand::PageDown);
    browse::on_command(&mut list, &mut viewport, ViewCommand::PageDown);
    assert_eq!(viewport.offset(), 8);

    let step = browse::on_command(
        &mut list,
        &mut viewport,
        ViewCommand::Search("mission 1".to_string()),
    );
    assert_eq!(step.fetch.map(|t| t.page), Some(1));
    assert_eq!(viewport.offset(), 0);
    assert_eq!(viewport.item_rows(), 0);

    settle(&mut list, &mut viewport, &queue, &source, step).await;
    let names: Vec<&str> = list.visible().iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["Mission 1", "Mission 10", "Mission 11"]);
    assert_eq!(viewport.offset(), 0);
    assert!(list.pagination().is_last_page());
}

