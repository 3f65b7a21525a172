use crate::pagination::{PageOutcome, PageTicket};
use crate::session::{LaunchList, ListEvent};
use crate::sentinel::Viewport;
use crate::view::ViewCommand;

/// What the terminal has to do after the list and viewport took a step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Step {
    pub fetch: Option<PageTicket>,
    pub redraw: bool,
    pub failed: bool,
}

impl Step {
    fn fetch(ticket: Option<PageTicket>) -> Self {
        Self {
            fetch: ticket,
            ..Self::default()
        }
    }

    fn redraw() -> Self {
        Self {
            redraw: true,
            ..Self::default()
        }
    }
}

/// Applies a list event and keeps the viewport in step with the visible set.
///
/// A loaded page re-observes the sentinel, so a sentinel that is still in
/// view after the load asks for the next page. A failed page does not.
pub fn on_event(list: &mut LaunchList, viewport: &mut Viewport, event: ListEvent) -> Step {
    match event {
        ListEvent::PageLoaded { ticket, result } => match list.complete(ticket, result) {
            PageOutcome::Stale => Step::default(),
            PageOutcome::Failed => Step {
                failed: true,
                ..Step::default()
            },
            PageOutcome::Appended(_) | PageOutcome::Exhausted => {
                viewport.set_items(list.visible().len());
                viewport.reobserve();
                Step::redraw()
            }
        },
        other => on_filter_or_sentinel(list, viewport, other),
    }
}

/// Applies the scrolling and filtering commands. Other commands are left to
/// the caller and produce an empty step.
pub fn on_command(list: &mut LaunchList, viewport: &mut Viewport, command: ViewCommand) -> Step {
    match command {
        ViewCommand::Search(query) => {
            on_filter_or_sentinel(list, viewport, ListEvent::SearchChanged(query))
        }
        ViewCommand::Filter(status) => {
            on_filter_or_sentinel(list, viewport, ListEvent::StatusChanged(status))
        }
        ViewCommand::PageDown => {
            let before = viewport.offset();
            viewport.page_down();
            // scrolling at the very bottom checks the sentinel again
            if viewport.offset() == before && viewport.is_sentinel_visible() {
                viewport.reobserve();
            }
            Step::redraw()
        }
        ViewCommand::PageUp => {
            viewport.page_up();
            Step::redraw()
        }
        ViewCommand::Logout | ViewCommand::Quit | ViewCommand::Help => Step::default(),
    }
}

fn on_filter_or_sentinel(list: &mut LaunchList, viewport: &mut Viewport, event: ListEvent) -> Step {
    let resets = matches!(
        event,
        ListEvent::SearchChanged(_) | ListEvent::StatusChanged(_)
    );
    let ticket = list.handle(event);
    if resets && ticket.is_some() {
        viewport.set_items(list.visible().len());
        viewport.scroll_to(0);
    }
    Step::fetch(ticket)
}
