use std::ops::Range;

use chrono::{DateTime, Utc};
use colored::Colorize;
use regex::{Regex, RegexBuilder};

use crate::filter::{normalize_query, StatusFilter};
use crate::launch::{Launch, Outcome};
use crate::session::ListView;

pub const DETAILS_MAX_CHARS: usize = 100;

pub fn truncate_text(text: Option<&str>, max_len: usize) -> String {
    let text = match text {
        Some(text) if !text.is_empty() => text,
        _ => return "Not available".to_string(),
    };
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let head: String = text.chars().take(max_len).collect();
    format!("{head}...")
}

pub fn format_launch_date(date: &DateTime<Utc>) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

pub fn highlight_pattern(query: &str) -> Option<Regex> {
    let query = normalize_query(query);
    if query.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
        .ok()
}

#[derive(Clone, Debug, Default)]
pub struct CardStyle {
    pub color: bool,
    pub highlight: Option<Regex>,
}

impl CardStyle {
    pub fn new(color: bool, query: &str) -> Self {
        Self {
            color,
            highlight: if color {
                highlight_pattern(query)
            } else {
                None
            },
        }
    }
}

fn highlight(text: &str, style: &CardStyle) -> String {
    match style.highlight.as_ref() {
        Some(re) => re
            .replace_all(text, |caps: &regex::Captures| {
                caps[0].bold().yellow().to_string()
            })
            .into_owned(),
        None => text.to_string(),
    }
}

fn status_label(outcome: Outcome, color: bool) -> String {
    let label = outcome.label();
    if !color {
        return label.to_string();
    }
    match outcome {
        Outcome::Succeeded => label.green().to_string(),
        Outcome::Failed => label.red().to_string(),
    }
}

pub fn render_card(launch: &Launch, style: &CardStyle) -> String {
    let name = highlight(&launch.name, style);
    let name = if style.color {
        name.bold().white().to_string()
    } else {
        name
    };
    let details = highlight(
        &truncate_text(launch.details.as_deref(), DETAILS_MAX_CHARS),
        style,
    );

    let mut out = String::new();
    out.push_str(&name);
    out.push('\n');
    out.push_str(&format!("  Details: {details}\n"));
    out.push_str(&format!(
        "  Launch Date: {}\n",
        format_launch_date(&launch.date_utc)
    ));
    out.push_str(&format!(
        "  Status: {}\n",
        status_label(launch.outcome(), style.color)
    ));
    if let Some(image) = launch.image() {
        out.push_str(&format!("  Patch: {image}\n"));
    }
    out
}

pub fn render_footer(is_loading: bool, is_last_page: bool, color: bool) -> Option<String> {
    let text = if is_loading {
        "Loading..."
    } else if is_last_page {
        "End of launches"
    } else {
        return None;
    };
    if color {
        Some(text.dimmed().to_string())
    } else {
        Some(text.to_string())
    }
}

pub fn render_header(view: &ListView<'_>, range: &Range<usize>, color: bool) -> String {
    let total = view.launches.len();
    let shown = if range.is_empty() {
        format!("0 of {total}")
    } else {
        format!("{}-{} of {total}", range.start + 1, range.end)
    };
    let mut line = format!(":: Launches {shown} :: {}", view.status.label());
    if !view.query.is_empty() {
        line.push_str(&format!(" :: search \"{}\"", view.query));
    }
    line.push_str(" ::");
    if color {
        line.bold().cyan().to_string()
    } else {
        line
    }
}

/// Renders the slice of the list that is in view, and the sentinel footer
/// when the end of the list is on screen.
pub fn render_window(
    view: &ListView<'_>,
    range: Range<usize>,
    sentinel_visible: bool,
    style: &CardStyle,
) -> String {
    let end = range.end.min(view.launches.len());
    let range = range.start.min(end)..end;
    let mut out = render_header(view, &range, style.color);
    out.push('\n');
    for launch in view.launches[range].iter() {
        out.push('\n');
        out.push_str(&render_card(launch, style));
    }
    if sentinel_visible {
        if let Some(footer) = render_footer(view.is_loading, view.is_last_page, style.color) {
            out.push('\n');
            out.push_str(&footer);
            out.push('\n');
        }
    }
    out
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewCommand {
    Search(String),
    Filter(StatusFilter),
    PageDown,
    PageUp,
    Logout,
    Quit,
    Help,
}

pub fn parse_command(line: &str) -> Result<ViewCommand, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ViewCommand::PageDown);
    }
    if let Some(query) = line.strip_prefix('/') {
        return Ok(ViewCommand::Search(query.trim().to_string()));
    }
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    match head.to_lowercase().as_str() {
        "search" | "s" => Ok(ViewCommand::Search(rest.to_string())),
        "filter" | "f" => rest
            .parse::<StatusFilter>()
            .map(ViewCommand::Filter)
            .map_err(|e| format!("invalid filter: {e}")),
        "more" | "j" | "down" => Ok(ViewCommand::PageDown),
        "k" | "up" => Ok(ViewCommand::PageUp),
        "logout" => Ok(ViewCommand::Logout),
        "q" | "quit" | "exit" => Ok(ViewCommand::Quit),
        "help" | "h" | "?" => Ok(ViewCommand::Help),
        other => Err(format!("unknown command '{other}', type help for usage")),
    }
}

pub fn help_text() -> &'static str {
    r#"Commands:
  <enter>, more, j        scroll down (loads more launches at the end)
  k, up                   scroll up
  /<text>, search <text>  search names and details (empty clears)
  filter <status>         all, successful or failed
  logout                  forget the login token and leave
  q, quit                 leave"#
}
