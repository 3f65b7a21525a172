use std::fmt;
use std::str::FromStr;

use crate::launch::{Launch, Outcome};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Successful,
    Failed,
}

impl StatusFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Successful => "successful",
            StatusFilter::Failed => "failed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All Launches",
            StatusFilter::Successful => "Successful Launches",
            StatusFilter::Failed => "Failed Launches",
        }
    }

    pub fn admits(self, outcome: Outcome) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Successful => outcome == Outcome::Succeeded,
            StatusFilter::Failed => outcome == Outcome::Failed,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "successful" | "succeeded" | "success" => Ok(Self::Successful),
            "failed" | "failure" => Ok(Self::Failed),
            other => Err(format!(
                "unknown status filter '{other}', expected all, successful or failed"
            )),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterState {
    pub query: String,
    pub status: StatusFilter,
}

impl FilterState {
    pub fn new(query: impl Into<String>, status: StatusFilter) -> Self {
        Self {
            query: query.into(),
            status,
        }
    }

    pub fn apply<'a>(&self, launches: &'a [Launch]) -> Vec<&'a Launch> {
        filter_launches(launches, &self.query, self.status)
    }
}

// surrounding whitespace is not part of a search, for matching or highlighting
pub fn normalize_query(query: &str) -> &str {
    query.trim()
}

pub fn matches(launch: &Launch, query: &str, status: StatusFilter) -> bool {
    matches_lowered(launch, &normalize_query(query).to_lowercase(), status)
}

fn matches_lowered(launch: &Launch, query: &str, status: StatusFilter) -> bool {
    let in_name = launch.name.to_lowercase().contains(query);
    let in_details = launch
        .details
        .as_deref()
        .map(|d| d.to_lowercase().contains(query))
        .unwrap_or(false);
    (in_name || in_details) && status.admits(launch.outcome())
}

/// Returns the launches whose name or details contain `query`
/// (case-insensitive) and whose outcome is admitted by `status`, in their
/// original order.
pub fn filter_launches<'a>(
    launches: &'a [Launch],
    query: &str,
    status: StatusFilter,
) -> Vec<&'a Launch> {
    let query = normalize_query(query).to_lowercase();
    launches
        .iter()
        .filter(|l| matches_lowered(l, &query, status))
        .collect()
}
