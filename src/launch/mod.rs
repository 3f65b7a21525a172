use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
}

impl Outcome {
    pub fn label(self) -> &'static str {
        match self {
            Outcome::Succeeded => "Successful",
            Outcome::Failed => "Failed",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct PatchLinks {
    #[serde(default)]
    pub small: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct LaunchLinks {
    #[serde(default)]
    pub patch: PatchLinks,
}

// a single launch as returned by the v4 launches/query endpoint.
// records are never mutated after decoding.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Launch {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub details: Option<String>,
    pub date_utc: DateTime<Utc>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub links: LaunchLinks,
}

impl Launch {
    // upcoming launches carry a null success flag, those count as failed
    pub fn outcome(&self) -> Outcome {
        if self.success.unwrap_or(false) {
            Outcome::Succeeded
        } else {
            Outcome::Failed
        }
    }

    pub fn image(&self) -> Option<&str> {
        self.links.patch.small.as_deref()
    }
}
