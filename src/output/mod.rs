use serde::Serialize;

use crate::launch::Launch;
use crate::view::{self, CardStyle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputRecord {
    pub id: String,
    pub name: String,
    pub details: Option<String>,
    pub date_utc: String,
    pub launch_date: String,
    pub status: String,
    pub image: Option<String>,
}

pub fn build_records(launches: &[&Launch]) -> Vec<OutputRecord> {
    launches
        .iter()
        .map(|l| OutputRecord {
            id: l.id.clone(),
            name: l.name.clone(),
            details: l.details.clone(),
            date_utc: l.date_utc.to_rfc3339(),
            launch_date: view::format_launch_date(&l.date_utc),
            status: l.outcome().label().to_string(),
            image: l.image().map(|s| s.to_string()),
        })
        .collect()
}

// same card layout as the interactive view, without colour
pub fn render_text(launches: &[&Launch]) -> Vec<u8> {
    let style = CardStyle::default();
    let mut out = String::new();
    for launch in launches {
        out.push_str(&view::render_card(launch, &style));
        out.push('\n');
    }
    out.into_bytes()
}

pub fn render_json(records: &[OutputRecord]) -> Vec<u8> {
    serde_json::to_vec_pretty(records).unwrap_or_else(|_| b"[]\n".to_vec())
}

pub fn render(format: OutputFormat, launches: &[&Launch]) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(launches),
        OutputFormat::Json => render_json(&build_records(launches)),
    }
}
