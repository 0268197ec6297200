use chrono::{DateTime, Local};

use crate::response::TimestampEntry;
use crate::Result;

const BANNER_WIDTH: usize = 50;

/// Human-readable report with a header banner, one line per entry and a generation footer
pub fn format_report_at(entries: &[TimestampEntry], generated_at: DateTime<Local>) -> String {
    let rule = "=".repeat(BANNER_WIDTH);
    let mut lines = vec![format!("🎬 Video Timestamps\n{}\n", rule)];

    for entry in entries {
        lines.push(format!("{} - {}", entry.timestamp, entry.description));
    }

    lines.push(format!("\n{}", rule));
    lines.push(format!(
        "Generated on {}",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));

    lines.join("\n")
}

pub fn format_report(entries: &[TimestampEntry]) -> String {
    format_report_at(entries, Local::now())
}

/// Pretty JSON array of the entries
pub fn format_as_json(entries: &[TimestampEntry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}
