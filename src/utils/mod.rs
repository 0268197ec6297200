use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use url::Url;

static VIDEO_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:v=|youtu\.be/|embed/|watch\?v=)([a-zA-Z0-9_-]{11})")
        .expect("video id pattern is valid")
});

/// Extract the 11-character YouTube video id from a watch, short or embed URL
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Rewrite any recognised YouTube URL to `https://youtube.com/watch?v=<id>`.
/// Unrecognised input is returned unchanged.
pub fn normalize_youtube_url(url: &str) -> String {
    match extract_video_id(url) {
        Some(id) => format!("https://youtube.com/watch?v={}", id),
        None => url.to_string(),
    }
}

/// Short identifier for naming output files
pub fn video_label(url: &str) -> String {
    if let Some(id) = extract_video_id(url) {
        return id;
    }

    // Fall back to the `v` query parameter or the last path segment
    let from_url = Url::parse(url).ok().and_then(|parsed| {
        parsed
            .query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.into_owned())
            .or_else(|| {
                parsed
                    .path_segments()
                    .and_then(|mut segments| segments.next_back().map(str::to_string))
            })
            .filter(|s| !s.is_empty())
    });

    let label = sanitize_filename(&from_url.unwrap_or_else(|| url.to_string()));
    if label.is_empty() {
        "video".to_string()
    } else {
        label
    }
}

/// Default report path for a video: `timestamps_<id>.txt`
pub fn default_output_path(url: &str) -> PathBuf {
    PathBuf::from(format!("timestamps_{}.txt", video_label(url)))
}

/// Sanitize filename for safe filesystem usage
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            match c {
                // Keep alphanumeric characters, hyphens and underscores
                c if c.is_alphanumeric() || c == '-' || c == '_' => c,
                _ => '_',
            }
        })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}

/// URLs from a batch file: one per line, blank lines and `#` comments skipped
pub fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(normalize_youtube_url)
        .collect()
}

/// Mask a secret for display, keeping only the last four characters
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}
