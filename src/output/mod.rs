use serde_json::{Map, Value};
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::analyzer::BatchItem;
use crate::response::TimestampEntry;
use crate::{Result, TimestamperError};

pub mod formatters;

pub use formatters::*;

/// Both renderings of one analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedOutput {
    /// Human-readable report
    pub report: String,

    /// JSON array of the same entries
    pub json: String,
}

/// Where [`persist`] wrote the pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedPaths {
    pub text: PathBuf,
    pub json: PathBuf,
}

/// Render entries as a report and as JSON
pub fn format_output(entries: &[TimestampEntry]) -> Result<FormattedOutput> {
    Ok(FormattedOutput {
        report: format_report(entries),
        json: format_as_json(entries)?,
    })
}

/// Write `<base>.txt` and `<base>.json`.
///
/// A trailing `.txt` or `.json` on `base_path` is replaced; any other suffix is kept, so
/// `results.v2` becomes `results.v2.txt`. Each file is replaced atomically, but the pair is
/// not: a crash between the two writes leaves the text report newer than the JSON.
pub fn persist(output: &FormattedOutput, base_path: &Path) -> Result<PersistedPaths> {
    let stem = report_stem(base_path);
    let paths = PersistedPaths {
        text: with_suffix(&stem, ".txt"),
        json: with_suffix(&stem, ".json"),
    };

    write_atomic(&paths.text, &output.report)?;
    write_atomic(&paths.json, &output.json)?;

    tracing::info!(
        "Saved to {} and {}",
        paths.text.display(),
        paths.json.display()
    );

    Ok(paths)
}

/// Write all batch results to a single JSON object keyed by video id
pub fn save_batch(items: &[BatchItem], path: &Path) -> Result<()> {
    let mut combined = Map::new();
    for item in items {
        combined.insert(
            item.video_id.clone(),
            serde_json::to_value(item.analysis.entries())?,
        );
    }

    let content = serde_json::to_string_pretty(&Value::Object(combined))?;

    write_atomic(path, &content)
}

fn report_stem(base_path: &Path) -> PathBuf {
    let ours = base_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("txt") || ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if ours {
        base_path.with_extension("")
    } else {
        base_path.to_path_buf()
    }
}

fn with_suffix(stem: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(stem.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Print the report to the console
pub fn print_to_console(output: &FormattedOutput) {
    println!("{}", output.report);
}

/// Write through a temp file in the target directory, then rename over the target
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let to_error = |source: std::io::Error| TimestamperError::Persistence {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs_err::create_dir_all(dir).map_err(to_error)?;

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(to_error)?;
    file.write_all(content.as_bytes()).map_err(to_error)?;
    file.as_file().sync_all().map_err(to_error)?;

    // Temp files are created 0600; reports are ordinary user files
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(to_error)?;
    }

    file.persist(path).map_err(|e| to_error(e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{parse_entries, Analysis};

    fn sample_entries() -> Vec<TimestampEntry> {
        vec![
            TimestampEntry {
                timestamp: "00:00:00".to_string(),
                description: "Intro so long it deserves its own intro".to_string(),
            },
            TimestampEntry {
                timestamp: "01:00:00".to_string(),
                description: "Bug found, bug fixed, three new bugs born".to_string(),
            },
        ]
    }

    #[test]
    fn test_format_empty_output() {
        let output = format_output(&[]).unwrap();
        assert!(output.report.contains("🎬 Video Timestamps"));
        assert!(output.report.contains("Generated on"));
        assert_eq!(output.json, "[]");
    }

    #[test]
    fn test_persist_writes_txt_and_json_pair() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("foo.txt");
        let entries = sample_entries();
        let output = format_output(&entries).unwrap();

        let paths = persist(&output, &base).unwrap();
        assert_eq!(paths.text, dir.path().join("foo.txt"));
        assert_eq!(paths.json, dir.path().join("foo.json"));

        let mut names: Vec<String> = fs_err::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, ["foo.json", "foo.txt"]);

        // Same entries in both files
        let json_entries = parse_entries(&fs_err::read_to_string(&paths.json).unwrap()).unwrap();
        assert_eq!(json_entries, entries);

        let text = fs_err::read_to_string(&paths.text).unwrap();
        for entry in &entries {
            assert!(text.contains(&format!("{} - {}", entry.timestamp, entry.description)));
        }
    }

    #[test]
    fn test_persist_base_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let output = format_output(&sample_entries()).unwrap();

        let paths = persist(&output, &dir.path().join("nested").join("report")).unwrap();
        assert!(paths.text.ends_with("nested/report.txt"));
        assert!(paths.json.ends_with("nested/report.json"));
        assert!(paths.text.exists());
        assert!(paths.json.exists());
    }

    #[test]
    fn test_persist_keeps_foreign_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let output = format_output(&sample_entries()).unwrap();

        let paths = persist(&output, &dir.path().join("results.v2")).unwrap();
        assert_eq!(paths.text, dir.path().join("results.v2.txt"));
        assert_eq!(paths.json, dir.path().join("results.v2.json"));

        let paths = persist(&output, &dir.path().join("episode.1.JSON")).unwrap();
        assert_eq!(paths.text, dir.path().join("episode.1.txt"));
        assert_eq!(paths.json, dir.path().join("episode.1.json"));
    }

    #[cfg(unix)]
    #[test]
    fn test_persisted_files_are_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let output = format_output(&sample_entries()).unwrap();
        let paths = persist(&output, &dir.path().join("report")).unwrap();

        for path in [&paths.text, &paths.json] {
            let mode = fs_err::metadata(path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o644, "{}", path.display());
        }
    }

    #[test]
    fn test_persist_failure_is_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs_err::write(&blocker, "not a directory").unwrap();

        let output = format_output(&sample_entries()).unwrap();
        let result = persist(&output, &blocker.join("foo.txt"));
        assert!(matches!(result, Err(TimestamperError::Persistence { .. })));
    }

    #[test]
    fn test_save_batch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch_timestamps.json");

        let items = vec![
            BatchItem {
                url: "https://youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
                video_id: "dQw4w9WgXcQ".to_string(),
                analysis: Analysis::Complete(sample_entries()),
            },
            BatchItem {
                url: "https://youtube.com/watch?v=AAAAAAAAAAA".to_string(),
                video_id: "AAAAAAAAAAA".to_string(),
                analysis: Analysis::Failed(TimestamperError::UpstreamCall("boom".to_string())),
            },
        ];

        save_batch(&items, &path).unwrap();

        let saved: Value = serde_json::from_str(&fs_err::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["dQw4w9WgXcQ"].as_array().unwrap().len(), 2);
        assert_eq!(saved["AAAAAAAAAAA"], Value::Array(vec![]));
    }
}
