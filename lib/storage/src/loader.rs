// JSON-lines record source
use cograph_core::{RecordSource, Result, SourceStats, TaggedRecord};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Replays a `.jsonl` file, one [`TaggedRecord`] per line.
///
/// `tags` may be a JSON array or a delimited string. Blank lines are ignored;
/// lines that fail to decode are counted as malformed and never reach the
/// visitor. The file is reopened on every scan.
#[derive(Debug, Clone)]
pub struct JsonLinesSource {
    path: PathBuf,
}

impl JsonLinesSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for JsonLinesSource {
    fn scan(&self, visit: &mut dyn FnMut(&TaggedRecord)) -> Result<SourceStats> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut stats = SourceStats::default();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<TaggedRecord>(line) {
                Ok(record) => {
                    stats.rows_read += 1;
                    visit(&record);
                }
                Err(e) => {
                    stats.rows_malformed += 1;
                    tracing::debug!(path = %self.path.display(), line = lineno + 1, error = %e, "malformed record");
                }
            }
        }
        if stats.rows_malformed > 0 {
            tracing::warn!(
                path = %self.path.display(),
                malformed = stats.rows_malformed,
                "skipped malformed lines"
            );
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_lines(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_reads_arrays_and_delimited_tags() {
        let file = write_lines(&[
            r#"{"id": "r1", "tags": ["Rock", "pop"], "timestamp": 10}"#,
            "",
            r#"{"id": "r2", "tags": "jazz | blues"}"#,
        ]);
        let source = JsonLinesSource::new(file.path());
        let mut seen = Vec::new();
        let stats = source.scan(&mut |r| seen.push((r.id.clone(), r.tags.clone()))).unwrap();
        assert_eq!(stats.rows_read, 2);
        assert_eq!(stats.rows_malformed, 0);
        assert_eq!(seen[0].0, "r1");
        assert_eq!(seen[1].1, vec!["jazz", "blues"]);
    }

    #[test]
    fn test_malformed_lines_are_counted() {
        let file = write_lines(&[r#"{"id": "r1", "tags": ["a"]}"#, "{broken", r#"{"tags": ["no id"]}"#]);
        let source = JsonLinesSource::new(file.path());
        let mut count = 0;
        let stats = source.scan(&mut |_| count += 1).unwrap();
        assert_eq!(count, 1);
        assert_eq!(stats.rows_malformed, 2);
    }

    #[test]
    fn test_scan_is_repeatable() {
        let file = write_lines(&[r#"{"id": "r1", "tags": ["a", "b"]}"#]);
        let source = JsonLinesSource::new(file.path());
        for _ in 0..2 {
            assert_eq!(source.scan(&mut |_| {}).unwrap().rows_read, 1);
        }
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let source = JsonLinesSource::new("/nonexistent/cograph.jsonl");
        assert!(matches!(source.scan(&mut |_| {}), Err(cograph_core::Error::Io(_))));
    }
}
