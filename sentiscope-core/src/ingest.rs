use std::fs;
use std::path::Path;

use crate::error::AnalysisError;
use crate::error::Result;

/// Read one or more plain-text files and concatenate their contents with
/// newline separators.
///
/// Read failures are collected across all files and reported as one
/// aggregated error; any failure fails the whole ingestion so the caller
/// can reset its selected-file indicator.
pub fn read_batch_files<P: AsRef<Path>>(paths: &[P]) -> Result<String> {
    let mut contents = Vec::with_capacity(paths.len());
    let mut failures = Vec::new();

    for path in paths {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => contents.push(text),
            Err(err) => failures.push(format!("{}: {err}", path.display())),
        }
    }

    if !failures.is_empty() {
        return Err(AnalysisError::FileRead(failures.join("; ")));
    }

    Ok(contents.join("\n"))
}

/// Split raw input into batch entries: one per non-blank line, trimmed.
pub fn split_batch(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn concatenates_files_with_newline_separators() {
        let tmp = TempDir::new().unwrap();
        let first = tmp.path().join("reviews_a.txt");
        let second = tmp.path().join("reviews_b.txt");
        fs::write(&first, "great stuff").unwrap();
        fs::write(&second, "terrible stuff").unwrap();

        let combined = read_batch_files(&[&first, &second]).unwrap();
        assert_eq!(combined, "great stuff\nterrible stuff");
        assert_eq!(split_batch(&combined).len(), 2);
    }

    #[test]
    fn read_failures_aggregate_into_one_message() {
        let tmp = TempDir::new().unwrap();
        let good = tmp.path().join("present.txt");
        let mut file = fs::File::create(&good).unwrap();
        writeln!(file, "fine").unwrap();
        let missing_a = tmp.path().join("missing_a.txt");
        let missing_b = tmp.path().join("missing_b.txt");

        let err = read_batch_files(&[&good, &missing_a, &missing_b]).unwrap_err();

        let message = err.to_string();
        assert!(matches!(err, AnalysisError::FileRead(_)));
        assert!(message.contains("missing_a.txt"));
        assert!(message.contains("missing_b.txt"));
    }

    #[test]
    fn split_batch_trims_and_drops_blank_lines() {
        let lines = split_batch("  first entry \n\n\t\nsecond entry\n   ");
        assert_eq!(lines, vec!["first entry".to_string(), "second entry".to_string()]);

        assert!(split_batch("\n  \n").is_empty());
    }
}
