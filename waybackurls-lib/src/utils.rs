//! Helpers for reading targets.

use std::io::BufRead;

/// Read targets from a line-oriented reader.
///
/// Surrounding whitespace is trimmed and blank lines are skipped; nothing
/// else is validated, since sources accept free-form domains and URLs.
/// Reading stops at the first I/O error, keeping what was read so far.
pub fn read_targets<R: BufRead>(reader: R) -> (Vec<String>, Option<std::io::Error>) {
    let mut targets = Vec::new();

    for line in reader.lines() {
        match line {
            Ok(line) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    targets.push(trimmed.to_string());
                }
            }
            Err(e) => return (targets, Some(e)),
        }
    }

    (targets, None)
}
