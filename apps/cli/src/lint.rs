//! Example plugin: report every regex match, line by line.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use eloquent_core::{Eloquent, FileDictionary, Plugin, PluginResult};
use regex::Regex;

/// Characters of context shown on each side of a match.
const SNIPPET_RADIUS: usize = 10;

/// Prints a message for each match of `pattern` in every file line.
pub(crate) struct LintPlugin {
    pattern: Regex,
    deny: bool,
    findings: AtomicUsize,
}

impl LintPlugin {
    pub(crate) fn new(pattern: Regex, deny: bool) -> Self {
        Self {
            pattern,
            deny,
            findings: AtomicUsize::new(0),
        }
    }

    /// Matches reported so far.
    pub(crate) fn findings(&self) -> usize {
        self.findings.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Plugin for LintPlugin {
    fn name(&self) -> &str {
        "lint"
    }

    async fn run(&self, files: &mut FileDictionary, eloquent: &Eloquent) -> PluginResult {
        let mut found = 0;
        for (file_name, record) in files.iter() {
            for (index, line) in record.lines.iter().enumerate() {
                for m in self.pattern.find_iter(line) {
                    let column = line[..m.start()].chars().count();
                    let message = format!(
                        "found '{}' in: {}",
                        self.pattern.as_str(),
                        snippet(line, column)
                    );
                    eloquent.print_message(file_name, index + 1, column + 1, &message);
                    found += 1;
                }
            }
        }
        self.findings.fetch_add(found, Ordering::Relaxed);

        if self.deny && found > 0 {
            return Err(format!("{found} lint finding(s) for '{}'", self.pattern.as_str()).into());
        }
        Ok(())
    }
}

/// Up to `SNIPPET_RADIUS` characters either side of char offset `column`.
fn snippet(line: &str, column: usize) -> String {
    let start = column.saturating_sub(SNIPPET_RADIUS);
    line.chars()
        .skip(start)
        .take(column + SNIPPET_RADIUS - start)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use eloquent_core::{FileRecord, MemorySink};

    fn files() -> FileDictionary {
        let mut files = FileDictionary::new();
        files.insert("a.md".into(), FileRecord::from_text("hello there"));
        files.insert("b.md".into(), FileRecord::from_text("xyz"));
        files
    }

    fn builder(sink: Arc<MemorySink>) -> Eloquent {
        let mut eloquent = Eloquent::new(".").unwrap();
        eloquent.set_message_sink(sink);
        eloquent
    }

    #[test]
    fn snippet_is_clamped_to_line() {
        assert_eq!(snippet("hello", 1), "hello");
        assert_eq!(snippet("0123456789abcdefghijXYZ", 20), "abcdefghijXYZ");
    }

    #[tokio::test]
    async fn reports_each_match_with_position() {
        let sink = Arc::new(MemorySink::new());
        let eloquent = builder(sink.clone());
        let plugin = LintPlugin::new(Regex::new("e").unwrap(), false);

        plugin.run(&mut files(), &eloquent).await.unwrap();

        let positions: Vec<(String, usize, usize)> = sink
            .messages()
            .into_iter()
            .map(|m| (m.file, m.line, m.column))
            .collect();
        assert_eq!(
            positions,
            vec![
                ("a.md".to_string(), 1, 2),
                ("a.md".to_string(), 1, 9),
                ("a.md".to_string(), 1, 11),
            ]
        );
        assert_eq!(plugin.findings(), 3);
    }

    #[tokio::test]
    async fn deny_turns_findings_into_an_error() {
        let sink = Arc::new(MemorySink::new());
        let eloquent = builder(sink);
        let plugin = LintPlugin::new(Regex::new("xyz").unwrap(), true);

        let err = plugin.run(&mut files(), &eloquent).await.unwrap_err();
        assert!(err.to_string().contains("1 lint finding"));
    }
}
