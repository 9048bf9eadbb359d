//! Link-list parsing: one `<url> <destination>` pair per line.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// One (source URL, destination filename) pair to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadItem {
    pub source: String,
    pub destination_name: String,
}

impl DownloadItem {
    pub fn new(source: impl Into<String>, destination_name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination_name: destination_name.into(),
        }
    }
}

/// Producer of the ordered list of items for one batch.
pub trait LinkSource {
    fn items(&self) -> Result<Vec<DownloadItem>>;
}

/// Link list stored in a UTF-8 text file.
#[derive(Debug, Clone)]
pub struct LinkFile {
    path: PathBuf,
}

impl LinkFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LinkSource for LinkFile {
    fn items(&self) -> Result<Vec<DownloadItem>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read link list {}", self.path.display()))?;
        Ok(parse_links(&text))
    }
}

/// Parses a line of the form `\S+\s+\S+` (the whole line, nothing else).
///
/// Lines with leading/trailing whitespace, a single token, or more than two
/// tokens are rejected.
pub fn parse_line(line: &str) -> Option<DownloadItem> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.is_empty()
        || line.starts_with(char::is_whitespace)
        || line.ends_with(char::is_whitespace)
    {
        return None;
    }
    let mut tokens = line.split_whitespace();
    let source = tokens.next()?;
    let destination_name = tokens.next()?;
    if tokens.next().is_some() {
        return None;
    }
    Some(DownloadItem::new(source, destination_name))
}

/// Parses every well-formed line, silently skipping the rest. Input order is kept.
pub fn parse_links(text: &str) -> Vec<DownloadItem> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let item = parse_line(line);
            if item.is_none() && !line.trim().is_empty() {
                tracing::debug!(line = idx + 1, "skipping malformed link line");
            }
            item
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_line() {
        assert_eq!(
            parse_line("https://example.com/a.txt  a.txt"),
            Some(DownloadItem::new("https://example.com/a.txt", "a.txt"))
        );
        assert_eq!(
            parse_line("http://h/x\tx.bin"),
            Some(DownloadItem::new("http://h/x", "x.bin"))
        );
    }

    #[test]
    fn single_token_is_skipped() {
        assert_eq!(parse_line("onlyoneurl"), None);
    }

    #[test]
    fn extra_tokens_and_padding_are_skipped() {
        assert_eq!(parse_line("http://a b c"), None);
        assert_eq!(parse_line(" http://a b"), None);
        assert_eq!(parse_line("http://a b "), None);
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("   "), None);
    }

    #[test]
    fn crlf_line_endings() {
        let items = parse_links("http://a/1 one.txt\r\nhttp://a/2 two.txt\r\n");
        assert_eq!(
            items,
            vec![
                DownloadItem::new("http://a/1", "one.txt"),
                DownloadItem::new("http://a/2", "two.txt"),
            ]
        );
    }

    #[test]
    fn parse_links_keeps_order_and_skips_bad_lines() {
        let text = "http://a/1 one\nonlyoneurl\n\nhttp://a/2 two\nhttp://a/3 three extra\n";
        let items = parse_links(text);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].destination_name, "one");
        assert_eq!(items[1].destination_name, "two");
    }

    #[test]
    fn link_file_reads_items() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.txt");
        std::fs::write(&path, "http://x/a a.bin\nbroken\n").unwrap();
        let items = LinkFile::new(&path).items().unwrap();
        assert_eq!(items, vec![DownloadItem::new("http://x/a", "a.bin")]);
    }

    #[test]
    fn missing_link_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LinkFile::new(dir.path().join("nope.txt")).items().unwrap_err();
        assert!(format!("{:#}", err).contains("nope.txt"));
    }
}
