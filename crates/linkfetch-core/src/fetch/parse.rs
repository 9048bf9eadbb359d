//! Parse HTTP response header lines into a HeaderMap.

use super::HeaderMap;

/// Collects `Name: value` lines. A status line (`HTTP/...`) starts a new
/// response, so after redirects only the final response's headers remain.
pub(crate) fn parse_header_lines(lines: &[String]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            headers.clear();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers
                .entry(name.trim().to_string())
                .or_default()
                .push(value.trim().to_string());
        }
    }
    headers
}
