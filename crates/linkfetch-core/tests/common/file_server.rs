//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a fixed set of paths. Unknown paths get 404 with a short body;
//! `/echo-content-type` answers with the request's Content-Type header.
//! `/stall` sends its headers, goes quiet for [`STALL`], then sends [`STALL_BODY`].

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Pause between headers and body on `/stall`.
pub const STALL: Duration = Duration::from_millis(2500);
pub const STALL_BODY: &[u8] = b"late!";

/// Starts a server in a background thread serving `files` (path -> body).
/// Returns the base URL without trailing slash (e.g. "http://127.0.0.1:12345").
/// The server runs until the process exits.
pub fn start(files: HashMap<String, Vec<u8>>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let files = Arc::new(files);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let files = Arc::clone(&files);
            thread::spawn(move || handle(stream, &files));
        }
    });
    format!("http://127.0.0.1:{}", port)
}

fn handle(mut stream: std::net::TcpStream, files: &HashMap<String, Vec<u8>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (path, content_type) = parse_request(request);

    if path == "/stall" {
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            STALL_BODY.len()
        );
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.flush();
        thread::sleep(STALL);
        let _ = stream.write_all(STALL_BODY);
        return;
    }

    let (status, body): (&str, Vec<u8>) = if path == "/echo-content-type" {
        ("200 OK", content_type.unwrap_or_default().into_bytes())
    } else if let Some(body) = files.get(path) {
        ("200 OK", body.clone())
    } else {
        ("404 Not Found", b"not found".to_vec())
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nX-Test: a\r\nX-Test: b\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(&body);
}

/// Returns (path, Content-Type header value if present).
fn parse_request(request: &str) -> (&str, Option<String>) {
    let mut path = "";
    let mut content_type = None;
    for (i, line) in request.lines().enumerate() {
        let line = line.trim();
        if i == 0 {
            path = line.split_whitespace().nth(1).unwrap_or("");
            continue;
        }
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-type") {
                content_type = Some(value.trim().to_string());
            }
        }
    }
    (path, content_type)
}
